use std::path::PathBuf;

use shared::error::{ApiError, ErrorCode};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("{error}")]
    Rejected { status: u16, error: ApiError },
    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected response from backend: {0}")]
    Decode(String),
    #[error("not signed in")]
    NotAuthenticated,
    #[error("session store '{path}': {source}")]
    SessionStore {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl GatewayError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Rejected { error, .. } => error.code,
            Self::NotAuthenticated => ErrorCode::Unauthorized,
            Self::Transport(_) | Self::Decode(_) | Self::SessionStore { .. } => ErrorCode::Internal,
        }
    }

    pub fn is_auth_failure(&self) -> bool {
        matches!(self.code(), ErrorCode::Unauthorized | ErrorCode::Forbidden)
    }
}

//! Wire payloads exchanged with the hosted auth and table endpoints.

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Session, SessionUser};

#[derive(Debug, Clone, Serialize)]
pub struct PasswordGrantRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RefreshGrantRequest {
    pub refresh_token: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    pub expires_in: i64,
    #[serde(default)]
    pub expires_at: Option<i64>,
    pub refresh_token: String,
    pub user: SessionUser,
}

impl TokenResponse {
    /// Absolute expiry wins when the backend sends one; otherwise it is
    /// derived from `expires_in` relative to `issued_at`. A lifetime that
    /// overflows leaves the session already expired at `issued_at`.
    pub fn into_session(self, issued_at: DateTime<Utc>) -> Session {
        let expires_at = self
            .expires_at
            .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
            .or_else(|| {
                Duration::try_seconds(self.expires_in)
                    .and_then(|lifetime| issued_at.checked_add_signed(lifetime))
            })
            .unwrap_or(issued_at);
        Session {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at,
            user: self.user,
        }
    }
}

/// Error body shapes returned by the auth service (`msg`, `error_description`)
/// and the table service (`message`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BackendErrorBody {
    #[serde(default)]
    pub msg: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error_description: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl BackendErrorBody {
    pub fn into_message(self) -> Option<String> {
        [self.msg, self.message, self.error_description, self.error]
            .into_iter()
            .flatten()
            .find(|text| !text.trim().is_empty())
    }
}

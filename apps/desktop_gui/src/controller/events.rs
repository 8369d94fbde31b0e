//! UI/backend events and error modeling for the desktop controller.

use client_core::{GatewayOutcome, RequestKind};
use shared::domain::Session;

pub enum UiEvent {
    Outcome(GatewayOutcome),
    SessionChanged(Option<Session>),
    Error(UiError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorCategory {
    Auth,
    Transport,
    Validation,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorContext {
    BackendStartup,
    SignIn,
    Submit,
    Fetch,
    Export,
    General,
}

impl UiErrorContext {
    pub fn for_request(kind: RequestKind) -> Self {
        match kind {
            RequestKind::SignIn | RequestKind::SignOut | RequestKind::LoadSession => Self::SignIn,
            RequestKind::Submit => Self::Submit,
            RequestKind::FetchAll => Self::Fetch,
        }
    }
}

pub fn classify_sign_in_failure(message: &str) -> String {
    let lower = message.to_ascii_lowercase();
    if lower.contains("backend worker startup failure") {
        "Backend worker startup failure; check the app configuration and relaunch.".to_string()
    } else if lower.contains("error sending request")
        || lower.contains("connection refused")
        || lower.contains("dns")
        || lower.contains("timed out")
    {
        "Registry unreachable; check the backend URL and network, then retry.".to_string()
    } else {
        format!("Sign-in error: {message}")
    }
}

#[derive(Debug, Clone)]
pub struct UiError {
    category: UiErrorCategory,
    context: UiErrorContext,
    message: String,
}

impl UiError {
    pub fn from_message(context: UiErrorContext, message: impl Into<String>) -> Self {
        let message = message.into();
        let message_lower = message.to_ascii_lowercase();
        let category = if message_lower.contains("401")
            || message_lower.contains("403")
            || message_lower.contains("unauthorized")
            || message_lower.contains("forbidden")
            || message_lower.contains("not signed in")
            || message_lower.contains("jwt expired")
            || message_lower.contains("invalid login credentials")
            || message_lower.contains("refresh token")
        {
            UiErrorCategory::Auth
        } else if message_lower.contains("required")
            || message_lower.contains("invalid")
            || message_lower.contains("missing")
            || message_lower.contains("malformed")
        {
            UiErrorCategory::Validation
        } else if message_lower.contains("timeout")
            || message_lower.contains("timed out")
            || message_lower.contains("connection")
            || message_lower.contains("network")
            || message_lower.contains("error sending request")
            || message_lower.contains("unavailable")
            || message_lower.contains("disconnect")
            || message_lower.contains("queue is full")
        {
            UiErrorCategory::Transport
        } else {
            UiErrorCategory::Unknown
        };

        Self {
            category,
            context,
            message,
        }
    }

    pub fn requires_reauth(&self) -> bool {
        self.category == UiErrorCategory::Auth
    }

    pub fn category(&self) -> UiErrorCategory {
        self.category
    }

    pub fn context(&self) -> UiErrorContext {
        self.context
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Text for the notice banner.
    pub fn user_message(&self) -> String {
        if self.context == UiErrorContext::SignIn {
            return classify_sign_in_failure(&self.message);
        }
        let label = match self.category {
            UiErrorCategory::Auth => "Authentication",
            UiErrorCategory::Transport => "Network",
            UiErrorCategory::Validation => "Validation",
            UiErrorCategory::Unknown => "Error",
        };
        format!("{label}: {}", self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_worker_disconnect_as_transport_error() {
        let err = UiError::from_message(
            UiErrorContext::General,
            "Backend command processor disconnected; restart the app",
        );
        assert_eq!(err.category(), UiErrorCategory::Transport);
        assert!(!err.requires_reauth());
    }

    #[test]
    fn rejected_credentials_require_reauth() {
        let err = UiError::from_message(UiErrorContext::SignIn, "Invalid login credentials");
        assert_eq!(err.category(), UiErrorCategory::Auth);
        assert!(err.requires_reauth());
        assert_eq!(
            err.user_message(),
            "Sign-in error: Invalid login credentials"
        );
    }

    #[test]
    fn unreachable_registry_gets_actionable_sign_in_message() {
        let message = classify_sign_in_failure(
            "network error: error sending request for url (http://127.0.0.1:9/auth/v1/token)",
        );
        assert_eq!(
            message,
            "Registry unreachable; check the backend URL and network, then retry."
        );
    }

    #[test]
    fn export_failures_are_labelled_by_category() {
        let err = UiError::from_message(UiErrorContext::Export, "permission denied");
        assert_eq!(err.category(), UiErrorCategory::Unknown);
        assert_eq!(err.user_message(), "Error: permission denied");
    }

    #[test]
    fn request_kinds_map_to_contexts() {
        assert_eq!(
            UiErrorContext::for_request(RequestKind::Submit),
            UiErrorContext::Submit
        );
        assert_eq!(
            UiErrorContext::for_request(RequestKind::FetchAll),
            UiErrorContext::Fetch
        );
        assert_eq!(
            UiErrorContext::for_request(RequestKind::SignIn),
            UiErrorContext::SignIn
        );
    }
}

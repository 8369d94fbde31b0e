//! Boundary to the hosted auth + table service.
//!
//! The view model never calls the gateway itself: its transitions produce
//! [`GatewayRequest`] values, something else runs them through [`execute`],
//! and the resulting [`GatewayOutcome`] is fed back into the view model.

use std::fmt;

use async_trait::async_trait;
use shared::domain::{RegistrationRecord, Session};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::error::GatewayError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionChange {
    SignedIn(Session),
    TokenRefreshed(Session),
    SignedOut,
}

impl SessionChange {
    /// The session that replaces whatever was held before.
    pub fn into_session(self) -> Option<Session> {
        match self {
            Self::SignedIn(session) | Self::TokenRefreshed(session) => Some(session),
            Self::SignedOut => None,
        }
    }
}

#[async_trait]
pub trait RegistryGateway: Send + Sync {
    async fn current_session(&self) -> Result<Option<Session>, GatewayError>;
    fn subscribe_session_changes(&self) -> broadcast::Receiver<SessionChange>;
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, GatewayError>;
    /// Ends the session. The local session is dropped even when the remote
    /// revocation fails.
    async fn sign_out(&self) -> Result<(), GatewayError>;
    async fn submit_registration(&self, record: &RegistrationRecord) -> Result<(), GatewayError>;
    async fn fetch_all_registrations(&self) -> Result<Vec<RegistrationRecord>, GatewayError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    LoadSession,
    SignIn,
    SignOut,
    Submit,
    FetchAll,
}

impl RequestKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::LoadSession => "load_session",
            Self::SignIn => "sign_in",
            Self::SignOut => "sign_out",
            Self::Submit => "submit_registration",
            Self::FetchAll => "fetch_all_registrations",
        }
    }
}

#[derive(Clone, PartialEq, Eq)]
pub enum GatewayRequest {
    LoadSession,
    SignIn { email: String, password: String },
    SignOut,
    Submit(RegistrationRecord),
    FetchAll,
}

impl GatewayRequest {
    pub fn kind(&self) -> RequestKind {
        match self {
            Self::LoadSession => RequestKind::LoadSession,
            Self::SignIn { .. } => RequestKind::SignIn,
            Self::SignOut => RequestKind::SignOut,
            Self::Submit(_) => RequestKind::Submit,
            Self::FetchAll => RequestKind::FetchAll,
        }
    }
}

impl fmt::Debug for GatewayRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SignIn { email, .. } => f
                .debug_struct("SignIn")
                .field("email", email)
                .finish_non_exhaustive(),
            Self::Submit(record) => f.debug_tuple("Submit").field(record).finish(),
            other => f.write_str(other.kind().name()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayOutcome {
    SessionLoaded(Option<Session>),
    SignedIn(Result<Session, String>),
    SignedOut,
    Submitted(Result<(), String>),
    Fetched(Result<Vec<RegistrationRecord>, String>),
}

impl GatewayOutcome {
    pub fn kind(&self) -> RequestKind {
        match self {
            Self::SessionLoaded(_) => RequestKind::LoadSession,
            Self::SignedIn(_) => RequestKind::SignIn,
            Self::SignedOut => RequestKind::SignOut,
            Self::Submitted(_) => RequestKind::Submit,
            Self::Fetched(_) => RequestKind::FetchAll,
        }
    }
}

/// Runs one request against the gateway. Failures are folded into the
/// outcome as the message to show; nothing is retried.
pub async fn execute<G>(gateway: &G, request: GatewayRequest) -> GatewayOutcome
where
    G: RegistryGateway + ?Sized,
{
    let kind = request.kind();
    debug!(request = kind.name(), "executing gateway request");
    let outcome = match request {
        GatewayRequest::LoadSession => match gateway.current_session().await {
            Ok(session) => GatewayOutcome::SessionLoaded(session),
            Err(err) => {
                warn!(request = kind.name(), "could not restore session: {err}");
                GatewayOutcome::SessionLoaded(None)
            }
        },
        GatewayRequest::SignIn { email, password } => GatewayOutcome::SignedIn(
            gateway
                .sign_in(&email, &password)
                .await
                .map_err(|err| err.to_string()),
        ),
        GatewayRequest::SignOut => {
            if let Err(err) = gateway.sign_out().await {
                warn!(request = kind.name(), "remote sign-out failed: {err}");
            }
            GatewayOutcome::SignedOut
        }
        GatewayRequest::Submit(record) => GatewayOutcome::Submitted(
            gateway
                .submit_registration(&record)
                .await
                .map_err(|err| err.to_string()),
        ),
        GatewayRequest::FetchAll => GatewayOutcome::Fetched(
            gateway
                .fetch_all_registrations()
                .await
                .map_err(|err| err.to_string()),
        ),
    };

    match &outcome {
        GatewayOutcome::SignedIn(Err(reason))
        | GatewayOutcome::Submitted(Err(reason))
        | GatewayOutcome::Fetched(Err(reason)) => {
            warn!(request = kind.name(), reason = %reason, "gateway request failed");
        }
        GatewayOutcome::Fetched(Ok(records)) => {
            info!(request = kind.name(), count = records.len(), "gateway request completed");
        }
        _ => info!(request = kind.name(), "gateway request completed"),
    }
    outcome
}

//! View-state model for the RSVP client.
//!
//! [`ViewModel`] is the single owner of page, form and admin state. The UI
//! reads it and changes it only through its transition methods. Transitions
//! that need the backend return a [`GatewayRequest`]; the answer comes back
//! through [`ViewModel::apply_outcome`].

use std::{collections::HashSet, fmt};

use shared::domain::{FamilySide, RegistrationRecord, Session};

use crate::{
    csv_export::{guest_list_csv, CsvStyle, GUEST_LIST_HEADERS},
    gateway::{GatewayOutcome, GatewayRequest, RequestKind},
    stats::{guest_statistics, GuestStatistics},
};

pub const SUBMIT_SUCCESS_MESSAGE: &str = "RSVP Submitted 💜";
pub const NAME_REQUIRED_MESSAGE: &str = "Name required";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ViewMode {
    #[default]
    Home,
    Register,
    Invitation,
    Admin,
}

impl ViewMode {
    pub const ALL: [ViewMode; 4] = [
        ViewMode::Home,
        ViewMode::Register,
        ViewMode::Invitation,
        ViewMode::Admin,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Home => "HOME",
            Self::Register => "REGISTER",
            Self::Invitation => "INVITATION",
            Self::Admin => "ADMIN",
        }
    }
}

/// What the admin page shows, derived from the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminScreen {
    Login,
    Dashboard,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormDraft {
    pub name: String,
    pub email: String,
    pub phone: String,
}

impl FormDraft {
    pub fn is_empty(&self) -> bool {
        self.name.is_empty() && self.email.is_empty() && self.phone.is_empty()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    fn to_record(&self, side: FamilySide) -> RegistrationRecord {
        RegistrationRecord::new(
            self.name.trim(),
            self.email.trim(),
            self.phone.trim(),
            side,
        )
    }
}

#[derive(Clone, Default, PartialEq, Eq)]
pub struct AdminCredentials {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for AdminCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminCredentials")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeSeverity {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub severity: NoticeSeverity,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            severity: NoticeSeverity::Info,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            severity: NoticeSeverity::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: NoticeSeverity::Error,
            message: message.into(),
        }
    }
}

#[derive(Debug, Default)]
pub struct ViewModel {
    mode: ViewMode,
    draft: FormDraft,
    credentials: AdminCredentials,
    session: Option<Session>,
    guests: Vec<RegistrationRecord>,
    stats: GuestStatistics,
    notice: Option<Notice>,
    pending: HashSet<RequestKind>,
    // Set when the session ends while a fetch is in flight.
    stale_fetch: bool,
}

impl ViewModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Startup request: read whatever session the auth service already holds.
    pub fn start(&mut self) -> Option<GatewayRequest> {
        self.issue(GatewayRequest::LoadSession)
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    /// Explicit navigation. Leaving the register page discards the draft.
    /// Entering the admin page never loads data on its own.
    pub fn navigate(&mut self, mode: ViewMode) {
        if self.mode == ViewMode::Register && mode != ViewMode::Register {
            self.draft.clear();
        }
        self.mode = mode;
    }

    pub fn admin_screen(&self) -> AdminScreen {
        if self.session.is_some() {
            AdminScreen::Dashboard
        } else {
            AdminScreen::Login
        }
    }

    pub fn draft(&self) -> &FormDraft {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut FormDraft {
        &mut self.draft
    }

    pub fn credentials(&self) -> &AdminCredentials {
        &self.credentials
    }

    pub fn credentials_mut(&mut self) -> &mut AdminCredentials {
        &mut self.credentials
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    pub fn guests(&self) -> &[RegistrationRecord] {
        &self.guests
    }

    pub fn stats(&self) -> GuestStatistics {
        self.stats
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    pub fn notify(&mut self, notice: Notice) {
        self.notice = Some(notice);
    }

    pub fn is_pending(&self, kind: RequestKind) -> bool {
        self.pending.contains(&kind)
    }

    /// RSVP for `side` from the current draft. Name, email and phone are
    /// trimmed before sending; a name that is empty or only whitespace is
    /// rejected here and never reaches the gateway.
    pub fn submit_rsvp(&mut self, side: FamilySide) -> Option<GatewayRequest> {
        if self.draft.name.trim().is_empty() {
            self.notice = Some(Notice::error(NAME_REQUIRED_MESSAGE));
            return None;
        }
        self.issue(GatewayRequest::Submit(self.draft.to_record(side)))
    }

    pub fn sign_in(&mut self) -> Option<GatewayRequest> {
        let email = self.credentials.email.trim().to_string();
        if email.is_empty() || self.credentials.password.is_empty() {
            self.notice = Some(Notice::error("Email and password are required"));
            return None;
        }
        let password = self.credentials.password.clone();
        self.issue(GatewayRequest::SignIn { email, password })
    }

    pub fn sign_out(&mut self) -> Option<GatewayRequest> {
        self.issue(GatewayRequest::SignOut)
    }

    /// Explicit guest list refresh for the dashboard.
    pub fn refresh_guests(&mut self) -> Option<GatewayRequest> {
        if self.session.is_none() {
            self.notice = Some(Notice::error("Sign in to load guests"));
            return None;
        }
        self.issue(GatewayRequest::FetchAll)
    }

    pub fn export_csv(&self, style: CsvStyle) -> String {
        guest_list_csv(&GUEST_LIST_HEADERS, &self.guests, style)
    }

    pub fn apply_outcome(&mut self, outcome: GatewayOutcome) {
        self.pending.remove(&outcome.kind());
        match outcome {
            GatewayOutcome::SessionLoaded(session) => {
                self.replace_session(session);
            }
            GatewayOutcome::SignedIn(result) => {
                self.credentials.password.clear();
                match result {
                    Ok(session) => {
                        let message = format!("Signed in as {}", session.display_email());
                        self.replace_session(Some(session));
                        self.notice = Some(Notice::success(message));
                    }
                    Err(reason) => self.notice = Some(Notice::error(reason)),
                }
            }
            GatewayOutcome::SignedOut => {
                self.replace_session(None);
                self.credentials = AdminCredentials::default();
                self.notice = Some(Notice::info("Signed out"));
            }
            GatewayOutcome::Submitted(Ok(())) => {
                self.draft.clear();
                self.notice = Some(Notice::success(SUBMIT_SUCCESS_MESSAGE));
            }
            GatewayOutcome::Submitted(Err(reason)) => {
                self.notice = Some(Notice::error(reason));
            }
            GatewayOutcome::Fetched(_) if std::mem::take(&mut self.stale_fetch) => {
                tracing::debug!("dropping guest list fetched before sign-out");
            }
            GatewayOutcome::Fetched(Ok(_)) if self.session.is_none() => {
                tracing::debug!("dropping guest list fetched without a session");
            }
            GatewayOutcome::Fetched(Ok(records)) => {
                let count = records.len();
                self.set_guests(records);
                self.notice = Some(Notice::info(format!("Loaded {count} guests")));
            }
            GatewayOutcome::Fetched(Err(reason)) => {
                self.notice = Some(Notice::error(reason));
            }
        }
    }

    /// A request that never reached the gateway. Frees its slot so it can be
    /// retried.
    pub fn abandon(&mut self, kind: RequestKind, reason: impl Into<String>) {
        self.pending.remove(&kind);
        self.notice = Some(Notice::error(reason));
    }

    /// Auth state pushed by the collaborator; it replaces the previous session
    /// wholesale.
    pub fn apply_session_change(&mut self, session: Option<Session>) {
        self.replace_session(session);
    }

    fn replace_session(&mut self, session: Option<Session>) {
        let signed_out = session.is_none();
        self.session = session;
        if signed_out {
            if self.pending.contains(&RequestKind::FetchAll) {
                self.stale_fetch = true;
            }
            self.set_guests(Vec::new());
        }
    }

    fn set_guests(&mut self, guests: Vec<RegistrationRecord>) {
        self.stats = guest_statistics(&guests);
        self.guests = guests;
    }

    fn issue(&mut self, request: GatewayRequest) -> Option<GatewayRequest> {
        if !self.pending.insert(request.kind()) {
            return None;
        }
        Some(request)
    }
}

#[cfg(test)]
#[path = "tests/view_tests.rs"]
mod tests;

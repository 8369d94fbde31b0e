//! [`RegistryGateway`] over the hosted service's REST endpoints.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, RequestBuilder, Response};
use serde::Serialize;
use shared::{
    domain::{RegistrationRecord, Session},
    error::ApiError,
    protocol::{BackendErrorBody, PasswordGrantRequest, RefreshGrantRequest, TokenResponse},
};
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};
use url::Url;

use crate::{
    config::ClientConfig,
    error::GatewayError,
    gateway::{RegistryGateway, SessionChange},
    session_store::SessionStore,
};

const API_KEY_HEADER: &str = "apikey";
const SESSION_EVENTS_CAPACITY: usize = 16;

pub struct RestGateway {
    http: Client,
    base_url: Url,
    anon_key: String,
    table: String,
    store: SessionStore,
    session: Mutex<Option<Session>>,
    events: broadcast::Sender<SessionChange>,
}

impl RestGateway {
    pub fn new(config: &ClientConfig) -> Self {
        Self::with_parts(
            config.backend_url.clone(),
            config.anon_key.clone(),
            config.table.clone(),
            SessionStore::in_dir(&config.data_dir),
        )
    }

    pub fn with_parts(
        mut base_url: Url,
        anon_key: impl Into<String>,
        table: impl Into<String>,
        store: SessionStore,
    ) -> Self {
        // Url::join replaces the last segment unless the base ends with '/'.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        let (events, _) = broadcast::channel(SESSION_EVENTS_CAPACITY);
        Self {
            http: Client::new(),
            base_url,
            anon_key: anon_key.into(),
            table: table.into(),
            store,
            session: Mutex::new(None),
            events,
        }
    }

    fn endpoint(&self, path: &str) -> Result<Url, GatewayError> {
        self.base_url
            .join(path)
            .map_err(|err| GatewayError::Decode(format!("invalid endpoint '{path}': {err}")))
    }

    fn table_endpoint(&self) -> Result<Url, GatewayError> {
        self.endpoint(&format!("rest/v1/{}", self.table))
    }

    /// Every call carries the public key; the bearer is the session token when
    /// one exists and the public key otherwise.
    fn authorize(&self, request: RequestBuilder, access_token: Option<&str>) -> RequestBuilder {
        let bearer = access_token.unwrap_or(&self.anon_key);
        request
            .header(API_KEY_HEADER, &self.anon_key)
            .bearer_auth(bearer)
    }

    async fn token_grant(
        &self,
        grant_type: &str,
        body: &impl Serialize,
    ) -> Result<Session, GatewayError> {
        let issued_at = Utc::now();
        let response = self
            .authorize(self.http.post(self.endpoint("auth/v1/token")?), None)
            .query(&[("grant_type", grant_type)])
            .json(body)
            .send()
            .await?;
        let token: TokenResponse = check(response)
            .await?
            .json()
            .await
            .map_err(|err| GatewayError::Decode(err.to_string()))?;
        Ok(token.into_session(issued_at))
    }

    async fn install(&self, guard: &mut Option<Session>, change: SessionChange) {
        let next = change.clone().into_session();
        let stored = match &next {
            Some(session) => self.store.save(session).await,
            None => self.store.clear().await,
        };
        if let Err(err) = stored {
            warn!("session persistence failed: {err}");
        }
        *guard = next;
        // No subscribers is fine.
        let _ = self.events.send(change);
    }

    /// Current access token, refreshed first if it has expired. A failed
    /// refresh signs the client out.
    async fn access_token(&self) -> Result<Option<String>, GatewayError> {
        let mut guard = self.session.lock().await;
        let Some(session) = guard.clone() else {
            return Ok(None);
        };
        if !session.is_expired_at(Utc::now()) {
            return Ok(Some(session.access_token));
        }
        match self.refresh(&session).await {
            Ok(refreshed) => {
                let token = refreshed.access_token.clone();
                self.install(&mut guard, SessionChange::TokenRefreshed(refreshed))
                    .await;
                Ok(Some(token))
            }
            Err(err) => {
                self.install(&mut guard, SessionChange::SignedOut).await;
                Err(err)
            }
        }
    }

    async fn refresh(&self, session: &Session) -> Result<Session, GatewayError> {
        debug!(user_id = %session.user.id, "refreshing expired session");
        self.token_grant(
            "refresh_token",
            &RefreshGrantRequest {
                refresh_token: session.refresh_token.clone(),
            },
        )
        .await
    }
}

async fn check(response: Response) -> Result<Response, GatewayError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<BackendErrorBody>(&body)
        .ok()
        .and_then(BackendErrorBody::into_message)
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .map(str::to_string)
                .unwrap_or_else(|| format!("HTTP {}", status.as_u16()))
        });
    Err(GatewayError::Rejected {
        status: status.as_u16(),
        error: ApiError::from_status(status.as_u16(), message),
    })
}

#[async_trait]
impl RegistryGateway for RestGateway {
    async fn current_session(&self) -> Result<Option<Session>, GatewayError> {
        let mut guard = self.session.lock().await;
        if guard.is_none() {
            *guard = self.store.load().await?;
        }
        let Some(session) = guard.clone() else {
            return Ok(None);
        };
        if !session.is_expired_at(Utc::now()) {
            return Ok(Some(session));
        }

        match self.refresh(&session).await {
            Ok(refreshed) => {
                self.install(&mut guard, SessionChange::TokenRefreshed(refreshed.clone()))
                    .await;
                Ok(Some(refreshed))
            }
            Err(err) => {
                warn!("stored session could not be refreshed: {err}");
                self.install(&mut guard, SessionChange::SignedOut).await;
                Ok(None)
            }
        }
    }

    fn subscribe_session_changes(&self) -> broadcast::Receiver<SessionChange> {
        self.events.subscribe()
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, GatewayError> {
        let session = self
            .token_grant(
                "password",
                &PasswordGrantRequest {
                    email: email.to_string(),
                    password: password.to_string(),
                },
            )
            .await?;
        info!(user_id = %session.user.id, "admin signed in");
        let mut guard = self.session.lock().await;
        self.install(&mut guard, SessionChange::SignedIn(session.clone()))
            .await;
        Ok(session)
    }

    async fn sign_out(&self) -> Result<(), GatewayError> {
        let mut guard = self.session.lock().await;
        let remote = match guard.as_ref() {
            Some(session) => {
                let request = self.authorize(
                    self.http.post(self.endpoint("auth/v1/logout")?),
                    Some(&session.access_token),
                );
                match request.send().await {
                    Ok(response) => check(response).await.map(|_| ()),
                    Err(err) => Err(err.into()),
                }
            }
            None => Ok(()),
        };
        self.install(&mut guard, SessionChange::SignedOut).await;
        info!("admin signed out");
        remote
    }

    async fn submit_registration(&self, record: &RegistrationRecord) -> Result<(), GatewayError> {
        let token = self.access_token().await?;
        let response = self
            .authorize(self.http.post(self.table_endpoint()?), token.as_deref())
            .header("Prefer", "return=minimal")
            .json(&[record])
            .send()
            .await?;
        check(response).await?;
        info!(table = %self.table, "registration submitted");
        Ok(())
    }

    async fn fetch_all_registrations(&self) -> Result<Vec<RegistrationRecord>, GatewayError> {
        let token = self.access_token().await?.ok_or(GatewayError::NotAuthenticated)?;
        let response = self
            .authorize(self.http.get(self.table_endpoint()?), Some(&token))
            .query(&[("select", "*")])
            .send()
            .await?;
        let records: Vec<RegistrationRecord> = check(response)
            .await?
            .json()
            .await
            .map_err(|err| GatewayError::Decode(err.to_string()))?;
        debug!(table = %self.table, count = records.len(), "registrations fetched");
        Ok(records)
    }
}

#[cfg(test)]
#[path = "tests/rest_tests.rs"]
mod tests;

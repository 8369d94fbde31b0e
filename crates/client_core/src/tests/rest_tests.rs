use super::*;

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};
use shared::domain::{FamilySide, SessionUser};
use tokio::net::TcpListener;

const ANON_KEY: &str = "anon-key";
const USER_ID: &str = "6a3c1b0e-0f43-4f3b-9d4e-2a8c3c7d9e10";

#[derive(Default)]
struct Recorded {
    token_grants: Vec<(String, Value)>,
    logout_bearers: Vec<String>,
    inserts: Vec<Value>,
    insert_prefer: Vec<String>,
    select_queries: Vec<String>,
    bearers: Vec<String>,
    api_keys: Vec<String>,
}

#[derive(Clone)]
struct MockBackend {
    recorded: Arc<Mutex<Recorded>>,
    rows: Value,
    reject_password: bool,
    reject_refresh: bool,
}

impl MockBackend {
    fn new(rows: Value) -> Self {
        Self {
            recorded: Arc::new(Mutex::new(Recorded::default())),
            rows,
            reject_password: false,
            reject_refresh: false,
        }
    }
}

fn header_value(headers: &HeaderMap, name: &str) -> String {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

async fn record_headers(state: &MockBackend, headers: &HeaderMap) {
    let mut recorded = state.recorded.lock().await;
    recorded.api_keys.push(header_value(headers, "apikey"));
    recorded
        .bearers
        .push(header_value(headers, "authorization"));
}

fn token_body(access_token: &str) -> Value {
    json!({
        "access_token": access_token,
        "token_type": "bearer",
        "expires_in": 3600,
        "refresh_token": "refresh-1",
        "user": {"id": USER_ID, "email": "admin@example.com"}
    })
}

async fn handle_token(
    State(state): State<MockBackend>,
    Query(query): Query<std::collections::HashMap<String, String>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    record_headers(&state, &headers).await;
    let grant_type = query.get("grant_type").cloned().unwrap_or_default();
    state
        .recorded
        .lock()
        .await
        .token_grants
        .push((grant_type.clone(), body));

    match grant_type.as_str() {
        "password" if state.reject_password => (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "invalid_grant", "error_description": "Invalid login credentials"})),
        ),
        "password" => (StatusCode::OK, Json(token_body("access-1"))),
        "refresh_token" if state.reject_refresh => (
            StatusCode::BAD_REQUEST,
            Json(json!({"code": 400, "msg": "Invalid Refresh Token"})),
        ),
        "refresh_token" => (StatusCode::OK, Json(token_body("access-2"))),
        _ => (StatusCode::BAD_REQUEST, Json(json!({"msg": "unsupported grant"}))),
    }
}

async fn handle_logout(State(state): State<MockBackend>, headers: HeaderMap) -> StatusCode {
    state
        .recorded
        .lock()
        .await
        .logout_bearers
        .push(header_value(&headers, "authorization"));
    StatusCode::NO_CONTENT
}

async fn handle_insert(
    State(state): State<MockBackend>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> StatusCode {
    record_headers(&state, &headers).await;
    let mut recorded = state.recorded.lock().await;
    recorded.insert_prefer.push(header_value(&headers, "prefer"));
    recorded.inserts.push(body);
    StatusCode::CREATED
}

async fn handle_select(
    State(state): State<MockBackend>,
    Query(query): Query<std::collections::HashMap<String, String>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    record_headers(&state, &headers).await;
    state
        .recorded
        .lock()
        .await
        .select_queries
        .push(query.get("select").cloned().unwrap_or_default());
    if header_value(&headers, "authorization") == format!("Bearer {ANON_KEY}") {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"message": "permission denied for table guests"})),
        );
    }
    (StatusCode::OK, Json(state.rows.clone()))
}

async fn spawn_backend(state: MockBackend) -> Url {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let app = Router::new()
        .route("/auth/v1/token", post(handle_token))
        .route("/auth/v1/logout", post(handle_logout))
        .route("/rest/v1/guests", post(handle_insert).get(handle_select))
        .with_state(state);
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Url::parse(&format!("http://{addr}")).expect("url")
}

fn gateway(base_url: Url, dir: &tempfile::TempDir) -> RestGateway {
    RestGateway::with_parts(base_url, ANON_KEY, "guests", SessionStore::in_dir(dir.path()))
}

fn expired_session() -> Session {
    Session {
        access_token: "stale".into(),
        refresh_token: "refresh-0".into(),
        expires_at: Utc::now() - chrono::Duration::minutes(5),
        user: SessionUser {
            id: USER_ID.parse().expect("uuid"),
            email: Some("admin@example.com".into()),
        },
    }
}

#[tokio::test]
async fn anonymous_submit_posts_one_row_with_anon_bearer() {
    let backend = MockBackend::new(json!([]));
    let base = spawn_backend(backend.clone()).await;
    let dir = tempfile::tempdir().expect("tempdir");
    let gateway = gateway(base, &dir);

    gateway
        .submit_registration(&RegistrationRecord::new(
            "Ada",
            "a@x.com",
            "123",
            FamilySide::Bride,
        ))
        .await
        .expect("submit");

    let recorded = backend.recorded.lock().await;
    assert_eq!(
        recorded.inserts,
        vec![json!([{"name": "Ada", "email": "a@x.com", "phone": "123", "family_side": "bride"}])]
    );
    assert_eq!(recorded.insert_prefer, vec!["return=minimal".to_string()]);
    assert_eq!(recorded.api_keys, vec![ANON_KEY.to_string()]);
    assert_eq!(recorded.bearers, vec![format!("Bearer {ANON_KEY}")]);
}

#[tokio::test]
async fn sign_in_persists_session_and_notifies_subscribers() {
    let backend = MockBackend::new(json!([]));
    let base = spawn_backend(backend.clone()).await;
    let dir = tempfile::tempdir().expect("tempdir");
    let gateway = gateway(base, &dir);
    let mut changes = gateway.subscribe_session_changes();

    let session = gateway
        .sign_in("admin@example.com", "hunter2")
        .await
        .expect("sign in");

    assert_eq!(session.access_token, "access-1");
    assert_eq!(
        changes.recv().await.expect("change"),
        SessionChange::SignedIn(session.clone())
    );
    let stored = SessionStore::in_dir(dir.path()).load().await.expect("load");
    assert_eq!(stored, Some(session));

    let recorded = backend.recorded.lock().await;
    assert_eq!(
        recorded.token_grants,
        vec![(
            "password".to_string(),
            json!({"email": "admin@example.com", "password": "hunter2"})
        )]
    );
}

#[tokio::test]
async fn rejected_sign_in_surfaces_backend_message() {
    let mut backend = MockBackend::new(json!([]));
    backend.reject_password = true;
    let base = spawn_backend(backend).await;
    let dir = tempfile::tempdir().expect("tempdir");
    let gateway = gateway(base, &dir);

    let err = gateway
        .sign_in("admin@example.com", "wrong")
        .await
        .expect_err("rejected");

    assert_eq!(err.to_string(), "Invalid login credentials");
    assert_eq!(err.code(), shared::error::ErrorCode::Validation);
    assert_eq!(gateway.current_session().await.expect("session"), None);
}

#[tokio::test]
async fn fetch_uses_session_token_and_select_all() {
    let rows = json!([
        {"id": 1, "name": "Ada", "email": "a@x.com", "phone": "123", "family_side": "bride"},
        {"id": 2, "name": "Ola", "email": null, "phone": "", "family_side": "Groom"}
    ]);
    let backend = MockBackend::new(rows);
    let base = spawn_backend(backend.clone()).await;
    let dir = tempfile::tempdir().expect("tempdir");
    let gateway = gateway(base, &dir);
    gateway
        .sign_in("admin@example.com", "hunter2")
        .await
        .expect("sign in");

    let records = gateway.fetch_all_registrations().await.expect("fetch");

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].side(), Some(FamilySide::Bride));
    assert_eq!(records[1].email, "");
    assert_eq!(records[1].side(), None);
    let recorded = backend.recorded.lock().await;
    assert_eq!(recorded.select_queries, vec!["*".to_string()]);
    assert_eq!(recorded.bearers.last().map(String::as_str), Some("Bearer access-1"));
}

#[tokio::test]
async fn fetch_without_session_is_not_attempted() {
    let backend = MockBackend::new(json!([]));
    let base = spawn_backend(backend.clone()).await;
    let dir = tempfile::tempdir().expect("tempdir");
    let gateway = gateway(base, &dir);

    let err = gateway
        .fetch_all_registrations()
        .await
        .expect_err("needs session");

    assert!(matches!(err, GatewayError::NotAuthenticated));
    assert!(backend.recorded.lock().await.select_queries.is_empty());
}

#[tokio::test]
async fn sign_out_revokes_remotely_and_clears_local_state() {
    let backend = MockBackend::new(json!([]));
    let base = spawn_backend(backend.clone()).await;
    let dir = tempfile::tempdir().expect("tempdir");
    let gateway = gateway(base, &dir);
    gateway
        .sign_in("admin@example.com", "hunter2")
        .await
        .expect("sign in");
    let mut changes = gateway.subscribe_session_changes();

    gateway.sign_out().await.expect("sign out");

    assert_eq!(changes.recv().await.expect("change"), SessionChange::SignedOut);
    assert_eq!(gateway.current_session().await.expect("session"), None);
    assert!(!SessionStore::in_dir(dir.path()).path().exists());
    assert_eq!(
        backend.recorded.lock().await.logout_bearers,
        vec!["Bearer access-1".to_string()]
    );
}

#[tokio::test]
async fn expired_stored_session_is_refreshed_on_startup() {
    let backend = MockBackend::new(json!([]));
    let base = spawn_backend(backend.clone()).await;
    let dir = tempfile::tempdir().expect("tempdir");
    SessionStore::in_dir(dir.path())
        .save(&expired_session())
        .await
        .expect("seed session");
    let gateway = gateway(base, &dir);
    let mut changes = gateway.subscribe_session_changes();

    let session = gateway
        .current_session()
        .await
        .expect("session")
        .expect("refreshed");

    assert_eq!(session.access_token, "access-2");
    assert!(matches!(
        changes.recv().await.expect("change"),
        SessionChange::TokenRefreshed(_)
    ));
    let recorded = backend.recorded.lock().await;
    assert_eq!(
        recorded.token_grants,
        vec![(
            "refresh_token".to_string(),
            json!({"refresh_token": "refresh-0"})
        )]
    );
}

#[tokio::test]
async fn unrefreshable_stored_session_is_dropped() {
    let mut backend = MockBackend::new(json!([]));
    backend.reject_refresh = true;
    let base = spawn_backend(backend).await;
    let dir = tempfile::tempdir().expect("tempdir");
    let store = SessionStore::in_dir(dir.path());
    store.save(&expired_session()).await.expect("seed session");
    let gateway = gateway(base, &dir);

    assert_eq!(gateway.current_session().await.expect("session"), None);
    assert!(!store.path().exists());
}

#[tokio::test]
async fn base_url_with_path_keeps_prefix() {
    let dir = tempfile::tempdir().expect("tempdir");
    let gateway = RestGateway::with_parts(
        Url::parse("https://proxy.example.com/supabase").expect("url"),
        ANON_KEY,
        "guests",
        SessionStore::in_dir(dir.path()),
    );
    assert_eq!(
        gateway.table_endpoint().expect("endpoint").as_str(),
        "https://proxy.example.com/supabase/rest/v1/guests"
    );
}

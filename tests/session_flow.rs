//! Session flow integration tests
//!
//! End-to-end tests of the session store against a mock auth service, with
//! cookies persisted to a temporary file.

use auth_session::{telemetry, AppConfig, AuthState, CookieJar, FileCookieJar};
use serde_json::json;
use storage::PersistenceConfig;
use tempfile::TempDir;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(server: &MockServer, dir: &TempDir) -> AppConfig {
    telemetry::init_with_default("debug");
    AppConfig::default()
        .with_api_url(server.uri())
        .with_cookie_file(dir.path().join("cookies.json"))
}

fn cookie_on_disk(dir: &TempDir, name: &str) -> Option<String> {
    FileCookieJar::open(PersistenceConfig::new(dir.path().join("cookies.json")))
        .unwrap()
        .value(name)
}

async fn mount_login(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .and(body_json(json!({ "username": "alice", "password": "pw" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "user": { "_id": "1", "username": "alice" },
            "token": { "access_token": "abc" }
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_login_then_logout() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    mount_login(&server).await;

    let store = config_for(&server, &dir).build_store().unwrap();
    store.login_user("alice", "pw").await.unwrap();

    let state = store.state();
    let user = state.user.clone().unwrap();
    assert_eq!(user.id, "1");
    assert_eq!(user.username, "alice");
    assert_eq!(user.token.access_token, "abc");
    assert_eq!(state.token.access_token, "abc");
    assert!(!state.loading);
    assert_eq!(cookie_on_disk(&dir, "jwt"), Some("abc".to_string()));

    // Serialized state mirrors the server's user shape
    let snapshot = serde_json::to_value(&state).unwrap();
    assert_eq!(
        snapshot["user"],
        json!({ "_id": "1", "username": "alice", "token": { "access_token": "abc" } })
    );

    store.logout();
    let state = store.state();
    assert!(state.user.is_none());
    assert_eq!(state.token.access_token, "");
    assert_eq!(cookie_on_disk(&dir, "jwt"), None);
}

#[tokio::test]
async fn test_token_survives_restart() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    mount_login(&server).await;

    {
        let store = config_for(&server, &dir).build_store().unwrap();
        store.login_user("alice", "pw").await.unwrap();
    }

    let store = config_for(&server, &dir).build_store().unwrap();
    let state = store.state();
    assert_eq!(state.token.access_token, "abc");
    assert!(state.user.is_none());

    let client = auth_session::ApiClient::new(auth_session::ApiClientConfig::new(server.uri())).unwrap();
    let authed = store.authorize(&client).unwrap();
    assert_eq!(
        authed.config().default_headers.get("Authorization"),
        Some(&"Bearer abc".to_string())
    );
}

#[tokio::test]
async fn test_register_conflict_surfaces_server_message() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("POST"))
        .and(path("/auth/register"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "statusCode": 409,
            "message": "User already exists"
        })))
        .mount(&server)
        .await;

    let store = config_for(&server, &dir).build_store().unwrap();
    let rejection = store.register_user("alice", "pw").await.unwrap_err();

    assert_eq!(rejection.message(), "User already exists");
    let state = store.state();
    assert_eq!(state.error.message, "User already exists");
    assert_eq!(state.error.code, "409");
    assert!(!state.loading);
    assert!(state.user.is_none());
    assert_eq!(cookie_on_disk(&dir, "jwt"), None);
}

#[tokio::test]
async fn test_login_failure_without_message_uses_default() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
        .mount(&server)
        .await;

    let store = config_for(&server, &dir).build_store().unwrap();
    let rejection = store.login_user("alice", "pw").await.unwrap_err();

    assert_eq!(rejection.message(), "Login failed");
    assert_eq!(store.state().error.message, "Login failed");
}

#[tokio::test]
async fn test_register_then_login_flow() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("POST"))
        .and(path("/auth/register"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "_id": "1",
            "username": "alice",
            "token": { "access_token": "reg" }
        })))
        .expect(1)
        .mount(&server)
        .await;
    mount_login(&server).await;

    let store = config_for(&server, &dir).build_store().unwrap();

    store.register_user("alice", "pw").await.unwrap();
    assert_eq!(store.state().token.access_token, "reg");
    assert_eq!(cookie_on_disk(&dir, "jwt"), None);

    store.login_user("alice", "pw").await.unwrap();
    assert_eq!(store.state().token.access_token, "abc");
    assert_eq!(cookie_on_disk(&dir, "jwt"), Some("abc".to_string()));
}

#[tokio::test]
async fn test_unreachable_service_is_recorded_not_raised() {
    let dir = TempDir::new().unwrap();
    let store = AppConfig::default()
        .with_api_url("http://127.0.0.1:9")
        .with_cookie_file(dir.path().join("cookies.json"))
        .build_store()
        .unwrap();

    let rejection = store.register_user("alice", "pw").await.unwrap_err();
    assert_eq!(rejection.message(), "Registration failed");

    let state = store.state();
    assert_eq!(state.error.message, "Registration failed");
    assert_eq!(state.error.code, "");
    assert_eq!(
        AuthState { error: Default::default(), ..state },
        AuthState::default()
    );
}

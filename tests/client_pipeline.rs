use std::sync::Arc;
use std::time::Duration;

use reqwest::Method;
use sathira::client::storage::{REDIRECT_KEY, TOKEN_KEY, USER_KEY};
use sathira::client::{
    ApiClient, AuthManager, AuthStatus, ClientError, Credentials, FileSessionStorage,
    MemoryNavigator, MemorySessionStorage, Navigator, ReportKind, ReportOutput, RequestConfig,
    SessionStorage,
};
use sathira::client::reports::fetch_report_on;
use sathira::common::ReportFormat;
use sathira::config::ClientConfig;
use sathira::user::Role;
use serde_json::json;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct Harness {
    api: Arc<ApiClient>,
    storage: Arc<MemorySessionStorage>,
    navigator: Arc<MemoryNavigator>,
}

fn harness(base_url: &str) -> Harness {
    let storage = Arc::new(MemorySessionStorage::new());
    let navigator = Arc::new(MemoryNavigator::new("/inventory"));
    let config = ClientConfig::new(format!("{}/api", base_url))
        .with_request_timeout(Duration::from_secs(5));
    let api = ApiClient::new(config, storage.clone(), navigator.clone())
        .expect("client should build");
    Harness {
        api: Arc::new(api),
        storage,
        navigator,
    }
}

async fn authorization_headers(server: &MockServer) -> Vec<Option<String>> {
    server
        .received_requests()
        .await
        .expect("request recording is enabled")
        .iter()
        .map(|request| {
            request
                .headers
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        })
        .collect()
}

fn ok(data: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({"code": 0, "msg": "Success", "resp_data": data}))
}

#[tokio::test]
async fn set_auth_token_controls_the_authorization_header() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/products"))
        .respond_with(ok(json!({"items": [], "page": 1, "limit": 20, "total": 0})))
        .mount(&server)
        .await;
    let h = harness(&server.uri());

    h.api.set_auth_token(Some("t")).unwrap();
    h.api.request(Method::GET, "/products", None, None).await.unwrap();
    assert_eq!(h.storage.get(TOKEN_KEY).as_deref(), Some("t"));

    h.api.set_auth_token(None).unwrap();
    h.api.request(Method::GET, "/products", None, None).await.unwrap();
    assert_eq!(h.storage.get(TOKEN_KEY), None);

    assert_eq!(
        authorization_headers(&server).await,
        vec![Some("Bearer t".to_string()), None]
    );
}

#[tokio::test]
async fn expired_session_clears_token_and_redirects() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/reports/inventory"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"code": 1002, "msg": "Token expired"})),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/products"))
        .respond_with(ok(json!({"items": [], "page": 1, "limit": 20, "total": 0})))
        .mount(&server)
        .await;
    let h = harness(&server.uri());
    h.api.set_auth_token(Some("stale")).unwrap();
    h.storage.set(USER_KEY, r#"{"role":"owner"}"#).unwrap();

    let err = h
        .api
        .request(Method::GET, "/reports/inventory", None, None)
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::SessionExpired { .. }));
    assert_eq!(h.storage.get(TOKEN_KEY), None);
    assert_eq!(h.storage.get(USER_KEY), None);
    assert_eq!(h.storage.get(REDIRECT_KEY).as_deref(), Some("/inventory"));
    assert_eq!(h.navigator.current_path(), "/login?expired=true");
    assert_eq!(h.api.session().status(), AuthStatus::Anonymous);

    h.api.request(Method::GET, "/products", None, None).await.unwrap();
    assert_eq!(
        authorization_headers(&server).await,
        vec![Some("Bearer stale".to_string()), None]
    );
}

#[tokio::test]
async fn late_expiry_of_a_replaced_token_keeps_the_new_session() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/products"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({"code": 1002, "msg": "Token expired"}))
                .set_delay(Duration::from_millis(400)),
        )
        .mount(&server)
        .await;
    let h = harness(&server.uri());
    h.api.set_auth_token(Some("t1")).unwrap();

    let api = h.api.clone();
    let in_flight =
        tokio::spawn(async move { api.request(Method::GET, "/products", None, None).await });
    tokio::time::sleep(Duration::from_millis(100)).await;

    h.api.set_auth_token(Some("t2")).unwrap();
    h.storage.set(USER_KEY, r#"{"role":"owner"}"#).unwrap();
    let user = serde_json::from_value(json!({"username": "u1", "role": "owner"})).unwrap();
    h.api.session().authenticate(user);

    let err = in_flight.await.unwrap().unwrap_err();
    assert!(matches!(err, ClientError::SessionExpired { .. }));
    assert_eq!(h.storage.get(TOKEN_KEY).as_deref(), Some("t2"));
    assert!(h.storage.get(USER_KEY).is_some());
    assert_eq!(h.api.session().status(), AuthStatus::Authenticated);
    assert_eq!(h.storage.get(REDIRECT_KEY), None);
    assert_eq!(h.navigator.history(), Vec::<String>::new());
    assert_eq!(
        authorization_headers(&server).await,
        vec![Some("Bearer t1".to_string())]
    );
}

#[tokio::test]
async fn login_stores_token_and_derives_landing_path() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .and(body_json(json!({"username": "u1", "password": "P@ssw0rd1"})))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"token": "abc123", "user": {"role": "owner"}})),
        )
        .expect(1)
        .mount(&server)
        .await;
    let h = harness(&server.uri());
    let auth = AuthManager::new(h.api.clone());

    let user = auth
        .login(&Credentials::new("u1", "P@ssw0rd1"))
        .await
        .unwrap();

    assert_eq!(user.role(), Some(Role::Owner));
    assert_eq!(h.storage.get(TOKEN_KEY).as_deref(), Some("abc123"));
    assert_eq!(auth.status(), AuthStatus::Authenticated);
    assert_eq!(auth.current_user().and_then(|u| u.role()), Some(Role::Owner));
    assert_eq!(auth.landing_path(), "/reports");
}

#[tokio::test]
async fn failed_login_leaves_stored_state_untouched() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(401).set_body_json(
            json!({"code": 1002, "msg": "Invalid username or password"}),
        ))
        .mount(&server)
        .await;
    let h = harness(&server.uri());
    h.storage.set(TOKEN_KEY, "previous").unwrap();
    let auth = AuthManager::new(h.api.clone());

    let err = auth
        .login(&Credentials::new("u1", "wrong"))
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::Unauthorized { .. }));
    assert_eq!(
        sathira::client::auth::login_error_message(&err),
        "Invalid username or password"
    );
    assert_eq!(h.storage.get(TOKEN_KEY).as_deref(), Some("previous"));
    assert_eq!(h.storage.get(USER_KEY), None);
    assert_eq!(h.navigator.history(), Vec::<String>::new());
}

#[tokio::test]
async fn logout_clears_storage_even_when_server_fails() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/logout"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"code": 5000, "msg": "Internal server error"})))
        .expect(1)
        .mount(&server)
        .await;
    let h = harness(&server.uri());
    h.api.set_auth_token(Some("abc123")).unwrap();
    h.storage.set(USER_KEY, r#"{"role":"shop"}"#).unwrap();
    let auth = AuthManager::new(h.api.clone());

    auth.logout().await;

    assert_eq!(h.storage.get(TOKEN_KEY), None);
    assert_eq!(h.storage.get(USER_KEY), None);
    assert_eq!(auth.status(), AuthStatus::Anonymous);
    assert_eq!(
        authorization_headers(&server).await,
        vec![Some("Bearer abc123".to_string())]
    );
}

#[tokio::test]
async fn logout_with_expired_token_does_not_redirect() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/logout"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"code": 1002, "msg": "Token expired"})),
        )
        .expect(1)
        .mount(&server)
        .await;
    let h = harness(&server.uri());
    h.api.set_auth_token(Some("old")).unwrap();
    h.storage.set(USER_KEY, r#"{"role":"owner"}"#).unwrap();
    let auth = AuthManager::new(h.api.clone());

    auth.logout().await;

    assert_eq!(h.storage.get(TOKEN_KEY), None);
    assert_eq!(h.storage.get(USER_KEY), None);
    assert_eq!(h.storage.get(REDIRECT_KEY), None);
    assert_eq!(h.navigator.history(), Vec::<String>::new());
    assert_eq!(auth.status(), AuthStatus::Anonymous);
}

#[tokio::test]
async fn logout_without_server_still_clears_file_storage() {
    let dir = tempfile::tempdir().unwrap();
    let storage = Arc::new(FileSessionStorage::open(dir.path()).unwrap());
    storage.set(TOKEN_KEY, "abc123").unwrap();
    storage.set(USER_KEY, r#"{"role":"salesman"}"#).unwrap();

    let config = ClientConfig::new("http://127.0.0.1:1/api")
        .with_request_timeout(Duration::from_secs(2));
    let api = ApiClient::new(config, storage, Arc::new(MemoryNavigator::default())).unwrap();
    AuthManager::new(Arc::new(api)).logout().await;

    let reopened = FileSessionStorage::open(dir.path()).unwrap();
    assert_eq!(reopened.get(TOKEN_KEY), None);
    assert_eq!(reopened.get(USER_KEY), None);
}

#[tokio::test]
async fn unreachable_server_is_a_network_error() {
    let h = harness("http://127.0.0.1:1");

    let err = h
        .api
        .request(Method::GET, "/products", None, None)
        .await
        .unwrap_err();

    assert!(err.is_transport());
    assert_eq!(
        err.custom_message(),
        "Unable to reach the server. Please check your connection."
    );
}

#[tokio::test]
async fn validation_errors_are_surfaced_per_field() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/products"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "code": 1000,
            "msg": "Validation failed",
            "errors": [
                {"field": "name", "message": "Product name is required"},
                {"field": "price", "message": "Price cannot be negative"}
            ]
        })))
        .mount(&server)
        .await;
    let h = harness(&server.uri());

    let err = h
        .api
        .request(Method::POST, "/products", Some(&json!({"name": "", "price": -1})), None)
        .await
        .unwrap_err();

    assert_eq!(err.custom_message(), "Validation failed");
    let fields: Vec<&str> = err.field_errors().iter().map(|e| e.field.as_str()).collect();
    assert_eq!(fields, vec!["name", "price"]);
}

#[tokio::test]
async fn initialize_falls_back_to_stored_user_on_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/auth/me"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    let h = harness(&server.uri());
    h.storage.set(TOKEN_KEY, "abc123").unwrap();
    h.storage
        .set(USER_KEY, r#"{"username":"wm1","role":"warehouse_manager"}"#)
        .unwrap();
    let auth = AuthManager::new(h.api.clone());

    assert_eq!(auth.initialize().await, AuthStatus::Authenticated);
    assert_eq!(auth.landing_path(), "/inventory");
    assert_eq!(h.storage.get(TOKEN_KEY).as_deref(), Some("abc123"));
}

#[tokio::test]
async fn initialize_rejected_token_ignores_stored_user() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/auth/me"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"code": 1002, "msg": "Not authorized"})),
        )
        .mount(&server)
        .await;
    let h = harness(&server.uri());
    h.storage.set(TOKEN_KEY, "abc123").unwrap();
    h.storage
        .set(USER_KEY, r#"{"username":"o1","role":"owner"}"#)
        .unwrap();
    let auth = AuthManager::new(h.api.clone());

    assert_eq!(auth.initialize().await, AuthStatus::Anonymous);
    assert_eq!(auth.current_user(), None);
    assert_eq!(h.storage.get(TOKEN_KEY), None);
    assert_eq!(h.storage.get(USER_KEY), None);
}

#[tokio::test]
async fn initialize_confirms_identity_and_mirrors_it() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/auth/me"))
        .respond_with(ok(json!({"username": "s1", "role": "salesman"})))
        .mount(&server)
        .await;
    let h = harness(&server.uri());
    h.storage.set(TOKEN_KEY, "abc123").unwrap();
    let auth = AuthManager::new(h.api.clone());

    assert_eq!(auth.initialize().await, AuthStatus::Authenticated);
    assert_eq!(auth.landing_path(), "/orders");
    let stored: serde_json::Value =
        serde_json::from_str(&h.storage.get(USER_KEY).unwrap()).unwrap();
    assert_eq!(stored["role"], "salesman");
}

#[tokio::test]
async fn initialize_without_fallback_goes_anonymous() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/auth/me"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;
    let h = harness(&server.uri());
    h.storage.set(TOKEN_KEY, "abc123").unwrap();
    let auth = AuthManager::new(h.api.clone());

    assert_eq!(auth.initialize().await, AuthStatus::Anonymous);
    assert_eq!(h.storage.get(TOKEN_KEY), None);

    let empty = harness(&server.uri());
    assert_eq!(
        AuthManager::new(empty.api.clone()).initialize().await,
        AuthStatus::Anonymous
    );
}

#[tokio::test]
async fn reset_password_surfaces_invalid_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/reset-password"))
        .and(body_json(json!({"token": "used", "new_password": "N3wSecret1"})))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "code": 1000,
            "msg": "Validation failed",
            "errors": [{"field": "token", "message": "Reset link is invalid or has expired"}]
        })))
        .mount(&server)
        .await;
    let h = harness(&server.uri());
    let auth = AuthManager::new(h.api.clone());

    let err = auth.reset_password("used", "N3wSecret1").await.unwrap_err();

    let fields: Vec<&str> = err.field_errors().iter().map(|e| e.field.as_str()).collect();
    assert_eq!(fields, vec!["token"]);
    assert_eq!(h.navigator.history(), Vec::<String>::new());
}

#[tokio::test]
async fn pdf_report_becomes_a_named_document() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/reports/low-stock"))
        .and(query_param("format", "pdf"))
        .and(query_param("threshold", "5"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(b"%PDF-1.5 fake".to_vec(), "application/pdf"),
        )
        .mount(&server)
        .await;
    let h = harness(&server.uri());
    let date = chrono::NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();

    let output = fetch_report_on(
        &h.api,
        ReportKind::LowStock,
        RequestConfig::new().query("threshold", 5),
        ReportFormat::Pdf,
        date,
    )
    .await
    .unwrap();

    match output {
        ReportOutput::Document { filename, bytes } => {
            assert_eq!(filename, "low-stock-report-2026-10-19.pdf");
            assert_eq!(bytes, b"%PDF-1.5 fake");
        }
        ReportOutput::Json(_) => panic!("expected a document"),
    }
}

#[tokio::test]
async fn json_report_is_returned_unwrapped() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/reports/inventory"))
        .and(query_param("format", "json"))
        .respond_with(ok(json!({"total_products": 2, "total_units": 40})))
        .mount(&server)
        .await;
    let h = harness(&server.uri());

    let output = sathira::client::fetch_report(
        &h.api,
        ReportKind::Inventory,
        RequestConfig::new().query("format", "pdf"),
        ReportFormat::Json,
    )
    .await
    .unwrap();

    match output {
        ReportOutput::Json(value) => assert_eq!(value["total_units"], 40),
        ReportOutput::Document { .. } => panic!("expected json"),
    }
}

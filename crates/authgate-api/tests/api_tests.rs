//! API Integration Tests
//!
//! Every test drives the full router over the in-memory credential store.

use authgate_api::auth::jwt::{sign, Claims, TokenIssuer, ACCESS_TOKEN_TTL_SECS};
use authgate_api::{
    create_router_for_testing, create_router_for_testing_with_config,
    create_router_for_testing_with_store,
};
use authgate_core::AppConfig;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

/// Helper to create a test request
fn create_json_request(method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json");

    match body {
        Some(json_body) => builder
            .body(Body::from(serde_json::to_string(&json_body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

fn with_bearer(mut request: Request<Body>, token: &str) -> Request<Body> {
    request.headers_mut().insert(
        header::AUTHORIZATION,
        format!("Bearer {token}").parse().unwrap(),
    );
    request
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

async fn register(app: &Router, email: &str, password: &str) -> (StatusCode, Value) {
    send(
        app,
        create_json_request(
            "POST",
            "/auth/register",
            Some(json!({ "name": "Test User", "email": email, "password": password })),
        ),
    )
    .await
}

async fn login(app: &Router, email: &str, password: &str) -> (StatusCode, Value) {
    send(
        app,
        create_json_request(
            "POST",
            "/auth/login",
            Some(json!({ "email": email, "password": password })),
        ),
    )
    .await
}

fn access_token(body: &Value) -> String {
    body["data"]["auth"]["token"]["token"]
        .as_str()
        .unwrap()
        .to_string()
}

fn refresh_token(body: &Value) -> String {
    body["data"]["auth"]["refreshToken"]["token"]
        .as_str()
        .unwrap()
        .to_string()
}

fn user_id(body: &Value) -> Uuid {
    Uuid::parse_str(body["data"]["id"].as_str().unwrap()).unwrap()
}

// =============================================================================
// Health Check Tests
// =============================================================================

#[tokio::test]
async fn test_health_check() {
    let app = create_router_for_testing();

    let (status, json) = send(
        &app,
        Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Ok");
    assert!(json["uptime"].is_number());
    assert!(json["date"].is_string());
}

#[tokio::test]
async fn test_unknown_route() {
    let app = create_router_for_testing();

    let (status, json) = send(&app, create_json_request("GET", "/nope", None)).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], 404);
    assert_eq!(json["message"], "Route not found");
    assert_eq!(json["data"], json!({}));
}

#[tokio::test]
async fn test_security_headers_present() {
    let app = create_router_for_testing();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(
        response.headers().get(header::X_CONTENT_TYPE_OPTIONS).unwrap(),
        "nosniff"
    );
    assert_eq!(response.headers().get(header::X_FRAME_OPTIONS).unwrap(), "DENY");
}

#[tokio::test]
async fn test_openapi_document_served() {
    let app = create_router_for_testing();

    let (status, json) = send(
        &app,
        Request::builder()
            .uri("/api-docs/openapi.json")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(json["paths"]["/auth/login"].is_object());
}

// =============================================================================
// Registration and Login Tests
// =============================================================================

#[tokio::test]
async fn test_register_then_login() {
    let app = create_router_for_testing();

    let (status, json) = register(&app, "ada@example.com", "correct-horse").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["code"], 200);
    assert_eq!(json["message"], "Success");
    assert_eq!(json["data"]["email"], "ada@example.com");

    let (status, json) = login(&app, "ada@example.com", "correct-horse").await;
    assert_eq!(status, StatusCode::OK);

    for block in ["token", "refreshToken"] {
        let token = &json["data"]["auth"][block];
        assert!(!token["token"].as_str().unwrap().is_empty());
        assert!(token["issued"].as_i64().unwrap() < token["expires"].as_i64().unwrap());
    }
}

#[tokio::test]
async fn test_register_missing_field_is_forbidden() {
    let app = create_router_for_testing();

    let (status, json) = send(
        &app,
        create_json_request(
            "POST",
            "/auth/register",
            Some(json!({ "email": "ada@example.com", "password": "pw" })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["message"], "Name cannot be empty");
    assert!(json["data"].is_null());
}

#[tokio::test]
async fn test_duplicate_registration() {
    let (app, store) = create_router_for_testing_with_store();

    let (status, _) = register(&app, "ada@example.com", "pw-1").await;
    assert_eq!(status, StatusCode::OK);

    let (status, json) = register(&app, "ada@example.com", "pw-2").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["message"], "Email already exists.");
    assert_eq!(store.user_count().await, 1);
}

#[tokio::test]
async fn test_login_failures_are_indistinguishable() {
    let app = create_router_for_testing();
    register(&app, "ada@example.com", "pw-1").await;

    let (wrong_status, wrong_password) = login(&app, "ada@example.com", "wrong").await;
    let (ghost_status, unknown_email) = login(&app, "ghost@example.com", "pw-1").await;

    assert_eq!(wrong_status, StatusCode::BAD_REQUEST);
    assert_eq!(ghost_status, StatusCode::BAD_REQUEST);
    assert_eq!(wrong_password, unknown_email);
    assert_eq!(wrong_password["message"], "Invalid Email or password");
}

#[tokio::test]
async fn test_login_missing_password() {
    let app = create_router_for_testing();

    let (status, json) = send(
        &app,
        create_json_request("POST", "/auth/login", Some(json!({ "email": "a@b.c" }))),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["message"], "Password cannot be empty");
}

#[tokio::test]
async fn test_second_login_leaves_one_refresh_token() {
    let (app, store) = create_router_for_testing_with_store();
    let (_, registered) = register(&app, "ada@example.com", "pw-1").await;
    let id = user_id(&registered);

    let (_, first) = login(&app, "ada@example.com", "pw-1").await;
    let rows = store.refresh_tokens_for(id).await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].token, refresh_token(&first));

    let (_, second) = login(&app, "ada@example.com", "pw-1").await;
    let rows = store.refresh_tokens_for(id).await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].token, refresh_token(&second));
    assert_ne!(refresh_token(&first), refresh_token(&second));
}

// =============================================================================
// Refresh Token Tests
// =============================================================================

#[tokio::test]
async fn test_refresh_unknown_token() {
    let app = create_router_for_testing();
    let forged = TokenIssuer::from_config(&AppConfig::for_testing().auth)
        .issue_refresh_token(Uuid::new_v4(), "ghost@example.com")
        .unwrap();

    let (status, json) = send(
        &app,
        create_json_request(
            "POST",
            "/auth/refresh-token",
            Some(json!({ "refreshToken": forged.token })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["data"], json!({}));
}

#[tokio::test]
async fn test_refresh_echoes_refresh_token() {
    let app = create_router_for_testing();
    let (_, registered) = register(&app, "ada@example.com", "pw-1").await;

    let (status, json) = send(
        &app,
        create_json_request(
            "POST",
            "/auth/refresh-token",
            Some(json!({ "refreshToken": refresh_token(&registered) })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        json["data"]["auth"]["refreshToken"],
        registered["data"]["auth"]["refreshToken"]
    );
    assert_ne!(access_token(&json), access_token(&registered));
    assert_eq!(json["data"]["id"], registered["data"]["id"]);
}

#[tokio::test]
async fn test_refresh_missing_token() {
    let app = create_router_for_testing();

    let (status, _) = send(
        &app,
        create_json_request("POST", "/auth/refresh-token", Some(json!({}))),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

// =============================================================================
// Session Middleware Tests
// =============================================================================

#[tokio::test]
async fn test_me_requires_bearer_token() {
    let app = create_router_for_testing();

    let (status, json) = send(&app, create_json_request("GET", "/user/me", None)).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["code"], 401);
}

#[tokio::test]
async fn test_me_rejects_wrong_secret() {
    let app = create_router_for_testing();
    let (_, registered) = register(&app, "ada@example.com", "pw-1").await;

    let forged = TokenIssuer::new("some-other-access-secret", "some-other-refresh-secret")
        .issue_access_token(user_id(&registered), "ada@example.com")
        .unwrap();

    let (status, _) = send(
        &app,
        with_bearer(create_json_request("GET", "/user/me", None), &forged.token),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_me_rejects_refresh_token() {
    let app = create_router_for_testing();
    let (_, registered) = register(&app, "ada@example.com", "pw-1").await;

    let (status, _) = send(
        &app,
        with_bearer(
            create_json_request("GET", "/user/me", None),
            &refresh_token(&registered),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_me_rejects_expired_token() {
    let app = create_router_for_testing();
    let (_, registered) = register(&app, "ada@example.com", "pw-1").await;

    let now = chrono::Utc::now().timestamp();
    let expired = sign(
        &Claims {
            sub: user_id(&registered).to_string(),
            email: "ada@example.com".to_string(),
            iat: now - ACCESS_TOKEN_TTL_SECS - 5,
            exp: now - 5,
            jti: Uuid::new_v4().to_string(),
        },
        AppConfig::for_testing().auth.access_token_secret.as_bytes(),
    )
    .unwrap();

    let (status, _) = send(
        &app,
        with_bearer(create_json_request("GET", "/user/me", None), &expired),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_me_returns_own_profile() {
    let app = create_router_for_testing();
    let (_, registered) = register(&app, "ada@example.com", "pw-1").await;

    let (status, json) = send(
        &app,
        with_bearer(
            create_json_request("GET", "/user/me", None),
            &access_token(&registered),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["id"], registered["data"]["id"]);
    assert_eq!(json["data"]["email"], "ada@example.com");
    assert_eq!(json["data"]["displayName"], "Test User");
    assert!(json["data"]["createdAt"].is_string());
    assert!(json["data"].get("password_hash").is_none());
}

// =============================================================================
// Profile Management Tests
// =============================================================================

#[tokio::test]
async fn test_change_password_same_password() {
    let app = create_router_for_testing();
    let (_, registered) = register(&app, "ada@example.com", "pw-1").await;

    let (status, json) = send(
        &app,
        with_bearer(
            create_json_request(
                "POST",
                "/user/change-password",
                Some(json!({ "password": "pw-1", "prevPassword": "pw-1" })),
            ),
            &access_token(&registered),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["message"], "Cannot be same password");
}

#[tokio::test]
async fn test_change_password_then_login() {
    let (app, store) = create_router_for_testing_with_store();
    let (_, registered) = register(&app, "ada@example.com", "pw-1").await;
    let id = user_id(&registered);

    let (status, changed) = send(
        &app,
        with_bearer(
            create_json_request(
                "POST",
                "/user/change-password",
                Some(json!({ "password": "pw-2", "prevPassword": "pw-1" })),
            ),
            &access_token(&registered),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let rows = store.refresh_tokens_for(id).await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].token, refresh_token(&changed));

    let (status, _) = login(&app, "ada@example.com", "pw-1").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = login(&app, "ada@example.com", "pw-2").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_body_uid_is_ignored_for_user_routes() {
    let app = create_router_for_testing();
    let (_, ada) = register(&app, "ada@example.com", "pw-ada").await;
    let (_, bob) = register(&app, "bob@example.com", "pw-bob").await;

    // Ada's token with Bob's uid still changes Ada's password
    let (status, json) = send(
        &app,
        with_bearer(
            create_json_request(
                "POST",
                "/user/change-password",
                Some(json!({
                    "uid": bob["data"]["id"],
                    "password": "pw-new",
                    "prevPassword": "pw-ada"
                })),
            ),
            &access_token(&ada),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["id"], ada["data"]["id"]);
    assert_eq!(login(&app, "bob@example.com", "pw-bob").await.0, StatusCode::OK);
}

#[tokio::test]
async fn test_update_fcm_token() {
    let app = create_router_for_testing();
    let (_, registered) = register(&app, "ada@example.com", "pw-1").await;
    let token = access_token(&registered);

    let (status, json) = send(
        &app,
        with_bearer(
            create_json_request(
                "POST",
                "/user/update_fcm_token",
                Some(json!({ "fcm_token": "device-123" })),
            ),
            &token,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["fcm_token"], "device-123");
    assert!(json["data"].get("password_hash").is_none());

    let (status, json) = send(
        &app,
        with_bearer(
            create_json_request("POST", "/user/update_fcm_token", Some(json!({}))),
            &token,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["message"], "Valid fcm_token required.");
}

#[tokio::test]
async fn test_signout_revokes_refresh_token() {
    let (app, store) = create_router_for_testing_with_store();
    let (_, registered) = register(&app, "ada@example.com", "pw-1").await;
    let token = access_token(&registered);

    let (status, json) = send(
        &app,
        with_bearer(
            create_json_request("POST", "/user/signout", Some(json!({}))),
            &token,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"], json!({}));
    assert!(store.refresh_tokens_for(user_id(&registered)).await.is_empty());

    let (status, _) = send(
        &app,
        create_json_request(
            "POST",
            "/auth/refresh-token",
            Some(json!({ "refreshToken": refresh_token(&registered) })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Access tokens are not looked up, so the old one still works
    let (status, _) = send(
        &app,
        with_bearer(create_json_request("GET", "/user/me", None), &token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

// =============================================================================
// Client Credential Gate Tests
// =============================================================================

fn gated_config() -> AppConfig {
    let mut config = AppConfig::for_testing();
    config.auth.api_key = Some("test-key".to_string());
    config.auth.app_id = Some("test-app".to_string());
    config
}

#[tokio::test]
async fn test_api_key_gate_rejects_missing_headers() {
    let (app, _) = create_router_for_testing_with_config(gated_config());

    let (status, json) = login(&app, "ada@example.com", "pw-1").await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["message"], "Invalid api key or app id.");
}

#[tokio::test]
async fn test_api_key_gate_accepts_matching_headers() {
    let (app, _) = create_router_for_testing_with_config(gated_config());

    let mut request = create_json_request(
        "POST",
        "/auth/register",
        Some(json!({ "name": "Ada", "email": "ada@example.com", "password": "pw-1" })),
    );
    request
        .headers_mut()
        .insert("x-api-key", "test-key".parse().unwrap());
    request
        .headers_mut()
        .insert("x-app-id", "test-app".parse().unwrap());

    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);

    // The health probe is never gated
    let (status, _) = send(
        &app,
        Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

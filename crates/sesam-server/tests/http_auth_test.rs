//! End-to-end tests for the HTTP surface, driven through the router
//! with the in-memory store engines behind it.

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use sesam_auth::{AuthConfig, AuthService, NewUserInput, SessionService};
use sesam_server::routes::router;
use sesam_server::state::AppState;
use sesam_store::{KvSessionStore, MemoryKv, MemoryUserStore};
use tower::ServiceExt;

/// Helper: a router with one seeded account (admin@example.com).
async fn app() -> Router {
    let users = MemoryUserStore::new();
    let sessions = SessionService::new(KvSessionStore::new(MemoryKv::new()));
    let auth = AuthService::new(users, sessions, AuthConfig::default());

    auth.create_user(
        0,
        NewUserInput {
            name: "Admin".into(),
            email: "admin@example.com".into(),
            address: String::new(),
            password: "admin-password".into(),
        },
    )
    .await
    .unwrap();

    router(AppState::new(auth))
}

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("session {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

fn json_request(method: &str, uri: &str, token: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("session {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Helper: log the seeded admin in and return the session token.
async fn login(app: &Router) -> String {
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/v1/auth/login",
            None,
            r#"{"email":"admin@example.com","password":"admin-password"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    json["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn health_is_open() {
    let app = app().await;
    let response = app.oneshot(get("/health", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn login_returns_token_and_session() {
    let app = app().await;
    let response = app
        .oneshot(json_request(
            "POST",
            "/v1/auth/login",
            None,
            r#"{"email":"admin@example.com","password":"admin-password"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let token = json["token"].as_str().unwrap();
    assert_eq!(token.len(), 64);

    // The session rides along, token under "id", kind under "type".
    assert_eq!(json["session"]["id"], json["token"]);
    assert_eq!(json["session"]["type"], "login");
    assert_eq!(json["session"]["user"]["name"], "Admin");

    // No credential material in the payload, under any spelling.
    let user = json["session"]["user"].as_object().unwrap();
    assert!(!user.contains_key("passwordHash"));
    assert!(!user.contains_key("password_hash"));
}

#[tokio::test]
async fn login_failure_is_generic_and_400() {
    let app = app().await;
    let response = app
        .oneshot(json_request(
            "POST",
            "/v1/auth/login",
            None,
            r#"{"email":"admin@example.com","password":"nope"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert_eq!(json["error"], "email or password is wrong");
}

#[tokio::test]
async fn missing_token_is_403() {
    let app = app().await;
    let response = app.oneshot(get("/v1/users", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn wrong_scheme_is_403() {
    let app = app().await;
    let request = Request::builder()
        .uri("/v1/users")
        .header(header::AUTHORIZATION, "Bearer some-jwt")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn stale_token_is_401() {
    let app = app().await;
    let response = app
        .oneshot(get("/v1/users", Some("deadbeef")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn session_endpoint_reflects_the_login() {
    let app = app().await;
    let token = login(&app).await;

    let response = app
        .oneshot(get("/v1/auth/session", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["id"].as_str(), Some(token.as_str()));
    assert_eq!(json["user"]["email"], "admin@example.com");
}

#[tokio::test]
async fn extend_renews_the_session() {
    let app = app().await;
    let token = login(&app).await;

    let before = body_json(
        app.clone()
            .oneshot(get("/v1/auth/session", Some(&token)))
            .await
            .unwrap(),
    )
    .await;

    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    let response = app
        .oneshot(json_request("POST", "/v1/auth/extend", Some(&token), "{}"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let renewed = body_json(response).await;
    let parse = |value: &serde_json::Value| {
        chrono::DateTime::parse_from_rfc3339(value.as_str().unwrap()).unwrap()
    };
    assert!(
        parse(&renewed["expiredAt"]) > parse(&before["expiredAt"]),
        "renewal should push the expiry out"
    );
}

#[tokio::test]
async fn logout_invalidates_the_token() {
    let app = app().await;
    let token = login(&app).await;

    let response = app
        .clone()
        .oneshot(json_request("POST", "/v1/auth/logout", Some(&token), "{}"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .oneshot(get("/v1/auth/session", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn user_crud_round_trips() {
    let app = app().await;
    let token = login(&app).await;

    // Create.
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/v1/users",
            Some(&token),
            r#"{"name":"Bob","email":"bob@example.com","address":"Builder lane 2","password":"bob-password"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let bob = body_json(response).await;
    let bob_id = bob["id"].as_i64().unwrap();
    assert_eq!(bob["createdBy"].as_i64(), Some(1));

    // Duplicate email conflicts.
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/v1/users",
            Some(&token),
            r#"{"name":"Bob II","email":"BOB@example.com","address":"","password":"x"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // List with a filter.
    let response = app
        .clone()
        .oneshot(get("/v1/users?search=builder", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let listed = body_json(response).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);

    // Read, update, delete.
    let response = app
        .clone()
        .oneshot(get(&format!("/v1/users/{bob_id}"), Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            &format!("/v1/users/{bob_id}"),
            Some(&token),
            r#"{"name":"Robert"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["name"], "Robert");

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/v1/users/{bob_id}"))
                .header(header::AUTHORIZATION, format!("session {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .oneshot(get(&format!("/v1/users/{bob_id}"), Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn profile_update_shows_up_in_the_live_session() {
    let app = app().await;
    let token = login(&app).await;

    // The admin renames themselves; the already-issued session must
    // reflect it without a new login.
    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            "/v1/users/1",
            Some(&token),
            r#"{"name":"Root"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(get("/v1/auth/session", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["user"]["name"], "Root");
}

#[tokio::test]
async fn deleting_the_signed_in_user_kills_the_session() {
    let app = app().await;
    let token = login(&app).await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/v1/users/1")
                .header(header::AUTHORIZATION, format!("session {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app.oneshot(get("/v1/users", Some(&token))).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn password_change_round_trips() {
    let app = app().await;
    let token = login(&app).await;

    // Wrong current password is rejected with the generic message.
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/v1/users/1/password",
            Some(&token),
            r#"{"currentPassword":"nope","newPassword":"next-password"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/v1/users/1/password",
            Some(&token),
            r#"{"currentPassword":"admin-password","newPassword":"next-password"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    // The session that made the change is still alive.
    let response = app
        .clone()
        .oneshot(get("/v1/auth/session", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Only the new password logs in now.
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/v1/auth/login",
            None,
            r#"{"email":"admin@example.com","password":"admin-password"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .oneshot(json_request(
            "POST",
            "/v1/auth/login",
            None,
            r#"{"email":"admin@example.com","password":"next-password"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

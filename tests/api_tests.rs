//! Integration tests for registration, login and the bearer-token gate.

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use renty::config::Config;
use std::sync::Arc;
use tower::ServiceExt;

const TEST_SECRET: &str = "api-test-secret";

async fn spawn_app() -> (Arc<renty::api::AppState>, Router) {
    let db_path = std::env::temp_dir().join(format!("renty-api-test-{}.db", uuid::Uuid::new_v4()));
    let upload_dir =
        std::env::temp_dir().join(format!("renty-api-uploads-{}", uuid::Uuid::new_v4()));

    let mut config = Config::default();
    config.general.database_path = format!("sqlite:{}", db_path.display());
    config.uploads.path = upload_dir.display().to_string();
    config.auth.jwt_secret = TEST_SECRET.to_string();

    let state = renty::api::create_app_state_from_config(config, None)
        .await
        .expect("Failed to create app state");
    let router = renty::api::router(state.clone()).await;
    (state, router)
}

fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Registers a user and logs them in, returning `(access_token, user_id)`.
async fn register_and_login(app: &Router, name: &str, email: &str) -> (String, String) {
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/home/register",
            serde_json::json!({ "name": name, "email": email, "password": "secret123" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/home/login",
            serde_json::json!({ "email": email, "password": "secret123" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    (
        body["data"]["access_token"].as_str().unwrap().to_string(),
        body["data"]["user_id"].as_str().unwrap().to_string(),
    )
}

#[tokio::test]
async fn test_register_validates_and_rejects_duplicates() {
    let (_, app) = spawn_app().await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/home/register",
            serde_json::json!({ "name": "Ada" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Missing name, email or password");

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/home/register",
            serde_json::json!({ "name": "Ada", "email": "ada@example.com", "password": "secret123" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["message"], "User created successfully");
    assert!(body["data"]["user_id"].is_string());

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/home/register",
            serde_json::json!({ "name": "Ada Again", "email": "ada@example.com", "password": "other456" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Email already registered");
    assert_eq!(body["code"], "conflict");
}

#[tokio::test]
async fn test_login_failures_are_distinguished() {
    let (_, app) = spawn_app().await;
    register_and_login(&app, "Ben", "ben@example.com").await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/home/login",
            serde_json::json!({ "email": "nobody@example.com", "password": "secret123" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Email not found");

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/home/login",
            serde_json::json!({ "email": "ben@example.com", "password": "wrong" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Invalid password");
}

#[tokio::test]
async fn test_gate_rejects_missing_and_malformed_headers() {
    let (_, app) = spawn_app().await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/home/search")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Authorization header missing");
    assert_eq!(body["code"], "unauthorized");

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/home/search")
                .header("Authorization", "Basic dXNlcjpwYXNz")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(
        body["error"],
        "Authorization header is invalid. Bearer token missing"
    );

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/home/search")
                .header("Authorization", "Bearer ")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(
        body["error"],
        "Authorization header is invalid. Bearer token missing"
    );
}

#[tokio::test]
async fn test_gate_rejects_garbage_and_foreign_tokens() {
    let (_, app) = spawn_app().await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/home/search")
                .header("Authorization", "Bearer not-a-jwt")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Invalid token");
    assert_eq!(body["code"], "invalid_token");

    // Signed with the wrong secret.
    let foreign = renty::auth::TokenSigner::new("some-other-secret", 24)
        .mint("intruder")
        .unwrap();
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/home/search")
                .header("Authorization", format!("Bearer {foreign}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Invalid token");
}

#[tokio::test]
async fn test_gate_reports_expiry_distinctly() {
    let (_, app) = spawn_app().await;

    // Correct secret, but the token expired two hours ago.
    let stale = renty::auth::TokenSigner::new(TEST_SECRET, -2)
        .mint("whoever")
        .unwrap();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/home/search")
                .header("Authorization", format!("Bearer {stale}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Token has expired");
    assert_eq!(body["code"], "token_expired");
}

#[tokio::test]
async fn test_logout_revokes_only_the_presented_token() {
    let (_, app) = spawn_app().await;
    let (first_token, _) = register_and_login(&app, "Cas", "cas@example.com").await;

    // A second login mints an independent token for the same user.
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/home/login",
            serde_json::json!({ "email": "cas@example.com", "password": "secret123" }),
        ))
        .await
        .unwrap();
    let second_token = body_json(response).await["data"]["access_token"]
        .as_str()
        .unwrap()
        .to_string();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/home/logout")
                .header("Authorization", format!("Bearer {first_token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["message"], "Logged out successfully");

    // The revoked token is dead everywhere, including logout itself.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/home/search")
                .header("Authorization", format!("Bearer {first_token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Token has been revoked");
    assert_eq!(body["code"], "token_revoked");

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/home/logout")
                .header("Authorization", format!("Bearer {first_token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // The user's other token is untouched.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/home/search")
                .header("Authorization", format!("Bearer {second_token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_gate_rejects_tokens_of_deleted_users() {
    let (_, app) = spawn_app().await;
    let (token, user_id) = register_and_login(&app, "Dee", "dee@example.com").await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/users/user/{user_id}"))
                .header("Authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // The token still decodes, but its subject is gone.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/home/search")
                .header("Authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["error"], "User not found");
    assert_eq!(body["code"], "unknown_subject");
}

#[tokio::test]
async fn test_public_routes_skip_the_gate() {
    let (_, app) = spawn_app().await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/splash")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["message"], "Welcome to Renty");

    // Public title search sits under a protected prefix; the static
    // segment must still win over the guarded {post_id} route.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/home/posts/search?title=anything")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["error"], "No posts found");
}

//! Integration tests for listing CRUD, payload validation and the
//! availability state machine.

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use renty::config::Config;
use std::sync::Arc;
use tower::ServiceExt;

async fn spawn_app() -> (Arc<renty::api::AppState>, Router) {
    let db_path =
        std::env::temp_dir().join(format!("renty-posts-test-{}.db", uuid::Uuid::new_v4()));
    let upload_dir =
        std::env::temp_dir().join(format!("renty-posts-uploads-{}", uuid::Uuid::new_v4()));

    let mut config = Config::default();
    config.general.database_path = format!("sqlite:{}", db_path.display());
    config.uploads.path = upload_dir.display().to_string();

    let state = renty::api::create_app_state_from_config(config, None)
        .await
        .expect("Failed to create app state");
    let router = renty::api::router(state.clone()).await;
    (state, router)
}

fn json_request(method: &str, uri: &str, token: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("Authorization", format!("Bearer {token}"))
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn login(app: &Router, name: &str, email: &str) -> String {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/home/register")
                .header("Content-Type", "application/json")
                .body(Body::from(
                    serde_json::json!({ "name": name, "email": email, "password": "secret123" })
                        .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/home/login")
                .header("Content-Type", "application/json")
                .body(Body::from(
                    serde_json::json!({ "email": email, "password": "secret123" }).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await["data"]["access_token"]
        .as_str()
        .unwrap()
        .to_string()
}

fn valid_payload(status: &str) -> serde_json::Value {
    serde_json::json!({
        "instrument_type": "Guitar",
        "title": "Fender Stratocaster",
        "brand": "Fender",
        "price": 120.5,
        "description": "Classic electric guitar in great shape",
        "phone_number": "12345678",
        "status": status,
        "location": "Berlin"
    })
}

async fn create_post(app: &Router, token: &str, payload: serde_json::Value) -> String {
    let response = app
        .clone()
        .oneshot(json_request("POST", "/posts/create", token, payload))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["data"]["message"], "Post created successfully");
    body["data"]["post_id"].as_str().unwrap().to_string()
}

/// Sends a payload to /posts/create and asserts the first validation
/// failure it should trip over.
async fn assert_rejected(app: &Router, token: &str, payload: serde_json::Value, message: &str) {
    let response = app
        .clone()
        .oneshot(json_request("POST", "/posts/create", token, payload))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], message, "unexpected first error");
    assert_eq!(body["code"], "validation");
}

#[tokio::test]
async fn test_create_reports_first_validation_error_only() {
    let (_, app) = spawn_app().await;
    let token = login(&app, "Eve", "eve@example.com").await;

    assert_rejected(
        &app,
        &token,
        serde_json::json!({}),
        "Title must be at least 5 characters long.",
    )
    .await;

    assert_rejected(
        &app,
        &token,
        serde_json::json!({ "title": "Drum" }),
        "Title must be at least 5 characters long.",
    )
    .await;

    assert_rejected(
        &app,
        &token,
        serde_json::json!({ "title": "Fender Stratocaster", "description": "too short" }),
        "Description must be at least 10 characters long.",
    )
    .await;

    assert_rejected(
        &app,
        &token,
        serde_json::json!({ "title": "Fender Stratocaster" }),
        "Price must be a valid number.",
    )
    .await;

    assert_rejected(
        &app,
        &token,
        serde_json::json!({ "title": "Fender Stratocaster", "price": "not a price" }),
        "Price must be a valid number.",
    )
    .await;

    assert_rejected(
        &app,
        &token,
        serde_json::json!({ "title": "Fender Stratocaster", "price": 0 }),
        "Price must be a valid number.",
    )
    .await;

    // A numeric string with padding is an accepted price; the phone rule
    // is the next to fire.
    assert_rejected(
        &app,
        &token,
        serde_json::json!({ "title": "Fender Stratocaster", "price": "  120.5  ", "phone_number": "123" }),
        "Phone number must be at least 8 digits long and contain only digits.",
    )
    .await;

    assert_rejected(
        &app,
        &token,
        serde_json::json!({ "title": "Fender Stratocaster", "price": 120.5, "phone_number": "12345abc" }),
        "Phone number must be at least 8 digits long and contain only digits.",
    )
    .await;

    assert_rejected(
        &app,
        &token,
        serde_json::json!({ "title": "Fender Stratocaster", "price": 120.5, "phone_number": "12345678", "status": "for-sale" }),
        "Status must be 'for rental' or 'for sale'.",
    )
    .await;

    assert_rejected(
        &app,
        &token,
        serde_json::json!({ "title": "Fender Stratocaster", "price": 120.5, "phone_number": "12345678", "status": "for sale", "image": "https://example.com/photo.gif" }),
        "Image URL must point to a valid image format (png, jpg, jpeg).",
    )
    .await;

    assert_rejected(
        &app,
        &token,
        serde_json::json!({ "title": "Fender Stratocaster", "price": 120.5, "phone_number": "12345678", "status": "for sale", "image": "ghost.png" }),
        "Image must be a valid URL or a valid local file in the uploads folder.",
    )
    .await;

    assert_rejected(
        &app,
        &token,
        serde_json::json!({ "title": "Fender Stratocaster", "price": 120.5, "phone_number": "12345678", "status": "for sale", "instrument_type": "Flute" }),
        "Instrument type must be one of: Guitar, Piano, Drums, Violin.",
    )
    .await;

    // Category matching is exact-case.
    assert_rejected(
        &app,
        &token,
        serde_json::json!({ "title": "Fender Stratocaster", "price": 120.5, "phone_number": "12345678", "status": "for sale", "instrument_type": "guitar" }),
        "Instrument type must be one of: Guitar, Piano, Drums, Violin.",
    )
    .await;

    assert_rejected(
        &app,
        &token,
        serde_json::json!({ "title": "Fender Stratocaster", "price": 120.5, "phone_number": "12345678", "status": "for sale", "instrument_type": "Guitar", "brand": "ab" }),
        "Brand must be at least 3 characters long.",
    )
    .await;

    assert_rejected(
        &app,
        &token,
        serde_json::json!({ "title": "Fender Stratocaster", "price": 120.5, "phone_number": "12345678", "status": "for sale", "instrument_type": "Guitar", "brand": "Fender" }),
        "Location is required",
    )
    .await;

    create_post(&app, &token, valid_payload("for sale")).await;
}

#[tokio::test]
async fn test_create_requires_auth() {
    let (_, app) = spawn_app().await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/posts/create")
                .header("Content-Type", "application/json")
                .body(Body::from(valid_payload("for sale").to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_update_post_is_owner_scoped_and_partial() {
    let (_, app) = spawn_app().await;
    let token = login(&app, "Fay", "fay@example.com").await;
    let post_id = create_post(&app, &token, valid_payload("for rental")).await;

    // Omitted optional fields keep their stored values.
    let mut changed = valid_payload("for rental");
    changed["title"] = serde_json::json!("Gibson Les Paul Custom");
    changed["brand"] = serde_json::json!("Gibson");
    changed.as_object_mut().unwrap().remove("description");

    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            &format!("/posts/posts/{post_id}"),
            &token,
            changed,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["message"], "Post updated successfully");
    assert_eq!(body["data"]["post"]["title"], "Gibson Les Paul Custom");
    assert_eq!(body["data"]["post"]["brand"], "Gibson");
    assert_eq!(
        body["data"]["post"]["description"],
        "Classic electric guitar in great shape"
    );

    // The whole payload still has to validate.
    let mut invalid = valid_payload("for rental");
    invalid["brand"] = serde_json::json!("ab");
    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            &format!("/posts/posts/{post_id}"),
            &token,
            invalid,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Brand must be at least 3 characters long.");

    // Status is immutable once the post exists.
    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            &format!("/posts/posts/{post_id}"),
            &token,
            valid_payload("for sale"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Status cannot be changed after creation");

    // Another user cannot see, let alone edit, the post.
    let other_token = login(&app, "Gus", "gus@example.com").await;
    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            &format!("/posts/posts/{post_id}"),
            &other_token,
            valid_payload("for rental"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Post not found");
}

#[tokio::test]
async fn test_delete_post() {
    let (_, app) = spawn_app().await;
    let token = login(&app, "Hal", "hal@example.com").await;
    let post_id = create_post(&app, &token, valid_payload("for sale")).await;

    let response = app
        .clone()
        .oneshot(json_request(
            "DELETE",
            &format!("/posts/posts/{post_id}"),
            &token,
            serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["message"], "Post deleted successfully.");

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/home/posts/{post_id}"))
                .header("Authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Post not found.");

    let response = app
        .clone()
        .oneshot(json_request(
            "DELETE",
            &format!("/posts/posts/{post_id}"),
            &token,
            serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Post not found");
}

#[tokio::test]
async fn test_rental_availability_lifecycle() {
    let (_, app) = spawn_app().await;
    let token = login(&app, "Ivy", "ivy@example.com").await;
    let post_id = create_post(&app, &token, valid_payload("for rental")).await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/home/posts/{post_id}"))
                .header("Authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["data"]["availability"], "available");

    let response = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            &format!("/posts/{post_id}/status"),
            &token,
            serde_json::json!({ "availability": "rented" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["message"], "Post marked as rented");
    assert_eq!(body["data"]["post"]["availability"], "rented");

    // A rental item can never be sold.
    let response = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            &format!("/posts/{post_id}/status"),
            &token,
            serde_json::json!({ "availability": "sold" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(
        body["error"],
        "Only posts with 'for sale' status can be marked as sold"
    );
    assert_eq!(body["code"], "wrong_status");

    // Returned by the renter.
    let response = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            &format!("/posts/{post_id}/status"),
            &token,
            serde_json::json!({ "availability": "available" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["message"], "Post marked as available");
    assert_eq!(body["data"]["post"]["availability"], "available");
}

#[tokio::test]
async fn test_sale_availability_lifecycle() {
    let (_, app) = spawn_app().await;
    let token = login(&app, "Jan", "jan@example.com").await;
    let post_id = create_post(&app, &token, valid_payload("for sale")).await;

    // A sale item can never be rented.
    let response = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            &format!("/posts/{post_id}/status"),
            &token,
            serde_json::json!({ "availability": "rented" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(
        body["error"],
        "Only posts with 'for rental' status can be marked as rented"
    );

    // Request values are matched case-insensitively.
    let response = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            &format!("/posts/{post_id}/status"),
            &token,
            serde_json::json!({ "availability": "SOLD" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["message"], "Post marked as sold");
    assert_eq!(body["data"]["post"]["availability"], "sold");

    // Sold is terminal.
    let response = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            &format!("/posts/{post_id}/status"),
            &token,
            serde_json::json!({ "availability": "available" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Cannot mark a sold item as available");
    assert_eq!(body["code"], "illegal_transition");
}

#[tokio::test]
async fn test_availability_payload_screening() {
    let (_, app) = spawn_app().await;
    let token = login(&app, "Kim", "kim@example.com").await;

    let response = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            "/posts/no-such-post/status",
            &token,
            serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Availability is required.");

    // A bad value outranks the missing post.
    let response = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            "/posts/no-such-post/status",
            &token,
            serde_json::json!({ "availability": "gone" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(
        body["error"],
        "Invalid availability. Must be one of: sold, rented, available"
    );
    assert_eq!(body["code"], "invalid_availability");

    // A good value on a missing post is a plain 404.
    let response = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            "/posts/no-such-post/status",
            &token,
            serde_json::json!({ "availability": "sold" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Post not found.");
}

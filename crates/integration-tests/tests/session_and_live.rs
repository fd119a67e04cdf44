//! Sessions, probes, response headers and live updates.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use futures::{Stream, StreamExt};
use serde_json::json;
use tower::ServiceExt;

use souq_integration_tests::{TestApp, seed_catalog};
use souq_storefront::build_router;
use souq_storefront::config::StorefrontConfig;
use souq_storefront::state::AppState;
use souq_storefront::store::MemoryStore;

/// Wait for the next server-sent event frame.
async fn next_event<S>(frames: &mut S) -> String
where
    S: Stream<Item = Result<axum::body::Bytes, axum::Error>> + Unpin,
{
    let frame = tokio::time::timeout(Duration::from_secs(5), frames.next())
        .await
        .expect("live event in time")
        .expect("stream open")
        .expect("frame");
    String::from_utf8(frame.to_vec()).unwrap()
}

#[tokio::test]
async fn test_health_probes() {
    let mut app = TestApp::new();

    assert_eq!(app.get("/health").await.status, StatusCode::OK);
    // The memory backend is always ready
    assert_eq!(app.get("/health/ready").await.status, StatusCode::OK);
}

#[tokio::test]
async fn test_response_headers() {
    let mut app = TestApp::new();

    let response = app.get("/cart").await;
    assert_eq!(response.headers["x-frame-options"], "DENY");
    assert_eq!(response.headers["x-content-type-options"], "nosniff");
    assert_eq!(response.headers[header::CACHE_CONTROL], "no-store");
    assert!(response.headers.contains_key("x-request-id"));

    let response = app
        .request(
            Request::builder()
                .uri("/health")
                .header("x-request-id", "edge-7")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(response.headers()["x-request-id"], "edge-7");
}

#[tokio::test]
async fn test_guest_then_bound_identity() {
    let mut app = TestApp::new();
    seed_catalog(&app).await;

    let session = app.get("/session").await;
    assert_eq!(session.body["isGuest"], true);
    assert!(session.body["userId"].as_str().unwrap().starts_with("guest-"));
    let guest_cookie = app.cookie().unwrap().to_owned();

    let token = TestApp::identity_token("user-42");
    let bound = app
        .post(
            "/session/identity",
            &json!({ "userId": "user-42", "signature": token }),
        )
        .await;
    assert_eq!(bound.status, StatusCode::OK);
    assert_eq!(bound.body, json!({ "userId": "user-42", "isGuest": false }));
    assert_ne!(app.cookie().unwrap(), guest_cookie);

    assert_eq!(app.get("/session").await.body["userId"], "user-42");
    app.post("/cart/add", &json!({ "productId": "p1" })).await;

    // Another browser signing in as the same shopper sees the same cart
    let mut other = app.shopper();
    other
        .post(
            "/session/identity",
            &json!({ "userId": "user-42", "signature": token }),
        )
        .await;
    assert_eq!(other.get("/cart/count").await.body["count"], 1);
}

#[tokio::test]
async fn test_invalid_identity_is_rejected() {
    let mut app = TestApp::new();

    let response = app
        .post("/session/identity", &json!({ "userId": "a/b", "signature": "00" }))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(app.get("/session").await.body["isGuest"], true);
}

#[tokio::test]
async fn test_unsigned_identity_cannot_take_over_a_cart() {
    let mut victim = TestApp::new();
    seed_catalog(&victim).await;
    let token = TestApp::identity_token("user-42");
    victim
        .post(
            "/session/identity",
            &json!({ "userId": "user-42", "signature": token }),
        )
        .await;
    victim.post("/cart/add", &json!({ "productId": "p1" })).await;

    let mut intruder = victim.shopper();
    let bare = intruder
        .post("/session/identity", &json!({ "userId": "user-42" }))
        .await;
    assert_eq!(bare.status, StatusCode::UNAUTHORIZED);

    let forged = intruder
        .post(
            "/session/identity",
            &json!({ "userId": "user-42", "signature": TestApp::identity_token("user-43") }),
        )
        .await;
    assert_eq!(forged.status, StatusCode::UNAUTHORIZED);
    assert_eq!(forged.body["error"], "identity signature does not match");

    assert_eq!(intruder.get("/session").await.body["isGuest"], true);
    assert_eq!(intruder.get("/cart/count").await.body["count"], 0);
}

#[tokio::test]
async fn test_live_cart_events() {
    let mut app = TestApp::new();
    seed_catalog(&app).await;
    // Establish the session before opening the stream
    app.get("/cart").await;

    let response = app
        .request(Request::builder().uri("/cart/events").body(Body::empty()).unwrap())
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "text/event-stream");

    let mut frames = response.into_body().into_data_stream();

    let initial = next_event(&mut frames).await;
    assert!(initial.contains("event: cart"));
    assert!(initial.contains(r#""itemCount":0"#));

    app.post("/cart/add", &json!({ "productId": "p2", "quantity": 2 }))
        .await;
    let changed = next_event(&mut frames).await;
    assert!(changed.contains(r#""itemCount":2"#));
}

#[tokio::test]
async fn test_identity_binding_needs_a_secret() {
    let router = build_router(AppState::in_memory(
        StorefrontConfig::default(),
        MemoryStore::new(),
    ));
    let body = json!({ "userId": "user-42", "signature": TestApp::identity_token("user-42") });

    let response = router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/session/identity")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

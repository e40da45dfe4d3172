//! Integration tests for the HTTP router: health, listing, auth gating
//! and validation, exercised with in-process requests against the same
//! app the binary serves. The pool is lazy, so no database is needed;
//! handlers that do query it report it as unreachable.

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use axum::response::Response;
use serde_json::Value;
use tower::ServiceExt;

use crate::helpers;

async fn body_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json body")
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_health_endpoint_reports_ok() {
    let app = helpers::test_app();

    let response = app.oneshot(get("/api/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["success"], Value::Bool(true));
    assert_eq!(body["data"]["status"], "ok");
    assert!(body["data"]["version"].as_str().is_some_and(|v| !v.is_empty()));
}

#[tokio::test]
async fn test_metrics_report_database_unreachable() {
    let app = helpers::test_app();

    let response = app.oneshot(get("/api/health/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["data"]["database"], "unreachable");
    assert_eq!(body["data"]["rooms"], 0);
    assert_eq!(body["data"]["engine"]["connections_total"], 0);
}

#[tokio::test]
async fn test_room_listing_starts_empty() {
    let app = helpers::test_app();

    let response = app.oneshot(get("/api/rooms")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["data"], serde_json::json!([]));
}

#[tokio::test]
async fn test_me_requires_session_cookie() {
    let app = helpers::test_app();

    let response = app.oneshot(get("/api/auth/me")).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body = body_json(response).await;
    assert_eq!(body["error"], "UNAUTHORIZED");
    assert_eq!(body["message"], "Missing session cookie");
}

#[tokio::test]
async fn test_unparseable_cookie_is_unauthorized() {
    let app = helpers::test_app();

    // No selector/validator split, so the lookup never reaches the pool.
    let request = Request::builder()
        .method("GET")
        .uri("/api/auth/me")
        .header(header::COOKIE, "openchat_session=garbage")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body = body_json(response).await;
    assert_eq!(body["message"], "Invalid or expired session");
}

#[tokio::test]
async fn test_channel_listing_requires_session_cookie() {
    let app = helpers::test_app();

    let response = app.oneshot(get("/api/channels")).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_register_validates_name_length() {
    let app = helpers::test_app();

    let response = app
        .oneshot(post_json("/api/auth/register", r#"{"name":"ab"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["error"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_logout_without_session_succeeds() {
    let app = helpers::test_app();

    let response = app
        .oneshot(post_json("/api/auth/logout", "{}"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["success"], Value::Bool(true));
}

#[tokio::test]
async fn test_room_socket_route_rejects_plain_requests() {
    let app = helpers::test_app();

    // No upgrade headers: the route exists but the handshake is refused.
    let response = app.oneshot(get("/rooms/general/live")).await.unwrap();
    assert!(
        response.status().is_client_error(),
        "expected a 4xx, got {}",
        response.status()
    );
}

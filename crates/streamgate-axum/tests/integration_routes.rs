//! Integration tests for the Axum web server.
//!
//! These tests verify that routes are correctly wired to the stream service.

mod common;

use axum::http::StatusCode;
use http_body_util::BodyExt;
use tokio_test::assert_ok;

use common::{broken_state, json_body, router, send, test_state};

const CAM1: &str = r#"{"name": "cam1", "rtmp_input": "rtmp://localhost/live/cam1", "start": false}"#;

#[tokio::test]
async fn health_endpoint_returns_ok() {
    let state = test_state();
    let response = send(router(&state), "GET", "/health", None).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = assert_ok!(response.into_body().collect().await).to_bytes();
    assert_eq!(&body[..], b"OK");
}

#[tokio::test]
async fn streams_endpoint_starts_empty() {
    let state = test_state();
    let response = send(router(&state), "GET", "/api/streams", None).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, serde_json::json!({}));
}

#[tokio::test]
async fn add_stream_returns_created_view() {
    let state = test_state();
    let response = send(router(&state), "POST", "/api/streams", Some(CAM1)).await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = json_body(response).await;
    assert_eq!(body["name"], "cam1");
    assert_eq!(body["rtmp_input"], "rtmp://localhost/live/cam1");
    assert_eq!(body["rtsp_url"], "rtsp://localhost:8554/cam1");
    assert_eq!(body["active"], false);
    assert_eq!(body["metrics"], serde_json::json!({}));

    let listed = json_body(send(router(&state), "GET", "/api/streams", None).await).await;
    assert!(listed.get("cam1").is_some());
}

#[tokio::test]
async fn duplicate_name_is_conflict() {
    let state = test_state();
    send(router(&state), "POST", "/api/streams", Some(CAM1)).await;

    let response = send(router(&state), "POST", "/api/streams", Some(CAM1)).await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = json_body(response).await;
    assert_eq!(body["status"], 409);
    assert!(body["error"].as_str().unwrap().contains("cam1"));
}

#[tokio::test]
async fn invalid_source_is_bad_request() {
    let state = test_state();
    let response = send(
        router(&state),
        "POST",
        "/api/streams",
        Some(r#"{"name": "cam1", "rtmp_input": "http://localhost/cam1"}"#),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn malformed_body_is_bad_request() {
    let state = test_state();
    let response = send(router(&state), "POST", "/api/streams", Some("{not json")).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["status"], 400);
}

#[tokio::test]
async fn unknown_stream_is_not_found() {
    let state = test_state();

    for (method, uri) in [
        ("GET", "/api/streams/ghost"),
        ("DELETE", "/api/streams/ghost"),
        ("POST", "/api/streams/ghost/start"),
        ("POST", "/api/streams/ghost/stop"),
        ("GET", "/api/streams/ghost/logs"),
    ] {
        let response = send(router(&state), method, uri, None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{method} {uri}");
    }
}

#[cfg(unix)]
#[tokio::test]
async fn start_stop_and_toggle_round_trip() {
    let state = test_state();
    send(router(&state), "POST", "/api/streams", Some(CAM1)).await;

    let started = send(router(&state), "POST", "/api/streams/cam1/start", None).await;
    assert_eq!(started.status(), StatusCode::OK);
    let body = json_body(started).await;
    assert_eq!(body["active"], true);
    assert!(body["pid"].is_u64());

    let stopped = json_body(send(router(&state), "POST", "/api/streams/cam1/stop", None).await).await;
    assert_eq!(stopped["active"], false);

    let toggled =
        json_body(send(router(&state), "POST", "/api/streams/cam1/toggle", None).await).await;
    assert_eq!(toggled["active"], true);

    state.shutdown().await;
}

#[cfg(unix)]
#[tokio::test]
async fn add_with_start_runs_worker() {
    let state = test_state();
    let response = send(
        router(&state),
        "POST",
        "/api/streams",
        Some(r#"{"name": "cam1", "rtmp_input": "rtmp://localhost/live/cam1", "rtsp_port": 8600}"#),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = json_body(response).await;
    assert_eq!(body["active"], true);
    assert_eq!(body["rtsp_url"], "rtsp://localhost:8600/cam1");

    state.shutdown().await;
}

#[tokio::test]
async fn failed_start_on_add_is_unavailable_and_rolled_back() {
    let state = broken_state();
    let response = send(
        router(&state),
        "POST",
        "/api/streams",
        Some(r#"{"name": "cam1", "rtmp_input": "rtmp://localhost/live/cam1"}"#),
    )
    .await;

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let missing = send(router(&state), "GET", "/api/streams/cam1", None).await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_removes_stream() {
    let state = test_state();
    send(router(&state), "POST", "/api/streams", Some(CAM1)).await;

    let response = send(router(&state), "DELETE", "/api/streams/cam1", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(router(&state), "GET", "/api/streams/cam1", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn bulk_routes_are_not_captured_by_name() {
    let state = broken_state();
    send(router(&state), "POST", "/api/streams", Some(CAM1)).await;

    let response = send(router(&state), "POST", "/api/streams/start-all", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["started"], serde_json::json!([]));
    assert!(body["failed"]["cam1"].is_string());

    let response = send(router(&state), "POST", "/api/streams/stop-all", None).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn logs_start_empty() {
    let state = test_state();
    send(router(&state), "POST", "/api/streams", Some(CAM1)).await;

    let response = send(router(&state), "GET", "/api/streams/cam1/logs", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, serde_json::json!([]));
}

#[tokio::test]
async fn events_endpoint_is_event_stream() {
    let state = test_state();
    let response = send(router(&state), "GET", "/api/events", None).await;

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()["content-type"].to_str().unwrap();
    assert!(content_type.starts_with("text/event-stream"));
}

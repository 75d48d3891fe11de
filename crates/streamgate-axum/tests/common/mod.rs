//! Shared helpers for router tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response};
use http_body_util::BodyExt;
use streamgate_axum::{AppState, CorsConfig, create_router};
use streamgate_core::{Settings, StreamDefinition};
use streamgate_runtime::{StreamService, WorkerLauncher};
use tokio::process::Command;
use tokio_test::assert_ok;
use tower::ServiceExt;

/// Worker that idles until stopped.
struct IdleWorker;

impl WorkerLauncher for IdleWorker {
    fn command(&self, _definition: &StreamDefinition) -> Command {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg("echo 'Stream mapping:' >&2; exec sleep 30");
        cmd
    }
}

/// Worker whose binary does not exist.
struct MissingWorker;

impl WorkerLauncher for MissingWorker {
    fn command(&self, _definition: &StreamDefinition) -> Command {
        Command::new("/nonexistent/streamgate-worker")
    }
}

fn settings() -> Settings {
    Settings {
        shutdown_grace: Duration::from_secs(2),
        ..Settings::default()
    }
}

pub fn test_state() -> AppState {
    Arc::new(StreamService::with_launcher(settings(), Arc::new(IdleWorker)).unwrap())
}

pub fn broken_state() -> AppState {
    Arc::new(StreamService::with_launcher(settings(), Arc::new(MissingWorker)).unwrap())
}

pub fn router(state: &AppState) -> Router {
    create_router(Arc::clone(state), &CorsConfig::AllowAll)
}

pub async fn send(app: Router, method: &str, uri: &str, body: Option<&str>) -> Response<Body> {
    let mut request = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            request = request.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    let request = assert_ok!(request.body(body));
    assert_ok!(app.oneshot(request).await)
}

pub async fn json_body(response: Response<Body>) -> serde_json::Value {
    let bytes = assert_ok!(response.into_body().collect().await).to_bytes();
    assert_ok!(serde_json::from_slice(&bytes))
}

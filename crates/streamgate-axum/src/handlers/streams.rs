//! Stream handlers - registration and start/stop operations.

use std::collections::BTreeMap;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use streamgate_core::StatusView;
use streamgate_runtime::DiagnosticLine;

use crate::dto::{AddStreamRequest, MessageResponse, StartAllResponse};
use crate::error::HttpError;
use crate::state::AppState;

/// List every stream with its status.
pub async fn list(State(state): State<AppState>) -> Json<BTreeMap<String, StatusView>> {
    Json(state.status_all().await)
}

/// Register a stream, starting it unless `start` is false.
pub async fn add(
    State(state): State<AppState>,
    payload: Result<Json<AddStreamRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<StatusView>), HttpError> {
    let Json(req) = payload?;
    let start = req.start;
    let definition = req.into_definition(state.settings());

    let view = if start {
        state.add_and_start(definition).await?
    } else {
        state.add_definition(definition).await?
    };
    Ok((StatusCode::CREATED, Json(view)))
}

pub async fn get(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<StatusView>, HttpError> {
    Ok(Json(state.status(&name).await?))
}

/// Stop and delete a stream.
pub async fn remove(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<MessageResponse>, HttpError> {
    state.remove(&name).await?;
    Ok(Json(MessageResponse::new(format!("Stream '{name}' removed"))))
}

pub async fn start(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<StatusView>, HttpError> {
    state.start(&name).await?;
    Ok(Json(state.status(&name).await?))
}

pub async fn stop(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<StatusView>, HttpError> {
    state.stop(&name).await?;
    Ok(Json(state.status(&name).await?))
}

/// Start when stopped, stop when running.
pub async fn toggle(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<StatusView>, HttpError> {
    Ok(Json(state.toggle(&name).await?))
}

/// Recent diagnostic output of a stream's worker.
pub async fn logs(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<Vec<DiagnosticLine>>, HttpError> {
    Ok(Json(state.logs(&name).await?))
}

pub async fn start_all(State(state): State<AppState>) -> Json<StartAllResponse> {
    let mut response = StartAllResponse::default();
    for (name, result) in state.start_all().await {
        match result {
            Ok(()) => response.started.push(name),
            Err(e) => {
                response.failed.insert(name, e.to_string());
            }
        }
    }
    Json(response)
}

pub async fn stop_all(State(state): State<AppState>) -> Json<MessageResponse> {
    state.stop_all().await;
    Json(MessageResponse::new("All streams stopped"))
}

//! HTTP surface: status query, terminate, manual tick, task callbacks.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use embedflow_application::DispatchedTask;
use embedflow_domain::ports::services::{
    DataSourceRef, SchedulerInterface, SchedulerTickReport,
};
use embedflow_domain::value_objects::DocumentKey;
use embedflow_infrastructure::AppContext;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::warn;

/// Build the router.
pub fn router(context: Arc<AppContext>) -> Router {
    Router::new()
        .route("/healthz", get(health))
        .route("/v1/embedding/status", post(embedding_status))
        .route("/v1/embedding/terminate", post(terminate))
        .route("/v1/scheduler/tick", post(tick))
        .route("/v1/tasks/callback/success", post(callback_success))
        .route("/v1/tasks/callback/failure", post(callback_failure))
        .with_state(context)
}

async fn health() -> &'static str {
    "ok"
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatusRequest {
    #[serde(default)]
    data_sources: Vec<DataSourceRef>,
}

async fn embedding_status(
    State(context): State<Arc<AppContext>>,
    Json(request): Json<StatusRequest>,
) -> (StatusCode, Json<Value>) {
    if request.data_sources.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"success": false, "error": "No dataSources provided"})),
        );
    }
    match context.status_query.get_status(request.data_sources).await {
        Ok(map) => (StatusCode::OK, Json(json!({"success": true, "data": map}))),
        Err(e) => {
            warn!(error = %e, "Status query failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"success": false, "error": e.to_string()})),
            )
        }
    }
}

#[derive(Deserialize)]
struct TerminateRequest {
    object_key: String,
}

async fn terminate(
    State(context): State<Arc<AppContext>>,
    Json(request): Json<TerminateRequest>,
) -> (StatusCode, Json<Value>) {
    let key = DocumentKey::new(request.object_key);
    match context.coordinator.mark_terminated(&key).await {
        Ok(done) => (StatusCode::OK, Json(json!({"success": done}))),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"success": false, "error": e.to_string()})),
        ),
    }
}

async fn tick(State(context): State<Arc<AppContext>>) -> Json<SchedulerTickReport> {
    Json(context.scheduler.tick().await)
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SuccessCallback {
    task_data: DispatchedTask,
    #[serde(default)]
    result: Value,
}

async fn callback_success(
    State(context): State<Arc<AppContext>>,
    Json(request): Json<SuccessCallback>,
) -> (StatusCode, Json<Value>) {
    match context
        .callback_sink
        .on_success(&request.task_data, request.result)
        .await
    {
        Ok(()) => (StatusCode::OK, Json(json!({"success": true}))),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"success": false, "error": e.to_string()})),
        ),
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FailureCallback {
    task_data: DispatchedTask,
    #[serde(default)]
    error: String,
}

async fn callback_failure(
    State(context): State<Arc<AppContext>>,
    Json(request): Json<FailureCallback>,
) -> (StatusCode, Json<Value>) {
    match context
        .callback_sink
        .on_failure(&request.task_data, request.error)
        .await
    {
        Ok(()) => (StatusCode::OK, Json(json!({"success": true}))),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"success": false, "error": e.to_string()})),
        ),
    }
}

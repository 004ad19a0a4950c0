//! REST endpoints for clients (expression lifecycle) and workers (task pull/submit).

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::{Method, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use tower_http::cors::{Any, CorsLayer};
use tracing::debug;

use super::protocol::*;
use crate::error::SchedulerError;
use crate::scheduler::Scheduler;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub scheduler: Arc<Scheduler>,
}

/// Build the Axum router with client and worker routes.
pub fn api_routes(scheduler: Arc<Scheduler>) -> Router {
    let state = AppState { scheduler };

    Router::new()
        .route(ENDPOINT_HEALTH, get(health))
        .route(ENDPOINT_CALCULATE, post(calculate))
        .route(ENDPOINT_EXPRESSIONS, get(list_expressions))
        .route(ENDPOINT_EXPRESSION_BY_ID, get(get_expression))
        .route(ENDPOINT_INTERNAL_TASK, get(fetch_task).post(submit_task_result))
        .layer(cors_layer())
        .with_state(state)
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE])
}

impl IntoResponse for SchedulerError {
    fn into_response(self) -> Response {
        let status = match self {
            Self::InvalidFormat { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::ExpressionNotFound { .. } | Self::TaskNotFound { .. } | Self::NoTaskAvailable => {
                StatusCode::NOT_FOUND
            }
        };
        error_response(status, self.to_string())
    }
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
        .into_response()
}

// ── Health ──────────────────────────────────────────────────────────────

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let stats = state.scheduler.stats().await;
    Json(serde_json::json!({
        "status": "ok",
        "service": "arith-dispatch",
        "stats": stats,
    }))
}

// ── Client-facing ───────────────────────────────────────────────────────

async fn calculate(
    State(state): State<AppState>,
    body: Result<Json<CalculateRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match body {
        Ok(body) => body,
        Err(e) => {
            debug!(error = %e, "Malformed calculate request");
            return error_response(StatusCode::UNPROCESSABLE_ENTITY, "Invalid expression");
        }
    };

    match state
        .scheduler
        .submit_expression(&request.expression, request.mode)
        .await
    {
        Ok(id) => (StatusCode::CREATED, Json(CalculateResponse { id })).into_response(),
        Err(e) => e.into_response(),
    }
}

async fn list_expressions(State(state): State<AppState>) -> impl IntoResponse {
    let expressions = state.scheduler.list_expressions().await;
    Json(ExpressionListResponse { expressions })
}

async fn get_expression(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let Ok(id) = id.parse() else {
        return error_response(StatusCode::NOT_FOUND, "Expression not found");
    };

    match state.scheduler.get_expression(id).await {
        Ok(expression) => Json(ExpressionResponse { expression }).into_response(),
        Err(e) => e.into_response(),
    }
}

// ── Worker-facing ───────────────────────────────────────────────────────

async fn fetch_task(State(state): State<AppState>) -> Response {
    match state.scheduler.dequeue_task().await {
        Ok(task) => Json(TaskResponse { task }).into_response(),
        Err(e) => e.into_response(),
    }
}

async fn submit_task_result(
    State(state): State<AppState>,
    body: Result<Json<TaskResultRequest>, JsonRejection>,
) -> Response {
    let Json(report) = match body {
        Ok(body) => body,
        Err(e) => {
            debug!(error = %e, "Malformed task result");
            return error_response(StatusCode::UNPROCESSABLE_ENTITY, "Invalid data");
        }
    };

    match state.scheduler.submit_result(report.id, report.result).await {
        Ok(ack) => {
            debug!(
                task_id = report.id,
                expression_id = ack.expression_id,
                status = %ack.expression_status,
                "Result saved"
            );
            Json(MessageResponse {
                message: "Result saved".to_string(),
            })
            .into_response()
        }
        Err(e) => e.into_response(),
    }
}

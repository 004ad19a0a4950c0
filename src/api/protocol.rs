//! HTTP API contracts shared by the orchestrator and the worker agent.

use serde::{Deserialize, Serialize};

use crate::scheduler::{DecompositionMode, ExpressionId, ExpressionView, Task, TaskId, Value};

pub const ENDPOINT_HEALTH: &str = "/health";
pub const ENDPOINT_CALCULATE: &str = "/api/v1/calculate";
pub const ENDPOINT_EXPRESSIONS: &str = "/api/v1/expressions";
pub const ENDPOINT_EXPRESSION_BY_ID: &str = "/api/v1/expressions/{id}";
pub const ENDPOINT_INTERNAL_TASK: &str = "/internal/task";

#[derive(Debug, Serialize, Deserialize)]
pub struct CalculateRequest {
    pub expression: String,
    /// Overrides the orchestrator's default decomposition mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<DecompositionMode>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CalculateResponse {
    pub id: ExpressionId,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ExpressionListResponse {
    pub expressions: Vec<ExpressionView>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ExpressionResponse {
    pub expression: ExpressionView,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TaskResponse {
    pub task: Task,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TaskResultRequest {
    pub id: TaskId,
    pub result: Value,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

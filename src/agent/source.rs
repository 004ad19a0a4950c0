//! Task sources: the pull/submit contract a worker loop talks to.

use async_trait::async_trait;
use reqwest::StatusCode;

use crate::api::protocol::{ENDPOINT_INTERNAL_TASK, TaskResponse, TaskResultRequest};
use crate::error::{AgentError, SchedulerError};
use crate::scheduler::{Scheduler, Task, TaskId, Value};

/// Where a worker pulls tasks from and reports results to.
#[async_trait]
pub trait TaskSource: Send + Sync {
    /// Fetch one task. `Ok(None)` means the queue is empty right now.
    async fn fetch_task(&self) -> Result<Option<Task>, AgentError>;

    /// Report the result of a previously fetched task.
    async fn submit_result(&self, task_id: TaskId, result: Value) -> Result<(), AgentError>;
}

/// Talks to a remote orchestrator over HTTP.
#[derive(Clone)]
pub struct HttpTaskSource {
    client: reqwest::Client,
    task_url: String,
}

impl HttpTaskSource {
    /// `base_url` is the orchestrator root, e.g. `http://localhost:8081`.
    pub fn new(base_url: &str) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            task_url: format!("{}{}", base_url.trim_end_matches('/'), ENDPOINT_INTERNAL_TASK),
        }
    }
}

async fn unexpected(response: reqwest::Response) -> AgentError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    AgentError::UnexpectedStatus { status, body }
}

#[async_trait]
impl TaskSource for HttpTaskSource {
    async fn fetch_task(&self) -> Result<Option<Task>, AgentError> {
        let response = self.client.get(&self.task_url).send().await?;
        match response.status() {
            StatusCode::OK => {
                let body: TaskResponse = response.json().await?;
                Ok(Some(body.task))
            }
            StatusCode::NOT_FOUND => Ok(None),
            _ => Err(unexpected(response).await),
        }
    }

    async fn submit_result(&self, task_id: TaskId, result: Value) -> Result<(), AgentError> {
        let response = self
            .client
            .post(&self.task_url)
            .json(&TaskResultRequest {
                id: task_id,
                result,
            })
            .send()
            .await?;
        match response.status() {
            StatusCode::OK => Ok(()),
            StatusCode::NOT_FOUND => Err(SchedulerError::TaskNotFound { id: task_id }.into()),
            _ => Err(unexpected(response).await),
        }
    }
}

/// In-process source, for embedding workers next to the scheduler.
#[async_trait]
impl TaskSource for Scheduler {
    async fn fetch_task(&self) -> Result<Option<Task>, AgentError> {
        match self.dequeue_task().await {
            Ok(task) => Ok(Some(task)),
            Err(e) if e.is_transient() => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn submit_result(&self, task_id: TaskId, result: Value) -> Result<(), AgentError> {
        Scheduler::submit_result(self, task_id, result).await?;
        Ok(())
    }
}

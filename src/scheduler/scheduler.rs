//! Scheduler: expression registry, task index and dispatch queue behind one lock.
//!
//! Every operation (submit, dequeue, report, read, lease sweep) takes the same
//! mutex and never awaits while holding it, so a dequeue can't hand the same
//! head to two pullers and two reports for sibling tasks can't race on the
//! done-check.

use std::collections::{BTreeMap, HashMap};
use std::ops::Range;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::decompose::{DecompositionMode, decompose};
use super::expression::{Expression, ExpressionId, ExpressionStatus, ExpressionView};
use super::queue::DispatchQueue;
use super::task::{Task, TaskId};
use super::value::Value;
use crate::config::OrchestratorConfig;
use crate::error::SchedulerError;

/// Acknowledgement for an accepted task result.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultAck {
    pub expression_id: ExpressionId,
    pub expression_status: ExpressionStatus,
    /// The task had already reported; the report was ignored.
    pub duplicate: bool,
}

/// Point-in-time counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SchedulerStats {
    pub expressions: usize,
    pub pending_expressions: usize,
    pub queued_tasks: usize,
    pub leased_tasks: usize,
}

#[derive(Debug)]
struct SchedulerState {
    expressions: BTreeMap<ExpressionId, Expression>,
    /// Task ID → owning expression, so reports don't scan every expression.
    task_index: HashMap<TaskId, ExpressionId>,
    queue: DispatchQueue,
    /// Dequeued-but-unreported tasks and their deadlines (lease recovery only).
    leases: HashMap<TaskId, Instant>,
    next_expression_id: ExpressionId,
    next_task_id: TaskId,
}

impl Default for SchedulerState {
    fn default() -> Self {
        Self {
            expressions: BTreeMap::new(),
            task_index: HashMap::new(),
            queue: DispatchQueue::new(),
            leases: HashMap::new(),
            next_expression_id: 1,
            next_task_id: 1,
        }
    }
}

/// The single logical scheduler shared by all HTTP handlers.
pub struct Scheduler {
    state: Mutex<SchedulerState>,
    cost_range_ms: Range<u64>,
    default_mode: DecompositionMode,
    lease_timeout: Option<Duration>,
}

impl Scheduler {
    /// Create a scheduler from orchestrator settings.
    pub fn new(config: &OrchestratorConfig) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(SchedulerState::default()),
            cost_range_ms: config.cost_range_ms.clone(),
            default_mode: config.default_mode,
            lease_timeout: config.lease_timeout,
        })
    }

    pub fn lease_timeout(&self) -> Option<Duration> {
        self.lease_timeout
    }

    /// Decompose and register an expression, queueing its ready tasks.
    pub async fn submit_expression(
        &self,
        expression: &str,
        mode: Option<DecompositionMode>,
    ) -> Result<ExpressionId, SchedulerError> {
        let mode = mode.unwrap_or(self.default_mode);
        let plan = decompose(expression, mode, &self.cost_range_ms).inspect_err(|e| {
            debug!(error = %e, expression, "Rejected expression");
        })?;

        let mut state = self.state.lock().await;

        let id = state.next_expression_id;
        state.next_expression_id += 1;
        let first_task_id = state.next_task_id;
        state.next_task_id += plan.step_count() as TaskId;

        let record = Expression::from_plan(id, expression, plan, first_task_id);
        let ready = record.initially_ready();
        for task_id in record.task_ids() {
            state.task_index.insert(task_id, id);
        }

        info!(
            expression_id = id,
            %mode,
            tasks = record.task_count(),
            queued = ready.len(),
            "Expression accepted"
        );

        state.queue.enqueue_many(ready);
        state.expressions.insert(id, record);

        Ok(id)
    }

    /// Snapshot of every expression, ordered by ID.
    pub async fn list_expressions(&self) -> Vec<ExpressionView> {
        let state = self.state.lock().await;
        state.expressions.values().map(Expression::view).collect()
    }

    pub async fn get_expression(&self, id: ExpressionId) -> Result<ExpressionView, SchedulerError> {
        let state = self.state.lock().await;
        state
            .expressions
            .get(&id)
            .map(Expression::view)
            .ok_or(SchedulerError::ExpressionNotFound { id })
    }

    /// Hand the head of the queue to exactly one caller.
    pub async fn dequeue_task(&self) -> Result<Task, SchedulerError> {
        let mut state = self.state.lock().await;

        while let Some(task) = state.queue.dequeue_one() {
            // A requeued task may have been reported by its first worker meanwhile.
            if state.is_task_done(task.id) {
                debug!(task_id = task.id, "Skipping already-finished task");
                continue;
            }
            if let Some(timeout) = self.lease_timeout {
                state.leases.insert(task.id, Instant::now() + timeout);
            }
            debug!(task_id = task.id, operator = %task.operator, "Task dispatched");
            return Ok(task);
        }

        Err(SchedulerError::NoTaskAvailable)
    }

    /// Record a worker's result and update the owning expression.
    pub async fn submit_result(
        &self,
        task_id: TaskId,
        value: Value,
    ) -> Result<ResultAck, SchedulerError> {
        let mut state = self.state.lock().await;

        let Some(&expression_id) = state.task_index.get(&task_id) else {
            warn!(task_id, "Result for unknown task");
            return Err(SchedulerError::TaskNotFound { id: task_id });
        };

        state.leases.remove(&task_id);

        let Some(expression) = state.expressions.get_mut(&expression_id) else {
            return Err(SchedulerError::TaskNotFound { id: task_id });
        };
        let outcome = expression.record_result(task_id, value);
        let expression_status = expression.status;

        if outcome.duplicate {
            debug!(task_id, expression_id, "Duplicate result ignored");
        } else {
            debug!(task_id, expression_id, result = %value, "Task result recorded");
        }
        if outcome.completed {
            let elapsed_ms = expression
                .completed_at
                .map(|done| (done - expression.created_at).num_milliseconds());
            info!(
                expression_id,
                expression = %expression.source,
                result = ?expression.result,
                elapsed_ms,
                "Expression completed"
            );
        }

        state.queue.enqueue_many(outcome.ready);

        Ok(ResultAck {
            expression_id,
            expression_status,
            duplicate: outcome.duplicate,
        })
    }

    /// Put tasks whose lease ran out back on the tail of the queue.
    pub async fn requeue_expired_leases(&self) -> usize {
        self.requeue_expired_at(Instant::now()).await
    }

    pub(crate) async fn requeue_expired_at(&self, now: Instant) -> usize {
        let mut state = self.state.lock().await;

        let expired: Vec<TaskId> = state
            .leases
            .iter()
            .filter(|(_, deadline)| **deadline <= now)
            .map(|(id, _)| *id)
            .collect();

        let mut requeued = Vec::new();
        for task_id in expired {
            state.leases.remove(&task_id);
            if let Some(task) = state.task(task_id).filter(|t| !t.done) {
                requeued.push(task.clone());
            }
        }
        requeued.sort_by_key(|task| task.id);

        let count = requeued.len();
        if count > 0 {
            info!(count, "Requeued tasks with expired leases");
        }
        state.queue.enqueue_many(requeued);
        count
    }

    pub async fn stats(&self) -> SchedulerStats {
        let state = self.state.lock().await;
        SchedulerStats {
            expressions: state.expressions.len(),
            pending_expressions: state
                .expressions
                .values()
                .filter(|e| !e.is_done())
                .count(),
            queued_tasks: state.queue.len(),
            leased_tasks: state.leases.len(),
        }
    }
}

impl SchedulerState {
    fn task(&self, task_id: TaskId) -> Option<&Task> {
        let expression_id = self.task_index.get(&task_id)?;
        self.expressions.get(expression_id)?.task(task_id)
    }

    fn is_task_done(&self, task_id: TaskId) -> bool {
        self.task(task_id).is_some_and(|task| task.done)
    }
}

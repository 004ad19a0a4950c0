//! Worker pool: independent polling loops: fetch → compute → report.
//!
//! Loops share nothing but the task source and a shutdown flag. A result that
//! fails to report is dropped; its task stays unfinished on the orchestrator.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::compute::compute;
use super::source::TaskSource;

/// Per-worker counters, returned when the loop stops.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkerReport {
    pub worker: usize,
    /// Results the orchestrator acknowledged.
    pub completed: u64,
    /// Results lost to a failed report.
    pub dropped: u64,
}

/// Handles for a set of running worker loops.
pub struct WorkerPool {
    handles: Vec<JoinHandle<WorkerReport>>,
    shutdown: Arc<AtomicBool>,
}

impl WorkerPool {
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Flag that stops every loop after its current iteration.
    pub fn shutdown_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    /// Signal shutdown and wait for every loop to finish.
    pub async fn shutdown(self) -> Vec<WorkerReport> {
        self.shutdown.store(true, Ordering::Relaxed);
        self.join().await
    }

    /// Wait for every loop to finish (they only stop once the flag is set).
    pub async fn join(self) -> Vec<WorkerReport> {
        let mut reports = Vec::with_capacity(self.handles.len());
        for handle in self.handles {
            match handle.await {
                Ok(report) => reports.push(report),
                Err(e) => error!("Worker task panicked: {e}"),
            }
        }
        reports
    }
}

/// Spawn `workers` independent loops pulling from `source`.
pub fn spawn_worker_pool(
    source: Arc<dyn TaskSource>,
    workers: usize,
    backoff: Duration,
) -> WorkerPool {
    let shutdown = Arc::new(AtomicBool::new(false));

    let handles = (0..workers)
        .map(|worker| {
            let source = Arc::clone(&source);
            let shutdown = Arc::clone(&shutdown);
            tokio::spawn(async move { worker_loop(worker, source, backoff, shutdown).await })
        })
        .collect();

    info!(workers, backoff_ms = backoff.as_millis() as u64, "Worker pool started");

    WorkerPool { handles, shutdown }
}

async fn worker_loop(
    worker: usize,
    source: Arc<dyn TaskSource>,
    backoff: Duration,
    shutdown: Arc<AtomicBool>,
) -> WorkerReport {
    let mut report = WorkerReport {
        worker,
        ..WorkerReport::default()
    };

    while !shutdown.load(Ordering::Relaxed) {
        let task = match source.fetch_task().await {
            Ok(Some(task)) => task,
            Ok(None) => {
                debug!(worker, "No tasks available, backing off");
                tokio::time::sleep(backoff).await;
                continue;
            }
            Err(e) => {
                warn!(worker, error = %e, "Failed to fetch task, backing off");
                tokio::time::sleep(backoff).await;
                continue;
            }
        };

        debug!(
            worker,
            task_id = task.id,
            cost_ms = task.simulated_cost_ms,
            "Computing {} {} {}",
            task.operand_a,
            task.operator,
            task.operand_b
        );
        let result = compute(&task).await;

        match source.submit_result(task.id, result).await {
            Ok(()) => {
                report.completed += 1;
                debug!(worker, task_id = task.id, %result, "Result reported");
            }
            Err(e) => {
                report.dropped += 1;
                warn!(worker, task_id = task.id, error = %e, "Failed to send result, dropping it");
            }
        }
    }

    info!(
        worker,
        completed = report.completed,
        dropped = report.dropped,
        "Worker stopped"
    );
    report
}

//! Lease sweeper: opt-in recovery for tasks whose worker never reports.
//!
//! Without a lease timeout a dequeued task that is never reported is lost and
//! its expression stays pending forever. With one, the sweeper returns such
//! tasks to the tail of the dispatch queue.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::info;

use super::scheduler::Scheduler;

/// Spawn a background task that periodically requeues expired leases.
///
/// Returns `None` when the scheduler has no lease timeout configured.
pub fn spawn_lease_sweeper(
    scheduler: Arc<Scheduler>,
    interval: Duration,
) -> Option<JoinHandle<()>> {
    let timeout = scheduler.lease_timeout()?;

    Some(tokio::spawn(async move {
        info!(
            "Lease sweeper started: timeout {}s, sweeping every {}s",
            timeout.as_secs(),
            interval.as_secs()
        );

        let mut tick = tokio::time::interval(interval);
        loop {
            tick.tick().await;
            scheduler.requeue_expired_leases().await;
        }
    }))
}

//! Arith Dispatch: distributed arithmetic expression scheduler.
//!
//! The orchestrator decomposes expressions into binary-operation tasks and
//! hands them to pull-based workers; the agent runs those workers.

pub mod agent;
pub mod api;
pub mod config;
pub mod error;
pub mod scheduler;

/// Install the `tracing` subscriber used by both binaries (`RUST_LOG`, default `info`).
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();
}

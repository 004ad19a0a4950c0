//! Worker agent: polling loops that compute tasks for the orchestrator.
//!
//! - `compute`: evaluate one operation after its simulated cost
//! - `source`: pull/submit contract (HTTP or in-process)
//! - `pool`: N independent fetch → compute → report loops

pub mod compute;
pub mod pool;
pub mod source;

pub use compute::{compute, evaluate};
pub use pool::{WorkerPool, WorkerReport, spawn_worker_pool};
pub use source::{HttpTaskSource, TaskSource};

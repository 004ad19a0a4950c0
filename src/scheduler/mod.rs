//! Scheduling core: decomposition, dispatch and result aggregation.
//!
//! Core components:
//! - `value`: numeric-or-undefined result values
//! - `task`: Task and Operator types
//! - `decompose`: expression string → plan (pairwise or tree mode)
//! - `expression`: Expression records, completion and result tracking
//! - `queue`: FIFO dispatch queue
//! - `scheduler`: Scheduler: registry + queue behind one lock
//! - `lease`: opt-in requeue of tasks whose worker never reported

pub mod decompose;
pub mod expression;
pub mod lease;
pub mod queue;
pub mod scheduler;
pub mod task;
pub mod value;

pub use decompose::{DecompositionMode, Operand, Plan, Step, decompose};
pub use expression::{Expression, ExpressionId, ExpressionStatus, ExpressionView};
pub use lease::spawn_lease_sweeper;
pub use queue::DispatchQueue;
pub use scheduler::{ResultAck, Scheduler, SchedulerStats};
pub use task::{Operator, Task, TaskId};
pub use value::Value;

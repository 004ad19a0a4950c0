//! HTTP surface of the orchestrator.

pub mod protocol;
pub mod routes;

pub use routes::{AppState, api_routes};

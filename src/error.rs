//! Error types for the arithmetic dispatcher.

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Errors raised by the scheduling core. All of them are scoped to one request.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchedulerError {
    #[error("Invalid expression format: {reason}")]
    InvalidFormat { reason: String },

    #[error("Expression {id} not found")]
    ExpressionNotFound { id: u64 },

    #[error("Task {id} not found")]
    TaskNotFound { id: u64 },

    /// Transient: the dispatch queue is empty and the caller should back off.
    #[error("No tasks available")]
    NoTaskAvailable,
}

impl SchedulerError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidFormat {
            reason: reason.into(),
        }
    }

    /// Whether a caller is expected to retry after a backoff.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::NoTaskAvailable)
    }
}

/// Errors seen by a worker agent talking to the orchestrator.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Unexpected response status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    #[error("Rejected by orchestrator: {0}")]
    Rejected(#[from] SchedulerError),
}

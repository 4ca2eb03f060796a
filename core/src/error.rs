use crate::types::Tick;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("Unknown entity id: {id}")]
    NotFound { id: String },

    #[error("Backend failure in {operation}: {reason}")]
    Backend {
        operation: &'static str,
        reason: String,
    },

    #[error("Backend call {operation} took {elapsed_ms}ms, budget is {budget_ms}ms")]
    Timeout {
        operation: &'static str,
        elapsed_ms: u64,
        budget_ms: u64,
    },

    #[error("Backend tick moved backwards: last observed {last}, got {observed}")]
    TickRegression { last: Tick, observed: Tick },

    #[error("Invalid scenario: {reason}")]
    Scenario { reason: String },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SimError {
    /// True for errors a caller may treat as "entity already departed".
    pub fn is_not_found(&self) -> bool {
        matches!(self, SimError::NotFound { .. })
    }
}

pub type SimResult<T> = Result<T, SimError>;

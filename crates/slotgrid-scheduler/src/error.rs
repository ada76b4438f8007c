//! Scheduler error types.

use thiserror::Error;

/// Errors that can occur during intake and allocation runs.
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("occurrence not configured: {0}")]
    OccurrenceNotFound(String),

    #[error("selection already completed for occurrence: {0}")]
    AlreadyCompleted(String),

    #[error("registration rejected: {0}")]
    Intake(String),

    #[error("allocation worker failed: {0}")]
    Worker(String),

    #[error("configuration error: {0}")]
    Config(#[from] slotgrid_core::ConfigError),

    #[error("state store error: {0}")]
    State(#[from] slotgrid_state::StateError),
}

pub type SchedulerResult<T> = Result<T, SchedulerError>;

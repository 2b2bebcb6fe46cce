//! Caller-facing error type.

use thiserror::Error;

use crate::jobs::{PersistenceError, StoreError};
use crate::models::JobValidationError;
use crate::orchestrator::OrchestratorError;

/// Error categories a front end can react to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    DuplicateJobName,
    UnknownJobName,
    InvalidJob,
    Persistence,
    Busy,
    Orchestration,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::DuplicateJobName => "duplicate job name",
            Self::UnknownJobName => "unknown job name",
            Self::InvalidJob => "invalid job",
            Self::Persistence => "persistence",
            Self::Busy => "busy",
            Self::Orchestration => "orchestration",
        };
        write!(f, "{}", s)
    }
}

/// Every error reported to the caller, synchronously or as an event.
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Saved jobs could not be loaded: {0}")]
    Load(#[from] PersistenceError),

    #[error("Invalid job: {0}")]
    InvalidJob(#[from] JobValidationError),

    #[error("Jobs can't be changed while processing is running")]
    Busy,

    #[error(transparent)]
    Orchestration(#[from] OrchestratorError),
}

impl AppError {
    /// Category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Store(StoreError::DuplicateJobName(_)) => ErrorKind::DuplicateJobName,
            Self::Store(StoreError::UnknownJobName(_)) => ErrorKind::UnknownJobName,
            Self::Store(StoreError::EmptyJobName) => ErrorKind::InvalidJob,
            Self::Store(StoreError::Persistence(_)) => ErrorKind::Persistence,
            Self::Load(_) => ErrorKind::Persistence,
            Self::InvalidJob(_) => ErrorKind::InvalidJob,
            Self::Busy => ErrorKind::Busy,
            Self::Orchestration(OrchestratorError::AlreadyProcessing) => ErrorKind::Busy,
            Self::Orchestration(_) => ErrorKind::Orchestration,
        }
    }
}

/// Result type for controller operations.
pub type AppResult<T> = Result<T, AppError>;

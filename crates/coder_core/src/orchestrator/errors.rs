//! Error types for execution units and orchestration.
//!
//! Unit errors stay inside their group: the supervisor records them and
//! moves on. Only orchestrator errors reach the caller.

use std::io;

use thiserror::Error;

use crate::models::JobType;

/// Error from a single execution unit.
#[derive(Error, Debug)]
pub enum UnitError {
    /// The unit stopped before finishing (interrupt or panic).
    #[error("Interrupted: {0}")]
    Interrupted(String),

    /// Generic failure with a message.
    #[error("{0}")]
    Failed(String),

    /// External program exited unsuccessfully.
    #[error("{program} failed with exit code {exit_code}: {message}")]
    CommandFailed {
        program: String,
        exit_code: i32,
        message: String,
    },

    /// I/O error while running the unit.
    #[error("I/O error during {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: io::Error,
    },

    /// The job could not be turned into runnable work.
    #[error("Job '{name}' cannot run: {message}")]
    InvalidJob { name: String, message: String },
}

impl UnitError {
    /// Create an interrupted error.
    pub fn interrupted(message: impl Into<String>) -> Self {
        Self::Interrupted(message.into())
    }

    /// Create a generic failure.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }

    /// Create a command failed error.
    pub fn command_failed(
        program: impl Into<String>,
        exit_code: i32,
        message: impl Into<String>,
    ) -> Self {
        Self::CommandFailed {
            program: program.into(),
            exit_code,
            message: message.into(),
        }
    }

    /// Create an I/O error with operation context.
    pub fn io(operation: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            source,
        }
    }

    /// Create an invalid job error.
    pub fn invalid_job(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidJob {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Check if this error is an interruption rather than a failure.
    pub fn is_interruption(&self) -> bool {
        matches!(self, Self::Interrupted(_))
    }
}

/// Error while turning jobs into execution units.
#[derive(Error, Debug)]
pub enum FactoryError {
    /// The group has jobs but no program to run them with.
    #[error("No {0} program configured")]
    NotConfigured(JobType),

    /// Any other preparation failure.
    #[error("Failed to prepare {job_type} units: {message}")]
    Failed { job_type: JobType, message: String },
}

impl FactoryError {
    /// Create a generic preparation failure.
    pub fn failed(job_type: JobType, message: impl Into<String>) -> Self {
        Self::Failed {
            job_type,
            message: message.into(),
        }
    }
}

/// Error surfaced to the caller of a run.
#[derive(Error, Debug)]
pub enum OrchestratorError {
    /// A run is already in progress.
    #[error("Processing is already running")]
    AlreadyProcessing,

    /// Units for a group could not be prepared; nothing was started.
    #[error("Could not prepare {group} units: {source}")]
    Prepare {
        group: JobType,
        #[source]
        source: FactoryError,
    },

    /// A supervisor thread could not be started.
    #[error("Failed to start {what} thread: {source}")]
    Spawn {
        what: String,
        #[source]
        source: io::Error,
    },

    /// A supervisor thread died without reporting.
    #[error("The {0} supervisor stopped unexpectedly")]
    SupervisorLost(JobType),

    /// The background run thread died without reporting.
    #[error("The processing thread stopped unexpectedly")]
    RunLost,
}

impl OrchestratorError {
    /// Create a spawn error.
    pub fn spawn(what: impl Into<String>, source: io::Error) -> Self {
        Self::Spawn {
            what: what.into(),
            source,
        }
    }
}

/// Result type for execution units.
pub type UnitResult<T> = Result<T, UnitError>;

/// Result type for unit factories.
pub type FactoryResult<T> = Result<T, FactoryError>;

/// Result type for orchestration.
pub type OrchestratorResult<T> = Result<T, OrchestratorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_failed_display() {
        let err = UnitError::command_failed("gzip", 2, "no such file");
        assert_eq!(err.to_string(), "gzip failed with exit code 2: no such file");
        assert!(!err.is_interruption());
    }

    #[test]
    fn prepare_error_chains_source() {
        let err = OrchestratorError::Prepare {
            group: JobType::Decode,
            source: FactoryError::NotConfigured(JobType::Decode),
        };
        let msg = err.to_string();
        assert!(msg.contains("decode"));
        assert!(msg.contains("No decode program configured"));
    }
}

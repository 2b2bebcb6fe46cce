//! Error types for the job store and its persistence.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Failure to load or save the job snapshot.
#[derive(Error, Debug)]
pub enum PersistenceError {
    /// Reading, writing or renaming the snapshot failed.
    #[error("I/O error while {operation} '{}': {source}", path.display())]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The snapshot is not valid JSON or does not match the job format.
    #[error("Malformed job snapshot '{}': {source}", path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The snapshot was written by an incompatible format version.
    #[error("Job snapshot '{}' has unsupported version {version}", path.display())]
    UnsupportedVersion { path: PathBuf, version: u32 },

    /// The snapshot lists the same job name twice.
    #[error("Job snapshot '{}' contains duplicate job '{name}'", path.display())]
    DuplicateEntry { path: PathBuf, name: String },

    /// A gateway refused the save (used by in-memory gateways).
    #[error("Save rejected: {0}")]
    Rejected(String),
}

impl PersistenceError {
    /// Create an I/O error with context.
    pub fn io(operation: &'static str, path: &Path, source: io::Error) -> Self {
        Self::Io {
            operation,
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Errors from job store operations.
#[derive(Error, Debug)]
pub enum StoreError {
    /// A job with this name already exists.
    #[error("A job named '{0}' already exists")]
    DuplicateJobName(String),

    /// No job with this name exists.
    #[error("No job named '{0}'")]
    UnknownJobName(String),

    /// Job names must contain non-whitespace characters.
    #[error("Job name must not be empty")]
    EmptyJobName,

    /// The change could not be persisted; the store was left unchanged.
    #[error("Failed to persist jobs: {0}")]
    Persistence(#[from] PersistenceError),
}

/// Result type for persistence operations.
pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

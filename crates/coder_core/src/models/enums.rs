//! Core enums used throughout the application.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Kind of work a job performs.
///
/// Jobs of different types run in parallel; jobs of the same type run
/// one after another in list order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobType {
    Encode,
    Decode,
}

impl JobType {
    /// Both groups, in the order they are prepared.
    pub const ALL: [JobType; 2] = [JobType::Encode, JobType::Decode];

    /// Get the lowercase identifier used in files and on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Encode => "encode",
            Self::Decode => "decode",
        }
    }
}

impl std::fmt::Display for JobType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string does not name a job type.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown job type '{0}' (expected 'encode' or 'decode')")]
pub struct UnknownJobType(pub String);

impl FromStr for JobType {
    type Err = UnknownJobType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "encode" => Ok(Self::Encode),
            "decode" => Ok(Self::Decode),
            _ => Err(UnknownJobType(s.to_string())),
        }
    }
}

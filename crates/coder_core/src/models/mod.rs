//! Data models for Batch Coder.
//!
//! - `JobType`: the two job groups (encode, decode)
//! - `Job`: an immutable description of one unit of user work

mod enums;
mod job;

pub use enums::{JobType, UnknownJobType};
pub use job::{Job, JobParams, JobValidationError};

//! Caller boundary.
//!
//! Front ends send [`JobCommand`]s to a [`JobController`] and listen for
//! [`AppEvent`]s on a single channel. Errors of every origin carry an
//! [`ErrorKind`] so they can be shown the same way.

mod commands;
mod errors;
mod job_controller;

pub use commands::{AppEvent, CommandResponse, JobCommand};
pub use errors::{AppError, AppResult, ErrorKind};
pub use job_controller::JobController;

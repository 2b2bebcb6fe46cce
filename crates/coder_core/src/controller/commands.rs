//! Commands accepted by the controller and the events it publishes.

use super::errors::AppError;
use crate::jobs::RemovalReport;
use crate::models::Job;
use crate::orchestrator::{OrchestratorEvent, RunOutcome};

/// A user action, dispatched by value.
#[derive(Debug, Clone)]
pub enum JobCommand {
    /// Add a new job; its name must not be taken.
    Add(Job),
    /// Replace the existing job with the same name.
    Edit(Job),
    /// Remove the named jobs; unknown names are ignored.
    Remove(Vec<String>),
    /// List all jobs in order.
    List,
    /// Run every job in the background.
    ProcessAll,
}

impl JobCommand {
    /// Check if the command changes the job list.
    pub fn is_mutation(&self) -> bool {
        matches!(self, Self::Add(_) | Self::Edit(_) | Self::Remove(_))
    }
}

/// Direct answer to a dispatched command.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandResponse {
    Added(String),
    Updated(String),
    Removed(RemovalReport),
    Jobs(Vec<Job>),
    /// Processing was started; completion arrives as an event.
    ProcessingStarted {
        encode_jobs: usize,
        decode_jobs: usize,
    },
}

/// State changes published on the controller's channel.
#[derive(Debug)]
pub enum AppEvent {
    JobAdded(String),
    JobUpdated(String),
    /// Names actually removed, in former list order.
    JobsRemoved(Vec<String>),
    /// Progress from a running batch.
    Orchestrator(OrchestratorEvent),
    /// The batch is done and the controller accepts mutations again.
    ProcessingFinished(RunOutcome),
    /// An error that happened away from a `dispatch` call.
    Error(AppError),
}

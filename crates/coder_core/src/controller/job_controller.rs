//! Command dispatcher sitting between a front end and the core.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;

use super::commands::{AppEvent, CommandResponse, JobCommand};
use super::errors::{AppError, AppResult};
use crate::config::Settings;
use crate::jobs::{JobStore, PersistenceError};
use crate::logging::Logger;
use crate::models::{Job, JobType};
use crate::orchestrator::{JobOrchestrator, OrchestratorError, OrchestratorEvent, OrchestratorState};

/// Owns the job store and the orchestrator on behalf of a front end.
///
/// Commands return their direct result; everything the front end should
/// display (including progress from background processing) is published
/// as [`AppEvent`]s on the channel returned by [`JobController::new`].
pub struct JobController {
    store: JobStore,
    orchestrator: JobOrchestrator,
    settings: Settings,
    events: Sender<AppEvent>,
    logger: Logger,
}

impl JobController {
    /// Create a controller and the receiving end of its event channel.
    ///
    /// Installs an event forwarder on `orchestrator`, replacing any
    /// callback it already had.
    pub fn new(
        store: JobStore,
        orchestrator: JobOrchestrator,
        settings: Settings,
        logger: Logger,
    ) -> (Self, Receiver<AppEvent>) {
        let (sender, receiver) = mpsc::channel();

        let forward = sender.clone();
        let orchestrator =
            orchestrator.with_event_callback(Arc::new(move |event: OrchestratorEvent| {
                let message = match event {
                    OrchestratorEvent::RunCompleted(outcome) => AppEvent::ProcessingFinished(outcome),
                    other => AppEvent::Orchestrator(other),
                };
                let _ = forward.send(message);
            }));

        let controller = Self {
            store,
            orchestrator,
            settings,
            events: sender,
            logger,
        };
        (controller, receiver)
    }

    /// Execute one command.
    pub fn dispatch(&mut self, command: JobCommand) -> AppResult<CommandResponse> {
        if command.is_mutation() && self.is_processing() {
            self.logger.warn("Refused to change jobs while processing");
            return Err(AppError::Busy);
        }

        match command {
            JobCommand::Add(job) => self.add(job),
            JobCommand::Edit(job) => self.edit(job),
            JobCommand::Remove(names) => self.remove(names),
            JobCommand::List => Ok(CommandResponse::Jobs(self.store.snapshot())),
            JobCommand::ProcessAll => self.process_all(),
        }
    }

    /// Tell the front end its saved jobs were not restored.
    pub fn report_load_error(&self, error: PersistenceError) {
        self.logger
            .warn(&format!("Continuing with an empty job list: {}", error));
        self.publish(AppEvent::Error(AppError::Load(error)));
    }

    pub fn store(&self) -> &JobStore {
        &self.store
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn state(&self) -> OrchestratorState {
        self.orchestrator.state()
    }

    pub fn is_processing(&self) -> bool {
        self.state().is_processing()
    }

    fn add(&mut self, job: Job) -> AppResult<CommandResponse> {
        job.validate_for_execution()?;
        let name = job.name().to_string();
        self.store.add(job)?;
        self.publish(AppEvent::JobAdded(name.clone()));
        Ok(CommandResponse::Added(name))
    }

    fn edit(&mut self, job: Job) -> AppResult<CommandResponse> {
        job.validate_for_execution()?;
        let name = job.name().to_string();
        self.store.update(job)?;
        self.publish(AppEvent::JobUpdated(name.clone()));
        Ok(CommandResponse::Updated(name))
    }

    fn remove(&mut self, names: Vec<String>) -> AppResult<CommandResponse> {
        let report = self.store.remove(&names)?;
        if !report.removed.is_empty() {
            self.publish(AppEvent::JobsRemoved(report.removed.clone()));
        }
        Ok(CommandResponse::Removed(report))
    }

    fn process_all(&mut self) -> AppResult<CommandResponse> {
        let jobs = self.store.snapshot();
        let encode_jobs = jobs.iter().filter(|j| j.job_type() == JobType::Encode).count();
        let decode_jobs = jobs.len() - encode_jobs;

        let handle = self.orchestrator.spawn_run(self.settings.clone(), jobs)?;
        self.logger.info(&format!(
            "Processing started: {} encode, {} decode job(s)",
            encode_jobs, decode_jobs
        ));

        // Failures before any unit runs only show up in the run's result
        let events = self.events.clone();
        let logger = self.logger.clone();
        let watcher = thread::Builder::new()
            .name("processing-watch".to_string())
            .spawn(move || {
                let error = match handle.join() {
                    Ok(Ok(_)) => return,
                    Ok(Err(e)) => e,
                    Err(_) => OrchestratorError::RunLost,
                };
                logger.error(&format!("Processing failed: {}", error));
                let _ = events.send(AppEvent::Error(AppError::Orchestration(error)));
            });
        if let Err(e) = watcher {
            self.logger
                .warn(&format!("Could not watch processing thread: {}", e));
        }

        Ok(CommandResponse::ProcessingStarted {
            encode_jobs,
            decode_jobs,
        })
    }

    fn publish(&self, event: AppEvent) {
        // Nobody listening is not an error
        let _ = self.events.send(event);
    }
}

impl std::fmt::Debug for JobController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobController")
            .field("jobs", &self.store.len())
            .field("state", &self.state())
            .finish()
    }
}

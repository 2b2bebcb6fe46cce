//! Top-level coordinator: runs the encode and decode groups side by side.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use super::errors::{OrchestratorError, OrchestratorResult};
use super::factory::JobUnitFactory;
use super::supervisor::Supervisor;
use super::types::{EventCallback, GroupReport, OrchestratorEvent, OrchestratorState, RunOutcome};
use super::unit::BoxedUnit;
use crate::config::Settings;
use crate::jobs::JobStore;
use crate::logging::Logger;
use crate::models::{Job, JobType};

/// Runs a batch: one supervisor per group, both concurrently.
///
/// Cheap to clone; clones share the factory and the Processing flag.
#[derive(Clone)]
pub struct JobOrchestrator {
    factory: Arc<dyn JobUnitFactory>,
    processing: Arc<AtomicBool>,
    logger: Logger,
    events: Option<EventCallback>,
}

impl JobOrchestrator {
    pub fn new(factory: impl JobUnitFactory + 'static, logger: Logger) -> Self {
        Self {
            factory: Arc::new(factory),
            processing: Arc::new(AtomicBool::new(false)),
            logger,
            events: None,
        }
    }

    /// Set the event callback (builder pattern).
    ///
    /// Replaces any callback set before.
    pub fn with_event_callback(mut self, callback: EventCallback) -> Self {
        self.events = Some(callback);
        self
    }

    /// Current lifecycle state.
    pub fn state(&self) -> OrchestratorState {
        self.state_handle().state()
    }

    /// Handle for observing the state from elsewhere (e.g. an event callback).
    pub fn state_handle(&self) -> StateHandle {
        StateHandle {
            processing: Arc::clone(&self.processing),
        }
    }

    /// Run every job and block until both groups are done.
    ///
    /// Fails with `AlreadyProcessing` if another run is in flight.
    pub fn run(&self, settings: &Settings, jobs: &[Job]) -> OrchestratorResult<RunOutcome> {
        let guard = ProcessingGuard::acquire(&self.processing)?;
        self.execute(guard, settings, jobs)
    }

    /// Run every job in `store`.
    ///
    /// The store is borrowed for the whole run, so it can't change underneath.
    pub fn run_store(&self, settings: &Settings, store: &JobStore) -> OrchestratorResult<RunOutcome> {
        self.run(settings, store.list())
    }

    /// Start a run on a background thread.
    ///
    /// The Processing flag is taken before the thread starts, so a second
    /// call fails immediately rather than racing.
    pub fn spawn_run(
        &self,
        settings: Settings,
        jobs: Vec<Job>,
    ) -> OrchestratorResult<JoinHandle<OrchestratorResult<RunOutcome>>> {
        let guard = ProcessingGuard::acquire(&self.processing)?;
        let orchestrator = self.clone();

        thread::Builder::new()
            .name("orchestrator".to_string())
            .spawn(move || orchestrator.execute(guard, &settings, &jobs))
            .map_err(|e| OrchestratorError::spawn("orchestrator", e))
    }

    fn execute(
        &self,
        guard: ProcessingGuard,
        settings: &Settings,
        jobs: &[Job],
    ) -> OrchestratorResult<RunOutcome> {
        let start = Instant::now();

        let encode_units = self.prepare(JobType::Encode, settings, jobs)?;
        let decode_units = self.prepare(JobType::Decode, settings, jobs)?;

        self.logger.info(&format!(
            "Processing {} encode and {} decode unit(s)",
            encode_units.len(),
            decode_units.len()
        ));
        self.emit(OrchestratorEvent::RunStarted {
            encode_units: encode_units.len(),
            decode_units: decode_units.len(),
        });

        let encode = Supervisor::new(JobType::Encode, encode_units, self.logger.child("encode"))
            .with_events(self.events.clone());
        let decode = Supervisor::new(JobType::Decode, decode_units, self.logger.child("decode"))
            .with_events(self.events.clone());

        // Scoped so both supervisors are joined even if one fails to start
        let (encode, decode) = thread::scope(|s| {
            let encode_handle = thread::Builder::new()
                .name("supervisor-encode".to_string())
                .spawn_scoped(s, move || encode.run())
                .map_err(|e| OrchestratorError::spawn("encode supervisor", e))?;
            let decode_handle = thread::Builder::new()
                .name("supervisor-decode".to_string())
                .spawn_scoped(s, move || decode.run())
                .map_err(|e| OrchestratorError::spawn("decode supervisor", e))?;

            let encode = join_report(encode_handle.join(), JobType::Encode)?;
            let decode = join_report(decode_handle.join(), JobType::Decode)?;
            Ok::<_, OrchestratorError>((encode, decode))
        })?;

        let outcome = RunOutcome {
            encode,
            decode,
            elapsed: start.elapsed(),
        };

        self.logger.info(&format!(
            "Processing finished in {:.2}s: {}/{} unit(s) succeeded",
            outcome.elapsed.as_secs_f64(),
            outcome.encode.succeeded() + outcome.decode.succeeded(),
            outcome.units_processed()
        ));

        // Idle before anyone hears about completion
        drop(guard);
        self.emit(OrchestratorEvent::RunCompleted(outcome.clone()));
        Ok(outcome)
    }

    fn prepare(
        &self,
        group: JobType,
        settings: &Settings,
        jobs: &[Job],
    ) -> OrchestratorResult<Vec<BoxedUnit>> {
        self.factory.prepare(group, settings, jobs).map_err(|source| {
            self.logger
                .error(&format!("Could not prepare {} units: {}", group, source));
            OrchestratorError::Prepare { group, source }
        })
    }

    fn emit(&self, event: OrchestratorEvent) {
        if let Some(ref events) = self.events {
            events(event);
        }
    }
}

impl std::fmt::Debug for JobOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobOrchestrator")
            .field("state", &self.state())
            .field("has_events", &self.events.is_some())
            .finish()
    }
}

fn join_report(
    joined: thread::Result<GroupReport>,
    group: JobType,
) -> OrchestratorResult<GroupReport> {
    joined.map_err(|_| OrchestratorError::SupervisorLost(group))
}

/// Read-only view of an orchestrator's state.
#[derive(Debug, Clone)]
pub struct StateHandle {
    processing: Arc<AtomicBool>,
}

impl StateHandle {
    pub fn state(&self) -> OrchestratorState {
        if self.processing.load(Ordering::SeqCst) {
            OrchestratorState::Processing
        } else {
            OrchestratorState::Idle
        }
    }
}

/// Holds the Processing flag; dropping it returns the orchestrator to Idle.
struct ProcessingGuard {
    flag: Arc<AtomicBool>,
}

impl ProcessingGuard {
    fn acquire(flag: &Arc<AtomicBool>) -> OrchestratorResult<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map_err(|_| OrchestratorError::AlreadyProcessing)?;
        Ok(Self {
            flag: Arc::clone(flag),
        })
    }
}

impl Drop for ProcessingGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

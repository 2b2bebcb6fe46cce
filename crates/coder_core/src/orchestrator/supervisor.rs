//! Sequential driver for one job group.

use std::any::Any;
use std::collections::VecDeque;
use std::thread;
use std::time::Instant;

use super::types::{EventCallback, GroupReport, OrchestratorEvent, UnitOutcome, UnitStatus};
use super::unit::BoxedUnit;
use crate::logging::Logger;
use crate::models::JobType;

/// Drains a queue of units for one group, one at a time.
///
/// Each unit runs on its own named thread and is joined before the next
/// one is popped, so at most one unit of the group is active. A unit that
/// fails, is interrupted or panics is recorded and the queue continues.
pub struct Supervisor {
    group: JobType,
    queue: VecDeque<BoxedUnit>,
    logger: Logger,
    events: Option<EventCallback>,
}

impl Supervisor {
    pub fn new(group: JobType, units: Vec<BoxedUnit>, logger: Logger) -> Self {
        Self {
            group,
            queue: units.into(),
            logger,
            events: None,
        }
    }

    /// Set the event callback (builder pattern).
    pub fn with_events(mut self, events: Option<EventCallback>) -> Self {
        self.events = events;
        self
    }

    pub fn group(&self) -> JobType {
        self.group
    }

    /// Units still queued.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Run every queued unit in order and report.
    pub fn run(mut self) -> GroupReport {
        let start = Instant::now();
        let total = self.queue.len();
        let mut outcomes = Vec::with_capacity(total);

        if total > 0 {
            self.logger
                .info(&format!("Starting {} {} unit(s)", total, self.group));
        }

        let mut index = 0;
        while let Some(unit) = self.queue.pop_front() {
            index += 1;
            let name = unit.name().to_string();

            self.logger
                .debug(&format!("[{}/{}] Running '{}'", index, total, name));
            self.emit(OrchestratorEvent::UnitStarted {
                group: self.group,
                name: name.clone(),
            });

            let unit_start = Instant::now();
            let status = self.run_unit(index, unit);
            let outcome = UnitOutcome {
                name,
                status,
                elapsed: unit_start.elapsed(),
            };

            match &outcome.status {
                UnitStatus::Succeeded => self.logger.info(&format!(
                    "'{}' finished in {:.2}s",
                    outcome.name,
                    outcome.elapsed.as_secs_f64()
                )),
                UnitStatus::Failed(msg) => self
                    .logger
                    .warn(&format!("'{}' failed, continuing: {}", outcome.name, msg)),
                UnitStatus::Interrupted(msg) => self.logger.warn(&format!(
                    "'{}' was interrupted, continuing: {}",
                    outcome.name, msg
                )),
            }

            self.emit(OrchestratorEvent::UnitFinished {
                group: self.group,
                outcome: outcome.clone(),
            });
            outcomes.push(outcome);
        }

        let report = GroupReport {
            group: self.group,
            outcomes,
            elapsed: start.elapsed(),
        };

        if total > 0 {
            self.logger.info(&format!(
                "{} group done: {}/{} succeeded",
                self.group,
                report.succeeded(),
                total
            ));
        }
        self.emit(OrchestratorEvent::GroupFinished(report.clone()));
        report
    }

    /// Run one unit on its own thread and wait for it.
    fn run_unit(&self, index: usize, unit: BoxedUnit) -> UnitStatus {
        let handle = thread::Builder::new()
            .name(format!("{}-unit-{}", self.group, index))
            .spawn(move || unit.run());

        let handle = match handle {
            Ok(handle) => handle,
            Err(e) => return UnitStatus::Failed(format!("could not start unit thread: {}", e)),
        };

        match handle.join() {
            Ok(Ok(())) => UnitStatus::Succeeded,
            Ok(Err(e)) if e.is_interruption() => UnitStatus::Interrupted(e.to_string()),
            Ok(Err(e)) => UnitStatus::Failed(e.to_string()),
            Err(payload) => UnitStatus::Interrupted(panic_message(payload.as_ref())),
        }
    }

    fn emit(&self, event: OrchestratorEvent) {
        if let Some(ref events) = self.events {
            events(event);
        }
    }
}

/// Extract a readable message from a panic payload.
fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        format!("panicked: {}", msg)
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        format!("panicked: {}", msg)
    } else {
        "panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::LogLevel;
    use crate::orchestrator::{FnUnit, UnitError};
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn runs_units_in_submission_order() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let units: Vec<BoxedUnit> = (0..5)
            .map(|i| {
                let order = Arc::clone(&order);
                FnUnit::boxed(format!("u{}", i), move || {
                    // Earlier units sleep longer; order must still hold
                    thread::sleep(Duration::from_millis(10 - 2 * i as u64));
                    order.lock().push(i);
                    Ok(())
                })
            })
            .collect();

        let report = Supervisor::new(JobType::Encode, units, Logger::new("test")).run();

        assert_eq!(*order.lock(), vec![0, 1, 2, 3, 4]);
        let names: Vec<_> = report.outcomes.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, vec!["u0", "u1", "u2", "u3", "u4"]);
    }

    #[test]
    fn at_most_one_unit_active() {
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let units: Vec<BoxedUnit> = (0..4)
            .map(|i| {
                let active = Arc::clone(&active);
                let peak = Arc::clone(&peak);
                FnUnit::boxed(format!("u{}", i), move || {
                    let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    thread::sleep(Duration::from_millis(5));
                    active.fetch_sub(1, Ordering::SeqCst);
                    Ok(())
                })
            })
            .collect();

        Supervisor::new(JobType::Decode, units, Logger::new("test")).run();

        assert_eq!(peak.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failures_do_not_stop_the_queue() {
        crate::logging::init_test_tracing();
        let ran = Arc::new(AtomicUsize::new(0));
        let counter = |ran: &Arc<AtomicUsize>| {
            let ran = Arc::clone(ran);
            move || {
                ran.fetch_add(1, Ordering::SeqCst);
                Ok::<(), UnitError>(())
            }
        };

        let units: Vec<BoxedUnit> = vec![
            FnUnit::boxed("first", counter(&ran)),
            FnUnit::boxed("interrupted", || Err(UnitError::interrupted("wait interrupted"))),
            FnUnit::boxed("failing", || Err(UnitError::command_failed("gzip", 1, "bad input"))),
            FnUnit::boxed("panicking", || panic!("unit blew up")),
            FnUnit::boxed("last", counter(&ran)),
        ];

        let logger = Logger::new("test");
        let report = Supervisor::new(JobType::Encode, units, logger.clone()).run();

        assert_eq!(ran.load(Ordering::SeqCst), 2);
        assert_eq!(report.processed(), 5);
        assert_eq!(report.succeeded(), 2);
        assert!(matches!(report.outcomes[1].status, UnitStatus::Interrupted(_)));
        assert!(matches!(report.outcomes[2].status, UnitStatus::Failed(_)));
        assert_eq!(
            report.outcomes[3].status,
            UnitStatus::Interrupted("panicked: unit blew up".to_string())
        );
        assert!(report.outcomes[4].status.is_success());

        let warnings = logger.messages_at(LogLevel::Warn);
        assert_eq!(warnings.len(), 3);
        assert!(warnings[0].contains("interrupted"));
    }

    #[test]
    fn emits_unit_and_group_events() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        let callback: EventCallback = Arc::new(move |e: OrchestratorEvent| sink.lock().push(e));

        let units: Vec<BoxedUnit> = vec![FnUnit::boxed("a", || Ok(())), FnUnit::boxed("b", || Ok(()))];
        Supervisor::new(JobType::Decode, units, Logger::new("test"))
            .with_events(Some(callback))
            .run();

        let events = events.lock();
        assert_eq!(events.len(), 5);
        assert!(matches!(&events[0], OrchestratorEvent::UnitStarted { name, .. } if name == "a"));
        assert!(matches!(&events[1], OrchestratorEvent::UnitFinished { outcome, .. } if outcome.name == "a"));
        assert!(matches!(&events[4], OrchestratorEvent::GroupFinished(r) if r.processed() == 2));
    }

    #[test]
    fn empty_queue_reports_nothing() {
        let report = Supervisor::new(JobType::Encode, Vec::new(), Logger::new("test")).run();
        assert_eq!(report.processed(), 0);
        assert_eq!(report.group, JobType::Encode);
    }
}

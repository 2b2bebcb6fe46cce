//! Types shared by the supervisors and the orchestrator.

use std::sync::Arc;
use std::time::Duration;

use crate::models::JobType;

/// Orchestrator lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrchestratorState {
    #[default]
    Idle,
    Processing,
}

impl OrchestratorState {
    pub fn is_processing(&self) -> bool {
        matches!(self, Self::Processing)
    }
}

/// How a unit ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitStatus {
    Succeeded,
    Failed(String),
    Interrupted(String),
}

impl UnitStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded)
    }
}

impl std::fmt::Display for UnitStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Succeeded => write!(f, "succeeded"),
            Self::Failed(msg) => write!(f, "failed: {}", msg),
            Self::Interrupted(msg) => write!(f, "interrupted: {}", msg),
        }
    }
}

/// Result of one unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitOutcome {
    pub name: String,
    pub status: UnitStatus,
    pub elapsed: Duration,
}

/// Result of draining one group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupReport {
    pub group: JobType,
    /// One entry per unit, in submission order.
    pub outcomes: Vec<UnitOutcome>,
    pub elapsed: Duration,
}

impl GroupReport {
    /// Report for a group with no units.
    pub fn empty(group: JobType) -> Self {
        Self {
            group,
            outcomes: Vec::new(),
            elapsed: Duration::ZERO,
        }
    }

    /// Number of units that were run.
    pub fn processed(&self) -> usize {
        self.outcomes.len()
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.status.is_success()).count()
    }

    /// Number of units that failed or were interrupted.
    pub fn unsuccessful(&self) -> usize {
        self.processed() - self.succeeded()
    }
}

/// Result of a full run (both groups).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    pub encode: GroupReport,
    pub decode: GroupReport,
    /// Wall time of the whole run.
    pub elapsed: Duration,
}

impl RunOutcome {
    /// Total units run across both groups.
    pub fn units_processed(&self) -> usize {
        self.encode.processed() + self.decode.processed()
    }

    /// Check every unit in both groups succeeded.
    pub fn all_succeeded(&self) -> bool {
        self.encode.unsuccessful() == 0 && self.decode.unsuccessful() == 0
    }

    /// Get the report for one group.
    pub fn group(&self, group: JobType) -> &GroupReport {
        match group {
            JobType::Encode => &self.encode,
            JobType::Decode => &self.decode,
        }
    }
}

/// Progress notifications emitted while processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrchestratorEvent {
    RunStarted {
        encode_units: usize,
        decode_units: usize,
    },
    UnitStarted {
        group: JobType,
        name: String,
    },
    UnitFinished {
        group: JobType,
        outcome: UnitOutcome,
    },
    GroupFinished(GroupReport),
    /// Emitted after the orchestrator is back to Idle.
    RunCompleted(RunOutcome),
}

/// Callback type for orchestrator events.
///
/// Called from supervisor threads; implementations should hand the event
/// off (e.g. onto a channel) rather than touch interactive state.
pub type EventCallback = Arc<dyn Fn(OrchestratorEvent) + Send + Sync>;

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(name: &str, status: UnitStatus) -> UnitOutcome {
        UnitOutcome {
            name: name.to_string(),
            status,
            elapsed: Duration::from_millis(1),
        }
    }

    #[test]
    fn group_report_counts() {
        let report = GroupReport {
            group: JobType::Encode,
            outcomes: vec![
                outcome("a", UnitStatus::Succeeded),
                outcome("b", UnitStatus::Failed("exit 1".into())),
                outcome("c", UnitStatus::Interrupted("panic".into())),
            ],
            elapsed: Duration::from_millis(3),
        };

        assert_eq!(report.processed(), 3);
        assert_eq!(report.succeeded(), 1);
        assert_eq!(report.unsuccessful(), 2);
    }

    #[test]
    fn empty_run_outcome() {
        let outcome = RunOutcome {
            encode: GroupReport::empty(JobType::Encode),
            decode: GroupReport::empty(JobType::Decode),
            elapsed: Duration::ZERO,
        };
        assert_eq!(outcome.units_processed(), 0);
        assert!(outcome.all_succeeded());
        assert_eq!(outcome.group(JobType::Decode).group, JobType::Decode);
    }
}

//! Batch orchestration.
//!
//! Jobs are turned into execution units by a [`JobUnitFactory`], split by
//! type, and drained by two [`Supervisor`]s running concurrently. Within a
//! group units run strictly one after another; a failing or interrupted
//! unit is logged and the group moves on.
//!
//! ```text
//! JobOrchestrator::run
//!   ├── factory.prepare(Encode) ─► Supervisor (encode) ─► unit, unit, ...
//!   └── factory.prepare(Decode) ─► Supervisor (decode) ─► unit, unit, ...
//! ```

mod errors;
mod factory;
mod runner;
mod supervisor;
mod types;
mod unit;

pub use errors::{
    FactoryError, FactoryResult, OrchestratorError, OrchestratorResult, UnitError, UnitResult,
};
pub use factory::{CommandUnit, CommandUnitFactory, JobUnitFactory};
pub use runner::{JobOrchestrator, StateHandle};
pub use supervisor::Supervisor;
pub use types::{
    EventCallback, GroupReport, OrchestratorEvent, OrchestratorState, RunOutcome, UnitOutcome,
    UnitStatus,
};
pub use unit::{BoxedUnit, ExecutionUnit, FnUnit};

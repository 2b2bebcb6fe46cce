//! Execution unit trait.
//!
//! A unit is one-shot work produced by a factory and consumed by a
//! supervisor. It runs on its own thread and is never inspected by the
//! orchestrator beyond its name and result.

use super::errors::UnitResult;

/// Trait for runnable work.
pub trait ExecutionUnit: Send {
    /// Display name (usually the job name).
    fn name(&self) -> &str;

    /// Run the unit to completion.
    ///
    /// Consumes the unit: each unit runs at most once.
    fn run(self: Box<Self>) -> UnitResult<()>;
}

/// Boxed unit as queued by supervisors.
pub type BoxedUnit = Box<dyn ExecutionUnit>;

/// Unit backed by a closure.
pub struct FnUnit<F> {
    name: String,
    work: F,
}

impl<F> FnUnit<F>
where
    F: FnOnce() -> UnitResult<()> + Send + 'static,
{
    pub fn new(name: impl Into<String>, work: F) -> Self {
        Self {
            name: name.into(),
            work,
        }
    }

    /// Box the unit for a supervisor queue.
    pub fn boxed(name: impl Into<String>, work: F) -> BoxedUnit {
        Box::new(Self::new(name, work))
    }
}

impl<F> ExecutionUnit for FnUnit<F>
where
    F: FnOnce() -> UnitResult<()> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn run(self: Box<Self>) -> UnitResult<()> {
        (self.work)()
    }
}

impl<F> std::fmt::Debug for FnUnit<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnUnit").field("name", &self.name).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::UnitError;

    #[test]
    fn fn_unit_runs_closure() {
        let unit = FnUnit::boxed("ok", || Ok(()));
        assert_eq!(unit.name(), "ok");
        assert!(unit.run().is_ok());
    }

    #[test]
    fn fn_unit_propagates_error() {
        let unit = FnUnit::boxed("bad", || Err(UnitError::failed("boom")));
        let err = unit.run().unwrap_err();
        assert_eq!(err.to_string(), "boom");
    }
}

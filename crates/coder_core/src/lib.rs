//! Coder Core - Backend logic for Batch Coder
//!
//! This crate contains the job registry, its persistence, and the
//! encode/decode orchestrator, with zero UI dependencies. It can be
//! driven by the bundled CLI or any other front end.

pub mod config;
pub mod controller;
mod fsutil;
pub mod jobs;
pub mod logging;
pub mod models;
pub mod orchestrator;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_returns_value() {
        assert!(!version().is_empty());
    }
}

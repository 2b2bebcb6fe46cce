//! Job registry and persistence.
//!
//! This module provides:
//! - `JobStore`: ordered, uniquely named job list, persisted on every change
//! - `PersistenceGateway`: load/save contract for the job snapshot
//! - `JsonFileGateway`: versioned JSON snapshot with atomic replacement
//! - `MemoryGateway`: shared in-memory snapshot (tests, scratch stores)

mod errors;
mod persistence;
mod store;

pub use errors::{PersistenceError, PersistenceResult, StoreError, StoreResult};
pub use persistence::{JsonFileGateway, MemoryGateway, PersistenceGateway, SNAPSHOT_VERSION};
pub use store::{JobStore, RemovalReport};

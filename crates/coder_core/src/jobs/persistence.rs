//! Durable storage for the job list.
//!
//! The store talks to a [`PersistenceGateway`]; the default gateway keeps a
//! versioned JSON snapshot on disk and replaces it atomically on every save.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use super::errors::{PersistenceError, PersistenceResult};
use crate::fsutil::write_atomic;
use crate::models::Job;

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Loads and saves complete job snapshots.
pub trait PersistenceGateway: Send {
    /// Read the persisted jobs in enumeration order.
    ///
    /// Returns an empty list when nothing has been saved yet.
    fn load(&self) -> PersistenceResult<Vec<Job>>;

    /// Replace the persisted snapshot with `jobs`.
    fn save(&self, jobs: &[Job]) -> PersistenceResult<()>;

    /// Human-readable location, used in log messages.
    fn location(&self) -> String;
}

/// Persistent snapshot format (saved to jobs.json).
#[derive(Debug, Clone, Serialize, Deserialize)]
struct JobSnapshot {
    /// Snapshot format version.
    version: u32,
    /// Jobs in enumeration order.
    jobs: Vec<Job>,
}

/// Borrowing twin of [`JobSnapshot`] so saves don't clone the job list.
#[derive(Serialize)]
struct JobSnapshotRef<'a> {
    version: u32,
    jobs: &'a [Job],
}

/// JSON file gateway.
#[derive(Debug, Clone)]
pub struct JsonFileGateway {
    /// Path to the snapshot file.
    path: PathBuf,
}

impl JsonFileGateway {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Get the snapshot path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PersistenceGateway for JsonFileGateway {
    fn load(&self) -> PersistenceResult<Vec<Job>> {
        if !self.path.exists() {
            tracing::debug!("No job snapshot at {}, starting empty", self.path.display());
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&self.path)
            .map_err(|e| PersistenceError::io("reading", &self.path, e))?;

        let snapshot: JobSnapshot =
            serde_json::from_str(&content).map_err(|source| PersistenceError::Malformed {
                path: self.path.clone(),
                source,
            })?;

        if snapshot.version != SNAPSHOT_VERSION {
            return Err(PersistenceError::UnsupportedVersion {
                path: self.path.clone(),
                version: snapshot.version,
            });
        }

        let mut seen = HashSet::with_capacity(snapshot.jobs.len());
        for job in &snapshot.jobs {
            if !seen.insert(job.name()) {
                return Err(PersistenceError::DuplicateEntry {
                    path: self.path.clone(),
                    name: job.name().to_string(),
                });
            }
        }

        tracing::debug!("Read {} jobs from {}", snapshot.jobs.len(), self.path.display());
        Ok(snapshot.jobs)
    }

    fn save(&self, jobs: &[Job]) -> PersistenceResult<()> {
        let snapshot = JobSnapshotRef {
            version: SNAPSHOT_VERSION,
            jobs,
        };
        let json = serde_json::to_vec_pretty(&snapshot).map_err(|source| {
            PersistenceError::Malformed {
                path: self.path.clone(),
                source,
            }
        })?;

        write_atomic(&self.path, &json).map_err(|e| PersistenceError::io("saving", &self.path, e))?;

        tracing::debug!("Saved {} jobs to {}", jobs.len(), self.path.display());
        Ok(())
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

/// In-memory gateway.
///
/// Clones share the same snapshot, so a test can keep one handle to inspect
/// what the store saved.
#[derive(Debug, Clone, Default)]
pub struct MemoryGateway {
    jobs: Arc<Mutex<Vec<Job>>>,
    saves: Arc<AtomicUsize>,
    fail_saves: Arc<AtomicBool>,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a gateway that already holds `jobs`.
    pub fn with_jobs(jobs: Vec<Job>) -> Self {
        let gateway = Self::default();
        *gateway.jobs.lock() = jobs;
        gateway
    }

    /// Number of successful saves so far.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// Make subsequent saves fail (or succeed again).
    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    /// Copy of the last saved snapshot.
    pub fn saved_jobs(&self) -> Vec<Job> {
        self.jobs.lock().clone()
    }
}

impl PersistenceGateway for MemoryGateway {
    fn load(&self) -> PersistenceResult<Vec<Job>> {
        Ok(self.jobs.lock().clone())
    }

    fn save(&self, jobs: &[Job]) -> PersistenceResult<()> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(PersistenceError::Rejected("memory gateway set to fail".to_string()));
        }
        *self.jobs.lock() = jobs.to_vec();
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn location(&self) -> String {
        "memory".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::JobType;
    use tempfile::tempdir;

    fn sample_jobs() -> Vec<Job> {
        vec![
            Job::new("zeta", JobType::Encode)
                .with_input_files(["/in/a.txt", "/in/b.txt"])
                .with_output_folder("/out")
                .with_param("key", "k1"),
            Job::new("alpha", JobType::Decode).with_input_file("/in/c.enc"),
        ]
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempdir().unwrap();
        let gateway = JsonFileGateway::new(dir.path().join("jobs.json"));

        assert!(gateway.load().unwrap().is_empty());
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempdir().unwrap();
        let gateway = JsonFileGateway::new(dir.path().join("nested").join("jobs.json"));
        let jobs = sample_jobs();

        gateway.save(&jobs).unwrap();
        let loaded = gateway.load().unwrap();

        assert_eq!(loaded, jobs);
        assert!(!crate::fsutil::temp_path_for(gateway.path()).exists());
    }

    #[test]
    fn save_replaces_previous_snapshot() {
        let dir = tempdir().unwrap();
        let gateway = JsonFileGateway::new(dir.path().join("jobs.json"));

        gateway.save(&sample_jobs()).unwrap();
        gateway.save(&sample_jobs()[1..]).unwrap();

        let loaded = gateway.load().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].name(), "alpha");
    }

    #[test]
    fn malformed_file_is_reported() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("jobs.json");
        fs::write(&path, b"{ this is not valid json }").unwrap();

        let err = JsonFileGateway::new(&path).load().unwrap_err();
        assert!(matches!(err, PersistenceError::Malformed { .. }));
    }

    #[test]
    fn empty_file_is_reported() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("jobs.json");
        fs::write(&path, b"").unwrap();

        let err = JsonFileGateway::new(&path).load().unwrap_err();
        assert!(matches!(err, PersistenceError::Malformed { .. }));
    }

    #[test]
    fn unsupported_version_is_reported() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("jobs.json");
        fs::write(&path, r#"{"version": 99, "jobs": []}"#).unwrap();

        let err = JsonFileGateway::new(&path).load().unwrap_err();
        assert!(matches!(err, PersistenceError::UnsupportedVersion { version: 99, .. }));
    }

    #[test]
    fn duplicate_names_are_reported() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("jobs.json");
        fs::write(
            &path,
            r#"{"version": 1, "jobs": [
                {"name": "a", "type": "encode"},
                {"name": "a", "type": "decode"}
            ]}"#,
        )
        .unwrap();

        let err = JsonFileGateway::new(&path).load().unwrap_err();
        assert!(matches!(err, PersistenceError::DuplicateEntry { ref name, .. } if name == "a"));
    }

    #[test]
    fn memory_gateway_counts_and_fails_saves() {
        let gateway = MemoryGateway::new();
        let observer = gateway.clone();

        gateway.save(&sample_jobs()).unwrap();
        assert_eq!(observer.save_count(), 1);
        assert_eq!(observer.saved_jobs().len(), 2);

        observer.set_fail_saves(true);
        assert!(gateway.save(&[]).is_err());
        assert_eq!(observer.save_count(), 1);
        assert_eq!(observer.saved_jobs().len(), 2);
    }
}

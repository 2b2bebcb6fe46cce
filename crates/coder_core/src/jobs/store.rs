//! Job registry with name uniqueness and write-through persistence.

use std::collections::{HashMap, HashSet};

use super::errors::{PersistenceError, PersistenceResult, StoreError, StoreResult};
use super::persistence::{MemoryGateway, PersistenceGateway};
use crate::logging::Logger;
use crate::models::{Job, JobType};

/// Result of a `remove` call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemovalReport {
    /// Names that were in the store and are now gone, in store order.
    pub removed: Vec<String>,
    /// Requested names that were not in the store.
    pub unknown: Vec<String>,
}

/// Ordered, uniquely named collection of jobs.
///
/// Every mutation builds the new job list, saves it through the gateway and
/// only then replaces the in-memory state, so a failed save leaves the store
/// exactly as it was last persisted.
pub struct JobStore {
    /// Jobs in insertion order.
    jobs: Vec<Job>,
    /// Name -> position in `jobs`.
    index: HashMap<String, usize>,
    /// Durable storage.
    gateway: Box<dyn PersistenceGateway>,
    logger: Logger,
}

impl JobStore {
    /// Load the store from `gateway`.
    ///
    /// Fails if the persisted snapshot can't be read.
    pub fn open(gateway: impl PersistenceGateway + 'static, logger: Logger) -> PersistenceResult<Self> {
        let jobs = gateway.load()?;
        logger.info(&format!("Loaded {} jobs from {}", jobs.len(), gateway.location()));
        Ok(Self::from_parts(jobs, Box::new(gateway), logger))
    }

    /// Load the store, falling back to an empty store on failure.
    ///
    /// The load error (if any) is returned alongside so the caller can tell
    /// the user their saved jobs were not restored.
    pub fn open_or_empty(
        gateway: impl PersistenceGateway + 'static,
        logger: Logger,
    ) -> (Self, Option<PersistenceError>) {
        match gateway.load() {
            Ok(jobs) => {
                logger.info(&format!("Loaded {} jobs from {}", jobs.len(), gateway.location()));
                (Self::from_parts(jobs, Box::new(gateway), logger), None)
            }
            Err(e) => {
                logger.error(&format!("Starting with no jobs: {}", e));
                (Self::from_parts(Vec::new(), Box::new(gateway), logger), Some(e))
            }
        }
    }

    /// Create an empty store without durable persistence (for testing).
    pub fn in_memory() -> Self {
        Self::from_parts(Vec::new(), Box::new(MemoryGateway::new()), Logger::new("store"))
    }

    fn from_parts(jobs: Vec<Job>, gateway: Box<dyn PersistenceGateway>, logger: Logger) -> Self {
        let index = build_index(&jobs);
        Self {
            jobs,
            index,
            gateway,
            logger,
        }
    }

    /// Add a job at the end of the list.
    ///
    /// Rejects a name that is already taken without touching the store.
    pub fn add(&mut self, job: Job) -> StoreResult<()> {
        if job.name().trim().is_empty() {
            return Err(StoreError::EmptyJobName);
        }
        if self.contains(job.name()) {
            self.logger
                .warn(&format!("Rejected job '{}': name already taken", job.name()));
            return Err(StoreError::DuplicateJobName(job.name().to_string()));
        }

        let name = job.name().to_string();
        let mut jobs = self.jobs.clone();
        jobs.push(job);
        self.commit(jobs)?;

        self.logger.info(&format!("Added job '{}'", name));
        Ok(())
    }

    /// Replace an existing job with a new version of the same name.
    ///
    /// The job keeps its position in the list.
    pub fn update(&mut self, job: Job) -> StoreResult<()> {
        let Some(&position) = self.index.get(job.name()) else {
            return Err(StoreError::UnknownJobName(job.name().to_string()));
        };

        let name = job.name().to_string();
        let mut jobs = self.jobs.clone();
        jobs[position] = job;
        self.commit(jobs)?;

        self.logger.info(&format!("Updated job '{}'", name));
        Ok(())
    }

    /// Remove every named job that exists.
    ///
    /// Unknown names are ignored. The result is persisted exactly once,
    /// even when nothing matched.
    pub fn remove<I, S>(&mut self, names: I) -> StoreResult<RemovalReport>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut requested = HashSet::new();
        let mut report = RemovalReport::default();

        for name in names {
            let name = name.as_ref();
            if !requested.insert(name.to_string()) {
                continue;
            }
            if !self.contains(name) {
                self.logger
                    .debug(&format!("Ignoring removal of unknown job '{}'", name));
                report.unknown.push(name.to_string());
            }
        }

        let mut jobs = Vec::with_capacity(self.jobs.len());
        for job in &self.jobs {
            if requested.contains(job.name()) {
                report.removed.push(job.name().to_string());
            } else {
                jobs.push(job.clone());
            }
        }

        self.commit(jobs)?;

        if !report.removed.is_empty() {
            self.logger
                .info(&format!("Removed jobs: {}", report.removed.join(", ")));
        }
        Ok(report)
    }

    /// Check whether a job with this name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Get a job by name.
    pub fn get(&self, name: &str) -> Option<&Job> {
        self.index.get(name).map(|&i| &self.jobs[i])
    }

    /// All jobs in insertion order.
    pub fn list(&self) -> &[Job] {
        &self.jobs
    }

    /// Jobs of one type, in insertion order.
    pub fn jobs_of_type(&self, job_type: JobType) -> impl Iterator<Item = &Job> + '_ {
        self.jobs.iter().filter(move |j| j.job_type() == job_type)
    }

    /// Owned copy of the job list, for handing to processing.
    pub fn snapshot(&self) -> Vec<Job> {
        self.jobs.clone()
    }

    /// Number of jobs.
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    /// Check if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Where the store persists to.
    pub fn location(&self) -> String {
        self.gateway.location()
    }

    /// Persist `jobs` and make them the current state.
    fn commit(&mut self, jobs: Vec<Job>) -> StoreResult<()> {
        if let Err(e) = self.gateway.save(&jobs) {
            self.logger.error(&format!("Failed to save jobs: {}", e));
            return Err(e.into());
        }
        self.index = build_index(&jobs);
        self.jobs = jobs;
        Ok(())
    }
}

impl std::fmt::Debug for JobStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobStore")
            .field("jobs", &self.jobs)
            .field("location", &self.gateway.location())
            .finish()
    }
}

fn build_index(jobs: &[Job]) -> HashMap<String, usize> {
    jobs.iter()
        .enumerate()
        .map(|(i, job)| (job.name().to_string(), i))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::JsonFileGateway;
    use crate::logging::LogLevel;
    use tempfile::tempdir;

    fn make_job(name: &str, job_type: JobType) -> Job {
        Job::new(name, job_type)
            .with_input_file(format!("/in/{}.bin", name))
            .with_output_folder("/out")
    }

    fn store_with(gateway: &MemoryGateway) -> JobStore {
        JobStore::open(gateway.clone(), Logger::new("store")).unwrap()
    }

    fn names(store: &JobStore) -> Vec<&str> {
        store.list().iter().map(|j| j.name()).collect()
    }

    #[test]
    fn add_preserves_insertion_order() {
        let gateway = MemoryGateway::new();
        let mut store = store_with(&gateway);

        store.add(make_job("c", JobType::Encode)).unwrap();
        store.add(make_job("a", JobType::Decode)).unwrap();
        store.add(make_job("b", JobType::Encode)).unwrap();

        assert_eq!(names(&store), vec!["c", "a", "b"]);
        assert!(store.contains("a"));
        assert_eq!(store.get("b").unwrap().job_type(), JobType::Encode);
        assert_eq!(gateway.save_count(), 3);
    }

    #[test]
    fn duplicate_add_is_rejected_without_mutation() {
        let gateway = MemoryGateway::new();
        let mut store = store_with(&gateway);
        store.add(make_job("a", JobType::Encode)).unwrap();

        let replacement = make_job("a", JobType::Decode);
        let err = store.add(replacement).unwrap_err();

        assert!(matches!(err, StoreError::DuplicateJobName(ref n) if n == "a"));
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("a").unwrap().job_type(), JobType::Encode);
        assert_eq!(gateway.save_count(), 1);
    }

    #[test]
    fn empty_name_is_rejected() {
        let mut store = JobStore::in_memory();
        assert!(matches!(
            store.add(Job::new("   ", JobType::Encode)),
            Err(StoreError::EmptyJobName)
        ));
        assert!(store.is_empty());
    }

    #[test]
    fn remove_ignores_unknown_and_saves_once() {
        let gateway = MemoryGateway::new();
        let mut store = store_with(&gateway);
        for name in ["a", "b", "c", "d"] {
            store.add(make_job(name, JobType::Encode)).unwrap();
        }
        let saves_before = gateway.save_count();

        let report = store.remove(["d", "x", "b", "b"]).unwrap();

        assert_eq!(report.removed, vec!["b", "d"]);
        assert_eq!(report.unknown, vec!["x"]);
        assert_eq!(names(&store), vec!["a", "c"]);
        assert!(!store.contains("b"));
        assert_eq!(store.get("c").unwrap().name(), "c");
        assert_eq!(gateway.save_count(), saves_before + 1);
    }

    #[test]
    fn remove_nothing_still_persists() {
        let gateway = MemoryGateway::new();
        let mut store = store_with(&gateway);

        let report = store.remove(Vec::<String>::new()).unwrap();

        assert!(report.removed.is_empty());
        assert_eq!(gateway.save_count(), 1);
    }

    #[test]
    fn update_replaces_in_place() {
        let mut store = JobStore::in_memory();
        store.add(make_job("a", JobType::Encode)).unwrap();
        store.add(make_job("b", JobType::Encode)).unwrap();

        let edited = make_job("a", JobType::Decode).with_param("key", "v2");
        store.update(edited).unwrap();

        assert_eq!(names(&store), vec!["a", "b"]);
        assert_eq!(store.get("a").unwrap().job_type(), JobType::Decode);
        assert!(matches!(
            store.update(make_job("zzz", JobType::Encode)),
            Err(StoreError::UnknownJobName(_))
        ));
    }

    #[test]
    fn failed_save_leaves_store_unchanged() {
        crate::logging::init_test_tracing();
        let gateway = MemoryGateway::new();
        let logger = Logger::new("store").with_level(LogLevel::Debug);
        let mut store = JobStore::open(gateway.clone(), logger.clone()).unwrap();
        store.add(make_job("a", JobType::Encode)).unwrap();

        gateway.set_fail_saves(true);

        let err = store.add(make_job("b", JobType::Encode)).unwrap_err();
        assert!(matches!(err, StoreError::Persistence(_)));
        assert_eq!(names(&store), vec!["a"]);

        assert!(store.remove(["a"]).is_err());
        assert!(store.contains("a"));

        let errors = logger.messages_at(LogLevel::Error);
        assert_eq!(errors.len(), 2);
        assert!(errors[0].contains("Failed to save jobs"));
    }

    #[test]
    fn jobs_of_type_filters_in_order() {
        let mut store = JobStore::in_memory();
        store.add(make_job("e1", JobType::Encode)).unwrap();
        store.add(make_job("d1", JobType::Decode)).unwrap();
        store.add(make_job("e2", JobType::Encode)).unwrap();

        let encode: Vec<_> = store.jobs_of_type(JobType::Encode).map(|j| j.name()).collect();
        assert_eq!(encode, vec!["e1", "e2"]);
    }

    #[test]
    fn reopen_restores_saved_jobs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("jobs.json");

        let original = {
            let mut store = JobStore::open(JsonFileGateway::new(&path), Logger::new("store")).unwrap();
            store.add(make_job("first", JobType::Encode).with_param("rounds", 3)).unwrap();
            store.add(make_job("second", JobType::Decode)).unwrap();
            store.snapshot()
        };

        let reopened = JobStore::open(JsonFileGateway::new(&path), Logger::new("store")).unwrap();
        assert_eq!(reopened.list(), original.as_slice());
        assert!(reopened.contains("second"));
    }

    #[test]
    fn open_or_empty_reports_load_failure() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("jobs.json");
        std::fs::write(&path, "not json").unwrap();

        let (store, error) = JobStore::open_or_empty(JsonFileGateway::new(&path), Logger::new("store"));

        assert!(store.is_empty());
        assert!(matches!(error, Some(PersistenceError::Malformed { .. })));
    }
}

//! Job value type.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::enums::JobType;

/// Type-specific job parameters.
///
/// The core never interprets these; they are carried alongside the job and
/// resolved by the unit factory.
pub type JobParams = BTreeMap<String, serde_json::Value>;

/// Reasons a job cannot be executed yet.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JobValidationError {
    #[error("Job '{0}' has no input files")]
    NoInputFiles(String),

    #[error("Job '{0}' has no output folder")]
    NoOutputFolder(String),
}

/// A single named unit of encode or decode work.
///
/// Jobs are immutable once built: the store hands out shared references
/// and edits go through a full replacement (`JobStore::update`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    /// Unique name, also the display key.
    name: String,
    /// Encode or decode.
    #[serde(rename = "type")]
    job_type: JobType,
    /// Files to process, in order.
    #[serde(default)]
    input_files: Vec<PathBuf>,
    /// Destination folder for produced files.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    output_folder: Option<PathBuf>,
    /// Opaque type-specific options.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    params: JobParams,
}

impl Job {
    /// Create a job with no inputs and no output folder.
    pub fn new(name: impl Into<String>, job_type: JobType) -> Self {
        Self {
            name: name.into(),
            job_type,
            input_files: Vec::new(),
            output_folder: None,
            params: JobParams::new(),
        }
    }

    /// Append one input file.
    pub fn with_input_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.input_files.push(path.into());
        self
    }

    /// Append several input files, keeping their order.
    pub fn with_input_files<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.input_files.extend(paths.into_iter().map(Into::into));
        self
    }

    /// Set the output folder.
    pub fn with_output_folder(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_folder = Some(path.into());
        self
    }

    /// Set a type-specific parameter, replacing any previous value.
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn job_type(&self) -> JobType {
        self.job_type
    }

    pub fn input_files(&self) -> &[PathBuf] {
        &self.input_files
    }

    pub fn output_folder(&self) -> Option<&Path> {
        self.output_folder.as_deref()
    }

    pub fn params(&self) -> &JobParams {
        &self.params
    }

    /// Get a parameter rendered as plain text.
    ///
    /// Strings are returned without quotes; other JSON values use their
    /// compact JSON form.
    pub fn param_text(&self, key: &str) -> Option<String> {
        self.params.get(key).map(|value| match value {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }

    /// Check the job has everything needed to run.
    pub fn validate_for_execution(&self) -> Result<(), JobValidationError> {
        if self.input_files.is_empty() {
            return Err(JobValidationError::NoInputFiles(self.name.clone()));
        }
        match &self.output_folder {
            Some(folder) if !folder.as_os_str().is_empty() => Ok(()),
            _ => Err(JobValidationError::NoOutputFolder(self.name.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_keeps_input_order() {
        let job = Job::new("a", JobType::Encode)
            .with_input_file("/in/2.bin")
            .with_input_files(["/in/1.bin", "/in/3.bin"]);

        let names: Vec<_> = job.input_files().iter().map(|p| p.to_string_lossy()).collect();
        assert_eq!(names, vec!["/in/2.bin", "/in/1.bin", "/in/3.bin"]);
    }

    #[test]
    fn validation_requires_inputs_and_output() {
        let job = Job::new("a", JobType::Decode);
        assert_eq!(
            job.validate_for_execution(),
            Err(JobValidationError::NoInputFiles("a".to_string()))
        );

        let job = job.with_input_file("/in/a.bin");
        assert_eq!(
            job.validate_for_execution(),
            Err(JobValidationError::NoOutputFolder("a".to_string()))
        );

        let job = job.with_output_folder("/out");
        assert!(job.validate_for_execution().is_ok());
    }

    #[test]
    fn param_text_unquotes_strings() {
        let job = Job::new("a", JobType::Encode)
            .with_param("key", "secret")
            .with_param("rounds", 3);

        assert_eq!(job.param_text("key").as_deref(), Some("secret"));
        assert_eq!(job.param_text("rounds").as_deref(), Some("3"));
        assert_eq!(job.param_text("missing"), None);
    }

    #[test]
    fn serializes_type_field() {
        let job = Job::new("a", JobType::Encode).with_output_folder("/out");
        let json = serde_json::to_value(&job).unwrap();

        assert_eq!(json["type"], "encode");
        assert_eq!(json["output_folder"], "/out");
        assert!(json.get("params").is_none());
    }
}

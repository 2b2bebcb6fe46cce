//! Turning jobs into execution units.
//!
//! The orchestrator never looks inside a `Job`; a [`JobUnitFactory`]
//! resolves files, output folder and parameters into runnable units.
//! [`CommandUnitFactory`] is the default and runs the external program
//! configured for each group.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use super::errors::{FactoryError, FactoryResult, UnitError, UnitResult};
use super::unit::{BoxedUnit, ExecutionUnit, FnUnit};
use crate::config::{CodecSettings, Settings};
use crate::logging::Logger;
use crate::models::{Job, JobType};

/// Produces the ordered units for one group.
pub trait JobUnitFactory: Send + Sync {
    /// Build units for every job of `job_type`, in job order.
    fn prepare(
        &self,
        job_type: JobType,
        settings: &Settings,
        jobs: &[Job],
    ) -> FactoryResult<Vec<BoxedUnit>>;
}

impl<F> JobUnitFactory for F
where
    F: Fn(JobType, &Settings, &[Job]) -> FactoryResult<Vec<BoxedUnit>> + Send + Sync,
{
    fn prepare(
        &self,
        job_type: JobType,
        settings: &Settings,
        jobs: &[Job],
    ) -> FactoryResult<Vec<BoxedUnit>> {
        self(job_type, settings, jobs)
    }
}

/// Factory that runs the configured program once per input file.
#[derive(Debug, Clone)]
pub struct CommandUnitFactory {
    logger: Logger,
}

impl CommandUnitFactory {
    pub fn new(logger: Logger) -> Self {
        Self { logger }
    }
}

impl Default for CommandUnitFactory {
    fn default() -> Self {
        Self::new(Logger::new("factory"))
    }
}

impl JobUnitFactory for CommandUnitFactory {
    fn prepare(
        &self,
        job_type: JobType,
        settings: &Settings,
        jobs: &[Job],
    ) -> FactoryResult<Vec<BoxedUnit>> {
        let group: Vec<&Job> = jobs.iter().filter(|j| j.job_type() == job_type).collect();
        if group.is_empty() {
            return Ok(Vec::new());
        }

        let codec = settings.codec(job_type);
        if !codec.is_configured() {
            let reason = FactoryError::NotConfigured(job_type).to_string();
            self.logger.warn(&format!("{}; {} job(s) will fail", reason, group.len()));
            return Ok(group
                .into_iter()
                .map(|job| failing_unit(job.name(), UnitError::failed(reason.clone())))
                .collect());
        }

        let mut units: Vec<BoxedUnit> = Vec::with_capacity(group.len());
        for job in group {
            match job.validate_for_execution() {
                Ok(()) => units.push(Box::new(CommandUnit::new(
                    job.clone(),
                    codec,
                    self.logger.child(job.name()),
                ))),
                Err(e) => {
                    self.logger.warn(&format!("Queued '{}' will fail: {}", job.name(), e));
                    units.push(failing_unit(
                        job.name(),
                        UnitError::invalid_job(job.name(), e.to_string()),
                    ));
                }
            }
        }

        self.logger.debug(&format!(
            "Prepared {} {} unit(s) using '{}'",
            units.len(),
            job_type,
            codec.program
        ));
        Ok(units)
    }
}

/// Placeholder unit keeping the job's slot in the group report.
fn failing_unit(name: &str, error: UnitError) -> BoxedUnit {
    FnUnit::boxed(name, move || Err(error))
}

/// Runs one job: the configured program once per input file, in order.
///
/// Stops at the first failing file.
#[derive(Debug)]
pub struct CommandUnit {
    job: Job,
    program: String,
    args: Vec<String>,
    output_extension: String,
    logger: Logger,
}

impl CommandUnit {
    pub fn new(job: Job, codec: &CodecSettings, logger: Logger) -> Self {
        Self {
            job,
            program: codec.program.clone(),
            args: codec.args.clone(),
            output_extension: codec.output_extension.clone(),
            logger,
        }
    }

    /// Arguments for one input file, placeholders expanded.
    pub fn arguments_for(&self, input: &Path, output_folder: &Path) -> Vec<String> {
        let output = output_path(input, output_folder, &self.output_extension);
        self.args
            .iter()
            .map(|template| {
                expand_placeholders(template, |key| match key {
                    "input" => Some(input.display().to_string()),
                    "output" => Some(output.display().to_string()),
                    "output_folder" => Some(output_folder.display().to_string()),
                    "name" => Some(self.job.name().to_string()),
                    "stem" => Some(file_stem(input)),
                    other => self.job.param_text(other),
                })
            })
            .collect()
    }

    fn run_file(&self, input: &Path, output_folder: &Path) -> UnitResult<()> {
        let args = self.arguments_for(input, output_folder);
        tracing::debug!("Running {} {:?}", self.program, args);

        let output = Command::new(&self.program)
            .args(&args)
            .output()
            .map_err(|e| UnitError::io(format!("running {}", self.program), e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(UnitError::command_failed(
                &self.program,
                output.status.code().unwrap_or(-1),
                stderr.trim(),
            ));
        }
        Ok(())
    }
}

impl ExecutionUnit for CommandUnit {
    fn name(&self) -> &str {
        self.job.name()
    }

    fn run(self: Box<Self>) -> UnitResult<()> {
        let output_folder = self
            .job
            .output_folder()
            .ok_or_else(|| UnitError::invalid_job(self.job.name(), "no output folder"))?;

        fs::create_dir_all(output_folder).map_err(|e| {
            UnitError::io(format!("creating {}", output_folder.display()), e)
        })?;

        let total = self.job.input_files().len();
        for (i, input) in self.job.input_files().iter().enumerate() {
            self.logger.info(&format!(
                "[{}/{}] {} {}",
                i + 1,
                total,
                self.job.job_type(),
                input.display()
            ));
            self.run_file(input, output_folder)?;
        }
        Ok(())
    }
}

/// `<output_folder>/<input stem>.<extension>`
fn output_path(input: &Path, output_folder: &Path, extension: &str) -> PathBuf {
    let stem = file_stem(input);
    if extension.is_empty() {
        output_folder.join(stem)
    } else {
        output_folder.join(format!("{}.{}", stem, extension))
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string())
}

/// Replace `{key}` occurrences using `lookup`.
///
/// Unknown keys and unmatched braces are left as written.
fn expand_placeholders(template: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else {
            out.push_str(&rest[open..]);
            return out;
        };

        let key = &after[..close];
        match lookup(key) {
            Some(value) => out.push_str(&value),
            None => {
                out.push('{');
                out.push_str(key);
                out.push('}');
            }
        }
        rest = &after[close + 1..];
    }

    out.push_str(rest);
    out
}

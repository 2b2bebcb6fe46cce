//! Command-line arguments.
//!
//! ```bash
//! batch-coder add nightly --type encode -i a.txt -i b.txt -o out/ -p level=9
//! batch-coder edit nightly --type encode -i a.txt -o out/
//! batch-coder remove nightly old-job
//! batch-coder list --json
//! batch-coder run
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use coder_core::models::{Job, JobType};

/// Batch Coder - define encode/decode jobs and run them in parallel batches
#[derive(Debug, Parser)]
#[command(name = "batch-coder")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Settings file (created with defaults if missing)
    #[arg(
        long,
        default_value = ".config/settings.toml",
        env = "BATCH_CODER_CONFIG"
    )]
    pub config: PathBuf,

    /// Start with an empty job list if the saved one can't be read
    #[arg(long = "reset-invalid")]
    pub reset_invalid: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Add a new job
    Add(JobArgs),

    /// Replace an existing job with the same name
    Edit(JobArgs),

    /// Remove jobs by name
    Remove {
        /// Names of the jobs to remove
        #[arg(required = true)]
        names: Vec<String>,
    },

    /// List jobs in order
    List {
        /// Print the job list as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run every job: encode and decode groups in parallel
    Run,
}

/// Job definition shared by `add` and `edit`.
#[derive(Debug, Args)]
pub struct JobArgs {
    /// Unique job name
    pub name: String,

    /// Job type: encode or decode
    #[arg(short = 't', long = "type")]
    pub job_type: JobType,

    /// Input file (repeat for several, processed in order)
    #[arg(short = 'i', long = "input")]
    pub inputs: Vec<PathBuf>,

    /// Folder for produced files
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Extra parameter as KEY=VALUE (VALUE is read as JSON when it parses)
    #[arg(short = 'p', long = "param", value_parser = parse_param)]
    pub params: Vec<(String, serde_json::Value)>,
}

impl JobArgs {
    /// Build the job described by the arguments.
    pub fn into_job(self) -> Job {
        let mut job = Job::new(self.name, self.job_type).with_input_files(self.inputs);
        if let Some(output) = self.output {
            job = job.with_output_folder(output);
        }
        for (key, value) in self.params {
            job = job.with_param(key, value);
        }
        job
    }
}

/// Parse `KEY=VALUE`.
///
/// `level=9` gives a number, `fast=true` a boolean, `mode=quick` a string.
fn parse_param(raw: &str) -> Result<(String, serde_json::Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", raw))?;

    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing key in '{}'", raw));
    }

    let value = serde_json::from_str(value)
        .unwrap_or_else(|_| serde_json::Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use serde_json::json;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn params_parse_json_or_text() {
        assert_eq!(parse_param("level=9").unwrap(), ("level".to_string(), json!(9)));
        assert_eq!(parse_param("fast=true").unwrap(), ("fast".to_string(), json!(true)));
        assert_eq!(parse_param("mode=quick").unwrap(), ("mode".to_string(), json!("quick")));
        assert_eq!(parse_param("empty=").unwrap(), ("empty".to_string(), json!("")));
        assert!(parse_param("novalue").is_err());
        assert!(parse_param("=3").is_err());
    }

    #[test]
    fn add_arguments_build_a_job() {
        let cli = Cli::try_parse_from([
            "batch-coder",
            "add",
            "nightly",
            "--type",
            "Encode",
            "-i",
            "a.txt",
            "-i",
            "b.txt",
            "-o",
            "out",
            "-p",
            "level=9",
        ])
        .unwrap();

        let Command::Add(args) = cli.command else {
            panic!("expected add");
        };
        let job = args.into_job();

        assert_eq!(job.name(), "nightly");
        assert_eq!(job.job_type(), JobType::Encode);
        assert_eq!(job.input_files().len(), 2);
        assert_eq!(job.output_folder(), Some(std::path::Path::new("out")));
        assert_eq!(job.param_text("level").as_deref(), Some("9"));
        assert!(!cli.reset_invalid);
    }

    #[test]
    fn global_flags_and_remove() {
        let cli = Cli::try_parse_from([
            "batch-coder",
            "--config",
            "custom.toml",
            "--reset-invalid",
            "remove",
            "a",
            "b",
        ])
        .unwrap();

        assert_eq!(cli.config, PathBuf::from("custom.toml"));
        assert!(cli.reset_invalid);
        assert!(matches!(cli.command, Command::Remove { ref names } if names.len() == 2));
    }

    #[test]
    fn unknown_type_is_rejected() {
        let result = Cli::try_parse_from(["batch-coder", "add", "x", "--type", "transcode"]);
        assert!(result.is_err());
    }
}

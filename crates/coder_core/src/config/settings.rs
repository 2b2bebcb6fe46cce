//! The contents of `settings.toml`.
//!
//! One struct per TOML table. Every field has a serde default, so a file
//! written by an older version (or trimmed by hand) still loads.

use serde::{Deserialize, Serialize};

use crate::logging::LogLevel;
use crate::models::JobType;

/// Everything read from `settings.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub paths: PathSettings,

    #[serde(default)]
    pub logging: LoggingSettings,

    /// Command used for encode jobs.
    #[serde(default = "CodecSettings::encode_default")]
    pub encode: CodecSettings,

    /// Command used for decode jobs.
    #[serde(default = "CodecSettings::decode_default")]
    pub decode: CodecSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            paths: PathSettings::default(),
            logging: LoggingSettings::default(),
            encode: CodecSettings::encode_default(),
            decode: CodecSettings::decode_default(),
        }
    }
}

impl Settings {
    /// Get the command settings for a job group.
    pub fn codec(&self, job_type: JobType) -> &CodecSettings {
        match job_type {
            JobType::Encode => &self.encode,
            JobType::Decode => &self.decode,
        }
    }
}

/// Path configuration for the job snapshot and logs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathSettings {
    /// JSON file holding the persisted job list.
    #[serde(default = "default_jobs_file")]
    pub jobs_file: String,

    /// Where `batch-coder.log` goes when file logging is on.
    #[serde(default = "default_logs_folder")]
    pub logs_folder: String,
}

fn default_jobs_file() -> String {
    ".config/jobs.json".to_string()
}

fn default_logs_folder() -> String {
    ".logs".to_string()
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            jobs_file: default_jobs_file(),
            logs_folder: default_logs_folder(),
        }
    }
}

/// The `[logging]` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Default level when RUST_LOG is not set.
    #[serde(default)]
    pub level: LogLevel,

    /// Also write the application log to the logs folder.
    #[serde(default = "default_log_to_file")]
    pub log_to_file: bool,

    /// Number of recent records kept for display.
    #[serde(default = "default_tail_lines")]
    pub tail_lines: usize,
}

fn default_log_to_file() -> bool {
    true
}

fn default_tail_lines() -> usize {
    200
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            log_to_file: default_log_to_file(),
            tail_lines: default_tail_lines(),
        }
    }
}

/// External command run once per input file of a job.
///
/// Arguments may contain placeholders: `{input}`, `{output}`,
/// `{output_folder}`, `{name}`, `{stem}`, and `{<param>}` for any job
/// parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodecSettings {
    /// Program to execute. Empty means not configured.
    #[serde(default)]
    pub program: String,

    /// Argument template.
    #[serde(default = "default_args")]
    pub args: Vec<String>,

    /// Extension given to produced files.
    #[serde(default)]
    pub output_extension: String,
}

fn default_args() -> Vec<String> {
    vec!["{input}".to_string(), "{output}".to_string()]
}

impl CodecSettings {
    fn encode_default() -> Self {
        Self {
            program: String::new(),
            args: default_args(),
            output_extension: "enc".to_string(),
        }
    }

    fn decode_default() -> Self {
        Self {
            program: String::new(),
            args: default_args(),
            output_extension: "dec".to_string(),
        }
    }

    /// Check a program has been set.
    pub fn is_configured(&self) -> bool {
        !self.program.trim().is_empty()
    }
}

impl Default for CodecSettings {
    fn default() -> Self {
        Self::encode_default()
    }
}

/// A top-level table, the unit of `ConfigManager::update_section`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSection {
    Paths,
    Logging,
    Encode,
    Decode,
}

impl ConfigSection {
    /// All sections, in file order.
    pub const ALL: [ConfigSection; 4] = [
        ConfigSection::Paths,
        ConfigSection::Logging,
        ConfigSection::Encode,
        ConfigSection::Decode,
    ];

    pub fn table_name(&self) -> &'static str {
        match self {
            Self::Paths => "paths",
            Self::Logging => "logging",
            Self::Encode => "encode",
            Self::Decode => "decode",
        }
    }

    /// Comment written above the section in generated files.
    pub fn comment(&self) -> &'static str {
        match self {
            Self::Paths => "Job list and log locations",
            Self::Logging => "Log level and log file",
            Self::Encode => "Command run for each input file of an encode job",
            Self::Decode => "Command run for each input file of a decode job",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_serialize() {
        let settings = Settings::default();
        let toml_str = toml::to_string_pretty(&settings).unwrap();
        assert!(toml_str.contains("[paths]"));
        assert!(toml_str.contains("[logging]"));
        assert!(toml_str.contains("[encode]"));
        assert!(toml_str.contains("[decode]"));
    }

    #[test]
    fn empty_toml_uses_defaults() {
        let settings: Settings = toml::from_str("").unwrap();
        assert_eq!(settings.paths.jobs_file, ".config/jobs.json");
        assert_eq!(settings.decode.output_extension, "dec");
        assert!(!settings.encode.is_configured());
    }

    #[test]
    fn codec_selects_group() {
        let mut settings = Settings::default();
        settings.encode.program = "gzip".to_string();

        assert!(settings.codec(JobType::Encode).is_configured());
        assert!(!settings.codec(JobType::Decode).is_configured());
    }
}

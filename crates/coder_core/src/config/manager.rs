//! Reading and writing `settings.toml`.
//!
//! Whole-file saves regenerate a commented file. Section saves go through
//! `toml_edit` and leave the rest of the file (including hand-written
//! comments) untouched.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use toml_edit::{DocumentMut, Item};

use super::settings::{CodecSettings, ConfigSection, Settings};
use crate::fsutil::write_atomic;
use crate::models::JobType;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to read '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write '{}': {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid settings in '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Could not edit '{}': {source}", path.display())]
    Edit {
        path: PathBuf,
        #[source]
        source: toml_edit::TomlError,
    },

    #[error("Failed to serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// What `load_or_create` found on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigLoad {
    /// No file existed; defaults were written.
    Created,
    /// The file was complete and used as is.
    Loaded,
    /// Sections were missing or unknown; the file was rewritten.
    Repaired,
}

/// Owns the settings file and the settings read from it.
pub struct ConfigManager {
    path: PathBuf,
    settings: Settings,
}

impl ConfigManager {
    /// Create a manager holding default settings.
    ///
    /// Nothing is read until `load` or `load_or_create`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            settings: Settings::default(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// In-memory edits; persist with `save`, `update_section` or `set_codec`.
    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    /// Read settings from an existing file.
    pub fn load(&mut self) -> ConfigResult<()> {
        let content = self.read_existing()?;
        self.settings = self.parse(&content)?;
        Ok(())
    }

    /// Read settings, writing defaults first when the file is missing.
    ///
    /// A file with missing or unknown sections is loaded (missing keys take
    /// their defaults) and then rewritten in full.
    pub fn load_or_create(&mut self) -> ConfigResult<ConfigLoad> {
        if !self.path.exists() {
            self.settings = Settings::default();
            self.save()?;
            return Ok(ConfigLoad::Created);
        }

        let content = self.read_existing()?;
        self.settings = self.parse(&content)?;

        if self.needs_repair(&content)? {
            self.save()?;
            return Ok(ConfigLoad::Repaired);
        }
        Ok(ConfigLoad::Loaded)
    }

    /// Create the logs folder and the folder holding the jobs file.
    pub fn ensure_dirs_exist(&self) -> io::Result<()> {
        fs::create_dir_all(self.logs_folder())?;
        match self.jobs_file().parent() {
            Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent),
            _ => Ok(()),
        }
    }

    pub fn logs_folder(&self) -> PathBuf {
        PathBuf::from(&self.settings.paths.logs_folder)
    }

    pub fn jobs_file(&self) -> PathBuf {
        PathBuf::from(&self.settings.paths.jobs_file)
    }

    /// Regenerate the whole file from the current settings.
    pub fn save(&self) -> ConfigResult<()> {
        let mut out = String::from("# Batch Coder settings\n");
        out.push_str("# Regenerated on full saves; single-section updates keep edits elsewhere.\n");

        for section in ConfigSection::ALL {
            out.push_str(&format!("\n# {}\n[{}]\n", section.comment(), section.table_name()));
            out.push_str(&self.section_body(section)?);
        }

        self.write(&out)
    }

    /// Persist one section, keeping the rest of the file as it is on disk.
    pub fn update_section(&mut self, section: ConfigSection) -> ConfigResult<()> {
        let mut doc = if self.path.exists() {
            let content = self.read_existing()?;
            self.edit_doc(&content)?
        } else {
            DocumentMut::new()
        };

        let fresh = self.edit_doc(&self.section_body(section)?)?;
        doc[section.table_name()] = Item::Table(fresh.as_table().clone());

        self.write(&doc.to_string())
    }

    /// Replace the command for one job group and persist just that section.
    pub fn set_codec(&mut self, job_type: JobType, codec: CodecSettings) -> ConfigResult<()> {
        let section = match job_type {
            JobType::Encode => {
                self.settings.encode = codec;
                ConfigSection::Encode
            }
            JobType::Decode => {
                self.settings.decode = codec;
                ConfigSection::Decode
            }
        };
        self.update_section(section)
    }

    fn section_body(&self, section: ConfigSection) -> ConfigResult<String> {
        let body = match section {
            ConfigSection::Paths => toml::to_string_pretty(&self.settings.paths)?,
            ConfigSection::Logging => toml::to_string_pretty(&self.settings.logging)?,
            ConfigSection::Encode => toml::to_string_pretty(&self.settings.encode)?,
            ConfigSection::Decode => toml::to_string_pretty(&self.settings.decode)?,
        };
        Ok(body)
    }

    fn needs_repair(&self, content: &str) -> ConfigResult<bool> {
        let doc = self.edit_doc(content)?;
        let known = |key: &str| ConfigSection::ALL.iter().any(|s| s.table_name() == key);

        let unknown = doc.iter().any(|(key, _)| !known(key));
        let missing = ConfigSection::ALL
            .iter()
            .any(|s| !doc.contains_key(s.table_name()));
        Ok(unknown || missing)
    }

    fn read_existing(&self) -> ConfigResult<String> {
        match fs::read_to_string(&self.path) {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(ConfigError::NotFound(self.path.clone()))
            }
            Err(source) => Err(ConfigError::Read {
                path: self.path.clone(),
                source,
            }),
        }
    }

    fn parse(&self, content: &str) -> ConfigResult<Settings> {
        toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    fn edit_doc(&self, content: &str) -> ConfigResult<DocumentMut> {
        content.parse().map_err(|source| ConfigError::Edit {
            path: self.path.clone(),
            source,
        })
    }

    fn write(&self, content: &str) -> ConfigResult<()> {
        write_atomic(&self.path, content.as_bytes()).map_err(|source| ConfigError::Write {
            path: self.path.clone(),
            source,
        })
    }
}

//! Settings for Batch Coder.
//!
//! One TOML file with four tables: `[paths]`, `[logging]`, `[encode]` and
//! `[decode]`. Missing keys take defaults; full saves are atomic and
//! single-section saves keep the rest of the file untouched.
//!
//! ```no_run
//! use coder_core::config::{CodecSettings, ConfigManager};
//! use coder_core::models::JobType;
//!
//! let mut config = ConfigManager::new(".config/settings.toml");
//! config.load_or_create()?;
//!
//! config.set_codec(
//!     JobType::Encode,
//!     CodecSettings {
//!         program: "gzip".to_string(),
//!         args: vec!["-c".to_string(), "{input}".to_string()],
//!         output_extension: "gz".to_string(),
//!     },
//! )?;
//! # Ok::<(), coder_core::config::ConfigError>(())
//! ```

mod manager;
mod settings;

pub use manager::{ConfigError, ConfigLoad, ConfigManager, ConfigResult};
pub use settings::{CodecSettings, ConfigSection, LoggingSettings, PathSettings, Settings};

//! Configuration file support.
//!
//! Settings come from TOML files; anything left unset falls back to the CLI
//! flags or the built-in defaults.

use crate::error::{PrepError, PrepResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Prep configuration. Every field is optional so files can be layered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrepConfig {
    /// Root of the asset store
    #[serde(default)]
    pub data_path: Option<PathBuf>,

    /// Directory holding the fetch stage output (`fetch.json`)
    #[serde(default)]
    pub output_path: Option<PathBuf>,

    /// Directory receiving the container
    #[serde(default)]
    pub target_output: Option<PathBuf>,

    /// Edge length of the resized square images
    #[serde(default)]
    pub image_size: Option<u32>,

    /// Rows encoded concurrently (1 = sequential)
    #[serde(default)]
    pub jobs: Option<usize>,

    /// Log level
    #[serde(default)]
    pub log_level: Option<String>,
}

impl PrepConfig {
    /// Load configuration from a TOML file.
    pub fn load_from_file(path: &Path) -> PrepResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| PrepError::Config(format!("{}: {}", path.display(), e)))?;

        let config: Self =
            toml::from_str(&content).map_err(|e| PrepError::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Get default global configuration file path.
    pub fn default_global_path() -> PathBuf {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(".imgprep")
            .join("config.toml")
    }

    /// Get default local configuration file path.
    pub fn default_local_path() -> PathBuf {
        PathBuf::from(".imgpreprc")
    }

    /// Discover and load configuration files.
    ///
    /// Loads `~/.imgprep/config.toml`, then `./.imgpreprc`. Local config
    /// overrides global config. Missing or invalid files are ignored.
    pub fn discover_and_load() -> Self {
        let mut config = Self::default();

        for path in [Self::default_global_path(), Self::default_local_path()] {
            if let Ok(found) = Self::load_from_file(&path) {
                config.merge(&found);
            }
        }

        config
    }

    /// Merge another configuration into this one.
    ///
    /// Values from `other` override values in `self` if they are Some.
    pub fn merge(&mut self, other: &Self) {
        if let Some(ref data_path) = other.data_path {
            self.data_path = Some(data_path.clone());
        }
        if let Some(ref output_path) = other.output_path {
            self.output_path = Some(output_path.clone());
        }
        if let Some(ref target_output) = other.target_output {
            self.target_output = Some(target_output.clone());
        }
        if let Some(image_size) = other.image_size {
            self.image_size = Some(image_size);
        }
        if let Some(jobs) = other.jobs {
            self.jobs = Some(jobs);
        }
        if let Some(ref log_level) = other.log_level {
            self.log_level = Some(log_level.clone());
        }
    }

    pub fn validate(&self) -> PrepResult<()> {
        if self.image_size == Some(0) {
            return Err(PrepError::Config("image_size must be >= 1".to_string()));
        }
        if self.jobs == Some(0) {
            return Err(PrepError::Config("jobs must be >= 1".to_string()));
        }
        Ok(())
    }
}

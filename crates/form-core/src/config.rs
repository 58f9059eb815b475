//! Configuration
//!
//! [`FormwrightConfig`] collects the tunables of the editor runtime. It can
//! be built in code with `with_*` builders or loaded from a TOML or YAML
//! file, chosen by extension. Missing keys take their defaults.

use form_persistence::{AutoSaveConfig, SubmissionFeed};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Runtime configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormwrightConfig {
    /// Persistence pipeline timing
    pub autosave: AutoSaveConfig,
    /// Events buffered per submission feed subscriber
    pub feed_capacity: usize,
    /// Default `EnvFilter` directive (overridden by `RUST_LOG`)
    pub log_filter: String,
    /// Emit JSON log lines
    pub log_json: bool,
}

impl FormwrightConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With pipeline timing
    #[inline]
    #[must_use]
    pub fn with_autosave(mut self, autosave: AutoSaveConfig) -> Self {
        self.autosave = autosave;
        self
    }

    /// With feed buffer size
    #[inline]
    #[must_use]
    pub fn with_feed_capacity(mut self, capacity: usize) -> Self {
        self.feed_capacity = capacity;
        self
    }

    /// With log filter directive
    #[inline]
    #[must_use]
    pub fn with_log_filter(mut self, filter: impl Into<String>) -> Self {
        self.log_filter = filter.into();
        self
    }

    /// With JSON log output
    #[inline]
    #[must_use]
    pub fn with_log_json(mut self, json: bool) -> Self {
        self.log_json = json;
        self
    }

    /// Open a submission feed with the configured buffer size
    #[must_use]
    pub fn connect_feed(&self) -> SubmissionFeed {
        SubmissionFeed::connect(self.feed_capacity)
    }

    /// Parse TOML text
    ///
    /// # Errors
    /// `InvalidToml` on syntax or type errors
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Parse YAML text
    ///
    /// # Errors
    /// `InvalidYaml` on syntax or type errors
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Load from a `.toml`, `.yaml` or `.yml` file
    ///
    /// # Errors
    /// `Io` if the file cannot be read, `UnsupportedFormat` for any other
    /// extension, or a parse error
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        let parse: fn(&str) -> Result<Self, ConfigError> = match extension.as_deref() {
            Some("toml") => Self::from_toml_str,
            Some("yaml" | "yml") => Self::from_yaml_str,
            _ => return Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
        };

        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = parse(&text)?;
        tracing::debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }
}

impl Default for FormwrightConfig {
    fn default() -> Self {
        Self {
            autosave: AutoSaveConfig::default(),
            feed_capacity: 256,
            log_filter: "info".to_string(),
            log_json: false,
        }
    }
}

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid TOML: {0}")]
    InvalidToml(#[from] toml::de::Error),

    #[error("invalid YAML: {0}")]
    InvalidYaml(#[from] serde_yaml::Error),

    #[error("unsupported config format: {} (expected .toml, .yaml or .yml)", .0.display())]
    UnsupportedFormat(PathBuf),
}

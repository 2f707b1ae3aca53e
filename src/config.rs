use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::triage::{DEFAULT_CLASSIFIER_TIMEOUT, DEFAULT_OLLAMA_URL, DEFAULT_TRIAGE_MODEL};

/// Application-level constants
pub const APP_NAME: &str = "Meditel";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

const ENV_USE_AI: &str = "MEDITEL_USE_AI";
const ENV_OLLAMA_URL: &str = "MEDITEL_OLLAMA_URL";
const ENV_OLLAMA_MODEL: &str = "MEDITEL_OLLAMA_MODEL";
const ENV_CLASSIFIER_TIMEOUT: &str = "MEDITEL_CLASSIFIER_TIMEOUT_SECS";

/// Tracing filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "meditel=info,warn"
}

/// Get the application data directory (`~/Meditel/`), if a home directory exists.
pub fn app_data_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(APP_NAME))
}

/// Default config file location (`~/Meditel/config.json`).
pub fn default_config_path() -> Option<PathBuf> {
    app_data_dir().map(|dir| dir.join("config.json"))
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

/// Scheduler configuration. Missing fields in a config file take defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Consult the Ollama classifier before the keyword rules.
    pub use_ai: bool,
    pub ollama_url: String,
    pub ollama_model: String,
    /// Upper bound on a single classifier call. Must be > 0.
    pub classifier_timeout_secs: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            use_ai: true,
            ollama_url: DEFAULT_OLLAMA_URL.to_string(),
            ollama_model: DEFAULT_TRIAGE_MODEL.to_string(),
            classifier_timeout_secs: DEFAULT_CLASSIFIER_TIMEOUT.as_secs(),
        }
    }
}

impl SchedulerConfig {
    /// Read a JSON config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults, then the file at `path` if it exists, then environment overrides.
    pub fn resolve(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::resolve_with(path, |key| std::env::var(key).ok())
    }

    /// `resolve` with overrides read through `lookup` instead of the environment.
    pub fn resolve_with<F>(path: Option<&Path>, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match path {
            Some(p) if p.exists() => Self::load(p)?,
            _ => Self::default(),
        };
        config.apply_overrides(lookup)?;
        tracing::debug!(?config, "scheduler config resolved");
        Ok(config)
    }

    /// `resolve` against `~/Meditel/config.json`.
    pub fn from_default_location() -> Result<Self, ConfigError> {
        Self::resolve(default_config_path().as_deref())
    }

    /// Apply `MEDITEL_*` overrides read through `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(ENV_USE_AI) {
            self.use_ai = parse_bool(ENV_USE_AI, &value)?;
        }
        if let Some(value) = lookup(ENV_OLLAMA_URL) {
            self.ollama_url = value;
        }
        if let Some(value) = lookup(ENV_OLLAMA_MODEL) {
            self.ollama_model = value;
        }
        if let Some(value) = lookup(ENV_CLASSIFIER_TIMEOUT) {
            self.classifier_timeout_secs =
                value.trim().parse().map_err(|_| ConfigError::InvalidValue {
                    key: ENV_CLASSIFIER_TIMEOUT.into(),
                    value: value.clone(),
                })?;
        }
        self.validate()
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.classifier_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "classifier_timeout_secs".into(),
                value: "0".into(),
            });
        }
        Ok(())
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.into(),
            value: value.into(),
        }),
    }
}

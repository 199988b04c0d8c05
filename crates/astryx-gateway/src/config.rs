//! Configuration loading and typed config structures for the gateway.
//!
//! The configuration lives in a YAML file (`astryx-config.yaml` by
//! default, or the path in `ASTRYX_CONFIG`). Every section and field has
//! a default, so an empty or missing file yields a working gateway.

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use astryx_observer::{GuardPolicy, ServerConfig};
use serde::Deserialize;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A value parsed but is out of range.
    #[error("invalid config value for {field}: {message}")]
    Invalid {
        /// Dotted path of the offending field.
        field: &'static str,
        /// What is wrong with it.
        message: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level gateway configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct GatewayConfig {
    /// Listen address.
    #[serde(default)]
    pub server: ServerConfig,

    /// History retention and startup replay.
    #[serde(default)]
    pub history: HistoryConfig,

    /// Live viewer fan-out.
    #[serde(default)]
    pub hub: HubConfig,

    /// Trait guard thresholds.
    #[serde(default)]
    pub guard: GuardPolicy,

    /// Log level and output format.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl GatewayConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values:
    /// - `ASTRYX_HOST` overrides `server.host`
    /// - `ASTRYX_PORT` overrides `server.port`
    /// - `ASTRYX_LOG_PATH` overrides `history.replay_path`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string, then apply environment
    /// overrides and validate.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        // serde_yml rejects an empty document; treat it as all defaults.
        let mut config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yml::from_str(yaml)?
        };
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `ASTRYX_*` environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if `ASTRYX_PORT` is not a port
    /// number.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(val) = std::env::var("ASTRYX_HOST") {
            self.server.host = val;
        }
        if let Ok(val) = std::env::var("ASTRYX_PORT") {
            self.server.port = val.parse().map_err(|e| ConfigError::Invalid {
                field: "server.port",
                message: format!("ASTRYX_PORT={val}: {e}"),
            })?;
        }
        if let Ok(val) = std::env::var("ASTRYX_LOG_PATH") {
            self.history.replay_path = PathBuf::from(val);
        }
        Ok(())
    }

    /// Check ranges serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for the first out-of-range value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.hub.connection_buffer == 0 {
            return Err(ConfigError::Invalid {
                field: "hub.connection_buffer",
                message: "must be at least 1".to_owned(),
            });
        }
        for bound in &self.guard.traits {
            if let (Some(min), Some(max)) = (bound.min, bound.max)
                && min > max
            {
                return Err(ConfigError::Invalid {
                    field: "guard.traits",
                    message: format!("{}: min {min} exceeds max {max}", bound.name),
                });
            }
        }
        Ok(())
    }
}

/// History retention and startup replay.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HistoryConfig {
    /// Maximum snapshots kept in memory (`null` for unbounded). Zero is
    /// rejected at parse time.
    #[serde(default)]
    pub retention: Option<NonZeroUsize>,

    /// JSONL log written by the agent.
    #[serde(default = "default_replay_path")]
    pub replay_path: PathBuf,

    /// Whether to rebuild history from the log at startup.
    #[serde(default = "default_true")]
    pub replay_on_start: bool,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            retention: None,
            replay_path: default_replay_path(),
            replay_on_start: true,
        }
    }
}

/// Live viewer fan-out.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HubConfig {
    /// Frames queued per viewer before further frames are dropped for it.
    #[serde(default = "default_connection_buffer")]
    pub connection_buffer: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            connection_buffer: default_connection_buffer(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive (trace, debug, info, warn, error, or a
    /// full `EnvFilter` string). `RUST_LOG` takes precedence.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

fn default_replay_path() -> PathBuf {
    PathBuf::from("astrx_log.jsonl")
}

const fn default_true() -> bool {
    true
}

const fn default_connection_buffer() -> usize {
    astryx_observer::hub::DEFAULT_CONNECTION_BUFFER
}

fn default_log_level() -> String {
    String::from("info")
}

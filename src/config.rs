//! Engine configuration
//!
//! Loaded from a YAML file; every field has a default:
//!
//! ```yaml
//! timeout: 15s
//! interval: 300ms
//! run_timeout: 5m
//! cleanup_reserve: 10s
//! output_dir: out
//! device_mode: tablet
//!
//! backend:
//!   program: node
//!   args: [backend/server.js]
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::engine::poll::{PollOptions, DEFAULT_INTERVAL, DEFAULT_TIMEOUT};
use crate::handler::DeviceMode;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error in {file}: {error}")]
    Yaml {
        file: String,
        error: serde_yaml::Error,
    },

    #[error("Invalid duration format: {0}")]
    InvalidDuration(String),
}

/// External accessibility backend spoken to over JSON-RPC
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendConfig {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Default timeout of waiting UI operations
    #[serde(with = "duration_format")]
    pub timeout: Duration,

    /// Default polling interval
    #[serde(with = "duration_format")]
    pub interval: Duration,

    /// Upper bound on a whole top-level run
    #[serde(with = "duration_format")]
    pub run_timeout: Duration,

    /// Time kept back from the run for cleanup and the failure dump
    #[serde(with = "duration_format")]
    pub cleanup_reserve: Duration,

    /// Failure dumps go to `<output_dir>/<run name>-<timestamp>/`
    pub output_dir: Option<PathBuf>,

    pub device_mode: DeviceMode,

    pub backend: Option<BackendConfig>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            interval: DEFAULT_INTERVAL,
            run_timeout: Duration::from_secs(5 * 60),
            cleanup_reserve: Duration::from_secs(10),
            output_dir: Some(PathBuf::from("out")),
            device_mode: DeviceMode::default(),
            backend: None,
        }
    }
}

impl EngineConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        serde_yaml::from_str(&content).map_err(|e| ConfigError::Yaml {
            file: path.display().to_string(),
            error: e,
        })
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(yaml).map_err(|e| ConfigError::Yaml {
            file: "<string>".to_string(),
            error: e,
        })
    }

    pub fn poll_options(&self) -> PollOptions {
        PollOptions::new(self.timeout, self.interval)
    }
}

/// Parse a duration such as `"1h30m"`, `"500ms"`, `"1.5s"` or `"2d"`.
/// A bare number is read as seconds.
pub fn parse_duration(s: &str) -> Result<Duration, ConfigError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(ConfigError::InvalidDuration("empty string".to_string()));
    }
    if let Ok(secs) = s.parse::<f64>() {
        return seconds(secs, s);
    }

    let mut total = 0.0;
    let mut chars = s.chars().peekable();
    while chars.peek().is_some() {
        let mut number = String::new();
        while let Some(c) = chars.next_if(|c| c.is_ascii_digit() || *c == '.') {
            number.push(c);
        }
        let mut unit = String::new();
        while let Some(c) = chars.next_if(|c| c.is_ascii_alphabetic()) {
            unit.push(c);
        }
        if number.is_empty() {
            return Err(ConfigError::InvalidDuration(format!(
                "expected number in '{}'",
                s
            )));
        }
        let num: f64 = number
            .parse()
            .map_err(|_| ConfigError::InvalidDuration(format!("invalid number: {}", number)))?;

        total += match unit.as_str() {
            "d" => num * 86_400.0,
            "h" => num * 3_600.0,
            "m" => num * 60.0,
            "s" => num,
            "ms" => num / 1_000.0,
            "" => {
                return Err(ConfigError::InvalidDuration(format!(
                    "missing unit after '{}'",
                    number
                )))
            }
            other => {
                return Err(ConfigError::InvalidDuration(format!(
                    "unknown unit '{}'",
                    other
                )))
            }
        };
    }
    seconds(total, s)
}

fn seconds(secs: f64, input: &str) -> Result<Duration, ConfigError> {
    Duration::try_from_secs_f64(secs)
        .map_err(|_| ConfigError::InvalidDuration(input.to_string()))
}

/// Human form used when writing durations back out: `"300ms"`, `"15s"`
pub fn format_duration(d: Duration) -> String {
    let millis = d.as_millis();
    if millis % 1000 == 0 {
        format!("{}s", millis / 1000)
    } else {
        format!("{}ms", millis)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DurationInput {
    Seconds(f64),
    Text(String),
}

impl DurationInput {
    fn into_duration(self) -> Result<Duration, ConfigError> {
        match self {
            DurationInput::Seconds(secs) => seconds(secs, &secs.to_string()),
            DurationInput::Text(s) => parse_duration(&s),
        }
    }
}

/// Serde adapter for `Duration` fields written as `"300ms"`, `"2s"` or a number of seconds
pub mod duration_format {
    use super::*;

    pub fn serialize<S: serde::Serializer>(d: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_duration(*d))
    }

    pub fn deserialize<'de, D: serde::Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        DurationInput::deserialize(deserializer)?
            .into_duration()
            .map_err(serde::de::Error::custom)
    }
}

/// Like [`duration_format`] for optional fields
pub mod opt_duration_format {
    use super::*;

    pub fn serialize<S: serde::Serializer>(d: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error> {
        match d {
            Some(d) => serializer.serialize_some(&format_duration(*d)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: serde::Deserializer<'de>>(deserializer: D) -> Result<Option<Duration>, D::Error> {
        Option::<DurationInput>::deserialize(deserializer)?
            .map(DurationInput::into_duration)
            .transpose()
            .map_err(serde::de::Error::custom)
    }
}

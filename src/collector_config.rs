//! Configuration for the NSD collector.
//!
//! The host agent decodes this structure from user configuration and hands it
//! to [`crate::Collector::new`]. It is treated as immutable after `init`.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::CollectError;

/// Default polling interval in seconds.
pub const DEFAULT_UPDATE_EVERY: u64 = 10;
/// Default nsd-control timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);
/// Default control binary, looked up on PATH.
pub const DEFAULT_BINARY: &str = "nsd-control";

/// Collector settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectorConfig {
    /// Polling interval in seconds.
    #[serde(default = "default_update_every")]
    pub update_every: u64,

    /// Upper bound for a single nsd-control run. Accepts seconds as a number
    /// or a string with `ms`, `s` or `m` suffix.
    #[serde(
        default = "default_timeout",
        serialize_with = "serialize_duration",
        deserialize_with = "deserialize_duration"
    )]
    pub timeout: Duration,

    /// nsd-control binary name or path.
    #[serde(default = "default_binary")]
    pub binary: PathBuf,

    /// nsd.conf passed with `-c`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_file: Option<PathBuf>,

    /// Remote server passed with `-s` (`host[@port]`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server: Option<String>,
}

fn default_update_every() -> u64 {
    DEFAULT_UPDATE_EVERY
}
fn default_timeout() -> Duration {
    DEFAULT_TIMEOUT
}
fn default_binary() -> PathBuf {
    PathBuf::from(DEFAULT_BINARY)
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            update_every: default_update_every(),
            timeout: default_timeout(),
            binary: default_binary(),
            config_file: None,
            server: None,
        }
    }
}

impl CollectorConfig {
    /// Checks the invariants the collector relies on.
    pub fn validate(&self) -> Result<(), CollectError> {
        if self.update_every == 0 {
            return Err(CollectError::Config(
                "update_every must be greater than 0".into(),
            ));
        }
        if self.timeout.is_zero() {
            return Err(CollectError::Config(
                "timeout must be greater than 0".into(),
            ));
        }
        if self.binary.as_os_str().is_empty() {
            return Err(CollectError::Config("binary must not be empty".into()));
        }
        if let Some(server) = &self.server {
            if server.trim().is_empty() {
                return Err(CollectError::Config("server must not be empty".into()));
            }
        }
        Ok(())
    }

    /// Arguments passed to nsd-control, ending with the stats subcommand.
    pub fn command_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if let Some(file) = &self.config_file {
            args.push("-c".to_string());
            args.push(file.to_string_lossy().into_owned());
        }
        if let Some(server) = &self.server {
            args.push("-s".to_string());
            args.push(server.clone());
        }
        args.push("stats_noreset".to_string());
        args
    }
}

/// Parses `2`, `0.5`, `"2s"`, `"500ms"` or `"1m"` into a duration.
pub fn parse_duration(input: &str) -> Result<Duration, String> {
    let s = input.trim();
    // (number, multiplier, divisor) to seconds
    let (number, mul, div) = if let Some(v) = s.strip_suffix("ms") {
        (v, 1.0, 1000.0)
    } else if let Some(v) = s.strip_suffix('s') {
        (v, 1.0, 1.0)
    } else if let Some(v) = s.strip_suffix('m') {
        (v, 60.0, 1.0)
    } else {
        (s, 1.0, 1.0)
    };

    let value: f64 = number
        .trim()
        .parse()
        .map_err(|_| format!("invalid duration '{}'", input))?;
    if !value.is_finite() || value < 0.0 {
        return Err(format!("invalid duration '{}'", input));
    }
    Duration::try_from_secs_f64(value * mul / div)
        .map_err(|e| format!("invalid duration '{}': {}", input, e))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawDuration {
    Seconds(f64),
    Text(String),
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    match RawDuration::deserialize(deserializer)? {
        RawDuration::Seconds(secs) => Duration::try_from_secs_f64(secs)
            .map_err(|e| serde::de::Error::custom(format!("invalid duration {}: {}", secs, e))),
        RawDuration::Text(text) => parse_duration(&text).map_err(serde::de::Error::custom),
    }
}

fn serialize_duration<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_f64(duration.as_secs_f64())
}

//! Plugin configuration parsing.
//!
//! The autoscaler host hands every plugin a flat `map<string, string>`.
//! This module turns that map into typed settings with defaults, and
//! owns the key names recognized by the Senlin target.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// OpenStack region the Senlin endpoint lives in.
pub const CONFIG_KEY_REGION: &str = "os_region";
/// Name of the Senlin cluster to scale.
pub const CONFIG_KEY_CLUSTER_NAME: &str = "os_senlin_cluster_name";
/// Wait between polls of an in-progress Senlin action.
pub const CONFIG_KEY_RETRY_INTERVAL: &str = "retry_interval";
/// Maximum number of polls of an in-progress Senlin action.
pub const CONFIG_KEY_RETRY_ATTEMPTS: &str = "retry_attempts";
/// `constant` or `exponential`.
pub const CONFIG_KEY_RETRY_BACKOFF: &str = "retry_backoff";
/// Upper bound for exponential backoff.
pub const CONFIG_KEY_RETRY_MAX_INTERVAL: &str = "retry_max_interval";

pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(10);
pub const DEFAULT_RETRY_ATTEMPTS: u32 = 15;
pub const DEFAULT_RETRY_MAX_INTERVAL: Duration = Duration::from_secs(120);

/// How the wait between retry attempts evolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Backoff {
    /// Always wait the base interval.
    #[default]
    Constant,
    /// Double the wait after each failed attempt, capped at `max`.
    Exponential { max: Duration },
}

/// Interval and attempt bound for a retry loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
    #[serde(default)]
    pub backoff: Backoff,
}

impl RetryPolicy {
    pub fn constant(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts: max_attempts.max(1),
            backoff: Backoff::Constant,
        }
    }

    pub fn exponential(interval: Duration, max_attempts: u32, max: Duration) -> Self {
        Self {
            interval,
            max_attempts: max_attempts.max(1),
            backoff: Backoff::Exponential { max },
        }
    }

    /// Wait before the next attempt, given how many attempts have failed (≥1).
    pub fn delay(&self, failed_attempts: u32) -> Duration {
        match self.backoff {
            Backoff::Constant => self.interval,
            Backoff::Exponential { max } => {
                let shift = failed_attempts.saturating_sub(1).min(31);
                self.interval
                    .checked_mul(1u32 << shift)
                    .unwrap_or(max)
                    .min(max)
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::constant(DEFAULT_RETRY_INTERVAL, DEFAULT_RETRY_ATTEMPTS)
    }
}

/// Settings fixed at `set_config` time for the lifetime of a target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetConfig {
    pub region: String,
    pub retry: RetryPolicy,
    /// The full raw map, kept for collaborators with their own keys.
    pub raw: HashMap<String, String>,
}

impl TargetConfig {
    pub fn from_map(config: &HashMap<String, String>) -> ConfigResult<Self> {
        let region = required(config, CONFIG_KEY_REGION)?.to_string();

        let interval = optional_duration(config, CONFIG_KEY_RETRY_INTERVAL)?
            .unwrap_or(DEFAULT_RETRY_INTERVAL);
        let attempts = match config.get(CONFIG_KEY_RETRY_ATTEMPTS) {
            Some(raw) => match raw.trim().parse::<u32>() {
                Ok(n) if n >= 1 => n,
                _ => {
                    return Err(ConfigError::invalid(
                        CONFIG_KEY_RETRY_ATTEMPTS,
                        raw,
                        "must be an integer >= 1",
                    ));
                }
            },
            None => DEFAULT_RETRY_ATTEMPTS,
        };

        let retry = match config.get(CONFIG_KEY_RETRY_BACKOFF).map(|s| s.trim()) {
            None | Some("") | Some("constant") => RetryPolicy::constant(interval, attempts),
            Some("exponential") => {
                let max = optional_duration(config, CONFIG_KEY_RETRY_MAX_INTERVAL)?
                    .unwrap_or(DEFAULT_RETRY_MAX_INTERVAL);
                RetryPolicy::exponential(interval, attempts, max)
            }
            Some(other) => {
                return Err(ConfigError::invalid(
                    CONFIG_KEY_RETRY_BACKOFF,
                    other,
                    "expected \"constant\" or \"exponential\"",
                ));
            }
        };

        Ok(Self {
            region,
            retry,
            raw: config.clone(),
        })
    }
}

/// Look up a required key; absent or blank values are an error.
pub fn required<'a>(config: &'a HashMap<String, String>, key: &str) -> ConfigResult<&'a str> {
    match config.get(key) {
        Some(v) if !v.trim().is_empty() => Ok(v.as_str()),
        _ => Err(ConfigError::MissingKey(key.to_string())),
    }
}

/// Parse an optional duration-valued key.
pub fn optional_duration(
    config: &HashMap<String, String>,
    key: &str,
) -> ConfigResult<Option<Duration>> {
    match config.get(key) {
        Some(raw) => parse_duration(raw)
            .map(Some)
            .ok_or_else(|| ConfigError::invalid(key, raw, "expected a duration like 10s, 500ms, 2m")),
        None => Ok(None),
    }
}

/// Parse an optional boolean-valued key.
pub fn optional_bool(config: &HashMap<String, String>, key: &str) -> ConfigResult<Option<bool>> {
    match config.get(key).map(|s| s.trim()) {
        None => Ok(None),
        Some("true") | Some("1") => Ok(Some(true)),
        Some("false") | Some("0") => Ok(Some(false)),
        Some(other) => Err(ConfigError::invalid(key, other, "expected true or false")),
    }
}

/// Parse a duration string like "5s", "500ms", "2m", "1h" or bare seconds.
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if let Some(secs) = s.strip_suffix('s') {
        if let Some(ms) = secs.strip_suffix('m') {
            ms.parse::<u64>().ok().map(Duration::from_millis)
        } else {
            secs.parse::<u64>().ok().map(Duration::from_secs)
        }
    } else if let Some(mins) = s.strip_suffix('m') {
        mins.parse::<u64>()
            .ok()
            .and_then(|m| m.checked_mul(60))
            .map(Duration::from_secs)
    } else if let Some(hours) = s.strip_suffix('h') {
        hours.parse::<u64>()
            .ok()
            .and_then(|h| h.checked_mul(3600))
            .map(Duration::from_secs)
    } else {
        s.parse::<u64>().ok().map(Duration::from_secs)
    }
}

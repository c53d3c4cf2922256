//! Per-call scale-in settings read from the policy's target config.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use senlin_core::ConfigError;
use senlin_core::config::{optional_bool, optional_duration};

pub const CONFIG_KEY_NODE_CLASS: &str = "node_class";
pub const CONFIG_KEY_DATACENTER: &str = "datacenter";
pub const CONFIG_KEY_SELECTOR_STRATEGY: &str = "node_selector_strategy";
pub const CONFIG_KEY_DRAIN_DEADLINE: &str = "node_drain_deadline";
pub const CONFIG_KEY_DRAIN_IGNORE_SYSTEM_JOBS: &str = "node_drain_ignore_system_jobs";
pub const CONFIG_KEY_PURGE: &str = "node_purge";

pub const DEFAULT_DRAIN_DEADLINE: Duration = Duration::from_secs(15 * 60);

/// Order in which candidate nodes are picked for removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectorStrategy {
    /// Fewest running allocations first.
    #[default]
    LeastBusy,
    /// Most recently registered nodes first.
    NewestCreateIndex,
    /// Only nodes with no running allocations.
    Empty,
    /// Only nodes whose running allocations all belong to system jobs.
    EmptyIgnoreSystem,
}

impl FromStr for SelectorStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "least_busy" => Ok(Self::LeastBusy),
            "newest_create_index" => Ok(Self::NewestCreateIndex),
            "empty" => Ok(Self::Empty),
            "empty_ignore_system" => Ok(Self::EmptyIgnoreSystem),
            other => Err(format!("unknown node selector strategy {other:?}")),
        }
    }
}

impl fmt::Display for SelectorStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::LeastBusy => "least_busy",
            Self::NewestCreateIndex => "newest_create_index",
            Self::Empty => "empty",
            Self::EmptyIgnoreSystem => "empty_ignore_system",
        })
    }
}

/// Scale-in settings for one scaling call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScaleInConfig {
    pub node_class: Option<String>,
    pub datacenter: Option<String>,
    pub strategy: SelectorStrategy,
    pub drain_deadline: Duration,
    pub ignore_system_jobs: bool,
    pub purge: bool,
}

impl ScaleInConfig {
    /// Parse from the target config map.
    ///
    /// At least one of `node_class` or `datacenter` must be set; together
    /// they identify which nodes make up the cluster's pool.
    pub fn from_map(config: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let non_empty = |key: &str| {
            config
                .get(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let node_class = non_empty(CONFIG_KEY_NODE_CLASS);
        let datacenter = non_empty(CONFIG_KEY_DATACENTER);
        if node_class.is_none() && datacenter.is_none() {
            return Err(ConfigError::MissingKey(format!(
                "{CONFIG_KEY_NODE_CLASS} or {CONFIG_KEY_DATACENTER}"
            )));
        }

        let strategy = match config.get(CONFIG_KEY_SELECTOR_STRATEGY) {
            Some(raw) => raw
                .parse()
                .map_err(|reason: String| ConfigError::invalid(CONFIG_KEY_SELECTOR_STRATEGY, raw, reason))?,
            None => SelectorStrategy::default(),
        };

        Ok(Self {
            node_class,
            datacenter,
            strategy,
            drain_deadline: optional_duration(config, CONFIG_KEY_DRAIN_DEADLINE)?
                .unwrap_or(DEFAULT_DRAIN_DEADLINE),
            ignore_system_jobs: optional_bool(config, CONFIG_KEY_DRAIN_IGNORE_SYSTEM_JOBS)?
                .unwrap_or(false),
            purge: optional_bool(config, CONFIG_KEY_PURGE)?.unwrap_or(false),
        })
    }

    /// Human-readable pool identifier for log messages.
    pub fn pool_id(&self) -> String {
        match (&self.node_class, &self.datacenter) {
            (Some(class), Some(dc)) => format!("class={class} datacenter={dc}"),
            (Some(class), None) => format!("class={class}"),
            (None, Some(dc)) => format!("datacenter={dc}"),
            (None, None) => "<none>".to_string(),
        }
    }
}

//! Domain types shared by the Senlin target crates.
//!
//! These types describe the strategy's scaling request, the point-in-time
//! cluster snapshot read from Senlin, and the normalized status reported
//! back to the autoscaler. All types are serializable to/from JSON.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Identifier of an asynchronous Senlin action.
pub type ActionId = String;

/// Identifier of a node as known to the autoscaler.
pub type NodeId = String;

/// `ScalingAction::count` value meaning "evaluate, but do not mutate".
pub const DRY_RUN_COUNT: i64 = -1;

/// Unique name of this plugin amongst target plugins.
pub const PLUGIN_NAME: &str = "openstack-senlin";

// ── Scaling request ───────────────────────────────────────────────

/// Desired cluster size produced by a scaling strategy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ScalingAction {
    /// Desired number of cluster members, or [`DRY_RUN_COUNT`].
    pub count: i64,
    /// Human-readable reason supplied by the strategy.
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub meta: HashMap<String, String>,
}

impl ScalingAction {
    pub fn new(count: i64) -> Self {
        Self {
            count,
            ..Default::default()
        }
    }

    pub fn dry_run() -> Self {
        Self::new(DRY_RUN_COUNT)
    }

    pub fn is_dry_run(&self) -> bool {
        self.count == DRY_RUN_COUNT
    }
}

// ── Cluster ───────────────────────────────────────────────────────

/// Point-in-time snapshot of a Senlin cluster.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClusterState {
    pub id: String,
    pub name: String,
    pub desired_capacity: u32,
    /// Raw Senlin status, e.g. "ACTIVE", "RESIZING", "WARNING".
    pub status: String,
}

/// Lifecycle status of an asynchronous Senlin action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionStatus {
    Init,
    Waiting,
    Ready,
    Running,
    Suspended,
    Succeeded,
    Failed,
    Cancelled,
}

impl ActionStatus {
    /// Whether the action will not change status again.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Cancelled)
    }
}

impl std::fmt::Display for ActionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Init => "INIT",
            Self::Waiting => "WAITING",
            Self::Ready => "READY",
            Self::Running => "RUNNING",
            Self::Suspended => "SUSPENDED",
            Self::Succeeded => "SUCCEEDED",
            Self::Failed => "FAILED",
            Self::Cancelled => "CANCELLED",
        };
        f.write_str(s)
    }
}

/// An action record as returned by the action lookup call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ActionState {
    pub id: ActionId,
    pub status: ActionStatus,
    #[serde(default)]
    pub status_reason: String,
}

// ── Nodes ─────────────────────────────────────────────────────────

/// Pairs an autoscaler node with the Senlin member that backs it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NodeResourceId {
    pub node_id: NodeId,
    pub remote_resource_id: String,
}

// ── Status ────────────────────────────────────────────────────────

/// Normalized target status reported to the autoscaler.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TargetStatus {
    pub ready: bool,
    pub count: i64,
    pub meta: HashMap<String, String>,
}

// ── Plugin identity ───────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PluginType {
    Target,
}

/// Static identity descriptor returned to the plugin host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginInfo {
    pub name: String,
    pub plugin_type: PluginType,
}

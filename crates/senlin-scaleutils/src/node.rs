//! Autoscaler-side view of cluster nodes and the API used to manage them.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use senlin_core::{BoxFuture, NodeId, ScaleContext};

/// Scheduling status of a node as reported by the autoscaler's cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeStatus {
    Initializing,
    Ready,
    Down,
    Disconnected,
}

/// Summary of a single node, enough to filter and rank it for removal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NodeStub {
    pub id: NodeId,
    pub name: String,
    pub datacenter: String,
    pub node_class: String,
    pub status: NodeStatus,
    /// Whether new work may be placed on the node.
    pub eligible: bool,
    /// Whether a drain is already in progress.
    pub drain: bool,
    /// Raft index at which the node registered (higher = newer).
    pub create_index: u64,
    /// Running allocations, including system allocations.
    pub running_allocs: u32,
    /// Running allocations that belong to system jobs.
    pub running_system_allocs: u32,
    #[serde(default)]
    pub attributes: HashMap<String, String>,
}

impl NodeStub {
    /// Running allocations excluding system jobs.
    pub fn non_system_allocs(&self) -> u32 {
        self.running_allocs.saturating_sub(self.running_system_allocs)
    }
}

/// How a node should be drained before removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrainSpec {
    pub deadline: Duration,
    pub ignore_system_jobs: bool,
}

/// Node API of the cluster being autoscaled — injected for testability.
pub trait NodePool: Send + Sync {
    /// List every node known to the cluster.
    fn list_nodes<'a>(&'a self, ctx: &'a ScaleContext) -> BoxFuture<'a, anyhow::Result<Vec<NodeStub>>>;

    /// Drain a node and wait for the drain to complete.
    fn drain_node<'a>(
        &'a self,
        ctx: &'a ScaleContext,
        node_id: &'a str,
        spec: DrainSpec,
    ) -> BoxFuture<'a, anyhow::Result<()>>;

    /// Mark a node as eligible or ineligible for scheduling.
    fn set_eligibility<'a>(
        &'a self,
        ctx: &'a ScaleContext,
        node_id: &'a str,
        eligible: bool,
    ) -> BoxFuture<'a, anyhow::Result<()>>;

    /// Remove a node's record from the cluster.
    fn purge_node<'a>(&'a self, ctx: &'a ScaleContext, node_id: &'a str) -> BoxFuture<'a, anyhow::Result<()>>;
}

//! Candidate filtering and ranking for scale-in.
//!
//! A node is a candidate when it belongs to the configured pool, is
//! ready, is eligible for scheduling, and is not already draining. The
//! selector strategy then orders (and for the `empty` strategies, further
//! filters) the candidates. Ties are broken by node ID so the same input
//! always yields the same removal order.

use std::cmp::Reverse;

use crate::config::{ScaleInConfig, SelectorStrategy};
use crate::node::{NodeStatus, NodeStub};

/// Whether a node is in the pool identified by `cfg`.
pub fn in_pool(node: &NodeStub, cfg: &ScaleInConfig) -> bool {
    let class_ok = cfg
        .node_class
        .as_deref()
        .is_none_or(|class| node.node_class == class);
    let dc_ok = cfg
        .datacenter
        .as_deref()
        .is_none_or(|dc| node.datacenter == dc);
    class_ok && dc_ok
}

/// Keep only nodes that may be removed.
pub fn filter_candidates(nodes: Vec<NodeStub>, cfg: &ScaleInConfig) -> Vec<NodeStub> {
    nodes
        .into_iter()
        .filter(|n| in_pool(n, cfg))
        .filter(|n| n.status == NodeStatus::Ready && n.eligible && !n.drain)
        .collect()
}

impl SelectorStrategy {
    /// Pick up to `num` nodes from `candidates`, best removal target first.
    pub fn select(self, candidates: Vec<NodeStub>, num: usize) -> Vec<NodeStub> {
        let mut nodes: Vec<NodeStub> = match self {
            Self::Empty => candidates
                .into_iter()
                .filter(|n| n.running_allocs == 0)
                .collect(),
            Self::EmptyIgnoreSystem => candidates
                .into_iter()
                .filter(|n| n.non_system_allocs() == 0)
                .collect(),
            Self::LeastBusy | Self::NewestCreateIndex => candidates,
        };

        match self {
            Self::LeastBusy => nodes.sort_by(|a, b| {
                a.running_allocs
                    .cmp(&b.running_allocs)
                    .then_with(|| a.id.cmp(&b.id))
            }),
            Self::NewestCreateIndex => {
                nodes.sort_by(|a, b| {
                    Reverse(a.create_index)
                        .cmp(&Reverse(b.create_index))
                        .then_with(|| a.id.cmp(&b.id))
                })
            }
            Self::Empty | Self::EmptyIgnoreSystem => nodes.sort_by(|a, b| a.id.cmp(&b.id)),
        }

        nodes.truncate(num);
        nodes
    }
}

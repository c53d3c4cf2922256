//! `ClusterScaleUtils` — the default [`NodeLifecycle`] implementation.
//!
//! Scale-in happens in three steps around the Senlin call:
//!
//! 1. `pre_scale_in` lists nodes, filters and ranks them, resolves each to
//!    its Senlin member, and drains them concurrently.
//! 2. The target removes the members from the Senlin cluster.
//! 3. `post_scale_in` purges the node records when `node_purge` is set,
//!    or `post_scale_in_failure` makes the nodes schedulable again.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, anyhow, bail};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use senlin_core::{BoxFuture, NodeLifecycle, NodeResourceId, ScaleContext};

use crate::config::ScaleInConfig;
use crate::node::{DrainSpec, NodePool, NodeStub};
use crate::selector::filter_candidates;

/// Resolves a node to the identifier Senlin knows its member by.
pub type RemoteIdLookup = fn(&NodeStub) -> anyhow::Result<String>;

/// Node attribute carrying the host name, used when the node has no name.
pub const ATTR_UNIQUE_HOSTNAME: &str = "unique.hostname";

/// Senlin accepts member names wherever it accepts member IDs, and cluster
/// members are registered under their server name.
pub fn openstack_node_name(node: &NodeStub) -> anyhow::Result<String> {
    if !node.name.is_empty() {
        return Ok(node.name.clone());
    }
    match node.attributes.get(ATTR_UNIQUE_HOSTNAME) {
        Some(host) if !host.is_empty() => Ok(host.clone()),
        _ => Err(anyhow!("node {} has no name to map to a Senlin member", node.id)),
    }
}

/// Scale-in helper backed by a [`NodePool`].
pub struct ClusterScaleUtils {
    pool: Arc<dyn NodePool>,
    lookup: RemoteIdLookup,
}

impl ClusterScaleUtils {
    pub fn new(pool: Arc<dyn NodePool>) -> Self {
        Self {
            pool,
            lookup: openstack_node_name,
        }
    }

    /// Override how nodes are mapped to remote member IDs.
    pub fn with_lookup(mut self, lookup: RemoteIdLookup) -> Self {
        self.lookup = lookup;
        self
    }

    async fn select_and_drain(
        &self,
        ctx: &ScaleContext,
        num: u64,
        config: &HashMap<String, String>,
    ) -> anyhow::Result<Vec<NodeResourceId>> {
        let cfg = ScaleInConfig::from_map(config)?;
        let nodes = self
            .pool
            .list_nodes(ctx)
            .await
            .context("failed to list nodes")?;

        let candidates = filter_candidates(nodes, &cfg);
        if candidates.is_empty() {
            bail!("no nodes eligible for removal in pool {}", cfg.pool_id());
        }

        let wanted = usize::try_from(num).unwrap_or(usize::MAX);
        let selected = cfg.strategy.select(candidates, wanted);
        if selected.is_empty() {
            bail!(
                "no nodes in pool {} match selector strategy {}",
                cfg.pool_id(),
                cfg.strategy
            );
        }
        if selected.len() < wanted {
            warn!(
                pool = %cfg.pool_id(),
                requested = num,
                available = selected.len(),
                "fewer nodes available than requested for scale in"
            );
        }

        let ids = selected
            .iter()
            .map(|node| {
                Ok(NodeResourceId {
                    node_id: node.id.clone(),
                    remote_resource_id: (self.lookup)(node)?,
                })
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        debug!(
            strategy = %cfg.strategy,
            nodes = ?ids.iter().map(|id| id.node_id.as_str()).collect::<Vec<_>>(),
            "selected nodes for removal"
        );

        let spec = DrainSpec {
            deadline: cfg.drain_deadline,
            ignore_system_jobs: cfg.ignore_system_jobs,
        };
        if let Err(e) = self.drain_all(ctx, &ids, spec).await {
            if let Err(revert) = self.restore_eligibility(ctx, &ids).await {
                warn!(error = %revert, "failed to restore eligibility after drain failure");
            }
            return Err(e);
        }

        info!(count = ids.len(), pool = %cfg.pool_id(), "nodes drained for scale in");
        Ok(ids)
    }

    /// Drain every node concurrently; fails if any drain fails.
    async fn drain_all(
        &self,
        ctx: &ScaleContext,
        ids: &[NodeResourceId],
        spec: DrainSpec,
    ) -> anyhow::Result<()> {
        let mut drains = JoinSet::new();
        for id in ids {
            let pool = Arc::clone(&self.pool);
            let ctx = ctx.clone();
            let node_id = id.node_id.clone();
            drains.spawn(async move {
                let result = pool.drain_node(&ctx, &node_id, spec).await;
                (node_id, result)
            });
        }

        let mut failed = Vec::new();
        while let Some(joined) = drains.join_next().await {
            match joined {
                Ok((node_id, Ok(()))) => debug!(%node_id, "node drained"),
                Ok((node_id, Err(e))) => {
                    warn!(%node_id, error = %e, "node drain failed");
                    failed.push(node_id);
                }
                Err(e) => {
                    warn!(error = %e, "node drain task failed");
                    failed.push("<unknown>".to_string());
                }
            }
        }

        if failed.is_empty() {
            Ok(())
        } else {
            Err(anyhow!("failed to drain nodes: {}", failed.join(", ")))
        }
    }

    /// Make nodes schedulable again; reports how many could not be restored.
    async fn restore_eligibility(
        &self,
        ctx: &ScaleContext,
        ids: &[NodeResourceId],
    ) -> anyhow::Result<()> {
        let mut failures = 0usize;
        for id in ids {
            if let Err(e) = self.pool.set_eligibility(ctx, &id.node_id, true).await {
                warn!(node_id = %id.node_id, error = %e, "failed to restore node eligibility");
                failures += 1;
            }
        }
        if failures > 0 {
            bail!("failed to restore eligibility on {failures} node(s)");
        }
        Ok(())
    }

    async fn purge(
        &self,
        ctx: &ScaleContext,
        config: &HashMap<String, String>,
        ids: &[NodeResourceId],
    ) -> anyhow::Result<()> {
        let cfg = ScaleInConfig::from_map(config)?;
        if !cfg.purge {
            return Ok(());
        }

        // Purge failures leave stale records behind but do not undo the
        // scale in, so they are only reported.
        for id in ids {
            match self.pool.purge_node(ctx, &id.node_id).await {
                Ok(()) => debug!(node_id = %id.node_id, "node purged"),
                Err(e) => warn!(node_id = %id.node_id, error = %e, "failed to purge node"),
            }
        }
        Ok(())
    }
}

impl NodeLifecycle for ClusterScaleUtils {
    fn pre_scale_in<'a>(
        &'a self,
        ctx: &'a ScaleContext,
        count: u64,
        config: &'a HashMap<String, String>,
    ) -> BoxFuture<'a, anyhow::Result<Vec<NodeResourceId>>> {
        Box::pin(self.select_and_drain(ctx, count, config))
    }

    fn post_scale_in<'a>(
        &'a self,
        ctx: &'a ScaleContext,
        config: &'a HashMap<String, String>,
        ids: &'a [NodeResourceId],
    ) -> BoxFuture<'a, anyhow::Result<()>> {
        Box::pin(self.purge(ctx, config, ids))
    }

    fn post_scale_in_failure<'a>(
        &'a self,
        ctx: &'a ScaleContext,
        _config: &'a HashMap<String, String>,
        ids: &'a [NodeResourceId],
    ) -> BoxFuture<'a, anyhow::Result<()>> {
        Box::pin(self.restore_eligibility(ctx, ids))
    }
}

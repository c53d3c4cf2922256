//! Default collaborator wiring for a plugin process.
//!
//! The Senlin client and the node pool client are built from the plugin
//! configuration at `set_config` time. The node pool is wrapped in
//! [`ClusterScaleUtils`], which becomes the target's [`NodeLifecycle`].

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Context;

use senlin_core::{ClusterApi, NodeLifecycle, TargetConfig};
use senlin_scaleutils::{ClusterScaleUtils, NodePool, RemoteIdLookup, openstack_node_name};

use crate::plugin::CollaboratorFactory;

/// Builds the Senlin API client from the parsed target configuration.
pub type ClusterApiBuilder =
    Arc<dyn Fn(&TargetConfig) -> anyhow::Result<Arc<dyn ClusterApi>> + Send + Sync>;

/// Builds the node pool client from the raw plugin configuration, which
/// carries the pool client's own connection keys.
pub type NodePoolBuilder =
    Arc<dyn Fn(&HashMap<String, String>) -> anyhow::Result<Arc<dyn NodePool>> + Send + Sync>;

/// [`CollaboratorFactory`] that pairs a Senlin client with
/// [`ClusterScaleUtils`] over a node pool.
#[derive(Clone)]
pub struct SenlinCollaborators {
    cluster: ClusterApiBuilder,
    pool: NodePoolBuilder,
    lookup: RemoteIdLookup,
}

impl SenlinCollaborators {
    pub fn new<C, P>(cluster: C, pool: P) -> Self
    where
        C: Fn(&TargetConfig) -> anyhow::Result<Arc<dyn ClusterApi>> + Send + Sync + 'static,
        P: Fn(&HashMap<String, String>) -> anyhow::Result<Arc<dyn NodePool>>
            + Send
            + Sync
            + 'static,
    {
        Self {
            cluster: Arc::new(cluster),
            pool: Arc::new(pool),
            lookup: openstack_node_name,
        }
    }

    /// Override how selected nodes map to Senlin member IDs.
    pub fn with_lookup(mut self, lookup: RemoteIdLookup) -> Self {
        self.lookup = lookup;
        self
    }
}

impl CollaboratorFactory for SenlinCollaborators {
    fn cluster_api(&self, config: &TargetConfig) -> anyhow::Result<Arc<dyn ClusterApi>> {
        (self.cluster)(config).with_context(|| {
            format!("failed to create OpenStack Senlin client for region {}", config.region)
        })
    }

    fn node_lifecycle(&self, config: &TargetConfig) -> anyhow::Result<Arc<dyn NodeLifecycle>> {
        let pool = (self.pool)(&config.raw).context("failed to create node pool client")?;
        Ok(Arc::new(ClusterScaleUtils::new(pool).with_lookup(self.lookup)))
    }
}

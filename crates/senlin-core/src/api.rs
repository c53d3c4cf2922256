//! Collaborator traits — the cluster API and the node lifecycle utility.
//!
//! The target never talks to OpenStack or to the autoscaler's node API
//! directly; both sides are injected so the host can supply real clients
//! and tests can supply fakes.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use crate::context::ScaleContext;
use crate::types::{ActionId, ActionState, ClusterState, NodeResourceId};

/// Boxed future alias for collaborator calls.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Cluster-management API of the cloud provider.
///
/// Mutating calls are asynchronous on the Senlin side: they return the
/// id of an action whose completion is observed through
/// [`ClusterApi::action_status`].
pub trait ClusterApi: Send + Sync {
    /// Read the current snapshot of the named cluster.
    fn describe_cluster<'a>(
        &'a self,
        ctx: &'a ScaleContext,
        name: &'a str,
    ) -> BoxFuture<'a, anyhow::Result<ClusterState>>;

    /// Add `count` members to the cluster.
    fn request_scale_out<'a>(
        &'a self,
        ctx: &'a ScaleContext,
        cluster: &'a ClusterState,
        count: u64,
    ) -> BoxFuture<'a, anyhow::Result<ActionId>>;

    /// Remove the given members from the cluster.
    fn request_scale_in<'a>(
        &'a self,
        ctx: &'a ScaleContext,
        cluster: &'a ClusterState,
        count: u64,
        member_ids: &'a [String],
    ) -> BoxFuture<'a, anyhow::Result<ActionId>>;

    /// Look up the current state of an action.
    fn action_status<'a>(
        &'a self,
        ctx: &'a ScaleContext,
        action_id: &'a str,
    ) -> BoxFuture<'a, anyhow::Result<ActionState>>;
}

/// Node selection and safe-removal sequencing for scale-in.
pub trait NodeLifecycle: Send + Sync {
    /// Pick `count` nodes to remove, prepare them (drain), and return
    /// their identities in removal order.
    fn pre_scale_in<'a>(
        &'a self,
        ctx: &'a ScaleContext,
        count: u64,
        config: &'a HashMap<String, String>,
    ) -> BoxFuture<'a, anyhow::Result<Vec<NodeResourceId>>>;

    /// Finalize removal of nodes once the cloud members are gone.
    fn post_scale_in<'a>(
        &'a self,
        ctx: &'a ScaleContext,
        config: &'a HashMap<String, String>,
        ids: &'a [NodeResourceId],
    ) -> BoxFuture<'a, anyhow::Result<()>>;

    /// Undo preparation of nodes after the cloud call failed.
    fn post_scale_in_failure<'a>(
        &'a self,
        ctx: &'a ScaleContext,
        config: &'a HashMap<String, String>,
        ids: &'a [NodeResourceId],
    ) -> BoxFuture<'a, anyhow::Result<()>>;
}

//! Scale-out and scale-in execution paths.
//!
//! Both paths issue one mutating Senlin call and then poll the returned
//! action through [`retry`] until Senlin reports a terminal status.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::anyhow;
use tracing::{debug, info, warn};

use senlin_core::{ActionStatus, ClusterApi, ClusterState, ScaleContext};

use crate::error::{TargetError, TargetResult};
use crate::plugin::{Configured, SenlinTarget};
use crate::retry::{RetryOutcome, retry};

impl SenlinTarget {
    /// Add `num` members to the cluster and wait for Senlin to finish.
    pub(crate) async fn scale_out(
        &self,
        ctx: &ScaleContext,
        configured: &Configured,
        cluster: &ClusterState,
        num: u64,
    ) -> TargetResult<()> {
        let action_id = configured
            .cluster
            .request_scale_out(ctx, cluster, num)
            .await
            .map_err(TargetError::Cluster)?;

        info!(
            cluster_name = %cluster.name,
            action_id = %action_id,
            count = num,
            "scale out requested"
        );

        ensure_action_completed(ctx, configured, &action_id).await?;

        info!(cluster_name = %cluster.name, action_id = %action_id, "scale out completed");
        Ok(())
    }

    /// Remove `num` members from the cluster.
    ///
    /// The node lifecycle utility picks and drains the members first. If
    /// the Senlin side fails afterwards, the nodes are handed back to the
    /// lifecycle utility to be made schedulable again.
    pub(crate) async fn scale_in(
        &self,
        ctx: &ScaleContext,
        configured: &Configured,
        cluster: &ClusterState,
        num: u64,
        config: &HashMap<String, String>,
    ) -> TargetResult<()> {
        let ids = configured
            .nodes
            .pre_scale_in(ctx, num, config)
            .await
            .map_err(TargetError::NodeSelection)?;

        if ids.is_empty() {
            return Err(TargetError::NodeSelection(anyhow!(
                "no nodes selected for removal"
            )));
        }

        let members: Vec<String> = ids.iter().map(|id| id.remote_resource_id.clone()).collect();
        let count = members.len() as u64;
        if count != num {
            warn!(
                cluster_name = %cluster.name,
                requested = num,
                selected = count,
                "scaling in fewer members than requested"
            );
        }

        let removal = async {
            let action_id = configured
                .cluster
                .request_scale_in(ctx, cluster, count, &members)
                .await
                .map_err(TargetError::Cluster)?;

            info!(
                cluster_name = %cluster.name,
                action_id = %action_id,
                count,
                members = ?members,
                "scale in requested"
            );

            ensure_action_completed(ctx, configured, &action_id).await
        };

        if let Err(err) = removal.await {
            if let Err(revert) = configured.nodes.post_scale_in_failure(ctx, config, &ids).await {
                warn!(error = %revert, "failed to restore nodes after failed scale in");
            }
            return Err(err);
        }

        configured
            .nodes
            .post_scale_in(ctx, config, &ids)
            .await
            .map_err(TargetError::NodeCleanup)?;

        info!(cluster_name = %cluster.name, count, "scale in completed");
        Ok(())
    }
}

/// Poll a Senlin action until it succeeds, fails, or the retry policy
/// gives up.
async fn ensure_action_completed(
    ctx: &ScaleContext,
    configured: &Configured,
    action_id: &str,
) -> TargetResult<()> {
    let api: Arc<dyn ClusterApi> = Arc::clone(&configured.cluster);

    retry(ctx, &configured.config.retry, |attempt_ctx| {
        let api = Arc::clone(&api);
        let action_id = action_id.to_string();
        async move {
            let state = match api.action_status(&attempt_ctx, &action_id).await {
                Ok(state) => state,
                Err(e) => return RetryOutcome::retry(TargetError::Cluster(e)),
            };

            match state.status {
                ActionStatus::Succeeded => RetryOutcome::done(),
                status if status.is_terminal() => {
                    RetryOutcome::fail(TargetError::ActionFailed {
                        action_id,
                        status,
                        reason: state.status_reason,
                    })
                }
                status => {
                    debug!(action_id = %action_id, %status, "action still in progress");
                    RetryOutcome::retry(TargetError::ActionPending { action_id, status })
                }
            }
        }
    })
    .await
}

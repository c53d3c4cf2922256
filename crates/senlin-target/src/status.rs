//! Maps a Senlin cluster snapshot to the autoscaler's target status.

use std::collections::HashMap;

use senlin_core::{ClusterState, TargetStatus};

/// Senlin status of a cluster that can accept scaling requests.
pub const CLUSTER_STATUS_ACTIVE: &str = "ACTIVE";

/// Build the status record for a cluster.
///
/// `ready` is an exact, case-sensitive match on `"ACTIVE"`. `count` is the
/// cluster's desired capacity, not the number of members currently running.
pub fn target_status(cluster: &ClusterState) -> TargetStatus {
    TargetStatus {
        ready: cluster.status == CLUSTER_STATUS_ACTIVE,
        count: i64::from(cluster.desired_capacity),
        meta: HashMap::new(),
    }
}

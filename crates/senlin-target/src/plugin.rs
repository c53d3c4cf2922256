//! Senlin target plugin — the entry points the autoscaler host calls.
//!
//! `scale` describes the cluster once, decides the direction, and hands
//! off to the scale-out or scale-in path. `status` describes the cluster
//! and maps it to a [`TargetStatus`].

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{Instrument, Span, debug, info};

use senlin_core::config::{CONFIG_KEY_CLUSTER_NAME, required};
use senlin_core::{
    BoxFuture, ClusterApi, NodeLifecycle, PLUGIN_NAME, PluginInfo, PluginType, ScaleContext,
    ScalingAction, TargetConfig, TargetStatus,
};

use crate::decision::{ScalingDirection, compute_direction};
use crate::error::{TargetError, TargetResult};
use crate::status::target_status;

/// The plugin contract between the autoscaler host and a target.
pub trait Target: Send + Sync {
    /// One-time setup from the plugin's configuration block.
    fn set_config(&mut self, config: &HashMap<String, String>) -> TargetResult<()>;

    /// Static identity of the plugin.
    fn plugin_info(&self) -> PluginInfo;

    /// Move the target towards `action.count`.
    fn scale<'a>(
        &'a self,
        ctx: &'a ScaleContext,
        action: &'a ScalingAction,
        config: &'a HashMap<String, String>,
    ) -> BoxFuture<'a, TargetResult<()>>;

    /// Report the target's readiness and current size.
    fn status<'a>(
        &'a self,
        ctx: &'a ScaleContext,
        config: &'a HashMap<String, String>,
    ) -> BoxFuture<'a, TargetResult<TargetStatus>>;
}

/// Builds the cloud-side collaborators once the configuration is known.
pub trait CollaboratorFactory: Send + Sync {
    fn cluster_api(&self, config: &TargetConfig) -> anyhow::Result<Arc<dyn ClusterApi>>;

    fn node_lifecycle(&self, config: &TargetConfig) -> anyhow::Result<Arc<dyn NodeLifecycle>>;
}

/// Factory that hands out already-constructed collaborators.
#[derive(Clone)]
pub struct StaticCollaborators {
    pub cluster: Arc<dyn ClusterApi>,
    pub nodes: Arc<dyn NodeLifecycle>,
}

impl CollaboratorFactory for StaticCollaborators {
    fn cluster_api(&self, _config: &TargetConfig) -> anyhow::Result<Arc<dyn ClusterApi>> {
        Ok(Arc::clone(&self.cluster))
    }

    fn node_lifecycle(&self, _config: &TargetConfig) -> anyhow::Result<Arc<dyn NodeLifecycle>> {
        Ok(Arc::clone(&self.nodes))
    }
}

/// State fixed by `set_config`.
pub(crate) struct Configured {
    pub(crate) config: TargetConfig,
    pub(crate) cluster: Arc<dyn ClusterApi>,
    pub(crate) nodes: Arc<dyn NodeLifecycle>,
}

/// OpenStack Senlin implementation of [`Target`].
pub struct SenlinTarget {
    span: Span,
    factory: Arc<dyn CollaboratorFactory>,
    configured: Option<Configured>,
}

impl SenlinTarget {
    /// Create an unconfigured target.
    ///
    /// All log events are emitted inside `span`, which plays the role of
    /// the plugin's named logger.
    pub fn new(span: Span, factory: Arc<dyn CollaboratorFactory>) -> Self {
        Self {
            span,
            factory,
            configured: None,
        }
    }

    /// The configuration accepted by the last successful `set_config`.
    pub fn config(&self) -> Option<&TargetConfig> {
        self.configured.as_ref().map(|c| &c.config)
    }

    fn configured(&self) -> TargetResult<&Configured> {
        self.configured.as_ref().ok_or(TargetError::NotConfigured)
    }

    async fn run_scale(
        &self,
        ctx: &ScaleContext,
        action: &ScalingAction,
        config: &HashMap<String, String>,
    ) -> TargetResult<()> {
        // Senlin has no dry-run mode, so evaluation alone is a no-op.
        if action.is_dry_run() {
            debug!("dry-run requested, no scaling performed");
            return Ok(());
        }
        let cluster_name = required(config, CONFIG_KEY_CLUSTER_NAME)?;
        if action.count < 0 {
            return Err(TargetError::InvalidCount(action.count));
        }
        let configured = self.configured()?;

        // One describe call validates the config and credentials and
        // supplies the current capacity for the decision.
        let cluster = configured
            .cluster
            .describe_cluster(ctx, cluster_name)
            .await
            .map_err(TargetError::Describe)?;

        let (num, direction) =
            compute_direction(i64::from(cluster.desired_capacity), action.count);

        let result = match direction {
            ScalingDirection::ScaleIn => self.scale_in(ctx, configured, &cluster, num, config).await,
            ScalingDirection::ScaleOut => self.scale_out(ctx, configured, &cluster, num).await,
            ScalingDirection::None => {
                info!(
                    cluster_name,
                    current_count = cluster.desired_capacity,
                    strategy_count = action.count,
                    "scaling not required"
                );
                return Ok(());
            }
        };

        result.map_err(|e| TargetError::Scaling(Box::new(e)))
    }

    async fn run_status(
        &self,
        ctx: &ScaleContext,
        config: &HashMap<String, String>,
    ) -> TargetResult<TargetStatus> {
        let cluster_name = required(config, CONFIG_KEY_CLUSTER_NAME)?;
        let configured = self.configured()?;

        let cluster = configured
            .cluster
            .describe_cluster(ctx, cluster_name)
            .await
            .map_err(TargetError::Describe)?;

        Ok(target_status(&cluster))
    }
}

impl Target for SenlinTarget {
    fn set_config(&mut self, config: &HashMap<String, String>) -> TargetResult<()> {
        let _enter = self.span.enter();

        let config = TargetConfig::from_map(config)?;
        let cluster = self
            .factory
            .cluster_api(&config)
            .map_err(TargetError::Setup)?;
        let nodes = self
            .factory
            .node_lifecycle(&config)
            .map_err(TargetError::Setup)?;

        info!(
            region = %config.region,
            retry_interval_ms = config.retry.interval.as_millis() as u64,
            retry_attempts = config.retry.max_attempts,
            "senlin target configured"
        );

        self.configured = Some(Configured {
            config,
            cluster,
            nodes,
        });
        Ok(())
    }

    fn plugin_info(&self) -> PluginInfo {
        PluginInfo {
            name: PLUGIN_NAME.to_string(),
            plugin_type: PluginType::Target,
        }
    }

    fn scale<'a>(
        &'a self,
        ctx: &'a ScaleContext,
        action: &'a ScalingAction,
        config: &'a HashMap<String, String>,
    ) -> BoxFuture<'a, TargetResult<()>> {
        Box::pin(
            self.run_scale(ctx, action, config)
                .instrument(self.span.clone()),
        )
    }

    fn status<'a>(
        &'a self,
        ctx: &'a ScaleContext,
        config: &'a HashMap<String, String>,
    ) -> BoxFuture<'a, TargetResult<TargetStatus>> {
        Box::pin(self.run_status(ctx, config).instrument(self.span.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    use anyhow::anyhow;
    use senlin_core::config::{
        CONFIG_KEY_REGION, CONFIG_KEY_RETRY_ATTEMPTS, CONFIG_KEY_RETRY_INTERVAL,
    };
    use senlin_core::{
        ActionId, ActionState, ActionStatus, ClusterState, ConfigError, ManualClock,
        NodeResourceId,
    };

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Call {
        Describe(String),
        ScaleOut(u64),
        ScaleIn(u64, Vec<String>),
        Poll(String),
        PreScaleIn(u64),
        PostScaleIn(usize),
        ScaleInFailure(usize),
    }

    type Calls = Arc<Mutex<Vec<Call>>>;

    /// Scripted Senlin API. Action polls pop from `statuses`; once the
    /// script runs out the action reports RUNNING forever.
    struct FakeCluster {
        cluster: Option<ClusterState>,
        statuses: Mutex<VecDeque<Result<ActionStatus, String>>>,
        reject_scale_in: bool,
        calls: Calls,
    }

    impl ClusterApi for FakeCluster {
        fn describe_cluster<'a>(
            &'a self,
            _ctx: &'a ScaleContext,
            name: &'a str,
        ) -> BoxFuture<'a, anyhow::Result<ClusterState>> {
            self.calls.lock().unwrap().push(Call::Describe(name.to_string()));
            let result = self
                .cluster
                .clone()
                .ok_or_else(|| anyhow!("cluster {name} not found"));
            Box::pin(async move { result })
        }

        fn request_scale_out<'a>(
            &'a self,
            _ctx: &'a ScaleContext,
            _cluster: &'a ClusterState,
            count: u64,
        ) -> BoxFuture<'a, anyhow::Result<ActionId>> {
            self.calls.lock().unwrap().push(Call::ScaleOut(count));
            Box::pin(async { Ok("action-out".to_string()) })
        }

        fn request_scale_in<'a>(
            &'a self,
            _ctx: &'a ScaleContext,
            _cluster: &'a ClusterState,
            count: u64,
            member_ids: &'a [String],
        ) -> BoxFuture<'a, anyhow::Result<ActionId>> {
            self.calls
                .lock()
                .unwrap()
                .push(Call::ScaleIn(count, member_ids.to_vec()));
            let reject = self.reject_scale_in;
            Box::pin(async move {
                if reject {
                    Err(anyhow!("policy check failed"))
                } else {
                    Ok("action-in".to_string())
                }
            })
        }

        fn action_status<'a>(
            &'a self,
            _ctx: &'a ScaleContext,
            action_id: &'a str,
        ) -> BoxFuture<'a, anyhow::Result<ActionState>> {
            self.calls.lock().unwrap().push(Call::Poll(action_id.to_string()));
            let next = self
                .statuses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Ok(ActionStatus::Running));
            let id = action_id.to_string();
            Box::pin(async move {
                let status = next.map_err(|e| anyhow!(e))?;
                Ok(ActionState {
                    id,
                    status,
                    status_reason: if status == ActionStatus::Failed {
                        "quota exceeded".to_string()
                    } else {
                        String::new()
                    },
                })
            })
        }
    }

    struct FakeNodes {
        calls: Calls,
    }

    impl NodeLifecycle for FakeNodes {
        fn pre_scale_in<'a>(
            &'a self,
            _ctx: &'a ScaleContext,
            count: u64,
            _config: &'a HashMap<String, String>,
        ) -> BoxFuture<'a, anyhow::Result<Vec<NodeResourceId>>> {
            self.calls.lock().unwrap().push(Call::PreScaleIn(count));
            let ids = (0..count)
                .map(|i| NodeResourceId {
                    node_id: format!("node-{i}"),
                    remote_resource_id: format!("member-{i}"),
                })
                .collect();
            Box::pin(async move { Ok(ids) })
        }

        fn post_scale_in<'a>(
            &'a self,
            _ctx: &'a ScaleContext,
            _config: &'a HashMap<String, String>,
            ids: &'a [NodeResourceId],
        ) -> BoxFuture<'a, anyhow::Result<()>> {
            self.calls.lock().unwrap().push(Call::PostScaleIn(ids.len()));
            Box::pin(async { Ok(()) })
        }

        fn post_scale_in_failure<'a>(
            &'a self,
            _ctx: &'a ScaleContext,
            _config: &'a HashMap<String, String>,
            ids: &'a [NodeResourceId],
        ) -> BoxFuture<'a, anyhow::Result<()>> {
            self.calls.lock().unwrap().push(Call::ScaleInFailure(ids.len()));
            Box::pin(async { Ok(()) })
        }
    }

    struct Harness {
        target: SenlinTarget,
        calls: Calls,
        ctx: ScaleContext,
        clock: Arc<ManualClock>,
    }

    fn cluster(desired: u32, status: &str) -> ClusterState {
        ClusterState {
            id: "c-123".to_string(),
            name: "workers".to_string(),
            desired_capacity: desired,
            status: status.to_string(),
        }
    }

    fn plugin_config() -> HashMap<String, String> {
        HashMap::from([
            (CONFIG_KEY_REGION.to_string(), "RegionOne".to_string()),
            (CONFIG_KEY_RETRY_INTERVAL.to_string(), "1s".to_string()),
            (CONFIG_KEY_RETRY_ATTEMPTS.to_string(), "3".to_string()),
        ])
    }

    fn target_config() -> HashMap<String, String> {
        HashMap::from([(CONFIG_KEY_CLUSTER_NAME.to_string(), "workers".to_string())])
    }

    fn harness(
        snapshot: Option<ClusterState>,
        statuses: Vec<Result<ActionStatus, String>>,
        reject_scale_in: bool,
    ) -> Harness {
        let calls: Calls = Arc::default();
        let factory = StaticCollaborators {
            cluster: Arc::new(FakeCluster {
                cluster: snapshot,
                statuses: Mutex::new(statuses.into()),
                reject_scale_in,
                calls: calls.clone(),
            }),
            nodes: Arc::new(FakeNodes {
                calls: calls.clone(),
            }),
        };
        let mut target = SenlinTarget::new(Span::none(), Arc::new(factory));
        target.set_config(&plugin_config()).unwrap();

        let clock = Arc::new(ManualClock::new());
        let ctx = ScaleContext::background().with_clock(clock.clone());
        Harness {
            target,
            calls,
            ctx,
            clock,
        }
    }

    impl Harness {
        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        async fn scale(&self, count: i64) -> TargetResult<()> {
            self.target
                .scale(&self.ctx, &ScalingAction::new(count), &target_config())
                .await
        }
    }

    #[test]
    fn plugin_info_identifies_target() {
        let h = harness(None, vec![], false);
        let info = h.target.plugin_info();
        assert_eq!(info.name, "openstack-senlin");
        assert_eq!(info.plugin_type, PluginType::Target);
    }

    #[test]
    fn set_config_requires_region() {
        let h = harness(None, vec![], false);
        let mut target = SenlinTarget::new(Span::none(), h.target.factory.clone());
        let err = target.set_config(&HashMap::new()).unwrap_err();
        assert!(matches!(err, TargetError::Config(ConfigError::MissingKey(ref k)) if k == "os_region"));
        assert!(target.config().is_none());
    }

    #[test]
    fn set_config_surfaces_factory_errors() {
        struct Broken;
        impl CollaboratorFactory for Broken {
            fn cluster_api(&self, _: &TargetConfig) -> anyhow::Result<Arc<dyn ClusterApi>> {
                Err(anyhow!("no credentials"))
            }
            fn node_lifecycle(&self, _: &TargetConfig) -> anyhow::Result<Arc<dyn NodeLifecycle>> {
                Err(anyhow!("unreachable in this test"))
            }
        }

        let mut target = SenlinTarget::new(Span::none(), Arc::new(Broken));
        let err = target.set_config(&plugin_config()).unwrap_err();
        assert_eq!(err.to_string(), "failed to set up cloud clients: no credentials");
    }

    #[test]
    fn set_config_keeps_retry_policy() {
        let h = harness(None, vec![], false);
        let cfg = h.target.config().unwrap();
        assert_eq!(cfg.region, "RegionOne");
        assert_eq!(cfg.retry.interval, Duration::from_secs(1));
        assert_eq!(cfg.retry.max_attempts, 3);
    }

    #[tokio::test]
    async fn dry_run_makes_no_calls() {
        let h = harness(Some(cluster(2, "ACTIVE")), vec![], false);
        h.target
            .scale(&h.ctx, &ScalingAction::dry_run(), &target_config())
            .await
            .unwrap();
        assert!(h.calls().is_empty());
    }

    #[tokio::test]
    async fn dry_run_succeeds_even_when_unconfigured() {
        let h = harness(None, vec![], false);
        let target = SenlinTarget::new(Span::none(), h.target.factory.clone());
        target
            .scale(&h.ctx, &ScalingAction::dry_run(), &HashMap::new())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn missing_cluster_name_fails_without_describe() {
        let h = harness(Some(cluster(2, "ACTIVE")), vec![], false);
        let err = h
            .target
            .scale(&h.ctx, &ScalingAction::new(3), &HashMap::new())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            TargetError::Config(ConfigError::MissingKey(ref k)) if k == CONFIG_KEY_CLUSTER_NAME
        ));
        assert!(h.calls().is_empty());
    }

    #[tokio::test]
    async fn negative_count_is_rejected() {
        let h = harness(Some(cluster(2, "ACTIVE")), vec![], false);
        let err = h.scale(-4).await.unwrap_err();
        assert!(matches!(err, TargetError::InvalidCount(-4)));
        assert!(h.calls().is_empty());
    }

    #[tokio::test]
    async fn missing_cluster_name_reported_before_invalid_count() {
        let h = harness(Some(cluster(2, "ACTIVE")), vec![], false);
        let err = h
            .target
            .scale(&h.ctx, &ScalingAction::new(-4), &HashMap::new())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            TargetError::Config(ConfigError::MissingKey(ref k)) if k == CONFIG_KEY_CLUSTER_NAME
        ));
        assert!(h.calls().is_empty());
    }

    #[tokio::test]
    async fn unconfigured_target_refuses_to_scale() {
        let h = harness(None, vec![], false);
        let target = SenlinTarget::new(Span::none(), h.target.factory.clone());
        let err = target
            .scale(&h.ctx, &ScalingAction::new(3), &target_config())
            .await
            .unwrap_err();
        assert!(matches!(err, TargetError::NotConfigured));
    }

    #[tokio::test]
    async fn describe_failure_is_wrapped() {
        let h = harness(None, vec![], false);
        let err = h.scale(3).await.unwrap_err();
        assert!(matches!(err, TargetError::Describe(_)));
        assert_eq!(
            err.to_string(),
            "failed to describe OpenStack Senlin cluster: cluster workers not found"
        );
        assert_eq!(h.calls(), vec![Call::Describe("workers".to_string())]);
    }

    #[tokio::test]
    async fn scale_out_requests_difference_and_polls() {
        let h = harness(
            Some(cluster(4, "ACTIVE")),
            vec![Ok(ActionStatus::Running), Ok(ActionStatus::Succeeded)],
            false,
        );

        h.scale(7).await.unwrap();

        assert_eq!(
            h.calls(),
            vec![
                Call::Describe("workers".to_string()),
                Call::ScaleOut(3),
                Call::Poll("action-out".to_string()),
                Call::Poll("action-out".to_string()),
            ]
        );
        assert_eq!(h.clock.sleeps(), vec![Duration::from_secs(1)]);
    }

    #[tokio::test]
    async fn scale_in_selects_nodes_and_removes_members() {
        let h = harness(
            Some(cluster(5, "ACTIVE")),
            vec![Ok(ActionStatus::Succeeded)],
            false,
        );

        h.scale(2).await.unwrap();

        assert_eq!(
            h.calls(),
            vec![
                Call::Describe("workers".to_string()),
                Call::PreScaleIn(3),
                Call::ScaleIn(
                    3,
                    vec![
                        "member-0".to_string(),
                        "member-1".to_string(),
                        "member-2".to_string()
                    ]
                ),
                Call::Poll("action-in".to_string()),
                Call::PostScaleIn(3),
            ]
        );
    }

    #[tokio::test]
    async fn equal_counts_only_describe() {
        let h = harness(Some(cluster(5, "ACTIVE")), vec![], false);
        h.scale(5).await.unwrap();
        assert_eq!(h.calls(), vec![Call::Describe("workers".to_string())]);
    }

    #[tokio::test]
    async fn failed_action_is_terminal() {
        let h = harness(
            Some(cluster(1, "ACTIVE")),
            vec![Ok(ActionStatus::Failed)],
            false,
        );

        let err = h.scale(2).await.unwrap_err();

        assert_eq!(
            err.to_string(),
            "failed to perform scaling action: action action-out finished with status FAILED: quota exceeded"
        );
        assert!(h.clock.sleeps().is_empty());
    }

    #[tokio::test]
    async fn cancelled_action_is_terminal() {
        let h = harness(
            Some(cluster(3, "ACTIVE")),
            vec![Ok(ActionStatus::Running), Ok(ActionStatus::Cancelled)],
            false,
        );

        let err = h.scale(5).await.unwrap_err();

        match err {
            TargetError::Scaling(inner) => assert!(matches!(
                *inner,
                TargetError::ActionFailed { status: ActionStatus::Cancelled, .. }
            )),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(h.clock.sleeps().len(), 1);
    }

    #[tokio::test]
    async fn stuck_action_exhausts_retry_policy() {
        let h = harness(Some(cluster(1, "ACTIVE")), vec![], false);

        let err = h.scale(2).await.unwrap_err();

        match err {
            TargetError::Scaling(inner) => {
                assert!(matches!(*inner, TargetError::RetryLimit { attempts: 3 }));
            }
            other => panic!("unexpected error: {other}"),
        }
        let polls = h
            .calls()
            .into_iter()
            .filter(|c| matches!(c, Call::Poll(_)))
            .count();
        assert_eq!(polls, 3);
        assert_eq!(h.clock.sleeps(), vec![Duration::from_secs(1); 2]);
    }

    #[tokio::test]
    async fn transient_poll_errors_are_retried() {
        let h = harness(
            Some(cluster(1, "ACTIVE")),
            vec![Err("503 service unavailable".to_string()), Ok(ActionStatus::Succeeded)],
            false,
        );
        h.scale(3).await.unwrap();
    }

    #[tokio::test]
    async fn cancelled_context_stops_polling() {
        let h = harness(Some(cluster(1, "ACTIVE")), vec![Ok(ActionStatus::Running)], false);
        let ctx = h.ctx.clone();
        ctx.cancel();

        let err = h
            .target
            .scale(&ctx, &ScalingAction::new(2), &target_config())
            .await
            .unwrap_err();

        match err {
            TargetError::Scaling(inner) => assert!(inner.is_context()),
            other => panic!("unexpected error: {other}"),
        }
        assert!(!h.calls().iter().any(|c| matches!(c, Call::Poll(_))));
    }

    #[tokio::test]
    async fn rejected_scale_in_restores_nodes() {
        let h = harness(Some(cluster(4, "ACTIVE")), vec![], true);

        let err = h.scale(3).await.unwrap_err();

        assert_eq!(
            err.to_string(),
            "failed to perform scaling action: cluster API error: policy check failed"
        );
        let calls = h.calls();
        assert!(calls.contains(&Call::ScaleInFailure(1)));
        assert!(!calls.iter().any(|c| matches!(c, Call::PostScaleIn(_))));
    }

    #[tokio::test]
    async fn status_maps_cluster_snapshot() {
        let h = harness(Some(cluster(6, "ACTIVE")), vec![], false);
        let status = h.target.status(&h.ctx, &target_config()).await.unwrap();
        assert!(status.ready);
        assert_eq!(status.count, 6);
        assert!(status.meta.is_empty());

        let h = harness(Some(cluster(2, "RESIZING")), vec![], false);
        let status = h.target.status(&h.ctx, &target_config()).await.unwrap();
        assert!(!status.ready);
        assert_eq!(status.count, 2);
    }

    #[tokio::test]
    async fn status_requires_cluster_name() {
        let h = harness(Some(cluster(6, "ACTIVE")), vec![], false);
        let err = h.target.status(&h.ctx, &HashMap::new()).await.unwrap_err();
        assert!(matches!(err, TargetError::Config(ConfigError::MissingKey(_))));
        assert!(h.calls().is_empty());
    }
}

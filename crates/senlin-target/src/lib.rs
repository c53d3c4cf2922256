//! senlin-target — OpenStack Senlin target for horizontal autoscaling.
//!
//! Receives the desired cluster size chosen by a scaling strategy, works
//! out the direction and magnitude of the change, drives it through the
//! Senlin API, and reports the cluster's readiness back to the host.
//!
//! # Architecture
//!
//! ```text
//! SenlinTarget (Target)
//!   ├── describe_cluster (once per call)
//!   ├── compute_direction(current, desired) → (magnitude, direction)
//!   ├── scale_out: request_scale_out → retry(poll action)
//!   ├── scale_in:  NodeLifecycle::pre_scale_in → request_scale_in
//!   │              → retry(poll action) → post_scale_in / post_scale_in_failure
//!   └── status:    describe_cluster → target_status
//! ```
//!
//! `retry` is the only retry mechanism. It checks cancellation and the
//! deadline between attempts and waits on the context's clock, so tests
//! can run a full attempt budget without real delay.

mod actions;
pub mod decision;
pub mod error;
pub mod factory;
pub mod logging;
pub mod plugin;
pub mod retry;
pub mod status;

pub use decision::{ScalingDirection, compute_direction};
pub use error::{TargetError, TargetResult};
pub use factory::{ClusterApiBuilder, NodePoolBuilder, SenlinCollaborators};
pub use logging::{init_logging, plugin_span};
pub use plugin::{CollaboratorFactory, SenlinTarget, StaticCollaborators, Target};
pub use retry::{RetryOutcome, retry};
pub use status::target_status;

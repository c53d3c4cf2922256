//! senlin-core — shared types for the OpenStack Senlin target.
//!
//! Holds everything the target and its collaborators agree on:
//!
//! - **`types`** — scaling request, cluster snapshot, action and status records
//! - **`config`** — string-map configuration parsing and the retry policy
//! - **`context`** — per-call cancellation, deadline, and injectable clock
//! - **`api`** — `ClusterApi` and `NodeLifecycle` collaborator traits
//! - **`error`** — `ConfigError` and `ContextError`

pub mod api;
pub mod config;
pub mod context;
pub mod error;
pub mod types;

pub use api::{BoxFuture, ClusterApi, NodeLifecycle};
pub use config::{Backoff, RetryPolicy, TargetConfig};
pub use context::{Clock, ManualClock, ScaleContext, TokioClock};
pub use error::{ConfigError, ConfigResult, ContextError};
pub use types::*;

//! senlin-scaleutils — picking and preparing nodes for scale-in.
//!
//! Before Senlin removes members from a cluster, the nodes running on
//! those members have to be chosen and drained so no work is lost. This
//! crate provides [`ClusterScaleUtils`], the default
//! [`NodeLifecycle`](senlin_core::NodeLifecycle) used by the Senlin target.
//!
//! # Components
//!
//! - **`node`** — `NodeStub` records and the `NodePool` API trait
//! - **`config`** — per-call scale-in settings and selector strategies
//! - **`selector`** — pool filtering and removal ordering
//! - **`utils`** — drain / rollback / purge sequencing

pub mod config;
pub mod node;
pub mod selector;
pub mod utils;

pub use config::{ScaleInConfig, SelectorStrategy};
pub use node::{DrainSpec, NodePool, NodeStatus, NodeStub};
pub use selector::filter_candidates;
pub use utils::{ClusterScaleUtils, RemoteIdLookup, openstack_node_name};

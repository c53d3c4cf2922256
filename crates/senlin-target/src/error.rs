//! Target error types.

use senlin_core::{ActionId, ActionStatus, ConfigError, ContextError};
use thiserror::Error;

/// Errors returned by the Senlin target and its retry loop.
#[derive(Debug, Error)]
pub enum TargetError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("plugin has not been configured")]
    NotConfigured,

    #[error("invalid scaling count {0}")]
    InvalidCount(i64),

    #[error("failed to describe OpenStack Senlin cluster: {0}")]
    Describe(#[source] anyhow::Error),

    #[error("cluster API error: {0}")]
    Cluster(#[source] anyhow::Error),

    #[error("failed to set up cloud clients: {0}")]
    Setup(#[source] anyhow::Error),

    #[error("failed to select nodes for scale in: {0}")]
    NodeSelection(#[source] anyhow::Error),

    #[error("failed to clean up nodes after scale in: {0}")]
    NodeCleanup(#[source] anyhow::Error),

    #[error("action {action_id} finished with status {status}: {reason}")]
    ActionFailed {
        action_id: ActionId,
        status: ActionStatus,
        reason: String,
    },

    #[error("action {action_id} not yet complete, status {status}")]
    ActionPending {
        action_id: ActionId,
        status: ActionStatus,
    },

    #[error("reached retry limit")]
    RetryLimit { attempts: u32 },

    #[error("retry failed with {cause}; last error: {last}")]
    Interrupted {
        cause: ContextError,
        last: Box<TargetError>,
    },

    #[error(transparent)]
    Context(#[from] ContextError),

    #[error("failed to perform scaling action: {0}")]
    Scaling(#[source] Box<TargetError>),
}

impl TargetError {
    /// Whether this is exactly a cancellation or deadline error.
    ///
    /// Context errors wrapped inside another variant do not count.
    pub fn is_context(&self) -> bool {
        matches!(self, Self::Context(_))
    }
}

pub type TargetResult<T> = Result<T, TargetError>;

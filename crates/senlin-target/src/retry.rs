//! Bounded, cancellable retry loop.
//!
//! Used to wait for asynchronous Senlin actions to finish. The loop checks
//! the call context before every attempt, so cancellation takes effect at
//! the next attempt boundary; an attempt that is already running is never
//! interrupted.

use std::future::Future;

use tracing::{debug, warn};

use senlin_core::{RetryPolicy, ScaleContext};

use crate::error::{TargetError, TargetResult};

/// Result of a single retry attempt.
///
/// `stop` ends the loop immediately, returning `err` (`None` = success).
/// Otherwise `err` being `None` also ends the loop successfully, and an
/// error schedules another attempt.
#[derive(Debug)]
pub struct RetryOutcome {
    pub stop: bool,
    pub err: Option<TargetError>,
}

impl RetryOutcome {
    /// The work is finished.
    pub fn done() -> Self {
        Self {
            stop: true,
            err: None,
        }
    }

    /// Terminal failure; do not try again.
    pub fn fail(err: TargetError) -> Self {
        Self {
            stop: true,
            err: Some(err),
        }
    }

    /// Not there yet; try again after the policy's wait.
    pub fn retry(err: TargetError) -> Self {
        Self {
            stop: false,
            err: Some(err),
        }
    }
}

/// Run `attempt` until it reports completion, the attempt limit is
/// reached, or `ctx` is cancelled or past its deadline.
///
/// Waits between attempts use the context's clock.
pub async fn retry<F, Fut>(ctx: &ScaleContext, policy: &RetryPolicy, mut attempt: F) -> TargetResult<()>
where
    F: FnMut(ScaleContext) -> Fut,
    Fut: Future<Output = RetryOutcome>,
{
    let mut attempts: u32 = 0;
    let mut last_err: Option<TargetError> = None;

    loop {
        if let Some(cause) = ctx.err() {
            return Err(match last_err {
                Some(last) => TargetError::Interrupted {
                    cause,
                    last: Box::new(last),
                },
                None => TargetError::Context(cause),
            });
        }

        let RetryOutcome { stop, err } = attempt(ctx.clone()).await;
        if stop {
            return match err {
                Some(e) => Err(e),
                None => Ok(()),
            };
        }

        let Some(err) = err else {
            return Ok(());
        };
        if !err.is_context() {
            last_err = Some(err);
        }

        attempts += 1;
        if attempts >= policy.max_attempts {
            if let Some(last) = &last_err {
                warn!(attempts, last_error = %last, "retry limit reached");
            }
            return Err(TargetError::RetryLimit { attempts });
        }

        let wait = policy.delay(attempts);
        debug!(attempt = attempts, wait_ms = wait.as_millis() as u64, "retrying");
        ctx.clock().sleep(wait).await;
    }
}

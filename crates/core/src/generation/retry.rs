//! Sequential retry with linear backoff for image synthesis.
//!
//! Attempt `n` that fails with a retriable classification waits
//! `base_delay * n` before attempt `n + 1`. Attempts never overlap.

use std::future::Future;
use std::time::Duration;

use super::classify::{classify_failure, FailureKind};
use crate::error::{AppError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(2000),
        }
    }
}

impl RetryPolicy {
    /// Delay after failed attempt `attempt` (1-based). Saturates instead of overflowing.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(attempt)
    }
}

/// Retrier states for one invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptState {
    Attempting(u32),
    Succeeded,
    Failed(FailureKind),
}

impl AttemptState {
    /// Transition after attempt `n` failed with `kind`.
    ///
    /// Returns the next state and the pause to take before it.
    pub fn after_failure(n: u32, kind: FailureKind, policy: &RetryPolicy) -> (AttemptState, Option<Duration>) {
        if kind.is_retriable() && n < policy.max_attempts {
            (AttemptState::Attempting(n + 1), Some(policy.delay_after(n)))
        } else {
            (AttemptState::Failed(kind), None)
        }
    }
}

/// Waits between attempts.
pub trait Sleeper {
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send;
}

/// Real waiting on the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

impl Sleeper for TokioSleeper {
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send {
        tokio::time::sleep(duration)
    }
}

/// Runs an operation under a [`RetryPolicy`].
pub struct Retrier<'a, Z> {
    policy: RetryPolicy,
    sleeper: &'a Z,
}

impl<'a, Z: Sleeper> Retrier<'a, Z> {
    pub fn new(policy: RetryPolicy, sleeper: &'a Z) -> Self {
        Self { policy, sleeper }
    }

    /// Calls `attempt` with the 1-based attempt number until it succeeds,
    /// fails with a non-retriable classification, or the budget runs out.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Generation`] carrying the last failure's
    /// classification and its user-facing message.
    pub async fn run<T, F, Fut>(&self, mut attempt: F) -> Result<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut n = 1;
        loop {
            let error = match attempt(n).await {
                Ok(value) => {
                    log::debug!("attempt {} succeeded", n);
                    return Ok(value);
                }
                Err(e) => e,
            };

            let detail = error.to_string();
            let kind = error.failure_kind().unwrap_or_else(|| classify_failure(&detail));

            match AttemptState::after_failure(n, kind, &self.policy) {
                (AttemptState::Attempting(next), Some(delay)) => {
                    log::warn!(
                        "attempt {}/{} failed ({}), retrying in {:?}: {}",
                        n,
                        self.policy.max_attempts,
                        kind,
                        delay,
                        detail
                    );
                    self.sleeper.sleep(delay).await;
                    n = next;
                }
                _ => {
                    log::warn!("giving up after attempt {} ({}): {}", n, kind, detail);
                    return Err(AppError::Generation {
                        kind,
                        message: kind.user_message(&detail),
                    });
                }
            }
        }
    }
}

//! Sequential retry with exponential backoff.
//!
//! Attempt `n` (1-indexed) waits `base_delay * 2^(n-1)` before it starts; the
//! first attempt starts immediately. With a 1s base and 3 attempts the
//! schedule is: attempt 1 at t=0, attempt 2 after 2s, attempt 3 after 4s.
//!
//! Attempts never overlap. The error of the final attempt is returned
//! unchanged. A cancelled attempt ends the whole sequence.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::ClientConfig;
use crate::error::{ApiError, ApiResult};

/// Which failures are worth another attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RetryMode {
    /// Retry every failure except cancellation, including 4xx responses.
    #[default]
    Uniform,
    /// Retry only network failures, timeouts, 5xx, 408 and 429.
    TransientOnly,
}

/// Attempt budget and backoff schedule for one logical request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub mode: RetryMode,
}

impl RetryPolicy {
    /// `max_attempts` is clamped to at least one.
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            mode: RetryMode::default(),
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.retry_attempts(), config.retry_delay())
    }

    /// A single attempt.
    pub fn no_retry() -> Self {
        Self::new(1, Duration::ZERO)
    }

    pub fn with_mode(mut self, mode: RetryMode) -> Self {
        self.mode = mode;
        self
    }

    /// Delay to wait before `attempt` (1-indexed). Zero for the first.
    pub fn delay_before_attempt(&self, attempt: u32) -> Duration {
        if attempt <= 1 {
            return Duration::ZERO;
        }
        let factor = 2u32.checked_pow(attempt - 1).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }

    pub fn should_retry(&self, err: &ApiError) -> bool {
        if err.is_cancelled() {
            return false;
        }
        match self.mode {
            RetryMode::Uniform => true,
            RetryMode::TransientOnly => err.is_retryable(),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(
            crate::config::DEFAULT_RETRY_ATTEMPTS,
            crate::config::DEFAULT_RETRY_DELAY,
        )
    }
}

/// Run `op` until it succeeds, the budget runs out, or it fails with an
/// error the policy does not retry.
///
/// `op` receives the 1-indexed attempt number. When `cancel` fires during a
/// backoff sleep the sequence ends with a cancellation error.
pub async fn retry_with_backoff<T, F, Fut>(
    policy: &RetryPolicy,
    cancel: Option<&CancellationToken>,
    mut op: F,
) -> ApiResult<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = ApiResult<T>>,
{
    let mut attempt = 1;
    loop {
        match op(attempt).await {
            Ok(value) => {
                if attempt > 1 {
                    debug!(attempt, "Request succeeded after retry");
                }
                return Ok(value);
            }
            Err(err) => {
                if attempt >= policy.max_attempts || !policy.should_retry(&err) {
                    return Err(err);
                }

                attempt += 1;
                let delay = policy.delay_before_attempt(attempt);
                info!(
                    attempt,
                    max_attempts = policy.max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    status = err.status,
                    error = %err.message,
                    "Retrying request"
                );

                match cancel {
                    Some(token) => {
                        tokio::select! {
                            _ = token.cancelled() => return Err(ApiError::cancelled()),
                            _ = tokio::time::sleep(delay) => {}
                        }
                    }
                    None => tokio::time::sleep(delay).await,
                }
            }
        }
    }
}

//! Retry executor: drives one logical send through bounded physical
//! attempts with exponential backoff, rate-limit awareness, and cancellable
//! waits.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::error::PushError;

/// Backoff configuration for one client.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of retries after the initial attempt. `0` disables
    /// retrying entirely.
    pub max_retries: u32,
    /// First-retry delay for the plain exponential sequence.
    pub base_delay: Duration,
    /// Hard cap on any computed or server-provided delay.
    pub max_delay: Duration,
    /// First-retry delay after a rate limit with no usable server hint.
    pub rate_limit_first_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            rate_limit_first_delay: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    pub fn with_max_retries(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Default::default()
        }
    }

    /// Delay to wait after the failed attempt `attempt` (0-indexed).
    ///
    /// Rate-limit failures prefer a positive server hint, capped at
    /// `max_delay`; absent a hint, the first rate-limit retry waits
    /// `rate_limit_first_delay`. Everything else follows
    /// `base_delay * 2^attempt`, capped.
    fn delay_after_attempt(&self, attempt: u32, error: &PushError) -> Duration {
        if let PushError::RateLimited { retry_after, .. } = error {
            if let Some(hint) = retry_after
                && *hint > Duration::ZERO
            {
                return (*hint).min(self.max_delay);
            }
            if attempt == 0 {
                return self.rate_limit_first_delay.min(self.max_delay);
            }
        }
        // 2^attempt with a saturating shift so huge attempt counts cap out.
        let multiplier = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.base_delay
            .checked_mul(multiplier)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }
}

/// Run `operation` through up to `max_retries + 1` attempts.
///
/// The operation receives the 0-indexed attempt number and returns the
/// classified outcome of one physical attempt. `Cancelled` propagates
/// immediately and is never counted; non-retryable errors propagate
/// immediately; retryable errors consume budget and schedule a cancellable
/// backoff sleep. On exhaustion the last error is returned with the total
/// attempt count stamped into network/timeout kinds.
pub(crate) async fn run_with_retry<F, Fut, T>(
    policy: &RetryPolicy,
    token: &CancellationToken,
    operation: F,
) -> Result<T, PushError>
where
    F: Fn(u32) -> Fut,
    Fut: Future<Output = Result<T, PushError>>,
{
    let mut attempt: u32 = 0;
    loop {
        if token.is_cancelled() {
            return Err(PushError::Cancelled);
        }

        let error = match operation(attempt).await {
            Ok(value) => return Ok(value),
            Err(PushError::Cancelled) => return Err(PushError::Cancelled),
            Err(error) if !error.is_retryable() => return Err(error),
            Err(error) => error,
        };

        let attempts_made = attempt + 1;
        if attempt >= policy.max_retries {
            return Err(error.with_attempts(attempts_made));
        }

        let delay = policy.delay_after_attempt(attempt, &error);
        warn!(
            attempt = attempts_made,
            max_attempts = policy.max_retries + 1,
            delay_ms = delay.as_millis() as u64,
            error = %error,
            "retrying after transient failure"
        );
        tokio::select! {
            _ = token.cancelled() => return Err(PushError::Cancelled),
            _ = tokio::time::sleep(delay) => {}
        }
        attempt += 1;
    }
}

//! Retry configuration, delay calculation and the retry loop.
//!
//! A call moves through `Sent -> Success | Failed`, with
//! `Failed -> Backoff -> Sent` when [`RetryConfig::next_step()`] allows
//! another attempt. Attempts are strictly sequential: attempt N+1 starts
//! only after attempt N's failure is observed and the backoff has elapsed.
//!
//! Sleeping goes through the [`Sleeper`] trait so tests can observe the
//! backoff schedule without waiting for it.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use tracing::warn;

use crate::telemetry;
use crate::{GatewayError, Result};

/// Configuration for retry behaviour on upstream 500s.
///
/// Uses exponential backoff plus a small random offset so that concurrent
/// callers failing together do not retry in lockstep:
///
/// ```rust
/// # use straico_gateway::RetryConfig;
/// # use std::time::Duration;
/// let config = RetryConfig::new()
///     .max_attempts(3)
///     .initial_delay(Duration::from_millis(500))
///     .jitter(Duration::from_millis(100));
/// ```
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts (including the initial request).
    /// 1 = no retry. Default: 3.
    pub max_attempts: u32,
    /// Base delay before the first retry. Default: 500ms.
    pub initial_delay: Duration,
    /// Maximum backoff between retries, before jitter. Default: 30s.
    pub max_delay: Duration,
    /// Upper bound (exclusive) of the random offset added to each delay.
    /// `Duration::ZERO` disables jitter. Default: 100ms.
    pub jitter: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            jitter: Duration::from_millis(100),
        }
    }
}

/// What to do after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryStep {
    /// Sleep for the given delay, then send again.
    Retry(Duration),
    /// Surface the error unchanged.
    GiveUp,
}

impl RetryConfig {
    /// Create a new config with the default policy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a config that disables retries (single attempt).
    pub fn disabled() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Set maximum attempts (including the initial request).
    pub fn max_attempts(mut self, n: u32) -> Self {
        self.max_attempts = n;
        self
    }

    /// Set the base delay before the first retry.
    pub fn initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Set the maximum delay between retries.
    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Set the jitter bound; `Duration::ZERO` disables jitter.
    pub fn jitter(mut self, bound: Duration) -> Self {
        self.jitter = bound;
        self
    }

    /// Calculate the backoff for a given attempt number (0-indexed).
    ///
    /// Uses exponential backoff: `initial_delay * 2^attempt`, capped at `max_delay`.
    /// Does NOT include jitter; see [`effective_delay()`](Self::effective_delay)
    /// for the full calculation.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let delay = self
            .initial_delay
            .saturating_mul(2u32.saturating_pow(attempt));
        delay.min(self.max_delay)
    }

    /// Backoff plus a random offset in `[0, jitter)`.
    pub fn effective_delay(&self, attempt: u32) -> Duration {
        let base = self.delay_for_attempt(attempt);
        if self.jitter.is_zero() {
            return base;
        }
        let offset = rand::rng().random_range(Duration::ZERO..self.jitter);
        base + offset
    }

    /// Transition out of a failed attempt (0-indexed).
    pub fn next_step(&self, attempt: u32, error: &GatewayError) -> RetryStep {
        if error.is_retryable() && attempt + 1 < self.max_attempts {
            RetryStep::Retry(self.effective_delay(attempt))
        } else {
            RetryStep::GiveUp
        }
    }
}

/// Suspends the current call between retry attempts.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// [`Sleeper`] backed by the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Execute an async operation with retry logic.
///
/// Retries errors classified by [`GatewayError::is_retryable()`] up to
/// `config.max_attempts`. Anything else is returned immediately, and the
/// last error propagates unchanged once attempts run out.
pub(crate) async fn with_retry<F, Fut, T>(
    config: &RetryConfig,
    sleeper: &dyn Sleeper,
    endpoint: &'static str,
    f: F,
) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0;
    loop {
        let error = match f().await {
            Ok(result) => return Ok(result),
            Err(e) => e,
        };
        match config.next_step(attempt, &error) {
            RetryStep::GiveUp => return Err(error),
            RetryStep::Retry(delay) => {
                metrics::counter!(telemetry::RETRIES_TOTAL, "endpoint" => endpoint).increment(1);
                warn!(
                    endpoint,
                    attempt = attempt + 1,
                    max_attempts = config.max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %error,
                    "retrying after upstream error"
                );
                sleeper.sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

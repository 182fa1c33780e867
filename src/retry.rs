//! Exponential backoff retry loop.
//!
//! Each attempt yields an [`Outcome`]. Success and fatal outcomes end the
//! loop at once. A rate-limited outcome sleeps for exactly the server's
//! delay; a transient one sleeps for the next exponential interval. Both
//! kinds of wait draw from the same elapsed-time budget, and both race the
//! caller's cancellation token.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::classify::Outcome;
use crate::error::{FetchError, Result};

/// Exponential backoff parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackoffConfig {
    /// Wait before the first retry.
    pub initial_interval: Duration,
    /// Growth factor applied per transient failure.
    pub multiplier: f64,
    /// Jitter as a fraction of the interval: a value of 0.5 spreads each
    /// wait over `[0.5 * d, 1.5 * d]`. Zero disables jitter.
    pub randomization_factor: f64,
    /// Cap on a single exponential interval.
    pub max_interval: Duration,
    /// Budget for the whole sequence of attempts and waits.
    pub max_elapsed_time: Duration,
}

impl BackoffConfig {
    pub const DEFAULT: Self = Self {
        initial_interval: Duration::from_millis(500),
        multiplier: 1.5,
        randomization_factor: 0.5,
        max_interval: Duration::from_secs(60),
        max_elapsed_time: Duration::from_secs(15 * 60),
    };

    /// Un-jittered wait after the `retry`-th transient failure (0-indexed):
    /// `initial_interval * multiplier^retry`, capped at `max_interval`.
    pub fn delay_for_attempt(&self, retry: u32) -> Duration {
        let exponent = i32::try_from(retry).unwrap_or(i32::MAX);
        let secs = self.initial_interval.as_secs_f64() * self.multiplier.powi(exponent);
        let capped = secs.min(self.max_interval.as_secs_f64());
        if capped.is_finite() && capped >= 0.0 {
            Duration::from_secs_f64(capped)
        } else {
            self.max_interval
        }
    }

    fn jittered(&self, delay: Duration) -> Duration {
        let factor = self.randomization_factor;
        if !factor.is_finite() || factor <= 0.0 {
            return delay;
        }
        let factor = factor.min(1.0);
        if delay.is_zero() {
            return delay;
        }
        let secs = delay.as_secs_f64();
        let low = secs * (1.0 - factor);
        let high = secs * (1.0 + factor);
        Duration::from_secs_f64(rand::thread_rng().gen_range(low..=high))
    }
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Drives `attempt` until it succeeds, fails fatally, the budget runs out or
/// `cancel` fires. The closure receives the 1-based attempt number.
pub async fn retry_with_backoff<T, F, Fut>(
    config: &BackoffConfig,
    cancel: &CancellationToken,
    mut attempt: F,
) -> Result<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Outcome<T>>,
{
    let start = Instant::now();
    let mut attempts = 0u32;
    let mut transient_failures = 0u32;

    loop {
        if cancel.is_cancelled() {
            return Err(FetchError::Cancelled);
        }
        attempts += 1;
        debug!(attempt = attempts, "starting attempt");

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(FetchError::Cancelled),
            outcome = attempt(attempts) => outcome,
        };

        let (delay, failure) = match outcome {
            Outcome::Success(value) => return Ok(value),
            Outcome::Fatal(err) => {
                warn!(attempt = attempts, error = %err, "attempt failed, not retrying");
                return Err(err);
            }
            Outcome::RateLimited(delay) => (delay, FetchError::RateLimited { retry_after: delay }),
            Outcome::Transient(err) => {
                let delay = config.jittered(config.delay_for_attempt(transient_failures));
                transient_failures += 1;
                (delay, err)
            }
        };

        let elapsed = start.elapsed();
        let over_budget = elapsed
            .checked_add(delay)
            .map_or(true, |total| total > config.max_elapsed_time);
        if over_budget {
            warn!(
                attempts,
                elapsed_ms = elapsed.as_millis() as u64,
                error = %failure,
                "retry budget exhausted"
            );
            return Err(FetchError::RetriesExhausted {
                attempts,
                elapsed,
                last: Box::new(failure),
            });
        }

        warn!(
            attempt = attempts,
            delay_ms = delay.as_millis() as u64,
            error = %failure,
            "attempt failed, retrying"
        );

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(FetchError::Cancelled),
            _ = tokio::time::sleep(delay) => {}
        }
    }
}

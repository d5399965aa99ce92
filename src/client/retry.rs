//! Exponential backoff for transient remote failures.

use std::time::Duration;

use rand::Rng;
use tracing::warn;

use crate::error::SyncError;

/// Retry policy applied by the upsert engine around remote calls.
///
/// Delay for attempt `n` is `base_delay * 2^(n-1)` plus a random jitter of up
/// to `jitter` times the computed delay. Only errors classified transient by
/// [`SyncError::is_transient`] are retried.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    attempts: u32,
    base_delay: Duration,
    jitter: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            base_delay: Duration::from_millis(500),
            jitter: 0.1,
        }
    }
}

impl RetryPolicy {
    pub fn new(attempts: u32, base_delay: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            base_delay,
            jitter: 0.1,
        }
    }

    /// Disable jitter; used by tests that assert exact delays.
    pub fn without_jitter(mut self) -> Self {
        self.jitter = 0.0;
        self
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Delay before the retry following the given 1-based attempt.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exp = self.base_delay.as_secs_f64() * 2f64.powi(attempt.saturating_sub(1) as i32);
        let max_jitter = self.jitter * exp;
        let jitter = if max_jitter > 0.0 {
            rand::rng().random_range(0.0..max_jitter)
        } else {
            0.0
        };
        Duration::from_secs_f64(exp + jitter)
    }

    /// Run `operation` until it succeeds, fails non-transiently, or the
    /// attempt budget is spent. The final error is returned unchanged so the
    /// caller can attach its own context.
    pub fn run<T, F>(&self, label: &str, mut operation: F) -> Result<T, SyncError>
    where
        F: FnMut() -> Result<T, SyncError>,
    {
        let mut attempt = 1;
        loop {
            match operation() {
                Ok(value) => return Ok(value),
                Err(err) if err.is_transient() && attempt < self.attempts => {
                    let delay = self.delay_for(attempt);
                    warn!(
                        "Transient error on {} (attempt {}/{}): {}; retrying in {:.2}s",
                        label,
                        attempt,
                        self.attempts,
                        err,
                        delay.as_secs_f64()
                    );
                    std::thread::sleep(delay);
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

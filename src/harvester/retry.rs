//! Retry policy for listing and detail fetches
//!
//! A [`RetryPolicy`] retries only the error kinds it was given, a bounded
//! number of times, sleeping with exponential backoff in between. Errors
//! outside the set are returned on first occurrence, and an exhausted policy
//! hands back the last error unchanged.

use crate::config::RetryConfig;
use crate::{ErrorKind, HarvestError};
use std::future::Future;
use std::time::Duration;

/// Kinds every network call is retried on
pub const TRANSIENT_KINDS: &[ErrorKind] =
    &[ErrorKind::Timeout, ErrorKind::Status, ErrorKind::Transport];

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
    max_delay: Duration,
    retry_on: Vec<ErrorKind>,
    caps: Vec<(ErrorKind, u32)>,
}

impl RetryPolicy {
    /// Creates a policy retrying on [`TRANSIENT_KINDS`]
    ///
    /// `max_attempts` counts the first attempt; zero is treated as one.
    pub fn new(max_attempts: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            max_delay: max_delay.max(base_delay),
            retry_on: TRANSIENT_KINDS.to_vec(),
            caps: Vec::new(),
        }
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(
            config.max_attempts,
            Duration::from_millis(config.backoff_ms),
            Duration::from_millis(config.max_backoff_ms),
        )
    }

    /// Replaces the set of retryable kinds
    pub fn retrying(mut self, kinds: &[ErrorKind]) -> Self {
        self.retry_on = kinds.to_vec();
        self
    }

    /// Limits attempts for one error kind below the overall maximum
    pub fn capping(mut self, kind: ErrorKind, max_attempts: u32) -> Self {
        self.caps.retain(|(capped, _)| *capped != kind);
        self.caps.push((kind, max_attempts.max(1)));
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Attempts allowed while `kind` keeps failing
    pub fn attempts_for(&self, kind: ErrorKind) -> u32 {
        self.caps
            .iter()
            .find(|(capped, _)| *capped == kind)
            .map_or(self.max_attempts, |(_, cap)| (*cap).min(self.max_attempts))
    }

    pub fn is_retryable(&self, error: &HarvestError) -> bool {
        self.retry_on.contains(&error.kind())
    }

    /// Delay before retry number `retry` (0-based), capped at the maximum
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 1u32.checked_shl(retry).unwrap_or(u32::MAX);
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }

    /// Runs `operation` until it succeeds, fails permanently, or attempts run out
    pub async fn run<T, F, Fut>(&self, mut operation: F) -> Result<T, HarvestError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, HarvestError>>,
    {
        let mut attempt = 1u32;

        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    if !self.is_retryable(&err) || attempt >= self.attempts_for(err.kind()) {
                        return Err(err);
                    }

                    let delay = self.delay_for(attempt - 1);
                    tracing::warn!(
                        attempt,
                        max_attempts = self.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "transient failure, retrying after backoff"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

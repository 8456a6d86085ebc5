//! Bounded retry with jitter for capability calls
//!
//! Every attempt races a timeout; an elapsed timeout becomes
//! [`CapabilityError::Timeout`] and is handled like any other transient
//! failure. Permanent failures return immediately.

use crate::throttle;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use veracity_domain::CapabilityError;

/// Retry policy for one kind of capability call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,

    /// Backoff before the first retry (milliseconds)
    pub initial_backoff_ms: u64,

    /// Backoff ceiling (milliseconds)
    pub max_backoff_ms: u64,

    /// Backoff growth per retry
    pub backoff_multiplier: f64,

    /// Add up to 25% random jitter to each backoff
    pub jitter: bool,

    /// Whether throttling errors are retried
    pub retry_throttled: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 1,
            initial_backoff_ms: 250,
            max_backoff_ms: 2_000,
            backoff_multiplier: 2.0,
            jitter: true,
            retry_throttled: true,
        }
    }
}

impl RetryPolicy {
    /// Single attempt, no retries
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Default::default()
        }
    }

    /// Leave throttling to the caller (e.g. a concurrency ratchet)
    pub fn without_throttle_retry(mut self) -> Self {
        self.retry_throttled = false;
        self
    }

    /// Validate the policy
    pub fn validate(&self) -> Result<(), String> {
        if self.max_retries > 5 {
            return Err(format!("max_retries must be at most 5, got {}", self.max_retries));
        }
        if self.backoff_multiplier < 1.0 || !self.backoff_multiplier.is_finite() {
            return Err(format!(
                "backoff_multiplier must be >= 1.0, got {}",
                self.backoff_multiplier
            ));
        }
        if self.initial_backoff_ms > self.max_backoff_ms {
            return Err(format!(
                "initial_backoff_ms ({}) must not exceed max_backoff_ms ({})",
                self.initial_backoff_ms, self.max_backoff_ms
            ));
        }
        Ok(())
    }

    /// Whether this error should be retried under the policy
    pub fn is_retryable(&self, err: &CapabilityError) -> bool {
        match err {
            CapabilityError::Throttled(_) => self.retry_throttled,
            CapabilityError::Timeout(_) | CapabilityError::Malformed(_) => true,
            CapabilityError::Failed(_) | CapabilityError::Unavailable(_) => false,
        }
    }

    /// Backoff before retry number `attempt` (0-based), jitter excluded
    pub fn base_backoff_ms(&self, attempt: u32) -> u64 {
        let base = self.initial_backoff_ms as f64 * self.backoff_multiplier.powi(attempt as i32);
        base.min(self.max_backoff_ms as f64) as u64
    }

    fn backoff_ms(&self, attempt: u32) -> u64 {
        let capped = self.base_backoff_ms(attempt);
        if self.jitter && capped > 0 {
            let extra = rand::rng().random_range(0.0..0.25);
            capped + (capped as f64 * extra) as u64
        } else {
            capped
        }
    }
}

/// Race a single future against a timeout
pub async fn with_timeout<T, Fut>(timeout: Duration, fut: Fut) -> Result<T, CapabilityError>
where
    Fut: Future<Output = Result<T, CapabilityError>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result.map_err(throttle::classify),
        Err(_) => Err(CapabilityError::Timeout(timeout.as_millis() as u64)),
    }
}

/// Run `operation` with a per-attempt timeout and bounded retries
///
/// Errors are classified before the retry decision, so a generic failure
/// carrying a throttling signature is treated as throttling.
pub async fn with_retry<F, Fut, T>(
    policy: &RetryPolicy,
    timeout: Duration,
    operation: F,
) -> Result<T, CapabilityError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, CapabilityError>>,
{
    let mut attempt = 0;
    loop {
        match with_timeout(timeout, operation()).await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if attempt >= policy.max_retries || !policy.is_retryable(&err) {
                    return Err(err);
                }

                let backoff_ms = policy.backoff_ms(attempt);
                tracing::warn!(
                    attempt = attempt + 1,
                    max = policy.max_retries,
                    backoff_ms,
                    error = %err,
                    "Retrying capability call after transient error"
                );
                tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                attempt += 1;
            }
        }
    }
}

//! Bounded retry with exponential backoff for the egress sink and HTTP downloads.

use std::thread;
use std::time::Duration;

use super::{BlobLocation, BlobSink};
use crate::config::{MAX_RETRIES, RETRY_BASE_DELAY_MS};
use crate::error::{ExportError, Result};

/// How often and how patiently to retry a publish or download.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles after each further failure.
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// Single attempt, no waiting.
    #[must_use]
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
        }
    }

    /// Delay before the given (zero-based) attempt.
    #[must_use]
    pub fn delay_before(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        self.base_delay
            .saturating_mul(1u32.checked_shl(attempt - 1).unwrap_or(u32::MAX))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: MAX_RETRIES,
            base_delay: Duration::from_millis(RETRY_BASE_DELAY_MS),
        }
    }
}

/// Publish a blob, retrying transient sink failures.
///
/// # Errors
/// `ExportError::Sink` once attempts run out, or immediately for a failure
/// that retrying can't fix.
pub fn publish_with_retry(
    sink: &dyn BlobSink,
    location: &BlobLocation,
    bytes: &[u8],
    policy: RetryPolicy,
) -> Result<()> {
    let max_attempts = policy.max_attempts.max(1);
    let mut last_error = String::new();

    for attempt in 0..max_attempts {
        let delay = policy.delay_before(attempt);
        if !delay.is_zero() {
            tracing::debug!(attempt, delay_ms = delay.as_millis() as u64, "Retrying after delay");
            thread::sleep(delay);
        }

        match sink.put(location, bytes) {
            Ok(()) => return Ok(()),
            Err(e) if e.is_transient() => {
                tracing::warn!(
                    error = %e,
                    location = %location,
                    attempt = attempt + 1,
                    max_attempts,
                    "Publish failed, will retry"
                );
                last_error = e.to_string();
            }
            Err(e) => {
                return Err(ExportError::Sink {
                    key: location.key.clone(),
                    attempts: attempt + 1,
                    message: e.to_string(),
                });
            }
        }
    }

    Err(ExportError::Sink {
        key: location.key.clone(),
        attempts: max_attempts,
        message: last_error,
    })
}

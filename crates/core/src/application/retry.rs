// Retry logic for source page fetches
use crate::domain::RetryConfig;
use crate::port::FetchError;
use std::time::Duration;
use tracing::{info, warn};

/// Retry decision result
#[derive(Debug, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry the page after the backoff delay
    Retry(Duration),
    /// Do not retry; record the page as failed
    GiveUp,
}

/// Bounded exponential backoff for one source.
///
/// Determines if a failed page fetch should be retried based on:
/// - Attempts made so far
/// - Maximum attempts allowed
/// - Whether the error is transient
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay_ms: u64,
    max_delay_ms: u64,
    backoff_factor: f64,
    jitter_factor: f64,
}

impl RetryPolicy {
    /// Create a policy from configuration.
    ///
    /// `seed_key` (the source name) seeds a deterministic ±10% jitter so
    /// sources that fail together do not retry in lockstep.
    pub fn from_config(config: &RetryConfig, seed_key: &str) -> Self {
        let jitter_seed = seed_key.chars().map(|c| c as u32).sum::<u32>();
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay_ms: config.base_delay_ms,
            max_delay_ms: config.max_delay_ms.max(config.base_delay_ms),
            backoff_factor: config.backoff_factor,
            jitter_factor: 0.9 + ((jitter_seed % 21) as f64 / 100.0), // 0.9 to 1.1
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Backoff before retry number `attempt` (1-based count of failures so far).
    ///
    /// delay = base_delay * backoff_factor^(attempt - 1) * jitter, capped at max_delay
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let raw = self.base_delay_ms as f64 * self.backoff_factor.powi(exponent) * self.jitter_factor;
        let capped = raw.min(self.max_delay_ms as f64).max(0.0);
        Duration::from_millis(capped as u64)
    }

    /// Decide whether to retry after `attempts` failed tries of the same page
    pub fn should_retry(&self, source: &str, attempts: u32, error: &FetchError) -> RetryDecision {
        if !error.is_transient() {
            warn!(source = %source, error = %error, "Permanent fetch error, not retrying");
            return RetryDecision::GiveUp;
        }

        if attempts >= self.max_attempts {
            warn!(
                source = %source,
                attempts = %attempts,
                max_attempts = %self.max_attempts,
                "Max retry attempts reached"
            );
            return RetryDecision::GiveUp;
        }

        let delay = self.delay_for(attempts);
        info!(
            source = %source,
            attempt = %attempts,
            max_attempts = %self.max_attempts,
            delay_ms = %delay.as_millis(),
            error = %error,
            "Scheduling retry"
        );

        RetryDecision::Retry(delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> RetryConfig {
        RetryConfig {
            max_attempts: 5,
            base_delay_ms: 1000,
            max_delay_ms: 10_000,
            backoff_factor: 2.0,
        }
    }

    fn network() -> FetchError {
        FetchError::Network("reset".to_string())
    }

    #[test]
    fn test_backoff_grows_exponentially_within_jitter() {
        let policy = RetryPolicy::from_config(&config(), "remoteok");

        for (attempt, expected_ms) in [(1u32, 1000.0), (2, 2000.0), (3, 4000.0)] {
            let delay = policy.delay_for(attempt).as_millis() as f64;
            assert!(
                delay >= expected_ms * 0.9 && delay <= expected_ms * 1.1,
                "attempt {attempt}: {delay}ms"
            );
        }
    }

    #[test]
    fn test_backoff_is_capped() {
        let policy = RetryPolicy::from_config(&config(), "remoteok");
        assert_eq!(policy.delay_for(20), Duration::from_millis(10_000));
    }

    #[test]
    fn test_jitter_is_deterministic_per_source() {
        let a = RetryPolicy::from_config(&config(), "remoteok");
        let b = RetryPolicy::from_config(&config(), "remoteok");
        assert_eq!(a.delay_for(2), b.delay_for(2));
    }

    #[test]
    fn test_gives_up_after_max_attempts() {
        let policy = RetryPolicy::from_config(&config(), "rss");

        assert!(matches!(
            policy.should_retry("rss", 4, &network()),
            RetryDecision::Retry(_)
        ));
        assert_eq!(policy.should_retry("rss", 5, &network()), RetryDecision::GiveUp);
    }

    #[test]
    fn test_permanent_errors_are_not_retried() {
        let policy = RetryPolicy::from_config(&config(), "rss");
        let not_found = FetchError::Http {
            status: 404,
            message: "gone".to_string(),
        };
        assert_eq!(policy.should_retry("rss", 1, &not_found), RetryDecision::GiveUp);
    }
}

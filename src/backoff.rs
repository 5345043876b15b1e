//! Exponential backoff for transient failures.
//!
//! Used by the AI client between retry attempts and by the sync scheduler
//! to avoid hammering the backend while a flush keeps failing.

use std::time::Duration;

use tokio::time::Instant;

/// Exponential backoff state.
///
/// Doubles the delay on each failure up to a maximum cap.
/// Resets to the base delay on success.
#[derive(Debug, Clone)]
pub struct ExponentialBackoff {
    /// Base delay (first retry)
    base_delay: Duration,
    /// Current delay (increases on each failure)
    current_delay: Duration,
    /// Maximum delay cap
    max_delay: Duration,
    /// Number of consecutive failures
    failure_count: u32,
    /// Time of last failure (for calculating next retry time)
    last_failure: Option<Instant>,
}

impl ExponentialBackoff {
    /// Create a new backoff with default settings.
    ///
    /// Default: 1s base, 30s max — tuned for interactive request retries.
    pub fn new() -> Self {
        Self::with_config(Duration::from_secs(1), Duration::from_secs(30))
    }

    /// Create a new backoff with custom settings.
    pub fn with_config(base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            base_delay,
            current_delay: base_delay,
            max_delay,
            failure_count: 0,
            last_failure: None,
        }
    }

    /// Record a failure and advance the backoff.
    ///
    /// Doubles the current delay up to the maximum.
    pub fn record_failure(&mut self) {
        self.failure_count += 1;
        self.last_failure = Some(Instant::now());
        self.current_delay = (self.current_delay * 2).min(self.max_delay);
        tracing::warn!(
            "Attempt {} failed, next retry in {:?}",
            self.failure_count,
            self.current_delay
        );
    }

    /// Reset backoff on success.
    ///
    /// Returns to the base delay and clears the failure count.
    pub fn reset(&mut self) {
        if self.failure_count > 0 {
            tracing::info!("Operation succeeded, resetting backoff");
        }
        self.failure_count = 0;
        self.current_delay = self.base_delay;
        self.last_failure = None;
    }

    /// Check if we're currently in a backoff period.
    pub fn is_in_backoff(&self) -> bool {
        if let Some(last_failure) = self.last_failure {
            last_failure.elapsed() < self.current_delay
        } else {
            false
        }
    }

    /// Time remaining until the backoff expires.
    ///
    /// Returns `None` if not in a backoff period.
    pub fn time_until_retry(&self) -> Option<Duration> {
        self.last_failure.and_then(|last| {
            let elapsed = last.elapsed();
            if elapsed < self.current_delay {
                Some(self.current_delay - elapsed)
            } else {
                None
            }
        })
    }

    /// Current consecutive failure count.
    pub fn failure_count(&self) -> u32 {
        self.failure_count
    }

    /// Current delay duration.
    pub fn current_delay(&self) -> Duration {
        self.current_delay
    }
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_doubles_up_to_cap() {
        let mut backoff =
            ExponentialBackoff::with_config(Duration::from_secs(1), Duration::from_secs(4));

        assert_eq!(backoff.current_delay(), Duration::from_secs(1));
        backoff.record_failure();
        assert_eq!(backoff.current_delay(), Duration::from_secs(2));
        backoff.record_failure();
        assert_eq!(backoff.current_delay(), Duration::from_secs(4));
        backoff.record_failure();
        assert_eq!(backoff.current_delay(), Duration::from_secs(4));
        assert_eq!(backoff.failure_count(), 3);
    }

    #[test]
    fn test_reset_returns_to_base() {
        let mut backoff =
            ExponentialBackoff::with_config(Duration::from_secs(1), Duration::from_secs(60));
        backoff.record_failure();
        backoff.record_failure();
        backoff.reset();
        assert_eq!(backoff.current_delay(), Duration::from_secs(1));
        assert_eq!(backoff.failure_count(), 0);
        assert!(!backoff.is_in_backoff());
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_window_opens_and_expires() {
        let mut backoff =
            ExponentialBackoff::with_config(Duration::from_secs(30), Duration::from_secs(60));
        assert!(!backoff.is_in_backoff());

        backoff.record_failure();
        assert!(backoff.is_in_backoff());
        assert!(backoff.time_until_retry().is_some());

        tokio::time::sleep(Duration::from_secs(61)).await;
        assert!(!backoff.is_in_backoff());
        assert_eq!(backoff.time_until_retry(), None);
    }
}

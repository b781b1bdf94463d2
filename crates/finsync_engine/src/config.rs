//! Configuration for the sync engine.

use std::time::Duration;

/// Configuration for sync runs.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Remote ledger base URL (used by the HTTP remote ledger).
    pub remote_url: String,
    /// Timeout applied to each remote call.
    pub timeout: Duration,
    /// Retry behavior for retryable remote-call errors.
    pub retry: RetryConfig,
    /// Maximum records pushed per entity type per run (0 = unlimited).
    pub push_batch_size: usize,
}

impl SyncConfig {
    /// Creates a new sync configuration.
    pub fn new(remote_url: impl Into<String>) -> Self {
        Self {
            remote_url: remote_url.into(),
            timeout: Duration::from_secs(30),
            retry: RetryConfig::no_retry(),
            push_batch_size: 0,
        }
    }

    /// Sets the per-call timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the retry configuration.
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Sets the push batch size.
    pub fn with_push_batch_size(mut self, size: usize) -> Self {
        self.push_batch_size = size;
        self
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self::new("")
    }
}

/// Configuration for retry behavior.
///
/// Retries apply to a single remote call. A run as a whole is never
/// retried automatically. The delay doubles per attempt up to `max_delay`.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts (1 = no retry).
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Upper bound on any single delay, before jitter.
    pub max_delay: Duration,
    /// Whether to add up to 25% random jitter to each delay.
    pub add_jitter: bool,
}

impl RetryConfig {
    /// Creates a configuration allowing `max_attempts` attempts per call.
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(10),
            add_jitter: true,
        }
    }

    /// Creates a configuration with no retries.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            add_jitter: false,
        }
    }

    /// Sets the delay before the first retry.
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Disables jitter.
    pub fn without_jitter(mut self) -> Self {
        self.add_jitter = false;
        self
    }

    /// Delay to wait before `attempt` (0 is the first call and never waits).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        let factor = 1u32 << (attempt - 1).min(16);
        let delay = self.initial_delay.saturating_mul(factor).min(self.max_delay);
        if self.add_jitter {
            delay + delay.mul_f64(0.25 * rand::random::<f64>())
        } else {
            delay
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::no_retry()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sync_config_builder() {
        let config = SyncConfig::new("https://ledger.example.com")
            .with_timeout(Duration::from_secs(5))
            .with_push_batch_size(50)
            .with_retry(RetryConfig::new(3));

        assert_eq!(config.remote_url, "https://ledger.example.com");
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.push_batch_size, 50);
        assert_eq!(config.retry.max_attempts, 3);
    }

    #[test]
    fn default_never_retries() {
        let config = SyncConfig::default();
        assert_eq!(config.retry.max_attempts, 1);
        assert_eq!(config.push_batch_size, 0);
    }

    #[test]
    fn zero_attempts_is_clamped() {
        assert_eq!(RetryConfig::new(0).max_attempts, 1);
    }

    #[test]
    fn retry_delay_doubles() {
        let config = RetryConfig::new(5).with_initial_delay(Duration::from_millis(100));

        assert_eq!(config.delay_for_attempt(0), Duration::ZERO);

        let delay1 = config.delay_for_attempt(1);
        assert!(delay1 >= Duration::from_millis(100));
        assert!(delay1 <= Duration::from_millis(125));

        let delay3 = config.without_jitter().delay_for_attempt(3);
        assert_eq!(delay3, Duration::from_millis(400));
    }

    #[test]
    fn retry_delay_respects_max() {
        let config = RetryConfig {
            max_delay: Duration::from_secs(5),
            ..RetryConfig::new(10)
                .with_initial_delay(Duration::from_secs(1))
                .without_jitter()
        };

        assert_eq!(config.delay_for_attempt(6), Duration::from_secs(5));
        assert_eq!(config.delay_for_attempt(40), Duration::from_secs(5));
    }

    #[test]
    fn no_retry_never_waits() {
        assert_eq!(RetryConfig::no_retry().delay_for_attempt(3), Duration::ZERO);
    }
}

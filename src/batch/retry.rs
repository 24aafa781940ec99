use std::time::Duration;

/// How often, and how patiently, a failing batch is retried.
///
/// The delay before the `k`-th retry is `cooldown * backoff_factor^(k-1)`,
/// capped at `max_cooldown`. A `backoff_factor` of 1 gives a fixed cooldown.
/// `max_attempts` counts every attempt of a batch, the first one included;
/// `0` retries forever.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub cooldown: Duration,
    pub backoff_factor: u32,
    pub max_cooldown: Duration,
}

impl RetryPolicy {
    /// Retry forever after a fixed cooldown.
    pub fn unbounded(cooldown: Duration) -> Self {
        Self {
            max_attempts: 0,
            cooldown,
            backoff_factor: 1,
            max_cooldown: cooldown,
        }
    }

    /// Whether a batch that has failed `failures` times may be attempted again.
    pub fn allows_retry(&self, failures: u32) -> bool {
        self.max_attempts == 0 || failures < self.max_attempts
    }

    /// Delay before the attempt following the `failures`-th failure.
    pub fn delay(&self, failures: u32) -> Duration {
        let factor = self
            .backoff_factor
            .saturating_pow(failures.saturating_sub(1));
        self.cooldown.saturating_mul(factor).min(self.max_cooldown)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            cooldown: Duration::from_secs(300),
            backoff_factor: 2,
            max_cooldown: Duration::from_secs(3600),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exponential_backoff_is_capped() {
        let policy = RetryPolicy::default();
        let delays: Vec<u64> = (1..=6).map(|k| policy.delay(k).as_secs()).collect();
        assert_eq!(delays, [300, 600, 1200, 2400, 3600, 3600]);
    }

    #[test]
    fn test_attempt_ceiling() {
        let policy = RetryPolicy {
            max_attempts: 3,
            ..RetryPolicy::default()
        };
        assert!(policy.allows_retry(1));
        assert!(policy.allows_retry(2));
        assert!(!policy.allows_retry(3));
    }

    #[test]
    fn test_unbounded_fixed_cooldown() {
        let policy = RetryPolicy::unbounded(Duration::from_secs(300));
        assert!(policy.allows_retry(u32::MAX));
        assert_eq!(policy.delay(1), Duration::from_secs(300));
        assert_eq!(policy.delay(50), Duration::from_secs(300));
    }
}

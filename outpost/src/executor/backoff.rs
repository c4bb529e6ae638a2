use outpost_config::shared::BackoffConfig;

/// Strategy for computing the delay before a retry attempt.
///
/// Implementations must be monotonically non-decreasing in `attempt` up to a
/// cap, and deterministic with respect to their input. The strategy is only
/// consulted when the failed task does not suggest its own delay.
pub trait BackoffStrategy: Send + Sync {
    /// Returns the delay, in milliseconds, before retry number `attempt + 1`.
    ///
    /// `attempt` is zero-based: the first retry of a task is computed with
    /// `attempt = 0`.
    fn delay(&self, attempt: u32) -> u64;
}

/// Exponential backoff without jitter: `min(base * 2^attempt, ceiling)`.
#[derive(Debug, Clone)]
pub struct ExponentialBackoff {
    base_delay_ms: u64,
    max_delay_ms: u64,
}

impl ExponentialBackoff {
    /// Creates an exponential backoff with the given base and ceiling.
    pub fn new(base_delay_ms: u64, max_delay_ms: u64) -> Self {
        Self {
            base_delay_ms,
            max_delay_ms,
        }
    }
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        BackoffConfig::default().into()
    }
}

impl From<BackoffConfig> for ExponentialBackoff {
    fn from(config: BackoffConfig) -> Self {
        Self::new(config.base_delay_ms, config.max_delay_ms)
    }
}

impl BackoffStrategy for ExponentialBackoff {
    fn delay(&self, attempt: u32) -> u64 {
        // A shift of 64 or more would overflow; any such factor already
        // saturates past the ceiling.
        let factor = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);

        self.base_delay_ms
            .saturating_mul(factor)
            .min(self.max_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doubles_until_ceiling() {
        let backoff = ExponentialBackoff::new(1_000, 60_000);

        assert_eq!(backoff.delay(0), 1_000);
        assert_eq!(backoff.delay(1), 2_000);
        assert_eq!(backoff.delay(2), 4_000);
        assert_eq!(backoff.delay(5), 32_000);
        assert_eq!(backoff.delay(6), 60_000);
        assert_eq!(backoff.delay(7), 60_000);
    }

    #[test]
    fn large_attempts_saturate_instead_of_overflowing() {
        let backoff = ExponentialBackoff::new(1_000, 60_000);

        assert_eq!(backoff.delay(63), 60_000);
        assert_eq!(backoff.delay(64), 60_000);
        assert_eq!(backoff.delay(u32::MAX), 60_000);
    }

    #[test]
    fn is_monotonically_non_decreasing() {
        let backoff = ExponentialBackoff::default();

        let mut previous = 0;
        for attempt in 0..80 {
            let delay = backoff.delay(attempt);
            assert!(delay >= previous);
            previous = delay;
        }
    }
}

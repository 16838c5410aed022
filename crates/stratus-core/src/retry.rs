//! Bounded retry policy for optimistic-concurrency writes.
//!
//! The delay computation is a pure function of the attempt number so it can
//! be tested without sleeping; only [`RetryPolicy::delay_for_attempt`] draws
//! randomness.
//!
//! # Example
//!
//! ```
//! use stratus_core::RetryPolicy;
//! use std::time::Duration;
//!
//! let policy = RetryPolicy::default();
//! let (min, max) = policy.delay_bounds(3);
//! assert_eq!(min, Duration::from_millis(40));
//! assert_eq!(max, Duration::from_millis(320));
//! ```

use std::time::Duration;

use rand::Rng;

/// Retry policy with randomized exponential backoff.
///
/// On attempt *n* (1-indexed) the exponential ceiling is
/// `base_delay * 2^n`, clamped to `max_delay`; the actual sleep is drawn
/// uniformly from the half-open interval `[base_delay, ceiling)`.
/// Randomizing within the bounds keeps concurrent writers contending on the
/// same device from retrying in lockstep.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of commit attempts per reading.
    pub max_attempts: u32,
    /// Lower bound of every delay, and the base of the exponential ceiling.
    pub base_delay: Duration,
    /// Hard cap on the exponential ceiling.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            base_delay: Duration::from_millis(40),
            max_delay: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    /// Create a policy with a custom attempt cap and default delays.
    #[must_use]
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            ..Default::default()
        }
    }

    /// A single attempt, no retries. Useful in tests.
    #[must_use]
    pub fn no_retries() -> Self {
        Self::new(1)
    }

    /// Set the base delay.
    #[must_use]
    pub fn base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    /// Set the delay cap.
    #[must_use]
    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Half-open delay range for a 1-indexed attempt:
    /// `[base_delay, min(max_delay, base_delay * 2^attempt))`.
    #[must_use]
    pub fn delay_bounds(&self, attempt: u32) -> (Duration, Duration) {
        let ceiling = self
            .base_delay
            .saturating_mul(2u32.saturating_pow(attempt))
            .min(self.max_delay);
        (self.base_delay, ceiling)
    }

    /// Sample a concrete delay for an attempt uniformly from its bounds.
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let (lower, upper) = self.delay_bounds(attempt);
        if upper <= lower {
            return lower;
        }
        let millis = rand::rng().random_range(lower.as_millis() as u64..upper.as_millis() as u64);
        Duration::from_millis(millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 10);
        assert_eq!(policy.base_delay, Duration::from_millis(40));
        assert_eq!(policy.max_delay, Duration::from_millis(1000));
    }

    #[test]
    fn test_bounds_double_per_attempt_until_the_cap() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_bounds(1).1, Duration::from_millis(80));
        assert_eq!(policy.delay_bounds(2).1, Duration::from_millis(160));
        assert_eq!(policy.delay_bounds(3).1, Duration::from_millis(320));
        assert_eq!(policy.delay_bounds(4).1, Duration::from_millis(640));
        // 40ms * 2^5 = 1280ms, clamped to the 1000ms cap.
        assert_eq!(policy.delay_bounds(5).1, Duration::from_millis(1000));
        assert_eq!(policy.delay_bounds(10).1, Duration::from_millis(1000));
    }

    #[test]
    fn test_lower_bound_is_always_the_base_delay() {
        let policy = RetryPolicy::default();
        for attempt in 1..=10 {
            assert_eq!(policy.delay_bounds(attempt).0, Duration::from_millis(40));
        }
    }

    #[test]
    fn test_degenerate_range_returns_the_lower_bound() {
        let policy = RetryPolicy::new(3)
            .base_delay(Duration::from_millis(100))
            .max_delay(Duration::from_millis(100));
        assert_eq!(policy.delay_for_attempt(1), Duration::from_millis(100));
    }

    proptest! {
        #[test]
        fn prop_sampled_delay_stays_within_bounds(attempt in 1u32..=10) {
            let policy = RetryPolicy::default();
            let (lower, upper) = policy.delay_bounds(attempt);
            for _ in 0..64 {
                let delay = policy.delay_for_attempt(attempt);
                prop_assert!(delay >= lower);
                prop_assert!(delay < upper);
            }
        }
    }
}

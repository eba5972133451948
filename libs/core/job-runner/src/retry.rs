//! Retry policy: how many attempts a job gets and how long to wait between them.

use std::time::Duration;

/// Delay growth between attempts.
#[derive(Debug, Clone, PartialEq)]
pub enum Backoff {
    /// `base * 2^(attempt - 1)`, capped at `max`
    Exponential { base: Duration, max: Duration },
    /// `attempt^4 + 2` seconds (3s, 18s, 83s, 258s, ...)
    Polynomial,
}

impl Backoff {
    /// Delay after the given (1-based) failed attempt, before jitter.
    pub fn delay(&self, attempt: u32) -> Duration {
        let attempt = attempt.max(1);
        match self {
            Backoff::Exponential { base, max } => {
                let factor = 2u32.saturating_pow(attempt - 1);
                base.saturating_mul(factor).min(*max)
            }
            Backoff::Polynomial => {
                let secs = u64::from(attempt).saturating_pow(4).saturating_add(2);
                Duration::from_secs(secs)
            }
        }
    }
}

/// Retry policy attached to a job type.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,

    /// Delay growth
    pub backoff: Backoff,

    /// Extra random delay as a fraction of the base delay (0.15 = up to +15%)
    jitter: f64,
}

impl RetryPolicy {
    /// Create a policy with the default jitter.
    pub fn new(max_attempts: u32, backoff: Backoff) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
            jitter: 0.15,
        }
    }

    /// Set the jitter fraction, clamped to `[0, 1]`. NaN disables jitter.
    pub fn with_jitter(mut self, jitter: f64) -> Self {
        self.jitter = if jitter.is_nan() {
            0.0
        } else {
            jitter.clamp(0.0, 1.0)
        };
        self
    }

    /// Jitter fraction
    pub fn jitter(&self) -> f64 {
        self.jitter
    }

    /// Disable jitter
    pub fn without_jitter(mut self) -> Self {
        self.jitter = 0.0;
        self
    }

    /// Whether a job that just failed its `attempt`-th execution may run again.
    pub fn can_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }

    /// Delay before the next attempt, jitter included.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let delay = self.backoff.delay(attempt);
        if self.jitter <= 0.0 {
            return delay;
        }

        delay + delay.mul_f64(self.jitter * random_fraction())
    }
}

impl Default for RetryPolicy {
    /// 5 attempts, exponential backoff from 3s capped at 5 minutes.
    fn default() -> Self {
        Self::new(
            5,
            Backoff::Exponential {
                base: Duration::from_secs(3),
                max: Duration::from_secs(300),
            },
        )
    }
}

/// Pseudo-random value in `[0, 1)`, good enough to spread retries apart.
fn random_fraction() -> f64 {
    use std::collections::hash_map::RandomState;
    use std::hash::BuildHasher;

    (RandomState::new().hash_one(std::time::SystemTime::now()) % 10_000) as f64 / 10_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exponential_backoff() {
        let backoff = Backoff::Exponential {
            base: Duration::from_secs(3),
            max: Duration::from_secs(30),
        };

        assert_eq!(backoff.delay(1), Duration::from_secs(3));
        assert_eq!(backoff.delay(2), Duration::from_secs(6));
        assert_eq!(backoff.delay(3), Duration::from_secs(12));
        assert_eq!(backoff.delay(4), Duration::from_secs(24));
        assert_eq!(backoff.delay(5), Duration::from_secs(30)); // Capped at max
        assert_eq!(backoff.delay(64), Duration::from_secs(30));
    }

    #[test]
    fn test_polynomial_backoff() {
        assert_eq!(Backoff::Polynomial.delay(1), Duration::from_secs(3));
        assert_eq!(Backoff::Polynomial.delay(2), Duration::from_secs(18));
        assert_eq!(Backoff::Polynomial.delay(3), Duration::from_secs(83));
    }

    #[test]
    fn test_default_policy_allows_five_attempts() {
        let policy = RetryPolicy::default();

        assert_eq!(policy.max_attempts, 5);
        assert!(policy.can_retry(1));
        assert!(policy.can_retry(4));
        assert!(!policy.can_retry(5));
    }

    #[test]
    fn test_jitter_stays_within_bounds() {
        let policy = RetryPolicy::default().with_jitter(0.5);

        for attempt in 1..=5 {
            let base = policy.backoff.delay(attempt);
            let delay = policy.delay_for_attempt(attempt);
            assert!(delay >= base);
            assert!(delay <= base.mul_f64(1.5));
        }
    }

    #[test]
    fn test_invalid_jitter_is_sanitized() {
        let policy = RetryPolicy::default().with_jitter(f64::NAN);
        assert_eq!(policy.jitter(), 0.0);
        assert_eq!(policy.delay_for_attempt(1), Duration::from_secs(3));

        let policy = RetryPolicy::default().with_jitter(7.0);
        assert_eq!(policy.jitter(), 1.0);

        let policy = RetryPolicy::default().with_jitter(-1.0);
        assert_eq!(policy.delay_for_attempt(2), Duration::from_secs(6));
    }

    #[test]
    fn test_without_jitter_is_deterministic() {
        let policy = RetryPolicy::default().without_jitter();
        assert_eq!(policy.delay_for_attempt(2), Duration::from_secs(6));
    }
}

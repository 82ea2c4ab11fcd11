//! Retry policy with exponential backoff for batch writes.
//!
//! Transient storage failures (dropped connections, pool timeouts) are
//! retried per batch; constraint and type failures are not. The policy
//! is injected into the writer so tests can run with zero jitter and
//! tight delays.

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Retry configuration for the upsert writer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts per batch, including the first (default: 3).
    pub max_attempts: u32,
    /// Initial backoff duration (default: 500ms).
    pub initial_backoff: Duration,
    /// Maximum backoff duration (default: 30s).
    pub max_backoff: Duration,
    /// Backoff multiplier for exponential growth (default: 2.0).
    pub backoff_multiplier: f64,
    /// Jitter factor for randomization (default: 0.1 = ±10%).
    pub jitter_factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(30),
            backoff_multiplier: 2.0,
            jitter_factor: 0.1,
        }
    }
}

impl RetryPolicy {
    /// Policy with custom attempt count, other knobs at defaults.
    #[must_use]
    pub fn with_max_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            ..Self::default()
        }
    }

    /// Jitter-free policy for deterministic tests.
    #[must_use]
    pub fn without_jitter() -> Self {
        Self {
            jitter_factor: 0.0,
            ..Self::default()
        }
    }
}

/// Calculator handing out one backoff delay per failed attempt.
///
/// Yields `None` once the attempt budget is spent: with
/// `max_attempts = 3` it produces exactly two delays, so a batch runs at
/// most three times.
#[derive(Debug)]
pub struct BackoffCalculator {
    attempts_made: u32,
    max_attempts: u32,
    initial_backoff_ms: u64,
    max_backoff_ms: u64,
    backoff_multiplier: f64,
    jitter_factor: f64,
}

impl BackoffCalculator {
    /// Create a calculator from a policy; the first attempt is counted
    /// as already made.
    #[must_use]
    pub const fn new(policy: &RetryPolicy) -> Self {
        Self {
            attempts_made: 1,
            max_attempts: policy.max_attempts,
            initial_backoff_ms: policy.initial_backoff.as_millis() as u64,
            max_backoff_ms: policy.max_backoff.as_millis() as u64,
            backoff_multiplier: policy.backoff_multiplier,
            jitter_factor: policy.jitter_factor,
        }
    }

    /// Delay before the next attempt, or `None` when the budget is
    /// spent.
    pub fn next_delay(&mut self) -> Option<Duration> {
        if self.attempts_made >= self.max_attempts {
            return None;
        }

        let base_ms = self.base_backoff_ms();
        let jittered_ms = self.apply_jitter(base_ms).min(self.max_backoff_ms);
        self.attempts_made += 1;

        Some(Duration::from_millis(jittered_ms))
    }

    /// Attempts made so far, including the first.
    #[must_use]
    pub const fn attempts_made(&self) -> u32 {
        self.attempts_made
    }

    fn base_backoff_ms(&self) -> u64 {
        let exponent = self.attempts_made.saturating_sub(1);
        #[allow(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            clippy::cast_precision_loss,
            clippy::cast_possible_wrap
        )]
        let backoff = (self.initial_backoff_ms as f64
            * self.backoff_multiplier.powi(exponent as i32)) as u64;
        backoff.min(self.max_backoff_ms)
    }

    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    fn apply_jitter(&self, backoff_ms: u64) -> u64 {
        if self.jitter_factor <= 0.0 {
            return backoff_ms;
        }
        let mut rng = rand::rng();
        let jitter_range = backoff_ms as f64 * self.jitter_factor;
        let min = (backoff_ms as f64 - jitter_range).max(0.0);
        let max = backoff_ms as f64 + jitter_range;
        rng.random_range(min..=max) as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_matches_writer_contract() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.initial_backoff, Duration::from_millis(500));
        assert!((policy.backoff_multiplier - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn three_attempts_means_two_delays() {
        let policy = RetryPolicy::without_jitter();
        let mut backoff = BackoffCalculator::new(&policy);

        assert_eq!(backoff.next_delay(), Some(Duration::from_millis(500)));
        assert_eq!(backoff.next_delay(), Some(Duration::from_millis(1000)));
        assert_eq!(backoff.next_delay(), None);
        assert_eq!(backoff.attempts_made(), 3);
    }

    #[test]
    fn delays_are_capped_at_max_backoff() {
        let policy = RetryPolicy {
            max_attempts: 10,
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(4),
            backoff_multiplier: 10.0,
            jitter_factor: 0.0,
        };
        let mut backoff = BackoffCalculator::new(&policy);

        assert_eq!(backoff.next_delay(), Some(Duration::from_secs(1)));
        assert_eq!(backoff.next_delay(), Some(Duration::from_secs(4)));
        assert_eq!(backoff.next_delay(), Some(Duration::from_secs(4)));
    }

    #[test]
    fn jitter_stays_within_range() {
        let policy = RetryPolicy {
            jitter_factor: 0.2,
            ..RetryPolicy::default()
        };

        for _ in 0..100 {
            let mut backoff = BackoffCalculator::new(&policy);
            let delay = backoff.next_delay().unwrap();
            // Base is 500ms, jitter ±20%: 400-600ms.
            assert!(delay >= Duration::from_millis(400));
            assert!(delay <= Duration::from_millis(600));
        }
    }

    #[test]
    fn single_attempt_policy_never_sleeps() {
        let policy = RetryPolicy {
            max_attempts: 1,
            ..RetryPolicy::without_jitter()
        };
        let mut backoff = BackoffCalculator::new(&policy);
        assert_eq!(backoff.next_delay(), None);
    }
}

//! Reconnection Policy
//!
//! Backoff delays for the feed supervisor. The feed client itself treats
//! connection errors as fatal by default; the supervisor consults this
//! policy between restart attempts, drawing one delay per failed run until
//! the attempt budget is spent.

use std::time::Duration;

use rand::Rng;

/// Configuration for reconnection behavior.
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    /// Delay before the first reconnection attempt.
    pub initial_delay: Duration,
    /// Cap on the delay between attempts.
    pub max_delay: Duration,
    /// Backoff multiplier applied after each attempt.
    pub multiplier: f64,
    /// Jitter as a fraction of the delay (0.1 = ±10%).
    pub jitter_factor: f64,
    /// Maximum attempts before giving up (0 = unlimited).
    pub max_attempts: u32,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(64),
            multiplier: 2.0,
            jitter_factor: 0.1,
            max_attempts: 0, // Unlimited
        }
    }
}

/// Hands out successive backoff delays for one supervised session.
///
/// The nth delay is `initial_delay * multiplier^n`, capped at `max_delay`,
/// with jitter applied last. The policy lives exactly as long as the
/// session it paces; a new session starts from a fresh policy.
#[derive(Debug)]
pub struct ReconnectPolicy {
    config: ReconnectConfig,
    attempt_count: u32,
}

impl ReconnectPolicy {
    /// Create a new policy.
    #[must_use]
    pub const fn new(config: ReconnectConfig) -> Self {
        Self {
            config,
            attempt_count: 0,
        }
    }

    /// Delay to wait before the next attempt.
    ///
    /// Returns `None` once max attempts are exhausted.
    #[must_use]
    pub fn next_delay(&mut self) -> Option<Duration> {
        if self.config.max_attempts > 0 && self.attempt_count >= self.config.max_attempts {
            return None;
        }

        let backoff = (self.config.initial_delay.as_secs_f64()
            * self.config.multiplier.powf(f64::from(self.attempt_count)))
        .min(self.config.max_delay.as_secs_f64());
        self.attempt_count += 1;

        Some(self.jittered(backoff))
    }

    /// Attempts consumed so far.
    #[must_use]
    pub const fn attempt_count(&self) -> u32 {
        self.attempt_count
    }

    /// Spread a delay by the configured jitter fraction, keeping it
    /// strictly positive.
    fn jittered(&self, seconds: f64) -> Duration {
        let spread = seconds * self.config.jitter_factor;
        let jitter = if spread > 0.0 {
            rand::rng().random_range(-spread..=spread)
        } else {
            0.0
        };
        Duration::from_secs_f64((seconds + jitter).max(0.001))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_jitter(initial_ms: u64, max_ms: u64, multiplier: f64, max_attempts: u32) -> ReconnectPolicy {
        ReconnectPolicy::new(ReconnectConfig {
            initial_delay: Duration::from_millis(initial_ms),
            max_delay: Duration::from_millis(max_ms),
            multiplier,
            jitter_factor: 0.0,
            max_attempts,
        })
    }

    #[test]
    fn default_config_values() {
        let config = ReconnectConfig::default();
        assert_eq!(config.initial_delay, Duration::from_secs(1));
        assert_eq!(config.max_delay, Duration::from_secs(64));
        assert!((config.multiplier - 2.0).abs() < f64::EPSILON);
        assert_eq!(config.max_attempts, 0);
    }

    #[test]
    fn delays_grow_exponentially() {
        let mut policy = no_jitter(100, 10_000, 2.0, 0);

        assert_eq!(policy.next_delay(), Some(Duration::from_millis(100)));
        assert_eq!(policy.next_delay(), Some(Duration::from_millis(200)));
        assert_eq!(policy.next_delay(), Some(Duration::from_millis(400)));
        assert_eq!(policy.next_delay(), Some(Duration::from_millis(800)));
    }

    #[test]
    fn delays_cap_at_max() {
        let mut policy = no_jitter(1_000, 2_000, 4.0, 0);

        assert_eq!(policy.next_delay(), Some(Duration::from_millis(1_000)));
        assert_eq!(policy.next_delay(), Some(Duration::from_millis(2_000)));
        assert_eq!(policy.next_delay(), Some(Duration::from_millis(2_000)));
    }

    #[test]
    fn attempts_are_bounded() {
        let mut policy = no_jitter(100, 1_000, 2.0, 3);

        assert!(policy.next_delay().is_some());
        assert!(policy.next_delay().is_some());
        assert!(policy.next_delay().is_some());
        assert_eq!(policy.attempt_count(), 3);

        assert!(policy.next_delay().is_none());
        assert!(policy.next_delay().is_none());
    }

    #[test]
    fn unlimited_attempts_never_run_dry() {
        let mut policy = no_jitter(100, 5_000, 2.0, 0);

        for _ in 0..1_000 {
            let delay = policy.next_delay().unwrap();
            assert!(delay <= Duration::from_millis(5_000));
        }
    }

    #[test]
    fn jitter_stays_in_bounds() {
        for _ in 0..100 {
            let mut policy = ReconnectPolicy::new(ReconnectConfig {
                initial_delay: Duration::from_millis(1_000),
                max_delay: Duration::from_secs(10),
                multiplier: 2.0,
                jitter_factor: 0.1,
                max_attempts: 0,
            });

            let millis = policy.next_delay().map_or(0, |d| d.as_millis());
            assert!((900..=1_100).contains(&millis), "delay {millis}ms out of bounds");
        }
    }
}

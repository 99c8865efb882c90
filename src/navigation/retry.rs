//! Retry policy and adaptive pacing
//!
//! One policy object carries every knob the navigation loop needs: attempt
//! budget, the randomized backoff applied before each attempt, and the
//! poll interval / hard ceiling used while waiting out a challenge. The
//! same object drives both the outer retry loop and the challenge-wait
//! sub-loop.

use crate::config::CrawlerConfig;
use rand::Rng;
use std::time::Duration;

/// Per-success padding added while a session keeps navigating unchallenged
const STREAK_PADDING_MS: u64 = 150;

/// Cap on how many clear navigations contribute padding
const STREAK_PADDING_CAP: u32 = 10;

/// Retry and poll-wait policy for navigation
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum navigation attempts per call
    pub max_attempts: u32,

    /// Lower bound of the randomized pre-attempt delay
    pub base_delay_min: Duration,

    /// Upper bound of the randomized pre-attempt delay
    pub base_delay_max: Duration,

    /// Interval between challenge-state polls
    pub poll_interval: Duration,

    /// Hard wall-clock ceiling for one challenge wait
    pub poll_ceiling: Duration,
}

impl RetryPolicy {
    /// Builds a policy from the crawler configuration
    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self {
            max_attempts: config.max_retries.max(1),
            base_delay_min: Duration::from_millis(config.pre_nav_delay_min_ms),
            base_delay_max: Duration::from_millis(config.pre_nav_delay_max_ms),
            poll_interval: Duration::from_millis(config.challenge_poll_interval_ms),
            poll_ceiling: Duration::from_secs(config.challenge_wait_ceiling_secs),
        }
    }

    /// Samples one randomized base delay from the configured range
    pub fn sample_base_delay(&self) -> Duration {
        if self.base_delay_max.is_zero() {
            return Duration::ZERO;
        }
        let min = self.base_delay_min.as_millis() as u64;
        let max = self.base_delay_max.as_millis() as u64;
        Duration::from_millis(rand::thread_rng().gen_range(min..=max))
    }
}

/// Scales a base delay linearly with the 1-based attempt number
pub fn scale_for_attempt(base: Duration, attempt: u32) -> Duration {
    base * attempt.max(1)
}

/// Adaptive pre-navigation pacing
///
/// The delay before an attempt grows with the attempt number and with the
/// count of navigations that succeeded without seeing a challenge. A long
/// unchallenged streak is not treated as proof the cadence is safe; the
/// pacer slows down slightly as the streak grows instead of speeding up.
#[derive(Debug)]
pub struct Pacer {
    policy: RetryPolicy,
    clear_streak: u32,
}

impl Pacer {
    /// Creates a pacer over the given policy
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            clear_streak: 0,
        }
    }

    /// Delay to apply before the given 1-based attempt
    pub fn pre_navigation_delay(&self, attempt: u32) -> Duration {
        scale_for_attempt(self.policy.sample_base_delay(), attempt) + self.streak_padding()
    }

    /// Records a navigation that completed without a challenge
    pub fn record_clear_navigation(&mut self) {
        self.clear_streak = self.clear_streak.saturating_add(1);
    }

    /// Records a detected challenge, resetting the clear streak
    pub fn record_challenge(&mut self) {
        self.clear_streak = 0;
    }

    /// Number of consecutive challenge-free navigations
    pub fn clear_streak(&self) -> u32 {
        self.clear_streak
    }

    fn streak_padding(&self) -> Duration {
        Duration::from_millis(STREAK_PADDING_MS) * self.clear_streak.min(STREAK_PADDING_CAP)
    }
}

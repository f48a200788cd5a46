// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Per-unit pacing for worker pools

use rand::Rng;
use std::time::Duration;

/// Default pause before each internal search request
pub const DEFAULT_INTERNAL_DELAY: Duration = Duration::from_millis(500);

/// Lower bound of the randomized pause between external searches
pub const EXTERNAL_MIN_DELAY: Duration = Duration::from_secs(1);

/// How a worker spaces out consecutive units
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PacingPolicy {
    /// No pauses
    Unpaced,
    /// Fixed pause before every unit, regardless of remaining work
    FixedBefore(Duration),
    /// Uniformly random pause in `[min, max]` after a unit, only while more
    /// than one unit of the batch remains
    RandomAfter { min: Duration, max: Duration },
}

/// Decides whether and how long a worker pauses around each unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimiter {
    policy: PacingPolicy,
}

impl RateLimiter {
    pub fn new(policy: PacingPolicy) -> Self {
        Self { policy }
    }

    pub fn unpaced() -> Self {
        Self::new(PacingPolicy::Unpaced)
    }

    /// Internal search pacing: fixed `delay` before every request
    pub fn internal(delay: Duration) -> Self {
        if delay.is_zero() {
            return Self::unpaced();
        }
        Self::new(PacingPolicy::FixedBefore(delay))
    }

    /// External search pacing: random `[1s, max_delay_secs]` pause between units
    ///
    /// A `max_delay_secs` of zero disables the pause.
    pub fn external(max_delay_secs: u64) -> Self {
        if max_delay_secs == 0 {
            return Self::unpaced();
        }
        let max = Duration::from_secs(max_delay_secs).max(EXTERNAL_MIN_DELAY);
        Self::new(PacingPolicy::RandomAfter {
            min: EXTERNAL_MIN_DELAY,
            max,
        })
    }

    pub fn policy(&self) -> &PacingPolicy {
        &self.policy
    }

    /// Pause to apply before a unit's network call
    pub fn delay_before(&self) -> Option<Duration> {
        match self.policy {
            PacingPolicy::FixedBefore(delay) => Some(delay),
            _ => None,
        }
    }

    /// Pause to apply after a unit
    ///
    /// `remaining` counts the unfinished units of the batch, including the one
    /// just processed.
    pub fn delay_after(&self, remaining: usize) -> Option<Duration> {
        match self.policy {
            PacingPolicy::RandomAfter { min, max } if remaining > 1 => {
                Some(random_between(min, max))
            }
            _ => None,
        }
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::unpaced()
    }
}

fn random_between(min: Duration, max: Duration) -> Duration {
    if max <= min {
        return min;
    }
    let low = min.as_millis() as u64;
    let high = max.as_millis() as u64;
    Duration::from_millis(rand::thread_rng().gen_range(low..=high))
}

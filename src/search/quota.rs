// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Requests-per-minute cap shared by internal search workers

use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter as GovRateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;

/// Token-bucket quota over all workers of a phase
#[derive(Clone)]
pub struct RequestQuota {
    limiter: Arc<GovRateLimiter<NotKeyed, InMemoryState, DefaultClock>>,
    requests_per_minute: u32,
}

impl RequestQuota {
    /// Create a quota; zero disables it
    pub fn per_minute(requests_per_minute: u32) -> Option<Self> {
        let rpm = NonZeroU32::new(requests_per_minute)?;
        Some(Self {
            limiter: Arc::new(GovRateLimiter::direct(Quota::per_minute(rpm))),
            requests_per_minute,
        })
    }

    /// Whether a request may be sent right now (consumes a permit if so)
    #[cfg(test)]
    pub fn check(&self) -> bool {
        self.limiter.check().is_ok()
    }

    /// Wait until a request is allowed
    pub async fn wait(&self) {
        self.limiter.until_ready().await;
    }

    pub fn requests_per_minute(&self) -> u32 {
        self.requests_per_minute
    }
}

impl std::fmt::Debug for RequestQuota {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestQuota")
            .field("requests_per_minute", &self.requests_per_minute)
            .finish()
    }
}

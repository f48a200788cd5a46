// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Bounded-concurrency task pipeline
//!
//! - [`WorkQueue`]: unbounded FIFO with join, drain and close
//! - [`WorkerPool`]: N cooperative consumers with per-item failure isolation
//! - [`RateLimiter`]: pacing applied around each unit

pub mod pool;
pub mod queue;
pub mod rate_limiter;

pub use pool::{PoolError, PoolReport, WorkHandler, WorkerPool};
pub use queue::{Claim, Completion, WorkQueue};
pub use rate_limiter::{PacingPolicy, RateLimiter};

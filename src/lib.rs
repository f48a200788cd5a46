// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod cli;
pub mod pipeline;
pub mod search;

// Re-export main types
pub use pipeline::{PoolReport, RateLimiter, WorkHandler, WorkQueue, WorkerPool};
pub use search::{
    HttpConfig, HttpSession, SearchConfig, SearchCoordinator, SearchReport, SourceId, TargetId,
};

// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Bounded worker pool over a [`WorkQueue`]
//!
//! `run` spawns `concurrency` workers that pull items until the queue reports
//! every item finished. The pool then drains stragglers and cancels idle or
//! pacing workers through a [`CancellationToken`]. Handler errors and panics
//! are logged per item and never stop sibling workers.

use async_trait::async_trait;
use futures::FutureExt;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use super::queue::WorkQueue;
use super::rate_limiter::RateLimiter;

/// Processes one work item
#[async_trait]
pub trait WorkHandler<T: Send + 'static>: Send + Sync + 'static {
    /// Recoverable per-item failure, logged by the pool
    type Error: fmt::Display + Send;

    async fn handle(&self, item: T) -> Result<(), Self::Error>;
}

/// Errors building a pool
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PoolError {
    #[error("Worker pool '{pool}' needs at least one worker")]
    InvalidConcurrency { pool: &'static str },
}

/// Outcome of one `run`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolReport {
    /// Items whose handler returned `Ok`
    pub succeeded: usize,
    /// Items whose handler returned an error or panicked
    pub failed: usize,
    /// Items discarded by the final drain
    pub discarded: usize,
    /// Workers stopped by the shutdown signal
    pub cancelled_workers: usize,
    /// Worker tasks that ended abnormally outside item handling
    ///
    /// A panicking handler is caught at the item boundary and counted in
    /// `failed`; the worker keeps running.
    pub faulted_workers: usize,
}

impl PoolReport {
    pub fn processed(&self) -> usize {
        self.succeeded + self.failed
    }

    fn absorb(&mut self, outcome: WorkerOutcome) {
        self.succeeded += outcome.succeeded;
        self.failed += outcome.failed;
        if outcome.exit == WorkerExit::Cancelled {
            self.cancelled_workers += 1;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WorkerExit {
    Cancelled,
    QueueClosed,
}

#[derive(Debug)]
struct WorkerOutcome {
    succeeded: usize,
    failed: usize,
    exit: WorkerExit,
}

/// Runs a fixed number of workers against a queue
#[derive(Debug, Clone)]
pub struct WorkerPool {
    name: &'static str,
    concurrency: usize,
    rate_limiter: RateLimiter,
}

impl WorkerPool {
    pub fn new(name: &'static str, concurrency: usize) -> Result<Self, PoolError> {
        if concurrency == 0 {
            return Err(PoolError::InvalidConcurrency { pool: name });
        }
        Ok(Self {
            name,
            concurrency,
            rate_limiter: RateLimiter::unpaced(),
        })
    }

    pub fn with_rate_limiter(mut self, rate_limiter: RateLimiter) -> Self {
        self.rate_limiter = rate_limiter;
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Process the queue until every submitted item is finished, then shut down
    ///
    /// Returns after all workers have terminated.
    pub async fn run<T, H>(&self, queue: Arc<WorkQueue<T>>, handler: Arc<H>) -> PoolReport
    where
        T: fmt::Display + Send + 'static,
        H: WorkHandler<T>,
    {
        let shutdown = CancellationToken::new();
        let mut workers = JoinSet::new();

        for id in 0..self.concurrency {
            let worker = Worker {
                id,
                pool: self.name,
                queue: Arc::clone(&queue),
                handler: Arc::clone(&handler),
                rate_limiter: self.rate_limiter.clone(),
                shutdown: shutdown.child_token(),
            };
            workers.spawn(worker.run());
        }

        queue.join().await;
        let discarded = queue.drain();
        shutdown.cancel();

        let mut report = PoolReport {
            discarded,
            ..Default::default()
        };

        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok(outcome) => report.absorb(outcome),
                Err(e) => {
                    error!(pool = self.name, error = %e, "Worker terminated abnormally");
                    report.faulted_workers += 1;
                }
            }
        }

        debug!(
            pool = self.name,
            succeeded = report.succeeded,
            failed = report.failed,
            discarded = report.discarded,
            "Worker pool finished"
        );

        report
    }
}

struct Worker<T, H> {
    id: usize,
    pool: &'static str,
    queue: Arc<WorkQueue<T>>,
    handler: Arc<H>,
    rate_limiter: RateLimiter,
    shutdown: CancellationToken,
}

impl<T, H> Worker<T, H>
where
    T: fmt::Display + Send + 'static,
    H: WorkHandler<T>,
{
    async fn run(self) -> WorkerOutcome {
        let mut outcome = WorkerOutcome {
            succeeded: 0,
            failed: 0,
            exit: WorkerExit::Cancelled,
        };

        loop {
            let claim = tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => return outcome,
                claim = self.queue.take() => claim,
            };
            let Some(claim) = claim else {
                outcome.exit = WorkerExit::QueueClosed;
                return outcome;
            };

            if let Some(delay) = self.rate_limiter.delay_before() {
                if !self.pause(delay).await {
                    return outcome;
                }
            }

            let (item, done) = claim.into_parts();
            let label = item.to_string();
            let handled = tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => return outcome,
                result = AssertUnwindSafe(self.handler.handle(item)).catch_unwind() => result,
            };

            match handled {
                Ok(Ok(())) => outcome.succeeded += 1,
                Ok(Err(e)) => {
                    warn!(pool = self.pool, worker = self.id, item = %label, error = %e, "Work item failed");
                    outcome.failed += 1;
                }
                Err(_) => {
                    error!(pool = self.pool, worker = self.id, item = %label, "Work item handler panicked");
                    outcome.failed += 1;
                }
            }

            let remaining = self.queue.pending();
            drop(done);

            if let Some(delay) = self.rate_limiter.delay_after(remaining) {
                debug!(pool = self.pool, worker = self.id, delay_ms = delay.as_millis() as u64, "Pacing before next item");
                if !self.pause(delay).await {
                    return outcome;
                }
            }
        }
    }

    /// Sleep unless shut down first; returns false on shutdown
    async fn pause(&self, delay: Duration) -> bool {
        tokio::select! {
            biased;
            _ = self.shutdown.cancelled() => false,
            _ = tokio::time::sleep(delay) => true,
        }
    }
}

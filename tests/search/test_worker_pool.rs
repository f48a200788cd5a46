// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//
// Worker pool behavior through the public API

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

use sm2av::pipeline::{PacingPolicy, RateLimiter, WorkHandler, WorkQueue, WorkerPool};

/// Records when each item started
struct Timestamps {
    started: Mutex<Vec<(u32, Instant)>>,
}

#[async_trait]
impl WorkHandler<u32> for Timestamps {
    type Error = String;

    async fn handle(&self, item: u32) -> Result<(), String> {
        self.started.lock().unwrap().push((item, Instant::now()));
        Ok(())
    }
}

#[tokio::test(start_paused = true)]
async fn test_random_pacing_gaps_stay_within_bounds() {
    let queue = Arc::new(WorkQueue::new());
    queue.submit_all(0..4u32);
    let handler = Arc::new(Timestamps {
        started: Mutex::new(Vec::new()),
    });
    let pool = WorkerPool::new("paced", 1)
        .unwrap()
        .with_rate_limiter(RateLimiter::new(PacingPolicy::RandomAfter {
            min: Duration::from_secs(1),
            max: Duration::from_secs(2),
        }));

    let start = Instant::now();
    let report = pool.run(queue, handler.clone()).await;
    let elapsed = start.elapsed();

    assert_eq!(report.succeeded, 4);
    let started = handler.started.lock().unwrap().clone();
    let order: Vec<u32> = started.iter().map(|(item, _)| *item).collect();
    assert_eq!(order, vec![0, 1, 2, 3]);

    for pair in started.windows(2) {
        let gap = pair[1].1 - pair[0].1;
        assert!(gap >= Duration::from_secs(1), "gap {:?}", gap);
        assert!(gap <= Duration::from_secs(2), "gap {:?}", gap);
    }
    // no pause after the last item
    assert!(elapsed <= Duration::from_secs(6), "elapsed {:?}", elapsed);
}

/// Submits a follow-up item while handling the first one
struct Spawner {
    queue: Arc<WorkQueue<u32>>,
    seen: Mutex<Vec<u32>>,
}

#[async_trait]
impl WorkHandler<u32> for Spawner {
    type Error = String;

    async fn handle(&self, item: u32) -> Result<(), String> {
        if item == 1 {
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.queue
                .submit(100)
                .map_err(|_| "queue closed".to_string())?;
        }
        self.seen.lock().unwrap().push(item);
        Ok(())
    }
}

#[tokio::test]
async fn test_items_submitted_during_run_are_processed() {
    let queue = Arc::new(WorkQueue::new());
    queue.submit_all([1u32, 2, 3]);
    let handler = Arc::new(Spawner {
        queue: Arc::clone(&queue),
        seen: Mutex::new(Vec::new()),
    });
    let pool = WorkerPool::new("spawner", 3).unwrap();

    let report = tokio::time::timeout(Duration::from_secs(5), pool.run(queue.clone(), handler.clone()))
        .await
        .expect("pool finished");

    let mut seen = handler.seen.lock().unwrap().clone();
    seen.sort();
    assert_eq!(seen, vec![1, 2, 3, 100]);
    assert_eq!(report.succeeded, 4);
    assert_eq!(report.discarded, 0);
    assert_eq!(queue.pending(), 0);
}

/// Fails odd items and panics on one
struct Flaky;

#[async_trait]
impl WorkHandler<u32> for Flaky {
    type Error = String;

    async fn handle(&self, item: u32) -> Result<(), String> {
        if item == 4 {
            panic!("handler bug on item 4");
        }
        if item % 2 == 1 {
            return Err(format!("item {} rejected", item));
        }
        Ok(())
    }
}

#[tokio::test]
async fn test_failures_and_panics_are_isolated() {
    let queue = Arc::new(WorkQueue::new());
    queue.submit_all(0..10u32);
    let pool = WorkerPool::new("flaky", 3).unwrap();

    let report = tokio::time::timeout(Duration::from_secs(5), pool.run(queue, Arc::new(Flaky)))
        .await
        .expect("pool finished");

    assert_eq!(report.succeeded, 4);
    assert_eq!(report.failed, 6);
    assert_eq!(report.processed(), 10);
    assert_eq!(report.faulted_workers, 0);
    assert_eq!(report.cancelled_workers, 3);
}

#[test]
fn test_zero_workers_rejected() {
    assert!(WorkerPool::new("empty", 0).is_err());
}

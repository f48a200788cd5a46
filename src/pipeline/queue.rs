// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Unbounded FIFO work queue with join/drain semantics
//!
//! Consumers call [`WorkQueue::take`] and receive a [`Claim`]. Releasing the
//! claim (or dropping it, e.g. when a cancelled handler future is dropped)
//! marks the item complete, so [`WorkQueue::join`] cannot wait on an item that
//! nobody will finish.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::Notify;

struct QueueState<T> {
    items: VecDeque<T>,
    closed: bool,
}

/// Tracks submitted items that have not been completed or discarded
#[derive(Default)]
struct Progress {
    unfinished: AtomicUsize,
    all_done: Notify,
}

impl Progress {
    fn finish(&self, count: usize) {
        if count == 0 {
            return;
        }
        if self.unfinished.fetch_sub(count, Ordering::SeqCst) == count {
            self.all_done.notify_waiters();
        }
    }
}

/// Task-safe FIFO of work items
pub struct WorkQueue<T> {
    state: Mutex<QueueState<T>>,
    progress: Arc<Progress>,
    item_ready: Notify,
}

/// An item taken from the queue, completed when dropped
pub struct Claim<T> {
    item: T,
    done: Completion,
}

/// Marks one claimed item complete on drop
pub struct Completion {
    progress: Arc<Progress>,
}

impl Drop for Completion {
    fn drop(&mut self) {
        self.progress.finish(1);
    }
}

impl<T> Claim<T> {
    /// Borrow the claimed item
    pub fn item(&self) -> &T {
        &self.item
    }

    /// Split into the item and its completion handle
    ///
    /// The item stays unfinished until the returned [`Completion`] is dropped.
    pub fn into_parts(self) -> (T, Completion) {
        (self.item, self.done)
    }
}

impl<T> WorkQueue<T> {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(QueueState {
                items: VecDeque::new(),
                closed: false,
            }),
            progress: Arc::new(Progress::default()),
            item_ready: Notify::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, QueueState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Enqueue an item without blocking
    ///
    /// Returns the item back if the queue has been closed.
    pub fn submit(&self, item: T) -> Result<(), T> {
        {
            let mut state = self.lock();
            if state.closed {
                return Err(item);
            }
            state.items.push_back(item);
            self.progress.unfinished.fetch_add(1, Ordering::SeqCst);
        }
        self.item_ready.notify_one();
        Ok(())
    }

    /// Enqueue every item of an iterator, returning how many were accepted
    pub fn submit_all<I: IntoIterator<Item = T>>(&self, items: I) -> usize {
        items
            .into_iter()
            .map(|item| self.submit(item))
            .filter(Result::is_ok)
            .count()
    }

    /// Wait for the next item
    ///
    /// Returns `None` once the queue is closed and empty.
    pub async fn take(&self) -> Option<Claim<T>> {
        loop {
            let notified = self.item_ready.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let mut state = self.lock();
                if let Some(item) = state.items.pop_front() {
                    return Some(Claim {
                        item,
                        done: Completion {
                            progress: Arc::clone(&self.progress),
                        },
                    });
                }
                if state.closed {
                    return None;
                }
            }

            notified.await;
        }
    }

    /// Discard all queued items without processing them
    ///
    /// Returns the number of items discarded.
    pub fn drain(&self) -> usize {
        let discarded = {
            let mut state = self.lock();
            let count = state.items.len();
            state.items.clear();
            count
        };
        self.progress.finish(discarded);
        discarded
    }

    /// Wait until every submitted item has been completed or discarded
    pub async fn join(&self) {
        loop {
            let notified = self.progress.all_done.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.pending() == 0 {
                return;
            }

            notified.await;
        }
    }

    /// Reject further submissions and wake every waiting consumer
    pub fn close(&self) {
        self.lock().closed = true;
        self.item_ready.notify_waiters();
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Items submitted but not yet completed or discarded (in-flight included)
    pub fn pending(&self) -> usize {
        self.progress.unfinished.load(Ordering::SeqCst)
    }

    /// Items waiting to be taken
    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Default for WorkQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

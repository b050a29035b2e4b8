//! Bounded, cancellable FIFO queues shared between pipeline stages.
//!
//! Grounded on the teacher's `LlmInputQueue` (`pipeline/coordinator.rs`),
//! which already wraps a `VecDeque` with bounded capacity and an atomic
//! `clear()`. This generalizes that one-off queue into a reusable type used
//! for all three of the spec's bounded queues, and adds capacity-blocking
//! backpressure on push (the source's queue instead drops on overflow,
//! which this spec does not call for).

use std::collections::VecDeque;
use tokio::sync::{Mutex, Notify};

/// An item flowing through the text-stream or audio-output queue: either a
/// real payload or the distinguished end-of-utterance sentinel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sentineled<T> {
    /// A legitimate payload.
    Item(T),
    /// Marks the end of the current utterance/response.
    Sentinel,
}

impl<T> Sentineled<T> {
    pub fn is_sentinel(&self) -> bool {
        matches!(self, Self::Sentinel)
    }
}

/// A bounded FIFO queue. `push` suspends while the queue is at capacity;
/// callers make that suspension cancellable by racing it against a
/// cancellation signal with `tokio::select!`. `clear` drops all pending
/// items in one critical section.
pub struct BoundedQueue<T> {
    inner: Mutex<VecDeque<T>>,
    cap: usize,
    not_full: Notify,
    not_empty: Notify,
}

impl<T> BoundedQueue<T> {
    /// Create a new queue with the given capacity. A capacity of zero means
    /// every push suspends forever (never constructed by this crate).
    pub fn new(cap: usize) -> Self {
        Self {
            inner: Mutex::new(VecDeque::with_capacity(cap.min(64))),
            cap,
            not_full: Notify::new(),
            not_empty: Notify::new(),
        }
    }

    /// Push an item, suspending while the queue is full.
    pub async fn push(&self, item: T) {
        let mut item = Some(item);
        loop {
            {
                let mut guard = self.inner.lock().await;
                if guard.len() < self.cap {
                    guard.push_back(item.take().expect("item pushed exactly once"));
                    self.not_empty.notify_one();
                    return;
                }
            }
            self.not_full.notified().await;
        }
    }

    /// Pop the next item, suspending while the queue is empty.
    pub async fn pop(&self) -> T {
        loop {
            {
                let mut guard = self.inner.lock().await;
                if let Some(item) = guard.pop_front() {
                    self.not_full.notify_one();
                    return item;
                }
            }
            self.not_empty.notified().await;
        }
    }

    /// Drop every pending item in one critical section, returning how many
    /// were discarded.
    pub async fn clear(&self) -> usize {
        let mut guard = self.inner.lock().await;
        let cleared = guard.len();
        guard.clear();
        drop(guard);
        if cleared > 0 {
            self.not_full.notify_waiters();
        }
        cleared
    }

    /// Whether any item is currently pending.
    pub async fn has_items(&self) -> bool {
        !self.inner.lock().await.is_empty()
    }

    /// Current pending length (for tests/telemetry).
    pub async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }
}

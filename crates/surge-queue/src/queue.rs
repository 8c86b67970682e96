//! Bounded FIFO of work tokens.
//!
//! The token sequence and the admission counter are only touched while
//! holding the queue mutex, so the capacity check and the push happen as
//! one step: with one slot left, exactly one of any number of concurrent
//! callers succeeds.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::Notify;
use tracing::debug;

use crate::error::{QueueError, QueueResult};

/// One unit of admitted work.
///
/// Carries only its admission sequence number, which makes drain order
/// observable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Token {
    seq: u64,
}

impl Token {
    /// Zero-based position in the overall admission order.
    pub fn seq(&self) -> u64 {
        self.seq
    }
}

struct Inner {
    tokens: VecDeque<Token>,
    next_seq: u64,
}

/// Fixed-capacity admission queue shared between request handlers and the
/// drain loop.
pub struct AdmissionQueue {
    capacity: usize,
    inner: Mutex<Inner>,
    /// Successful admissions since construction. Mirrors `next_seq`, kept
    /// separately so readers need no lock.
    admitted_total: AtomicU64,
    /// Tokens the drain loop finished working on.
    processed_total: AtomicU64,
    /// Signalled on every admission so an idle drainer wakes early.
    wakeup: Notify,
}

impl AdmissionQueue {
    /// Create an empty queue holding at most `capacity` tokens.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            inner: Mutex::new(Inner {
                tokens: VecDeque::with_capacity(capacity),
                next_seq: 0,
            }),
            admitted_total: AtomicU64::new(0),
            processed_total: AtomicU64::new(0),
            wakeup: Notify::new(),
        }
    }

    /// Append one token, or fail with [`QueueError::Full`] without touching
    /// the queue. Never blocks on capacity.
    pub fn try_admit(&self) -> QueueResult<()> {
        let mut inner = self.lock();
        if inner.tokens.len() >= self.capacity {
            debug!(capacity = self.capacity, "admission rejected, queue full");
            return Err(QueueError::Full {
                capacity: self.capacity,
            });
        }

        let token = Token { seq: inner.next_seq };
        inner.next_seq += 1;
        inner.tokens.push_back(token);
        self.admitted_total.fetch_add(1, Ordering::Relaxed);
        drop(inner);

        self.wakeup.notify_one();
        Ok(())
    }

    /// Remove and return the oldest token, if any.
    pub fn drain(&self) -> Option<Token> {
        self.lock().tokens.pop_front()
    }

    /// Current occupancy. A snapshot; concurrent callers may change it
    /// immediately afterwards.
    pub fn size(&self) -> usize {
        self.lock().tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Total successful admissions. Monotonic.
    pub fn admitted_total(&self) -> u64 {
        self.admitted_total.load(Ordering::Relaxed)
    }

    /// Total tokens the drain loop has finished processing. Monotonic.
    pub fn processed_total(&self) -> u64 {
        self.processed_total.load(Ordering::Relaxed)
    }

    pub(crate) fn mark_processed(&self) {
        self.processed_total.fetch_add(1, Ordering::Relaxed);
    }

    /// Resolves after the next admission (or immediately if one happened
    /// since the last wait).
    pub(crate) async fn admitted(&self) {
        self.wakeup.notified().await;
    }

    // A panic while holding the lock cannot leave `Inner` half-updated, so a
    // poisoned mutex is still safe to use.
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for AdmissionQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdmissionQueue")
            .field("capacity", &self.capacity)
            .field("size", &self.size())
            .field("admitted_total", &self.admitted_total())
            .finish()
    }
}

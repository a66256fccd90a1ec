//! Bounded Offline Backlog with Drop-Oldest Overflow
//!
//! ## Overview
//!
//! While the broker is unreachable every sample the gateway wants to publish
//! lands here. Outages have no upper bound, so the backlog has to: it holds at
//! most `capacity` entries and, when full, discards the **oldest** entry to
//! admit the newest one.
//!
//! ## Why Drop-Oldest?
//!
//! Environmental readings lose value with age. After a long outage the cloud
//! side is better served by the most recent eight minutes of data than by the
//! first eight minutes of the outage, so the eviction policy favours freshness:
//!
//! ```text
//! capacity = 3
//!
//! enqueue A   [A]
//! enqueue B   [A, B]
//! enqueue C   [A, B, C]          full
//! enqueue D   [B, C, D]          A evicted
//! ```
//!
//! The eviction is returned to the caller instead of happening silently, so
//! every lost sample can be reported.
//!
//! ## Ordering
//!
//! The queue is strictly FIFO: insertion order is publish order. Draining
//! takes from the head; a sample whose publish fails mid-drain goes back to
//! the head with [`BoundedQueue::requeue_front`] so the next drain resumes at
//! exactly the same place.
//!
//! ## Capacity Invariant
//!
//! `len() <= capacity()` holds after every `enqueue`. `requeue_front` is the
//! one operation allowed to break it, by at most one element, because it must
//! never lose the sample it is handed back. The next `enqueue` evicts until
//! the invariant holds again.
//!
//! ## Thread Safety
//!
//! Not thread-safe. The backlog has a single owner (the publish coordinator);
//! wrap it in a mutex together with the broker connection if a multi-threaded
//! host ever needs to share it.

use alloc::collections::VecDeque;
use alloc::vec::Vec;
use core::num::NonZeroUsize;

use crate::constants::buffers::DEFAULT_BUFFER_CAPACITY;

/// Queue health counters
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct QueueStats {
    /// Items accepted by `enqueue`
    pub enqueued: u64,
    /// Items handed out by `dequeue`
    pub dequeued: u64,
    /// Items discarded to make room
    pub evicted: u64,
    /// Items pushed back with `requeue_front`
    pub requeued: u64,
    /// Deepest the queue has been
    pub max_depth: usize,
}

/// Fixed-capacity FIFO that evicts its oldest entry on overflow
#[derive(Debug, Clone)]
pub struct BoundedQueue<T> {
    items: VecDeque<T>,
    capacity: NonZeroUsize,
    stats: QueueStats,
}

impl<T> BoundedQueue<T> {
    /// Create an empty queue holding at most `capacity` items
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            items: VecDeque::with_capacity(capacity.get()),
            capacity,
            stats: QueueStats::default(),
        }
    }

    /// Append `item` at the tail
    ///
    /// If the queue is at (or, after a requeue, above) capacity, items are
    /// evicted from the head first. The evicted items are returned oldest
    /// first; the vector is empty in the common case and does not allocate.
    ///
    /// ## Example
    ///
    /// ```rust
    /// # use smartenviro_core::BoundedQueue;
    /// # use core::num::NonZeroUsize;
    /// let mut queue = BoundedQueue::new(NonZeroUsize::new(2).unwrap());
    ///
    /// assert!(queue.enqueue('a').is_empty());
    /// assert!(queue.enqueue('b').is_empty());
    /// assert_eq!(queue.enqueue('c'), vec!['a']);
    ///
    /// assert_eq!(queue.iter().copied().collect::<String>(), "bc");
    /// ```
    pub fn enqueue(&mut self, item: T) -> Vec<T> {
        let mut evicted = Vec::new();
        while self.items.len() >= self.capacity.get() {
            match self.items.pop_front() {
                Some(old) => evicted.push(old),
                None => break,
            }
        }
        self.stats.evicted += evicted.len() as u64;

        self.items.push_back(item);
        self.stats.enqueued += 1;
        self.update_depth();

        evicted
    }

    /// Remove and return the oldest item, or `None` when empty
    pub fn dequeue(&mut self) -> Option<T> {
        let item = self.items.pop_front()?;
        self.stats.dequeued += 1;
        Some(item)
    }

    /// Put an item back at the head
    ///
    /// Used when a drain pulled `item` but could not publish it. Never evicts,
    /// so the queue may briefly hold `capacity + 1` items.
    pub fn requeue_front(&mut self, item: T) {
        self.items.push_front(item);
        self.stats.requeued += 1;
        self.update_depth();

        if self.items.len() > self.capacity.get() {
            log_debug!(
                "backlog above capacity after requeue ({} > {}), next enqueue evicts",
                self.items.len(),
                self.capacity
            );
        }
    }

    /// Oldest item without removing it
    pub fn peek(&self) -> Option<&T> {
        self.items.front()
    }

    /// Items currently held
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True when nothing is held
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// True once the next `enqueue` would evict
    pub fn is_full(&self) -> bool {
        self.items.len() >= self.capacity.get()
    }

    /// Maximum number of items held at once
    pub fn capacity(&self) -> usize {
        self.capacity.get()
    }

    /// Iterate from oldest to newest
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    /// Drop everything; counters are kept
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Lifetime counters
    pub fn stats(&self) -> &QueueStats {
        &self.stats
    }

    fn update_depth(&mut self) {
        if self.items.len() > self.stats.max_depth {
            self.stats.max_depth = self.items.len();
        }
    }
}

impl<T> Default for BoundedQueue<T> {
    fn default() -> Self {
        let capacity = NonZeroUsize::new(DEFAULT_BUFFER_CAPACITY).unwrap_or(NonZeroUsize::MIN);
        Self::new(capacity)
    }
}

//! Bounded hand-off queues between pipeline stages
//!
//! A queue carries items from one stage to the next. Writers block while the
//! queue is full, which keeps memory bounded by the capacity no matter how
//! large the directory tree is. Readers block while it is empty, and see `None`
//! once every writer has closed and the buffered items are drained.

use crossbeam_channel::{bounded as channel, Receiver, Sender};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

/// Statistics for a queue
#[derive(Debug)]
pub struct QueueStats {
    capacity: usize,

    /// Total items enqueued
    enqueued: AtomicU64,

    /// Total items dequeued
    dequeued: AtomicU64,

    /// Largest depth observed right after an enqueue
    peak_depth: AtomicUsize,
}

impl QueueStats {
    fn new(capacity: usize) -> Self {
        Self {
            capacity,
            enqueued: AtomicU64::new(0),
            dequeued: AtomicU64::new(0),
            peak_depth: AtomicUsize::new(0),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn enqueued(&self) -> u64 {
        self.enqueued.load(Ordering::Relaxed)
    }

    pub fn dequeued(&self) -> u64 {
        self.dequeued.load(Ordering::Relaxed)
    }

    pub fn peak_depth(&self) -> usize {
        self.peak_depth.load(Ordering::Relaxed)
    }
}

/// Creates a bounded queue holding at most `capacity` items
pub fn bounded<T>(capacity: usize) -> (QueueSender<T>, QueueReceiver<T>) {
    // A zero-capacity channel would be a rendezvous, not a buffer
    let capacity = capacity.max(1);
    let (sender, receiver) = channel(capacity);
    let stats = Arc::new(QueueStats::new(capacity));

    (
        QueueSender {
            sender,
            stats: Arc::clone(&stats),
        },
        QueueReceiver { receiver, stats },
    )
}

/// Write side of a queue (clone for each producer)
#[derive(Debug)]
pub struct QueueSender<T> {
    sender: Sender<T>,
    stats: Arc<QueueStats>,
}

impl<T> Clone for QueueSender<T> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
            stats: Arc::clone(&self.stats),
        }
    }
}

impl<T> QueueSender<T> {
    /// Sends an item, blocking while the queue is full.
    ///
    /// Fails, handing the item back, only when every receiver is gone.
    pub fn send(&self, item: T) -> Result<(), T> {
        self.sender.send(item).map_err(|e| e.into_inner())?;
        self.stats.enqueued.fetch_add(1, Ordering::Relaxed);
        self.stats
            .peak_depth
            .fetch_max(self.sender.len(), Ordering::Relaxed);
        Ok(())
    }

    /// Closes this handle for writing.
    ///
    /// The queue is closed once all sender handles are closed or dropped.
    pub fn close(self) {
        drop(self);
    }

    pub fn stats(&self) -> Arc<QueueStats> {
        Arc::clone(&self.stats)
    }
}

/// Read side of a queue (clone for each consumer)
#[derive(Debug)]
pub struct QueueReceiver<T> {
    receiver: Receiver<T>,
    stats: Arc<QueueStats>,
}

impl<T> Clone for QueueReceiver<T> {
    fn clone(&self) -> Self {
        Self {
            receiver: self.receiver.clone(),
            stats: Arc::clone(&self.stats),
        }
    }
}

impl<T> QueueReceiver<T> {
    /// Receives the next item, blocking while the queue is empty and open.
    ///
    /// Returns `None` once the queue is closed and drained.
    pub fn recv(&self) -> Option<T> {
        let item = self.receiver.recv().ok()?;
        self.stats.dequeued.fetch_add(1, Ordering::Relaxed);
        Some(item)
    }

    /// Iterates until the queue is closed and drained
    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        std::iter::from_fn(move || self.recv())
    }

    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    pub fn stats(&self) -> Arc<QueueStats> {
        Arc::clone(&self.stats)
    }
}

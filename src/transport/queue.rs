//! Inbound application-message queue.
//!
//! Producer: the receive task. Consumers: any number of caller tasks or
//! threads. FIFO and unbounded; there is no backpressure, a slow consumer
//! lets the queue grow.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::Notify;

/// Thread-safe FIFO with async notification.
#[derive(Debug)]
pub struct InboundQueue<T> {
    queue: Mutex<VecDeque<T>>,
    notify: Notify,
    messages_received: AtomicU64,
}

impl<T> Default for InboundQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> InboundQueue<T> {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            notify: Notify::new(),
            messages_received: AtomicU64::new(0),
        }
    }

    /// Append a message and wake one waiting consumer.
    pub fn push(&self, item: T) {
        self.lock().push_back(item);
        self.messages_received.fetch_add(1, Ordering::Relaxed);
        self.notify.notify_one();
    }

    /// Pop the oldest message without waiting.
    pub fn try_pop(&self) -> Option<T> {
        self.lock().pop_front()
    }

    /// Wait for the next message.
    pub async fn pop(&self) -> T {
        loop {
            if let Some(item) = self.try_pop() {
                return item;
            }
            // notify_one stores a permit, so a push between try_pop and
            // here is not lost.
            self.notify.notified().await;
        }
    }

    /// Number of queued messages.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Total number of messages ever pushed.
    pub fn messages_received(&self) -> u64 {
        self.messages_received.load(Ordering::Relaxed)
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<T>> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

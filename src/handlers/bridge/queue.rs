//! FIFO output queue shared between producers and a single emitter.
//!
//! Two producers feed the queue: the provider callbacks (synthesized audio,
//! transcripts, speech events) and the bridge session itself. One emitter
//! task drains it toward the client. Interruption handling needs the whole
//! backlog droppable at once, which is why this is a clearable deque rather
//! than a channel.

use std::collections::VecDeque;

use tokio::sync::{Mutex, Notify};

/// An async FIFO queue with a clear operation.
///
/// `pop` is written for a single consumer; `push` and `clear` may be called
/// from any number of tasks.
#[derive(Debug)]
pub struct OutputQueue<T> {
    items: Mutex<VecDeque<T>>,
    notify: Notify,
}

impl<T> OutputQueue<T> {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
            notify: Notify::new(),
        }
    }

    /// Append an item at the tail.
    pub async fn push(&self, item: T) {
        self.items.lock().await.push_back(item);
        self.notify.notify_one();
    }

    /// Remove and return the head item, waiting until one is available.
    pub async fn pop(&self) -> T {
        loop {
            if let Some(item) = self.items.lock().await.pop_front() {
                return item;
            }
            // notify_one stores a permit, so a push between the check above
            // and this await does not get lost.
            self.notify.notified().await;
        }
    }

    /// Remove and return the head item if one is queued.
    pub async fn try_pop(&self) -> Option<T> {
        self.items.lock().await.pop_front()
    }

    /// Drop all queued items.
    pub async fn clear(&self) {
        self.items.lock().await.clear();
    }

    /// Number of queued items.
    pub async fn len(&self) -> usize {
        self.items.lock().await.len()
    }

    /// Whether the queue is empty.
    pub async fn is_empty(&self) -> bool {
        self.items.lock().await.is_empty()
    }
}

impl<T> Default for OutputQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_push_pop_fifo() {
        let queue = OutputQueue::new();
        queue.push(1).await;
        queue.push(2).await;
        queue.push(3).await;

        assert_eq!(queue.pop().await, 1);
        assert_eq!(queue.pop().await, 2);
        assert_eq!(queue.pop().await, 3);
    }

    #[tokio::test]
    async fn test_try_pop_empty() {
        let queue: OutputQueue<u32> = OutputQueue::new();
        assert_eq!(queue.try_pop().await, None);
    }

    #[tokio::test]
    async fn test_clear_drops_backlog() {
        let queue = OutputQueue::new();
        queue.push("a").await;
        queue.push("b").await;
        assert_eq!(queue.len().await, 2);

        queue.clear().await;
        assert!(queue.is_empty().await);
        assert_eq!(queue.try_pop().await, None);
    }

    #[tokio::test]
    async fn test_pop_waits_for_push() {
        let queue = Arc::new(OutputQueue::new());

        let consumer = {
            let queue = queue.clone();
            tokio::spawn(async move { queue.pop().await })
        };

        tokio::time::sleep(Duration::from_millis(10)).await;
        queue.push(42).await;

        let value = tokio::time::timeout(Duration::from_secs(1), consumer)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(value, 42);
    }

    #[tokio::test]
    async fn test_push_after_clear_still_delivered() {
        let queue = OutputQueue::new();
        queue.push(1).await;
        queue.clear().await;
        queue.push(2).await;
        assert_eq!(queue.pop().await, 2);
    }
}

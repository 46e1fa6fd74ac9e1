use std::collections::VecDeque;

use parking_lot::{Condvar, Mutex};

/// FIFO contents and the done flag live under one mutex so a `finish` can
/// never race a blocked `pop` into a lost wakeup.
struct Inner<T> {
    fifo: VecDeque<T>,
    finished: bool,
}

/// Bounded blocking FIFO handing decoded events from the reader thread to
/// the processing thread.
///
/// - `push` blocks while the queue is at capacity.
/// - `pop` blocks until an event is available (`Some`) or the queue is
///   drained and the producer has called `finish` (`None`).
/// - `finish` is idempotent and wakes every waiter.
///
/// Ordering is strict FIFO: events come out in the order they went in.
pub struct EventQueue<T> {
    inner: Mutex<Inner<T>>,
    not_empty: Condvar,
    not_full: Condvar,
    capacity: usize,
}

impl<T> EventQueue<T> {
    pub fn bounded(capacity: usize) -> Self {
        assert!(capacity > 0, "queue capacity must be non-zero");
        Self {
            inner: Mutex::new(Inner {
                fifo: VecDeque::with_capacity(capacity),
                finished: false,
            }),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
            capacity,
        }
    }

    /// Append an event, blocking while the queue is full. A queue that has
    /// been finished stops blocking so a late producer cannot deadlock.
    pub fn push(&self, value: T) {
        let mut inner = self.inner.lock();
        while inner.fifo.len() >= self.capacity && !inner.finished {
            self.not_full.wait(&mut inner);
        }
        inner.fifo.push_back(value);
        drop(inner);
        self.not_empty.notify_one();
    }

    /// Remove the oldest event, blocking until one is available. Returns
    /// `None` only when the queue is empty and finished.
    pub fn pop(&self) -> Option<T> {
        let mut inner = self.inner.lock();
        loop {
            if let Some(value) = inner.fifo.pop_front() {
                drop(inner);
                self.not_full.notify_one();
                return Some(value);
            }
            if inner.finished {
                return None;
            }
            self.not_empty.wait(&mut inner);
        }
    }

    /// Signal that no more events will be pushed. Idempotent.
    pub fn finish(&self) {
        let mut inner = self.inner.lock();
        inner.finished = true;
        drop(inner);
        self.not_empty.notify_all();
        self.not_full.notify_all();
    }

    pub fn is_finished(&self) -> bool {
        self.inner.lock().finished
    }

    pub fn len(&self) -> usize {
        self.inner.lock().fifo.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn fifo_order_across_threads() {
        let q = Arc::new(EventQueue::bounded(8));
        let producer = {
            let q = Arc::clone(&q);
            thread::spawn(move || {
                for i in 0..1000u32 {
                    q.push(i);
                }
                q.finish();
            })
        };

        let mut seen = Vec::new();
        while let Some(v) = q.pop() {
            seen.push(v);
        }
        producer.join().unwrap();

        assert_eq!(seen, (0..1000).collect::<Vec<_>>());
    }

    #[test]
    fn pop_returns_none_only_after_drain() {
        let q = EventQueue::bounded(4);
        q.push(1);
        q.push(2);
        q.finish();
        assert_eq!(q.pop(), Some(1));
        assert_eq!(q.pop(), Some(2));
        assert_eq!(q.pop(), None);
        assert_eq!(q.pop(), None);
    }

    #[test]
    fn finish_is_idempotent_and_wakes_blocked_pop() {
        let q = Arc::new(EventQueue::<u32>::bounded(4));
        let waiter = {
            let q = Arc::clone(&q);
            thread::spawn(move || q.pop())
        };
        // give the waiter time to block on the empty queue
        thread::sleep(Duration::from_millis(50));
        q.finish();
        q.finish();
        assert_eq!(waiter.join().unwrap(), None);
        assert!(q.is_finished());
    }

    #[test]
    fn push_blocks_at_capacity_until_pop() {
        let q = Arc::new(EventQueue::bounded(2));
        q.push(1);
        q.push(2);

        let producer = {
            let q = Arc::clone(&q);
            thread::spawn(move || {
                q.push(3); // blocks until the consumer makes room
            })
        };

        thread::sleep(Duration::from_millis(50));
        assert_eq!(q.len(), 2);
        assert_eq!(q.pop(), Some(1));
        producer.join().unwrap();
        assert_eq!(q.pop(), Some(2));
        assert_eq!(q.pop(), Some(3));
    }
}

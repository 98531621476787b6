// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Wait Queue
//!
//! Ordered set of threads blocked on one synchronization object. Queues are
//! owned by the kernel context and looked up by the object's
//! [`QueueKey`](super::object::QueueKey); an object never holds thread
//! references itself.
//!
//! # Design
//!
//! - **Priority-ordered**: Threads queued by priority (higher first)
//! - **Fair ordering**: FIFO within same priority level
//! - **Unlink by ID**: A thread that times out or is resumed externally is
//!   removed from the middle of the queue

use alloc::collections::VecDeque;

use crate::rustux::types::*;

/// Wait queue entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitQueueEntry {
    /// Thread ID waiting
    pub tid: ThreadId,

    /// Thread priority at the time it blocked
    pub priority: Priority,
}

/// Wait queue
#[derive(Debug, Default)]
pub struct WaitQueue {
    /// Queue of waiting threads (priority-sorted)
    queue: VecDeque<WaitQueueEntry>,
}

impl WaitQueue {
    /// Create a new wait queue
    pub const fn new() -> Self {
        Self {
            queue: VecDeque::new(),
        }
    }

    /// Insert a thread behind every waiter of equal or higher priority
    pub fn insert(&mut self, entry: WaitQueueEntry) {
        let pos = self
            .queue
            .iter()
            .position(|e| entry.priority > e.priority)
            .unwrap_or(self.queue.len());

        self.queue.insert(pos, entry);
    }

    /// Remove the head of the queue
    pub fn pop_front(&mut self) -> Option<WaitQueueEntry> {
        self.queue.pop_front()
    }

    /// Remove a specific thread
    ///
    /// Returns true if the thread was found and removed.
    pub fn remove(&mut self, tid: ThreadId) -> bool {
        match self.queue.iter().position(|e| e.tid == tid) {
            Some(pos) => {
                self.queue.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Walk the queue in order, keeping the entries `f` returns true for
    pub fn retain<F>(&mut self, f: F)
    where
        F: FnMut(&WaitQueueEntry) -> bool,
    {
        self.queue.retain(f);
    }

    /// Iterate the waiters in wake-up order
    pub fn iter(&self) -> impl Iterator<Item = &WaitQueueEntry> {
        self.queue.iter()
    }

    /// Check if the wait queue is empty
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Get the number of waiting threads
    pub fn len(&self) -> usize {
        self.queue.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    fn entry(tid: ThreadId, priority: Priority) -> WaitQueueEntry {
        WaitQueueEntry { tid, priority }
    }

    fn order(wq: &WaitQueue) -> Vec<ThreadId> {
        wq.iter().map(|e| e.tid).collect()
    }

    #[test]
    fn test_wait_queue_new() {
        let wq = WaitQueue::new();
        assert!(wq.is_empty());
        assert_eq!(wq.len(), 0);
    }

    #[test]
    fn test_wait_queue_priority_order() {
        let mut wq = WaitQueue::new();
        wq.insert(entry(1, 10));
        wq.insert(entry(2, 30));
        wq.insert(entry(3, 20));

        assert_eq!(order(&wq), [2, 3, 1]);
    }

    #[test]
    fn test_wait_queue_fifo_within_priority() {
        let mut wq = WaitQueue::new();
        wq.insert(entry(1, 10));
        wq.insert(entry(2, 10));
        wq.insert(entry(3, 20));
        wq.insert(entry(4, 10));
        wq.insert(entry(5, 20));

        assert_eq!(order(&wq), [3, 5, 1, 2, 4]);
        assert_eq!(wq.pop_front(), Some(entry(3, 20)));
    }

    #[test]
    fn test_wait_queue_remove() {
        let mut wq = WaitQueue::new();
        wq.insert(entry(1, 10));
        wq.insert(entry(2, 10));

        // Try to remove non-existent thread
        assert!(!wq.remove(999));

        assert!(wq.remove(1));
        assert_eq!(order(&wq), [2]);
    }

    #[test]
    fn test_wait_queue_retain() {
        let mut wq = WaitQueue::new();
        for tid in 0..5 {
            wq.insert(entry(tid, 1));
        }

        wq.retain(|e| e.tid % 2 == 0);
        assert_eq!(order(&wq), [0, 2, 4]);
    }
}

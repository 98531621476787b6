// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Scheduler Bridge
//!
//! The kernel context the synchronization objects block and wake through.
//! It owns the thread table, every wait queue, the tick clock and the
//! object heap budget, all behind one spinlock that doubles as the global
//! critical section.
//!
//! The CPU side (who is running, interrupt masking, actually switching a
//! thread out) is supplied by the board through [`Port`].
//!
//! # Design
//!
//! - **Explicit context**: one [`Kernel`] per system, passed by reference
//! - **Handle-based queues**: objects are keyed by [`QueueKey`], the kernel
//!   maps keys to [`WaitQueue`]s and drops a queue once it drains
//! - **Single suspension**: a blocking call enqueues, releases the critical
//!   section, and parks exactly once; on return it reads the resume code
//!   from its thread record
//!
//! # Usage
//!
//! ```rust,ignore
//! let kernel = Kernel::new(BoardPort::new(), KernelConfig::default());
//! let tid = kernel.add_thread(PRIORITY_DEFAULT)?;
//!
//! // From the tick interrupt
//! kernel.tick();
//! ```

use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use crate::err::*;
use crate::kernel::config::KernelConfig;
use crate::kernel::sync::object::QueueKey;
use crate::kernel::sync::wait_queue::{WaitQueue, WaitQueueEntry};
use crate::kernel::thread::Thread;
use crate::kernel::thread_lock::{CriticalSection, IrqState};
use crate::kernel::timer::Timeout;
use crate::rustux::types::*;

/// ============================================================================
/// Port
/// ============================================================================

/// CPU and context-switch services supplied by the board
pub trait Port: Send + Sync + 'static {
    /// Thread executing on the calling context
    fn current_thread(&self) -> ThreadId;

    /// Whether the caller is running in interrupt context
    fn in_interrupt(&self) -> bool;

    /// Give up the CPU until `wake(tid)` is called
    ///
    /// Called without the kernel lock held. May return early; the kernel
    /// re-checks the thread state and switches out again if needed.
    fn switch_out(&self, tid: ThreadId);

    /// Make `tid` runnable again
    ///
    /// Called with the kernel lock held, from task or interrupt context.
    fn wake(&self, tid: ThreadId);

    /// Mask interrupts, returning the previous state
    fn irq_save(&self) -> IrqState {
        IrqState::default()
    }

    /// Restore the state returned by `irq_save`
    fn irq_restore(&self, _state: IrqState) {}
}

/// ============================================================================
/// Kernel State
/// ============================================================================

/// State guarded by the kernel critical section
pub struct KernelState {
    /// Thread table, indexed by thread ID
    threads: Vec<Thread>,

    /// Non-empty wait queues, one per object with blocked threads
    queues: BTreeMap<QueueKey, WaitQueue>,

    /// Current tick
    now: Tick,

    /// Bytes handed out to dynamically created objects
    heap_used: usize,
}

impl KernelState {
    fn new() -> Self {
        Self {
            threads: Vec::new(),
            queues: BTreeMap::new(),
            now: 0,
            heap_used: 0,
        }
    }

    /// Current tick
    pub fn now(&self) -> Tick {
        self.now
    }

    /// Thread record
    ///
    /// Panics on an ID the kernel never handed out.
    pub fn thread(&self, tid: ThreadId) -> &Thread {
        match self.threads.get(tid as usize) {
            Some(thread) => thread,
            None => panic!("unknown thread {}", tid),
        }
    }

    /// Mutable thread record
    pub fn thread_mut(&mut self, tid: ThreadId) -> &mut Thread {
        match self.threads.get_mut(tid as usize) {
            Some(thread) => thread,
            None => panic!("unknown thread {}", tid),
        }
    }

    /// Number of threads blocked on `key`
    pub fn waiter_count(&self, key: QueueKey) -> usize {
        self.queues.get(&key).map_or(0, WaitQueue::len)
    }

    /// Threads blocked on `key`, in wake-up order
    pub fn waiters(&self, key: QueueKey) -> Vec<ThreadId> {
        self.queues
            .get(&key)
            .map(|queue| queue.iter().map(|e| e.tid).collect())
            .unwrap_or_default()
    }

    /// Reserve object heap bytes against `limit`
    pub(crate) fn heap_reserve(&mut self, size: usize, limit: usize) -> Result {
        match self.heap_used.checked_add(size) {
            Some(used) if used <= limit => {
                self.heap_used = used;
                Ok(())
            }
            _ => Err(RX_ERR_NO_MEMORY),
        }
    }

    /// Return object heap bytes
    pub(crate) fn heap_unreserve(&mut self, size: usize) {
        debug_assert!(self.heap_used >= size, "object heap underflow");
        self.heap_used -= size;
    }

    /// Queue `tid` on `key`
    fn enqueue(&mut self, tid: ThreadId, key: QueueKey, deadline: Option<Tick>) {
        let thread = self.thread_mut(tid);
        thread.block(key, deadline);
        let entry = WaitQueueEntry {
            tid,
            priority: thread.priority(),
        };

        self.queues.entry(key).or_default().insert(entry);
    }

    /// Unlink a blocked thread from its queue
    fn unlink(&mut self, tid: ThreadId) {
        let Some(key) = self.thread(tid).wait.queue else {
            return;
        };

        if let Some(queue) = self.queues.get_mut(&key) {
            queue.remove(tid);
            if queue.is_empty() {
                self.queues.remove(&key);
            }
        }
    }
}

/// ============================================================================
/// Resume Helpers
/// ============================================================================

impl CriticalSection<'_> {
    /// Wake a thread that is already unlinked from its queue
    fn wake_unlinked(&mut self, tid: ThreadId, status: Status) {
        self.thread_mut(tid).wake(status);
        self.port.wake(tid);

        log_trace!("Thread {} resumed: {}", tid, status_str(status));
    }

    /// Resume a blocked thread with `status`
    ///
    /// Returns false if the thread was not blocked.
    pub fn resume_one(&mut self, tid: ThreadId, status: Status) -> bool {
        if !self.thread(tid).is_blocked() {
            return false;
        }

        self.unlink(tid);
        self.wake_unlinked(tid, status);
        true
    }

    /// Resume the head of `key`'s queue with `status`
    pub fn resume_head(&mut self, key: QueueKey, status: Status) -> Option<ThreadId> {
        let queue = self.queues.get_mut(&key)?;
        let entry = queue.pop_front()?;
        if queue.is_empty() {
            self.queues.remove(&key);
        }

        self.wake_unlinked(entry.tid, status);
        Some(entry.tid)
    }

    /// Resume every thread blocked on `key` with `status`
    ///
    /// Returns the number of threads resumed.
    pub fn resume_all(&mut self, key: QueueKey, status: Status) -> usize {
        self.resume_where(key, |_| Some(status))
    }

    /// Walk `key`'s queue in order and resume the threads `f` picks
    ///
    /// `f` sees each waiter's record and returns the code to resume it with,
    /// or `None` to leave it blocked. Returns the number of threads resumed.
    pub fn resume_where<F>(&mut self, key: QueueKey, mut f: F) -> usize
    where
        F: FnMut(&mut Thread) -> Option<Status>,
    {
        let port = self.port;
        let KernelState {
            threads, queues, ..
        } = &mut **self;

        let Some(queue) = queues.get_mut(&key) else {
            return 0;
        };

        let mut resumed = 0;
        queue.retain(|entry| {
            let thread = &mut threads[entry.tid as usize];
            match f(thread) {
                Some(status) => {
                    thread.wake(status);
                    port.wake(entry.tid);
                    log_trace!("Thread {} resumed: {}", entry.tid, status_str(status));
                    resumed += 1;
                    false
                }
                None => true,
            }
        });

        if queue.is_empty() {
            queues.remove(&key);
        }

        resumed
    }

    /// Resume every blocked thread whose deadline has passed
    fn expire(&mut self) -> usize {
        let now = self.now;
        let expired: Vec<ThreadId> = self
            .threads
            .iter()
            .filter(|thread| thread.is_expired(now))
            .map(Thread::tid)
            .collect();

        for &tid in &expired {
            self.resume_one(tid, RX_ERR_TIMED_OUT);
        }

        expired.len()
    }
}

/// ============================================================================
/// Kernel
/// ============================================================================

/// Kernel context
pub struct Kernel {
    /// Board services
    port: Box<dyn Port>,

    /// Sizing
    config: KernelConfig,

    /// State guarded by the critical section
    state: spin::Mutex<KernelState>,
}

impl Kernel {
    /// Initialize a kernel context
    pub fn new<P: Port>(port: P, config: KernelConfig) -> Self {
        log_info!(
            "Kernel initialized: max_threads={} heap_limit={}",
            config.max_threads,
            config.heap_limit
        );

        Self {
            port: Box::new(port),
            config,
            state: spin::Mutex::new(KernelState::new()),
        }
    }

    /// Configuration the kernel was built with
    pub fn config(&self) -> &KernelConfig {
        &self.config
    }

    /// Enter the critical section
    pub fn enter(&self) -> CriticalSection<'_> {
        CriticalSection::enter(&*self.port, &self.state)
    }

    /// Thread executing on the calling context
    pub fn current(&self) -> ThreadId {
        self.port.current_thread()
    }

    /// Whether the caller is running in interrupt context
    pub fn in_interrupt(&self) -> bool {
        self.port.in_interrupt()
    }

    /// Assert the caller is not running in interrupt context
    #[track_caller]
    pub fn assert_thread_context(&self, op: &str) {
        assert!(
            !self.port.in_interrupt(),
            "{} called from interrupt context",
            op
        );
    }

    /// Register a thread and return its ID
    pub fn add_thread(&self, priority: Priority) -> Result<ThreadId> {
        let mut cs = self.enter();
        if cs.threads.len() >= self.config.max_threads {
            return Err(RX_ERR_NO_RESOURCES);
        }

        let tid = cs.threads.len() as ThreadId;
        cs.threads.push(Thread::new(tid, priority));

        log_debug!("Thread added: tid={} priority={}", tid, priority);
        Ok(tid)
    }

    /// Priority of a thread
    pub fn priority(&self, tid: ThreadId) -> Priority {
        self.enter().thread(tid).priority()
    }

    /// Whether a thread is suspended on some object
    pub fn is_blocked(&self, tid: ThreadId) -> bool {
        self.enter().thread(tid).is_blocked()
    }

    /// Current tick
    pub fn now(&self) -> Tick {
        self.enter().now
    }

    /// Bytes currently held by dynamically created objects
    pub fn heap_used(&self) -> usize {
        self.enter().heap_used
    }

    /// Advance the clock by one tick
    pub fn tick(&self) -> usize {
        self.advance(1)
    }

    /// Advance the clock and time out every expired wait
    ///
    /// Returns the number of threads resumed with `RX_ERR_TIMED_OUT`.
    pub fn advance(&self, ticks: Tick) -> usize {
        let mut cs = self.enter();
        cs.now = cs.now.saturating_add(ticks);

        let expired = cs.expire();
        if expired > 0 {
            log_debug!("Tick {}: {} wait(s) timed out", cs.now, expired);
        }
        expired
    }

    /// Resume a blocked thread with an arbitrary code
    ///
    /// Callable from task or interrupt context. The thread's pending
    /// operation returns `status` verbatim. Returns false if the thread
    /// was not blocked.
    pub fn resume(&self, tid: ThreadId, status: Status) -> bool {
        self.enter().resume_one(tid, status)
    }

    /// Release every blocked thread with `RX_ERR_STOPPED`
    ///
    /// Teardown counterpart of [`Kernel::new`].
    pub fn shutdown(&self) -> usize {
        let mut cs = self.enter();
        let keys: Vec<QueueKey> = cs.queues.keys().copied().collect();

        let released: usize = keys
            .into_iter()
            .map(|key| cs.resume_all(key, RX_ERR_STOPPED))
            .sum();

        log_info!("Kernel shutdown: {} thread(s) released", released);
        released
    }

    /// Suspend the current thread on `key`
    ///
    /// Consumes the caller's critical section: the thread is queued under
    /// it, the lock is released while the thread is switched out, and the
    /// code the thread was resumed with is returned. A timeout that has
    /// already expired returns `RX_ERR_TIMED_OUT` without suspending.
    pub fn suspend(&self, mut cs: CriticalSection<'_>, key: QueueKey, timeout: Timeout) -> Status {
        let now = cs.now;
        if timeout.is_expired(now) {
            return RX_ERR_TIMED_OUT;
        }

        let tid = self.port.current_thread();
        cs.enqueue(tid, key, timeout.deadline(now));
        drop(cs);

        log_trace!("Thread {} suspended on {:?}", tid, key);

        loop {
            self.port.switch_out(tid);

            let cs = self.enter();
            let thread = cs.thread(tid);
            if !thread.is_blocked() {
                return thread.wait.result;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct IdlePort;

    impl Port for IdlePort {
        fn current_thread(&self) -> ThreadId {
            0
        }

        fn in_interrupt(&self) -> bool {
            false
        }

        fn switch_out(&self, _tid: ThreadId) {}

        fn wake(&self, _tid: ThreadId) {}
    }

    fn kernel() -> Kernel {
        Kernel::new(IdlePort, KernelConfig::new().max_threads(4))
    }

    #[test]
    fn test_add_thread() {
        let kernel = kernel();
        assert_eq!(kernel.add_thread(10), Ok(0));
        assert_eq!(kernel.add_thread(20), Ok(1));
        assert_eq!(kernel.priority(1), 20);
        assert!(!kernel.is_blocked(0));
    }

    #[test]
    fn test_add_thread_table_full() {
        let kernel = kernel();
        for _ in 0..4 {
            kernel.add_thread(1).unwrap();
        }
        assert_eq!(kernel.add_thread(1), Err(RX_ERR_NO_RESOURCES));
    }

    #[test]
    fn test_resume_head_priority_order() {
        let kernel = kernel();
        for priority in [5, 9, 5] {
            kernel.add_thread(priority).unwrap();
        }

        let key = QueueKey::from_raw(0x100);
        let mut cs = kernel.enter();
        cs.enqueue(0, key, None);
        cs.enqueue(1, key, None);
        cs.enqueue(2, key, None);
        assert_eq!(cs.waiters(key), [1, 0, 2]);

        assert_eq!(cs.resume_head(key, RX_OK), Some(1));
        assert_eq!(cs.resume_head(key, RX_OK), Some(0));
        assert_eq!(cs.resume_head(key, RX_OK), Some(2));
        assert_eq!(cs.resume_head(key, RX_OK), None);
        assert_eq!(cs.waiter_count(key), 0);
    }

    #[test]
    fn test_resume_where_keeps_unpicked() {
        let kernel = kernel();
        for _ in 0..3 {
            kernel.add_thread(1).unwrap();
        }

        let key = QueueKey::from_raw(0x200);
        let mut cs = kernel.enter();
        for tid in 0..3 {
            cs.enqueue(tid, key, None);
        }

        let resumed = cs.resume_where(key, |thread| (thread.tid() != 1).then_some(7));
        assert_eq!(resumed, 2);
        assert_eq!(cs.waiters(key), [1]);
        assert_eq!(cs.thread(0).wait.result, 7);
        assert!(cs.thread(1).is_blocked());
    }

    #[test]
    fn test_advance_expires_deadlines() {
        let kernel = kernel();
        kernel.add_thread(1).unwrap();
        kernel.add_thread(1).unwrap();

        let key = QueueKey::from_raw(0x300);
        {
            let mut cs = kernel.enter();
            cs.enqueue(0, key, Some(3));
            cs.enqueue(1, key, None);
        }

        assert_eq!(kernel.advance(2), 0);
        assert_eq!(kernel.tick(), 1);
        assert_eq!(kernel.now(), 3);

        let cs = kernel.enter();
        assert_eq!(cs.thread(0).wait.result, RX_ERR_TIMED_OUT);
        assert_eq!(cs.waiters(key), [1]);
    }

    #[test]
    fn test_resume_external_code() {
        let kernel = kernel();
        kernel.add_thread(1).unwrap();
        assert!(!kernel.resume(0, 99));

        kernel.enter().enqueue(0, QueueKey::from_raw(0x400), None);
        assert!(kernel.resume(0, 99));
        assert!(!kernel.is_blocked(0));
        assert_eq!(kernel.enter().thread(0).wait.result, 99);
    }

    #[test]
    fn test_shutdown_releases_all() {
        let kernel = kernel();
        for _ in 0..3 {
            kernel.add_thread(1).unwrap();
        }
        {
            let mut cs = kernel.enter();
            cs.enqueue(0, QueueKey::from_raw(0x500), None);
            cs.enqueue(1, QueueKey::from_raw(0x600), None);
        }

        assert_eq!(kernel.shutdown(), 2);
        assert_eq!(kernel.enter().thread(1).wait.result, RX_ERR_STOPPED);
    }

    #[test]
    fn test_suspend_expired_timeout_does_not_block() {
        let kernel = kernel();
        kernel.add_thread(1).unwrap();

        let key = QueueKey::from_raw(0x700);
        let cs = kernel.enter();
        assert_eq!(kernel.suspend(cs, key, Timeout::IMMEDIATE), RX_ERR_TIMED_OUT);
        assert!(!kernel.is_blocked(0));
    }

    #[test]
    fn test_heap_budget() {
        let kernel = kernel();
        let limit = 100;
        let mut cs = kernel.enter();
        assert_eq!(cs.heap_reserve(60, limit), Ok(()));
        assert_eq!(cs.heap_reserve(60, limit), Err(RX_ERR_NO_MEMORY));
        cs.heap_unreserve(60);
        assert_eq!(cs.heap_reserve(100, limit), Ok(()));
    }
}

// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Rustux Synchronization Test Suite
//!
//! Scenario tests that run the synchronization objects against real
//! blocking. Every kernel thread is backed by an OS thread; the host port
//! parks it on `switch_out` and unparks it on `wake`.
//!
//! # Organization
//!
//! - [`mutex_tests`] - Fast mutex locking, handoff and timeouts
//! - [`event_tests`] - Event broadcast and release codes
//! - [`flag_tests`] - Flag-group wait modes
//! - [`lifecycle_tests`] - Create/init/kill/delete and kernel teardown
//!
//! # Writing Tests
//!
//! ```rust,ignore
//! let tk = TestKernel::new();
//! tk.bind(PRIORITY_DEFAULT);
//!
//! std::thread::scope(|s| {
//!     let waiter = tk.spawn(s, PRIORITY_DEFAULT, |k| EVENT.wait(k));
//!     tk.wait_for_waiters(&EVENT, 1);
//!     EVENT.give(&tk, RX_OK);
//!     assert_eq!(waiter.join(), RX_OK);
//! });
//! ```


use std::cell::Cell;
use std::collections::HashMap;
use std::ops::Deref;
use std::sync::{Arc, Mutex};
use std::thread::{self, Scope, ScopedJoinHandle};
use std::time::{Duration, Instant};

use crate::kernel::config::KernelConfig;
use crate::kernel::sched::{Kernel, Port};
use crate::kernel::sync::KernelObject;
use crate::rustux::types::*;

/// How long a test waits for another thread to reach a state
const SETTLE_TIMEOUT: Duration = Duration::from_secs(5);

/// Upper bound on one `switch_out`
const PARK_SLICE: Duration = Duration::from_millis(10);

thread_local! {
    static CURRENT: Cell<Option<ThreadId>> = const { Cell::new(None) };
    static IN_IRQ: Cell<bool> = const { Cell::new(false) };
}

/// ============================================================================
/// Host Port
/// ============================================================================

/// Port backed by OS threads
#[derive(Default)]
struct HostPort {
    threads: Mutex<HashMap<ThreadId, thread::Thread>>,
}

impl HostPort {
    /// Bind the calling OS thread to kernel thread `tid`
    fn bind(&self, tid: ThreadId) {
        CURRENT.with(|current| current.set(Some(tid)));
        self.threads.lock().unwrap().insert(tid, thread::current());
    }
}

struct SharedPort(Arc<HostPort>);

impl Port for SharedPort {
    fn current_thread(&self) -> ThreadId {
        CURRENT
            .with(Cell::get)
            .expect("OS thread is not bound to a kernel thread")
    }

    fn in_interrupt(&self) -> bool {
        IN_IRQ.with(Cell::get)
    }

    fn switch_out(&self, _tid: ThreadId) {
        thread::park_timeout(PARK_SLICE);
    }

    fn wake(&self, tid: ThreadId) {
        if let Some(thread) = self.0.threads.lock().unwrap().get(&tid) {
            thread.unpark();
        }
    }
}

/// ============================================================================
/// Test Kernel
/// ============================================================================

/// Kernel context wired to the host port
pub struct TestKernel {
    kernel: Kernel,
    port: Arc<HostPort>,
}

impl TestKernel {
    pub fn new() -> Self {
        Self::with_config(KernelConfig::default())
    }

    pub fn with_config(config: KernelConfig) -> Self {
        let port = Arc::new(HostPort::default());
        Self {
            kernel: Kernel::new(SharedPort(port.clone()), config),
            port,
        }
    }

    /// Register a kernel thread and bind the calling OS thread to it
    pub fn bind(&self, priority: Priority) -> ThreadId {
        let tid = self.kernel.add_thread(priority).unwrap();
        self.port.bind(tid);
        tid
    }

    /// Run `f` on a new kernel thread inside `scope`
    pub fn spawn<'scope, 'env, T, F>(
        &'env self,
        scope: &'scope Scope<'scope, 'env>,
        priority: Priority,
        f: F,
    ) -> Worker<'scope, T>
    where
        F: FnOnce(&'env Kernel) -> T + Send + 'scope,
        T: Send + 'scope,
    {
        let tid = self.kernel.add_thread(priority).unwrap();
        let handle = scope.spawn(move || {
            self.port.bind(tid);
            f(&self.kernel)
        });

        Worker { tid, handle }
    }

    /// Block until exactly `count` threads are queued on `object`
    #[track_caller]
    pub fn wait_for_waiters<O: KernelObject>(&self, object: &O, count: usize) {
        self.settle(|| object.waiters(&self.kernel) == count, "waiter count");
    }

    /// Block until `tid` is suspended
    #[track_caller]
    pub fn wait_blocked(&self, tid: ThreadId) {
        self.settle(|| self.kernel.is_blocked(tid), "blocked thread");
    }

    /// Run `f` as if from an interrupt handler
    pub fn interrupt<T>(&self, f: impl FnOnce() -> T) -> T {
        IN_IRQ.with(|irq| irq.set(true));
        let result = f();
        IN_IRQ.with(|irq| irq.set(false));
        result
    }

    #[track_caller]
    fn settle(&self, mut done: impl FnMut() -> bool, what: &str) {
        let deadline = Instant::now() + SETTLE_TIMEOUT;
        while !done() {
            assert!(Instant::now() < deadline, "timed out waiting for {}", what);
            thread::sleep(Duration::from_millis(1));
        }
    }
}

impl Deref for TestKernel {
    type Target = Kernel;

    fn deref(&self) -> &Kernel {
        &self.kernel
    }
}

/// Kernel thread running on a scoped OS thread
pub struct Worker<'scope, T> {
    pub tid: ThreadId,
    handle: ScopedJoinHandle<'scope, T>,
}

impl<T> Worker<'_, T> {
    /// Wait for the thread and return its result
    pub fn join(self) -> T {
        self.handle.join().expect("kernel thread panicked")
    }
}

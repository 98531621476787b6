// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Fast Mutex
//!
//! Exclusive, non-recursive lock meant for threads of the same priority.
//!
//! # Design
//!
//! - **Ownership tracking**: the mutex records the thread holding it and only
//!   that thread may unlock
//! - **Direct handoff**: unlock passes ownership straight to the head waiter,
//!   so a thread that locks later never overtakes a queued one
//! - **No priority inheritance**: a high-priority waiter behind a
//!   low-priority owner is not boosted
//! - **Recoverable misuse**: unlock by a non-owner fails with
//!   `RX_ERR_TIMED_OUT` instead of panicking
//!
//! # Usage
//!
//! ```rust,ignore
//! static LOCK: FastMutex = FastMutex::new();
//!
//! LOCK.lock(&kernel)?;
//! // Critical section
//! LOCK.unlock(&kernel)?;
//!
//! // Or scoped
//! let _guard = LOCK.guard(&kernel)?;
//! ```

use alloc::boxed::Box;

use crate::err::*;
use crate::kernel::sched::Kernel;
use crate::kernel::sync::object::{self, KernelObject, ObjectBase};
use crate::kernel::thread_lock::CriticalSection;
use crate::kernel::timer::Timeout;
use crate::rustux::types::*;

/// Lock state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MutexState {
    Unlocked,
    Locked(ThreadId),
}

/// ============================================================================
/// Fast Mutex
/// ============================================================================

/// Non-recursive, non-priority-inheriting mutex
#[derive(Debug)]
pub struct FastMutex {
    base: ObjectBase,
    state: spin::Mutex<MutexState>,
}

impl FastMutex {
    /// Create an unlocked mutex for static definition
    pub const fn new() -> Self {
        Self {
            base: ObjectBase::new(),
            state: spin::Mutex::new(MutexState::Unlocked),
        }
    }

    /// Reset a statically defined mutex to unlocked
    pub fn init(&mut self, kernel: &Kernel) {
        object::init(kernel, self, Self::new());
    }

    /// Allocate an unlocked mutex from the object heap
    pub fn create(kernel: &Kernel) -> Result<Box<Self>> {
        object::create(kernel, Self::new())
    }

    /// Lock, waiting as long as it takes
    pub fn lock(&self, kernel: &Kernel) -> Result {
        self.lock_with(kernel, Timeout::INFINITE)
    }

    /// Lock only if the mutex is free right now
    ///
    /// Fails with `RX_ERR_TIMED_OUT` when the mutex is held, including by
    /// the caller.
    pub fn try_lock(&self, kernel: &Kernel) -> Result {
        self.lock_with(kernel, Timeout::IMMEDIATE)
    }

    /// Lock, giving up after `delay` ticks
    pub fn lock_for(&self, kernel: &Kernel, delay: Tick) -> Result {
        self.lock_with(kernel, Timeout::For(delay))
    }

    /// Lock, giving up at tick `deadline`
    pub fn lock_until(&self, kernel: &Kernel, deadline: Tick) -> Result {
        self.lock_with(kernel, Timeout::Until(deadline))
    }

    /// Lock with an explicit timeout
    ///
    /// Returns `Ok` once the caller owns the mutex, `RX_ERR_TIMED_OUT` if
    /// the timeout elapses, `RX_ERR_STOPPED` if the mutex is killed, or the
    /// code of an external resume.
    pub fn lock_with(&self, kernel: &Kernel, timeout: Timeout) -> Result {
        kernel.assert_thread_context("FastMutex::lock");

        let cs = kernel.enter();
        let tid = kernel.current();
        {
            let mut state = self.state.lock();
            match *state {
                MutexState::Unlocked => {
                    *state = MutexState::Locked(tid);
                    return Ok(());
                }
                MutexState::Locked(owner) if owner == tid => {
                    if timeout.is_expired(cs.now()) {
                        return Err(RX_ERR_TIMED_OUT);
                    }
                    panic!("FastMutex: recursive lock by thread {}", tid);
                }
                MutexState::Locked(_) => {}
            }
        }

        status_to_result(kernel.suspend(cs, self.key(), timeout))
    }

    /// Release the mutex
    ///
    /// Ownership goes to the head waiter if there is one. Fails with
    /// `RX_ERR_TIMED_OUT` if the caller does not own the mutex.
    pub fn unlock(&self, kernel: &Kernel) -> Result {
        kernel.assert_thread_context("FastMutex::unlock");

        let mut cs = kernel.enter();
        let tid = kernel.current();
        let mut state = self.state.lock();
        if *state != MutexState::Locked(tid) {
            log_trace!("FastMutex {:?}: unlock by non-owner {}", self.key(), tid);
            return Err(RX_ERR_TIMED_OUT);
        }

        *state = match cs.resume_head(self.key(), RX_OK) {
            Some(next) => {
                log_trace!("FastMutex {:?}: handoff {} -> {}", self.key(), tid, next);
                MutexState::Locked(next)
            }
            None => MutexState::Unlocked,
        };
        Ok(())
    }

    /// Lock and return a guard that unlocks on drop
    pub fn guard<'a>(&'a self, kernel: &'a Kernel) -> Result<FastMutexGuard<'a>> {
        self.lock(kernel)?;
        Ok(FastMutexGuard { mutex: self, kernel })
    }

    /// Current owner
    pub fn owner(&self) -> Option<ThreadId> {
        match *self.state.lock() {
            MutexState::Locked(owner) => Some(owner),
            MutexState::Unlocked => None,
        }
    }

    /// Check if the mutex is held
    pub fn is_locked(&self) -> bool {
        self.owner().is_some()
    }
}

impl Default for FastMutex {
    fn default() -> Self {
        Self::new()
    }
}

impl KernelObject for FastMutex {
    const NAME: &'static str = "FastMutex";

    fn base(&self) -> &ObjectBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ObjectBase {
        &mut self.base
    }

    fn on_kill(&self, _cs: &mut CriticalSection<'_>) {
        *self.state.lock() = MutexState::Unlocked;
    }
}

/// ============================================================================
/// Mutex Guard
/// ============================================================================

/// Held lock on a [`FastMutex`]
pub struct FastMutexGuard<'a> {
    mutex: &'a FastMutex,
    kernel: &'a Kernel,
}

impl Drop for FastMutexGuard<'_> {
    fn drop(&mut self) {
        if let Err(status) = self.mutex.unlock(self.kernel) {
            log_debug!(
                "FastMutex {:?}: guard release failed: {}",
                self.mutex.key(),
                status_str(status)
            );
        }
    }
}

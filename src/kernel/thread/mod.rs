// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Thread Records
//!
//! The kernel keeps one record per thread in its thread table. A record is
//! the only place a blocked thread's transient wait state lives: which
//! queue it sits on, when it expires, the code it will be resumed with,
//! and for flag-group waits the bits it still needs and its wait mode.
//!
//! # Thread States
//!
//! ```text
//! Ready -> Blocked -> Ready
//! ```
//!
//! Records are only read or written with the kernel lock held.

use crate::err::RX_OK;
use crate::kernel::sync::object::QueueKey;
use crate::kernel::sync::WaitMode;
use crate::rustux::types::*;

/// ============================================================================
/// Thread State
/// ============================================================================

/// Thread state
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadState {
    /// Thread is runnable
    Ready = 0,

    /// Thread is suspended on a wait queue
    Blocked = 1,
}

/// Flag-group wait recorded at block time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlagWait {
    /// Bits the thread is still waiting for
    pub remaining: FlagBits,

    /// Mode the wait was issued with
    pub mode: WaitMode,
}

impl FlagWait {
    pub const fn none() -> Self {
        Self {
            remaining: 0,
            mode: WaitMode::empty(),
        }
    }
}

/// Wait bookkeeping for a blocked thread
#[derive(Debug, Clone, Copy)]
pub(crate) struct WaitSlot {
    /// Queue the thread is blocked on
    pub queue: Option<QueueKey>,

    /// Expiry tick (`None` = wait forever)
    pub deadline: Option<Tick>,

    /// Code delivered on resume
    pub result: Status,

    /// Flag-group request, if any
    pub flags: FlagWait,
}

impl WaitSlot {
    const fn new() -> Self {
        Self {
            queue: None,
            deadline: None,
            result: RX_OK,
            flags: FlagWait::none(),
        }
    }
}

/// ============================================================================
/// Thread
/// ============================================================================

/// Kernel thread record
#[derive(Debug, Clone)]
pub struct Thread {
    /// Thread ID
    tid: ThreadId,

    /// Scheduling priority
    priority: Priority,

    /// Current state
    state: ThreadState,

    /// Wait bookkeeping
    pub(crate) wait: WaitSlot,
}

impl Thread {
    /// Create a ready thread record
    pub const fn new(tid: ThreadId, priority: Priority) -> Self {
        Self {
            tid,
            priority,
            state: ThreadState::Ready,
            wait: WaitSlot::new(),
        }
    }

    /// Thread ID
    pub const fn tid(&self) -> ThreadId {
        self.tid
    }

    /// Scheduling priority
    pub const fn priority(&self) -> Priority {
        self.priority
    }

    /// Current state
    pub const fn state(&self) -> ThreadState {
        self.state
    }

    /// Check if the thread is suspended
    pub fn is_blocked(&self) -> bool {
        self.state == ThreadState::Blocked
    }

    /// Flag-group request recorded at block time
    pub fn flag_wait(&self) -> &FlagWait {
        &self.wait.flags
    }

    /// Mutable flag-group request
    pub fn flag_wait_mut(&mut self) -> &mut FlagWait {
        &mut self.wait.flags
    }

    /// Mark the thread blocked on `queue`
    pub(crate) fn block(&mut self, queue: QueueKey, deadline: Option<Tick>) {
        debug_assert!(!self.is_blocked(), "thread {} blocked twice", self.tid);

        self.state = ThreadState::Blocked;
        self.wait.queue = Some(queue);
        self.wait.deadline = deadline;
        self.wait.result = RX_OK;
    }

    /// Mark the thread ready with the code it will observe
    ///
    /// The caller has already unlinked it from its queue.
    pub(crate) fn wake(&mut self, result: Status) {
        self.state = ThreadState::Ready;
        self.wait.queue = None;
        self.wait.deadline = None;
        self.wait.result = result;
    }

    /// Check whether a blocked thread's deadline has passed
    pub(crate) fn is_expired(&self, now: Tick) -> bool {
        self.is_blocked() && matches!(self.wait.deadline, Some(deadline) if deadline <= now)
    }
}

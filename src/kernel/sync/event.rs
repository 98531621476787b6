// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Kernel Event
//!
//! A broadcast rendezvous. Threads wait on the event until some other party
//! calls [`Event::give`] with a result code; every thread waiting at that
//! moment is released with exactly that code.
//!
//! # Design
//!
//! - **Stateless**: no latched signal; a wait always suspends and a give
//!   with nobody waiting is lost
//! - **Broadcast**: one give releases the whole queue, in priority order
//! - **Code as payload**: waits return the raw [`Status`] they were released
//!   with, so applications can pass their own codes
//!
//! # Usage
//!
//! ```rust,ignore
//! static DONE: Event = Event::new();
//!
//! // Waiter
//! let code = DONE.wait(&kernel);
//!
//! // Releaser, task or interrupt context
//! DONE.give(&kernel, RX_OK);
//! ```

use alloc::boxed::Box;

use crate::err::*;
use crate::kernel::sched::Kernel;
use crate::kernel::sync::object::{self, KernelObject, ObjectBase};
use crate::kernel::timer::Timeout;
use crate::rustux::types::*;

/// ============================================================================
/// Event
/// ============================================================================

/// Broadcast rendezvous
#[derive(Debug)]
pub struct Event {
    base: ObjectBase,
}

impl Event {
    /// Create an event for static definition
    pub const fn new() -> Self {
        Self {
            base: ObjectBase::new(),
        }
    }

    /// Reset a statically defined event
    pub fn init(&mut self, kernel: &Kernel) {
        object::init(kernel, self, Self::new());
    }

    /// Allocate an event from the object heap
    pub fn create(kernel: &Kernel) -> Result<Box<Self>> {
        object::create(kernel, Self::new())
    }

    /// Wait until released
    pub fn wait(&self, kernel: &Kernel) -> Status {
        self.wait_with(kernel, Timeout::INFINITE)
    }

    /// Wait at most `delay` ticks
    ///
    /// `IMMEDIATE` returns `RX_ERR_TIMED_OUT` straight away.
    pub fn wait_for(&self, kernel: &Kernel, delay: Tick) -> Status {
        self.wait_with(kernel, Timeout::For(delay))
    }

    /// Wait until tick `deadline`
    pub fn wait_until(&self, kernel: &Kernel, deadline: Tick) -> Status {
        self.wait_with(kernel, Timeout::Until(deadline))
    }

    /// Wait with an explicit timeout
    ///
    /// Returns the code passed to `give`, `RX_ERR_STOPPED` if the event is
    /// killed, `RX_ERR_TIMED_OUT`, or the code of an external resume.
    pub fn wait_with(&self, kernel: &Kernel, timeout: Timeout) -> Status {
        kernel.assert_thread_context("Event::wait");

        let cs = kernel.enter();
        kernel.suspend(cs, self.key(), timeout)
    }

    /// Release every waiting thread with `code`
    ///
    /// Callable from interrupt context. Returns the number of threads
    /// released.
    pub fn give(&self, kernel: &Kernel, code: Status) -> usize {
        let mut cs = kernel.enter();
        let released = cs.resume_all(self.key(), code);

        log_trace!(
            "Event {:?}: give {} released {} thread(s)",
            self.key(),
            status_str(code),
            released
        );
        released
    }
}

impl Default for Event {
    fn default() -> Self {
        Self::new()
    }
}

impl KernelObject for Event {
    const NAME: &'static str = "Event";

    fn base(&self) -> &ObjectBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ObjectBase {
        &mut self.base
    }
}

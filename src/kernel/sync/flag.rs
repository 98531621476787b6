// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Event-Flag Group
//!
//! A persistent bitmask threads can wait on. Bits stay set (latched) until
//! a read consumes them or [`FlagGroup::clear`] drops them.
//!
//! # Wait Modes
//!
//! | mode      | unset (default)                      | set                                  |
//! |-----------|--------------------------------------|--------------------------------------|
//! | `ALL`     | any requested bit satisfies          | every requested bit is required      |
//! | `PROTECT` | requested bits are cleared on a read | the group is left untouched          |
//! | `IGNORE`  | bits already pending count           | only bits given after the call count |
//!
//! A read that does not use `PROTECT` clears the requested bits whether or
//! not it succeeds.
//!
//! # Usage
//!
//! ```rust,ignore
//! let group = FlagGroup::create(&kernel, 0)?;
//!
//! // Interrupt handler
//! group.give(&kernel, RX_DONE | TX_DONE);
//!
//! // Task
//! group.wait(&kernel, RX_DONE | TX_DONE, WaitMode::ALL)?;
//! ```

use alloc::boxed::Box;

use bitflags::bitflags;

use crate::err::*;
use crate::kernel::sched::Kernel;
use crate::kernel::sync::object::{self, KernelObject, ObjectBase};
use crate::kernel::thread::FlagWait;
use crate::kernel::timer::Timeout;
use crate::rustux::types::*;

// ============================================================================
// Wait Mode
// ============================================================================

bitflags! {
    /// Flag-group read options
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct WaitMode: u32 {
        /// Require every requested bit
        const ALL = 1 << 0;

        /// Leave the group's bits untouched on a read
        const PROTECT = 1 << 1;

        /// Disregard bits already pending when the read starts
        const IGNORE = 1 << 2;
    }
}

impl WaitMode {
    /// Any requested bit, consuming, latched history
    pub const ANY: Self = Self::empty();
}

#[track_caller]
fn assert_mode(mode: WaitMode) {
    assert!(
        WaitMode::all().contains(mode),
        "FlagGroup: invalid wait mode {:#x}",
        mode.bits()
    );
}

/// Evaluate a read of `mask` against `flags`
///
/// Applies the read's clearing to `flags`. On failure returns the requested
/// bits that are still missing.
fn evaluate(
    flags: &mut FlagBits,
    mask: FlagBits,
    mode: WaitMode,
) -> core::result::Result<(), FlagBits> {
    let mut remaining = mask;
    if !mode.contains(WaitMode::IGNORE) {
        remaining &= !*flags;
    }

    if !mode.contains(WaitMode::PROTECT) {
        *flags &= !mask;
    }

    if remaining == 0 || (!mode.contains(WaitMode::ALL) && remaining != mask) {
        Ok(())
    } else {
        Err(remaining)
    }
}

/// ============================================================================
/// Flag Group
/// ============================================================================

/// Event-flag group
#[derive(Debug)]
pub struct FlagGroup {
    base: ObjectBase,
    flags: spin::Mutex<FlagBits>,
}

impl FlagGroup {
    /// Create a group for static definition
    pub const fn new(flags: FlagBits) -> Self {
        Self {
            base: ObjectBase::new(),
            flags: spin::Mutex::new(flags),
        }
    }

    /// Reset a statically defined group to `flags`
    pub fn init(&mut self, kernel: &Kernel, flags: FlagBits) {
        object::init(kernel, self, Self::new(flags));
    }

    /// Allocate a group from the object heap
    pub fn create(kernel: &Kernel, flags: FlagBits) -> Result<Box<Self>> {
        object::create(kernel, Self::new(flags))
    }

    /// Read `mask` without waiting
    ///
    /// Callable from interrupt context. Fails with `RX_ERR_TIMED_OUT` if
    /// the read is not satisfied.
    pub fn take(&self, kernel: &Kernel, mask: FlagBits, mode: WaitMode) -> Result {
        assert_mode(mode);

        let _cs = kernel.enter();
        let mut flags = self.flags.lock();
        evaluate(&mut flags, mask, mode).map_err(|_| RX_ERR_TIMED_OUT)
    }

    /// Read `mask`, waiting as long as it takes
    pub fn wait(&self, kernel: &Kernel, mask: FlagBits, mode: WaitMode) -> Result {
        self.wait_with(kernel, mask, mode, Timeout::INFINITE)
    }

    /// Read `mask`, giving up after `delay` ticks
    pub fn wait_for(&self, kernel: &Kernel, mask: FlagBits, mode: WaitMode, delay: Tick) -> Result {
        self.wait_with(kernel, mask, mode, Timeout::For(delay))
    }

    /// Read `mask`, giving up at tick `deadline`
    pub fn wait_until(
        &self,
        kernel: &Kernel,
        mask: FlagBits,
        mode: WaitMode,
        deadline: Tick,
    ) -> Result {
        self.wait_with(kernel, mask, mode, Timeout::Until(deadline))
    }

    /// Read `mask` with an explicit timeout
    ///
    /// An unsatisfied read records the missing bits on the calling thread
    /// and suspends it until a `give` completes the request.
    pub fn wait_with(
        &self,
        kernel: &Kernel,
        mask: FlagBits,
        mode: WaitMode,
        timeout: Timeout,
    ) -> Result {
        kernel.assert_thread_context("FlagGroup::wait");
        assert_mode(mode);

        let mut cs = kernel.enter();
        let remaining = match evaluate(&mut self.flags.lock(), mask, mode) {
            Ok(()) => return Ok(()),
            Err(remaining) => remaining,
        };

        let tid = kernel.current();
        *cs.thread_mut(tid).flag_wait_mut() = FlagWait { remaining, mode };

        status_to_result(kernel.suspend(cs, self.key(), timeout))
    }

    /// Set `mask` and release every waiter it satisfies
    ///
    /// Waiters are visited in queue order and each sees the bits left by
    /// the ones before it. Callable from interrupt context. Returns the
    /// group's bits afterwards.
    pub fn give(&self, kernel: &Kernel, mask: FlagBits) -> FlagBits {
        let mut cs = kernel.enter();
        let mut flags = self.flags.lock();
        *flags |= mask;

        let released = cs.resume_where(self.key(), |thread| {
            let wait = thread.flag_wait_mut();
            let matched = wait.remaining & *flags;
            if matched == 0 {
                return None;
            }

            if !wait.mode.contains(WaitMode::PROTECT) {
                *flags &= !wait.remaining;
            }
            wait.remaining &= !matched;

            if wait.mode.contains(WaitMode::ALL) && wait.remaining != 0 {
                None
            } else {
                Some(RX_OK)
            }
        });

        log_trace!(
            "FlagGroup {:?}: give {:#x} released {} thread(s), flags now {:#x}",
            self.key(),
            mask,
            released,
            *flags
        );
        *flags
    }

    /// Clear `mask` without touching any waiter
    ///
    /// Callable from interrupt context. Returns the bits before the clear.
    pub fn clear(&self, kernel: &Kernel, mask: FlagBits) -> FlagBits {
        let _cs = kernel.enter();
        let mut flags = self.flags.lock();
        let prior = *flags;
        *flags &= !mask;
        prior
    }

    /// Snapshot of the pending bits
    pub fn flags(&self, kernel: &Kernel) -> FlagBits {
        let _cs = kernel.enter();
        let flags = *self.flags.lock();
        flags
    }
}

impl KernelObject for FlagGroup {
    const NAME: &'static str = "FlagGroup";

    fn base(&self) -> &ObjectBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ObjectBase {
        &mut self.base
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(flags: FlagBits, mask: FlagBits, mode: WaitMode) -> (bool, FlagBits) {
        let mut flags = flags;
        let ok = evaluate(&mut flags, mask, mode).is_ok();
        (ok, flags)
    }

    #[test]
    fn test_evaluate_all_consume() {
        assert_eq!(eval(0b101, 0b101, WaitMode::ALL), (true, 0));
        assert_eq!(eval(0b100, 0b101, WaitMode::ALL), (false, 0));
    }

    #[test]
    fn test_evaluate_any_protect() {
        assert_eq!(eval(0b100, 0b110, WaitMode::ANY | WaitMode::PROTECT), (true, 0b100));
        assert_eq!(eval(0b001, 0b110, WaitMode::PROTECT), (false, 0b001));
    }

    #[test]
    fn test_evaluate_any_consume_clears_requested_only() {
        assert_eq!(eval(0b1100, 0b0110, WaitMode::ANY), (true, 0b1000));
    }

    #[test]
    fn test_evaluate_unsatisfied_read_still_clears() {
        assert_eq!(eval(0b010, 0b101, WaitMode::ALL), (false, 0b010));
        assert_eq!(eval(0b011, 0b101, WaitMode::ALL), (false, 0b010));
    }

    #[test]
    fn test_evaluate_ignore_history() {
        assert_eq!(eval(0b001, 0b001, WaitMode::IGNORE), (false, 0));
        assert_eq!(
            eval(0b001, 0b001, WaitMode::IGNORE | WaitMode::PROTECT),
            (false, 0b001)
        );
    }

    #[test]
    fn test_evaluate_remaining_bits() {
        let mut flags = 0b0011;
        assert_eq!(evaluate(&mut flags, 0b1110, WaitMode::ALL), Err(0b1100));
    }

    #[test]
    fn test_evaluate_empty_mask() {
        assert_eq!(eval(0, 0, WaitMode::ALL), (true, 0));
        assert_eq!(eval(0, 0, WaitMode::ANY), (true, 0));
    }

    #[test]
    #[should_panic(expected = "invalid wait mode")]
    fn test_assert_mode_unknown_bits() {
        assert_mode(WaitMode::from_bits_retain(1 << 5));
    }
}

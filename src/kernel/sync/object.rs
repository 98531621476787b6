// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Synchronization Object Base
//!
//! Lifecycle shared by every synchronization object:
//!
//! - **init**: reset a statically defined or stack-scoped object in place
//! - **create**: allocate from the object heap and tag the object as heap-owned
//! - **kill**: resume every waiter with `RX_ERR_STOPPED`
//! - **delete**: kill, then give heap memory back if the object owns it
//!
//! An object carries no thread references. Its wait queue lives in the
//! kernel context under the object's [`QueueKey`], which is the address of
//! its [`ObjectBase`]; an object must therefore stay put while threads are
//! blocked on it.

use alloc::boxed::Box;

use crate::err::*;
use crate::kernel::heap;
use crate::kernel::sched::Kernel;
use crate::kernel::thread_lock::CriticalSection;

/// ============================================================================
/// Queue Key
/// ============================================================================

/// Handle the kernel files an object's waiters under
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct QueueKey(usize);

impl QueueKey {
    /// Key from a raw handle value
    pub const fn from_raw(raw: usize) -> Self {
        Self(raw)
    }

    /// Key of an object base
    pub fn of(base: &ObjectBase) -> Self {
        Self(base as *const ObjectBase as usize)
    }

    /// Raw handle value
    pub const fn into_raw(self) -> usize {
        self.0
    }
}

/// ============================================================================
/// Object Base
/// ============================================================================

/// Where an object's memory came from
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    /// Statically defined or stack-scoped; never freed by `delete`
    Static = 0,

    /// Allocated by `create`; freed by `delete`
    Heap = 1,
}

/// Control block header embedded in every synchronization object
#[derive(Debug)]
pub struct ObjectBase {
    ownership: Ownership,
}

impl ObjectBase {
    /// Header for a statically defined object
    pub const fn new() -> Self {
        Self {
            ownership: Ownership::Static,
        }
    }

    /// Wait queue handle
    pub fn key(&self) -> QueueKey {
        QueueKey::of(self)
    }

    /// Ownership tag
    pub const fn ownership(&self) -> Ownership {
        self.ownership
    }

    fn mark_heap(&mut self) {
        self.ownership = Ownership::Heap;
    }
}

impl Default for ObjectBase {
    fn default() -> Self {
        Self::new()
    }
}

/// ============================================================================
/// Kernel Object
/// ============================================================================

/// Lifecycle shared by the synchronization objects
pub trait KernelObject: Send + Sync {
    /// Object kind, for log output
    const NAME: &'static str;

    fn base(&self) -> &ObjectBase;

    fn base_mut(&mut self) -> &mut ObjectBase;

    /// Reset object state after its waiters were stopped
    fn on_kill(&self, _cs: &mut CriticalSection<'_>) {}

    /// Wait queue handle
    fn key(&self) -> QueueKey {
        self.base().key()
    }

    /// Resume every waiter with `RX_ERR_STOPPED`
    ///
    /// Does not free memory. Killing an object with no waiters only resets
    /// its state. Returns the number of threads stopped.
    fn kill(&self, kernel: &Kernel) -> usize
    where
        Self: Sized,
    {
        kernel.assert_thread_context("kill");

        let mut cs = kernel.enter();
        kill_locked(self, &mut cs)
    }

    /// Kill the object and release its memory if it was heap-created
    fn delete(self: Box<Self>, kernel: &Kernel)
    where
        Self: Sized,
    {
        kernel.assert_thread_context("delete");

        let mut cs = kernel.enter();
        kill_locked(&*self, &mut cs);

        match self.base().ownership() {
            Ownership::Heap => {
                log_debug!("{} {:?} deleted", Self::NAME, self.key());
                heap::release(&mut cs, self);
            }
            Ownership::Static => drop(self),
        }
    }

    /// Number of threads blocked on the object
    fn waiters(&self, kernel: &Kernel) -> usize {
        kernel.enter().waiter_count(self.key())
    }
}

fn kill_locked<T: KernelObject>(object: &T, cs: &mut CriticalSection<'_>) -> usize {
    let stopped = cs.resume_all(object.key(), RX_ERR_STOPPED);
    object.on_kill(cs);

    log_debug!("{} {:?} killed: {} waiter(s) stopped", T::NAME, object.key(), stopped);
    stopped
}

/// Reset `object` in place to `value`
///
/// Thread context only. The `&mut` borrow guarantees nothing is blocked on
/// the object. The ownership tag survives the reset.
pub fn init<T: KernelObject>(kernel: &Kernel, object: &mut T, value: T) {
    kernel.assert_thread_context("init");

    let _cs = kernel.enter();
    let ownership = object.base().ownership;
    *object = value;
    object.base_mut().ownership = ownership;

    log_debug!("{} {:?} initialized", T::NAME, object.key());
}

/// Allocate `value` from the object heap and tag it heap-owned
///
/// Thread context only. Fails with `RX_ERR_NO_MEMORY` when the heap budget
/// or the allocator is exhausted.
pub fn create<T: KernelObject>(kernel: &Kernel, mut value: T) -> Result<Box<T>> {
    kernel.assert_thread_context("create");

    let mut cs = kernel.enter();
    value.base_mut().mark_heap();
    let object = heap::allocate(&mut cs, kernel.config().heap_limit, value)?;

    log_debug!("{} {:?} created", T::NAME, object.key());
    Ok(object)
}

// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Kernel Critical Section
//!
//! The single global lock of the kernel: interrupts are masked through the
//! port and the kernel state spinlock is held for as long as the guard
//! lives. Every object operation takes exactly one guard per call and
//! passes `&mut CriticalSection` down to its helpers instead of taking the
//! lock again.

use core::mem::ManuallyDrop;
use core::ops::{Deref, DerefMut};

use crate::kernel::sched::{KernelState, Port};

/// Saved interrupt state, opaque to the kernel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IrqState(pub usize);

/// Critical section guard
///
/// Dropping the guard releases the kernel lock first and then restores the
/// interrupt state saved on entry.
pub struct CriticalSection<'a> {
    pub(crate) port: &'a dyn Port,
    irq: IrqState,
    state: ManuallyDrop<spin::MutexGuard<'a, KernelState>>,
}

impl<'a> CriticalSection<'a> {
    pub(crate) fn enter(port: &'a dyn Port, state: &'a spin::Mutex<KernelState>) -> Self {
        let irq = port.irq_save();
        let state = ManuallyDrop::new(state.lock());
        Self { port, irq, state }
    }
}

impl Deref for CriticalSection<'_> {
    type Target = KernelState;

    fn deref(&self) -> &KernelState {
        &self.state
    }
}

impl DerefMut for CriticalSection<'_> {
    fn deref_mut(&mut self) -> &mut KernelState {
        &mut self.state
    }
}

impl Drop for CriticalSection<'_> {
    fn drop(&mut self) {
        // SAFETY: the guard is dropped exactly once, here, and never used after.
        unsafe { ManuallyDrop::drop(&mut self.state) };
        self.port.irq_restore(self.irq);
    }
}

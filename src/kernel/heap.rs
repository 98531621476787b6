// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Object Heap
//!
//! Dynamically created objects draw on a byte budget
//! (`KernelConfig::heap_limit`) tracked by the kernel context. Allocation is
//! fallible all the way down: the budget is checked first, then the global
//! allocator is asked directly so an out-of-memory condition comes back as
//! `RX_ERR_NO_MEMORY` instead of aborting.

use alloc::alloc::{alloc, Layout};
use alloc::boxed::Box;

use crate::err::*;
use crate::kernel::thread_lock::CriticalSection;

/// Move `value` onto the heap, charging its size against `limit`
///
/// Reservation, allocation and rollback all happen under the caller's
/// critical section.
pub fn allocate<T>(cs: &mut CriticalSection<'_>, limit: usize, value: T) -> Result<Box<T>> {
    let layout = Layout::new::<T>();
    if layout.size() == 0 {
        return Ok(Box::new(value));
    }

    cs.heap_reserve(layout.size(), limit)?;

    // SAFETY: layout has a non-zero size.
    let ptr = unsafe { alloc(layout) } as *mut T;
    if ptr.is_null() {
        cs.heap_unreserve(layout.size());
        return Err(RX_ERR_NO_MEMORY);
    }

    log_trace!("Heap: allocated {} bytes at {:p}", layout.size(), ptr);

    // SAFETY: ptr is a fresh allocation with T's layout, so it is valid for
    // a write of T and may be owned by a Box.
    unsafe {
        ptr.write(value);
        Ok(Box::from_raw(ptr))
    }
}

/// Drop a heap-created object and return its bytes to the budget
pub fn release<T>(cs: &mut CriticalSection<'_>, object: Box<T>) {
    let size = core::mem::size_of::<T>();
    if size != 0 {
        cs.heap_unreserve(size);
    }

    log_trace!("Heap: released {} bytes", size);
    drop(object);
}

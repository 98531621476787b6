// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Rustux Synchronization Layer
//!
//! Kernel synchronization objects for small preemptive real-time targets:
//! a fast mutex, a broadcast event and an event-flag group. They sit on top
//! of the scheduler's block/wake bridge ([`kernel::sched::Kernel`]) and a
//! single global critical section.
//!
//! # Usage
//!
//! ```rust,ignore
//! let kernel = Kernel::new(port, KernelConfig::default());
//!
//! static LOCK: FastMutex = FastMutex::new();
//! LOCK.lock(&kernel)?;
//! LOCK.unlock(&kernel)?;
//!
//! let flags = FlagGroup::create(&kernel, 0)?;
//! flags.give(&kernel, 0b101);
//! flags.take(&kernel, 0b101, WaitMode::ALL)?;
//! flags.delete(&kernel);
//! ```

#![cfg_attr(not(test), no_std)]

extern crate alloc;

// Common types
pub mod rustux;

// Status codes
pub mod err;

// Kernel modules
pub mod kernel;

pub use err::*;
pub use kernel::config::KernelConfig;
pub use kernel::sched::{Kernel, Port};
pub use kernel::sync::{
    Event, FastMutex, FastMutexGuard, FlagGroup, KernelObject, ObjectBase, Ownership, WaitMode,
};
pub use kernel::thread_lock::{CriticalSection, IrqState};
pub use kernel::timer::{Timeout, IMMEDIATE, INFINITE};
pub use rustux::types::*;

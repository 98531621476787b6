// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Kernel Synchronization Primitives
//!
//! # Primitives
//!
//! - **FastMutex**: Exclusive, non-recursive lock for threads of equal priority
//! - **Event**: Broadcast rendezvous released with a caller-chosen code
//! - **FlagGroup**: Persistent bitmask with any/all, consume/protect and
//!   latched/ignored-history waits
//! - **Wait Queue**: Priority-ordered queue of threads blocked on an object
//!
//! # Design
//!
//! Every operation runs inside exactly one kernel critical section. A call
//! that cannot complete suspends the caller once through
//! [`Kernel::suspend`](crate::kernel::sched::Kernel::suspend) and returns the
//! code it was resumed with.

pub mod event;
pub mod flag;
pub mod mutex;
pub mod object;
pub mod wait_queue;

// Re-exports
pub use event::Event;
pub use flag::{FlagGroup, WaitMode};
pub use mutex::{FastMutex, FastMutexGuard};
pub use object::{KernelObject, ObjectBase, Ownership, QueueKey};
pub use wait_queue::{WaitQueue, WaitQueueEntry};

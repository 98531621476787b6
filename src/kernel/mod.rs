// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Rustux Microkernel - Synchronization Core
//!
//! This module contains the kernel context the synchronization objects run
//! against (thread table, wait queues, tick time, object heap) and the
//! objects themselves.

// Logging macros must be visible to every module below
#[macro_use]
pub mod debug;

pub mod config;
pub mod heap;
pub mod sched;
pub mod sync;
pub mod thread;
pub mod thread_lock;
pub mod timer;

#[cfg(test)]
mod tests;

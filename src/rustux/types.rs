// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Common type aliases used throughout the kernel

/// Error code type (negative values indicate errors)
pub type Status = i32;

/// Legacy status type (alias for Status)
#[allow(non_camel_case_types)]
pub type rx_status_t = Status;

/// Result type for kernel operations
pub type Result<T = ()> = core::result::Result<T, Status>;

/// Thread ID type (index into the kernel thread table)
pub type ThreadId = u32;

/// Thread priority (higher value runs first)
pub type Priority = u8;

/// Time value in system ticks
pub type Tick = u64;

/// Event-flag group bitmask
pub type FlagBits = u32;

// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Kernel Error Codes
//!
//! Status codes shared by every synchronization object. A blocked thread
//! always returns exactly one of these, or whatever code an external
//! resumer handed it.

pub use crate::rustux::types::{rx_status_t, Result, Status};

/// Success status code
pub const RX_OK: Status = 0;

/// Invalid arguments error
pub const RX_ERR_INVALID_ARGS: Status = -10;

/// No memory error
pub const RX_ERR_NO_MEMORY: Status = -12;

/// Timeout error (deadline elapsed, or condition unmet on a non-blocking call)
pub const RX_ERR_TIMED_OUT: Status = -5;

/// The object was killed while the thread was waiting on it
pub const RX_ERR_STOPPED: Status = -14;

/// Kernel table exhausted
pub const RX_ERR_NO_RESOURCES: Status = -15;

/// Convert a wait status into a `Result`
///
/// Only `RX_OK` maps to `Ok`; every other code, including
/// application-defined resume codes, is passed through as `Err`.
pub const fn status_to_result(status: Status) -> Result {
    if status == RX_OK {
        Ok(())
    } else {
        Err(status)
    }
}

/// Short name for a status code, for log output
pub fn status_str(status: Status) -> &'static str {
    match status {
        RX_OK => "OK",
        RX_ERR_INVALID_ARGS => "INVALID_ARGS",
        RX_ERR_NO_MEMORY => "NO_MEMORY",
        RX_ERR_TIMED_OUT => "TIMED_OUT",
        RX_ERR_STOPPED => "STOPPED",
        RX_ERR_NO_RESOURCES => "NO_RESOURCES",
        _ => "USER",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_to_result() {
        assert_eq!(status_to_result(RX_OK), Ok(()));
        assert_eq!(status_to_result(RX_ERR_STOPPED), Err(RX_ERR_STOPPED));
        assert_eq!(status_to_result(42), Err(42));
    }

    #[test]
    fn test_status_str() {
        assert_eq!(status_str(RX_ERR_TIMED_OUT), "TIMED_OUT");
        assert_eq!(status_str(7), "USER");
    }
}

// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Wait Timeouts
//!
//! Every blocking call takes either a relative delay or an absolute
//! deadline, both in system ticks. The tick source itself lives outside
//! this crate; it drives [`Kernel::advance`](crate::Kernel::advance) and
//! the kernel resumes expired waiters with `RX_ERR_TIMED_OUT`.

use crate::rustux::types::Tick;

/// Delay sentinel: do not wait at all
pub const IMMEDIATE: Tick = 0;

/// Delay sentinel: wait until released, never time out
pub const INFINITE: Tick = Tick::MAX;

/// How long a blocking call may stay suspended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timeout {
    /// Relative delay in ticks (`IMMEDIATE` and `INFINITE` are honored)
    For(Tick),

    /// Absolute tick deadline
    Until(Tick),
}

impl Timeout {
    /// Never suspend
    pub const IMMEDIATE: Self = Timeout::For(IMMEDIATE);

    /// Never time out
    pub const INFINITE: Self = Timeout::For(INFINITE);

    /// Absolute expiry tick for a wait starting at `now`
    ///
    /// `None` means the wait never expires.
    pub fn deadline(self, now: Tick) -> Option<Tick> {
        match self {
            Timeout::For(INFINITE) => None,
            Timeout::For(delay) => Some(now.saturating_add(delay)),
            Timeout::Until(deadline) => Some(deadline),
        }
    }

    /// Whether a wait starting at `now` has already expired
    pub fn is_expired(self, now: Tick) -> bool {
        matches!(self.deadline(now), Some(deadline) if deadline <= now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_deadline() {
        assert_eq!(Timeout::For(5).deadline(10), Some(15));
        assert_eq!(Timeout::Until(12).deadline(10), Some(12));
        assert_eq!(Timeout::INFINITE.deadline(10), None);
        assert_eq!(Timeout::For(INFINITE - 1).deadline(10), Some(INFINITE));
    }

    #[test]
    fn test_timeout_expired() {
        assert!(Timeout::IMMEDIATE.is_expired(0));
        assert!(Timeout::Until(3).is_expired(3));
        assert!(!Timeout::Until(4).is_expired(3));
        assert!(!Timeout::INFINITE.is_expired(Tick::MAX));
    }
}

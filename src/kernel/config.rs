// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Kernel Configuration
//!
//! Sizing knobs for the kernel context. Values come either from
//! [`KernelConfig::default`] or from a boot command line of space-separated
//! `key=value` options.
//!
//! # Usage
//!
//! ```rust,ignore
//! let config = KernelConfig::from_cmdline("kernel.max_threads=8 kernel.heap_limit=2048")?;
//! let kernel = Kernel::new(port, config);
//! ```

use crate::err::*;
use crate::rustux::types::*;

/// ============================================================================
/// Configuration Constants
/// ============================================================================

/// Default thread priority
pub const PRIORITY_DEFAULT: Priority = 128;

/// Default size of the thread table
pub const DEFAULT_MAX_THREADS: usize = 16;

/// Default byte budget for dynamically created objects
pub const DEFAULT_HEAP_LIMIT: usize = 4096;

/// Command line key for the thread table size
const KEY_MAX_THREADS: &str = "kernel.max_threads";

/// Command line key for the object heap budget
const KEY_HEAP_LIMIT: &str = "kernel.heap_limit";

/// ============================================================================
/// Kernel Configuration
/// ============================================================================

/// Kernel context configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KernelConfig {
    /// Maximum number of threads the kernel will track
    pub max_threads: usize,

    /// Bytes available to `create` for dynamically allocated objects
    pub heap_limit: usize,
}

impl KernelConfig {
    /// Create the default configuration
    pub const fn new() -> Self {
        Self {
            max_threads: DEFAULT_MAX_THREADS,
            heap_limit: DEFAULT_HEAP_LIMIT,
        }
    }

    /// Set the thread table size
    pub const fn max_threads(mut self, max_threads: usize) -> Self {
        self.max_threads = max_threads;
        self
    }

    /// Set the object heap budget
    pub const fn heap_limit(mut self, heap_limit: usize) -> Self {
        self.heap_limit = heap_limit;
        self
    }

    /// Parse a boot command line
    ///
    /// Options are separated by whitespace. Unknown keys are skipped,
    /// a missing or malformed value for a known key fails with
    /// `RX_ERR_INVALID_ARGS`.
    pub fn from_cmdline(cmdline: &str) -> Result<Self> {
        let mut config = Self::new();

        for option in cmdline.split_whitespace() {
            let (key, value) = match option.split_once('=') {
                Some((key, value)) => (key, value),
                None => (option, ""),
            };

            match key {
                KEY_MAX_THREADS => config.max_threads = parse_usize(key, value)?,
                KEY_HEAP_LIMIT => config.heap_limit = parse_usize(key, value)?,
                _ => log_warn!("Ignoring unknown kernel option '{}'", key),
            }
        }

        Ok(config)
    }
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse a decimal or `0x`-prefixed hexadecimal value
fn parse_usize(key: &str, value: &str) -> Result<usize> {
    let parsed = match value.strip_prefix("0x") {
        Some(hex) => usize::from_str_radix(hex, 16),
        None => value.parse::<usize>(),
    };

    parsed.map_err(|_| {
        log_warn!("Bad value '{}' for kernel option '{}'", value, key);
        RX_ERR_INVALID_ARGS
    })
}

// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Error types for xom-scan.

use thiserror::Error;

/// Errors produced while scanning the process mappings.
#[derive(Debug, Error, Clone, Eq, PartialEq)]
pub enum ScanError {
    /// The introspection source could not be opened or read.
    #[error("failed to read memory maps (errno {errno})")]
    Io {
        /// `errno` of the failed read.
        errno: i32,
    },

    /// A record did not match the maps format. Skipped during scans.
    #[error("malformed maps record: {line:?}")]
    Parse {
        /// Offending record.
        line: String,
    },
}

impl From<std::io::Error> for ScanError {
    fn from(e: std::io::Error) -> Self {
        Self::Io {
            errno: e.raw_os_error().unwrap_or(libc::EIO),
        }
    }
}

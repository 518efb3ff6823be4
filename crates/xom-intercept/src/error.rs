// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Error types for xom-intercept.

use thiserror::Error;
use xom_backend::BackendError;
use xom_scan::ScanError;

/// An `errno` value reported by a real memory operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Errno(pub libc::c_int);

impl Errno {
    /// Reads the calling thread's `errno`.
    pub fn last() -> Self {
        Self(
            std::io::Error::last_os_error()
                .raw_os_error()
                .unwrap_or(libc::EIO),
        )
    }
}

impl core::fmt::Display for Errno {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "errno {}", self.0)
    }
}

/// Errors raised by the protection layer itself.
#[derive(Debug, Error, Clone, Eq, PartialEq)]
pub enum XomError {
    /// A backend request failed.
    #[error("backend: {0}")]
    Backend(#[from] BackendError),

    /// The region scan of a bulk operation failed.
    #[error("scan: {0}")]
    Scan(#[from] ScanError),

    /// An original operation could not be resolved at attach.
    #[error("failed to resolve original {symbol}")]
    SymbolResolution {
        /// Symbol that was not found.
        symbol: String,
    },

    /// An address range wrapped around the address space.
    #[error("range starting at {start:#x} with length {len} overflows")]
    InvalidRange {
        /// Requested start address.
        start: usize,
        /// Requested length.
        len: usize,
    },
}

impl XomError {
    /// Returns the `errno` to report at a C boundary.
    pub fn errno(&self) -> libc::c_int {
        match self {
            Self::Backend(e) => e.errno(),
            Self::Scan(ScanError::Io { errno }) => *errno,
            Self::Scan(ScanError::Parse { .. }) => libc::EIO,
            Self::SymbolResolution { .. } => libc::ENOSYS,
            Self::InvalidRange { .. } => libc::EINVAL,
        }
    }
}

/// Failure of a wrapped operation.
#[derive(Debug, Error, Clone, Eq, PartialEq)]
pub enum InterceptError {
    /// The real operation failed; nothing was sent to the backend.
    #[error("operation failed: {0}")]
    Os(Errno),

    /// The protection layer failed, before or after the real operation.
    #[error(transparent)]
    Xom(#[from] XomError),
}

impl InterceptError {
    /// Returns the `errno` to report at a C boundary.
    pub fn errno(&self) -> libc::c_int {
        match self {
            Self::Os(errno) => errno.0,
            Self::Xom(e) => e.errno(),
        }
    }
}

impl From<Errno> for InterceptError {
    fn from(errno: Errno) -> Self {
        Self::Os(errno)
    }
}

// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Error types for xom-backend.

use std::path::PathBuf;

use thiserror::Error;

use crate::range::MemoryRange;

/// Backend request that produced a [`BackendError::Rejected`].
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
#[repr(u8)]
pub enum BackendOp {
    /// Single-range registration.
    Register = 0,
    /// Single-range unregistration.
    Unregister = 1,
    /// Native whole-address-space registration.
    RegisterAll = 2,
    /// Native whole-address-space unregistration.
    UnregisterAll = 3,
    /// Flush of a pending batch.
    Commit = 4,
}

impl core::fmt::Display for BackendOp {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            Self::Register => "register",
            Self::Unregister => "unregister",
            Self::RegisterAll => "register-all",
            Self::UnregisterAll => "unregister-all",
            Self::Commit => "commit",
        };
        f.write_str(name)
    }
}

/// Errors returned by a [`Backend`](crate::Backend).
#[derive(Debug, Error, Clone, Eq, PartialEq)]
pub enum BackendError {
    /// The device could not be opened (missing, permission denied).
    #[error("backend unavailable at {path:?} (errno {errno})")]
    Unavailable {
        /// Device path that failed to open.
        path: PathBuf,
        /// `errno` reported by `open(2)`.
        errno: i32,
    },

    /// A request was issued while the handle is closed.
    #[error("backend is not open")]
    NotOpen,

    /// The device refused a request.
    #[error("backend rejected {op} of {range:?} (errno {errno})")]
    Rejected {
        /// Rejected request.
        op: BackendOp,
        /// Range carried by the request, `None` for payload-less requests.
        range: Option<MemoryRange>,
        /// `errno` reported by the device.
        errno: i32,
    },
}

impl BackendError {
    /// Returns the `errno` to report at a C boundary.
    pub fn errno(&self) -> i32 {
        match self {
            Self::Unavailable { errno, .. } | Self::Rejected { errno, .. } => *errno,
            Self::NotOpen => libc::EBADF,
        }
    }
}

// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! # xom_intercept
//!
//! Memory-lifecycle interception that keeps an execute-only-memory backend in
//! sync with the executable mappings of the process.
//!
//! Invariant: the backend's registered set equals the set of byte ranges
//! currently mapped with execute permission. Every wrapped operation in
//! [`XomContext`] calls the real implementation and the backend in the order
//! that preserves it:
//!
//! | Operation | Order |
//! |---|---|
//! | `mmap`, `mprotect`, `pkey_mprotect`, `shmat` | real, then register if executable |
//! | `madvise`, `mlock`, `mlock2` | real, then register the executable parts |
//! | `munmap`, `shmdt` | unregister, then real (aborted if unregister fails); zero-length `munmap` is passed through |
//! | `mremap` | look up old protection, unregister old, real, register new if the old range was executable |
//!
//! A failing real operation is returned unchanged and never reaches the
//! backend. A failing backend call after a successful real operation is
//! reported as the wrapper's failure, with no rollback: the memory change
//! stays in place, unprotected.
//!
//! ## Core Types
//!
//! - [`XomContext`]: the state machine, built once and shared by every hook
//! - [`RealOps`]: provider of the original (pre-interception) operations
//! - [`DlsymRealOps`]: provider resolving originals with `dlsym(RTLD_NEXT, ..)`
//!
//! ## Concurrency
//!
//! Backend requests are serialized by a process-wide mutex inside the
//! context. The real operation and the backend request are two separate
//! steps: another thread may observe memory state between them.

#![cfg(target_os = "linux")]
#![warn(missing_docs)]
#![warn(unsafe_op_in_unsafe_fn)]

#[cfg(test)]
mod tests;

mod bulk;
mod context;
mod error;
mod hooks;
mod real;
mod support;

pub use context::XomContext;
pub use error::{Errno, InterceptError, XomError};
pub use real::{DlsymRealOps, RealOps};

pub use xom_backend::{Backend, BackendConfig, BulkMode, DeviceBackend, MemoryRange, Protection};
pub use xom_scan::{MapsSource, ProcSelfMaps, RegionScanner};

#[cfg(any(test, feature = "test-utils"))]
pub use support::test_utils;

// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! # xom_preload
//!
//! Shared object that enforces execute-only memory on an unmodified process:
//!
//! ```text
//! LD_PRELOAD=libxom_preload.so ./program
//! ```
//!
//! The library exports `mmap`, `mprotect`, `pkey_mprotect`, `munmap`,
//! `mremap`, `madvise`, `mlock`, `mlock2`, `shmat` and `shmdt` with the C
//! library's signatures, so the dynamic linker binds the program's calls to
//! them. Each one forwards to [`xom_intercept::XomContext`], which calls the
//! original and keeps the protection device in sync.
//!
//! ## Lifecycle
//!
//! With the `auto-attach` feature (default) [`attach`] runs from
//! `.init_array` when the object is loaded and [`detach`] from
//! `.fini_array` when it is unloaded. A failed load-time attach aborts the
//! process. Without the feature the host calls [`attach`]/[`detach`] (or
//! `xom_init`/`xom_fini`) itself; until then every exported operation passes
//! straight through to the original.
//!
//! ## Configuration
//!
//! Read once, when the process-wide context is built:
//!
//! | Variable | Meaning | Default |
//! |---|---|---|
//! | `XOM_DEVICE` | device node | `/dev/vmpl-xom` |
//! | `XOM_BULK` | `native` or `scan` | `scan` |
//! | `XOM_BATCH_SIZE` | requests per device transaction | `64` |

#![warn(missing_docs)]
#![warn(unsafe_op_in_unsafe_fn)]

#[cfg(test)]
mod tests;

#[cfg(target_os = "linux")]
mod abi;
#[cfg(target_os = "linux")]
mod api;
#[cfg(target_os = "linux")]
mod exports;
#[cfg(target_os = "linux")]
mod fallback;
#[cfg(target_os = "linux")]
mod init;
#[cfg(target_os = "linux")]
mod state;

#[cfg(target_os = "linux")]
pub use api::{
    xom_commit, xom_fini, xom_init, xom_protect, xom_protect_all, xom_unprotect,
    xom_unprotect_all,
};
#[cfg(target_os = "linux")]
pub use state::{PreloadContext, attach, attach_with, context, detach};

// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! # xom_backend
//!
//! Connection to the execute-only-memory (XOM) protection backend.
//!
//! The backend is a kernel or hypervisor device that physically denies data
//! reads of code pages. This crate only speaks its request/response contract:
//!
//! - register a `[start, end)` range as execute-only
//! - unregister a range (a zero-length range means "whatever is registered at
//!   this base address")
//! - bulk register/unregister the whole address space (when the device can
//!   scan it natively)
//! - commit a pending batch of single-range requests
//!
//! ## Core Types
//!
//! - [`MemoryRange`]: `[start, end)` interval plus the requested protection
//! - [`Backend`]: the handle interface, with `Closed`/`Open` states
//! - [`DeviceBackend`]: ioctl implementation over `/dev/vmpl-xom`
//! - [`BackendConfig`]: device path and bulk capability
//!
//! ## Example
//!
//! ```rust,no_run
//! use xom_backend::{Backend, BackendConfig, DeviceBackend, MemoryRange, Protection};
//!
//! let mut backend = DeviceBackend::new(BackendConfig::default());
//! backend.open().expect("Failed to open()");
//!
//! let range = MemoryRange::from_len(0x7f00_0000_0000, 4096, Protection::READ_EXEC)
//!     .expect("Failed to build range");
//! backend.register_range(&range).expect("Failed to register_range()");
//! backend.unregister_range(&range).expect("Failed to unregister_range()");
//!
//! backend.close();
//! ```

#![warn(missing_docs)]
#![warn(unsafe_op_in_unsafe_fn)]

#[cfg(test)]
mod tests;

mod config;
mod error;
mod range;
mod support;
mod traits;

#[cfg(target_os = "linux")]
mod device;

pub use config::{BackendConfig, BulkMode, DEFAULT_BATCH_SIZE, DEFAULT_DEVICE_PATH};
pub use error::{BackendError, BackendOp};
pub use range::{MemoryRange, Protection};
pub use traits::Backend;

#[cfg(target_os = "linux")]
pub use device::DeviceBackend;

#[cfg(any(test, feature = "test-utils"))]
pub use support::test_utils;

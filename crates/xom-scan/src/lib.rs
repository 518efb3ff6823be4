// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! # xom_scan
//!
//! Enumerates the executable mappings of the calling process.
//!
//! Each call to [`RegionScanner::scan`] re-reads the introspection source
//! (`/proc/self/maps` by default) and returns a lazy, finite iterator of
//! [`MemoryRange`](xom_backend::MemoryRange)s:
//!
//! - records that fail to parse are skipped
//! - the reserved vsyscall page is never yielded
//! - only records with the execute flag are yielded
//!
//! [`RegionScanner::executable_at`] and [`RegionScanner::executable_within`]
//! answer point and range queries over the same scan.
//!
//! ## Example
//!
//! ```rust,no_run
//! use xom_scan::RegionScanner;
//!
//! let scanner = RegionScanner::proc_self();
//! for region in scanner.scan().expect("Failed to scan()") {
//!     let region = region.expect("Failed to read maps");
//!     println!("{:#x}-{:#x}", region.start(), region.end());
//! }
//! ```

#![warn(missing_docs)]

#[cfg(test)]
mod tests;

mod error;
mod record;
mod scanner;
mod source;
mod support;

pub use error::ScanError;
pub use record::{MapsRecord, Permissions, RESERVED_REGION_STARTS};
pub use scanner::{ExecRegions, RegionScanner};
pub use source::{MapsSource, PROC_SELF_MAPS, ProcSelfMaps};

#[cfg(any(test, feature = "test-utils"))]
pub use support::test_utils;

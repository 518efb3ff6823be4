// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Test doubles for the interception layer.
//!
//! [`MockRealOps`] stands in for the platform operations and
//! [`Journal`] interleaves its calls with those of a
//! [`MockBackend`](xom_backend::test_utils::MockBackend), so tests can assert
//! the order of real and backend steps.

mod journal;
mod mock_real_ops;

pub use journal::{Journal, Step};
pub use mock_real_ops::{MockRealOps, RealCall, RealOp};

pub use xom_backend::test_utils::{BackendCall, MockBackend, MockBackendBehaviour};
pub use xom_scan::test_utils::StaticMaps;

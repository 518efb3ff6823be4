// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

use crate::config::BulkMode;
use crate::error::BackendError;
use crate::range::MemoryRange;

/// Handle to the protection backend.
///
/// A handle is either `Closed` or `Open`. `open` and `close` are idempotent;
/// every request issued while closed fails with [`BackendError::NotOpen`].
///
/// The backend keeps its own registered set. Callers only assert transitions
/// into and out of it and never read it back. Requests carry no protection
/// bits, so callers submit executable ranges only. Unregistering a range that
/// was never registered succeeds.
pub trait Backend: Send {
    /// Opens the connection.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Unavailable`] if the device cannot be opened.
    fn open(&mut self) -> Result<(), BackendError>;

    /// Releases the connection. No-op when already closed.
    fn close(&mut self);

    /// Returns true while the connection is open.
    fn is_open(&self) -> bool;

    /// Bulk capability advertised by the backend.
    fn bulk_mode(&self) -> BulkMode;

    /// Registers `range` as execute-only.
    ///
    /// # Errors
    ///
    /// [`BackendError::NotOpen`] while closed, [`BackendError::Rejected`] if the
    /// device refuses the range.
    fn register_range(&mut self, range: &MemoryRange) -> Result<(), BackendError>;

    /// Releases `range`. A zero-length range releases whatever is registered at
    /// its base address.
    ///
    /// # Errors
    ///
    /// [`BackendError::NotOpen`] while closed, [`BackendError::Rejected`] if the
    /// device refuses the range.
    fn unregister_range(&mut self, range: &MemoryRange) -> Result<(), BackendError>;

    /// Registers every executable mapping of the calling process server-side.
    ///
    /// Only meaningful when [`bulk_mode`](Self::bulk_mode) is [`BulkMode::Native`].
    fn register_all(&mut self) -> Result<(), BackendError>;

    /// Releases every registration of the calling process server-side.
    ///
    /// Only meaningful when [`bulk_mode`](Self::bulk_mode) is [`BulkMode::Native`].
    fn unregister_all(&mut self) -> Result<(), BackendError>;

    /// Flushes a partially filled batch of single-range requests.
    fn commit(&mut self) -> Result<(), BackendError>;
}

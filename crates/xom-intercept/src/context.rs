// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! XomContext - shared state of the interception layer.
//!
//! Built once per process (or once per test) and handed to every hook. Owns
//! the backend handle behind a mutex, the provider of original operations and
//! the region scanner used by bulk operations and protection lookups.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use xom_backend::{Backend, MemoryRange};
use xom_scan::{MapsSource, ProcSelfMaps, RegionScanner};

use crate::error::XomError;
use crate::real::RealOps;

/// Interception layer state: backend handle, originals, scanner.
pub struct XomContext<B, R, S = ProcSelfMaps> {
    pub(crate) real: R,
    pub(crate) backend: Mutex<B>,
    pub(crate) scanner: RegionScanner<S>,
    attached: AtomicBool,
}

impl<B, R, S> core::fmt::Debug for XomContext<B, R, S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("XomContext")
            .field("attached", &self.attached.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl<B, R, S> XomContext<B, R, S>
where
    B: Backend,
    R: RealOps,
    S: MapsSource,
{
    /// Creates a detached context.
    pub fn new(backend: B, real: R, scanner: RegionScanner<S>) -> Self {
        Self {
            real,
            backend: Mutex::new(backend),
            scanner,
            attached: AtomicBool::new(false),
        }
    }

    /// Provider of the original operations.
    pub fn real(&self) -> &R {
        &self.real
    }

    /// Returns true between a successful [`attach`](Self::attach) and the next
    /// [`detach`](Self::detach).
    #[inline]
    pub fn is_attached(&self) -> bool {
        self.attached.load(Ordering::Acquire)
    }

    pub(crate) fn lock_backend(&self) -> MutexGuard<'_, B> {
        self.backend.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Opens the backend and registers every pre-existing executable mapping.
    ///
    /// Idempotent: a second call while attached does nothing.
    ///
    /// # Errors
    ///
    /// - [`XomError::Backend`] with `Unavailable` if the device cannot be
    ///   opened; the context stays detached.
    /// - any bulk registration failure; the connection is kept open so later
    ///   mappings are still protected, and the context counts as attached.
    pub fn attach(&self) -> Result<(), XomError> {
        let mut backend = self.lock_backend();

        if backend.is_open() {
            return Ok(());
        }

        backend.open()?;
        self.attached.store(true, Ordering::Release);
        log::debug!("attached, registering pre-existing executable regions");

        self.protect_all_locked(&mut *backend)
    }

    /// Unregisters everything and closes the backend.
    ///
    /// Idempotent: a call while detached does nothing. The connection is
    /// closed even if bulk unregistration fails; that failure is returned.
    pub fn detach(&self) -> Result<(), XomError> {
        let mut backend = self.lock_backend();

        if !backend.is_open() {
            return Ok(());
        }

        let result = self.unprotect_all_locked(&mut *backend);
        if let Err(e) = &result {
            log::warn!("bulk unregistration failed during detach: {e}");
        }

        self.attached.store(false, Ordering::Release);
        backend.close();
        log::debug!("detached");

        result
    }

    /// Registers `range` with the backend.
    pub fn protect(&self, range: &MemoryRange) -> Result<(), XomError> {
        log::debug!("protect {:#x}-{:#x}", range.start(), range.end());
        self.lock_backend().register_range(range)?;
        Ok(())
    }

    /// Unregisters `range`. A zero-length range releases whatever is
    /// registered at its base address.
    pub fn unprotect(&self, range: &MemoryRange) -> Result<(), XomError> {
        log::debug!("unprotect {:#x}-{:#x}", range.start(), range.end());
        self.lock_backend().unregister_range(range)?;
        Ok(())
    }

    /// Registers every executable mapping of the process.
    pub fn protect_all(&self) -> Result<(), XomError> {
        let mut backend = self.lock_backend();
        self.protect_all_locked(&mut *backend)
    }

    /// Unregisters every executable mapping of the process.
    pub fn unprotect_all(&self) -> Result<(), XomError> {
        let mut backend = self.lock_backend();
        self.unprotect_all_locked(&mut *backend)
    }

    /// Flushes a partially filled batch of backend requests.
    pub fn commit(&self) -> Result<(), XomError> {
        self.lock_backend().commit()?;
        Ok(())
    }
}

// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Register-all / unregister-all.
//!
//! With [`BulkMode::Native`] the backend walks the address space itself. With
//! [`BulkMode::Scan`] the scanner enumerates executable regions and each one is
//! submitted as a single-range request. The device flushes every
//! `batch_size` requests on its own; a partial last batch is flushed with an
//! explicit commit, and a failed commit aborts the bulk operation.

use xom_backend::{Backend, BackendError, BulkMode, MemoryRange};
use xom_scan::MapsSource;

use crate::context::XomContext;
use crate::error::XomError;
use crate::real::RealOps;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Register,
    Unregister,
}

impl<B, R, S> XomContext<B, R, S>
where
    B: Backend,
    R: RealOps,
    S: MapsSource,
{
    pub(crate) fn protect_all_locked(&self, backend: &mut B) -> Result<(), XomError> {
        match backend.bulk_mode() {
            BulkMode::Native => Ok(backend.register_all()?),
            BulkMode::Scan { batch_size } => {
                self.submit_scanned(backend, batch_size.get(), Direction::Register)
            }
        }
    }

    pub(crate) fn unprotect_all_locked(&self, backend: &mut B) -> Result<(), XomError> {
        match backend.bulk_mode() {
            BulkMode::Native => Ok(backend.unregister_all()?),
            BulkMode::Scan { batch_size } => {
                self.submit_scanned(backend, batch_size.get(), Direction::Unregister)
            }
        }
    }

    fn submit_scanned(
        &self,
        backend: &mut B,
        batch_size: usize,
        direction: Direction,
    ) -> Result<(), XomError> {
        if !backend.is_open() {
            return Err(BackendError::NotOpen.into());
        }

        // The scan completes before the first request is sent.
        let regions = self
            .scanner
            .scan()?
            .collect::<Result<Vec<MemoryRange>, _>>()?;

        for range in &regions {
            match direction {
                Direction::Register => backend.register_range(range)?,
                Direction::Unregister => backend.unregister_range(range)?,
            }
        }

        if regions.len() % batch_size != 0 {
            backend.commit()?;
        }

        log::debug!(
            "{direction:?} of {} scanned regions in batches of {batch_size}",
            regions.len()
        );

        Ok(())
    }
}

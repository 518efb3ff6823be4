// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

use std::io::BufRead;

use xom_backend::{MemoryRange, Protection};

use crate::error::ScanError;
use crate::record::MapsRecord;
use crate::source::{MapsSource, ProcSelfMaps};

/// Enumerates executable mappings from a [`MapsSource`].
#[derive(Debug, Default, Clone)]
pub struct RegionScanner<S = ProcSelfMaps> {
    source: S,
}

impl RegionScanner<ProcSelfMaps> {
    /// Scanner over `/proc/self/maps`.
    pub fn proc_self() -> Self {
        Self::new(ProcSelfMaps::default())
    }
}

impl<S: MapsSource> RegionScanner<S> {
    /// Creates a scanner over `source`.
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Starts a new scan. Each call re-reads the source.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::Io`] if the source cannot be opened.
    pub fn scan(&self) -> Result<ExecRegions<S::Reader>, ScanError> {
        Ok(ExecRegions {
            reader: self.source.open()?,
            buf: Vec::with_capacity(256),
            done: false,
        })
    }

    /// Protection of the executable mapping containing `addr`. `None` when
    /// `addr` is unmapped or its mapping is not executable.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::Io`] if the source cannot be read.
    pub fn executable_at(&self, addr: usize) -> Result<Option<Protection>, ScanError> {
        for region in self.scan()? {
            let region = region?;
            if region.start() <= addr && addr < region.end() {
                return Ok(Some(region.protection()));
            }
        }

        Ok(None)
    }

    /// Parts of `range` covered by executable mappings, in address order.
    /// Each part carries the protection of the mapping it lies in.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::Io`] if the source cannot be read.
    pub fn executable_within(&self, range: &MemoryRange) -> Result<Vec<MemoryRange>, ScanError> {
        let mut parts = Vec::new();
        for region in self.scan()? {
            let region = region?;
            let start = region.start().max(range.start());
            let end = region.end().min(range.end());
            if start < end {
                parts.extend(MemoryRange::new(start, end, region.protection()));
            }
        }

        Ok(parts)
    }
}

/// Lazy iterator over the executable ranges of one scan.
///
/// Yields `Err` at most once, for a read failure, and then ends.
#[derive(Debug)]
pub struct ExecRegions<R> {
    reader: R,
    buf: Vec<u8>,
    done: bool,
}

impl<R: BufRead> Iterator for ExecRegions<R> {
    type Item = Result<MemoryRange, ScanError>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            self.buf.clear();
            match self.reader.read_until(b'\n', &mut self.buf) {
                Ok(0) => self.done = true,
                Ok(_) => {
                    if let Some(range) = executable_range(&self.buf) {
                        return Some(Ok(range));
                    }
                }
                Err(e) => {
                    self.done = true;
                    return Some(Err(ScanError::from(e)));
                }
            }
        }

        None
    }
}

fn executable_range(raw: &[u8]) -> Option<MemoryRange> {
    let line = String::from_utf8_lossy(raw);
    let record = match MapsRecord::parse(&line) {
        Ok(record) => record,
        Err(e) => {
            log::trace!("skipping record: {e}");
            return None;
        }
    };

    if record.is_reserved() {
        log::trace!("skipping reserved region at {:#x}", record.start);
        return None;
    }

    if !record.perms.exec {
        return None;
    }

    record.to_range()
}

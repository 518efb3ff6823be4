// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;

use crate::error::ScanError;

/// Process-introspection file of the calling process.
pub const PROC_SELF_MAPS: &str = "/proc/self/maps";

/// A re-openable source of maps records.
///
/// `open` is called once per scan; implementations must not cache contents
/// between calls.
pub trait MapsSource: Send + Sync {
    /// Reader positioned at the first record.
    type Reader: BufRead;

    /// Opens a fresh view of the current mappings.
    fn open(&self) -> Result<Self::Reader, ScanError>;
}

/// Reads mappings from a procfs maps file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcSelfMaps {
    path: PathBuf,
}

impl ProcSelfMaps {
    /// Reads from an arbitrary maps-formatted file.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Default for ProcSelfMaps {
    fn default() -> Self {
        Self::with_path(PROC_SELF_MAPS)
    }
}

impl MapsSource for ProcSelfMaps {
    type Reader = BufReader<File>;

    fn open(&self) -> Result<Self::Reader, ScanError> {
        Ok(BufReader::new(File::open(&self.path)?))
    }
}

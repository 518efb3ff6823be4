// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Parser for a single `/proc/<pid>/maps` record.
//!
//! ```text
//! 55d1c2a00000-55d1c2a28000 r-xp 00002000 fd:01 1311     /usr/bin/cat
//! ^start       ^end         ^perms ^offset ^dev ^inode   ^path (optional)
//! ```

use xom_backend::{MemoryRange, Protection};

use crate::error::ScanError;

/// Start addresses of regions that are never submitted to the backend.
///
/// `0xffffffffff600000` is the legacy x86-64 vsyscall page: it sits above the
/// user address space and cannot be remapped by the process.
pub const RESERVED_REGION_STARTS: &[u64] = &[0xffff_ffff_ff60_0000];

/// The 4-character permission field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Permissions {
    /// `r`
    pub read: bool,
    /// `w`
    pub write: bool,
    /// `x`
    pub exec: bool,
    /// `s` (shared) as opposed to `p` (private)
    pub shared: bool,
}

impl Permissions {
    /// Parses `rwxp`-style flags.
    pub fn parse(field: &str) -> Option<Self> {
        let bytes = field.as_bytes();
        if bytes.len() != 4 {
            return None;
        }

        let flag = |b: u8, set: u8| match b {
            b'-' => Some(false),
            b if b == set => Some(true),
            _ => None,
        };

        let shared = match bytes[3] {
            b's' => true,
            b'p' => false,
            _ => return None,
        };

        Some(Self {
            read: flag(bytes[0], b'r')?,
            write: flag(bytes[1], b'w')?,
            exec: flag(bytes[2], b'x')?,
            shared,
        })
    }

    /// Converts to `PROT_*` bits.
    pub fn to_protection(self) -> Protection {
        let mut prot = Protection::NONE;
        if self.read {
            prot = prot.union(Protection::READ);
        }
        if self.write {
            prot = prot.union(Protection::WRITE);
        }
        if self.exec {
            prot = prot.union(Protection::EXEC);
        }
        prot
    }
}

/// One parsed maps record. Only `start`, `end` and the execute flag are used
/// by scans; the remaining fields are kept for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapsRecord<'a> {
    /// Inclusive start address.
    pub start: u64,
    /// Exclusive end address.
    pub end: u64,
    /// Permission flags.
    pub perms: Permissions,
    /// Offset into the backing file.
    pub offset: u64,
    /// `major:minor` of the backing device.
    pub device: &'a str,
    /// Inode of the backing file, 0 for anonymous mappings.
    pub inode: u64,
    /// Backing path or pseudo-name such as `[stack]`.
    pub path: Option<&'a str>,
}

impl<'a> MapsRecord<'a> {
    /// Parses one line of the maps file.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::Parse`] if a mandatory field is missing or malformed,
    /// or if `start > end`.
    pub fn parse(line: &'a str) -> Result<Self, ScanError> {
        let malformed = || ScanError::Parse {
            line: line.to_string(),
        };

        let line = line.trim_end_matches(['\n', '\r']);
        let mut rest = line;
        let mut next_field = || {
            let trimmed = rest.trim_start();
            let end = trimmed.find(' ').unwrap_or(trimmed.len());
            let (field, tail) = trimmed.split_at(end);
            rest = tail;
            (!field.is_empty()).then_some(field)
        };

        let span = next_field().ok_or_else(malformed)?;
        let perms = next_field().ok_or_else(malformed)?;
        let offset = next_field().ok_or_else(malformed)?;
        let device = next_field().ok_or_else(malformed)?;
        let inode = next_field().ok_or_else(malformed)?;
        let path = rest.trim();

        let (start, end) = span.split_once('-').ok_or_else(malformed)?;
        let start = u64::from_str_radix(start, 16).map_err(|_| malformed())?;
        let end = u64::from_str_radix(end, 16).map_err(|_| malformed())?;
        if start > end {
            return Err(malformed());
        }

        Ok(Self {
            start,
            end,
            perms: Permissions::parse(perms).ok_or_else(malformed)?,
            offset: u64::from_str_radix(offset, 16).map_err(|_| malformed())?,
            device,
            inode: inode.parse().map_err(|_| malformed())?,
            path: (!path.is_empty()).then_some(path),
        })
    }

    /// Returns true for regions that must never be touched.
    pub fn is_reserved(&self) -> bool {
        RESERVED_REGION_STARTS.contains(&self.start)
    }

    /// Converts to a [`MemoryRange`]. Returns `None` if the addresses do not
    /// fit the native pointer width.
    pub fn to_range(&self) -> Option<MemoryRange> {
        let start = usize::try_from(self.start).ok()?;
        let end = usize::try_from(self.end).ok()?;
        MemoryRange::new(start, end, self.perms.to_protection())
    }
}

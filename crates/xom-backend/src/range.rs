// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Address ranges submitted to the backend.

/// Page protection bits, as passed to `mmap`/`mprotect`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Protection(i32);

impl Protection {
    /// `PROT_NONE`
    pub const NONE: Self = Self(libc::PROT_NONE);
    /// `PROT_READ`
    pub const READ: Self = Self(libc::PROT_READ);
    /// `PROT_WRITE`
    pub const WRITE: Self = Self(libc::PROT_WRITE);
    /// `PROT_EXEC`
    pub const EXEC: Self = Self(libc::PROT_EXEC);
    /// `PROT_READ | PROT_EXEC`
    pub const READ_EXEC: Self = Self(libc::PROT_READ | libc::PROT_EXEC);

    /// Wraps raw `PROT_*` bits.
    #[inline]
    pub const fn from_bits(bits: i32) -> Self {
        Self(bits)
    }

    /// Returns the raw `PROT_*` bits.
    #[inline]
    pub const fn bits(self) -> i32 {
        self.0
    }

    /// Returns true if instruction fetch is allowed.
    #[inline]
    pub const fn is_executable(self) -> bool {
        self.0 & libc::PROT_EXEC != 0
    }

    /// Returns the union of both protections.
    #[inline]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}

/// A `[start, end)` virtual-address interval and the protection requested for it.
///
/// Zero-length ranges are legal. The backend reads a zero-length unregistration
/// as "release whatever is registered at `start`", which is how shared-memory
/// detach is expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MemoryRange {
    start: usize,
    end: usize,
    protection: Protection,
}

impl MemoryRange {
    /// Builds `[start, end)`. Returns `None` if `start > end`.
    pub const fn new(start: usize, end: usize, protection: Protection) -> Option<Self> {
        if start > end {
            return None;
        }

        Some(Self {
            start,
            end,
            protection,
        })
    }

    /// Builds `[start, start + len)`. Returns `None` if the end overflows.
    pub const fn from_len(start: usize, len: usize, protection: Protection) -> Option<Self> {
        match start.checked_add(len) {
            Some(end) => Some(Self {
                start,
                end,
                protection,
            }),
            None => None,
        }
    }

    /// Zero-length range at `base`.
    pub const fn sentinel(base: usize) -> Self {
        Self {
            start: base,
            end: base,
            protection: Protection::NONE,
        }
    }

    /// Inclusive start address.
    #[inline]
    pub const fn start(&self) -> usize {
        self.start
    }

    /// Exclusive end address.
    #[inline]
    pub const fn end(&self) -> usize {
        self.end
    }

    /// Length in bytes.
    #[inline]
    pub const fn len(&self) -> usize {
        self.end - self.start
    }

    /// Returns true for a zero-length range.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Protection requested for the range.
    #[inline]
    pub const fn protection(&self) -> Protection {
        self.protection
    }

    /// Returns true if `self` and `other` share at least one byte.
    pub const fn overlaps(&self, other: &Self) -> bool {
        self.start < other.end && other.start < self.end
    }
}

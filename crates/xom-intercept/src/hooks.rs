// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Wrapped memory-lifecycle operations.
//!
//! Each wrapper has the argument list of the platform function and returns
//! `Ok` with the platform's success value, [`InterceptError::Os`] when the
//! original failed (the backend is not contacted) or [`InterceptError::Xom`]
//! when the backend failed.

use core::ptr;

use libc::{c_int, c_uint, c_void, off_t};
use xom_backend::{Backend, MemoryRange, Protection};
use xom_scan::MapsSource;

use crate::context::XomContext;
use crate::error::{InterceptError, XomError};
use crate::real::RealOps;

/// Advices that drop page contents; the pages are faulted back in afterwards
/// and need their protection re-established.
const REFAULT_ADVICES: &[c_int] = &[libc::MADV_DONTNEED, libc::MADV_FREE, libc::MADV_REMOVE];

fn range_of(addr: *const c_void, len: usize, prot: Protection) -> Result<MemoryRange, XomError> {
    MemoryRange::from_len(addr as usize, len, prot).ok_or(XomError::InvalidRange {
        start: addr as usize,
        len,
    })
}

impl<B, R, S> XomContext<B, R, S>
where
    B: Backend,
    R: RealOps,
    S: MapsSource,
{
    fn register_after(&self, op: &str, range: &MemoryRange) -> Result<(), InterceptError> {
        self.protect(range).map_err(|e| {
            log::warn!(
                "{op} succeeded but {:#x}-{:#x} is left unprotected: {e}",
                range.start(),
                range.end()
            );
            InterceptError::Xom(e)
        })
    }

    fn unregister_before(&self, op: &str, range: &MemoryRange) -> Result<(), InterceptError> {
        self.unprotect(range).map_err(|e| {
            log::warn!(
                "{op} of {:#x}-{:#x} aborted, unregistration failed: {e}",
                range.start(),
                range.end()
            );
            InterceptError::Xom(e)
        })
    }

    fn executable_at(
        &self,
        op: &str,
        addr: *const c_void,
    ) -> Result<Option<Protection>, InterceptError> {
        self.scanner.executable_at(addr as usize).map_err(|e| {
            log::warn!("{op} of {:#x} aborted, mapping lookup failed: {e}", addr as usize);
            InterceptError::Xom(e.into())
        })
    }

    fn reregister_executable(
        &self,
        op: &str,
        addr: *const c_void,
        len: usize,
    ) -> Result<(), InterceptError> {
        let range = range_of(addr, len, Protection::NONE)?;
        let parts = self.scanner.executable_within(&range).map_err(|e| {
            log::warn!(
                "{op} succeeded but {:#x}-{:#x} could not be looked up: {e}",
                range.start(),
                range.end()
            );
            InterceptError::Xom(e.into())
        })?;

        for part in &parts {
            self.register_after(op, part)?;
        }

        Ok(())
    }

    /// Wrapped `mmap(2)`. Registers the new mapping if `prot` has `PROT_EXEC`.
    ///
    /// # Safety
    ///
    /// Same contract as `mmap(2)`.
    pub unsafe fn mmap(
        &self,
        addr: *mut c_void,
        len: usize,
        prot: c_int,
        flags: c_int,
        fd: c_int,
        offset: off_t,
    ) -> Result<*mut c_void, InterceptError> {
        let mapped = unsafe { self.real.mmap(addr, len, prot, flags, fd, offset) }?;

        let prot = Protection::from_bits(prot);
        if prot.is_executable() {
            self.register_after("mmap", &range_of(mapped, len, prot)?)?;
        }

        Ok(mapped)
    }

    /// Wrapped `mprotect(2)`. Registers the range if the new protection has
    /// `PROT_EXEC`; dropping execute issues nothing.
    ///
    /// # Safety
    ///
    /// Same contract as `mprotect(2)`.
    pub unsafe fn mprotect(
        &self,
        addr: *mut c_void,
        len: usize,
        prot: c_int,
    ) -> Result<(), InterceptError> {
        unsafe { self.real.mprotect(addr, len, prot) }?;

        let prot = Protection::from_bits(prot);
        if prot.is_executable() {
            self.register_after("mprotect", &range_of(addr, len, prot)?)?;
        }

        Ok(())
    }

    /// Wrapped `pkey_mprotect(2)`, handled like [`mprotect`](Self::mprotect).
    ///
    /// # Safety
    ///
    /// Same contract as `pkey_mprotect(2)`.
    pub unsafe fn pkey_mprotect(
        &self,
        addr: *mut c_void,
        len: usize,
        prot: c_int,
        pkey: c_int,
    ) -> Result<(), InterceptError> {
        unsafe { self.real.pkey_mprotect(addr, len, prot, pkey) }?;

        let prot = Protection::from_bits(prot);
        if prot.is_executable() {
            self.register_after("pkey_mprotect", &range_of(addr, len, prot)?)?;
        }

        Ok(())
    }

    /// Wrapped `munmap(2)`. The range is unregistered first; if that fails the
    /// mapping is left in place. A zero-length call goes straight to the
    /// original.
    ///
    /// # Safety
    ///
    /// Same contract as `munmap(2)`.
    pub unsafe fn munmap(&self, addr: *mut c_void, len: usize) -> Result<(), InterceptError> {
        if len != 0 {
            self.unregister_before("munmap", &range_of(addr, len, Protection::NONE)?)?;
        }

        unsafe { self.real.munmap(addr, len) }?;

        Ok(())
    }

    /// Wrapped `mremap(2)`.
    ///
    /// The protection of the mapping at `old_addr` is read before the call;
    /// nothing is registered unless it is executable. The old range is
    /// unregistered before the call. On success the new range is registered
    /// with the old protection at `new_addr` when `MREMAP_FIXED` was requested
    /// and at the returned address otherwise. With `MREMAP_DONTUNMAP` the old
    /// range stays mapped and is registered again. On failure the old mapping
    /// is untouched and its registration is restored.
    ///
    /// With `old_len == 0` the original stays mapped and is never unregistered.
    ///
    /// # Safety
    ///
    /// Same contract as `mremap(2)`.
    pub unsafe fn mremap(
        &self,
        old_addr: *mut c_void,
        old_len: usize,
        new_len: usize,
        flags: c_int,
        new_addr: Option<*mut c_void>,
    ) -> Result<*mut c_void, InterceptError> {
        let old = range_of(old_addr, old_len, Protection::NONE)?;
        let protection = self.executable_at("mremap", old_addr)?;

        if !old.is_empty() {
            self.unregister_before("mremap", &old)?;
        }

        let target = new_addr.unwrap_or(ptr::null_mut());
        let moved = match unsafe { self.real.mremap(old_addr, old_len, new_len, flags, target) } {
            Ok(moved) => moved,
            Err(errno) => {
                if let Some(prot) = protection.filter(|_| !old.is_empty()) {
                    let old = range_of(old_addr, old_len, prot)?;
                    if let Err(e) = self.protect(&old) {
                        log::warn!(
                            "mremap failed and {:#x}-{:#x} could not be re-registered: {e}",
                            old.start(),
                            old.end()
                        );
                    }
                }
                return Err(errno.into());
            }
        };

        let Some(prot) = protection else {
            return Ok(moved);
        };

        let base = match new_addr {
            Some(fixed) if flags & libc::MREMAP_FIXED != 0 => fixed,
            _ => moved,
        };
        self.register_after("mremap", &range_of(base, new_len, prot)?)?;

        if flags & libc::MREMAP_DONTUNMAP != 0 && !old.is_empty() {
            self.register_after("mremap", &range_of(old_addr, old_len, prot)?)?;
        }

        Ok(moved)
    }

    /// Wrapped `madvise(2)`. Page-dropping advices re-register the executable
    /// parts of the range.
    ///
    /// # Safety
    ///
    /// Same contract as `madvise(2)`.
    pub unsafe fn madvise(
        &self,
        addr: *mut c_void,
        len: usize,
        advice: c_int,
    ) -> Result<(), InterceptError> {
        unsafe { self.real.madvise(addr, len, advice) }?;

        if REFAULT_ADVICES.contains(&advice) {
            self.reregister_executable("madvise", addr, len)?;
        }

        Ok(())
    }

    /// Wrapped `mlock(2)`. Re-registers the executable parts of the locked
    /// range.
    ///
    /// # Safety
    ///
    /// Same contract as `mlock(2)`.
    pub unsafe fn mlock(&self, addr: *const c_void, len: usize) -> Result<(), InterceptError> {
        unsafe { self.real.mlock(addr, len) }?;

        self.reregister_executable("mlock", addr, len)
    }

    /// Wrapped `mlock2(2)`, handled like [`mlock`](Self::mlock).
    ///
    /// # Safety
    ///
    /// Same contract as `mlock2(2)`.
    pub unsafe fn mlock2(
        &self,
        addr: *const c_void,
        len: usize,
        flags: c_uint,
    ) -> Result<(), InterceptError> {
        unsafe { self.real.mlock2(addr, len, flags) }?;

        self.reregister_executable("mlock2", addr, len)
    }

    /// Wrapped `shmat(2)`. With `SHM_EXEC` the whole segment is registered;
    /// its size comes from `shmctl(IPC_STAT)`.
    ///
    /// # Safety
    ///
    /// Same contract as `shmat(2)`.
    pub unsafe fn shmat(
        &self,
        shmid: c_int,
        addr: *const c_void,
        shmflg: c_int,
    ) -> Result<*mut c_void, InterceptError> {
        let attached = unsafe { self.real.shmat(shmid, addr, shmflg) }?;

        if shmflg & libc::SHM_EXEC == 0 {
            return Ok(attached);
        }

        let size = self.real.shm_segment_size(shmid).map_err(|errno| {
            log::warn!("shmat of segment {shmid} succeeded but its size is unknown: {errno}");
            InterceptError::Os(errno)
        })?;

        let prot = if shmflg & libc::SHM_RDONLY != 0 {
            Protection::READ_EXEC
        } else {
            Protection::READ_EXEC.union(Protection::WRITE)
        };
        self.register_after("shmat", &range_of(attached, size, prot)?)?;

        Ok(attached)
    }

    /// Wrapped `shmdt(2)`. The segment length is unknown here, so the base
    /// address is unregistered with a zero-length range before detaching.
    ///
    /// # Safety
    ///
    /// Same contract as `shmdt(2)`.
    pub unsafe fn shmdt(&self, addr: *const c_void) -> Result<(), InterceptError> {
        self.unregister_before("shmdt", &MemoryRange::sentinel(addr as usize))?;

        unsafe { self.real.shmdt(addr) }?;

        Ok(())
    }
}

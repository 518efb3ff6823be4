// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! DlsymRealOps - originals looked up with `dlsym(RTLD_NEXT, ..)`.
//!
//! `RTLD_NEXT` skips the object doing the lookup, so when this crate lives
//! inside a preloaded library the pointers land on the C library's
//! definitions rather than on the exported wrappers.

use core::ffi::CStr;

use libc::{c_int, c_uint, c_void, off_t, size_t};

use super::RealOps;
use crate::error::{Errno, XomError};

type MmapFn = unsafe extern "C" fn(*mut c_void, size_t, c_int, c_int, c_int, off_t) -> *mut c_void;
type MprotectFn = unsafe extern "C" fn(*mut c_void, size_t, c_int) -> c_int;
type PkeyMprotectFn = unsafe extern "C" fn(*mut c_void, size_t, c_int, c_int) -> c_int;
type MunmapFn = unsafe extern "C" fn(*mut c_void, size_t) -> c_int;
type MremapFn = unsafe extern "C" fn(*mut c_void, size_t, size_t, c_int, ...) -> *mut c_void;
type MadviseFn = unsafe extern "C" fn(*mut c_void, size_t, c_int) -> c_int;
type MlockFn = unsafe extern "C" fn(*const c_void, size_t) -> c_int;
type Mlock2Fn = unsafe extern "C" fn(*const c_void, size_t, c_uint) -> c_int;
type ShmatFn = unsafe extern "C" fn(c_int, *const c_void, c_int) -> *mut c_void;
type ShmdtFn = unsafe extern "C" fn(*const c_void) -> c_int;

/// Original implementations resolved from the global symbol namespace.
///
/// Resolution happens once, in [`resolve`](Self::resolve); the table is
/// immutable afterwards.
#[derive(Clone, Copy)]
pub struct DlsymRealOps {
    mmap: MmapFn,
    mprotect: MprotectFn,
    pkey_mprotect: PkeyMprotectFn,
    munmap: MunmapFn,
    mremap: MremapFn,
    madvise: MadviseFn,
    mlock: MlockFn,
    mlock2: Mlock2Fn,
    shmat: ShmatFn,
    shmdt: ShmdtFn,
}

impl core::fmt::Debug for DlsymRealOps {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DlsymRealOps")
            .field("mmap", &(self.mmap as *const c_void))
            .field("munmap", &(self.munmap as *const c_void))
            .finish_non_exhaustive()
    }
}

/// Looks up `symbol` past the calling object.
///
/// # Safety
///
/// `F` must be a function pointer type matching the C signature of `symbol`.
unsafe fn lookup<F: Copy>(symbol: &CStr) -> Result<F, XomError> {
    debug_assert_eq!(size_of::<F>(), size_of::<*mut c_void>());

    let ptr = unsafe { libc::dlsym(libc::RTLD_NEXT, symbol.as_ptr()) };
    if ptr.is_null() {
        return Err(XomError::SymbolResolution {
            symbol: symbol.to_string_lossy().into_owned(),
        });
    }

    Ok(unsafe { core::mem::transmute_copy::<*mut c_void, F>(&ptr) })
}

impl DlsymRealOps {
    /// Resolves every original. Fails on the first missing symbol.
    ///
    /// # Errors
    ///
    /// Returns [`XomError::SymbolResolution`] naming the missing symbol.
    pub fn resolve() -> Result<Self, XomError> {
        // Safety: every type alias mirrors the glibc prototype of its symbol.
        unsafe {
            Ok(Self {
                mmap: lookup(c"mmap")?,
                mprotect: lookup(c"mprotect")?,
                pkey_mprotect: lookup(c"pkey_mprotect")?,
                munmap: lookup(c"munmap")?,
                mremap: lookup(c"mremap")?,
                madvise: lookup(c"madvise")?,
                mlock: lookup(c"mlock")?,
                mlock2: lookup(c"mlock2")?,
                shmat: lookup(c"shmat")?,
                shmdt: lookup(c"shmdt")?,
            })
        }
    }
}

#[inline]
fn check(ret: c_int) -> Result<(), Errno> {
    if ret < 0 { Err(Errno::last()) } else { Ok(()) }
}

#[inline]
fn check_ptr(ptr: *mut c_void) -> Result<*mut c_void, Errno> {
    if ptr == libc::MAP_FAILED {
        Err(Errno::last())
    } else {
        Ok(ptr)
    }
}

impl RealOps for DlsymRealOps {
    unsafe fn mmap(
        &self,
        addr: *mut c_void,
        len: usize,
        prot: c_int,
        flags: c_int,
        fd: c_int,
        offset: off_t,
    ) -> Result<*mut c_void, Errno> {
        check_ptr(unsafe { (self.mmap)(addr, len, prot, flags, fd, offset) })
    }

    unsafe fn mprotect(&self, addr: *mut c_void, len: usize, prot: c_int) -> Result<(), Errno> {
        check(unsafe { (self.mprotect)(addr, len, prot) })
    }

    unsafe fn pkey_mprotect(
        &self,
        addr: *mut c_void,
        len: usize,
        prot: c_int,
        pkey: c_int,
    ) -> Result<(), Errno> {
        check(unsafe { (self.pkey_mprotect)(addr, len, prot, pkey) })
    }

    unsafe fn munmap(&self, addr: *mut c_void, len: usize) -> Result<(), Errno> {
        check(unsafe { (self.munmap)(addr, len) })
    }

    unsafe fn mremap(
        &self,
        old_addr: *mut c_void,
        old_len: usize,
        new_len: usize,
        flags: c_int,
        new_addr: *mut c_void,
    ) -> Result<*mut c_void, Errno> {
        check_ptr(unsafe { (self.mremap)(old_addr, old_len, new_len, flags, new_addr) })
    }

    unsafe fn madvise(&self, addr: *mut c_void, len: usize, advice: c_int) -> Result<(), Errno> {
        check(unsafe { (self.madvise)(addr, len, advice) })
    }

    unsafe fn mlock(&self, addr: *const c_void, len: usize) -> Result<(), Errno> {
        check(unsafe { (self.mlock)(addr, len) })
    }

    unsafe fn mlock2(&self, addr: *const c_void, len: usize, flags: c_uint) -> Result<(), Errno> {
        check(unsafe { (self.mlock2)(addr, len, flags) })
    }

    unsafe fn shmat(
        &self,
        shmid: c_int,
        addr: *const c_void,
        shmflg: c_int,
    ) -> Result<*mut c_void, Errno> {
        check_ptr(unsafe { (self.shmat)(shmid, addr, shmflg) })
    }

    unsafe fn shmdt(&self, addr: *const c_void) -> Result<(), Errno> {
        check(unsafe { (self.shmdt)(addr) })
    }

    fn shm_segment_size(&self, shmid: c_int) -> Result<usize, Errno> {
        // shmctl is not wrapped, so the libc definition is the original.
        let mut ds: libc::shmid_ds = unsafe { core::mem::zeroed() };
        check(unsafe { libc::shmctl(shmid, libc::IPC_STAT, &mut ds) })?;
        Ok(ds.shm_segsz as usize)
    }
}

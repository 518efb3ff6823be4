// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Providers of the original memory operations.

mod dlsym;

use libc::{c_int, c_uint, c_void, off_t};

use crate::error::Errno;

pub use dlsym::DlsymRealOps;

/// The original (pre-interception) implementation of every wrapped operation.
///
/// Failures are reported as the `errno` the platform operation set.
///
/// # Safety
///
/// Every method has the contract of the platform function of the same name:
/// callers must pass arguments that would be valid for it.
pub trait RealOps: Send + Sync {
    /// `mmap(2)`
    unsafe fn mmap(
        &self,
        addr: *mut c_void,
        len: usize,
        prot: c_int,
        flags: c_int,
        fd: c_int,
        offset: off_t,
    ) -> Result<*mut c_void, Errno>;

    /// `mprotect(2)`
    unsafe fn mprotect(&self, addr: *mut c_void, len: usize, prot: c_int) -> Result<(), Errno>;

    /// `pkey_mprotect(2)`
    unsafe fn pkey_mprotect(
        &self,
        addr: *mut c_void,
        len: usize,
        prot: c_int,
        pkey: c_int,
    ) -> Result<(), Errno>;

    /// `munmap(2)`
    unsafe fn munmap(&self, addr: *mut c_void, len: usize) -> Result<(), Errno>;

    /// `mremap(2)`. `new_addr` is only read by the kernel with `MREMAP_FIXED`.
    unsafe fn mremap(
        &self,
        old_addr: *mut c_void,
        old_len: usize,
        new_len: usize,
        flags: c_int,
        new_addr: *mut c_void,
    ) -> Result<*mut c_void, Errno>;

    /// `madvise(2)`
    unsafe fn madvise(&self, addr: *mut c_void, len: usize, advice: c_int) -> Result<(), Errno>;

    /// `mlock(2)`
    unsafe fn mlock(&self, addr: *const c_void, len: usize) -> Result<(), Errno>;

    /// `mlock2(2)`
    unsafe fn mlock2(&self, addr: *const c_void, len: usize, flags: c_uint) -> Result<(), Errno>;

    /// `shmat(2)`
    unsafe fn shmat(
        &self,
        shmid: c_int,
        addr: *const c_void,
        shmflg: c_int,
    ) -> Result<*mut c_void, Errno>;

    /// `shmdt(2)`
    unsafe fn shmdt(&self, addr: *const c_void) -> Result<(), Errno>;

    /// Size in bytes of a System V segment (`shmctl(IPC_STAT).shm_segsz`).
    fn shm_segment_size(&self, shmid: c_int) -> Result<usize, Errno>;
}

// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Raw system calls used before the originals are resolved.
//!
//! Symbol resolution itself may allocate, and the allocator maps memory
//! through the exported `mmap`. Nothing is registered on this path: the
//! bulk registration at attach covers whatever was mapped here.

use libc::{c_int, c_long, c_uint, c_void, off_t, size_t};

pub(crate) unsafe fn mmap(
    addr: *mut c_void,
    len: size_t,
    prot: c_int,
    flags: c_int,
    fd: c_int,
    offset: off_t,
) -> *mut c_void {
    unsafe {
        libc::syscall(
            libc::SYS_mmap,
            addr,
            len,
            prot as c_long,
            flags as c_long,
            fd as c_long,
            offset as c_long,
        ) as *mut c_void
    }
}

pub(crate) unsafe fn mprotect(addr: *mut c_void, len: size_t, prot: c_int) -> c_int {
    unsafe { libc::syscall(libc::SYS_mprotect, addr, len, prot as c_long) as c_int }
}

pub(crate) unsafe fn pkey_mprotect(
    addr: *mut c_void,
    len: size_t,
    prot: c_int,
    pkey: c_int,
) -> c_int {
    unsafe {
        libc::syscall(
            libc::SYS_pkey_mprotect,
            addr,
            len,
            prot as c_long,
            pkey as c_long,
        ) as c_int
    }
}

pub(crate) unsafe fn munmap(addr: *mut c_void, len: size_t) -> c_int {
    unsafe { libc::syscall(libc::SYS_munmap, addr, len) as c_int }
}

pub(crate) unsafe fn mremap(
    old_addr: *mut c_void,
    old_len: size_t,
    new_len: size_t,
    flags: c_int,
    new_addr: *mut c_void,
) -> *mut c_void {
    unsafe {
        libc::syscall(
            libc::SYS_mremap,
            old_addr,
            old_len,
            new_len,
            flags as c_long,
            new_addr,
        ) as *mut c_void
    }
}

pub(crate) unsafe fn madvise(addr: *mut c_void, len: size_t, advice: c_int) -> c_int {
    unsafe { libc::syscall(libc::SYS_madvise, addr, len, advice as c_long) as c_int }
}

pub(crate) unsafe fn mlock(addr: *const c_void, len: size_t) -> c_int {
    unsafe { libc::syscall(libc::SYS_mlock, addr, len) as c_int }
}

pub(crate) unsafe fn mlock2(addr: *const c_void, len: size_t, flags: c_uint) -> c_int {
    unsafe { libc::syscall(libc::SYS_mlock2, addr, len, flags as c_long) as c_int }
}

pub(crate) unsafe fn shmat(shmid: c_int, addr: *const c_void, shmflg: c_int) -> *mut c_void {
    unsafe {
        libc::syscall(libc::SYS_shmat, shmid as c_long, addr, shmflg as c_long) as *mut c_void
    }
}

pub(crate) unsafe fn shmdt(addr: *const c_void) -> c_int {
    unsafe { libc::syscall(libc::SYS_shmdt, addr) as c_int }
}

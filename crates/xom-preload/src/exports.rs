// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Interposed C library symbols.
//!
//! Signatures match glibc's prototypes; failures return the C library's
//! sentinel (`-1` or `MAP_FAILED`) with `errno` set.

use libc::{c_int, c_uint, c_void, off_t, size_t};
use xom_intercept::{InterceptError, RealOps};

use crate::abi::{int_status, ptr_status};
use crate::fallback;
use crate::state::{Route, route};

#[unsafe(no_mangle)]
pub unsafe extern "C" fn mmap(
    addr: *mut c_void,
    len: size_t,
    prot: c_int,
    flags: c_int,
    fd: c_int,
    offset: off_t,
) -> *mut c_void {
    match route() {
        Route::Intercept(ctx, _reentry) => {
            ptr_status(unsafe { ctx.mmap(addr, len, prot, flags, fd, offset) })
        }
        Route::Passthrough(real) => ptr_status(
            unsafe { real.mmap(addr, len, prot, flags, fd, offset) }.map_err(InterceptError::from),
        ),
        Route::Bootstrap => unsafe { fallback::mmap(addr, len, prot, flags, fd, offset) },
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn mprotect(addr: *mut c_void, len: size_t, prot: c_int) -> c_int {
    match route() {
        Route::Intercept(ctx, _reentry) => int_status(unsafe { ctx.mprotect(addr, len, prot) }),
        Route::Passthrough(real) => {
            int_status(unsafe { real.mprotect(addr, len, prot) }.map_err(InterceptError::from))
        }
        Route::Bootstrap => unsafe { fallback::mprotect(addr, len, prot) },
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn pkey_mprotect(
    addr: *mut c_void,
    len: size_t,
    prot: c_int,
    pkey: c_int,
) -> c_int {
    match route() {
        Route::Intercept(ctx, _reentry) => {
            int_status(unsafe { ctx.pkey_mprotect(addr, len, prot, pkey) })
        }
        Route::Passthrough(real) => int_status(
            unsafe { real.pkey_mprotect(addr, len, prot, pkey) }.map_err(InterceptError::from),
        ),
        Route::Bootstrap => unsafe { fallback::pkey_mprotect(addr, len, prot, pkey) },
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn munmap(addr: *mut c_void, len: size_t) -> c_int {
    match route() {
        Route::Intercept(ctx, _reentry) => int_status(unsafe { ctx.munmap(addr, len) }),
        Route::Passthrough(real) => {
            int_status(unsafe { real.munmap(addr, len) }.map_err(InterceptError::from))
        }
        Route::Bootstrap => unsafe { fallback::munmap(addr, len) },
    }
}

/// `mremap(2)`. glibc declares it variadic; the fifth argument is only
/// passed, and only read here, with `MREMAP_FIXED`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn mremap(
    old_addr: *mut c_void,
    old_len: size_t,
    new_len: size_t,
    flags: c_int,
    new_addr: *mut c_void,
) -> *mut c_void {
    let fixed = if flags & libc::MREMAP_FIXED != 0 {
        Some(new_addr)
    } else {
        None
    };
    let target = fixed.unwrap_or(core::ptr::null_mut());

    match route() {
        Route::Intercept(ctx, _reentry) => {
            ptr_status(unsafe { ctx.mremap(old_addr, old_len, new_len, flags, fixed) })
        }
        Route::Passthrough(real) => ptr_status(
            unsafe { real.mremap(old_addr, old_len, new_len, flags, target) }
                .map_err(InterceptError::from),
        ),
        Route::Bootstrap => unsafe { fallback::mremap(old_addr, old_len, new_len, flags, target) },
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn madvise(addr: *mut c_void, len: size_t, advice: c_int) -> c_int {
    match route() {
        Route::Intercept(ctx, _reentry) => int_status(unsafe { ctx.madvise(addr, len, advice) }),
        Route::Passthrough(real) => {
            int_status(unsafe { real.madvise(addr, len, advice) }.map_err(InterceptError::from))
        }
        Route::Bootstrap => unsafe { fallback::madvise(addr, len, advice) },
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn mlock(addr: *const c_void, len: size_t) -> c_int {
    match route() {
        Route::Intercept(ctx, _reentry) => int_status(unsafe { ctx.mlock(addr, len) }),
        Route::Passthrough(real) => {
            int_status(unsafe { real.mlock(addr, len) }.map_err(InterceptError::from))
        }
        Route::Bootstrap => unsafe { fallback::mlock(addr, len) },
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn mlock2(addr: *const c_void, len: size_t, flags: c_uint) -> c_int {
    match route() {
        Route::Intercept(ctx, _reentry) => int_status(unsafe { ctx.mlock2(addr, len, flags) }),
        Route::Passthrough(real) => {
            int_status(unsafe { real.mlock2(addr, len, flags) }.map_err(InterceptError::from))
        }
        Route::Bootstrap => unsafe { fallback::mlock2(addr, len, flags) },
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn shmat(shmid: c_int, addr: *const c_void, shmflg: c_int) -> *mut c_void {
    match route() {
        Route::Intercept(ctx, _reentry) => ptr_status(unsafe { ctx.shmat(shmid, addr, shmflg) }),
        Route::Passthrough(real) => {
            ptr_status(unsafe { real.shmat(shmid, addr, shmflg) }.map_err(InterceptError::from))
        }
        Route::Bootstrap => unsafe { fallback::shmat(shmid, addr, shmflg) },
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn shmdt(addr: *const c_void) -> c_int {
    match route() {
        Route::Intercept(ctx, _reentry) => int_status(unsafe { ctx.shmdt(addr) }),
        Route::Passthrough(real) => {
            int_status(unsafe { real.shmdt(addr) }.map_err(InterceptError::from))
        }
        Route::Bootstrap => unsafe { fallback::shmdt(addr) },
    }
}

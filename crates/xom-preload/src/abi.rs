// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Conversions from Rust results to C return conventions.

use libc::{c_int, c_void};
use xom_intercept::{InterceptError, XomError};

#[inline]
pub(crate) fn set_errno(errno: c_int) {
    unsafe { *libc::__errno_location() = errno };
}

/// `0`, or `-1` with `errno` set.
#[inline]
pub(crate) fn int_status(result: Result<(), InterceptError>) -> c_int {
    match result {
        Ok(()) => 0,
        Err(e) => {
            set_errno(e.errno());
            -1
        }
    }
}

/// The address, or `MAP_FAILED` with `errno` set.
#[inline]
pub(crate) fn ptr_status(result: Result<*mut c_void, InterceptError>) -> *mut c_void {
    match result {
        Ok(ptr) => ptr,
        Err(e) => {
            set_errno(e.errno());
            libc::MAP_FAILED
        }
    }
}

/// `0`, or the negated `errno` (also stored in `errno`).
pub(crate) fn api_status(result: Result<(), XomError>) -> c_int {
    match result {
        Ok(()) => 0,
        Err(e) => {
            log::debug!("{e}");
            let errno = e.errno();
            set_errno(errno);
            -errno
        }
    }
}

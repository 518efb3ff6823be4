// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! C API for hosts that drive the layer themselves.
//!
//! Every function returns `0` on success and a negated `errno` on failure,
//! with `errno` set to the same value. Before [`xom_init`] the range
//! functions fail with `EBADF`.

use libc::{c_int, c_void, size_t};
use xom_backend::{BackendError, MemoryRange, Protection};
use xom_intercept::XomError;

use crate::abi::api_status;
use crate::state::{PreloadContext, Reentry, attach, context, detach};

fn with_context<F>(f: F) -> c_int
where
    F: FnOnce(&PreloadContext) -> Result<(), XomError>,
{
    let _reentry = Reentry::enter();

    let result = match context() {
        Some(ctx) => f(ctx),
        None => Err(BackendError::NotOpen.into()),
    };
    api_status(result)
}

fn range_of(addr: *const c_void, len: size_t) -> Result<MemoryRange, XomError> {
    MemoryRange::from_len(addr as usize, len, Protection::EXEC).ok_or(XomError::InvalidRange {
        start: addr as usize,
        len,
    })
}

/// Attaches the layer (see [`attach`](crate::attach)).
#[unsafe(no_mangle)]
pub extern "C" fn xom_init() -> c_int {
    api_status(attach())
}

/// Detaches the layer (see [`detach`](crate::detach)).
#[unsafe(no_mangle)]
pub extern "C" fn xom_fini() -> c_int {
    api_status(detach())
}

/// Registers `[addr, addr + len)` as execute-only.
#[unsafe(no_mangle)]
pub extern "C" fn xom_protect(addr: *const c_void, len: size_t) -> c_int {
    with_context(|ctx| ctx.protect(&range_of(addr, len)?))
}

/// Unregisters `[addr, addr + len)`. With `len == 0` whatever is
/// registered at `addr` is released.
#[unsafe(no_mangle)]
pub extern "C" fn xom_unprotect(addr: *const c_void, len: size_t) -> c_int {
    with_context(|ctx| ctx.unprotect(&range_of(addr, len)?))
}

/// Registers every executable mapping of the process.
#[unsafe(no_mangle)]
pub extern "C" fn xom_protect_all() -> c_int {
    with_context(PreloadContext::protect_all)
}

/// Unregisters every executable mapping of the process.
#[unsafe(no_mangle)]
pub extern "C" fn xom_unprotect_all() -> c_int {
    with_context(PreloadContext::unprotect_all)
}

/// Flushes a partial batch of device requests.
#[unsafe(no_mangle)]
pub extern "C" fn xom_commit() -> c_int {
    with_context(PreloadContext::commit)
}

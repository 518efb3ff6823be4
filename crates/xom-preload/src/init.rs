// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Load and unload hooks.
//!
//! Placed in `.init_array`/`.fini_array` so the dynamic loader runs them
//! before the program's `main` and after it returns. Unit test binaries link
//! this crate too and must not attach, so the hooks are left out of them.

#[cfg(all(feature = "auto-attach", not(test)))]
mod hooks {
    use crate::state::{attach, detach};

    extern "C" fn on_load() {
        if let Err(e) = attach() {
            log::error!("xom: attach failed, refusing to run unprotected: {e}");
            unsafe { libc::abort() }
        }
    }

    extern "C" fn on_unload() {
        if let Err(e) = detach() {
            log::warn!("xom: detach failed: {e}");
        }
    }

    #[used]
    #[unsafe(link_section = ".init_array")]
    static ON_LOAD: extern "C" fn() = on_load;

    #[used]
    #[unsafe(link_section = ".fini_array")]
    static ON_UNLOAD: extern "C" fn() = on_unload;
}

// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Process-wide context and per-thread re-entrancy tracking.

use std::cell::Cell;
use std::sync::OnceLock;

use xom_backend::{BackendConfig, DeviceBackend};
use xom_intercept::{DlsymRealOps, XomContext, XomError};
use xom_scan::RegionScanner;

/// Context type used by the exported operations.
pub type PreloadContext = XomContext<DeviceBackend, DlsymRealOps>;

static CONTEXT: OnceLock<PreloadContext> = OnceLock::new();

thread_local! {
    static IN_LAYER: Cell<bool> = const { Cell::new(false) };
}

/// Marks the current thread as running layer code.
///
/// Memory operations the layer issues itself (allocations while scanning,
/// building the context) must reach the originals directly: the backend lock
/// is not re-entrant.
pub(crate) struct Reentry(());

impl Reentry {
    /// Returns `None` if the thread is already inside the layer or its
    /// thread-local storage is gone.
    pub(crate) fn enter() -> Option<Self> {
        IN_LAYER
            .try_with(|flag| {
                if flag.replace(true) {
                    None
                } else {
                    Some(Self(()))
                }
            })
            .ok()
            .flatten()
    }
}

impl Drop for Reentry {
    fn drop(&mut self) {
        let _ = IN_LAYER.try_with(|flag| flag.set(false));
    }
}

/// Where an exported operation is sent.
pub(crate) enum Route {
    /// Attached: wrapped operation.
    Intercept(&'static PreloadContext, Reentry),
    /// Detached or re-entrant: original, resolved.
    Passthrough(&'static DlsymRealOps),
    /// Context not built yet: raw system call.
    Bootstrap,
}

pub(crate) fn route() -> Route {
    let Some(ctx) = CONTEXT.get() else {
        return Route::Bootstrap;
    };

    if !ctx.is_attached() {
        return Route::Passthrough(ctx.real());
    }

    match Reentry::enter() {
        Some(reentry) => Route::Intercept(ctx, reentry),
        None => Route::Passthrough(ctx.real()),
    }
}

/// Returns the process-wide context, if it was built.
pub fn context() -> Option<&'static PreloadContext> {
    CONTEXT.get()
}

fn build(config: BackendConfig) -> Result<&'static PreloadContext, XomError> {
    if let Some(ctx) = CONTEXT.get() {
        return Ok(ctx);
    }

    let real = DlsymRealOps::resolve()?;
    log::debug!("originals resolved, device {}", config.device_path.display());
    let ctx = XomContext::new(DeviceBackend::new(config), real, RegionScanner::proc_self());

    Ok(CONTEXT.get_or_init(|| ctx))
}

/// Attaches with the configuration read from the environment.
///
/// See [`attach_with`].
pub fn attach() -> Result<(), XomError> {
    attach_with(BackendConfig::from_env())
}

/// Builds the process-wide context on first use, then opens the device and
/// registers every executable mapping.
///
/// `config` only matters for the call that builds the context. Idempotent
/// while attached.
///
/// # Errors
///
/// - [`XomError::SymbolResolution`] if an original cannot be found; nothing
///   is opened.
/// - any error of [`XomContext::attach`].
pub fn attach_with(config: BackendConfig) -> Result<(), XomError> {
    let _reentry = Reentry::enter();

    let ctx = build(config)?;
    ctx.attach()
}

/// Unregisters everything and closes the device. No-op before the first
/// [`attach`].
pub fn detach() -> Result<(), XomError> {
    let _reentry = Reentry::enter();

    match CONTEXT.get() {
        Some(ctx) => ctx.detach(),
        None => Ok(()),
    }
}

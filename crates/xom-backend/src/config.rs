// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Backend configuration.

use std::ffi::OsString;
use std::num::NonZeroUsize;
use std::path::PathBuf;

/// Device node exposed by the XOM driver.
pub const DEFAULT_DEVICE_PATH: &str = "/dev/vmpl-xom";

/// Number of single-range requests the device accepts per transaction.
pub const DEFAULT_BATCH_SIZE: usize = 64;

const ENV_DEVICE: &str = "XOM_DEVICE";
const ENV_BULK: &str = "XOM_BULK";
const ENV_BATCH_SIZE: &str = "XOM_BATCH_SIZE";

/// How register-all/unregister-all are carried out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkMode {
    /// The device scans and protects the address space itself.
    Native,
    /// The caller scans its own mappings and submits them one range at a time.
    ///
    /// The device flushes automatically every `batch_size` requests; a partial
    /// last batch needs an explicit commit.
    Scan {
        /// Requests per device transaction.
        batch_size: NonZeroUsize,
    },
}

impl Default for BulkMode {
    fn default() -> Self {
        Self::Scan {
            batch_size: NonZeroUsize::new(DEFAULT_BATCH_SIZE)
                .expect("Infallible: DEFAULT_BATCH_SIZE is non-zero"),
        }
    }
}

/// Configuration of a [`DeviceBackend`](crate::DeviceBackend).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendConfig {
    /// Device node opened read-write.
    pub device_path: PathBuf,
    /// Bulk capability of the device.
    pub bulk: BulkMode,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            device_path: PathBuf::from(DEFAULT_DEVICE_PATH),
            bulk: BulkMode::default(),
        }
    }
}

impl BackendConfig {
    /// Reads overrides from `XOM_DEVICE`, `XOM_BULK` and `XOM_BATCH_SIZE`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var_os(key))
    }

    /// Builds a configuration from an arbitrary variable lookup.
    ///
    /// Unparseable values are ignored and the default is kept.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<OsString>,
    {
        let mut config = Self::default();

        if let Some(path) = lookup(ENV_DEVICE).filter(|p| !p.is_empty()) {
            config.device_path = PathBuf::from(path);
        }

        let batch_size = lookup(ENV_BATCH_SIZE).and_then(|raw| {
            let parsed = raw
                .to_str()
                .and_then(|s| s.trim().parse::<usize>().ok())
                .and_then(NonZeroUsize::new);
            if parsed.is_none() {
                log::warn!("ignoring invalid {ENV_BATCH_SIZE}={raw:?}");
            }
            parsed
        });

        let native = match lookup(ENV_BULK) {
            None => false,
            Some(raw) => match raw.to_str() {
                Some("native") => true,
                Some("scan") => false,
                _ => {
                    log::warn!("ignoring invalid {ENV_BULK}={raw:?}");
                    false
                }
            },
        };

        if native {
            config.bulk = BulkMode::Native;
        } else if let Some(batch_size) = batch_size {
            config.bulk = BulkMode::Scan { batch_size };
        }

        config
    }
}

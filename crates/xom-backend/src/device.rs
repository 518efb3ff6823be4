// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! DeviceBackend - ioctl client for the XOM device node.
//!
//! Every request is a single `ioctl(2)` on the open device. Single-range
//! requests carry a [`XomRequest`]; bulk and commit requests carry nothing.

use std::fs::OpenOptions;
use std::os::fd::{AsRawFd, OwnedFd};
use std::os::unix::fs::OpenOptionsExt;

use crate::config::{BackendConfig, BulkMode};
use crate::error::{BackendError, BackendOp};
use crate::range::MemoryRange;
use crate::traits::Backend;

/// Payload of single-range requests.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct XomRequest {
    pub(crate) vstart: u64,
    pub(crate) vend: u64,
}

impl From<&MemoryRange> for XomRequest {
    fn from(range: &MemoryRange) -> Self {
        Self {
            vstart: range.start() as u64,
            vend: range.end() as u64,
        }
    }
}

const IOC_NRSHIFT: u32 = 0;
const IOC_TYPESHIFT: u32 = 8;
const IOC_SIZESHIFT: u32 = 16;
const IOC_DIRSHIFT: u32 = 30;

const IOC_NONE: u32 = 0;
const IOC_WRITE: u32 = 1;

const XOM_IOC_MAGIC: u8 = b'x';

const fn ioc(dir: u32, nr: u32, size: usize) -> u32 {
    (dir << IOC_DIRSHIFT)
        | ((XOM_IOC_MAGIC as u32) << IOC_TYPESHIFT)
        | (nr << IOC_NRSHIFT)
        | ((size as u32) << IOC_SIZESHIFT)
}

pub(crate) const XOM_IOC_PROTECT: u32 = ioc(IOC_WRITE, 1, size_of::<XomRequest>());
pub(crate) const XOM_IOC_UNPROTECT: u32 = ioc(IOC_WRITE, 2, size_of::<XomRequest>());
pub(crate) const XOM_IOC_PROTECT_ALL: u32 = ioc(IOC_NONE, 3, 0);
pub(crate) const XOM_IOC_UNPROTECT_ALL: u32 = ioc(IOC_NONE, 4, 0);
pub(crate) const XOM_IOC_COMMIT: u32 = ioc(IOC_NONE, 5, 0);

/// Backend handle over the XOM device node.
#[derive(Debug)]
pub struct DeviceBackend {
    config: BackendConfig,
    fd: Option<OwnedFd>,
}

impl DeviceBackend {
    /// Creates a closed handle.
    pub fn new(config: BackendConfig) -> Self {
        Self { config, fd: None }
    }

    /// Configuration this handle was created with.
    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    fn request(
        &self,
        op: BackendOp,
        cmd: u32,
        range: Option<&MemoryRange>,
    ) -> Result<(), BackendError> {
        let fd = self.fd.as_ref().ok_or(BackendError::NotOpen)?;

        let ret = match range {
            Some(range) => {
                let req = XomRequest::from(range);
                unsafe {
                    libc::ioctl(
                        fd.as_raw_fd(),
                        cmd as libc::Ioctl,
                        &req as *const XomRequest,
                    )
                }
            }
            None => unsafe { libc::ioctl(fd.as_raw_fd(), cmd as libc::Ioctl) },
        };

        if ret < 0 {
            let errno = std::io::Error::last_os_error()
                .raw_os_error()
                .unwrap_or(libc::EIO);
            return Err(BackendError::Rejected {
                op,
                range: range.copied(),
                errno,
            });
        }

        Ok(())
    }
}

impl Backend for DeviceBackend {
    fn open(&mut self) -> Result<(), BackendError> {
        if self.fd.is_some() {
            return Ok(());
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_CLOEXEC)
            .open(&self.config.device_path)
            .map_err(|e| BackendError::Unavailable {
                path: self.config.device_path.clone(),
                errno: e.raw_os_error().unwrap_or(libc::ENODEV),
            })?;

        log::debug!("opened XOM backend at {:?}", self.config.device_path);
        self.fd = Some(OwnedFd::from(file));

        Ok(())
    }

    fn close(&mut self) {
        if self.fd.take().is_some() {
            log::debug!("closed XOM backend at {:?}", self.config.device_path);
        }
    }

    fn is_open(&self) -> bool {
        self.fd.is_some()
    }

    fn bulk_mode(&self) -> BulkMode {
        self.config.bulk
    }

    fn register_range(&mut self, range: &MemoryRange) -> Result<(), BackendError> {
        self.request(BackendOp::Register, XOM_IOC_PROTECT, Some(range))
    }

    fn unregister_range(&mut self, range: &MemoryRange) -> Result<(), BackendError> {
        self.request(BackendOp::Unregister, XOM_IOC_UNPROTECT, Some(range))
    }

    fn register_all(&mut self) -> Result<(), BackendError> {
        self.request(BackendOp::RegisterAll, XOM_IOC_PROTECT_ALL, None)
    }

    fn unregister_all(&mut self) -> Result<(), BackendError> {
        self.request(BackendOp::UnregisterAll, XOM_IOC_UNPROTECT_ALL, None)
    }

    fn commit(&mut self) -> Result<(), BackendError> {
        self.request(BackendOp::Commit, XOM_IOC_COMMIT, None)
    }
}

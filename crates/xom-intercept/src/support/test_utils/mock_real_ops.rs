// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use libc::{c_int, c_uint, c_void, off_t};

use crate::error::Errno;
use crate::real::RealOps;

const PAGE_SIZE: usize = 4096;
const FIRST_ADDRESS: usize = 0x1000_0000_0000;

/// Operation of the [`RealOps`] interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RealOp {
    /// `mmap`
    Mmap,
    /// `mprotect`
    Mprotect,
    /// `pkey_mprotect`
    PkeyMprotect,
    /// `munmap`
    Munmap,
    /// `mremap`
    Mremap,
    /// `madvise`
    Madvise,
    /// `mlock`
    Mlock,
    /// `mlock2`
    Mlock2,
    /// `shmat`
    Shmat,
    /// `shmdt`
    Shmdt,
    /// `shmctl(IPC_STAT)`
    ShmSegmentSize,
}

/// A call observed by [`MockRealOps`].
///
/// `addr` is the resulting address for calls that produce one (`mmap`,
/// `mremap`, `shmat`) when they succeed, and the address argument otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RealCall {
    /// Operation.
    pub op: RealOp,
    /// Address.
    pub addr: usize,
    /// Length, 0 when the operation carries none.
    pub len: usize,
}

type Observer = Box<dyn FnMut(&RealCall) + Send>;

struct MockRealState {
    next_addr: usize,
    failures: HashMap<RealOp, Errno>,
    segments: HashMap<c_int, usize>,
    calls: Vec<RealCall>,
    observer: Option<Observer>,
}

impl MockRealState {
    fn fresh(&mut self, len: usize) -> usize {
        let addr = self.next_addr;
        let pages = len.div_ceil(PAGE_SIZE).max(1);
        // One unmapped guard page between fake mappings.
        self.next_addr += (pages + 1) * PAGE_SIZE;
        addr
    }

    fn finish(&mut self, op: RealOp, addr: usize, len: usize) -> Result<usize, Errno> {
        let call = RealCall { op, addr, len };
        if let Some(observer) = self.observer.as_mut() {
            observer(&call);
        }
        self.calls.push(call);

        match self.failures.get(&op) {
            Some(errno) => Err(*errno),
            None => Ok(addr),
        }
    }
}

/// Fake platform operations for testing.
///
/// Never touches real memory: mappings get synthetic addresses and every call
/// is logged. Individual operations can be made to fail with a given `errno`.
/// Clones share state.
#[derive(Clone)]
pub struct MockRealOps {
    state: Arc<Mutex<MockRealState>>,
}

impl core::fmt::Debug for MockRealOps {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let state = self.lock();
        f.debug_struct("MockRealOps")
            .field("failures", &state.failures)
            .field("calls", &state.calls.len())
            .finish_non_exhaustive()
    }
}

impl Default for MockRealOps {
    fn default() -> Self {
        Self::new()
    }
}

impl MockRealOps {
    /// Creates a mock where every operation succeeds.
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockRealState {
                next_addr: FIRST_ADDRESS,
                failures: HashMap::new(),
                segments: HashMap::new(),
                calls: Vec::new(),
                observer: None,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MockRealState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Makes every subsequent `op` fail with `errno`.
    pub fn fail_on(&self, op: RealOp, errno: c_int) {
        self.lock().failures.insert(op, Errno(errno));
    }

    /// Makes `op` succeed again.
    pub fn succeed_on(&self, op: RealOp) {
        self.lock().failures.remove(&op);
    }

    /// Declares a System V segment of `size` bytes.
    pub fn add_segment(&self, shmid: c_int, size: usize) {
        self.lock().segments.insert(shmid, size);
    }

    /// Installs a callback invoked for every call, before it completes.
    pub fn set_observer<F>(&self, observer: F)
    where
        F: FnMut(&RealCall) + Send + 'static,
    {
        self.lock().observer = Some(Box::new(observer));
    }

    /// Returns every call observed so far.
    pub fn calls(&self) -> Vec<RealCall> {
        self.lock().calls.clone()
    }
}

impl RealOps for MockRealOps {
    unsafe fn mmap(
        &self,
        addr: *mut c_void,
        len: usize,
        _prot: c_int,
        flags: c_int,
        _fd: c_int,
        _offset: off_t,
    ) -> Result<*mut c_void, Errno> {
        let mut state = self.lock();
        let fails = state.failures.contains_key(&RealOp::Mmap);
        let placed = if fails {
            addr as usize
        } else if flags & libc::MAP_FIXED != 0 {
            addr as usize
        } else {
            state.fresh(len)
        };

        state
            .finish(RealOp::Mmap, placed, len)
            .map(|a| a as *mut c_void)
    }

    unsafe fn mprotect(&self, addr: *mut c_void, len: usize, _prot: c_int) -> Result<(), Errno> {
        self.lock()
            .finish(RealOp::Mprotect, addr as usize, len)
            .map(drop)
    }

    unsafe fn pkey_mprotect(
        &self,
        addr: *mut c_void,
        len: usize,
        _prot: c_int,
        _pkey: c_int,
    ) -> Result<(), Errno> {
        self.lock()
            .finish(RealOp::PkeyMprotect, addr as usize, len)
            .map(drop)
    }

    unsafe fn munmap(&self, addr: *mut c_void, len: usize) -> Result<(), Errno> {
        self.lock()
            .finish(RealOp::Munmap, addr as usize, len)
            .map(drop)
    }

    unsafe fn mremap(
        &self,
        old_addr: *mut c_void,
        old_len: usize,
        new_len: usize,
        flags: c_int,
        new_addr: *mut c_void,
    ) -> Result<*mut c_void, Errno> {
        let mut state = self.lock();
        let fails = state.failures.contains_key(&RealOp::Mremap);
        let placed = if fails {
            old_addr as usize
        } else if flags & libc::MREMAP_FIXED != 0 {
            new_addr as usize
        } else if flags & libc::MREMAP_MAYMOVE != 0
            && (new_len > old_len || flags & libc::MREMAP_DONTUNMAP != 0)
        {
            state.fresh(new_len)
        } else {
            old_addr as usize
        };

        state
            .finish(RealOp::Mremap, placed, new_len)
            .map(|a| a as *mut c_void)
    }

    unsafe fn madvise(&self, addr: *mut c_void, len: usize, _advice: c_int) -> Result<(), Errno> {
        self.lock()
            .finish(RealOp::Madvise, addr as usize, len)
            .map(drop)
    }

    unsafe fn mlock(&self, addr: *const c_void, len: usize) -> Result<(), Errno> {
        self.lock()
            .finish(RealOp::Mlock, addr as usize, len)
            .map(drop)
    }

    unsafe fn mlock2(&self, addr: *const c_void, len: usize, _flags: c_uint) -> Result<(), Errno> {
        self.lock()
            .finish(RealOp::Mlock2, addr as usize, len)
            .map(drop)
    }

    unsafe fn shmat(
        &self,
        shmid: c_int,
        addr: *const c_void,
        _shmflg: c_int,
    ) -> Result<*mut c_void, Errno> {
        let mut state = self.lock();
        let size = state.segments.get(&shmid).copied();
        let fails = size.is_none() || state.failures.contains_key(&RealOp::Shmat);
        let placed = if fails || !addr.is_null() {
            addr as usize
        } else {
            state.fresh(size.unwrap_or(PAGE_SIZE))
        };

        match size {
            None => {
                state.finish(RealOp::Shmat, placed, 0)?;
                Err(Errno(libc::EINVAL))
            }
            Some(size) => state
                .finish(RealOp::Shmat, placed, size)
                .map(|a| a as *mut c_void),
        }
    }

    unsafe fn shmdt(&self, addr: *const c_void) -> Result<(), Errno> {
        self.lock()
            .finish(RealOp::Shmdt, addr as usize, 0)
            .map(drop)
    }

    fn shm_segment_size(&self, shmid: c_int) -> Result<usize, Errno> {
        let mut state = self.lock();
        let size = state.segments.get(&shmid).copied();
        state.finish(RealOp::ShmSegmentSize, 0, size.unwrap_or(0))?;
        size.ok_or(Errno(libc::EINVAL))
    }
}

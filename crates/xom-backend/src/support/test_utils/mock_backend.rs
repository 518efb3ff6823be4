// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::config::BulkMode;
use crate::error::{BackendError, BackendOp};
use crate::range::{MemoryRange, Protection};
use crate::traits::Backend;

/// A request observed by [`MockBackend`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendCall {
    /// `open()`
    Open,
    /// `close()`
    Close,
    /// `register_range(range)`
    Register(MemoryRange),
    /// `unregister_range(range)`
    Unregister(MemoryRange),
    /// `register_all()`
    RegisterAll,
    /// `unregister_all()`
    UnregisterAll,
    /// `commit()`
    Commit,
}

/// Configurable behavior for [`MockBackend`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockBackendBehaviour {
    /// Every request succeeds.
    None,
    /// `open()` fails with [`BackendError::Unavailable`].
    FailOpen,
    /// Every `register_range()` is rejected.
    FailRegisterAlways,
    /// The Nth `register_range()` is rejected (1-indexed).
    FailRegisterAtNth(usize),
    /// Every `unregister_range()` is rejected.
    FailUnregisterAlways,
    /// The Nth `unregister_range()` is rejected (1-indexed).
    FailUnregisterAtNth(usize),
    /// `register_all()` is rejected.
    FailRegisterAll,
    /// `unregister_all()` is rejected.
    FailUnregisterAll,
    /// `commit()` is rejected.
    FailCommit,
}

type Observer = Box<dyn FnMut(&BackendCall) + Send>;

struct MockState {
    behaviour: MockBackendBehaviour,
    bulk: BulkMode,
    open: bool,
    calls: Vec<BackendCall>,
    registered: Vec<MemoryRange>,
    address_space: Vec<MemoryRange>,
    register_count: usize,
    unregister_count: usize,
    observer: Option<Observer>,
}

impl MockState {
    fn record(&mut self, call: BackendCall) {
        if let Some(observer) = self.observer.as_mut() {
            observer(&call);
        }
        self.calls.push(call);
    }

    fn ensure_open(&self) -> Result<(), BackendError> {
        if self.open {
            Ok(())
        } else {
            Err(BackendError::NotOpen)
        }
    }

    fn insert(&mut self, range: &MemoryRange) {
        if range.is_empty() {
            return;
        }
        self.remove(range);
        self.registered.push(normalize(range));
        self.registered.sort_by_key(|r| r.start());
    }

    fn remove(&mut self, range: &MemoryRange) {
        if range.is_empty() {
            self.registered.retain(|r| r.start() != range.start());
            return;
        }

        let mut kept = Vec::with_capacity(self.registered.len() + 1);
        for r in self.registered.drain(..) {
            if !r.overlaps(range) {
                kept.push(r);
                continue;
            }
            let head = MemoryRange::new(r.start(), range.start(), Protection::NONE);
            let tail = MemoryRange::new(range.end(), r.end(), Protection::NONE);
            kept.extend(head.into_iter().chain(tail).filter(|piece| !piece.is_empty()));
        }
        self.registered = kept;
    }
}

fn normalize(range: &MemoryRange) -> MemoryRange {
    MemoryRange::new(range.start(), range.end(), Protection::NONE)
        .expect("Infallible: range bounds are already ordered")
}

fn rejected(op: BackendOp, range: Option<&MemoryRange>) -> BackendError {
    BackendError::Rejected {
        op,
        range: range.copied(),
        errno: libc::EINVAL,
    }
}

/// In-memory backend for testing.
///
/// Keeps a model of the registered set and a log of every request, and can
/// simulate failures via [`MockBackendBehaviour`]. Clones share state, so a
/// test can keep a clone to inspect a backend it handed over.
#[derive(Clone)]
pub struct MockBackend {
    state: Arc<Mutex<MockState>>,
}

impl core::fmt::Debug for MockBackend {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let state = self.lock();
        f.debug_struct("MockBackend")
            .field("behaviour", &state.behaviour)
            .field("bulk", &state.bulk)
            .field("open", &state.open)
            .field("registered", &state.registered)
            .finish_non_exhaustive()
    }
}

impl MockBackend {
    /// Creates a closed mock with the specified behaviour and bulk capability.
    pub fn new(behaviour: MockBackendBehaviour, bulk: BulkMode) -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                behaviour,
                bulk,
                open: false,
                calls: Vec::new(),
                registered: Vec::new(),
                address_space: Vec::new(),
                register_count: 0,
                unregister_count: 0,
                observer: None,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Changes the mock behaviour at runtime.
    pub fn change_behaviour(&self, behaviour: MockBackendBehaviour) {
        self.lock().behaviour = behaviour;
    }

    /// Sets the executable ranges a native `register_all()` will protect.
    pub fn set_address_space(&self, ranges: &[MemoryRange]) {
        self.lock().address_space = ranges.to_vec();
    }

    /// Installs a callback invoked for every request, before it is handled.
    pub fn set_observer<F>(&self, observer: F)
    where
        F: FnMut(&BackendCall) + Send + 'static,
    {
        self.lock().observer = Some(Box::new(observer));
    }

    /// Returns every request observed so far.
    pub fn calls(&self) -> Vec<BackendCall> {
        self.lock().calls.clone()
    }

    /// Forgets the request log (the registered set is kept).
    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    /// Returns the modelled registered set, sorted by start address.
    pub fn registered(&self) -> Vec<MemoryRange> {
        self.lock().registered.clone()
    }

    /// Returns true if the handle is open.
    pub fn opened(&self) -> bool {
        self.lock().open
    }
}

impl Backend for MockBackend {
    fn open(&mut self) -> Result<(), BackendError> {
        let mut state = self.lock();
        state.record(BackendCall::Open);

        if state.behaviour == MockBackendBehaviour::FailOpen {
            return Err(BackendError::Unavailable {
                path: "/dev/mock-xom".into(),
                errno: libc::ENOENT,
            });
        }

        state.open = true;
        Ok(())
    }

    fn close(&mut self) {
        let mut state = self.lock();
        state.record(BackendCall::Close);
        state.open = false;
    }

    fn is_open(&self) -> bool {
        self.lock().open
    }

    fn bulk_mode(&self) -> BulkMode {
        self.lock().bulk
    }

    fn register_range(&mut self, range: &MemoryRange) -> Result<(), BackendError> {
        let mut state = self.lock();
        state.record(BackendCall::Register(*range));
        state.ensure_open()?;

        state.register_count += 1;
        let fail = match state.behaviour {
            MockBackendBehaviour::FailRegisterAlways => true,
            MockBackendBehaviour::FailRegisterAtNth(n) => state.register_count == n,
            _ => false,
        };
        if fail {
            return Err(rejected(BackendOp::Register, Some(range)));
        }

        state.insert(range);
        Ok(())
    }

    fn unregister_range(&mut self, range: &MemoryRange) -> Result<(), BackendError> {
        let mut state = self.lock();
        state.record(BackendCall::Unregister(*range));
        state.ensure_open()?;

        state.unregister_count += 1;
        let fail = match state.behaviour {
            MockBackendBehaviour::FailUnregisterAlways => true,
            MockBackendBehaviour::FailUnregisterAtNth(n) => state.unregister_count == n,
            _ => false,
        };
        if fail {
            return Err(rejected(BackendOp::Unregister, Some(range)));
        }

        state.remove(range);
        Ok(())
    }

    fn register_all(&mut self) -> Result<(), BackendError> {
        let mut state = self.lock();
        state.record(BackendCall::RegisterAll);
        state.ensure_open()?;

        if state.behaviour == MockBackendBehaviour::FailRegisterAll {
            return Err(rejected(BackendOp::RegisterAll, None));
        }

        let address_space = state.address_space.clone();
        for range in address_space.iter().filter(|r| r.protection().is_executable()) {
            state.insert(range);
        }
        Ok(())
    }

    fn unregister_all(&mut self) -> Result<(), BackendError> {
        let mut state = self.lock();
        state.record(BackendCall::UnregisterAll);
        state.ensure_open()?;

        if state.behaviour == MockBackendBehaviour::FailUnregisterAll {
            return Err(rejected(BackendOp::UnregisterAll, None));
        }

        state.registered.clear();
        Ok(())
    }

    fn commit(&mut self) -> Result<(), BackendError> {
        let mut state = self.lock();
        state.record(BackendCall::Commit);
        state.ensure_open()?;

        if state.behaviour == MockBackendBehaviour::FailCommit {
            return Err(rejected(BackendOp::Commit, None));
        }
        Ok(())
    }
}

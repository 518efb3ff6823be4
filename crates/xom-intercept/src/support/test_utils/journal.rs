// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

use std::sync::{Arc, Mutex, PoisonError};

use xom_backend::test_utils::{BackendCall, MockBackend};

use super::mock_real_ops::{MockRealOps, RealCall};

/// One step observed by a [`Journal`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// A call into the real-operation provider.
    Real(RealCall),
    /// A request to the backend.
    Backend(BackendCall),
}

/// Ordered record of real and backend steps.
#[derive(Debug, Clone, Default)]
pub struct Journal {
    steps: Arc<Mutex<Vec<Step>>>,
}

impl Journal {
    /// Creates a journal fed by both mocks.
    pub fn observe(real: &MockRealOps, backend: &MockBackend) -> Self {
        let journal = Self::default();

        let sink = journal.clone();
        real.set_observer(move |call| sink.push(Step::Real(*call)));

        let sink = journal.clone();
        backend.set_observer(move |call| sink.push(Step::Backend(*call)));

        journal
    }

    fn push(&self, step: Step) {
        self.steps
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(step);
    }

    /// Returns the steps recorded so far.
    pub fn steps(&self) -> Vec<Step> {
        self.steps
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Forgets every recorded step.
    pub fn clear(&self) {
        self.steps
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

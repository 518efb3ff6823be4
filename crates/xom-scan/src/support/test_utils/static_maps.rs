// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

use std::io::Cursor;
use std::sync::{Arc, Mutex, PoisonError};

use crate::error::ScanError;
use crate::source::MapsSource;

#[derive(Debug, Default)]
struct StaticMapsState {
    contents: String,
    opens: usize,
    open_error: Option<i32>,
}

/// In-memory maps source whose contents can be swapped between scans.
///
/// Clones share contents. `open` also counts how many scans were started.
#[derive(Debug, Clone, Default)]
pub struct StaticMaps {
    inner: Arc<Mutex<StaticMapsState>>,
}

impl StaticMaps {
    /// Creates a source serving `contents`.
    pub fn new(contents: &str) -> Self {
        Self {
            inner: Arc::new(Mutex::new(StaticMapsState {
                contents: contents.to_string(),
                ..StaticMapsState::default()
            })),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, StaticMapsState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replaces the contents served by subsequent scans.
    pub fn set_contents(&self, contents: &str) {
        self.lock().contents = contents.to_string();
    }

    /// Makes every subsequent `open` fail with `errno`.
    pub fn fail_open(&self, errno: i32) {
        self.lock().open_error = Some(errno);
    }

    /// Number of times the source was opened.
    pub fn open_count(&self) -> usize {
        self.lock().opens
    }
}

impl MapsSource for StaticMaps {
    type Reader = Cursor<String>;

    fn open(&self) -> Result<Self::Reader, ScanError> {
        let mut state = self.lock();
        state.opens += 1;
        match state.open_error {
            Some(errno) => Err(ScanError::Io { errno }),
            None => Ok(Cursor::new(state.contents.clone())),
        }
    }
}

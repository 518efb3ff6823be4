// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Test utilities for xom-intercept.

use std::num::NonZeroUsize;

use xom_backend::{Backend, BulkMode, MemoryRange, Protection};
use xom_scan::RegionScanner;

use crate::context::XomContext;
use crate::support::test_utils::{MockBackend, MockBackendBehaviour, MockRealOps, StaticMaps};

pub type MockContext = XomContext<MockBackend, MockRealOps, StaticMaps>;

/// A context wired to mocks, plus handles to inspect them.
pub struct Fixture {
    pub ctx: MockContext,
    pub backend: MockBackend,
    pub real: MockRealOps,
    pub maps: StaticMaps,
}

pub fn scan_mode(batch_size: usize) -> BulkMode {
    BulkMode::Scan {
        batch_size: NonZeroUsize::new(batch_size).expect("Failed to NonZeroUsize::new(..)"),
    }
}

pub fn fixture(behaviour: MockBackendBehaviour, bulk: BulkMode, maps: &str) -> Fixture {
    let backend = MockBackend::new(behaviour, bulk);
    let real = MockRealOps::new();
    let maps = StaticMaps::new(maps);
    let ctx = XomContext::new(
        backend.clone(),
        real.clone(),
        RegionScanner::new(maps.clone()),
    );

    Fixture {
        ctx,
        backend,
        real,
        maps,
    }
}

/// Attached context over an empty address space with a clean request log.
pub fn attached_fixture() -> Fixture {
    let fx = fixture(MockBackendBehaviour::None, scan_mode(64), "");
    fx.ctx.attach().expect("Failed to attach()");
    fx.backend.clear_calls();
    fx
}

pub fn range(start: usize, end: usize) -> MemoryRange {
    MemoryRange::new(start, end, Protection::NONE).expect("Failed to new(..)")
}

pub fn range_len(start: usize, len: usize, prot: Protection) -> MemoryRange {
    MemoryRange::from_len(start, len, prot).expect("Failed to from_len(..)")
}

/// Renders one `/proc/self/maps` line.
pub fn maps_line(start: usize, end: usize, perms: &str) -> String {
    format!("{start:x}-{end:x} {perms} 00000000 00:00 0\n")
}

/// Renders `count` executable records, one page each, 0x10000 apart.
pub fn exec_maps(count: usize) -> (String, Vec<MemoryRange>) {
    let mut contents = String::new();
    let mut ranges = Vec::with_capacity(count);

    for i in 0..count {
        let start = 0x4000_0000 + i * 0x10000;
        contents.push_str(&maps_line(start, start + 0x1000, "r-xp"));
        contents.push_str(&maps_line(start + 0x1000, start + 0x2000, "rw-p"));
        ranges.push(range(start, start + 0x1000));
    }

    (contents, ranges)
}

/// Registers `range` straight through the backend mock.
pub fn seed(backend: &MockBackend, ranges: &[MemoryRange]) {
    let mut backend = backend.clone();
    for r in ranges {
        backend.register_range(r).expect("Failed to register_range(..)");
    }
    backend.clear_calls();
}

/// Check if seccomp is available by forking a child process that attempts to load a filter.
#[cfg(target_os = "linux")]
pub fn is_seccomp_available() -> bool {
    use libseccomp::{ScmpAction, ScmpFilterContext};

    match unsafe { libc::fork() } {
        -1 => false,
        0 => {
            let result = ScmpFilterContext::new(ScmpAction::Allow).and_then(|filter| filter.load());
            std::process::exit(if result.is_ok() { 0 } else { 1 });
        }
        child_pid => {
            let mut status: libc::c_int = 0;
            unsafe {
                libc::waitpid(child_pid, &mut status, 0);
            }

            libc::WIFEXITED(status) && libc::WEXITSTATUS(status) == 0
        }
    }
}

/// Runs an ignored test as a subprocess and returns its exit code.
#[cfg(target_os = "linux")]
pub fn run_test_as_subprocess(test_name: &str) -> Option<i32> {
    let exe = std::env::current_exe().expect("Failed to current_exe()");
    let status = std::process::Command::new(exe)
        .args([
            "--exact",
            test_name,
            "--ignored",
            "--test-threads=1",
            "--nocapture",
        ])
        .status()
        .expect("Failed to run subprocess");

    status.code()
}

#[cfg(target_os = "linux")]
fn block_syscall(name: &str) {
    use libseccomp::{ScmpAction, ScmpFilterContext, ScmpSyscall};

    let mut filter = ScmpFilterContext::new(ScmpAction::Allow).expect("Failed to create filter");
    filter
        .add_rule(
            ScmpAction::Errno(libc::EPERM),
            ScmpSyscall::from_name(name).expect("Failed to from_name(..)"),
        )
        .expect("Failed to add rule");
    filter.load().expect("Failed to load seccomp filter");
}

#[cfg(target_os = "linux")]
pub fn block_mprotect() {
    block_syscall("mprotect");
}

#[cfg(target_os = "linux")]
pub fn block_mremap() {
    block_syscall("mremap");
}

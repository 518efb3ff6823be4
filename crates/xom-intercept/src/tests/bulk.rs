// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

use xom_backend::{Backend, BackendConfig, BackendError, BackendOp, BulkMode, DeviceBackend};
use xom_scan::{ProcSelfMaps, RegionScanner, ScanError};

use super::utils::{exec_maps, fixture, maps_line, range, scan_mode};
use crate::context::XomContext;
use crate::error::XomError;
use crate::support::test_utils::{BackendCall, MockBackend, MockBackendBehaviour, MockRealOps};

fn count(calls: &[BackendCall], wanted: fn(&BackendCall) -> bool) -> usize {
    calls.iter().filter(|c| wanted(c)).count()
}

fn is_register(call: &BackendCall) -> bool {
    matches!(call, BackendCall::Register(_))
}

fn is_unregister(call: &BackendCall) -> bool {
    matches!(call, BackendCall::Unregister(_))
}

fn is_commit(call: &BackendCall) -> bool {
    matches!(call, BackendCall::Commit)
}

#[test]
fn test_scan_commits_only_partial_batches() {
    let cases = [(0, 4, 0), (3, 4, 1), (4, 4, 0), (5, 4, 1), (8, 4, 0), (1, 1, 0), (7, 64, 1)];

    for (regions, batch, commits) in cases {
        let (maps, _) = exec_maps(regions);
        let fx = fixture(MockBackendBehaviour::None, scan_mode(batch), &maps);

        fx.ctx.attach().expect("Failed to attach()");

        let calls = fx.backend.calls();
        assert_eq!(count(&calls, is_register), regions, "{regions}/{batch}");
        assert_eq!(count(&calls, is_commit), commits, "{regions}/{batch}");
    }
}

#[test]
fn test_scan_commit_follows_last_request() {
    let (maps, _) = exec_maps(3);
    let fx = fixture(MockBackendBehaviour::None, scan_mode(2), &maps);

    fx.ctx.attach().expect("Failed to attach()");

    assert_eq!(fx.backend.calls().last(), Some(&BackendCall::Commit));
}

#[test]
fn test_scan_unregister_all_mirrors_register_all() {
    let (maps, ranges) = exec_maps(5);
    let fx = fixture(MockBackendBehaviour::None, scan_mode(2), &maps);
    fx.ctx.attach().expect("Failed to attach()");
    fx.backend.clear_calls();

    fx.ctx.unprotect_all().expect("Failed to unprotect_all()");

    let calls = fx.backend.calls();
    let unregistered: Vec<_> = calls
        .iter()
        .filter_map(|c| match c {
            BackendCall::Unregister(r) => Some(range(r.start(), r.end())),
            _ => None,
        })
        .collect();

    assert_eq!(unregistered, ranges);
    assert_eq!(count(&calls, is_unregister), 5);
    assert_eq!(count(&calls, is_commit), 1);
}

#[test]
fn test_scan_never_submits_vsyscall_page() {
    let mut maps = maps_line(0x4000_0000, 0x4000_1000, "r-xp");
    maps.push_str(&maps_line(0xffff_ffff_ff60_0000, 0xffff_ffff_ff60_1000, "--xp"));
    let fx = fixture(MockBackendBehaviour::None, scan_mode(64), &maps);

    fx.ctx.attach().expect("Failed to attach()");
    fx.ctx.unprotect_all().expect("Failed to unprotect_all()");

    let vsyscall = 0xffff_ffff_ff60_0000usize;
    assert!(fx.backend.calls().iter().all(|c| match c {
        BackendCall::Register(r) | BackendCall::Unregister(r) => r.start() != vsyscall,
        _ => true,
    }));
}

#[test]
fn test_scan_skips_malformed_records() {
    let mut maps = String::from("garbage\n");
    maps.push_str(&maps_line(0x4000_0000, 0x4000_1000, "r-xp"));
    maps.push_str("4000 r-xp\n");
    let fx = fixture(MockBackendBehaviour::None, scan_mode(64), &maps);

    fx.ctx.attach().expect("Failed to attach()");

    assert_eq!(fx.backend.registered(), vec![range(0x4000_0000, 0x4000_1000)]);
}

#[test]
fn test_scan_rereads_source_each_time() {
    let (first, _) = exec_maps(1);
    let (second, ranges) = exec_maps(3);
    let fx = fixture(MockBackendBehaviour::None, scan_mode(64), &first);
    fx.ctx.attach().expect("Failed to attach()");

    fx.maps.set_contents(&second);
    fx.ctx.protect_all().expect("Failed to protect_all()");

    assert_eq!(fx.backend.registered(), ranges);
    assert_eq!(fx.maps.open_count(), 2);
}

#[test]
fn test_scan_commit_failure_aborts() {
    let (maps, _) = exec_maps(3);
    let fx = fixture(MockBackendBehaviour::FailCommit, scan_mode(2), &maps);

    let result = fx.ctx.attach();

    assert!(matches!(
        result,
        Err(XomError::Backend(BackendError::Rejected {
            op: BackendOp::Commit,
            ..
        }))
    ));
}

#[test]
fn test_scan_register_failure_stops_submission() {
    let (maps, _) = exec_maps(5);
    let fx = fixture(MockBackendBehaviour::FailRegisterAtNth(3), scan_mode(2), &maps);

    let result = fx.ctx.attach();

    assert!(result.is_err());
    let calls = fx.backend.calls();
    assert_eq!(count(&calls, is_register), 3);
    assert_eq!(count(&calls, is_commit), 0);
}

#[test]
fn test_scan_failure_sends_nothing() {
    let backend = MockBackend::new(MockBackendBehaviour::None, scan_mode(64));
    let ctx = XomContext::new(
        backend.clone(),
        MockRealOps::new(),
        RegionScanner::new(ProcSelfMaps::with_path("/nonexistent/maps")),
    );

    let result = ctx.attach();

    assert_eq!(
        result,
        Err(XomError::Scan(ScanError::Io {
            errno: libc::ENOENT
        }))
    );
    assert_eq!(backend.calls(), vec![BackendCall::Open]);
}

#[test]
fn test_native_mode_delegates_without_scanning() {
    let (maps, _) = exec_maps(4);
    let fx = fixture(MockBackendBehaviour::None, BulkMode::Native, &maps);

    fx.ctx.attach().expect("Failed to attach()");
    fx.ctx.detach().expect("Failed to detach()");

    assert_eq!(
        fx.backend.calls(),
        vec![
            BackendCall::Open,
            BackendCall::RegisterAll,
            BackendCall::UnregisterAll,
            BackendCall::Close,
        ]
    );
    assert_eq!(fx.maps.open_count(), 0);
}

#[test]
fn test_native_register_all_failure_surfaces() {
    let fx = fixture(MockBackendBehaviour::FailRegisterAll, BulkMode::Native, "");

    assert!(matches!(
        fx.ctx.attach(),
        Err(XomError::Backend(BackendError::Rejected {
            op: BackendOp::RegisterAll,
            ..
        }))
    ));
}

#[test]
fn test_bulk_requires_open_backend() {
    let (maps, _) = exec_maps(2);
    let fx = fixture(MockBackendBehaviour::None, scan_mode(64), &maps);

    assert_eq!(
        fx.ctx.protect_all(),
        Err(XomError::Backend(BackendError::NotOpen))
    );
    assert_eq!(fx.maps.open_count(), 0);
    assert!(fx.backend.calls().is_empty());
}

#[test]
fn test_device_backend_attach_fails_without_device() {
    let config = BackendConfig {
        device_path: "/nonexistent/vmpl-xom".into(),
        bulk: scan_mode(64),
    };
    let backend = DeviceBackend::new(config);
    let ctx = XomContext::new(backend, MockRealOps::new(), RegionScanner::proc_self());

    let result = ctx.attach();

    assert!(matches!(
        result,
        Err(XomError::Backend(BackendError::Unavailable { errno, .. })) if errno == libc::ENOENT
    ));
    assert!(!ctx.is_attached());
    assert!(!ctx.lock_backend().is_open());
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_support::{ctx, gnu_backend};
use crate::tools::{ls, ps};
use cmdx_adapters::{FakeBackend, RawOutput};
use cmdx_core::RemoteHost;
use std::time::Duration;
use yare::parameterized;

fn pinned(flavor: Option<&str>, version: Option<&str>) -> VersionService {
    let mut tools = BTreeMap::new();
    tools.insert(
        "ls".to_string(),
        ToolSettings {
            flavor: flavor.map(String::from),
            version: version.map(String::from),
            cache_ttl_ms: None,
        },
    );
    VersionService::new(tools)
}

#[tokio::test]
async fn detects_gnu_and_selects_its_adapter() {
    let backend = gnu_backend();
    let info = VersionService::default().resolve(&ls::tool(), &ctx(), &backend).await;

    assert_eq!(info.version, Some(Version::new(9, 4, 0)));
    assert_eq!(info.flavor.as_deref(), Some("gnu"));
    assert_eq!(info.adapter.as_deref(), Some("gnu-long"));
}

#[parameterized(
    busybox = { "BusyBox v1.36.1 (2023-11-07) multi-call binary.", 1, Some("busybox"), Some("busybox-long") },
    bsd_rejects_flag = { "ls: unrecognized option `--version'\nusage: ls [-ABC]", 1, Some("bsd"), Some("bsd-long") },
    not_installed = { "sh: ls: not found", 127, None, None },
)]
fn flavor_from_detection_output(
    output: &str,
    exit_code: i32,
    flavor: Option<&str>,
    adapter: Option<&str>,
) {
    tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
        let backend = FakeBackend::new();
        backend.on_exit("ls --version", RawOutput::new("", exit_code).with_stderr(output));

        let info = VersionService::default().resolve(&ls::tool(), &ctx(), &backend).await;

        assert_eq!(info.flavor.as_deref(), flavor);
        assert_eq!(info.adapter.as_deref(), adapter);
    });
}

#[tokio::test]
async fn procps_marker_is_detected() {
    let backend = FakeBackend::new();
    backend.on_stdout("ps --version", "ps from procps-ng 3.3.17\n");

    let info = VersionService::default().resolve(&ps::tool(), &ctx(), &backend).await;

    assert_eq!(info.version, Some(Version::new(3, 3, 17)));
    assert_eq!(info.adapter.as_deref(), Some("procps"));
}

#[tokio::test]
async fn detection_runs_once_per_tool_and_target() {
    let backend = gnu_backend();
    let service = VersionService::default();
    let remote = CommandContext::remote(RemoteHost::new("db1", "ops"), "/srv").unwrap();

    service.resolve(&ls::tool(), &ctx(), &backend).await;
    service.resolve(&ls::tool(), &ctx(), &backend).await;
    service.resolve(&ls::tool(), &remote, &backend).await;

    assert_eq!(backend.calls_matching("ls --version"), 2);
}

#[tokio::test(start_paused = true)]
async fn concurrent_callers_share_one_detection() {
    let backend = gnu_backend();
    backend.set_delay(Duration::from_millis(50));
    let service = VersionService::default();
    let tool = ls::tool();
    let ctx = ctx();

    let (a, b) = tokio::join!(
        service.resolve(&tool, &ctx, &backend),
        service.resolve(&tool, &ctx, &backend)
    );

    assert_eq!(a, b);
    assert_eq!(backend.calls_matching("ls --version"), 1);
}

#[tokio::test]
async fn invalidate_and_refresh_detect_again() {
    let backend = gnu_backend();
    let service = VersionService::default();

    service.resolve(&ls::tool(), &ctx(), &backend).await;
    service.invalidate("ls", "local");
    service.resolve(&ls::tool(), &ctx(), &backend).await;
    backend.on_stdout("ls --version", "ls (GNU coreutils) 9.5\n");
    let refreshed = service.refresh(&ls::tool(), &ctx(), &backend).await;
    service.invalidate_all();
    service.resolve(&ls::tool(), &ctx(), &backend).await;

    assert_eq!(refreshed.version, Some(Version::new(9, 5, 0)));
    assert_eq!(backend.calls_matching("ls --version"), 4);
}

#[tokio::test]
async fn failed_detection_is_not_remembered() {
    let backend = FakeBackend::new();
    backend.on_error("ls --version", BackendError::Execution("spawn failed".to_string()));
    let service = VersionService::default();

    let first = service.resolve(&ls::tool(), &ctx(), &backend).await;
    service.resolve(&ls::tool(), &ctx(), &backend).await;

    assert_eq!(first.adapter, None);
    assert_eq!(backend.calls_matching("ls --version"), 2);
}

#[tokio::test]
async fn pinned_version_skips_detection() {
    let backend = gnu_backend();
    let info = pinned(Some("gnu"), Some("8.32")).resolve(&ls::tool(), &ctx(), &backend).await;

    assert_eq!(info.version, Some(Version::new(8, 32, 0)));
    assert_eq!(info.adapter.as_deref(), Some("gnu-long"));
    assert_eq!(backend.call_count(), 0);
}

#[tokio::test]
async fn pinned_flavor_overrides_markers() {
    let backend = gnu_backend();
    let info = pinned(Some("busybox"), None).resolve(&ls::tool(), &ctx(), &backend).await;

    assert_eq!(info.version, Some(Version::new(9, 4, 0)));
    assert_eq!(info.adapter.as_deref(), Some("busybox-long"));
}

#[tokio::test]
async fn probe_never_runs_privileged() {
    let backend = gnu_backend();
    let ctx = ctx().with_privileged(true);
    VersionService::default().resolve(&ls::tool(), &ctx, &backend).await;
    assert!(!backend.calls()[0].privileged);
}

#[tokio::test]
async fn plain_tools_are_not_probed() {
    let backend = FakeBackend::new();
    let info = VersionService::default()
        .resolve(&crate::tool::Tool::new("mkdir"), &ctx(), &backend)
        .await;
    assert_eq!(info, VersionInfo::unknown("mkdir"));
    assert_eq!(backend.call_count(), 0);
}

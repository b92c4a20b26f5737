//! Breakpoint reconciliation against the remote list.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use sphere_debug::models::breakpoint::Breakpoint;
use sphere_debug::paths::{LineMapper, PathResolver};
use sphere_debug::persistence::{BreakpointStore, MemorySettingsStore};
use sphere_debug::session::breakpoints::{reconcile, Reconciled};
use sphere_debug::{AppError, DebugSession};

use super::test_helpers::{project, ConnectMode, Harness, ScriptedClient, ScriptedConnector};

#[tokio::test]
async fn setting_twice_leaves_one_remote_entry() {
    let h = Harness::attached().await;
    let main = h.project.script("main.js");

    h.session.set_breakpoint(&main, 10, true).await.expect("first set");
    h.session.set_breakpoint(&main, 10, true).await.expect("second set");

    assert_eq!(h.client().remote_breakpoints(), vec![Breakpoint::new("main.js", 10)]);
}

#[tokio::test]
async fn disabling_removes_every_copy() {
    let h = Harness::attached().await;
    h.client().set_remote_breakpoints(vec![
        Breakpoint::new("main.js", 10),
        Breakpoint::new("lib/ai.js", 3),
        Breakpoint::new("main.js", 10),
    ]);

    h.session
        .set_breakpoint(&h.project.script("main.js"), 10, false)
        .await
        .expect("disable");

    assert_eq!(h.client().remote_breakpoints(), vec![Breakpoint::new("lib/ai.js", 3)]);
}

#[tokio::test]
async fn duplicates_collapse_to_one_when_enabling() {
    let h = Harness::attached().await;
    h.client().set_remote_breakpoints(vec![
        Breakpoint::new("main.js", 10),
        Breakpoint::new("lib/ai.js", 3),
        Breakpoint::new("main.js", 10),
    ]);

    h.session
        .set_breakpoint(&h.project.script("main.js"), 10, true)
        .await
        .expect("enable");

    assert_eq!(
        h.client().remote_breakpoints(),
        vec![Breakpoint::new("lib/ai.js", 3), Breakpoint::new("main.js", 10)]
    );
    // Highest index is removed first so earlier indices stay valid.
    let calls = h.client().calls();
    let removals: Vec<&String> = calls.iter().filter(|c| c.starts_with("remove")).collect();
    assert_eq!(removals, ["remove_breakpoint 2", "remove_breakpoint 0"]);
}

#[tokio::test]
async fn virtual_paths_pass_through_unchanged() {
    let h = Harness::attached().await;

    h.session
        .set_breakpoint(Path::new("~sys/modules/link.js"), 5, true)
        .await
        .expect("set");

    assert_eq!(
        h.client().remote_breakpoints(),
        vec![Breakpoint::new("~sys/modules/link.js", 5)]
    );
}

#[tokio::test]
async fn breakpoint_lines_are_mapped_into_generated_script() {
    let project = project();
    let mut mapper = LineMapper::new();
    mapper
        .add_source("main.js", r#"{"version": 3, "mappings": "AAAA;AAEA"}"#)
        .expect("map");
    let connector = Arc::new(ScriptedConnector::new(ConnectMode::SucceedAfter(0), Duration::ZERO));
    let (tx, _rx) = mpsc::channel(64);
    let session = DebugSession::with_paths(
        project.config.clone(),
        PathResolver::from_config(&project.config),
        mapper,
        connector.clone(),
        tx,
    );
    assert!(session.attach().await);

    session
        .set_breakpoint(&project.script("main.js"), 3, true)
        .await
        .expect("set");

    assert_eq!(
        connector.client.remote_breakpoints(),
        vec![Breakpoint::new("main.js", 2)]
    );
}

#[tokio::test]
async fn persisted_breakpoints_are_restored() {
    let h = Harness::attached().await;
    let mut store = BreakpointStore::new(MemorySettingsStore::new());
    store.set_breakpoints("main.js", &[8, 3]);
    store.set_breakpoints("~/lib/ai.js", &[1]);

    let restored = h.session.restore_breakpoints(&store).await.expect("restore");

    assert_eq!(restored, 3);
    let mut remote = h.client().remote_breakpoints();
    remote.sort();
    assert_eq!(
        remote,
        vec![
            Breakpoint::new("main.js", 3),
            Breakpoint::new("main.js", 8),
            Breakpoint::new("~/lib/ai.js", 1),
        ]
    );
}

#[tokio::test]
async fn setting_breakpoints_requires_a_session() {
    let h = Harness::new(ConnectMode::SucceedAfter(0), Duration::ZERO);

    let err = h
        .session
        .set_breakpoint(&h.project.script("main.js"), 1, true)
        .await
        .expect_err("no session");

    assert!(matches!(err, AppError::NotAttached(_)));
}

#[tokio::test]
async fn reconcile_reports_operations() {
    let client = ScriptedClient::default();
    client.set_remote_breakpoints(vec![Breakpoint::new("a.js", 1), Breakpoint::new("a.js", 1)]);
    let target = Breakpoint::new("a.js", 1);

    let outcome = reconcile(&client, &target, true).await.expect("reconcile");
    assert_eq!(outcome, Reconciled { removed: 2, added: true });

    let outcome = reconcile(&client, &target, false).await.expect("reconcile");
    assert_eq!(outcome, Reconciled { removed: 1, added: false });
    assert!(client.remote_breakpoints().is_empty());
}

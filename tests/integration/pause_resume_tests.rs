//! Pause/resume state machine, debounce timers and location fallback.

use std::time::Duration;

use sphere_debug::models::frame::{PauseSnapshot, Variable};
use sphere_debug::models::session::{CurrentLocation, SessionState};
use sphere_debug::session::{OutputKind, SessionEvent};
use sphere_debug::wire::WireEvent;

use super::test_helpers::{frame, Harness};

fn paused_at(event: &SessionEvent) -> &CurrentLocation {
    match event {
        SessionEvent::Paused { location } => location,
        other => panic!("expected Paused, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn pause_then_resume_raises_each_event_once() {
    let mut h = Harness::attached().await;

    h.emit_status(false, "main.js", 7).await;
    let paused = h.next_event().await;
    assert_eq!(
        paused_at(&paused),
        &CurrentLocation {
            file_name: h.project.script("main.js"),
            line_number: 7,
        }
    );
    let view = h.session.view();
    assert_eq!(view.state, SessionState::Paused);
    assert!(!view.running);

    h.emit_status(true, "main.js", 7).await;
    assert_eq!(h.next_event().await, SessionEvent::Resumed);
    h.emit_status(true, "main.js", 8).await;

    let rest = h.drain_events(Duration::from_secs(2)).await;
    assert_eq!(rest, vec![SessionEvent::FocusDebuggee]);
    let view = h.session.view();
    assert_eq!(view.state, SessionState::Running);
    assert!(view.running);
}

#[tokio::test(start_paused = true)]
async fn running_status_while_attached_is_ignored() {
    let mut h = Harness::attached().await;

    h.emit_status(true, "main.js", 1).await;
    h.emit(WireEvent::Print("tick".into())).await;

    assert_eq!(
        h.next_event().await,
        SessionEvent::Output {
            kind: OutputKind::Print,
            text: "tick".into(),
        }
    );
    assert_eq!(h.session.view().state, SessionState::Attached);
}

#[tokio::test(start_paused = true)]
async fn settled_pause_fetches_stack_and_locals() {
    let mut h = Harness::attached().await;
    let snapshot = PauseSnapshot {
        stack: vec![frame("update", "main.js", 7)],
        locals: vec![Variable {
            name: "hp".into(),
            value: "12".into(),
            kind: "number".into(),
        }],
    };
    h.client().set_stack(snapshot.stack.clone());
    h.client().set_locals(snapshot.locals.clone());

    h.emit_status(false, "main.js", 7).await;
    paused_at(&h.next_event().await);
    assert_eq!(h.session.snapshot(), None);

    assert_eq!(h.next_event().await, SessionEvent::ViewsUpdated(snapshot.clone()));
    assert_eq!(h.session.snapshot(), Some(snapshot));
}

#[tokio::test(start_paused = true)]
async fn poll_cancelled_by_resume_publishes_nothing() {
    let mut h = Harness::attached().await;
    h.client().set_stack(vec![frame("update", "main.js", 7)]);

    h.emit_status(false, "main.js", 7).await;
    paused_at(&h.next_event().await);
    h.emit_status(true, "main.js", 7).await;
    assert_eq!(h.next_event().await, SessionEvent::Resumed);

    let rest = h.drain_events(Duration::from_secs(2)).await;
    assert!(
        rest.iter().all(|e| !matches!(e, SessionEvent::ViewsUpdated(_))),
        "stale snapshot published: {rest:?}"
    );
    assert_eq!(h.session.snapshot(), None);
    assert!(!h.client().calls().iter().any(|c| c == "locals"));
}

#[tokio::test(start_paused = true)]
async fn repeated_pause_report_refreshes_location() {
    let mut h = Harness::attached().await;

    h.emit_status(false, "main.js", 7).await;
    assert_eq!(paused_at(&h.next_event().await).line_number, 7);
    h.emit_status(false, "main.js", 9).await;
    assert_eq!(paused_at(&h.next_event().await).line_number, 9);

    let location = h.session.view().location.expect("location");
    assert_eq!(location.line_number, 9);

    let rest = h.drain_events(Duration::from_secs(2)).await;
    let refreshes = rest
        .iter()
        .filter(|e| matches!(e, SessionEvent::ViewsUpdated(_)))
        .count();
    assert_eq!(refreshes, 1, "poll debounce should collapse: {rest:?}");
}

#[tokio::test(start_paused = true)]
async fn focus_debounce_restarts_on_each_resume() {
    let mut h = Harness::attached().await;

    h.emit_status(false, "main.js", 1).await;
    paused_at(&h.next_event().await);
    h.emit_status(true, "main.js", 1).await;
    assert_eq!(h.next_event().await, SessionEvent::Resumed);

    tokio::time::sleep(Duration::from_millis(100)).await;
    h.emit_status(false, "main.js", 2).await;
    paused_at(&h.next_event().await);
    h.emit_status(true, "main.js", 2).await;
    assert_eq!(h.next_event().await, SessionEvent::Resumed);

    let rest = h.drain_events(Duration::from_secs(2)).await;
    let focus = rest
        .iter()
        .filter(|e| **e == SessionEvent::FocusDebuggee)
        .count();
    assert_eq!(focus, 1, "only the latest resume should focus: {rest:?}");
}

#[tokio::test(start_paused = true)]
async fn missing_file_falls_back_to_first_script_frame() {
    let mut h = Harness::attached().await;
    h.emit(WireEvent::Attached {
        target_id: "demo".into(),
        version: "4.3".into(),
    })
    .await;
    assert!(matches!(h.next_event().await, SessionEvent::Identified(_)));
    let stack = vec![frame("", "demo", 0), frame("update", "main.js", 12)];
    h.client().set_stack(stack.clone());

    h.emit_status(false, "~/build/gone.js", 3).await;

    assert_eq!(h.next_event().await, SessionEvent::StackUpdated { stack });
    let paused = h.next_event().await;
    assert_eq!(
        paused_at(&paused),
        &CurrentLocation {
            file_name: h.project.script("main.js"),
            line_number: 12,
        }
    );
}

#[tokio::test(start_paused = true)]
async fn fallback_keeps_reported_location_without_script_frames() {
    let mut h = Harness::attached().await;
    let stack = vec![frame("", "anything", 0)];
    h.client().set_stack(stack.clone());

    h.emit_status(false, "~/build/gone.js", 3).await;

    assert_eq!(h.next_event().await, SessionEvent::StackUpdated { stack });
    let paused = h.next_event().await;
    assert_eq!(
        paused_at(&paused),
        &CurrentLocation {
            file_name: h.project.root().join("build").join("gone.js"),
            line_number: 3,
        }
    );
}

#[tokio::test(start_paused = true)]
async fn error_highlight_is_cleared_on_resume() {
    let mut h = Harness::attached().await;

    h.emit(WireEvent::ErrorThrown {
        message: "ReferenceError: hp is not defined".into(),
        fatal: false,
        file_name: "main.js".into(),
        line_number: 4,
    })
    .await;
    let SessionEvent::ErrorThrown(report) = h.next_event().await else {
        panic!("expected ErrorThrown");
    };
    assert_eq!(report.location.file_name, h.project.script("main.js"));
    assert_eq!(report.location.line_number, 4);
    assert_eq!(h.session.view().highlighted_error, Some(report));

    h.emit_status(false, "main.js", 4).await;
    paused_at(&h.next_event().await);
    assert!(h.session.view().highlighted_error.is_some());

    h.emit_status(true, "main.js", 4).await;
    assert_eq!(h.next_event().await, SessionEvent::Resumed);
    assert!(h.session.view().highlighted_error.is_none());
}

#[tokio::test(start_paused = true)]
async fn console_output_is_forwarded_verbatim() {
    let mut h = Harness::attached().await;

    h.emit(WireEvent::Print("  spaced\n".into())).await;
    h.emit(WireEvent::Alert("careful".into())).await;

    assert_eq!(
        h.next_event().await,
        SessionEvent::Output {
            kind: OutputKind::Print,
            text: "  spaced\n".into(),
        }
    );
    assert_eq!(
        h.next_event().await,
        SessionEvent::Output {
            kind: OutputKind::Alert,
            text: "careful".into(),
        }
    );
}

#[tokio::test(start_paused = true)]
async fn detach_while_paused_clears_snapshot() {
    let mut h = Harness::attached().await;
    h.client().set_stack(vec![frame("update", "main.js", 7)]);
    h.emit_status(false, "main.js", 7).await;
    paused_at(&h.next_event().await);
    assert!(matches!(h.next_event().await, SessionEvent::ViewsUpdated(_)));

    h.session.detach().await;

    assert!(matches!(h.next_event().await, SessionEvent::Detached { .. }));
    assert_eq!(h.session.snapshot(), None);
    assert_eq!(h.session.view().location, None);
}

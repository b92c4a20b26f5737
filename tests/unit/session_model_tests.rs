//! Unit tests for session state rules.

use sphere_debug::models::breakpoint::Breakpoint;
use sphere_debug::models::session::{SessionState, SessionView};

#[test]
fn running_flag_tracks_attached_and_running() {
    assert!(SessionState::Attached.is_running());
    assert!(SessionState::Running.is_running());
    assert!(!SessionState::Paused.is_running());
    assert!(!SessionState::Idle.is_running());
    assert!(!SessionState::Connecting.is_running());
    assert!(!SessionState::Detached.is_running());
}

#[test]
fn live_states() {
    assert!(SessionState::Attached.is_live());
    assert!(SessionState::Running.is_live());
    assert!(SessionState::Paused.is_live());
    assert!(!SessionState::Idle.is_live());
    assert!(!SessionState::Connecting.is_live());
    assert!(!SessionState::Detached.is_live());
}

#[test]
fn valid_transitions() {
    use SessionState::{Attached, Connecting, Detached, Idle, Paused, Running};

    assert!(Idle.can_transition_to(Connecting));
    assert!(Detached.can_transition_to(Connecting));
    assert!(Connecting.can_transition_to(Attached));
    assert!(Connecting.can_transition_to(Idle));
    assert!(Attached.can_transition_to(Paused));
    assert!(Running.can_transition_to(Paused));
    assert!(Paused.can_transition_to(Running));
    assert!(Paused.can_transition_to(Paused));
    assert!(Attached.can_transition_to(Detached));
    assert!(Paused.can_transition_to(Detached));
}

#[test]
fn invalid_transitions() {
    use SessionState::{Attached, Connecting, Detached, Idle, Paused, Running};

    assert!(!Idle.can_transition_to(Attached));
    assert!(!Idle.can_transition_to(Paused));
    assert!(!Attached.can_transition_to(Running));
    assert!(!Running.can_transition_to(Running));
    assert!(!Detached.can_transition_to(Paused));
    assert!(!Paused.can_transition_to(Connecting));
}

#[test]
fn default_view_is_idle_and_stopped() {
    let view = SessionView::default();

    assert_eq!(view.state, SessionState::Idle);
    assert!(!view.running);
    assert!(view.session_id.is_none());
    assert!(view.location.is_none());
    assert!(view.highlighted_error.is_none());
}

#[test]
fn breakpoints_compare_by_file_and_line() {
    let a = Breakpoint::new("main.js", 10);

    assert!(a.same_location(&Breakpoint::new("main.js", 10)));
    assert!(!a.same_location(&Breakpoint::new("main.js", 11)));
    assert!(!a.same_location(&Breakpoint::new("~/main.js", 10)));
}

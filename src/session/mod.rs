//! Debug session control.
//!
//! - `connection`: bounded retrying connect loop.
//! - `breakpoints`: idempotent remote breakpoint reconciliation.
//! - `timer`: re-armable one-shot debounce timers.
//! - `actor`: the session task that owns all mutable state.
//! - `controller`: [`DebugSession`](controller::DebugSession), the public handle.
//!
//! Wire events, timer fires and fetch replies are all delivered to the
//! session task as messages, so session state has exactly one writer.

mod actor;
pub mod breakpoints;
pub mod connection;
pub mod controller;
pub mod timer;

use crate::models::frame::{ErrorReport, PauseSnapshot, StackFrame};
use crate::models::session::{CurrentLocation, TargetInfo};
use crate::Result;

use self::timer::TimerKind;

/// Kind of console output forwarded from the debuggee.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    /// `print()` output.
    Print,
    /// `alert()` output.
    Alert,
}

/// Notifications raised for session observers (editor UI).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A connection was established.
    Attached {
        /// Identifier of the new session.
        session_id: String,
    },
    /// The debuggee announced its identity.
    Identified(TargetInfo),
    /// The session ended.
    Detached {
        /// Identifier of the ended session.
        session_id: String,
    },
    /// Execution stopped.
    Paused {
        /// Resolved pause location.
        location: CurrentLocation,
    },
    /// Execution resumed after a pause.
    Resumed,
    /// A script threw an uncaught error.
    ErrorThrown(ErrorReport),
    /// Console output, verbatim.
    Output {
        /// Which console call produced it.
        kind: OutputKind,
        /// Text as sent by the debuggee.
        text: String,
    },
    /// The debuggee window should be brought to the foreground.
    FocusDebuggee,
    /// A call stack was fetched early, during the pause fallback walk.
    StackUpdated {
        /// Call stack, innermost first.
        stack: Vec<StackFrame>,
    },
    /// Stack and locals fetched after the pause settled.
    ViewsUpdated(PauseSnapshot),
}

/// Messages handled on the session task.
#[derive(Debug)]
pub enum SessionMessage {
    /// A debounce timer elapsed.
    TimerFired {
        /// Which timer.
        kind: TimerKind,
        /// Arm generation the fire belongs to.
        generation: u64,
    },
    /// Call stack requested to place a pause whose file is missing locally.
    FallbackStack {
        /// Pause generation the fetch was issued for.
        pause_generation: u64,
        /// Location as reported, used when no frame qualifies.
        reported: CurrentLocation,
        /// Fetch outcome.
        result: Result<Vec<StackFrame>>,
    },
    /// Stack and locals requested by the poll timer arrived.
    SnapshotFetched {
        /// Pause generation the fetch was issued for.
        pause_generation: u64,
        /// Fetch outcome.
        result: Result<PauseSnapshot>,
    },
}

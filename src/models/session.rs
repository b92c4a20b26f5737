//! Debug session state model and lifecycle helpers.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::frame::ErrorReport;

/// Lifecycle state of a debug session.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// No session has been attached yet.
    #[default]
    Idle,
    /// Connect loop in progress.
    Connecting,
    /// Connected; the debuggee has not paused yet.
    Attached,
    /// Resumed after a pause.
    Running,
    /// Stopped at a breakpoint, step, or explicit pause.
    Paused,
    /// Session ended, locally or by the debuggee.
    Detached,
}

impl SessionState {
    /// Whether the debuggee is executing script code in this state.
    #[must_use]
    pub fn is_running(self) -> bool {
        matches!(self, Self::Attached | Self::Running)
    }

    /// Whether a wire client is held in this state.
    #[must_use]
    pub fn is_live(self) -> bool {
        matches!(self, Self::Attached | Self::Running | Self::Paused)
    }

    /// Determine whether a lifecycle transition is permitted.
    ///
    /// `Paused -> Paused` is allowed: every not-running status report
    /// refreshes the pause location.
    #[must_use]
    pub fn can_transition_to(self, next: SessionState) -> bool {
        matches!(
            (self, next),
            (Self::Idle | Self::Detached, Self::Connecting)
                | (
                    Self::Connecting,
                    Self::Attached | Self::Idle | Self::Detached
                )
                | (Self::Attached | Self::Running, Self::Paused | Self::Detached)
                | (
                    Self::Paused,
                    Self::Running | Self::Paused | Self::Detached
                )
        )
    }
}

/// Where execution is believed to be stopped.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct CurrentLocation {
    /// Local filesystem path of the script.
    pub file_name: PathBuf,
    /// 1-based line number in the local script.
    pub line_number: u32,
}

/// Identity the debuggee announced when the session attached.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct TargetInfo {
    /// Engine target id; also labels the implicit top-level caller frame.
    pub id: String,
    /// Engine or debugger version string.
    pub version: String,
}

/// UI-facing session properties, republished on every change.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct SessionView {
    /// Current lifecycle state.
    pub state: SessionState,
    /// Identifier of the attached session, if any.
    pub session_id: Option<String>,
    /// Best estimate of the pause location; `None` until the first pause.
    pub location: Option<CurrentLocation>,
    /// Mirrors [`SessionState::is_running`].
    pub running: bool,
    /// Most recent script error; cleared when execution resumes.
    pub highlighted_error: Option<ErrorReport>,
    /// Debuggee identity, once announced.
    pub target: Option<TargetInfo>,
}

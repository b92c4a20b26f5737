//! Pause-time snapshots: call stack frames, locals, and thrown errors.

use serde::{Deserialize, Serialize};

use super::session::CurrentLocation;

/// One entry of the debuggee's call stack, innermost first.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct StackFrame {
    /// Function label as reported by the engine.
    pub function_name: String,
    /// Virtual path of the script, or the engine's target id for native frames.
    pub file_name: String,
    /// 1-based line number; 0 for native frames.
    pub line_number: u32,
}

/// A local variable captured at a pause.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct Variable {
    /// Variable name.
    pub name: String,
    /// Rendered value.
    pub value: String,
    /// Value kind (`number`, `string`, `object`, ...).
    pub kind: String,
}

/// Stack and locals fetched once the debuggee settled in a pause.
///
/// Only meaningful while the session is paused; the controller drops it the
/// moment execution resumes.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct PauseSnapshot {
    /// Call stack, innermost first.
    pub stack: Vec<StackFrame>,
    /// Locals of the innermost frame.
    pub locals: Vec<Variable>,
}

/// An uncaught script error reported by the debuggee.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct ErrorReport {
    /// Error message.
    pub message: String,
    /// Whether the engine will terminate after this error.
    pub fatal: bool,
    /// Resolved location of the throw site.
    pub location: CurrentLocation,
}

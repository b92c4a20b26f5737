//! Breakpoint model in the debuggee's virtual path namespace.

use serde::{Deserialize, Serialize};

/// A breakpoint as the debuggee sees it.
///
/// `file_name` is a virtual path (`~/`, `~sys/`, `~usr/` or bare), never a
/// local filesystem path.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub struct Breakpoint {
    /// Virtual path of the script.
    pub file_name: String,
    /// 1-based line number.
    pub line_number: u32,
}

impl Breakpoint {
    /// Construct a breakpoint at `file_name:line_number`.
    #[must_use]
    pub fn new(file_name: impl Into<String>, line_number: u32) -> Self {
        Self {
            file_name: file_name.into(),
            line_number,
        }
    }

    /// Whether this breakpoint sits at the same location as `other`.
    #[must_use]
    pub fn same_location(&self, other: &Breakpoint) -> bool {
        self.line_number == other.line_number && self.file_name == other.file_name
    }
}

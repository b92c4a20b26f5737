//! User-scoped persistence: settings and breakpoint lists.

pub mod breakpoint_store;
pub mod settings;

pub use breakpoint_store::{breakpoint_key, BreakpointStore};
pub use settings::{MemorySettingsStore, SettingsStore, TomlSettingsStore};

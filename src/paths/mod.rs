//! Virtual path translation.
//!
//! - `resolver`: SphereFS prefixes to local paths and back.
//! - `source_map`: file-level build map consulted by the resolver.
//! - `line_map`: V3 line maps for transpiled scripts.

pub mod line_map;
pub mod resolver;
pub mod source_map;

pub use line_map::LineMapper;
pub use resolver::PathResolver;
pub use source_map::SourceMap;

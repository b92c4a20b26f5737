//! Line translation for transpiled scripts using V3 source maps.
//!
//! Maps are decoded by the `sourcemap` crate and reduced to line granularity:
//! each token with a source position contributes one
//! `(generated line, original line)` pair. Lookups return the first pair in
//! token order, and fall back to the input line when nothing matches.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::DebuggerConfig;
use crate::{AppError, Result};

/// Just enough of the map to reject non-V3 input before decoding.
#[derive(Debug, Deserialize)]
struct MapHeader {
    version: u32,
}

/// One decoded mapping, 0-based on both sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct LineMapping {
    generated: u32,
    original: u32,
}

/// Per-script V3 source maps keyed by the transpiled script's virtual path.
#[derive(Debug, Clone, Default)]
pub struct LineMapper {
    maps: HashMap<String, Vec<LineMapping>>,
}

impl LineMapper {
    /// Create an empty mapper.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every map listed in the config's `[line_maps]` table.
    ///
    /// Unreadable or malformed maps are skipped with a warning.
    #[must_use]
    pub fn from_config(config: &DebuggerConfig) -> Self {
        let mut mapper = Self::new();
        for (file_name, map_path) in &config.line_maps {
            let path = config.project_root.join(map_path);
            if let Err(err) = mapper.add_source_file(file_name, &path) {
                warn!(%file_name, path = %path.display(), %err, "skipping line map");
            }
        }
        mapper
    }

    /// Register the map stored at `path` for `file_name`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Io` if the file cannot be read, or
    /// `AppError::SourceMap` if it is not a V3 map.
    pub fn add_source_file(&mut self, file_name: &str, path: &Path) -> Result<()> {
        let raw = fs::read_to_string(path)?;
        self.add_source(file_name, &raw)
    }

    /// Register a V3 map (JSON text) for the transpiled script `file_name`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::SourceMap` if the JSON is invalid, the version is
    /// not 3, or the map cannot be decoded.
    pub fn add_source(&mut self, file_name: &str, map_json: &str) -> Result<()> {
        let header: MapHeader = serde_json::from_str(map_json)?;
        if header.version != 3 {
            return Err(AppError::SourceMap(format!(
                "unsupported source map version {}",
                header.version
            )));
        }
        let map = sourcemap::SourceMap::from_slice(map_json.as_bytes())?;
        let mappings = line_mappings(&map);
        debug!(file_name, mappings = mappings.len(), "line map registered");
        self.maps.insert(file_name.to_owned(), mappings);
        Ok(())
    }

    /// Whether a map is registered for `file_name`.
    #[must_use]
    pub fn contains(&self, file_name: &str) -> bool {
        self.maps.contains_key(file_name)
    }

    /// Map a 1-based line of the transpiled script to the original source.
    #[must_use]
    pub fn line_in_source(&self, file_name: &str, line: u32) -> u32 {
        let Some(mappings) = self.maps.get(file_name) else {
            return line;
        };
        let Some(wanted) = line.checked_sub(1) else {
            return line;
        };
        mappings
            .iter()
            .find(|m| m.generated == wanted)
            .map_or(line, |m| m.original + 1)
    }

    /// Map a 1-based line of the original source to the transpiled script.
    #[must_use]
    pub fn line_in_target(&self, file_name: &str, line: u32) -> u32 {
        let Some(mappings) = self.maps.get(file_name) else {
            return line;
        };
        let Some(wanted) = line.checked_sub(1) else {
            return line;
        };
        mappings
            .iter()
            .find(|m| m.original == wanted)
            .map_or(line, |m| m.generated + 1)
    }
}

/// Line pairs of every token that points into a source.
fn line_mappings(map: &sourcemap::SourceMap) -> Vec<LineMapping> {
    map.tokens()
        .filter(sourcemap::Token::has_source)
        .map(|token| LineMapping {
            generated: token.get_dst_line(),
            original: token.get_src_line(),
        })
        .collect()
}

//! File-level source map: virtual script path to real relative path.
//!
//! The map is a flat JSON object written by the build step, e.g.
//! `{"scripts/main.js": "build/main.js"}`. Entries keep file order so that
//! reverse lookups pick the first matching entry deterministically.

use std::fs;
use std::path::Path;

use serde_json::Value;
use tracing::{debug, warn};

use crate::{AppError, Result};

/// Ordered, immutable script-to-file translation table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceMap {
    entries: Vec<(String, String)>,
}

impl SourceMap {
    /// Load the map at `path`.
    ///
    /// A missing, unreadable or malformed file yields an empty map; the
    /// session then runs without translation.
    #[must_use]
    pub fn load(path: &Path) -> Self {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) => {
                debug!(path = %path.display(), %err, "no source map, using literal paths");
                return Self::default();
            }
        };

        match Self::from_json_str(&raw) {
            Ok(map) => {
                debug!(path = %path.display(), entries = map.len(), "source map loaded");
                map
            }
            Err(err) => {
                warn!(path = %path.display(), %err, "source map unusable, using literal paths");
                Self::default()
            }
        }
    }

    /// Parse a map from JSON text.
    ///
    /// Entries whose value is not a string are skipped.
    ///
    /// # Errors
    ///
    /// Returns `AppError::SourceMap` if the text is not JSON or not an object.
    pub fn from_json_str(raw: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(raw)?;
        let Value::Object(object) = value else {
            return Err(AppError::SourceMap("expected a JSON object".into()));
        };

        let mut entries = Vec::with_capacity(object.len());
        for (key, value) in object {
            let Some(real) = value.as_str() else {
                warn!(%key, "skipping source map entry with non-string value");
                continue;
            };
            entries.push((normalize(&key), normalize(real)));
        }
        Ok(Self { entries })
    }

    /// Build a map from explicit pairs, preserving order.
    #[must_use]
    pub fn from_entries<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        Self {
            entries: pairs
                .into_iter()
                .map(|(k, v)| (normalize(k.as_ref()), normalize(v.as_ref())))
                .collect(),
        }
    }

    /// Real relative path for a virtual script path, if mapped.
    #[must_use]
    pub fn lookup(&self, virtual_path: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(key, _)| key == virtual_path)
            .map(|(_, real)| real.as_str())
    }

    /// Virtual script path of the first entry whose value is `real_path`.
    ///
    /// With duplicate values only the first entry in file order is reachable.
    #[must_use]
    pub fn reverse_lookup(&self, real_path: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(_, real)| real == real_path)
            .map(|(key, _)| key.as_str())
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in file order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

fn normalize(path: &str) -> String {
    path.replace('\\', "/")
}

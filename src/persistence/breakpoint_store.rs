//! Per-script breakpoint lists persisted in the user settings.
//!
//! Each script's lines are stored under `breakpointsSet:<HASH>` as a
//! comma-separated list, where `<HASH>` is the first four bytes of the
//! SHA-256 digest of the script path in uppercase hex. The key does not
//! carry the path, so only scripts queried or set during this run are known
//! to [`BreakpointStore::all_breakpoints`].

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;

use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::Result;

use super::settings::SettingsStore;

/// Settings key prefix for persisted breakpoint lists.
pub const KEY_PREFIX: &str = "breakpointsSet:";

/// Settings key for `script_path`'s breakpoint list.
#[must_use]
pub fn breakpoint_key(script_path: &str) -> String {
    let digest = Sha256::digest(script_path.as_bytes());
    let mut key = String::with_capacity(KEY_PREFIX.len() + 8);
    key.push_str(KEY_PREFIX);
    for byte in &digest[..4] {
        let _ = write!(key, "{byte:02X}");
    }
    key
}

/// Lazily loaded, cached breakpoint lists over a [`SettingsStore`].
#[derive(Debug)]
pub struct BreakpointStore<S> {
    settings: S,
    cache: BTreeMap<String, BTreeSet<u32>>,
}

impl<S: SettingsStore> BreakpointStore<S> {
    /// Wrap `settings`. Nothing is read until a script is queried.
    #[must_use]
    pub fn new(settings: S) -> Self {
        Self {
            settings,
            cache: BTreeMap::new(),
        }
    }

    /// Breakpoint lines for `script_path`, ascending.
    ///
    /// The first query loads the stored list and caches it; a malformed
    /// stored value yields an empty list.
    pub fn breakpoints(&mut self, script_path: &str) -> Vec<u32> {
        if let Some(lines) = self.cache.get(script_path) {
            return lines.iter().copied().collect();
        }

        let key = breakpoint_key(script_path);
        let lines = match self.settings.get_string(&key) {
            Some(raw) => parse_lines(&raw).unwrap_or_else(|| {
                warn!(script = script_path, %key, "ignoring malformed breakpoint list");
                BTreeSet::new()
            }),
            None => BTreeSet::new(),
        };

        let result = lines.iter().copied().collect();
        self.cache.insert(script_path.to_owned(), lines);
        result
    }

    /// Replace `script_path`'s lines and rewrite every cached list to the
    /// settings store. Duplicates collapse; order is not significant.
    pub fn set_breakpoints(&mut self, script_path: &str, lines: &[u32]) {
        self.cache
            .insert(script_path.to_owned(), lines.iter().copied().collect());

        for (script, lines) in &self.cache {
            let value = lines
                .iter()
                .map(u32::to_string)
                .collect::<Vec<_>>()
                .join(",");
            self.settings.set_value(&breakpoint_key(script), value);
        }
        debug!(script = script_path, count = lines.len(), "breakpoints updated");
    }

    /// Every cached script with its lines, ascending.
    #[must_use]
    pub fn all_breakpoints(&self) -> Vec<(String, Vec<u32>)> {
        self.cache
            .iter()
            .map(|(script, lines)| (script.clone(), lines.iter().copied().collect()))
            .collect()
    }

    /// Flush the settings store.
    ///
    /// # Errors
    ///
    /// Propagates the settings store's write failure.
    pub fn save(&mut self) -> Result<()> {
        self.settings.save()
    }

    /// Underlying settings store.
    #[must_use]
    pub fn settings(&self) -> &S {
        &self.settings
    }
}

/// Parse a stored list. An empty value is malformed, like any other
/// unparsable entry.
fn parse_lines(raw: &str) -> Option<BTreeSet<u32>> {
    raw.split(',')
        .map(|part| part.trim().parse::<u32>().ok())
        .collect()
}

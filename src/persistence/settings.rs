//! User-scoped key/value settings.
//!
//! The store is a flat table of string values. [`TomlSettingsStore`] keeps it
//! in a TOML file next to the project; [`MemorySettingsStore`] keeps it in
//! memory.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::{AppError, Result};

/// Flat string key/value store.
pub trait SettingsStore {
    /// Value stored under `key`, if any.
    fn get_string(&self, key: &str) -> Option<String>;

    /// Store `value` under `key`, replacing any previous value.
    fn set_value(&mut self, key: &str, value: String);

    /// Flush pending writes to the backing medium.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Settings` or `AppError::Io` if the store cannot be
    /// written.
    fn save(&mut self) -> Result<()>;
}

/// In-memory settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemorySettingsStore {
    values: BTreeMap<String, String>,
    saves: usize,
}

impl MemorySettingsStore {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `save` calls so far.
    #[must_use]
    pub fn save_count(&self) -> usize {
        self.saves
    }
}

impl SettingsStore for MemorySettingsStore {
    fn get_string(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set_value(&mut self, key: &str, value: String) {
        self.values.insert(key.to_owned(), value);
    }

    fn save(&mut self) -> Result<()> {
        self.saves += 1;
        Ok(())
    }
}

/// Settings persisted as a flat TOML table of strings.
#[derive(Debug, Clone)]
pub struct TomlSettingsStore {
    path: PathBuf,
    values: BTreeMap<String, String>,
    dirty: bool,
}

impl TomlSettingsStore {
    /// Open the store at `path`. A missing file is an empty store.
    ///
    /// Non-string values are ignored.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Settings` if the file exists but is not valid TOML,
    /// or `AppError::Io` if it cannot be read.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let values = match fs::read_to_string(&path) {
            Ok(raw) => parse_table(&raw)
                .map_err(|err| AppError::Settings(format!("{}: {err}", path.display())))?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no settings file yet");
                BTreeMap::new()
            }
            Err(err) => return Err(err.into()),
        };

        Ok(Self {
            path,
            values,
            dirty: false,
        })
    }

    /// Backing file location.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsStore for TomlSettingsStore {
    fn get_string(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set_value(&mut self, key: &str, value: String) {
        if self.values.get(key) != Some(&value) {
            self.values.insert(key.to_owned(), value);
            self.dirty = true;
        }
    }

    fn save(&mut self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let raw = toml::to_string(&self.values)?;
        fs::write(&self.path, raw)?;
        self.dirty = false;
        debug!(path = %self.path.display(), keys = self.values.len(), "settings saved");
        Ok(())
    }
}

fn parse_table(raw: &str) -> std::result::Result<BTreeMap<String, String>, toml::de::Error> {
    let table: toml::Table = toml::from_str(raw)?;
    let mut values = BTreeMap::new();
    for (key, value) in table {
        match value {
            toml::Value::String(text) => {
                values.insert(key, text);
            }
            other => warn!(%key, kind = other.type_str(), "skipping non-string setting"),
        }
    }
    Ok(values)
}

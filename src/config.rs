//! Debugger configuration parsing and validation.

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::{AppError, Result};

/// Environment variable overriding `connection.host`.
pub const HOST_ENV: &str = "SPHERE_DEBUG_HOST";

/// Environment variable overriding `connection.port`.
pub const PORT_ENV: &str = "SPHERE_DEBUG_PORT";

/// Where and how long to look for the debuggee's listening socket.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct ConnectionConfig {
    /// Host the engine's debug server listens on.
    #[serde(default = "default_host")]
    pub host: String,
    /// TCP port of the engine's debug server.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Total time spent retrying the connection before giving up.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

/// Debounce intervals for the session's two timers.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct TimerConfig {
    /// Delay after resuming before the debuggee window is brought forward.
    #[serde(default = "default_focus_debounce_ms")]
    pub focus_debounce_ms: u64,
    /// Delay after pausing before the stack and locals are fetched.
    #[serde(default = "default_poll_debounce_ms")]
    pub poll_debounce_ms: u64,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            focus_debounce_ms: default_focus_debounce_ms(),
            poll_debounce_ms: default_poll_debounce_ms(),
        }
    }
}

fn default_host() -> String {
    "localhost".into()
}

fn default_port() -> u16 {
    812
}

fn default_timeout_ms() -> u64 {
    5000
}

fn default_focus_debounce_ms() -> u64 {
    250
}

fn default_poll_debounce_ms() -> u64 {
    500
}

fn default_source_map_file() -> PathBuf {
    PathBuf::from("sourcemap.json")
}

fn default_settings_file() -> PathBuf {
    PathBuf::from("sphereStudio.usr.toml")
}

/// Debugger configuration parsed from `debugger.toml`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct DebuggerConfig {
    /// Root of the project being debugged; `~/` paths resolve against it.
    pub project_root: PathBuf,
    /// Path of the engine executable; `~sys/` resolves under its `system/` sibling.
    pub engine_path: PathBuf,
    /// Per-user data directory for `~usr/` paths.
    #[serde(default)]
    pub user_data_dir: Option<PathBuf>,
    /// Debug server endpoint.
    #[serde(default)]
    pub connection: ConnectionConfig,
    /// Debounce intervals.
    #[serde(default)]
    pub timers: TimerConfig,
    /// Source map location, relative to `project_root`.
    #[serde(default = "default_source_map_file")]
    pub source_map_file: PathBuf,
    /// User-scoped settings file, relative to `project_root`.
    #[serde(default = "default_settings_file")]
    pub settings_file: PathBuf,
    /// V3 line maps for transpiled scripts: virtual script path to map file.
    #[serde(default)]
    pub line_maps: BTreeMap<String, PathBuf>,
}

impl DebuggerConfig {
    /// Load and validate configuration from a TOML file path, then apply
    /// `SPHERE_DEBUG_HOST` / `SPHERE_DEBUG_PORT` overrides.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the file cannot be read, contains
    /// invalid TOML, fails validation, or an override is malformed.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|err| AppError::Config(format!("failed to read config: {err}")))?;
        let mut config = Self::from_toml_str(&raw)?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Parse configuration from a TOML string and normalize paths.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if parsing or validation fails.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let mut config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply connection overrides from the environment.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if `SPHERE_DEBUG_PORT` is not a valid port.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(host) = env::var(HOST_ENV) {
            if host.trim().is_empty() {
                warn!(var = HOST_ENV, "ignoring empty host override");
            } else {
                debug!(%host, "host overridden from environment");
                self.connection.host = host;
            }
        }

        if let Ok(port) = env::var(PORT_ENV) {
            self.connection.port = port
                .trim()
                .parse()
                .map_err(|err| AppError::Config(format!("{PORT_ENV} invalid: {err}")))?;
            debug!(port = self.connection.port, "port overridden from environment");
        }

        Ok(())
    }

    /// Directory containing the engine executable.
    #[must_use]
    pub fn engine_dir(&self) -> &Path {
        self.engine_path.parent().unwrap_or_else(|| Path::new(""))
    }

    /// Root of the engine's `~sys/` tree.
    #[must_use]
    pub fn system_dir(&self) -> PathBuf {
        self.engine_dir().join("system")
    }

    /// Root of the `~usr/` tree.
    ///
    /// Falls back to `<documents>/minisphere`, or `<home>/Documents/minisphere`
    /// when the platform reports no documents folder.
    #[must_use]
    pub fn user_data_dir(&self) -> PathBuf {
        if let Some(dir) = &self.user_data_dir {
            return dir.clone();
        }
        dirs::document_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join("Documents")))
            .unwrap_or_default()
            .join("minisphere")
    }

    /// Absolute path of the source map file.
    #[must_use]
    pub fn source_map_path(&self) -> PathBuf {
        self.project_root.join(&self.source_map_file)
    }

    /// Absolute path of the user-scoped settings file.
    #[must_use]
    pub fn settings_path(&self) -> PathBuf {
        self.project_root.join(&self.settings_file)
    }

    /// Connect retry window.
    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connection.timeout_ms)
    }

    /// Focus timer debounce.
    #[must_use]
    pub fn focus_debounce(&self) -> Duration {
        Duration::from_millis(self.timers.focus_debounce_ms)
    }

    /// Poll timer debounce.
    #[must_use]
    pub fn poll_debounce(&self) -> Duration {
        Duration::from_millis(self.timers.poll_debounce_ms)
    }

    fn validate(&mut self) -> Result<()> {
        if self.connection.host.trim().is_empty() {
            return Err(AppError::Config("connection.host must not be empty".into()));
        }

        if self.connection.timeout_ms == 0 {
            return Err(AppError::Config(
                "connection.timeout_ms must be greater than zero".into(),
            ));
        }

        let canonical_root = self
            .project_root
            .canonicalize()
            .map_err(|err| AppError::Config(format!("project_root invalid: {err}")))?;
        self.project_root = canonical_root;

        Ok(())
    }
}

//! Error types shared across the crate.

use std::fmt::{Display, Formatter};

/// Shared crate result type.
pub type Result<T> = std::result::Result<T, AppError>;

/// Error enumeration covering every failure mode of the debugger core.
#[derive(Debug)]
pub enum AppError {
    /// Configuration parsing or validation failure.
    Config(String),
    /// File-system or I/O operation failure.
    Io(String),
    /// Transport-level failure talking to the debuggee (refused, reset).
    ///
    /// The connect loop retries on this variant and nothing else.
    Transport(String),
    /// The debuggee did not accept a connection within the allowed window.
    Timeout(String),
    /// The wire client returned a reply of an unexpected shape.
    Protocol(String),
    /// The debuggee rejected a request.
    Remote(String),
    /// An operation needed an attached session and there was none.
    NotAttached(String),
    /// The session detached while a request was in flight.
    Detached(String),
    /// A source map or line map could not be parsed.
    SourceMap(String),
    /// The user-scoped settings store could not be read or written.
    Settings(String),
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Io(msg) => write!(f, "io: {msg}"),
            Self::Transport(msg) => write!(f, "transport: {msg}"),
            Self::Timeout(msg) => write!(f, "timeout: {msg}"),
            Self::Protocol(msg) => write!(f, "protocol: {msg}"),
            Self::Remote(msg) => write!(f, "remote: {msg}"),
            Self::NotAttached(msg) => write!(f, "not attached: {msg}"),
            Self::Detached(msg) => write!(f, "detached: {msg}"),
            Self::SourceMap(msg) => write!(f, "source map: {msg}"),
            Self::Settings(msg) => write!(f, "settings: {msg}"),
        }
    }
}

impl std::error::Error for AppError {}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(format!("invalid config: {err}"))
    }
}

impl From<toml::ser::Error> for AppError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Settings(format!("cannot serialize settings: {err}"))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::SourceMap(format!("invalid json: {err}"))
    }
}

impl From<sourcemap::Error> for AppError {
    fn from(err: sourcemap::Error) -> Self {
        Self::SourceMap(format!("cannot decode map: {err}"))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

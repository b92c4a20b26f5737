#![forbid(unsafe_code)]

//! Remote debugging session controller for minisphere script engines.

pub mod config;
pub mod errors;
pub mod models;
pub mod paths;
pub mod persistence;
pub mod session;
pub mod wire;

pub use config::DebuggerConfig;
pub use errors::{AppError, Result};
pub use session::controller::DebugSession;

//! Debug wire client contract.
//!
//! The wire client owns the socket, framing, and request correlation of the
//! engine's debug protocol. This crate only depends on the contract below:
//!
//! - [`WireConnector`] opens a connection and hands back a [`WireConnection`]
//!   whose event receiver is live before `connect` returns, so nothing
//!   emitted between connect and subscribe is lost.
//! - [`WireClient`] exposes one method per request kind. Each has a fixed
//!   reply shape; execution-control calls resolve when the engine
//!   acknowledges them, and state changes arrive separately as
//!   [`WireEvent::StatusChanged`].
//! - Implementations must not begin I/O until the returned future is polled.
//!   The controller serializes requests and relies on that to keep them from
//!   pipelining.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::models::breakpoint::Breakpoint;
use crate::models::frame::{StackFrame, Variable};
use crate::Result;

/// Boxed future returned by wire client requests.
pub type WireFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// Execution state carried by a status notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusUpdate {
    /// `false` once the engine has stopped executing script code.
    pub running: bool,
    /// Virtual path of the current script.
    pub file_name: String,
    /// 1-based line in the current script.
    pub line_number: u32,
}

/// Notifications pushed by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireEvent {
    /// The debug handshake completed.
    Attached {
        /// Engine target id.
        target_id: String,
        /// Engine or debugger version.
        version: String,
    },
    /// The engine closed the debug connection.
    Detached,
    /// Execution state changed or the engine reported its position.
    StatusChanged(StatusUpdate),
    /// A script threw an error the engine did not catch.
    ErrorThrown {
        /// Error message.
        message: String,
        /// Whether the engine will terminate.
        fatal: bool,
        /// Virtual path of the throw site.
        file_name: String,
        /// 1-based line of the throw site.
        line_number: u32,
    },
    /// Script called `print()`.
    Print(String),
    /// Script called `alert()`.
    Alert(String),
}

/// Reply to an `eval` request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EvalOutcome {
    /// The expression evaluated to this rendered value.
    Value(String),
    /// The expression threw; carries the rendered error.
    Error(String),
}

impl EvalOutcome {
    /// Rendered text regardless of outcome.
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::Value(text) | Self::Error(text) => text,
        }
    }

    /// Whether the expression threw.
    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

/// Request side of an established debug connection.
pub trait WireClient: Send + Sync {
    /// Current remote breakpoint list, in index order.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Transport`](crate::AppError::Transport) or
    /// [`AppError::Remote`](crate::AppError::Remote) on failure.
    fn list_breakpoints(&self) -> WireFuture<'_, Vec<Breakpoint>>;

    /// Append a breakpoint at `file_name:line_number`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Remote`](crate::AppError::Remote) if the engine
    /// rejects the location.
    fn add_breakpoint<'a>(&'a self, file_name: &'a str, line_number: u32) -> WireFuture<'a, ()>;

    /// Remove the breakpoint at `index` of the remote list.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Remote`](crate::AppError::Remote) if the index is
    /// out of range.
    fn remove_breakpoint(&self, index: usize) -> WireFuture<'_, ()>;

    /// Live call stack, innermost first.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Transport`](crate::AppError::Transport) on failure.
    fn call_stack(&self) -> WireFuture<'_, Vec<StackFrame>>;

    /// Locals of the innermost frame.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Transport`](crate::AppError::Transport) on failure.
    fn locals(&self) -> WireFuture<'_, Vec<Variable>>;

    /// Resume execution.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Transport`](crate::AppError::Transport) on failure.
    fn resume(&self) -> WireFuture<'_, ()>;

    /// Pause at the next opportunity.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Transport`](crate::AppError::Transport) on failure.
    fn pause(&self) -> WireFuture<'_, ()>;

    /// Step into the next call.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Transport`](crate::AppError::Transport) on failure.
    fn step_into(&self) -> WireFuture<'_, ()>;

    /// Step over the next line.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Transport`](crate::AppError::Transport) on failure.
    fn step_over(&self) -> WireFuture<'_, ()>;

    /// Run until the current function returns.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Transport`](crate::AppError::Transport) on failure.
    fn step_out(&self) -> WireFuture<'_, ()>;

    /// Evaluate `expression` in the paused frame.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Transport`](crate::AppError::Transport) on
    /// failure. A throwing expression is an [`EvalOutcome::Error`], not an
    /// `Err`.
    fn eval<'a>(&'a self, expression: &'a str) -> WireFuture<'a, EvalOutcome>;

    /// Close the connection. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Transport`](crate::AppError::Transport) if the
    /// detach request could not be delivered.
    fn disconnect(&self) -> WireFuture<'_, ()>;
}

/// An established connection: the request side plus its event stream.
pub struct WireConnection {
    /// Request side, shared between the controller and its session task.
    pub client: Arc<dyn WireClient>,
    /// Engine notifications, in arrival order.
    pub events: mpsc::Receiver<WireEvent>,
}

impl std::fmt::Debug for WireConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WireConnection").finish_non_exhaustive()
    }
}

/// Factory for fresh wire connections.
pub trait WireConnector: Send + Sync {
    /// Open a new connection to `host:port`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Transport`](crate::AppError::Transport) when the
    /// endpoint is not accepting connections yet; the connect loop retries on
    /// that variant only. Any other error aborts the attach.
    fn connect<'a>(&'a self, host: &'a str, port: u16) -> WireFuture<'a, WireConnection>;
}

//! Public debug session handle.
//!
//! [`DebugSession`] attaches to a debuggee, spawns the session task that owns
//! all session state, and forwards control requests to the wire client.
//! Requests are serialized through a per-session gate and abandoned with
//! `AppError::Detached` if the session ends before the reply arrives.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, warn, Instrument};

use crate::models::breakpoint::Breakpoint;
use crate::models::frame::PauseSnapshot;
use crate::models::session::{SessionState, SessionView};
use crate::paths::{LineMapper, PathResolver};
use crate::persistence::{BreakpointStore, SettingsStore};
use crate::session::actor::{SessionActor, SessionParts};
use crate::session::breakpoints;
use crate::session::connection::connect_with_retry;
use crate::session::SessionEvent;
use crate::wire::{EvalOutcome, WireClient, WireConnector, WireFuture};
use crate::{AppError, DebuggerConfig, Result};

struct ActiveSession {
    session_id: String,
    client: Arc<dyn WireClient>,
    cancel: CancellationToken,
    gate: Arc<Mutex<()>>,
    task: JoinHandle<()>,
}

impl ActiveSession {
    fn is_live(&self) -> bool {
        !self.task.is_finished() && !self.cancel.is_cancelled()
    }
}

/// Borrowed view of the live session used for one request.
struct RequestScope {
    session_id: String,
    client: Arc<dyn WireClient>,
    cancel: CancellationToken,
    gate: Arc<Mutex<()>>,
}

impl RequestScope {
    /// Run one wire request under the session gate, abandoning it on detach.
    async fn run<'s, T>(
        &'s self,
        op: &'static str,
        call: impl FnOnce(&'s dyn WireClient) -> WireFuture<'s, T>,
    ) -> Result<T> {
        let _turn = tokio::select! {
            biased;
            () = self.cancel.cancelled() => return Err(detached(op)),
            turn = self.gate.lock() => turn,
        };

        let reply = call(self.client.as_ref());
        tokio::select! {
            biased;
            () = self.cancel.cancelled() => {
                debug!(op, session_id = %self.session_id, "reply abandoned after detach");
                Err(detached(op))
            }
            result = reply => result,
        }
    }
}

fn detached(op: &str) -> AppError {
    AppError::Detached(format!("{op} abandoned: session detached"))
}

/// Handle to one debugger: attach, detach, breakpoints and execution control.
///
/// Observer notifications go to the [`SessionEvent`] sender given at
/// construction; the latest [`SessionView`] is available through
/// [`view`](Self::view) and [`watch`](Self::watch).
pub struct DebugSession {
    config: DebuggerConfig,
    resolver: Arc<PathResolver>,
    line_mapper: Arc<LineMapper>,
    connector: Arc<dyn WireConnector>,
    observer: mpsc::Sender<SessionEvent>,
    view_tx: Arc<watch::Sender<SessionView>>,
    snapshot_tx: Arc<watch::Sender<Option<PauseSnapshot>>>,
    active: Mutex<Option<ActiveSession>>,
}

impl std::fmt::Debug for DebugSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DebugSession")
            .field("project_root", &self.config.project_root)
            .field("state", &self.view_tx.borrow().state)
            .finish_non_exhaustive()
    }
}

impl DebugSession {
    /// Build a session whose resolver and line maps come from `config`.
    #[must_use]
    pub fn new(
        config: DebuggerConfig,
        connector: Arc<dyn WireConnector>,
        observer: mpsc::Sender<SessionEvent>,
    ) -> Self {
        let resolver = PathResolver::from_config(&config);
        let line_mapper = LineMapper::from_config(&config);
        Self::with_paths(config, resolver, line_mapper, connector, observer)
    }

    /// Build a session with an explicit resolver and line mapper.
    #[must_use]
    pub fn with_paths(
        config: DebuggerConfig,
        resolver: PathResolver,
        line_mapper: LineMapper,
        connector: Arc<dyn WireConnector>,
        observer: mpsc::Sender<SessionEvent>,
    ) -> Self {
        let (view_tx, _) = watch::channel(SessionView::default());
        let (snapshot_tx, _) = watch::channel(None);
        Self {
            config,
            resolver: Arc::new(resolver),
            line_mapper: Arc::new(line_mapper),
            connector,
            observer,
            view_tx: Arc::new(view_tx),
            snapshot_tx: Arc::new(snapshot_tx),
            active: Mutex::new(None),
        }
    }

    /// Path resolver used for locations and breakpoints.
    #[must_use]
    pub fn resolver(&self) -> &PathResolver {
        &self.resolver
    }

    /// Latest published session view.
    #[must_use]
    pub fn view(&self) -> SessionView {
        self.view_tx.borrow().clone()
    }

    /// Subscribe to session view changes.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<SessionView> {
        self.view_tx.subscribe()
    }

    /// Stack and locals of the current pause, or `None` unless paused.
    #[must_use]
    pub fn snapshot(&self) -> Option<PauseSnapshot> {
        if self.view_tx.borrow().state != SessionState::Paused {
            return None;
        }
        self.snapshot_tx.borrow().clone()
    }

    /// Attach to the configured endpoint.
    ///
    /// Returns `false` when no connection could be made; the failure is
    /// logged, never raised.
    pub async fn attach(&self) -> bool {
        let host = self.config.connection.host.clone();
        self.attach_to(&host, self.config.connection.port, self.config.connect_timeout())
            .await
    }

    /// Attach to `host:port`, retrying for up to `timeout`.
    ///
    /// Attaching while a session is live is a no-op that returns `true`.
    pub async fn attach_to(&self, host: &str, port: u16, timeout: Duration) -> bool {
        let mut active = self.active.lock().await;
        if let Some(existing) = active.as_ref() {
            if existing.is_live() {
                warn!(session_id = %existing.session_id, "attach requested while already attached");
                return true;
            }
        }
        if let Some(finished) = active.take() {
            if let Err(err) = finished.task.await {
                warn!(%err, "previous session task ended abnormally");
            }
        }

        let previous = self.view_tx.borrow().state;
        self.view_tx.send_modify(|view| {
            view.state = SessionState::Connecting;
            view.running = false;
        });

        let connection =
            match connect_with_retry(self.connector.as_ref(), host, port, timeout).await {
                Ok(connection) => connection,
                Err(err) => {
                    warn!(host, port, %err, "attach failed");
                    self.view_tx.send_modify(|view| view.state = previous);
                    return false;
                }
            };

        let session_id = uuid::Uuid::new_v4().to_string();
        let cancel = CancellationToken::new();
        let gate = Arc::new(Mutex::new(()));

        self.view_tx.send_replace(SessionView {
            state: SessionState::Attached,
            session_id: Some(session_id.clone()),
            running: true,
            ..SessionView::default()
        });
        self.snapshot_tx.send_replace(None);
        info!(%session_id, host, port, "debug session attached");

        let actor = SessionActor::new(SessionParts {
            session_id: session_id.clone(),
            client: Arc::clone(&connection.client),
            gate: Arc::clone(&gate),
            cancel: cancel.clone(),
            resolver: Arc::clone(&self.resolver),
            line_mapper: Arc::clone(&self.line_mapper),
            observer: self.observer.clone(),
            view_tx: Arc::clone(&self.view_tx),
            snapshot_tx: Arc::clone(&self.snapshot_tx),
            focus_debounce: self.config.focus_debounce(),
            poll_debounce: self.config.poll_debounce(),
        });
        let span = info_span!("debug_session", session_id = %session_id);
        let task = tokio::spawn(actor.run(connection.events).instrument(span));

        *active = Some(ActiveSession {
            session_id,
            client: connection.client,
            cancel,
            gate,
            task,
        });
        true
    }

    /// End the session, if any. Requests still in flight fail with
    /// `AppError::Detached`; the session task disconnects the wire client
    /// on its way out.
    pub async fn detach(&self) {
        let Some(active) = self.active.lock().await.take() else {
            debug!("detach without a session");
            return;
        };

        active.cancel.cancel();
        if let Err(err) = active.task.await {
            warn!(session_id = %active.session_id, %err, "session task ended abnormally");
        }
    }

    /// Add (`enabled`) or remove the breakpoint at `path:line`.
    ///
    /// `path` is a real path or a virtual one; it is unresolved before being
    /// sent, and `line` is mapped into the generated script when a line map
    /// covers it.
    ///
    /// # Errors
    ///
    /// - `AppError::NotAttached` without a live session.
    /// - `AppError::Detached` if the session ends mid-request.
    /// - Wire client failures.
    pub async fn set_breakpoint(&self, path: &Path, line: u32, enabled: bool) -> Result<()> {
        let file_name = self.resolver.unresolve(path);
        let line_number = self.line_mapper.line_in_target(&file_name, line);
        let target = Breakpoint::new(file_name, line_number);

        let scope = self.request_scope().await?;
        scope
            .run("set_breakpoint", |client| {
                Box::pin(breakpoints::reconcile(client, &target, enabled))
            })
            .await?;
        Ok(())
    }

    /// Replay every breakpoint known to `store` into the debuggee.
    ///
    /// Returns the number of breakpoints sent.
    ///
    /// # Errors
    ///
    /// Stops at the first [`set_breakpoint`](Self::set_breakpoint) failure.
    pub async fn restore_breakpoints<S: SettingsStore>(
        &self,
        store: &BreakpointStore<S>,
    ) -> Result<usize> {
        let mut restored = 0;
        for (script, lines) in store.all_breakpoints() {
            for line in lines {
                self.set_breakpoint(Path::new(&script), line, true).await?;
                restored += 1;
            }
        }
        info!(restored, "breakpoints restored");
        Ok(restored)
    }

    /// Resume execution.
    ///
    /// # Errors
    ///
    /// `AppError::NotAttached`, `AppError::Detached`, or wire failures.
    pub async fn resume(&self) -> Result<()> {
        let scope = self.request_scope().await?;
        scope.run("resume", |client| client.resume()).await
    }

    /// Pause at the next opportunity.
    ///
    /// # Errors
    ///
    /// `AppError::NotAttached`, `AppError::Detached`, or wire failures.
    pub async fn pause(&self) -> Result<()> {
        let scope = self.request_scope().await?;
        scope.run("pause", |client| client.pause()).await
    }

    /// Step into the next call.
    ///
    /// # Errors
    ///
    /// `AppError::NotAttached`, `AppError::Detached`, or wire failures.
    pub async fn step_into(&self) -> Result<()> {
        let scope = self.request_scope().await?;
        scope.run("step_into", |client| client.step_into()).await
    }

    /// Step over the next line.
    ///
    /// # Errors
    ///
    /// `AppError::NotAttached`, `AppError::Detached`, or wire failures.
    pub async fn step_over(&self) -> Result<()> {
        let scope = self.request_scope().await?;
        scope.run("step_over", |client| client.step_over()).await
    }

    /// Run until the current function returns.
    ///
    /// # Errors
    ///
    /// `AppError::NotAttached`, `AppError::Detached`, or wire failures.
    pub async fn step_out(&self) -> Result<()> {
        let scope = self.request_scope().await?;
        scope.run("step_out", |client| client.step_out()).await
    }

    /// Evaluate `expression` in the paused frame.
    ///
    /// A throwing expression is returned as [`EvalOutcome::Error`].
    ///
    /// # Errors
    ///
    /// `AppError::NotAttached`, `AppError::Detached`, or wire failures.
    pub async fn evaluate(&self, expression: &str) -> Result<EvalOutcome> {
        let scope = self.request_scope().await?;
        scope.run("eval", |client| client.eval(expression)).await
    }

    async fn request_scope(&self) -> Result<RequestScope> {
        let mut active = self.active.lock().await;
        match active.as_ref() {
            Some(session) if session.is_live() => Ok(RequestScope {
                session_id: session.session_id.clone(),
                client: Arc::clone(&session.client),
                cancel: session.cancel.clone(),
                gate: Arc::clone(&session.gate),
            }),
            Some(_) => {
                // Ended on the engine side; drop our hold on its client.
                if let Some(ended) = active.take() {
                    debug!(session_id = %ended.session_id, "releasing ended session");
                }
                Err(AppError::NotAttached("debug session has ended".into()))
            }
            None => Err(AppError::NotAttached("no live debug session".into())),
        }
    }
}

impl Drop for DebugSession {
    fn drop(&mut self) {
        if let Some(active) = self.active.get_mut() {
            active.cancel.cancel();
        }
    }
}

//! Session task: the single owner of a debug session's mutable state.
//!
//! Wire events arrive on the connection's event receiver; timer fires and
//! fetch replies arrive on the session inbox. One `select!` loop drains
//! both, so state transitions never race. Wire requests the task needs
//! (the pause fallback walk, the poll snapshot) run on spawned tasks so a
//! pending control request never stalls event handling. The loop ends when
//! the session is cancelled (local detach), the engine detaches, or the
//! event stream closes; the wire client is disconnected on every exit.
//!
//! # Status handling
//!
//! | Report        | Before                | After     | Raised    |
//! |---------------|-----------------------|-----------|-----------|
//! | not running   | any live state        | `Paused`  | `Paused`  |
//! | running       | `Paused`              | `Running` | `Resumed` |
//! | running       | `Attached`, `Running` | unchanged | nothing   |

use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, watch, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::models::frame::{ErrorReport, PauseSnapshot, StackFrame};
use crate::models::session::{CurrentLocation, SessionState, SessionView, TargetInfo};
use crate::paths::{LineMapper, PathResolver};
use crate::session::timer::{DebounceTimer, TimerKind};
use crate::session::{OutputKind, SessionEvent, SessionMessage};
use crate::wire::{StatusUpdate, WireClient, WireEvent};
use crate::Result;

/// Capacity of the session inbox (timer fires and fetch replies).
const INBOX_CAPACITY: usize = 16;

/// Everything a session task needs, assembled by the controller on attach.
pub(crate) struct SessionParts {
    pub session_id: String,
    pub client: Arc<dyn WireClient>,
    pub gate: Arc<Mutex<()>>,
    pub cancel: CancellationToken,
    pub resolver: Arc<PathResolver>,
    pub line_mapper: Arc<LineMapper>,
    pub observer: mpsc::Sender<SessionEvent>,
    pub view_tx: Arc<watch::Sender<SessionView>>,
    pub snapshot_tx: Arc<watch::Sender<Option<PauseSnapshot>>>,
    pub focus_debounce: Duration,
    pub poll_debounce: Duration,
}

pub(crate) struct SessionActor {
    session_id: String,
    client: Arc<dyn WireClient>,
    gate: Arc<Mutex<()>>,
    cancel: CancellationToken,
    resolver: Arc<PathResolver>,
    line_mapper: Arc<LineMapper>,
    observer: mpsc::Sender<SessionEvent>,
    view_tx: Arc<watch::Sender<SessionView>>,
    snapshot_tx: Arc<watch::Sender<Option<PauseSnapshot>>>,
    inbox_tx: mpsc::Sender<SessionMessage>,
    inbox_rx: mpsc::Receiver<SessionMessage>,
    focus: DebounceTimer,
    poll: DebounceTimer,
    state: SessionState,
    location: Option<CurrentLocation>,
    highlighted_error: Option<ErrorReport>,
    target: Option<TargetInfo>,
    /// Bumped on every pause entry and every resume; snapshot replies for an
    /// older generation are stale.
    pause_generation: u64,
}

impl SessionActor {
    pub(crate) fn new(parts: SessionParts) -> Self {
        let (inbox_tx, inbox_rx) = mpsc::channel(INBOX_CAPACITY);
        let focus = DebounceTimer::new(
            TimerKind::Focus,
            parts.focus_debounce,
            inbox_tx.clone(),
            parts.cancel.clone(),
        );
        let poll = DebounceTimer::new(
            TimerKind::Poll,
            parts.poll_debounce,
            inbox_tx.clone(),
            parts.cancel.clone(),
        );

        Self {
            session_id: parts.session_id,
            client: parts.client,
            gate: parts.gate,
            cancel: parts.cancel,
            resolver: parts.resolver,
            line_mapper: parts.line_mapper,
            observer: parts.observer,
            view_tx: parts.view_tx,
            snapshot_tx: parts.snapshot_tx,
            inbox_tx,
            inbox_rx,
            focus,
            poll,
            state: SessionState::Attached,
            location: None,
            highlighted_error: None,
            target: None,
            pause_generation: 0,
        }
    }

    /// Drive the session until detach.
    pub(crate) async fn run(mut self, mut events: mpsc::Receiver<WireEvent>) {
        info!(session_id = %self.session_id, "session task started");
        self.publish();
        self.notify(SessionEvent::Attached {
            session_id: self.session_id.clone(),
        })
        .await;

        let reason = loop {
            tokio::select! {
                biased;

                () = self.cancel.cancelled() => break "detach requested",

                event = events.recv() => {
                    let Some(event) = event else {
                        break "event stream closed";
                    };
                    if let ControlFlow::Break(reason) = self.on_wire_event(event).await {
                        break reason;
                    }
                }

                message = self.inbox_rx.recv() => {
                    if let Some(message) = message {
                        self.on_message(message).await;
                    }
                }
            }
        };

        self.shutdown(reason).await;
    }

    async fn on_wire_event(&mut self, event: WireEvent) -> ControlFlow<&'static str> {
        match event {
            WireEvent::Attached { target_id, version } => {
                info!(target_id = %target_id, version = %version, "debuggee identified");
                let target = TargetInfo {
                    id: target_id,
                    version,
                };
                self.target = Some(target.clone());
                self.publish();
                self.notify(SessionEvent::Identified(target)).await;
            }
            WireEvent::Detached => return ControlFlow::Break("debuggee detached"),
            WireEvent::StatusChanged(status) => self.on_status(status).await,
            WireEvent::ErrorThrown {
                message,
                fatal,
                file_name,
                line_number,
            } => {
                let report = ErrorReport {
                    message,
                    fatal,
                    location: self.locate(&file_name, line_number),
                };
                warn!(
                    fatal,
                    file = %file_name,
                    line = line_number,
                    message = %report.message,
                    "debuggee reported script error"
                );
                self.highlighted_error = Some(report.clone());
                self.publish();
                self.notify(SessionEvent::ErrorThrown(report)).await;
            }
            WireEvent::Print(text) => {
                self.notify(SessionEvent::Output {
                    kind: OutputKind::Print,
                    text,
                })
                .await;
            }
            WireEvent::Alert(text) => {
                self.notify(SessionEvent::Output {
                    kind: OutputKind::Alert,
                    text,
                })
                .await;
            }
        }
        ControlFlow::Continue(())
    }

    async fn on_status(&mut self, status: StatusUpdate) {
        let want_pause = !status.running;
        let want_resume = !self.state.is_running() && status.running;

        if want_pause {
            self.focus.cancel();
            self.poll.cancel();
            self.set_state(SessionState::Paused);
            self.pause_generation += 1;
            self.location = None;
            self.snapshot_tx.send_replace(None);

            let reported = self.locate(&status.file_name, status.line_number);
            if reported.file_name.exists() {
                self.enter_pause(reported).await;
            } else {
                debug!(
                    file = %reported.file_name.display(),
                    "reported file missing locally, walking call stack"
                );
                self.spawn_fallback_walk(reported);
            }
        } else if want_resume {
            self.set_state(SessionState::Running);
            self.pause_generation += 1;
            self.focus.arm();
            self.poll.cancel();
            self.highlighted_error = None;
            self.snapshot_tx.send_replace(None);
            debug!("debuggee resumed");
            self.publish();
            self.notify(SessionEvent::Resumed).await;
        } else {
            trace!(state = ?self.state, "running status, no transition");
        }
    }

    /// Settle the current pause at `location` and raise `Paused`.
    async fn enter_pause(&mut self, location: CurrentLocation) {
        debug!(
            file = %location.file_name.display(),
            line = location.line_number,
            "debuggee paused"
        );
        self.location = Some(location.clone());
        self.poll.arm();
        self.publish();
        self.notify(SessionEvent::Paused { location }).await;
    }

    /// Place a pause whose reported file is missing: the innermost frame
    /// that is not the engine's native caller wins, else `reported`.
    async fn on_fallback_stack(
        &mut self,
        reported: CurrentLocation,
        result: Result<Vec<StackFrame>>,
    ) {
        let location = match result {
            Ok(stack) => {
                let fallback = stack
                    .iter()
                    .find(|frame| !self.is_native_caller(frame))
                    .map(|frame| self.locate(&frame.file_name, frame.line_number));
                self.snapshot_tx.send_replace(Some(PauseSnapshot {
                    stack: stack.clone(),
                    locals: Vec::new(),
                }));
                self.notify(SessionEvent::StackUpdated { stack }).await;
                fallback.unwrap_or(reported)
            }
            Err(err) => {
                warn!(%err, "call stack unavailable for pause fallback");
                reported
            }
        };
        self.enter_pause(location).await;
    }

    async fn on_message(&mut self, message: SessionMessage) {
        match message {
            SessionMessage::TimerFired {
                kind: TimerKind::Focus,
                generation,
            } => {
                if self.focus.accept(generation) && self.state.is_running() {
                    trace!("focus debounce elapsed");
                    self.notify(SessionEvent::FocusDebuggee).await;
                }
            }
            SessionMessage::TimerFired {
                kind: TimerKind::Poll,
                generation,
            } => {
                if self.poll.accept(generation) && self.state == SessionState::Paused {
                    self.spawn_snapshot_fetch();
                } else {
                    debug!(generation, "stale poll fire ignored");
                }
            }
            SessionMessage::FallbackStack {
                pause_generation,
                reported,
                result,
            } => {
                if self.is_stale(pause_generation) {
                    debug!(pause_generation, "discarding call stack from an earlier pause");
                    return;
                }
                self.on_fallback_stack(reported, result).await;
            }
            SessionMessage::SnapshotFetched {
                pause_generation,
                result,
            } => {
                if self.is_stale(pause_generation) {
                    debug!(pause_generation, "discarding snapshot from an earlier pause");
                    return;
                }
                match result {
                    Ok(snapshot) => {
                        self.snapshot_tx.send_replace(Some(snapshot.clone()));
                        self.notify(SessionEvent::ViewsUpdated(snapshot)).await;
                    }
                    Err(err) => warn!(%err, "stack/locals fetch failed"),
                }
            }
        }
    }

    fn is_stale(&self, pause_generation: u64) -> bool {
        pause_generation != self.pause_generation || self.state != SessionState::Paused
    }

    /// Fetch the call stack for the fallback walk off the session task.
    fn spawn_fallback_walk(&self, reported: CurrentLocation) {
        let client = Arc::clone(&self.client);
        let gate = Arc::clone(&self.gate);
        let inbox = self.inbox_tx.clone();
        let cancel = self.cancel.clone();
        let pause_generation = self.pause_generation;

        tokio::spawn(async move {
            tokio::select! {
                () = cancel.cancelled() => {}
                result = fetch_stack(client.as_ref(), &gate) => {
                    let _ = inbox
                        .send(SessionMessage::FallbackStack { pause_generation, reported, result })
                        .await;
                }
            }
        });
    }

    /// Fetch stack and locals off the session task; the reply comes back
    /// through the inbox tagged with the current pause generation.
    fn spawn_snapshot_fetch(&self) {
        let client = Arc::clone(&self.client);
        let gate = Arc::clone(&self.gate);
        let inbox = self.inbox_tx.clone();
        let cancel = self.cancel.clone();
        let pause_generation = self.pause_generation;

        tokio::spawn(async move {
            tokio::select! {
                () = cancel.cancelled() => {}
                result = fetch_snapshot(client.as_ref(), &gate) => {
                    let _ = inbox
                        .send(SessionMessage::SnapshotFetched { pause_generation, result })
                        .await;
                }
            }
        });
    }

    async fn shutdown(mut self, reason: &'static str) {
        self.focus.cancel();
        self.poll.cancel();
        self.cancel.cancel();

        self.set_state(SessionState::Detached);
        self.location = None;
        self.highlighted_error = None;
        self.snapshot_tx.send_replace(None);
        self.publish();

        if let Err(err) = self.client.disconnect().await {
            warn!(session_id = %self.session_id, %err, "disconnect failed");
        }

        info!(session_id = %self.session_id, reason, "session ended");
        let detached = SessionEvent::Detached {
            session_id: self.session_id.clone(),
        };
        match self.observer.try_send(detached) {
            Ok(()) | Err(TrySendError::Closed(_)) => {}
            Err(TrySendError::Full(_)) => {
                warn!(session_id = %self.session_id, "observer backlog full, Detached not delivered");
            }
        }
    }

    fn set_state(&mut self, next: SessionState) {
        if !self.state.can_transition_to(next) {
            warn!(from = ?self.state, to = ?next, "unexpected session transition");
        }
        self.state = next;
    }

    fn locate(&self, file_name: &str, line_number: u32) -> CurrentLocation {
        CurrentLocation {
            file_name: self.resolver.resolve(file_name),
            line_number: self.line_mapper.line_in_source(file_name, line_number),
        }
    }

    /// The engine's implicit top-level caller: labeled with the target id,
    /// at line 0.
    fn is_native_caller(&self, frame: &StackFrame) -> bool {
        if frame.line_number != 0 {
            return false;
        }
        match &self.target {
            Some(target) => target.id == frame.file_name,
            None => true,
        }
    }

    fn publish(&self) {
        self.view_tx.send_replace(SessionView {
            state: self.state,
            session_id: Some(self.session_id.clone()),
            location: self.location.clone(),
            running: self.state.is_running(),
            highlighted_error: self.highlighted_error.clone(),
            target: self.target.clone(),
        });
    }

    /// Deliver `event`, giving up once the session is cancelled so a full
    /// observer channel cannot hold up detach.
    async fn notify(&self, event: SessionEvent) {
        tokio::select! {
            biased;
            () = self.cancel.cancelled() => trace!("session cancelled, notification dropped"),
            sent = self.observer.send(event) => {
                if sent.is_err() {
                    trace!("no session observer listening");
                }
            }
        }
    }
}

async fn fetch_stack(client: &dyn WireClient, gate: &Mutex<()>) -> Result<Vec<StackFrame>> {
    let _turn = gate.lock().await;
    client.call_stack().await
}

async fn fetch_snapshot(client: &dyn WireClient, gate: &Mutex<()>) -> Result<PauseSnapshot> {
    let _turn = gate.lock().await;
    let stack = client.call_stack().await?;
    let locals = client.locals().await?;
    Ok(PauseSnapshot { stack, locals })
}

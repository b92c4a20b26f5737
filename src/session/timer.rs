//! Re-armable one-shot debounce timers.
//!
//! Each [`arm`](DebounceTimer::arm) cancels the pending fire (if any) and
//! spawns a fresh sleeper, so fires never stack. A fire is delivered to the
//! session task as [`SessionMessage::TimerFired`] tagged with the arm
//! generation; the session task drops fires whose generation is stale,
//! which covers a sleeper that woke just before being cancelled.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::session::SessionMessage;

/// Which of the session's timers fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    /// Bring the debuggee window forward after resuming.
    Focus,
    /// Fetch stack and locals after pausing.
    Poll,
}

/// One-shot timer whose pending fire is replaced on every arm.
#[derive(Debug)]
pub struct DebounceTimer {
    kind: TimerKind,
    delay: Duration,
    inbox: mpsc::Sender<SessionMessage>,
    session_cancel: CancellationToken,
    generation: u64,
    pending: Option<CancellationToken>,
}

impl DebounceTimer {
    /// Construct an idle timer.
    ///
    /// Sleepers are children of `session_cancel`, so cancelling the session
    /// disarms the timer too.
    #[must_use]
    pub fn new(
        kind: TimerKind,
        delay: Duration,
        inbox: mpsc::Sender<SessionMessage>,
        session_cancel: CancellationToken,
    ) -> Self {
        Self {
            kind,
            delay,
            inbox,
            session_cancel,
            generation: 0,
            pending: None,
        }
    }

    /// Cancel any pending fire and start a new countdown.
    pub fn arm(&mut self) {
        self.cancel();
        self.generation += 1;

        let token = self.session_cancel.child_token();
        let sleeper = token.clone();
        let inbox = self.inbox.clone();
        let kind = self.kind;
        let delay = self.delay;
        let generation = self.generation;

        tokio::spawn(async move {
            tokio::select! {
                () = sleeper.cancelled() => {
                    trace!(?kind, generation, "debounce cancelled");
                }
                () = tokio::time::sleep(delay) => {
                    let _ = inbox.send(SessionMessage::TimerFired { kind, generation }).await;
                }
            }
        });

        self.pending = Some(token);
        debug!(kind = ?self.kind, generation, ?delay, "debounce armed");
    }

    /// Cancel the pending fire, if any.
    pub fn cancel(&mut self) {
        if let Some(token) = self.pending.take() {
            token.cancel();
        }
    }

    /// Whether a fire is pending.
    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.pending.is_some()
    }

    /// Accept a fire for this timer.
    ///
    /// Returns `true` and disarms if `generation` belongs to the pending arm;
    /// returns `false` for stale or cancelled fires.
    pub fn accept(&mut self, generation: u64) -> bool {
        if self.pending.is_some() && generation == self.generation {
            self.pending = None;
            true
        } else {
            false
        }
    }
}

impl Drop for DebounceTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}

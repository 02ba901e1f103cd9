//! Reconnection supervision.
//!
//! Owns the transport lifecycle for one execution id:
//! `disconnected -> connecting -> connected -> (disconnected | terminal)`.
//! On unexpected disconnect while the session is not terminal, the next
//! attempt is scheduled at `min(base * 2^attempt, cap)`; the attempt
//! counter resets on every successful connection. After the attempt budget
//! is exhausted without reaching `connected`, the supervisor parks in
//! `terminal-error` and surfaces a persistent connection error.
//!
//! Cancelling the supervisor's token is the termination path: pending
//! reconnect timers are dropped and the transport handle closes. No
//! reconnect attempt fires after cancellation.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use beacon_core::ids::ExecutionId;
use beacon_core::retry::ReconnectPolicy;
use beacon_transport::{EventTransport, TransportSignal};

/// Observable supervisor state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SupervisorState {
    /// No connection and no attempt in flight.
    Disconnected,
    /// An open attempt is in flight.
    Connecting,
    /// Payloads are flowing.
    Connected,
    /// Stopped deliberately (session terminal or caller disposed).
    Terminal,
    /// Stopped after exhausting the attempt budget.
    TerminalError,
}

/// What the supervisor forwards to the monitor loop.
#[derive(Clone, Debug, PartialEq)]
pub enum SupervisorEvent {
    /// A signal from the active transport connection.
    Signal(TransportSignal),
    /// The attempt budget is exhausted; no further reconnects will fire.
    ConnectionError(String),
}

/// Handle to a running supervisor task.
pub struct ReconnectSupervisor {
    state_rx: watch::Receiver<SupervisorState>,
    cancel: CancellationToken,
    _task: JoinHandle<()>,
}

impl ReconnectSupervisor {
    /// Spawn a supervisor for one execution id.
    ///
    /// Signals and the terminal connection error are delivered through
    /// `events_tx`; the channel closes when the supervisor stops.
    pub fn spawn(
        transport: Arc<dyn EventTransport>,
        execution_id: ExecutionId,
        policy: ReconnectPolicy,
        events_tx: mpsc::Sender<SupervisorEvent>,
    ) -> Self {
        let cancel = CancellationToken::new();
        let (state_tx, state_rx) = watch::channel(SupervisorState::Disconnected);
        let task = tokio::spawn(run(
            transport,
            execution_id,
            policy,
            events_tx,
            state_tx,
            cancel.clone(),
        ));
        Self {
            state_rx,
            cancel,
            _task: task,
        }
    }

    /// Current supervisor state.
    #[must_use]
    pub fn state(&self) -> SupervisorState {
        *self.state_rx.borrow()
    }

    /// Watch channel for state transitions.
    #[must_use]
    pub fn state_watch(&self) -> watch::Receiver<SupervisorState> {
        self.state_rx.clone()
    }

    /// Token that terminates the supervisor when cancelled.
    #[must_use]
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Terminate: cancel pending timers and close the transport.
    pub fn terminate(&self) {
        self.cancel.cancel();
    }
}

impl Drop for ReconnectSupervisor {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[allow(clippy::too_many_lines)]
async fn run(
    transport: Arc<dyn EventTransport>,
    execution_id: ExecutionId,
    policy: ReconnectPolicy,
    events_tx: mpsc::Sender<SupervisorEvent>,
    state_tx: watch::Sender<SupervisorState>,
    cancel: CancellationToken,
) {
    let mut attempts: u32 = 0;

    loop {
        let _ = state_tx.send(SupervisorState::Connecting);

        let opened = tokio::select! {
            () = cancel.cancelled() => {
                let _ = state_tx.send(SupervisorState::Terminal);
                return;
            }
            result = transport.open(&execution_id) => result,
        };

        match opened {
            Ok(mut handle) => {
                loop {
                    tokio::select! {
                        () = cancel.cancelled() => {
                            handle.close();
                            let _ = state_tx.send(SupervisorState::Terminal);
                            return;
                        }
                        signal = handle.recv() => match signal {
                            Some(TransportSignal::Connected) => {
                                attempts = 0;
                                let _ = state_tx.send(SupervisorState::Connected);
                                let _ = events_tx
                                    .send(SupervisorEvent::Signal(TransportSignal::Connected))
                                    .await;
                            }
                            Some(TransportSignal::Disconnected(reason)) => {
                                debug!(%execution_id, %reason, "transport disconnected");
                                let _ = events_tx
                                    .send(SupervisorEvent::Signal(
                                        TransportSignal::Disconnected(reason),
                                    ))
                                    .await;
                                break;
                            }
                            Some(other) => {
                                let _ = events_tx.send(SupervisorEvent::Signal(other)).await;
                            }
                            None => break,
                        }
                    }
                }
            }
            Err(e) => {
                warn!(%execution_id, error = %e, "transport open failed");
            }
        }

        let _ = state_tx.send(SupervisorState::Disconnected);

        if policy.exhausted(attempts) {
            let message = format!(
                "connection lost after {attempts} reconnect attempts"
            );
            warn!(%execution_id, "{message}");
            let _ = state_tx.send(SupervisorState::TerminalError);
            let _ = events_tx
                .send(SupervisorEvent::ConnectionError(message))
                .await;
            return;
        }

        let delay = policy.delay_for_attempt(attempts);
        attempts += 1;
        debug!(
            %execution_id,
            attempt = attempts,
            delay_ms = delay,
            "scheduling reconnect"
        );

        tokio::select! {
            () = cancel.cancelled() => {
                let _ = state_tx.send(SupervisorState::Terminal);
                return;
            }
            () = tokio::time::sleep(Duration::from_millis(delay)) => {}
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

//! The `ExecutionMonitor` facade.
//!
//! One monitor per execution id. A single loop task owns all state
//! mutation: supervisor events arrive on a channel, payloads are
//! normalized, batches flattened, node mutations gated, the reducer
//! applied, and the returned effects dispatched (rate-limited
//! notifications, prompt surfacing, session summary). Callers read
//! snapshots and never mutate returned state.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use parking_lot::RwLock;
use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use beacon_core::errors::{ControlError, PromptError};
use beacon_core::ids::{ExecutionId, NodeId};
use beacon_events::{ExecutionEvent, normalize};
use beacon_settings::MonitorSettings;
use beacon_transport::{ControlAction, ControlChannel, EventTransport, TransportSignal};

use crate::effects::{Effect, NotificationLevel, NotificationSink};
use crate::prompt::{PromptChannel, PromptHandler};
use crate::reconcile;
use crate::state::{ExecutionSession, InteractivePromptRequest, NodeRuntimeState, NodeStates};
use crate::supervisor::{ReconnectSupervisor, SupervisorEvent, SupervisorState};
use crate::throttle::{ThrottleGate, mutation_key};

/// How to attach to an execution.
#[derive(Clone, Debug)]
pub struct ConnectOptions {
    /// Execution to monitor.
    pub execution_id: ExecutionId,
    /// Attach to an execution already in progress instead of expecting a
    /// fresh start signal.
    pub join_in_progress: bool,
    /// Prior node states to preserve when joining; ignored on fresh starts.
    pub initial_nodes: NodeStates,
}

impl ConnectOptions {
    /// Fresh start: state resets and the session awaits its start signal.
    #[must_use]
    pub fn fresh(execution_id: ExecutionId) -> Self {
        Self {
            execution_id,
            join_in_progress: false,
            initial_nodes: NodeStates::new(),
        }
    }

    /// Join an execution already in progress.
    #[must_use]
    pub fn join(execution_id: ExecutionId) -> Self {
        Self {
            execution_id,
            join_in_progress: true,
            initial_nodes: NodeStates::new(),
        }
    }

    /// Preserve prior node states across the join.
    #[must_use]
    pub fn with_initial_nodes(mut self, nodes: NodeStates) -> Self {
        self.initial_nodes = nodes;
        self
    }
}

/// State shared between the loop task and reader accessors.
struct Shared {
    session: RwLock<ExecutionSession>,
    nodes: RwLock<NodeStates>,
    connection_error: RwLock<Option<String>>,
}

/// Client-side runtime monitoring one remote execution.
pub struct ExecutionMonitor {
    shared: Arc<Shared>,
    prompt: Arc<PromptChannel>,
    control: Arc<dyn ControlChannel>,
    supervisor: ReconnectSupervisor,
    events_tx: broadcast::Sender<ExecutionEvent>,
}

impl ExecutionMonitor {
    /// Open the transport for an execution and start reconciling its
    /// event stream.
    pub fn connect(
        transport: Arc<dyn EventTransport>,
        control: Arc<dyn ControlChannel>,
        sink: Arc<dyn NotificationSink>,
        options: ConnectOptions,
        settings: &MonitorSettings,
    ) -> Self {
        let session = if options.join_in_progress {
            ExecutionSession::joined(options.execution_id.clone())
        } else {
            ExecutionSession::new(options.execution_id.clone())
        };
        let nodes = if options.join_in_progress {
            options.initial_nodes
        } else {
            NodeStates::new()
        };

        let shared = Arc::new(Shared {
            session: RwLock::new(session),
            nodes: RwLock::new(nodes),
            connection_error: RwLock::new(None),
        });

        let (events_tx, _) = broadcast::channel(256);
        let (supervisor_tx, supervisor_rx) = mpsc::channel(256);
        let supervisor = ReconnectSupervisor::spawn(
            transport,
            options.execution_id,
            settings.reconnect,
            supervisor_tx,
        );
        let prompt = Arc::new(PromptChannel::new(control.clone()));

        // Throttle gates live inside the loop task: per-session by
        // construction, no cross-session contamination possible.
        let _loop_task = tokio::spawn(run_loop(LoopContext {
            rx: supervisor_rx,
            shared: shared.clone(),
            prompt: prompt.clone(),
            sink,
            events_tx: events_tx.clone(),
            supervisor_cancel: supervisor.cancel_token(),
            node_gate: ThrottleGate::new(Duration::from_millis(settings.node_throttle_ms)),
            notify_gate: ThrottleGate::new(Duration::from_millis(
                settings.notification_throttle_ms,
            )),
        }));

        Self {
            shared,
            prompt,
            control,
            supervisor,
            events_tx,
        }
    }

    /// Snapshot of the session state.
    #[must_use]
    pub fn session(&self) -> ExecutionSession {
        self.shared.session.read().clone()
    }

    /// Snapshot of all node states.
    #[must_use]
    pub fn node_states(&self) -> HashMap<NodeId, NodeRuntimeState> {
        self.shared.nodes.read().clone()
    }

    /// Snapshot of one node's state.
    #[must_use]
    pub fn node_state(&self, node_id: &NodeId) -> Option<NodeRuntimeState> {
        self.shared.nodes.read().get(node_id).cloned()
    }

    /// The persistent connection error, set once the reconnect budget is
    /// exhausted.
    #[must_use]
    pub fn connection_error(&self) -> Option<String> {
        self.shared.connection_error.read().clone()
    }

    /// Current reconnection supervisor state.
    #[must_use]
    pub fn supervisor_state(&self) -> SupervisorState {
        self.supervisor.state()
    }

    /// Subscribe to reconciled events (post-normalization, post-throttle).
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ExecutionEvent> {
        self.events_tx.subscribe()
    }

    /// Register the interactive prompt callback.
    pub fn on_prompt(&self, handler: PromptHandler) {
        self.prompt.on_prompt(handler);
    }

    /// The outstanding prompt, if any.
    #[must_use]
    pub fn outstanding_prompt(&self) -> Option<InteractivePromptRequest> {
        self.prompt.outstanding()
    }

    /// Answer the outstanding prompt for a node.
    pub async fn respond(&self, node_id: &NodeId, response: &str) -> Result<(), PromptError> {
        let execution_id = self.shared.session.read().id.clone();
        self.prompt.respond(&execution_id, node_id, response).await
    }

    /// Send a control action for this execution.
    pub async fn control(
        &self,
        action: ControlAction,
        node_id: Option<&NodeId>,
    ) -> Result<(), ControlError> {
        let execution_id = self.shared.session.read().id.clone();
        self.control.control(&execution_id, action, node_id).await
    }

    /// Stop monitoring: cancel reconnect timers and close the transport.
    ///
    /// Node states are preserved for post-mortem reads.
    pub fn dispose(&self) {
        self.supervisor.terminate();
        self.prompt.clear();
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Event loop
// ─────────────────────────────────────────────────────────────────────────────

struct LoopContext {
    rx: mpsc::Receiver<SupervisorEvent>,
    shared: Arc<Shared>,
    prompt: Arc<PromptChannel>,
    sink: Arc<dyn NotificationSink>,
    events_tx: broadcast::Sender<ExecutionEvent>,
    supervisor_cancel: CancellationToken,
    node_gate: ThrottleGate,
    notify_gate: ThrottleGate,
}

async fn run_loop(mut ctx: LoopContext) {
    while let Some(event) = ctx.rx.recv().await {
        match event {
            SupervisorEvent::Signal(TransportSignal::Payload(value)) => {
                match normalize(&value) {
                    Ok(event) => apply_event(&mut ctx, &event),
                    Err(e) => {
                        // Malformed payload: drop, log, keep consuming.
                        debug!(error = %e, "dropping unnormalizable payload");
                    }
                }
            }
            SupervisorEvent::Signal(TransportSignal::Connected) => {
                debug!("transport connected");
            }
            SupervisorEvent::Signal(TransportSignal::Error(detail)) => {
                warn!(%detail, "transport error");
            }
            SupervisorEvent::Signal(TransportSignal::Disconnected(reason)) => {
                debug!(%reason, "transport disconnected");
            }
            SupervisorEvent::ConnectionError(message) => {
                *ctx.shared.connection_error.write() = Some(message.clone());
                dispatch_effects(
                    &mut ctx,
                    vec![Effect::Notify {
                        key: "connection-error".into(),
                        level: NotificationLevel::Error,
                        message,
                    }],
                );
            }
        }
    }
}

fn apply_event(ctx: &mut LoopContext, event: &ExecutionEvent) {
    let mut flattened = Vec::new();
    reconcile::flatten(event, &mut flattened);

    let now = Utc::now();
    let now_instant = Instant::now();

    for event in flattened {
        if let Some(key) = mutation_key(event) {
            if !ctx.node_gate.allow(key, now_instant) {
                debug!(node_id = key, "mutation throttled");
                continue;
            }
        }

        let effects = {
            let mut session = ctx.shared.session.write();
            let mut nodes = ctx.shared.nodes.write();
            reconcile::apply(&mut session, &mut nodes, event, now)
        };
        let _ = ctx.events_tx.send(event.clone());
        dispatch_effects(ctx, effects);

        if ctx.shared.session.read().is_terminal() {
            // Terminal status cancels reconnection; late buffered events
            // still drain through the reducer's terminal guard.
            ctx.supervisor_cancel.cancel();
        }
    }
}

fn dispatch_effects(ctx: &mut LoopContext, effects: Vec<Effect>) {
    let now = Instant::now();
    for effect in effects {
        match effect {
            Effect::Notify {
                key,
                level,
                message,
            } => {
                if ctx.notify_gate.allow(&key, now) {
                    ctx.sink.notify(&key, level, &message);
                } else {
                    debug!(%key, "notification throttled");
                }
            }
            Effect::PromptReady(request) => ctx.prompt.surface(request),
            Effect::ClearPrompt { node_id: Some(node_id) } => {
                ctx.prompt.clear_for_node(&node_id);
            }
            Effect::ClearPrompt { node_id: None } => ctx.prompt.clear(),
            Effect::SessionSummary { total_tokens } => ctx.sink.session_summary(total_tokens),
        }
    }
}

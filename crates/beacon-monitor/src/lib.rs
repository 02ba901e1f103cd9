//! # beacon-monitor
//!
//! The state machine that keeps a local view of a remote execution
//! consistent with reality.
//!
//! Pipeline: transport signals arrive from the reconnection supervisor,
//! payloads are normalized, batches flattened, per-node mutations gated by
//! the throttle, and surviving events applied by the pure reconciliation
//! reducer — which returns an effect list the monitor loop dispatches
//! (notifications, prompt surfacing, session summaries). All state is
//! written by a single task; callers read snapshots.
//!
//! - [`reconcile`]: the pure `apply(state, event) -> effects` reducer
//! - [`throttle`]: keyed minimum-interval gates with drop semantics
//! - [`supervisor`]: transport lifecycle + exponential backoff
//! - [`prompt`]: single-slot interactive prompt mediation
//! - [`monitor`]: the [`ExecutionMonitor`] facade owning the event loop

#![deny(unsafe_code)]

pub mod effects;
pub mod monitor;
pub mod prompt;
pub mod reconcile;
pub mod state;
pub mod supervisor;
pub mod throttle;

pub use effects::{Effect, NotificationLevel, NotificationSink, TracingSink};
pub use monitor::{ConnectOptions, ExecutionMonitor};
pub use prompt::PromptChannel;
pub use state::{ExecutionSession, InteractivePromptRequest, NodeRuntimeState};
pub use supervisor::{ReconnectSupervisor, SupervisorEvent, SupervisorState};
pub use throttle::ThrottleGate;

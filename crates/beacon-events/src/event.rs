//! The canonical execution event union.
//!
//! [`ExecutionEvent`] is the sole output type of the normalizer and the sole
//! input type of the reconciliation engine. Whatever shape a payload arrived
//! in, downstream code only ever sees these variants.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use beacon_core::ids::{ExecutionId, NodeId};

use crate::status::CompletionStatus;

// ─────────────────────────────────────────────────────────────────────────────
// TokenUsage
// ─────────────────────────────────────────────────────────────────────────────

/// Token usage attached to an execution-completed event.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenUsage {
    /// Input tokens.
    pub input: u64,
    /// Output tokens.
    pub output: u64,
    /// Tokens served from cache, when the engine reports them.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cached: Option<u64>,
}

impl TokenUsage {
    /// Total tokens for the session summary (`input + output + cached`,
    /// missing `cached` counted as 0).
    #[must_use]
    pub fn total(&self) -> u64 {
        self.input + self.output + self.cached.unwrap_or(0)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ExecutionEvent
// ─────────────────────────────────────────────────────────────────────────────

/// Canonical, transport-agnostic representation of a remote state change.
///
/// `Batch` is flattened by the reconciliation engine before application and
/// never itself applied. `Unknown` captures unrecognized `type` tags so
/// protocol additions never crash the pipeline.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ExecutionEvent {
    /// Execution accepted and started by the remote engine.
    #[serde(rename = "execution_started")]
    ExecutionStarted {
        /// Execution this stream describes, when the envelope carries it.
        #[serde(rename = "executionId", skip_serializing_if = "Option::is_none")]
        execution_id: Option<ExecutionId>,
        /// Total node count for progress display.
        #[serde(rename = "totalNodes", skip_serializing_if = "Option::is_none")]
        total_nodes: Option<u32>,
    },

    /// Execution reached a terminal status.
    #[serde(rename = "execution_completed")]
    ExecutionCompleted {
        /// Terminal outcome.
        status: CompletionStatus,
        /// Token usage summary, when reported.
        #[serde(rename = "tokenUsage", skip_serializing_if = "Option::is_none")]
        token_usage: Option<TokenUsage>,
    },

    /// Execution-level error.
    #[serde(rename = "execution_error")]
    ExecutionError {
        /// Error message.
        error: String,
    },

    /// Execution paused by a control command acknowledgement.
    #[serde(rename = "execution_paused")]
    ExecutionPaused,

    /// Execution resumed by a control command acknowledgement.
    #[serde(rename = "execution_resumed")]
    ExecutionResumed,

    /// Node began executing.
    #[serde(rename = "node_started")]
    NodeStarted {
        /// Node that started.
        #[serde(rename = "nodeId")]
        node_id: NodeId,
        /// Node type label, when reported.
        #[serde(rename = "nodeType", skip_serializing_if = "Option::is_none")]
        node_type: Option<String>,
    },

    /// Node finished successfully.
    #[serde(rename = "node_completed")]
    NodeCompleted {
        /// Node that completed.
        #[serde(rename = "nodeId")]
        node_id: NodeId,
        /// Tokens consumed by the node, when reported.
        #[serde(rename = "tokenCount", skip_serializing_if = "Option::is_none")]
        token_count: Option<u64>,
        /// Node output payload, when reported.
        #[serde(skip_serializing_if = "Option::is_none")]
        output: Option<Value>,
    },

    /// Node finished with an error.
    #[serde(rename = "node_failed")]
    NodeFailed {
        /// Node that failed.
        #[serde(rename = "nodeId")]
        node_id: NodeId,
        /// Error message.
        error: String,
    },

    /// Node skipped.
    #[serde(rename = "node_skipped")]
    NodeSkipped {
        /// Node that was skipped.
        #[serde(rename = "nodeId")]
        node_id: NodeId,
        /// Skip reason, when reported.
        #[serde(skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },

    /// Node paused awaiting a resume command.
    #[serde(rename = "node_paused")]
    NodePaused {
        /// Node that paused.
        #[serde(rename = "nodeId")]
        node_id: NodeId,
    },

    /// Node explicitly resumed.
    #[serde(rename = "node_resumed")]
    NodeResumed {
        /// Node that resumed.
        #[serde(rename = "nodeId")]
        node_id: NodeId,
    },

    /// Incremental progress note for a running node.
    #[serde(rename = "node_progress")]
    NodeProgress {
        /// Node reporting progress.
        #[serde(rename = "nodeId")]
        node_id: NodeId,
        /// Progress description.
        progress: String,
    },

    /// Node paused for interactive input.
    #[serde(rename = "interactive_prompt")]
    InteractivePrompt {
        /// Node awaiting input.
        #[serde(rename = "nodeId")]
        node_id: NodeId,
        /// Prompt text to surface.
        prompt: String,
        /// Advisory timeout, passed through to the caller untouched.
        #[serde(rename = "timeoutSeconds", skip_serializing_if = "Option::is_none")]
        timeout_seconds: Option<u32>,
    },

    /// A batch wrapper holding sub-events in engine enumeration order.
    #[serde(rename = "batch")]
    Batch {
        /// Contained events, applied in array order.
        events: Vec<ExecutionEvent>,
    },

    /// An event type this client does not recognize.
    #[serde(rename = "unknown")]
    Unknown {
        /// The raw `type` tag for diagnostics.
        #[serde(rename = "eventType")]
        event_type: String,
    },
}

impl ExecutionEvent {
    /// The canonical type string for this event.
    #[must_use]
    pub fn event_type(&self) -> &str {
        match self {
            Self::ExecutionStarted { .. } => "execution_started",
            Self::ExecutionCompleted { .. } => "execution_completed",
            Self::ExecutionError { .. } => "execution_error",
            Self::ExecutionPaused => "execution_paused",
            Self::ExecutionResumed => "execution_resumed",
            Self::NodeStarted { .. } => "node_started",
            Self::NodeCompleted { .. } => "node_completed",
            Self::NodeFailed { .. } => "node_failed",
            Self::NodeSkipped { .. } => "node_skipped",
            Self::NodePaused { .. } => "node_paused",
            Self::NodeResumed { .. } => "node_resumed",
            Self::NodeProgress { .. } => "node_progress",
            Self::InteractivePrompt { .. } => "interactive_prompt",
            Self::Batch { .. } => "batch",
            Self::Unknown { .. } => "unknown",
        }
    }

    /// The node this event references, for node-scoped variants.
    #[must_use]
    pub fn node_id(&self) -> Option<&NodeId> {
        match self {
            Self::NodeStarted { node_id, .. }
            | Self::NodeCompleted { node_id, .. }
            | Self::NodeFailed { node_id, .. }
            | Self::NodeSkipped { node_id, .. }
            | Self::NodePaused { node_id }
            | Self::NodeResumed { node_id }
            | Self::NodeProgress { node_id, .. }
            | Self::InteractivePrompt { node_id, .. } => Some(node_id),
            _ => None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

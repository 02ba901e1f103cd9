//! Session and node runtime state.
//!
//! These types are exclusively owned by the reconciliation engine; callers
//! only ever see clones through the monitor's read accessors. Mutation
//! flows through [`crate::reconcile::apply`] alone.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use beacon_core::ids::{ExecutionId, NodeId};
use beacon_events::status::{ExecutionStatus, NodeStatus};

// ─────────────────────────────────────────────────────────────────────────────
// ExecutionSession
// ─────────────────────────────────────────────────────────────────────────────

/// One remote execution run being monitored.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionSession {
    /// Engine-assigned execution id.
    pub id: ExecutionId,
    /// Current lifecycle status.
    pub status: ExecutionStatus,
    /// Total node count for progress display.
    pub total_nodes: u32,
    /// Nodes that reached `completed`.
    pub completed_nodes: u32,
    /// When the execution started, null until observed.
    pub started_at: Option<DateTime<Utc>>,
    /// When the execution ended, null while running.
    pub ended_at: Option<DateTime<Utc>>,
    /// Last terminal error message; null unless the execution failed.
    pub error: Option<String>,
    /// Whether the execution is in flight (cleared on any terminal status).
    pub is_running: bool,
    /// Nodes currently executing; cleared on any terminal status.
    pub running_nodes: HashSet<NodeId>,
    /// Token total from the completion summary, when reported.
    pub total_tokens: Option<u64>,
}

impl ExecutionSession {
    /// Fresh session awaiting its execution-start signal.
    #[must_use]
    pub fn new(id: ExecutionId) -> Self {
        Self {
            id,
            status: ExecutionStatus::Idle,
            total_nodes: 0,
            completed_nodes: 0,
            started_at: None,
            ended_at: None,
            error: None,
            is_running: false,
            running_nodes: HashSet::new(),
            total_tokens: None,
        }
    }

    /// Session attached to an execution already in progress.
    #[must_use]
    pub fn joined(id: ExecutionId) -> Self {
        Self {
            status: ExecutionStatus::Running,
            is_running: true,
            ..Self::new(id)
        }
    }

    /// Whether the session reached a terminal status.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// NodeRuntimeState
// ─────────────────────────────────────────────────────────────────────────────

/// Runtime state of one node observed in the stream.
///
/// Created lazily on the first event naming the node; retained after the
/// session completes so a post-mortem view stays renderable.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeRuntimeState {
    /// Current node status.
    pub status: NodeStatus,
    /// When the node started, null until observed.
    pub started_at: Option<DateTime<Utc>>,
    /// When the node finished, null while pending/running.
    pub ended_at: Option<DateTime<Utc>>,
    /// Error message; present only for failed nodes.
    pub error: Option<String>,
    /// Tokens consumed, when reported.
    pub token_count: Option<u64>,
    /// Latest progress note, when reported.
    pub progress_note: Option<String>,
    /// Skip reason; present only for skipped nodes.
    pub skip_reason: Option<String>,
}

/// Node state map keyed by node id.
pub type NodeStates = HashMap<NodeId, NodeRuntimeState>;

// ─────────────────────────────────────────────────────────────────────────────
// InteractivePromptRequest
// ─────────────────────────────────────────────────────────────────────────────

/// A pause-for-input request; at most one outstanding per session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractivePromptRequest {
    /// Execution the prompt belongs to.
    pub execution_id: ExecutionId,
    /// Node awaiting input.
    pub node_id: NodeId,
    /// Prompt text to surface.
    pub prompt_text: String,
    /// Advisory timeout; this engine does not expire prompts itself.
    pub timeout_seconds: Option<u32>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_session_is_idle() {
        let session = ExecutionSession::new(ExecutionId::from("exec-1"));
        assert_eq!(session.status, ExecutionStatus::Idle);
        assert!(!session.is_running);
        assert!(!session.is_terminal());
        assert_eq!(session.completed_nodes, 0);
        assert!(session.started_at.is_none());
        assert!(session.error.is_none());
    }

    #[test]
    fn joined_session_is_running() {
        let session = ExecutionSession::joined(ExecutionId::from("exec-1"));
        assert_eq!(session.status, ExecutionStatus::Running);
        assert!(session.is_running);
    }

    #[test]
    fn node_state_default_is_pending() {
        let node = NodeRuntimeState::default();
        assert_eq!(node.status, NodeStatus::Pending);
        assert!(node.started_at.is_none());
        assert!(node.error.is_none());
    }

    #[test]
    fn session_serde_camel_case() {
        let session = ExecutionSession::new(ExecutionId::from("exec-1"));
        let json = serde_json::to_value(&session).unwrap();
        assert!(json.get("completedNodes").is_some());
        assert!(json.get("isRunning").is_some());
        assert!(json.get("runningNodes").is_some());
    }

    #[test]
    fn prompt_request_serde_roundtrip() {
        let request = InteractivePromptRequest {
            execution_id: ExecutionId::from("exec-1"),
            node_id: NodeId::from("n2"),
            prompt_text: "Continue?".into(),
            timeout_seconds: Some(30),
        };
        let json = serde_json::to_string(&request).unwrap();
        let back: InteractivePromptRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(request, back);
    }
}

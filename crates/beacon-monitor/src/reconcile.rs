//! The reconciliation reducer.
//!
//! `apply` is a pure state transition: given the session, the node map, one
//! canonical event, and an injected clock value, it mutates the state under
//! the machine's rules and returns the side effects for the caller to
//! dispatch. No notification fires and no channel is touched from inside.
//!
//! Rules enforced here:
//! - node statuses are monotonic once terminal; the only backward edge is
//!   `paused -> running` via an explicit resume or start acknowledgement
//! - a second terminal event for the same node is a no-op (dedup keyed by
//!   node id + terminal status), so `completed_nodes` increments exactly
//!   once per node
//! - `Batch` is flattened and applied in array order — the system's only
//!   ordering guarantee
//! - once the session is terminal every later event for it is dropped with
//!   a debug log; `node_states` are preserved for post-mortem display

use chrono::{DateTime, Utc};
use tracing::debug;

use beacon_core::ids::NodeId;
use beacon_events::status::{CompletionStatus, ExecutionStatus, NodeStatus};
use beacon_events::{ExecutionEvent, TokenUsage};

use crate::effects::{Effect, NotificationLevel};
use crate::state::{ExecutionSession, NodeRuntimeState, NodeStates};

/// Apply one canonical event to the session state.
///
/// Returns the side effects to dispatch, in emission order.
pub fn apply(
    session: &mut ExecutionSession,
    nodes: &mut NodeStates,
    event: &ExecutionEvent,
    now: DateTime<Utc>,
) -> Vec<Effect> {
    if session.is_terminal() {
        // Late events for a terminated session: dropped, not an error.
        debug!(
            execution_id = %session.id,
            event_type = event.event_type(),
            "dropping event for terminated session"
        );
        return Vec::new();
    }

    match event {
        ExecutionEvent::Batch { events } => {
            let mut effects = Vec::new();
            for inner in events {
                effects.extend(apply(session, nodes, inner, now));
            }
            effects
        }

        ExecutionEvent::ExecutionStarted {
            execution_id,
            total_nodes,
        } => {
            if let Some(id) = execution_id {
                session.id = id.clone();
            }
            session.status = ExecutionStatus::Running;
            session.is_running = true;
            let _ = session.started_at.get_or_insert(now);
            session.ended_at = None;
            session.error = None;
            if let Some(total) = total_nodes {
                session.total_nodes = *total;
            }
            Vec::new()
        }

        ExecutionEvent::ExecutionCompleted {
            status,
            token_usage,
        } => complete_session(session, *status, *token_usage, now),

        ExecutionEvent::ExecutionError { error } => {
            session.status = ExecutionStatus::Failed;
            session.error = Some(error.clone());
            session.is_running = false;
            session.ended_at = Some(now);
            session.running_nodes.clear();
            vec![
                Effect::Notify {
                    key: "execution-error".into(),
                    level: NotificationLevel::Error,
                    message: format!("Execution failed: {error}"),
                },
                Effect::ClearPrompt { node_id: None },
            ]
        }

        ExecutionEvent::ExecutionPaused => {
            if session.status == ExecutionStatus::Running {
                session.status = ExecutionStatus::Paused;
            }
            Vec::new()
        }

        ExecutionEvent::ExecutionResumed => {
            if session.status == ExecutionStatus::Paused {
                session.status = ExecutionStatus::Running;
            }
            Vec::new()
        }

        ExecutionEvent::NodeStarted { node_id, .. } => {
            // A node starting on an idle session means we joined mid-run.
            if session.status == ExecutionStatus::Idle {
                session.status = ExecutionStatus::Running;
                session.is_running = true;
            }
            let node = nodes.entry(node_id.clone()).or_default();
            if node.status.is_terminal() {
                return drop_regression(session, node_id, "node_started");
            }
            let was_paused = node.status == NodeStatus::Paused;
            node.status = NodeStatus::Running;
            let _ = node.started_at.get_or_insert(now);
            let _ = session.running_nodes.insert(node_id.clone());
            if was_paused {
                // Authoritative prompt clear: the engine resumed the node.
                vec![Effect::ClearPrompt {
                    node_id: Some(node_id.clone()),
                }]
            } else {
                Vec::new()
            }
        }

        ExecutionEvent::NodeCompleted {
            node_id,
            token_count,
            ..
        } => {
            let node = nodes.entry(node_id.clone()).or_default();
            if node.status.is_terminal() {
                return drop_regression(session, node_id, "node_completed");
            }
            let was_paused = node.status == NodeStatus::Paused;
            node.status = NodeStatus::Completed;
            node.ended_at = Some(now);
            if token_count.is_some() {
                node.token_count = *token_count;
            }
            session.completed_nodes += 1;
            let _ = session.running_nodes.remove(node_id);
            if was_paused {
                vec![Effect::ClearPrompt {
                    node_id: Some(node_id.clone()),
                }]
            } else {
                Vec::new()
            }
        }

        ExecutionEvent::NodeFailed { node_id, error } => {
            let node = nodes.entry(node_id.clone()).or_default();
            if node.status.is_terminal() {
                return drop_regression(session, node_id, "node_failed");
            }
            let was_paused = node.status == NodeStatus::Paused;
            node.status = NodeStatus::Failed;
            node.error = Some(error.clone());
            node.ended_at = Some(now);
            let _ = session.running_nodes.remove(node_id);
            let mut effects = vec![Effect::Notify {
                key: format!("node-error-{node_id}"),
                level: NotificationLevel::Error,
                message: format!("Node {node_id} failed: {error}"),
            }];
            if was_paused {
                effects.push(Effect::ClearPrompt {
                    node_id: Some(node_id.clone()),
                });
            }
            effects
        }

        ExecutionEvent::NodeSkipped { node_id, reason } => {
            let node = nodes.entry(node_id.clone()).or_default();
            if node.status.is_terminal() {
                return drop_regression(session, node_id, "node_skipped");
            }
            node.status = NodeStatus::Skipped;
            node.skip_reason.clone_from(reason);
            node.ended_at = Some(now);
            let _ = session.running_nodes.remove(node_id);
            Vec::new()
        }

        ExecutionEvent::NodePaused { node_id } => {
            let node = nodes.entry(node_id.clone()).or_default();
            if node.status.is_terminal() {
                return drop_regression(session, node_id, "node_paused");
            }
            if node.status == NodeStatus::Running {
                node.status = NodeStatus::Paused;
            }
            Vec::new()
        }

        ExecutionEvent::NodeResumed { node_id } => {
            let node = nodes.entry(node_id.clone()).or_default();
            if node.status == NodeStatus::Paused {
                node.status = NodeStatus::Running;
                vec![Effect::ClearPrompt {
                    node_id: Some(node_id.clone()),
                }]
            } else {
                Vec::new()
            }
        }

        ExecutionEvent::NodeProgress { node_id, progress } => {
            let node = nodes.entry(node_id.clone()).or_default();
            if node.status.is_terminal() {
                return drop_regression(session, node_id, "node_progress");
            }
            node.progress_note = Some(progress.clone());
            Vec::new()
        }

        ExecutionEvent::InteractivePrompt {
            node_id,
            prompt,
            timeout_seconds,
        } => {
            let node = nodes.entry(node_id.clone()).or_default();
            if node.status.is_terminal() {
                return drop_regression(session, node_id, "interactive_prompt");
            }
            node.status = NodeStatus::Paused;
            vec![Effect::PromptReady(crate::state::InteractivePromptRequest {
                execution_id: session.id.clone(),
                node_id: node_id.clone(),
                prompt_text: prompt.clone(),
                timeout_seconds: *timeout_seconds,
            })]
        }

        ExecutionEvent::Unknown { event_type } => {
            debug!(%event_type, "ignoring unrecognized event");
            Vec::new()
        }
    }
}

/// Flatten nested batches into application order.
///
/// The monitor loop pre-flattens so the mutation throttle gates each
/// sub-event individually; `apply` flattens internally as well, so both
/// entry points agree.
pub fn flatten<'a>(event: &'a ExecutionEvent, out: &mut Vec<&'a ExecutionEvent>) {
    if let ExecutionEvent::Batch { events } = event {
        for inner in events {
            flatten(inner, out);
        }
    } else {
        out.push(event);
    }
}

/// Terminal session transition shared by completion statuses.
fn complete_session(
    session: &mut ExecutionSession,
    status: CompletionStatus,
    token_usage: Option<TokenUsage>,
    now: DateTime<Utc>,
) -> Vec<Effect> {
    let (session_status, level, message) = match status {
        CompletionStatus::Completed => (
            ExecutionStatus::Completed,
            NotificationLevel::Info,
            "Execution completed".to_string(),
        ),
        CompletionStatus::Failed => (
            ExecutionStatus::Failed,
            NotificationLevel::Error,
            "Execution failed".to_string(),
        ),
        CompletionStatus::Aborted => (
            ExecutionStatus::Aborted,
            NotificationLevel::Warning,
            "Execution aborted".to_string(),
        ),
        CompletionStatus::Timeout => (
            ExecutionStatus::Failed,
            NotificationLevel::Error,
            "Execution timed out".to_string(),
        ),
    };

    session.status = session_status;
    session.is_running = false;
    session.ended_at = Some(now);
    session.running_nodes.clear();
    if session_status == ExecutionStatus::Failed && session.error.is_none() {
        session.error = Some(message.clone());
    }

    let mut effects = vec![Effect::Notify {
        key: "execution-complete".into(),
        level,
        message,
    }];
    if let Some(usage) = token_usage {
        let total_tokens = usage.total();
        session.total_tokens = Some(total_tokens);
        effects.push(Effect::SessionSummary { total_tokens });
    }
    effects.push(Effect::ClearPrompt { node_id: None });
    effects
}

/// Drop a backward transition for an already-terminal node.
fn drop_regression(
    session: &ExecutionSession,
    node_id: &NodeId,
    event_type: &str,
) -> Vec<Effect> {
    debug!(
        execution_id = %session.id,
        %node_id,
        event_type,
        "dropping event for terminal node"
    );
    Vec::new()
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use beacon_core::ids::ExecutionId;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 1, 12, 0, 0).unwrap()
    }

    fn fresh() -> (ExecutionSession, NodeStates) {
        (
            ExecutionSession::new(ExecutionId::from("exec-1")),
            NodeStates::new(),
        )
    }

    fn started(total: u32) -> (ExecutionSession, NodeStates) {
        let (mut session, mut nodes) = fresh();
        let _ = apply(
            &mut session,
            &mut nodes,
            &ExecutionEvent::ExecutionStarted {
                execution_id: None,
                total_nodes: Some(total),
            },
            now(),
        );
        (session, nodes)
    }

    fn node_started(id: &str) -> ExecutionEvent {
        ExecutionEvent::NodeStarted {
            node_id: NodeId::from(id),
            node_type: None,
        }
    }

    fn node_completed(id: &str) -> ExecutionEvent {
        ExecutionEvent::NodeCompleted {
            node_id: NodeId::from(id),
            token_count: None,
            output: None,
        }
    }

    // ── lifecycle ────────────────────────────────────────────────────────

    #[test]
    fn execution_started_marks_running() {
        let (session, _) = started(3);
        assert_eq!(session.status, ExecutionStatus::Running);
        assert!(session.is_running);
        assert_eq!(session.total_nodes, 3);
        assert_eq!(session.started_at, Some(now()));
        assert!(session.ended_at.is_none());
    }

    #[test]
    fn node_start_and_complete() {
        let (mut session, mut nodes) = started(1);
        let _ = apply(&mut session, &mut nodes, &node_started("n1"), now());
        assert_eq!(nodes[&NodeId::from("n1")].status, NodeStatus::Running);
        assert!(session.running_nodes.contains(&NodeId::from("n1")));

        let _ = apply(&mut session, &mut nodes, &node_completed("n1"), now());
        assert_eq!(nodes[&NodeId::from("n1")].status, NodeStatus::Completed);
        assert_eq!(session.completed_nodes, 1);
        assert!(session.running_nodes.is_empty());
    }

    #[test]
    fn node_failure_notifies_but_session_continues() {
        let (mut session, mut nodes) = started(2);
        let _ = apply(&mut session, &mut nodes, &node_started("n1"), now());
        let effects = apply(
            &mut session,
            &mut nodes,
            &ExecutionEvent::NodeFailed {
                node_id: NodeId::from("n1"),
                error: "timeout".into(),
            },
            now(),
        );
        assert_matches!(
            &effects[..],
            [Effect::Notify { key, level: NotificationLevel::Error, .. }]
                if key == "node-error-n1"
        );
        assert_eq!(nodes[&NodeId::from("n1")].error.as_deref(), Some("timeout"));
        // session not terminal — other nodes keep flowing
        assert!(session.is_running);
    }

    // ── idempotence / dedup (the terminal guard doubles as dedup keyed
    //    by node id + terminal status) ─────────────────────────────────────

    #[test]
    fn node_completed_twice_increments_once() {
        let (mut session, mut nodes) = started(1);
        let _ = apply(&mut session, &mut nodes, &node_started("n1"), now());
        let _ = apply(&mut session, &mut nodes, &node_completed("n1"), now());
        let _ = apply(&mut session, &mut nodes, &node_completed("n1"), now());
        assert_eq!(session.completed_nodes, 1);
        assert_eq!(nodes[&NodeId::from("n1")].status, NodeStatus::Completed);
    }

    #[test]
    fn batch_duplicate_completion_counts_once() {
        // Same completion delivered individually AND inside a batch.
        let (mut session, mut nodes) = started(1);
        let _ = apply(&mut session, &mut nodes, &node_completed("n1"), now());
        let _ = apply(
            &mut session,
            &mut nodes,
            &ExecutionEvent::Batch {
                events: vec![node_completed("n1")],
            },
            now(),
        );
        assert_eq!(session.completed_nodes, 1);
    }

    // ── monotonic node status ────────────────────────────────────────────

    #[test]
    fn terminal_node_never_regresses() {
        let (mut session, mut nodes) = started(1);
        let _ = apply(&mut session, &mut nodes, &node_completed("n1"), now());
        let _ = apply(&mut session, &mut nodes, &node_started("n1"), now());
        assert_eq!(nodes[&NodeId::from("n1")].status, NodeStatus::Completed);
        let _ = apply(
            &mut session,
            &mut nodes,
            &ExecutionEvent::NodeProgress {
                node_id: NodeId::from("n1"),
                progress: "late".into(),
            },
            now(),
        );
        assert!(nodes[&NodeId::from("n1")].progress_note.is_none());
    }

    #[test]
    fn paused_to_running_is_the_only_backward_edge() {
        let (mut session, mut nodes) = started(1);
        let _ = apply(&mut session, &mut nodes, &node_started("n1"), now());
        let _ = apply(
            &mut session,
            &mut nodes,
            &ExecutionEvent::NodePaused {
                node_id: NodeId::from("n1"),
            },
            now(),
        );
        assert_eq!(nodes[&NodeId::from("n1")].status, NodeStatus::Paused);
        let effects = apply(
            &mut session,
            &mut nodes,
            &ExecutionEvent::NodeResumed {
                node_id: NodeId::from("n1"),
            },
            now(),
        );
        assert_eq!(nodes[&NodeId::from("n1")].status, NodeStatus::Running);
        assert_matches!(&effects[..], [Effect::ClearPrompt { node_id: Some(_) }]);
    }

    #[test]
    fn resume_of_non_paused_node_is_noop() {
        let (mut session, mut nodes) = started(1);
        let _ = apply(&mut session, &mut nodes, &node_started("n1"), now());
        let effects = apply(
            &mut session,
            &mut nodes,
            &ExecutionEvent::NodeResumed {
                node_id: NodeId::from("n1"),
            },
            now(),
        );
        assert!(effects.is_empty());
        assert_eq!(nodes[&NodeId::from("n1")].status, NodeStatus::Running);
    }

    // ── batch order ──────────────────────────────────────────────────────

    #[test]
    fn batch_equals_sequential_application() {
        let events = [
            node_started("a"),
            node_completed("a"),
            node_started("b"),
        ];

        let (mut batch_session, mut batch_nodes) = started(2);
        let _ = apply(
            &mut batch_session,
            &mut batch_nodes,
            &ExecutionEvent::Batch {
                events: events.to_vec(),
            },
            now(),
        );

        let (mut seq_session, mut seq_nodes) = started(2);
        for event in &events {
            let _ = apply(&mut seq_session, &mut seq_nodes, event, now());
        }

        assert_eq!(batch_session, seq_session);
        assert_eq!(batch_nodes, seq_nodes);
    }

    #[test]
    fn batch_order_is_array_order() {
        // started-then-completed within one batch lands on completed
        let (mut session, mut nodes) = started(1);
        let _ = apply(
            &mut session,
            &mut nodes,
            &ExecutionEvent::Batch {
                events: vec![node_started("n1"), node_completed("n1")],
            },
            now(),
        );
        assert_eq!(nodes[&NodeId::from("n1")].status, NodeStatus::Completed);
        assert_eq!(session.completed_nodes, 1);
    }

    // ── termination ──────────────────────────────────────────────────────

    #[test]
    fn completion_freezes_state() {
        let (mut session, mut nodes) = started(2);
        let _ = apply(&mut session, &mut nodes, &node_started("n1"), now());
        let _ = apply(
            &mut session,
            &mut nodes,
            &ExecutionEvent::ExecutionCompleted {
                status: CompletionStatus::Completed,
                token_usage: None,
            },
            now(),
        );
        assert!(!session.is_running);
        assert!(session.running_nodes.is_empty());
        assert_eq!(session.ended_at, Some(now()));

        // node states preserved for post-mortem display
        let before = nodes.clone();
        let effects = apply(&mut session, &mut nodes, &node_completed("n1"), now());
        assert!(effects.is_empty());
        assert_eq!(nodes, before);
        assert_eq!(session.completed_nodes, 0);
    }

    #[test]
    fn completion_summary_computes_total_tokens() {
        let (mut session, mut nodes) = started(1);
        let effects = apply(
            &mut session,
            &mut nodes,
            &ExecutionEvent::ExecutionCompleted {
                status: CompletionStatus::Completed,
                token_usage: Some(TokenUsage {
                    input: 100,
                    output: 40,
                    cached: Some(10),
                }),
            },
            now(),
        );
        assert!(effects.contains(&Effect::SessionSummary { total_tokens: 150 }));
        assert_eq!(session.total_tokens, Some(150));
    }

    #[test]
    fn completion_summary_missing_cached_counts_zero() {
        let (mut session, mut nodes) = started(1);
        let effects = apply(
            &mut session,
            &mut nodes,
            &ExecutionEvent::ExecutionCompleted {
                status: CompletionStatus::Completed,
                token_usage: Some(TokenUsage {
                    input: 100,
                    output: 40,
                    cached: None,
                }),
            },
            now(),
        );
        assert!(effects.contains(&Effect::SessionSummary { total_tokens: 140 }));
    }

    #[test]
    fn timeout_maps_to_failed_with_error() {
        let (mut session, mut nodes) = started(1);
        let _ = apply(
            &mut session,
            &mut nodes,
            &ExecutionEvent::ExecutionCompleted {
                status: CompletionStatus::Timeout,
                token_usage: None,
            },
            now(),
        );
        assert_eq!(session.status, ExecutionStatus::Failed);
        assert_eq!(session.error.as_deref(), Some("Execution timed out"));
    }

    #[test]
    fn abort_is_terminal_with_warning() {
        let (mut session, mut nodes) = started(1);
        let effects = apply(
            &mut session,
            &mut nodes,
            &ExecutionEvent::ExecutionCompleted {
                status: CompletionStatus::Aborted,
                token_usage: None,
            },
            now(),
        );
        assert_eq!(session.status, ExecutionStatus::Aborted);
        assert!(session.error.is_none());
        assert_matches!(
            &effects[0],
            Effect::Notify { level: NotificationLevel::Warning, .. }
        );
    }

    #[test]
    fn execution_error_is_fatal() {
        let (mut session, mut nodes) = started(1);
        let effects = apply(
            &mut session,
            &mut nodes,
            &ExecutionEvent::ExecutionError {
                error: "engine crashed".into(),
            },
            now(),
        );
        assert_eq!(session.status, ExecutionStatus::Failed);
        assert_eq!(session.error.as_deref(), Some("engine crashed"));
        assert!(!session.is_running);
        assert_matches!(&effects[0], Effect::Notify { key, .. } if key == "execution-error");
    }

    // ── pause / resume at execution level ────────────────────────────────

    #[test]
    fn execution_pause_resume_cycle() {
        let (mut session, mut nodes) = started(1);
        let _ = apply(&mut session, &mut nodes, &ExecutionEvent::ExecutionPaused, now());
        assert_eq!(session.status, ExecutionStatus::Paused);
        let _ = apply(&mut session, &mut nodes, &ExecutionEvent::ExecutionResumed, now());
        assert_eq!(session.status, ExecutionStatus::Running);
    }

    // ── interactive prompts ──────────────────────────────────────────────

    #[test]
    fn prompt_pauses_node_and_surfaces_request() {
        let (mut session, mut nodes) = started(2);
        let _ = apply(&mut session, &mut nodes, &node_started("n2"), now());
        let effects = apply(
            &mut session,
            &mut nodes,
            &ExecutionEvent::InteractivePrompt {
                node_id: NodeId::from("n2"),
                prompt: "Continue?".into(),
                timeout_seconds: Some(30),
            },
            now(),
        );
        assert_eq!(nodes[&NodeId::from("n2")].status, NodeStatus::Paused);
        assert_matches!(
            &effects[..],
            [Effect::PromptReady(request)] if request.prompt_text == "Continue?"
                && request.timeout_seconds == Some(30)
        );
    }

    #[test]
    fn prompt_does_not_block_other_nodes() {
        let (mut session, mut nodes) = started(2);
        let _ = apply(&mut session, &mut nodes, &node_started("n1"), now());
        let _ = apply(&mut session, &mut nodes, &node_started("n2"), now());
        let _ = apply(
            &mut session,
            &mut nodes,
            &ExecutionEvent::InteractivePrompt {
                node_id: NodeId::from("n2"),
                prompt: "Continue?".into(),
                timeout_seconds: None,
            },
            now(),
        );
        // n1 keeps running and can complete
        let _ = apply(&mut session, &mut nodes, &node_completed("n1"), now());
        assert_eq!(nodes[&NodeId::from("n1")].status, NodeStatus::Completed);
        assert_eq!(nodes[&NodeId::from("n2")].status, NodeStatus::Paused);
    }

    #[test]
    fn completion_after_prompt_response_accepted() {
        let (mut session, mut nodes) = started(1);
        let _ = apply(&mut session, &mut nodes, &node_started("n2"), now());
        let _ = apply(
            &mut session,
            &mut nodes,
            &ExecutionEvent::InteractivePrompt {
                node_id: NodeId::from("n2"),
                prompt: "Continue?".into(),
                timeout_seconds: None,
            },
            now(),
        );
        let effects = apply(&mut session, &mut nodes, &node_completed("n2"), now());
        assert_eq!(nodes[&NodeId::from("n2")].status, NodeStatus::Completed);
        // paused -> completed also clears the outstanding prompt
        assert!(effects
            .iter()
            .any(|e| matches!(e, Effect::ClearPrompt { node_id: Some(_) })));
    }

    // ── misc ─────────────────────────────────────────────────────────────

    #[test]
    fn node_started_on_idle_session_joins_run() {
        let (mut session, mut nodes) = fresh();
        let _ = apply(&mut session, &mut nodes, &node_started("n1"), now());
        assert_eq!(session.status, ExecutionStatus::Running);
        assert!(session.is_running);
    }

    #[test]
    fn progress_note_recorded_for_running_node() {
        let (mut session, mut nodes) = started(1);
        let _ = apply(&mut session, &mut nodes, &node_started("n1"), now());
        let _ = apply(
            &mut session,
            &mut nodes,
            &ExecutionEvent::NodeProgress {
                node_id: NodeId::from("n1"),
                progress: "step 2 of 5".into(),
            },
            now(),
        );
        assert_eq!(
            nodes[&NodeId::from("n1")].progress_note.as_deref(),
            Some("step 2 of 5")
        );
    }

    #[test]
    fn skip_records_reason() {
        let (mut session, mut nodes) = started(1);
        let _ = apply(
            &mut session,
            &mut nodes,
            &ExecutionEvent::NodeSkipped {
                node_id: NodeId::from("n1"),
                reason: Some("condition false".into()),
            },
            now(),
        );
        let node = &nodes[&NodeId::from("n1")];
        assert_eq!(node.status, NodeStatus::Skipped);
        assert_eq!(node.skip_reason.as_deref(), Some("condition false"));
        // skipped nodes do not count as completed
        assert_eq!(session.completed_nodes, 0);
    }

    #[test]
    fn unknown_event_is_silent_noop() {
        let (mut session, mut nodes) = started(1);
        let before = session.clone();
        let effects = apply(
            &mut session,
            &mut nodes,
            &ExecutionEvent::Unknown {
                event_type: "FUTURE".into(),
            },
            now(),
        );
        assert!(effects.is_empty());
        assert_eq!(session, before);
        assert!(nodes.is_empty());
    }

    // ── end-to-end ───────────────────────────────────────────────────────

    #[test]
    fn full_run_with_one_failure() {
        let (mut session, mut nodes) = fresh();
        let script = [
            ExecutionEvent::ExecutionStarted {
                execution_id: None,
                total_nodes: Some(3),
            },
            node_started("n1"),
            node_completed("n1"),
            node_started("n2"),
            ExecutionEvent::NodeFailed {
                node_id: NodeId::from("n2"),
                error: "timeout".into(),
            },
            ExecutionEvent::ExecutionCompleted {
                status: CompletionStatus::Failed,
                token_usage: None,
            },
        ];
        for event in &script {
            let _ = apply(&mut session, &mut nodes, event, now());
        }

        assert_eq!(nodes[&NodeId::from("n1")].status, NodeStatus::Completed);
        assert_eq!(nodes[&NodeId::from("n2")].status, NodeStatus::Failed);
        assert_eq!(nodes[&NodeId::from("n2")].error.as_deref(), Some("timeout"));
        assert!(!nodes.contains_key(&NodeId::from("n3")));
        assert_eq!(session.status, ExecutionStatus::Failed);
        assert!(!session.is_running);
        assert_eq!(session.completed_nodes, 1);
    }
}

//! Keyed minimum-interval gates with drop semantics.
//!
//! Two independent throttle domains exist per session: node state mutations
//! (50 ms per node id) and user-facing notifications (2000 ms per logical
//! key). A call arriving inside the window is dropped entirely — not
//! queued, not coalesced. Gates are fields of the session context,
//! constructed fresh per connect, never process-wide singletons, so
//! concurrent or sequential sessions cannot cross-contaminate.
//!
//! Transitions into a terminal node status bypass the mutation gate (see
//! [`mutation_key`]): a dropped progress tick is superseded or harmless,
//! but a dropped final state would leave the node permanently stale.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use beacon_events::ExecutionEvent;

/// A minimum-interval gate keyed by string.
#[derive(Debug)]
pub struct ThrottleGate {
    min_interval: Duration,
    last_accepted: HashMap<String, Instant>,
}

impl ThrottleGate {
    /// Create a gate with the given minimum interval between accepted
    /// calls per key.
    #[must_use]
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_accepted: HashMap::new(),
        }
    }

    /// Whether a call for `key` at `now` is accepted. Accepting records
    /// the timestamp; a denied call records nothing.
    pub fn allow(&mut self, key: &str, now: Instant) -> bool {
        if let Some(&last) = self.last_accepted.get(key) {
            if now.duration_since(last) < self.min_interval {
                return false;
            }
        }
        let _ = self.last_accepted.insert(key.to_string(), now);
        true
    }

    /// Forget all recorded timestamps.
    pub fn reset(&mut self) {
        self.last_accepted.clear();
    }

    /// Number of keys with a recorded acceptance.
    #[must_use]
    pub fn tracked_keys(&self) -> usize {
        self.last_accepted.len()
    }
}

/// Throttle key for a state-mutating node event, if it is subject to the
/// mutation gate.
///
/// Terminal transitions (`node_completed`, `node_failed`, `node_skipped`)
/// and interactive prompts bypass the gate; execution-level events are
/// never throttled.
#[must_use]
pub fn mutation_key(event: &ExecutionEvent) -> Option<&str> {
    match event {
        ExecutionEvent::NodeStarted { node_id, .. }
        | ExecutionEvent::NodeProgress { node_id, .. }
        | ExecutionEvent::NodePaused { node_id }
        | ExecutionEvent::NodeResumed { node_id } => Some(node_id.as_str()),
        _ => None,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use beacon_core::ids::NodeId;

    fn gate_50ms() -> ThrottleGate {
        ThrottleGate::new(Duration::from_millis(50))
    }

    #[test]
    fn first_call_always_accepted() {
        let mut gate = gate_50ms();
        assert!(gate.allow("n1", Instant::now()));
    }

    #[test]
    fn call_inside_window_dropped() {
        let mut gate = gate_50ms();
        let t0 = Instant::now();
        assert!(gate.allow("n1", t0));
        assert!(!gate.allow("n1", t0 + Duration::from_millis(49)));
    }

    #[test]
    fn call_at_window_boundary_accepted() {
        let mut gate = gate_50ms();
        let t0 = Instant::now();
        assert!(gate.allow("n1", t0));
        assert!(gate.allow("n1", t0 + Duration::from_millis(50)));
    }

    #[test]
    fn distinct_keys_do_not_interfere() {
        let mut gate = gate_50ms();
        let t0 = Instant::now();
        assert!(gate.allow("n1", t0));
        assert!(gate.allow("n2", t0));
    }

    #[test]
    fn dropped_call_does_not_extend_window() {
        // The window anchors on the last ACCEPTED call.
        let mut gate = gate_50ms();
        let t0 = Instant::now();
        assert!(gate.allow("n1", t0));
        assert!(!gate.allow("n1", t0 + Duration::from_millis(30)));
        assert!(gate.allow("n1", t0 + Duration::from_millis(55)));
    }

    #[test]
    fn zero_interval_accepts_everything() {
        let mut gate = ThrottleGate::new(Duration::ZERO);
        let t0 = Instant::now();
        assert!(gate.allow("k", t0));
        assert!(gate.allow("k", t0));
    }

    #[test]
    fn reset_forgets_history() {
        let mut gate = gate_50ms();
        let t0 = Instant::now();
        assert!(gate.allow("n1", t0));
        gate.reset();
        assert_eq!(gate.tracked_keys(), 0);
        assert!(gate.allow("n1", t0));
    }

    // ── mutation_key ─────────────────────────────────────────────────────

    #[test]
    fn progress_and_start_are_gated() {
        let start = ExecutionEvent::NodeStarted {
            node_id: NodeId::from("n1"),
            node_type: None,
        };
        let progress = ExecutionEvent::NodeProgress {
            node_id: NodeId::from("n1"),
            progress: "p".into(),
        };
        assert_eq!(mutation_key(&start), Some("n1"));
        assert_eq!(mutation_key(&progress), Some("n1"));
    }

    #[test]
    fn terminal_transitions_bypass_gate() {
        // A dropped final state would never be superseded.
        let completed = ExecutionEvent::NodeCompleted {
            node_id: NodeId::from("n1"),
            token_count: None,
            output: None,
        };
        let failed = ExecutionEvent::NodeFailed {
            node_id: NodeId::from("n1"),
            error: "e".into(),
        };
        let skipped = ExecutionEvent::NodeSkipped {
            node_id: NodeId::from("n1"),
            reason: None,
        };
        assert_eq!(mutation_key(&completed), None);
        assert_eq!(mutation_key(&failed), None);
        assert_eq!(mutation_key(&skipped), None);
    }

    #[test]
    fn prompts_and_execution_events_not_gated() {
        let prompt = ExecutionEvent::InteractivePrompt {
            node_id: NodeId::from("n1"),
            prompt: "?".into(),
            timeout_seconds: None,
        };
        let paused = ExecutionEvent::ExecutionPaused;
        assert_eq!(mutation_key(&prompt), None);
        assert_eq!(mutation_key(&paused), None);
    }
}

//! Execution and node status enums with tolerant wire parsing.
//!
//! Canonical serialization is lower-case. The wire has historically carried
//! both lower-case and `UPPER_SNAKE` status strings, so every enum also has
//! a `from_wire` parser that accepts either casing plus known aliases.

use serde::{Deserialize, Serialize};
use std::fmt;

// ─────────────────────────────────────────────────────────────────────────────
// ExecutionStatus
// ─────────────────────────────────────────────────────────────────────────────

/// Lifecycle status of a monitored execution session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    /// No execution observed yet.
    #[default]
    Idle,
    /// Execution in progress.
    Running,
    /// Execution paused by a control command.
    Paused,
    /// Execution finished successfully.
    Completed,
    /// Execution finished with an error.
    Failed,
    /// Execution aborted by a control command.
    Aborted,
}

impl ExecutionStatus {
    /// Whether no further status change can occur (except a fresh session).
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Aborted)
    }
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Paused => "paused",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Aborted => "aborted",
        };
        f.write_str(s)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// NodeStatus
// ─────────────────────────────────────────────────────────────────────────────

/// Runtime status of one node within an execution.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeStatus {
    /// Not yet started.
    #[default]
    Pending,
    /// Currently executing.
    Running,
    /// Finished successfully.
    Completed,
    /// Skipped by the engine or a control command.
    Skipped,
    /// Finished with an error.
    Failed,
    /// Paused awaiting a resume command.
    Paused,
}

impl NodeStatus {
    /// Whether this status is terminal for the node.
    ///
    /// Once terminal, later events must not regress the node; the only
    /// legal backward edge in the machine is `Paused -> Running` via an
    /// explicit resume.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Skipped | Self::Failed)
    }

    /// Parse a wire status string (either casing).
    #[must_use]
    pub fn from_wire(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "skipped" => Some(Self::Skipped),
            "failed" | "error" => Some(Self::Failed),
            "paused" => Some(Self::Paused),
            _ => None,
        }
    }
}

impl fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Skipped => "skipped",
            Self::Failed => "failed",
            Self::Paused => "paused",
        };
        f.write_str(s)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// CompletionStatus
// ─────────────────────────────────────────────────────────────────────────────

/// Terminal status reported by an execution-completed wire event.
///
/// The wire distinguishes four terminal outcomes. The session enum keeps
/// the data model's six values: `Timeout` maps to session status `failed`
/// with a fixed timeout error message during reconciliation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionStatus {
    /// All nodes finished.
    Completed,
    /// Execution failed.
    Failed,
    /// Execution aborted by a control command.
    Aborted,
    /// Execution hit its time or iteration budget.
    Timeout,
}

impl CompletionStatus {
    /// Parse a wire status string (either casing, including legacy aliases).
    #[must_use]
    pub fn from_wire(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "completed" | "success" => Some(Self::Completed),
            "failed" | "error" => Some(Self::Failed),
            "aborted" | "cancelled" => Some(Self::Aborted),
            "timeout" | "maxiter_reached" | "max_iter" => Some(Self::Timeout),
            _ => None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

//! Side effects returned by the reconciliation reducer.
//!
//! The reducer never fires a notification or touches the prompt channel
//! itself — it returns an [`Effect`] list that the monitor loop dispatches.
//! This keeps the reducer unit-testable without mocking a notification
//! system.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use beacon_core::ids::NodeId;

use crate::state::InteractivePromptRequest;

/// Severity of a user-facing notification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationLevel {
    /// Informational.
    Info,
    /// Something degraded but recoverable.
    Warning,
    /// Something failed.
    Error,
}

/// A side effect produced by applying an event.
#[derive(Clone, Debug, PartialEq)]
pub enum Effect {
    /// Surface a user-facing notification, rate-limited per key.
    Notify {
        /// Logical key for rate limiting (e.g. `execution-complete`,
        /// `node-error-{id}`).
        key: String,
        /// Severity.
        level: NotificationLevel,
        /// Message text.
        message: String,
    },
    /// Surface a new interactive prompt (replacing any outstanding one).
    PromptReady(InteractivePromptRequest),
    /// Clear the outstanding prompt: for one node (authoritative clear on
    /// resume/completion) or unconditionally on session termination.
    ClearPrompt {
        /// Clear only if the outstanding prompt targets this node;
        /// `None` clears unconditionally.
        node_id: Option<NodeId>,
    },
    /// Session token summary from the completion event.
    SessionSummary {
        /// `input + output + cached` (missing cached counted as 0).
        total_tokens: u64,
    },
}

/// Consumer of user-facing notifications.
///
/// The monitor rate-limits calls per key before they reach the sink; the
/// sink itself just renders.
pub trait NotificationSink: Send + Sync {
    /// Deliver a notification.
    fn notify(&self, key: &str, level: NotificationLevel, message: &str);

    /// Deliver the session token summary.
    fn session_summary(&self, _total_tokens: u64) {}
}

/// Default sink that renders notifications through `tracing`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn notify(&self, key: &str, level: NotificationLevel, message: &str) {
        match level {
            NotificationLevel::Info => info!(key, "{message}"),
            NotificationLevel::Warning => warn!(key, "{message}"),
            NotificationLevel::Error => warn!(key, error = true, "{message}"),
        }
    }

    fn session_summary(&self, total_tokens: u64) {
        info!(total_tokens, "execution token summary");
    }
}

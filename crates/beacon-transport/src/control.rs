//! Control command client — the caller-to-engine path.
//!
//! Three operations, mirroring the engine's command surface:
//!
//! - `execute(diagram, options)` starts a run and returns its execution id
//! - `control(execution_id, action, node_id?)` pauses / resumes / skips /
//!   aborts
//! - `respond(execution_id, node_id, response)` answers an interactive
//!   prompt
//!
//! Rejections surface synchronously as [`ControlError`] — a typed failure,
//! never a state mutation.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use beacon_core::errors::ControlError;
use beacon_core::ids::{ExecutionId, NodeId};

// ─────────────────────────────────────────────────────────────────────────────
// Command types
// ─────────────────────────────────────────────────────────────────────────────

/// Control action applied to a running execution.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlAction {
    /// Pause the execution.
    Pause,
    /// Resume a paused execution.
    Resume,
    /// Skip one node (requires a node id).
    SkipNode,
    /// Abort the execution.
    Abort,
}

impl ControlAction {
    /// Wire string for this action.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pause => "pause",
            Self::Resume => "resume",
            Self::SkipNode => "skip_node",
            Self::Abort => "abort",
        }
    }
}

/// Options for starting an execution.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteOptions {
    /// Variables passed to the diagram.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variables: Option<Value>,
    /// Run the engine in debug mode.
    pub debug_mode: bool,
    /// Execution time budget in seconds.
    pub timeout_seconds: u64,
    /// Iteration budget.
    pub max_iterations: u64,
}

impl Default for ExecuteOptions {
    fn default() -> Self {
        Self {
            variables: None,
            debug_mode: false,
            timeout_seconds: 300,
            max_iterations: 1000,
        }
    }
}

/// Engine response envelope shared by all control endpoints.
#[derive(Debug, Deserialize)]
struct CommandResponse {
    #[serde(default)]
    success: bool,
    #[serde(default, alias = "executionId")]
    execution_id: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl CommandResponse {
    fn rejection_message(self) -> String {
        self.error
            .or(self.message)
            .unwrap_or_else(|| "command rejected without detail".into())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ControlChannel trait
// ─────────────────────────────────────────────────────────────────────────────

/// The outbound command seam the monitor depends on.
///
/// [`ControlClient`] is the production implementation; tests substitute
/// in-memory fakes.
#[async_trait]
pub trait ControlChannel: Send + Sync {
    /// Apply a control action to a running execution.
    async fn control(
        &self,
        execution_id: &ExecutionId,
        action: ControlAction,
        node_id: Option<&NodeId>,
    ) -> Result<(), ControlError>;

    /// Answer an interactive prompt.
    async fn respond(
        &self,
        execution_id: &ExecutionId,
        node_id: &NodeId,
        response: &str,
    ) -> Result<(), ControlError>;
}

// ─────────────────────────────────────────────────────────────────────────────
// ControlClient
// ─────────────────────────────────────────────────────────────────────────────

/// HTTP control client.
#[derive(Clone, Debug)]
pub struct ControlClient {
    client: reqwest::Client,
    base_url: String,
}

impl ControlClient {
    /// Create a client rooted at the engine's base URL.
    pub fn new(base_url: impl Into<String>, request_timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .unwrap_or_default();
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    fn url(&self, suffix: &str) -> String {
        format!("{}/{suffix}", self.base_url.trim_end_matches('/'))
    }

    async fn post(&self, url: &str, body: &Value) -> Result<CommandResponse, ControlError> {
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| ControlError::Request {
                reason: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(ControlError::HttpStatus {
                status: response.status().as_u16(),
            });
        }

        response
            .json::<CommandResponse>()
            .await
            .map_err(|e| ControlError::Request {
                reason: format!("invalid response body: {e}"),
            })
    }

    /// Start an execution and return its engine-assigned id.
    pub async fn execute(
        &self,
        diagram: Value,
        options: &ExecuteOptions,
    ) -> Result<ExecutionId, ControlError> {
        let body = json!({
            "diagram": diagram,
            "options": options,
        });
        let response = self.post(&self.url("executions"), &body).await?;
        if !response.success {
            return Err(ControlError::Rejected {
                message: response.rejection_message(),
            });
        }
        response
            .execution_id
            .map(ExecutionId::from_string)
            .ok_or_else(|| ControlError::Rejected {
                message: "engine accepted execution but returned no id".into(),
            })
    }
}

#[async_trait]
impl ControlChannel for ControlClient {
    async fn control(
        &self,
        execution_id: &ExecutionId,
        action: ControlAction,
        node_id: Option<&NodeId>,
    ) -> Result<(), ControlError> {
        let mut body = json!({ "action": action.as_str() });
        if let Some(node_id) = node_id {
            body["node_id"] = json!(node_id.as_str());
        }
        let url = self.url(&format!("executions/{execution_id}/control"));
        let response = self.post(&url, &body).await?;
        if response.success {
            Ok(())
        } else {
            Err(ControlError::Rejected {
                message: response.rejection_message(),
            })
        }
    }

    async fn respond(
        &self,
        execution_id: &ExecutionId,
        node_id: &NodeId,
        response_text: &str,
    ) -> Result<(), ControlError> {
        let body = json!({
            "node_id": node_id.as_str(),
            "response": response_text,
        });
        let url = self.url(&format!("executions/{execution_id}/respond"));
        let response = self.post(&url, &body).await?;
        if response.success {
            Ok(())
        } else {
            Err(ControlError::Rejected {
                message: response.rejection_message(),
            })
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

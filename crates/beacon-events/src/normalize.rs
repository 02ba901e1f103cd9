//! Payload normalization: any known wire shape to one [`ExecutionEvent`].
//!
//! The wire format has evolved: node ids appear under `node_id` or `nodeId`,
//! status strings in lower-case or `UPPER_SNAKE`, event fields either nested
//! under a `data` envelope or flattened beside the `type` tag. Rather than
//! duck-typing each field ad hoc at the call site, normalization runs an
//! ordered chain of shape adapters — each attempts to match one known shape
//! and returns the canonical event or no-match; the first match wins.
//!
//! Failure policy:
//! - unrecognized `type` tags normalize to [`ExecutionEvent::Unknown`]
//! - malformed batch entries are dropped individually (debug-logged)
//!   without discarding the rest of the batch
//! - only structurally unusable payloads (non-object, missing `type`)
//!   produce a [`NormalizeError`]

use serde_json::{Map, Value};
use tracing::debug;

use beacon_core::errors::NormalizeError;
use beacon_core::ids::{ExecutionId, NodeId};

use crate::event::{ExecutionEvent, TokenUsage};
use crate::status::{CompletionStatus, NodeStatus};

/// One step in the shape-adapter chain.
type ShapeAdapter = fn(&str, &Value) -> Option<ExecutionEvent>;

/// Adapters in match order: batch wrappers, then the `data`-enveloped shape,
/// then the legacy flattened shape.
const SHAPE_CHAIN: &[ShapeAdapter] = &[adapt_batch, adapt_enveloped, adapt_flat];

/// Normalize a raw payload into a canonical event.
pub fn normalize(payload: &Value) -> Result<ExecutionEvent, NormalizeError> {
    let Some(object) = payload.as_object() else {
        return Err(NormalizeError::NotAnObject);
    };
    let Some(tag) = object.get("type").and_then(Value::as_str) else {
        return Err(NormalizeError::MissingType);
    };

    let kind = tag.to_ascii_lowercase();
    for adapter in SHAPE_CHAIN {
        if let Some(event) = adapter(&kind, payload) {
            return Ok(event);
        }
    }

    Ok(ExecutionEvent::Unknown {
        event_type: tag.to_string(),
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Shape adapters
// ─────────────────────────────────────────────────────────────────────────────

/// `BATCH_UPDATE` wrapper: `events` under `data` or at the top level.
fn adapt_batch(kind: &str, payload: &Value) -> Option<ExecutionEvent> {
    if kind != "batch_update" && kind != "batch" {
        return None;
    }
    let entries = payload
        .pointer("/data/events")
        .or_else(|| payload.get("events"))
        .and_then(Value::as_array)?;

    let mut events = Vec::with_capacity(entries.len());
    for entry in entries {
        match normalize(entry) {
            Ok(event) => events.push(event),
            Err(err) => {
                debug!(error = %err, "dropping malformed batch entry");
            }
        }
    }
    Some(ExecutionEvent::Batch { events })
}

/// Modern shape: fields nested under a `data` object.
fn adapt_enveloped(kind: &str, payload: &Value) -> Option<ExecutionEvent> {
    let data = payload.get("data")?.as_object()?;
    let execution_id = payload
        .get("execution_id")
        .or_else(|| payload.get("executionId"))
        .and_then(Value::as_str);
    build_event(kind, data, execution_id)
}

/// Legacy shape: fields flattened beside the `type` tag.
fn adapt_flat(kind: &str, payload: &Value) -> Option<ExecutionEvent> {
    let object = payload.as_object()?;
    let execution_id = str_field(object, &["execution_id", "executionId"]);
    build_event(kind, object, execution_id)
}

// ─────────────────────────────────────────────────────────────────────────────
// Canonical event construction
// ─────────────────────────────────────────────────────────────────────────────

#[allow(clippy::too_many_lines)]
fn build_event(
    kind: &str,
    fields: &Map<String, Value>,
    execution_id: Option<&str>,
) -> Option<ExecutionEvent> {
    match kind {
        "execution_started" => Some(ExecutionEvent::ExecutionStarted {
            execution_id: execution_id.map(ExecutionId::from),
            total_nodes: u64_field(fields, &["total_nodes", "totalNodes"])
                .and_then(|n| u32::try_from(n).ok()),
        }),

        "execution_completed" => {
            let status = str_field(fields, &["status"])
                .and_then(CompletionStatus::from_wire)
                .unwrap_or(CompletionStatus::Completed);
            Some(ExecutionEvent::ExecutionCompleted {
                status,
                token_usage: token_usage_field(fields),
            })
        }

        "execution_error" => Some(ExecutionEvent::ExecutionError {
            error: str_field(fields, &["error", "message"])
                .unwrap_or("unknown execution error")
                .to_string(),
        }),

        // Status-change carrier: the status string decides the event kind.
        "execution_status_changed" => {
            let status = str_field(fields, &["status"])?;
            if let Some(completion) = CompletionStatus::from_wire(status) {
                return Some(ExecutionEvent::ExecutionCompleted {
                    status: completion,
                    token_usage: token_usage_field(fields),
                });
            }
            match status.to_ascii_lowercase().as_str() {
                "paused" => Some(ExecutionEvent::ExecutionPaused),
                "running" => Some(ExecutionEvent::ExecutionResumed),
                _ => None,
            }
        }

        "node_started" => Some(ExecutionEvent::NodeStarted {
            node_id: node_id_field(fields)?,
            node_type: str_field(fields, &["node_type", "nodeType"]).map(String::from),
        }),

        "node_completed" => Some(ExecutionEvent::NodeCompleted {
            node_id: node_id_field(fields)?,
            token_count: u64_field(
                fields,
                &["token_count", "tokenCount", "tokens_used", "tokensUsed"],
            ),
            output: fields.get("output").filter(|v| !v.is_null()).cloned(),
        }),

        "node_error" | "node_failed" => Some(ExecutionEvent::NodeFailed {
            node_id: node_id_field(fields)?,
            error: str_field(fields, &["error", "message"])
                .unwrap_or("unknown node error")
                .to_string(),
        }),

        "node_skipped" => Some(ExecutionEvent::NodeSkipped {
            node_id: node_id_field(fields)?,
            reason: str_field(fields, &["reason", "skip_reason", "skipReason"])
                .map(String::from),
        }),

        "node_paused" => Some(ExecutionEvent::NodePaused {
            node_id: node_id_field(fields)?,
        }),

        "node_resumed" => Some(ExecutionEvent::NodeResumed {
            node_id: node_id_field(fields)?,
        }),

        "node_progress" | "node_output" => Some(ExecutionEvent::NodeProgress {
            node_id: node_id_field(fields)?,
            progress: str_field(fields, &["progress", "output", "message"])
                .unwrap_or_default()
                .to_string(),
        }),

        "node_status_changed" => {
            let node_id = node_id_field(fields)?;
            let status = str_field(fields, &["status"]).and_then(NodeStatus::from_wire)?;
            match status {
                NodeStatus::Running => Some(ExecutionEvent::NodeStarted {
                    node_id,
                    node_type: str_field(fields, &["node_type", "nodeType"])
                        .map(String::from),
                }),
                NodeStatus::Completed => Some(ExecutionEvent::NodeCompleted {
                    node_id,
                    token_count: u64_field(
                        fields,
                        &["token_count", "tokenCount", "tokens_used", "tokensUsed"],
                    ),
                    output: fields.get("output").filter(|v| !v.is_null()).cloned(),
                }),
                NodeStatus::Failed => Some(ExecutionEvent::NodeFailed {
                    node_id,
                    error: str_field(fields, &["error", "message"])
                        .unwrap_or("unknown node error")
                        .to_string(),
                }),
                NodeStatus::Skipped => Some(ExecutionEvent::NodeSkipped {
                    node_id,
                    reason: str_field(fields, &["reason", "skip_reason", "skipReason"])
                        .map(String::from),
                }),
                NodeStatus::Paused => Some(ExecutionEvent::NodePaused { node_id }),
                NodeStatus::Pending => None,
            }
        }

        "interactive_prompt" => Some(ExecutionEvent::InteractivePrompt {
            node_id: node_id_field(fields)?,
            prompt: str_field(fields, &["prompt", "message"])
                .unwrap_or_default()
                .to_string(),
            timeout_seconds: u64_field(fields, &["timeout_seconds", "timeoutSeconds"])
                .and_then(|n| u32::try_from(n).ok()),
        }),

        _ => None,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Field accessors (alias-aware)
// ─────────────────────────────────────────────────────────────────────────────

fn str_field<'a>(fields: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a str> {
    keys.iter().find_map(|key| fields.get(*key)?.as_str())
}

fn u64_field(fields: &Map<String, Value>, keys: &[&str]) -> Option<u64> {
    keys.iter().find_map(|key| fields.get(*key)?.as_u64())
}

fn node_id_field(fields: &Map<String, Value>) -> Option<NodeId> {
    str_field(fields, &["node_id", "nodeId"]).map(NodeId::from)
}

fn token_usage_field(fields: &Map<String, Value>) -> Option<TokenUsage> {
    let usage = fields
        .get("token_usage")
        .or_else(|| fields.get("tokenUsage"))?
        .as_object()?;
    Some(TokenUsage {
        input: u64_field(usage, &["input", "inputTokens"]).unwrap_or(0),
        output: u64_field(usage, &["output", "outputTokens"]).unwrap_or(0),
        cached: u64_field(usage, &["cached", "cachedTokens"]),
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

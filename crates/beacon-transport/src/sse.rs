//! Streaming-HTTP transport.
//!
//! Opens a unidirectional stream of newline/event-delimited JSON from the
//! per-execution stream URL. Handles:
//! - Line buffering from chunked responses
//! - Optional `data: ` prefix extraction (plain JSON lines also accepted)
//! - Comment / `[DONE]` marker filtering
//! - Keepalive frame discard (`CONNECTION_ESTABLISHED`, `HEARTBEAT`)
//!
//! Malformed lines are dropped with a debug log and the connection stays
//! open. The adapter never reconnects on its own; the reconnection
//! supervisor owns that policy.

use async_trait::async_trait;
use bytes::BytesMut;
use futures::StreamExt;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use beacon_core::errors::TransportError;
use beacon_core::ids::ExecutionId;
use beacon_events::wire::is_keepalive_frame;

use crate::signal::{EventTransport, TransportHandle, TransportSignal};

/// Unidirectional streaming-HTTP event transport.
#[derive(Clone, Debug)]
pub struct StreamingHttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl StreamingHttpTransport {
    /// Create a transport rooted at the engine's base URL.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Per-execution stream URL.
    #[must_use]
    pub fn stream_url(&self, execution_id: &ExecutionId) -> String {
        format!(
            "{}/executions/{execution_id}/stream",
            self.base_url.trim_end_matches('/')
        )
    }
}

#[async_trait]
impl EventTransport for StreamingHttpTransport {
    async fn open(&self, execution_id: &ExecutionId) -> Result<TransportHandle, TransportError> {
        let url = self.stream_url(execution_id);
        let response = self
            .client
            .get(&url)
            .header("accept", "text/event-stream")
            .send()
            .await
            .map_err(|e| TransportError::ConnectFailed {
                url: url.clone(),
                reason: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(TransportError::HttpStatus {
                status: response.status().as_u16(),
            });
        }

        let (tx, rx) = mpsc::channel(256);
        let cancel = CancellationToken::new();
        let task_cancel = cancel.clone();

        // Headers arrived — the stream is live.
        let _ = tx.try_send(TransportSignal::Connected);

        let _task = tokio::spawn(async move {
            let mut byte_stream = response.bytes_stream();
            let mut buffer = BytesMut::with_capacity(8192);

            let reason = loop {
                tokio::select! {
                    () = task_cancel.cancelled() => return,
                    chunk = byte_stream.next() => match chunk {
                        Some(Ok(chunk)) => {
                            buffer.extend_from_slice(&chunk);
                            drain_lines(&mut buffer, &tx).await;
                        }
                        Some(Err(e)) => {
                            warn!(error = %e, "stream read error");
                            let _ = tx.send(TransportSignal::Error(e.to_string())).await;
                            break format!("read error: {e}");
                        }
                        None => {
                            // Stream ended — flush any trailing line.
                            if !buffer.is_empty() {
                                forward_line(&buffer.split(), &tx).await;
                            }
                            break "stream ended".to_string();
                        }
                    }
                }
            };

            let _ = tx.send(TransportSignal::Disconnected(reason)).await;
        });

        Ok(TransportHandle::new(rx, cancel, None))
    }
}

/// Split complete lines out of the buffer and forward each.
async fn drain_lines(buffer: &mut BytesMut, tx: &mpsc::Sender<TransportSignal>) {
    while let Some(newline_pos) = buffer.iter().position(|&b| b == b'\n') {
        let mut line_bytes = buffer.split_to(newline_pos + 1);
        line_bytes.truncate(line_bytes.len() - 1);
        if line_bytes.last() == Some(&b'\r') {
            line_bytes.truncate(line_bytes.len() - 1);
        }
        forward_line(&line_bytes, tx).await;
    }
}

/// Decode one wire line and forward it unless it is noise.
async fn forward_line(line_bytes: &[u8], tx: &mpsc::Sender<TransportSignal>) {
    let Ok(line) = std::str::from_utf8(line_bytes) else {
        debug!("dropping non-UTF-8 stream line");
        return;
    };
    let Some(data) = extract_payload(line) else {
        return;
    };
    let value: Value = match serde_json::from_str(data) {
        Ok(value) => value,
        Err(e) => {
            // Malformed payload: drop it, keep the connection.
            debug!(error = %e, "dropping unparseable stream payload");
            return;
        }
    };
    if is_keepalive_frame(&value) {
        debug!("discarding keepalive frame");
        return;
    }
    let _ = tx.send(TransportSignal::Payload(value)).await;
}

/// Extract the payload portion of a wire line.
///
/// Accepts both SSE `data: {...}` lines and bare JSON lines. Returns `None`
/// for comments, empty lines, non-data SSE fields, and `[DONE]` markers.
fn extract_payload(line: &str) -> Option<&str> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with(':') {
        return None;
    }
    if let Some(data) = trimmed
        .strip_prefix("data: ")
        .or_else(|| trimmed.strip_prefix("data:"))
    {
        let data = data.trim();
        if data.is_empty() || data == "[DONE]" {
            return None;
        }
        return Some(data);
    }
    // Other SSE fields (event:, id:, retry:) carry no payload.
    if trimmed.starts_with("event:")
        || trimmed.starts_with("id:")
        || trimmed.starts_with("retry:")
    {
        return None;
    }
    Some(trimmed)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

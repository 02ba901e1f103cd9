//! Subscription transport — bidirectional WebSocket channel.
//!
//! Opens a socket to the engine, issues a subscribe operation scoped to the
//! execution id, and emits one payload per received message. The `data`
//! field of a subscription payload may arrive JSON-encoded as a string; it
//! is decoded here so the normalizer only ever sees structured values.
//!
//! The same socket carries outbound control frames via
//! [`TransportHandle::send`].

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use beacon_core::errors::TransportError;
use beacon_core::ids::ExecutionId;
use beacon_events::wire::{decode_data_field, is_keepalive_frame};

use crate::signal::{EventTransport, TransportHandle, TransportSignal};

/// Bidirectional WebSocket subscription transport.
#[derive(Clone, Debug)]
pub struct SubscriptionTransport {
    ws_url: String,
}

impl SubscriptionTransport {
    /// Create a transport for the engine's WebSocket endpoint.
    #[must_use]
    pub fn new(ws_url: impl Into<String>) -> Self {
        Self {
            ws_url: ws_url.into(),
        }
    }
}

#[async_trait]
impl EventTransport for SubscriptionTransport {
    async fn open(&self, execution_id: &ExecutionId) -> Result<TransportHandle, TransportError> {
        let (ws, _) =
            connect_async(&self.ws_url)
                .await
                .map_err(|e| TransportError::ConnectFailed {
                    url: self.ws_url.clone(),
                    reason: e.to_string(),
                })?;
        let (mut ws_tx, mut ws_rx) = ws.split();

        let subscribe = json!({
            "type": "subscribe",
            "execution_id": execution_id.as_str(),
        });
        ws_tx
            .send(Message::Text(subscribe.to_string().into()))
            .await
            .map_err(|e| TransportError::SendFailed {
                reason: e.to_string(),
            })?;

        let (tx, rx) = mpsc::channel(256);
        let (out_tx, mut out_rx) = mpsc::channel::<Value>(32);
        let cancel = CancellationToken::new();
        let task_cancel = cancel.clone();

        let _ = tx.try_send(TransportSignal::Connected);

        let _task = tokio::spawn(async move {
            let reason = loop {
                tokio::select! {
                    () = task_cancel.cancelled() => {
                        let _ = ws_tx.send(Message::Close(None)).await;
                        return;
                    }
                    outbound = out_rx.recv() => {
                        // None means the handle is gone; cancellation follows.
                        let Some(value) = outbound else { continue };
                        if let Err(e) = ws_tx.send(Message::Text(value.to_string().into())).await {
                            warn!(error = %e, "outbound send failed");
                            let _ = tx.send(TransportSignal::Error(e.to_string())).await;
                            break format!("send error: {e}");
                        }
                    }
                    msg = ws_rx.next() => match msg {
                        Some(Ok(Message::Text(text))) => forward_message(&text, &tx).await,
                        Some(Ok(Message::Close(_))) => break "closed by server".to_string(),
                        Some(Ok(_)) => {} // binary/ping/pong frames carry no payloads
                        Some(Err(e)) => {
                            warn!(error = %e, "socket read error");
                            let _ = tx.send(TransportSignal::Error(e.to_string())).await;
                            break format!("read error: {e}");
                        }
                        None => break "socket ended".to_string(),
                    }
                }
            };

            let _ = tx.send(TransportSignal::Disconnected(reason)).await;
        });

        Ok(TransportHandle::new(rx, cancel, Some(out_tx)))
    }
}

/// Decode one socket message and forward it unless it is noise.
async fn forward_message(text: &str, tx: &mpsc::Sender<TransportSignal>) {
    let mut value: Value = match serde_json::from_str(text) {
        Ok(value) => value,
        Err(e) => {
            debug!(error = %e, "dropping unparseable subscription payload");
            return;
        }
    };
    if is_keepalive_frame(&value) {
        debug!("discarding keepalive frame");
        return;
    }
    // `data` may be double-encoded — decode before normalization.
    if let Err(e) = decode_data_field(&mut value) {
        debug!(error = %e, "dropping payload with undecodable data field");
        return;
    }
    let _ = tx.send(TransportSignal::Payload(value)).await;
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

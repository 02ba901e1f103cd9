//! Transport lifecycle signals and the adapter seam.

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use beacon_core::errors::TransportError;
use beacon_core::ids::ExecutionId;

/// One emission from an open transport.
#[derive(Clone, Debug, PartialEq)]
pub enum TransportSignal {
    /// The connection is established and payloads may follow.
    Connected,
    /// A raw wire payload (already JSON-decoded, not yet normalized).
    Payload(Value),
    /// A transport-level error; a `Disconnected` follows.
    Error(String),
    /// The connection ended, with a reason. Final signal for this handle.
    Disconnected(String),
}

/// Handle to one open transport connection.
///
/// Dropping the handle or calling [`TransportHandle::close`] cancels the
/// adapter task and releases the network resource; no signal is delivered
/// after `close` returns.
#[derive(Debug)]
pub struct TransportHandle {
    rx: mpsc::Receiver<TransportSignal>,
    cancel: CancellationToken,
    outbound: Option<mpsc::Sender<Value>>,
}

impl TransportHandle {
    /// Build a handle from its parts. Adapters call this; consumers receive
    /// the handle from [`EventTransport::open`].
    #[must_use]
    pub fn new(
        rx: mpsc::Receiver<TransportSignal>,
        cancel: CancellationToken,
        outbound: Option<mpsc::Sender<Value>>,
    ) -> Self {
        Self {
            rx,
            cancel,
            outbound,
        }
    }

    /// Receive the next signal. Returns `None` once the adapter task has
    /// stopped and the channel is drained.
    pub async fn recv(&mut self) -> Option<TransportSignal> {
        self.rx.recv().await
    }

    /// Send an outbound frame (bidirectional transports only).
    pub async fn send(&self, value: Value) -> Result<(), TransportError> {
        let Some(outbound) = &self.outbound else {
            return Err(TransportError::SendFailed {
                reason: "transport is unidirectional".into(),
            });
        };
        outbound
            .send(value)
            .await
            .map_err(|_| TransportError::Closed)
    }

    /// Whether this transport accepts outbound frames.
    #[must_use]
    pub fn is_bidirectional(&self) -> bool {
        self.outbound.is_some()
    }

    /// Close the connection deterministically.
    ///
    /// Cancels the adapter task and closes the inbound channel; buffered
    /// signals are discarded.
    pub fn close(&mut self) {
        self.cancel.cancel();
        self.rx.close();
    }
}

impl Drop for TransportHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// A wire protocol adapter.
///
/// `open` is the only point where a network resource is acquired.
/// Implementations must not retry internally.
#[async_trait]
pub trait EventTransport: Send + Sync {
    /// Open a connection scoped to one execution id.
    async fn open(&self, execution_id: &ExecutionId) -> Result<TransportHandle, TransportError>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

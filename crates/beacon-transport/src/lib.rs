//! # beacon-transport
//!
//! Wire transports for Beacon.
//!
//! Two conforming [`EventTransport`] implementations deliver raw payloads
//! plus lifecycle signals:
//!
//! - **Streaming-HTTP** ([`sse::StreamingHttpTransport`]): unidirectional
//!   newline/event-delimited JSON over a per-execution URL; discards
//!   protocol keepalives before they reach the normalizer
//! - **Subscription** ([`subscription::SubscriptionTransport`]): a
//!   bidirectional WebSocket channel scoped to one execution id, one
//!   payload per received message
//!
//! Adapters never retry internally — retry policy belongs to the
//! reconnection supervisor in `beacon-monitor`, so policy stays testable
//! independent of transport. The [`control::ControlClient`] carries the
//! caller-to-engine command path (execute / pause / resume / skip / abort /
//! respond).

#![deny(unsafe_code)]

pub mod control;
pub mod signal;
pub mod sse;
pub mod subscription;

pub use control::{ControlAction, ControlChannel, ControlClient, ExecuteOptions};
pub use signal::{EventTransport, TransportHandle, TransportSignal};
pub use sse::StreamingHttpTransport;
pub use subscription::SubscriptionTransport;

//! Error hierarchy for Beacon.
//!
//! Provides a structured error type system built on [`thiserror`]:
//!
//! - [`BeaconError`]: Top-level enum covering all error domains
//! - [`TransportError`]: Connection open/read/send failures
//! - [`NormalizeError`]: Structurally unusable wire payloads
//! - [`ControlError`]: Rejected or failed control commands
//! - [`PromptError`]: Interactive-prompt response failures
//!
//! Transport errors are recoverable (the reconnection supervisor owns the
//! retry policy); normalize errors are recovered locally by dropping the
//! offending payload; control and prompt errors surface synchronously to
//! the caller as typed failures, never as state mutations.

use thiserror::Error;

// ─────────────────────────────────────────────────────────────────────────────
// BeaconError — top-level error enum
// ─────────────────────────────────────────────────────────────────────────────

/// Top-level error type for Beacon.
#[derive(Debug, Error)]
pub enum BeaconError {
    /// Transport-level failure.
    #[error("{0}")]
    Transport(#[from] TransportError),

    /// Wire payload could not be normalized.
    #[error("{0}")]
    Normalize(#[from] NormalizeError),

    /// Control command failure.
    #[error("{0}")]
    Control(#[from] ControlError),

    /// Interactive prompt failure.
    #[error("{0}")]
    Prompt(#[from] PromptError),
}

/// Convenience result alias over [`BeaconError`].
pub type Result<T> = std::result::Result<T, BeaconError>;

// ─────────────────────────────────────────────────────────────────────────────
// TransportError
// ─────────────────────────────────────────────────────────────────────────────

/// Transport-level failure.
///
/// Adapters emit these through their signal stream; they never retry
/// internally — retry policy belongs to the reconnection supervisor.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Opening the connection failed.
    #[error("failed to connect to {url}: {reason}")]
    ConnectFailed {
        /// Endpoint that refused the connection.
        url: String,
        /// Underlying failure description.
        reason: String,
    },

    /// The remote endpoint answered with a non-success HTTP status.
    #[error("stream request rejected with HTTP {status}")]
    HttpStatus {
        /// HTTP status code.
        status: u16,
    },

    /// Sending an outbound frame failed.
    #[error("failed to send on transport: {reason}")]
    SendFailed {
        /// Underlying failure description.
        reason: String,
    },

    /// The transport handle was already closed.
    #[error("transport closed")]
    Closed,
}

// ─────────────────────────────────────────────────────────────────────────────
// NormalizeError
// ─────────────────────────────────────────────────────────────────────────────

/// A wire payload too malformed to inspect.
///
/// Only structural problems are errors; an unrecognized event `type` is
/// normalized to the `Unknown` variant instead so protocol additions never
/// crash the pipeline.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum NormalizeError {
    /// Payload was not a JSON object.
    #[error("payload is not a JSON object")]
    NotAnObject,

    /// Payload carried no `type` tag.
    #[error("payload has no event type tag")]
    MissingType,
}

// ─────────────────────────────────────────────────────────────────────────────
// ControlError
// ─────────────────────────────────────────────────────────────────────────────

/// Control command failure (execute / pause / resume / skip / abort / respond).
#[derive(Debug, Error)]
pub enum ControlError {
    /// The request could not be delivered.
    #[error("control request failed: {reason}")]
    Request {
        /// Underlying failure description.
        reason: String,
    },

    /// The engine answered with a non-success HTTP status.
    #[error("control endpoint answered HTTP {status}")]
    HttpStatus {
        /// HTTP status code.
        status: u16,
    },

    /// The engine accepted the request but rejected the command.
    #[error("control command rejected: {message}")]
    Rejected {
        /// Engine-provided rejection message.
        message: String,
    },
}

// ─────────────────────────────────────────────────────────────────────────────
// PromptError
// ─────────────────────────────────────────────────────────────────────────────

/// Interactive prompt response failure.
#[derive(Debug, Error)]
pub enum PromptError {
    /// No outstanding prompt matches the given execution/node pair.
    #[error("no active prompt for node {node_id} in execution {execution_id}")]
    NoActivePrompt {
        /// Execution the response targeted.
        execution_id: String,
        /// Node the response targeted.
        node_id: String,
    },

    /// Routing the response through the control channel failed.
    #[error("{0}")]
    Control(#[from] ControlError),
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

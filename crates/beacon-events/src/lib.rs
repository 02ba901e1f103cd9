//! # beacon-events
//!
//! Wire payload types and the canonical execution event model for Beacon.
//!
//! Remote engines have shipped several historical payload shapes over two
//! transports. This crate owns the boundary where all of them converge:
//!
//! - **Wire frames**: the raw `{type, execution_id, data}` envelope of the
//!   streaming-HTTP path and the `{type, data}` subscription payload
//!   (whose `data` may arrive JSON-encoded as a string)
//! - **Statuses**: execution/node status enums with tolerant wire parsing
//!   (lower-case and `UPPER_SNAKE` both accepted)
//! - **[`ExecutionEvent`]**: the single tagged union every downstream
//!   consumer sees, including the `Batch` wrapper and the `Unknown`
//!   forward-compatibility variant
//! - **Normalizer**: an ordered chain of shape adapters converting any
//!   known payload shape into an [`ExecutionEvent`]

#![deny(unsafe_code)]

pub mod event;
pub mod normalize;
pub mod status;
pub mod wire;

pub use event::{ExecutionEvent, TokenUsage};
pub use normalize::normalize;
pub use status::{CompletionStatus, ExecutionStatus, NodeStatus};

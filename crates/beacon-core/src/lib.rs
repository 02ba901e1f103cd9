//! # beacon-core
//!
//! Foundation types, errors, branded IDs, and backoff policy for Beacon.
//!
//! This crate provides the shared vocabulary that all other Beacon crates
//! depend on:
//!
//! - **Branded IDs**: `ExecutionId`, `NodeId`, `DiagramId`, `ConnectionId`
//!   as newtypes for type safety
//! - **Errors**: `BeaconError` hierarchy via `thiserror`, one typed error
//!   per failure domain (transport, normalization, control, prompt)
//! - **Reconnect policy**: exponential backoff parameters and delay math
//! - **Logging**: `tracing` subscriber initialization

#![deny(unsafe_code)]

pub mod constants;
pub mod errors;
pub mod ids;
pub mod logging;
pub mod retry;

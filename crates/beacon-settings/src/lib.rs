//! # beacon-settings
//!
//! Configuration management with layered sources for Beacon.
//!
//! Settings load in three layers, lowest priority first:
//!
//! 1. Compiled defaults
//! 2. `~/.beacon/settings.json` (deep-merged over defaults)
//! 3. `BEACON_*` environment variables (highest priority)

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{load_settings, load_settings_from_path, settings_path};
pub use types::{BeaconSettings, LoggingSettings, MonitorSettings, ServerSettings};

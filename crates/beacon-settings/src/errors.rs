//! Settings error type.

use thiserror::Error;

/// Settings loading failure.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The settings file could not be read.
    #[error("failed to read settings file: {0}")]
    Io(#[from] std::io::Error),

    /// The settings file or merged value was not valid.
    #[error("invalid settings: {0}")]
    Invalid(#[from] serde_json::Error),
}

/// Convenience result alias over [`SettingsError`].
pub type Result<T> = std::result::Result<T, SettingsError>;

//! Package-level constants.

/// Current version of Beacon (sourced from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Package name.
pub const NAME: &str = "beacon";

/// Minimum interval between accepted state mutations for one node.
pub const NODE_MUTATION_MIN_INTERVAL_MS: u64 = 50;

/// Minimum interval between user-facing notifications sharing a key.
pub const NOTIFICATION_MIN_INTERVAL_MS: u64 = 2000;

/// Base delay for reconnect backoff.
pub const RECONNECT_BASE_DELAY_MS: u64 = 2000;

/// Upper bound on a single reconnect delay.
pub const RECONNECT_MAX_DELAY_MS: u64 = 10_000;

/// Reconnect attempts before giving up and surfacing a connection error.
pub const RECONNECT_MAX_ATTEMPTS: u32 = 3;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_semver() {
        let parts: Vec<&str> = VERSION.split('.').collect();
        assert_eq!(parts.len(), 3, "VERSION must be semver (MAJOR.MINOR.PATCH)");
        for part in parts {
            let _: u32 = part.parse().expect("each semver segment must be a number");
        }
    }

    #[test]
    fn name_is_lowercase() {
        assert_eq!(NAME, NAME.to_lowercase());
    }

    #[test]
    fn notification_interval_wider_than_mutation_interval() {
        assert!(NOTIFICATION_MIN_INTERVAL_MS > NODE_MUTATION_MIN_INTERVAL_MS);
    }

    #[test]
    fn reconnect_cap_above_base() {
        assert!(RECONNECT_MAX_DELAY_MS > RECONNECT_BASE_DELAY_MS);
    }
}

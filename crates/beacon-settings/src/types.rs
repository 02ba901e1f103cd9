//! Settings type definitions.
//!
//! Every field has a serde default so partial settings files merge cleanly
//! over the compiled defaults.

use serde::{Deserialize, Serialize};

use beacon_core::constants::{NODE_MUTATION_MIN_INTERVAL_MS, NOTIFICATION_MIN_INTERVAL_MS};
use beacon_core::retry::ReconnectPolicy;

/// Top-level Beacon settings.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BeaconSettings {
    /// Remote engine endpoints.
    pub server: ServerSettings,
    /// Monitoring behavior.
    pub monitor: MonitorSettings,
    /// Logging behavior.
    pub logging: LoggingSettings,
}

/// Remote engine endpoint settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerSettings {
    /// Base HTTP URL of the remote engine.
    pub base_url: String,
    /// WebSocket URL for the subscription transport.
    pub ws_url: String,
    /// Timeout for control requests in ms.
    pub request_timeout_ms: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".into(),
            ws_url: "ws://localhost:8000/ws".into(),
            request_timeout_ms: 30_000,
        }
    }
}

/// Monitoring behavior settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MonitorSettings {
    /// Minimum interval between accepted mutations for one node, in ms.
    pub node_throttle_ms: u64,
    /// Minimum interval between notifications sharing a key, in ms.
    pub notification_throttle_ms: u64,
    /// Reconnect backoff policy.
    pub reconnect: ReconnectPolicy,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            node_throttle_ms: NODE_MUTATION_MIN_INTERVAL_MS,
            notification_throttle_ms: NOTIFICATION_MIN_INTERVAL_MS,
            reconnect: ReconnectPolicy::default(),
        }
    }
}

/// Logging settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// Minimum log level when `RUST_LOG` is unset.
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "warn".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_constants() {
        let settings = BeaconSettings::default();
        assert_eq!(settings.monitor.node_throttle_ms, 50);
        assert_eq!(settings.monitor.notification_throttle_ms, 2000);
        assert_eq!(settings.monitor.reconnect.base_delay_ms, 2000);
        assert_eq!(settings.monitor.reconnect.max_delay_ms, 10_000);
        assert_eq!(settings.monitor.reconnect.max_attempts, 3);
        assert_eq!(settings.logging.level, "warn");
    }

    #[test]
    fn empty_json_yields_defaults() {
        let settings: BeaconSettings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings, BeaconSettings::default());
    }

    #[test]
    fn partial_json_fills_missing_fields() {
        let settings: BeaconSettings = serde_json::from_str(
            r#"{"server": {"baseUrl": "http://engine:9000"}}"#,
        )
        .unwrap();
        assert_eq!(settings.server.base_url, "http://engine:9000");
        assert_eq!(settings.server.ws_url, "ws://localhost:8000/ws");
        assert_eq!(settings.monitor, MonitorSettings::default());
    }

    #[test]
    fn serde_roundtrip() {
        let settings = BeaconSettings::default();
        let json = serde_json::to_string(&settings).unwrap();
        let back: BeaconSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(settings, back);
    }

    #[test]
    fn camel_case_field_names() {
        let json = serde_json::to_value(BeaconSettings::default()).unwrap();
        assert!(json["server"].get("baseUrl").is_some());
        assert!(json["monitor"].get("nodeThrottleMs").is_some());
        assert!(json["monitor"]["reconnect"].get("baseDelayMs").is_some());
    }
}

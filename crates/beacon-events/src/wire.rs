//! Wire frame helpers shared by both transports.
//!
//! The streaming-HTTP path delivers newline/event-delimited JSON envelopes
//! of the form `{ "type": string, "execution_id": string, "data"?: object }`.
//! The subscription path delivers `{ "type": string, "data": object|string }`
//! where `data` may itself be JSON-encoded as a string and must be decoded
//! before normalization. Payloads stay [`serde_json::Value`]s until the
//! normalizer runs — historical shapes keep fields in too many places for a
//! fixed struct to be honest about.

use serde_json::Value;

/// Frame types that carry no data and must be discarded by the transport
/// without ever reaching the normalizer.
pub const RESERVED_FRAME_TYPES: &[&str] = &["CONNECTION_ESTABLISHED", "HEARTBEAT"];

/// Whether a frame type tag is a protocol-level keepalive.
#[must_use]
pub fn is_keepalive(frame_type: &str) -> bool {
    RESERVED_FRAME_TYPES.contains(&frame_type)
}

/// The `type` tag of a decoded frame, if present.
#[must_use]
pub fn frame_type(value: &Value) -> Option<&str> {
    value.get("type").and_then(Value::as_str)
}

/// Whether a decoded frame is a keepalive to be discarded.
#[must_use]
pub fn is_keepalive_frame(value: &Value) -> bool {
    frame_type(value).is_some_and(is_keepalive)
}

/// Decode a double-encoded `data` field in place.
///
/// Subscription payloads may carry `data` JSON-encoded as a string; this
/// replaces it with the parsed value. Frames without a string `data` pass
/// through untouched.
pub fn decode_data_field(value: &mut Value) -> Result<(), serde_json::Error> {
    let Some(Value::String(encoded)) = value.get("data") else {
        return Ok(());
    };
    let decoded: Value = serde_json::from_str(encoded)?;
    value["data"] = decoded;
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn keepalive_type_tags() {
        assert!(is_keepalive("HEARTBEAT"));
        assert!(is_keepalive("CONNECTION_ESTABLISHED"));
        assert!(!is_keepalive("NODE_STARTED"));
        assert!(!is_keepalive("heartbeat"));
    }

    #[test]
    fn frame_type_extraction() {
        assert_eq!(
            frame_type(&json!({"type": "NODE_COMPLETED", "data": {}})),
            Some("NODE_COMPLETED")
        );
        assert_eq!(frame_type(&json!({"data": {}})), None);
        assert_eq!(frame_type(&json!({"type": 42})), None);
    }

    #[test]
    fn keepalive_frame_detection() {
        assert!(is_keepalive_frame(&json!({"type": "HEARTBEAT"})));
        assert!(!is_keepalive_frame(&json!({"type": "NODE_STARTED"})));
        assert!(!is_keepalive_frame(&json!("bare string")));
    }

    #[test]
    fn decode_object_data_untouched() {
        let mut value = json!({
            "type": "NODE_STARTED",
            "data": { "nodeId": "n1" }
        });
        decode_data_field(&mut value).unwrap();
        assert_eq!(value["data"]["nodeId"], "n1");
    }

    #[test]
    fn decode_string_encoded_data() {
        let mut value = json!({
            "type": "NODE_STARTED",
            "data": "{\"nodeId\":\"n1\"}"
        });
        decode_data_field(&mut value).unwrap();
        assert_eq!(value["data"]["nodeId"], "n1");
    }

    #[test]
    fn decode_bad_string_data_is_error() {
        let mut value = json!({
            "type": "NODE_STARTED",
            "data": "not json"
        });
        assert!(decode_data_field(&mut value).is_err());
    }

    #[test]
    fn decode_missing_data_is_ok() {
        let mut value = json!({ "type": "HEARTBEAT" });
        decode_data_field(&mut value).unwrap();
        assert!(value.get("data").is_none());
    }
}

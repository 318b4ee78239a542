//! Wire codec for CDP documents.
//!
//! Encodes outbound command envelopes and classifies inbound documents.
//! The codec works on generic JSON structure only; it knows nothing about
//! individual command or event semantics.
//!
//! # Wire Formats
//!
//! Outbound envelope:
//!
//! ```json
//! { "id": 3, "method": "Runtime.evaluate", "params": { ... }, "sessionId": "..." }
//! ```
//!
//! Inbound response:
//!
//! ```json
//! { "id": 3, "result": { ... } }
//! { "id": 3, "error": { "code": -32000, "message": "..." } }
//! ```
//!
//! Inbound notification:
//!
//! ```json
//! { "method": "Target.targetCreated", "params": { ... }, "sessionId": "..." }
//! ```

// ============================================================================
// Imports
// ============================================================================

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::{Error, Result};

// ============================================================================
// Reserved Keys
// ============================================================================

/// Correlation id key.
pub const KEY_ID: &str = "id";

/// Command or notification method key.
pub const KEY_METHOD: &str = "method";

/// Parameter document key.
pub const KEY_PARAMS: &str = "params";

/// Response result key.
pub const KEY_RESULT: &str = "result";

/// Response error key.
pub const KEY_ERROR: &str = "error";

/// Session routing key.
pub const KEY_SESSION_ID: &str = "sessionId";

// ============================================================================
// Inbound Types
// ============================================================================

/// A classified inbound document.
#[derive(Debug, Clone)]
pub enum InboundMessage {
    /// Reply to a previously sent command, matched by correlation id.
    Response(Response),
    /// Unsolicited notification carrying a `method` field.
    Event(CdpEvent),
}

/// A command reply. Exactly one of `result`/`error` is meaningful.
#[derive(Debug, Clone)]
pub struct Response {
    /// Matches the outbound envelope's `id`.
    pub id: u64,
    /// Result document on success.
    pub result: Option<Value>,
    /// Error object on failure.
    pub error: Option<ErrorObject>,
}

/// Server-side error object carried on a failed response.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorObject {
    /// CDP error code.
    #[serde(default)]
    pub code: i64,
    /// Human-readable error message.
    #[serde(default)]
    pub message: String,
}

/// An unsolicited browser notification. Ephemeral, never stored.
#[derive(Debug, Clone)]
pub struct CdpEvent {
    /// Session the notification belongs to, if any.
    pub session_id: Option<String>,
    /// Notification method name, e.g. `Target.targetCreated`.
    pub method: String,
    /// Notification parameters.
    pub params: Value,
}

// ============================================================================
// Encoding
// ============================================================================

/// Builds the outbound envelope for a command.
///
/// Caller-supplied `extra` entries are merged first; the reserved keys
/// `id`, `method` and `params` are written afterwards so extras can never
/// override them.
///
/// # Errors
///
/// Returns [`Error::Json`] if serialization fails.
pub fn encode_command(
    id: u64,
    method: &str,
    params: Value,
    extra: Option<&Map<String, Value>>,
) -> Result<String> {
    let mut envelope = Map::new();
    if let Some(extra) = extra {
        envelope.extend(extra.iter().map(|(k, v)| (k.clone(), v.clone())));
    }
    envelope.insert(KEY_ID.to_string(), Value::from(id));
    envelope.insert(KEY_METHOD.to_string(), Value::from(method));
    envelope.insert(KEY_PARAMS.to_string(), params);

    Ok(serde_json::to_string(&Value::Object(envelope))?)
}

// ============================================================================
// Decoding
// ============================================================================

/// Decodes and classifies an inbound document.
///
/// A document carrying a `method` field is a notification; otherwise it
/// must carry a numeric `id` and is a response. Anything else is malformed.
///
/// # Errors
///
/// - [`Error::Json`] if the text is not valid JSON
/// - [`Error::MalformedMessage`] if the document fits neither shape
pub fn decode(text: &str) -> Result<InboundMessage> {
    let value: Value = serde_json::from_str(text)?;
    let Value::Object(mut document) = value else {
        return Err(Error::malformed("inbound document is not an object"));
    };

    if let Some(method) = document.get(KEY_METHOD) {
        let Some(method) = method.as_str() else {
            return Err(Error::malformed("notification \"method\" is not a string"));
        };
        let method = method.to_string();
        let session_id = document
            .get(KEY_SESSION_ID)
            .and_then(Value::as_str)
            .map(str::to_string);
        let params = document.remove(KEY_PARAMS).unwrap_or(Value::Null);

        return Ok(InboundMessage::Event(CdpEvent {
            session_id,
            method,
            params,
        }));
    }

    let Some(id) = document.get(KEY_ID).and_then(Value::as_u64) else {
        return Err(Error::malformed(
            "inbound document carries neither \"method\" nor a numeric \"id\"",
        ));
    };

    let error = match document.remove(KEY_ERROR) {
        Some(raw) => Some(serde_json::from_value::<ErrorObject>(raw)?),
        None => None,
    };
    let result = document.remove(KEY_RESULT);

    Ok(InboundMessage::Response(Response { id, result, error }))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    #[test]
    fn test_encode_reserved_keys() {
        let text = encode_command(7, "Page.navigate", json!({"url": "about:blank"}), None)
            .expect("encode");
        let value: Value = serde_json::from_str(&text).expect("round trip");

        assert_eq!(value["id"], 7);
        assert_eq!(value["method"], "Page.navigate");
        assert_eq!(value["params"]["url"], "about:blank");
    }

    #[test]
    fn test_encode_extra_fields_carried() {
        let mut extra = Map::new();
        extra.insert("sessionId".to_string(), json!("S1"));

        let text =
            encode_command(1, "Runtime.enable", json!({}), Some(&extra)).expect("encode");
        let value: Value = serde_json::from_str(&text).expect("round trip");

        assert_eq!(value["sessionId"], "S1");
        assert_eq!(value["method"], "Runtime.enable");
    }

    #[test]
    fn test_encode_extra_cannot_override_reserved() {
        let mut extra = Map::new();
        extra.insert("id".to_string(), json!(999));
        extra.insert("method".to_string(), json!("Evil.method"));
        extra.insert("params".to_string(), json!({"evil": true}));

        let text = encode_command(3, "Target.attachToTarget", json!({"targetId": "abc"}), Some(&extra))
            .expect("encode");
        let value: Value = serde_json::from_str(&text).expect("round trip");

        assert_eq!(value["id"], 3);
        assert_eq!(value["method"], "Target.attachToTarget");
        assert_eq!(value["params"]["targetId"], "abc");
    }

    #[test]
    fn test_decode_success_response() {
        let message = decode(r#"{"id":0,"result":{"sessionId":"S1"}}"#).expect("decode");
        let InboundMessage::Response(response) = message else {
            panic!("expected response");
        };

        assert_eq!(response.id, 0);
        assert!(response.error.is_none());
        assert_eq!(response.result.expect("result")["sessionId"], "S1");
    }

    #[test]
    fn test_decode_error_response() {
        let message = decode(r#"{"id":1,"error":{"code":-32000,"message":"bad expression"}}"#)
            .expect("decode");
        let InboundMessage::Response(response) = message else {
            panic!("expected response");
        };

        let error = response.error.expect("error object");
        assert_eq!(error.code, -32000);
        assert_eq!(error.message, "bad expression");
    }

    #[test]
    fn test_decode_notification() {
        let message = decode(
            r#"{"method":"Target.targetCreated","sessionId":"S2","params":{"targetInfo":{}}}"#,
        )
        .expect("decode");
        let InboundMessage::Event(event) = message else {
            panic!("expected event");
        };

        assert_eq!(event.method, "Target.targetCreated");
        assert_eq!(event.session_id.as_deref(), Some("S2"));
        assert!(event.params.is_object());
    }

    #[test]
    fn test_decode_notification_without_params() {
        let message = decode(r#"{"method":"Inspector.targetCrashed"}"#).expect("decode");
        let InboundMessage::Event(event) = message else {
            panic!("expected event");
        };

        assert_eq!(event.method, "Inspector.targetCrashed");
        assert!(event.session_id.is_none());
        assert!(event.params.is_null());
    }

    #[test]
    fn test_decode_missing_id_is_malformed() {
        let err = decode(r#"{"result":{"value":1}}"#).unwrap_err();
        assert!(matches!(err, Error::MalformedMessage { .. }));
    }

    #[test]
    fn test_decode_non_object_is_malformed() {
        let err = decode("[1,2,3]").unwrap_err();
        assert!(matches!(err, Error::MalformedMessage { .. }));
    }

    #[test]
    fn test_decode_invalid_json() {
        let err = decode("not json").unwrap_err();
        assert!(matches!(err, Error::Json(_)));
    }
}

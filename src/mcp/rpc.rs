//! JSON-RPC envelope representations
//!
//! A single `Envelope` type carries requests, notifications, results and errors on the wire.

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

use crate::errors::RpcError;

pub const JSONRPC_VERSION: &str = "2.0";

fn default_jsonrpc() -> String {
    JSONRPC_VERSION.to_string()
}

/// Opaque request identifier, echoed verbatim in the matching response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    Number(Number),
    String(String),
}

impl From<i64> for RequestId {
    fn from(value: i64) -> Self {
        Self::Number(value.into())
    }
}

impl From<&str> for RequestId {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(default = "default_jsonrpc")]
    pub jsonrpc: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RequestId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDetail>,
}

impl Envelope {
    pub fn request(id: Option<RequestId>, method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: default_jsonrpc(),
            id,
            method: Some(method.into()),
            params,
            result: None,
            error: None,
        }
    }

    pub fn result(id: Option<RequestId>, result: Value) -> Self {
        Self {
            jsonrpc: default_jsonrpc(),
            id,
            method: None,
            params: None,
            result: Some(result),
            error: None,
        }
    }

    pub fn error(id: Option<RequestId>, error: impl Into<ErrorDetail>) -> Self {
        Self {
            jsonrpc: default_jsonrpc(),
            id,
            method: None,
            params: None,
            result: None,
            error: Some(error.into()),
        }
    }

    /// Builds the response for a handler outcome, keeping `result` and `error` exclusive.
    pub fn reply(id: Option<RequestId>, outcome: Result<Value, RpcError>) -> Self {
        match outcome {
            Ok(result) => Self::result(id, result),
            Err(err) => Self::error(id, err),
        }
    }

    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn round_trip(envelope: &Envelope) -> Envelope {
        let encoded = serde_json::to_string(envelope).expect("envelope serialization");
        serde_json::from_str(&encoded).expect("envelope deserialization")
    }

    #[test]
    fn request_with_numeric_id_round_trips() {
        let envelope = Envelope::request(Some(1_i64.into()), "test", Some(json!({"key": "value"})));
        assert_eq!(round_trip(&envelope), envelope);
    }

    #[test]
    fn request_with_string_id_round_trips() {
        let envelope = Envelope::request(Some("abc-1".into()), "tools/list", None);
        assert_eq!(round_trip(&envelope), envelope);
    }

    #[test]
    fn notification_round_trips_without_id() {
        let envelope = Envelope::request(None, "notifications/initialized", None);
        let decoded = round_trip(&envelope);
        assert_eq!(decoded, envelope);
        assert!(decoded.is_notification());
    }

    #[test]
    fn result_and_error_envelopes_round_trip() {
        let result = Envelope::result(Some(7_i64.into()), json!({"tools": []}));
        assert_eq!(round_trip(&result), result);

        let error = Envelope::error(
            Some("req".into()),
            ErrorDetail {
                code: -32603,
                message: "Tool execution failed: boom".to_string(),
                data: Some(json!({"attempt": 1})),
            },
        );
        assert_eq!(round_trip(&error), error);
    }

    #[test]
    fn absent_fields_are_omitted_on_the_wire() {
        let encoded =
            serde_json::to_value(Envelope::result(Some(3_i64.into()), json!({}))).expect("encode");
        assert_eq!(encoded, json!({"jsonrpc": "2.0", "id": 3, "result": {}}));
    }

    #[test]
    fn null_id_decodes_as_absent() {
        let decoded: Envelope =
            serde_json::from_str(r#"{"jsonrpc":"2.0","id":null,"method":"ping"}"#).expect("decode");
        assert!(decoded.id.is_none());
    }

    #[test]
    fn reply_keeps_result_and_error_exclusive() {
        let ok = Envelope::reply(Some(1_i64.into()), Ok(json!({"ok": true})));
        assert!(ok.result.is_some() && ok.error.is_none());

        let failed = Envelope::reply(Some(1_i64.into()), Err(RpcError::invalid_params()));
        assert!(failed.result.is_none());
        assert_eq!(failed.error.map(|error| error.code), Some(-32602));
    }
}

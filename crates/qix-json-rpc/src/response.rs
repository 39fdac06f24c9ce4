use serde::Deserialize;
use serde_json::Value;

use crate::error::{DecodeError, JsonRpcErrorObject};
use crate::types::RequestId;

/// A decoded engine reply
#[derive(Debug, Clone, PartialEq)]
pub enum JsonRpcMessage {
    /// Reply with a `result` member, or with neither `result` nor `error` (null result)
    Success { id: RequestId, result: Value },
    /// Reply with an `error` member
    Error {
        id: RequestId,
        error: JsonRpcErrorObject,
    },
}

impl JsonRpcMessage {
    /// Get the request ID this reply belongs to
    pub fn id(&self) -> RequestId {
        match self {
            JsonRpcMessage::Success { id, .. } | JsonRpcMessage::Error { id, .. } => *id,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, JsonRpcMessage::Error { .. })
    }

    /// Split into the result payload or the remote error
    pub fn into_result(self) -> Result<Value, JsonRpcErrorObject> {
        match self {
            JsonRpcMessage::Success { result, .. } => Ok(result),
            JsonRpcMessage::Error { error, .. } => Err(error),
        }
    }
}

/// Envelope members the codec looks at. Engine extras such as `change` and `close` are ignored.
#[derive(Debug, Deserialize)]
struct Envelope {
    jsonrpc: Option<String>,
    id: Option<Value>,
    method: Option<String>,
    result: Option<Value>,
    error: Option<JsonRpcErrorObject>,
}

/// Decode one text frame received from the engine.
pub fn decode_response(frame: &str) -> Result<JsonRpcMessage, DecodeError> {
    let envelope: Envelope = serde_json::from_str(frame)?;

    match envelope.jsonrpc.as_deref() {
        Some(crate::JSONRPC_VERSION) => {}
        Some(other) => return Err(DecodeError::UnsupportedVersion(other.to_string())),
        None => return Err(DecodeError::MissingVersion),
    }

    let id = match envelope.id {
        Some(Value::Null) | None => {
            return Err(match envelope.method {
                Some(method) => DecodeError::Notification(method),
                None => DecodeError::MissingId,
            });
        }
        Some(id) => id
            .as_u64()
            .ok_or_else(|| DecodeError::InvalidId(id.to_string()))?,
    };

    if let Some(error) = envelope.error {
        return Ok(JsonRpcMessage::Error { id, error });
    }

    Ok(JsonRpcMessage::Success {
        id,
        result: envelope.result.unwrap_or(Value::Null),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_success() {
        let message = decode_response(r#"{"jsonrpc":"2.0","id":7,"result":{"x":1}}"#).unwrap();
        assert_eq!(
            message,
            JsonRpcMessage::Success {
                id: 7,
                result: json!({"x": 1})
            }
        );
    }

    #[test]
    fn test_decode_error() {
        let message =
            decode_response(r#"{"jsonrpc":"2.0","id":7,"error":{"code":-1,"message":"bad"}}"#)
                .unwrap();
        assert!(message.is_error());
        assert_eq!(message.id(), 7);
        let error = message.into_result().unwrap_err();
        assert_eq!(error.code, -1);
        assert_eq!(error.message, "bad");
    }

    #[test]
    fn test_decode_without_result_or_error_is_null_success() {
        let message = decode_response(r#"{"jsonrpc":"2.0","id":3,"change":[1]}"#).unwrap();
        assert_eq!(
            message,
            JsonRpcMessage::Success {
                id: 3,
                result: Value::Null
            }
        );
    }

    #[test]
    fn test_decode_non_json_is_protocol_error() {
        let error = decode_response("not json at all").unwrap_err();
        assert!(matches!(error, DecodeError::Malformed(_)));
    }

    #[test]
    fn test_decode_missing_envelope_members() {
        assert!(matches!(
            decode_response(r#"{"id":1,"result":{}}"#).unwrap_err(),
            DecodeError::MissingVersion
        ));
        assert!(matches!(
            decode_response(r#"{"jsonrpc":"2.0","result":{}}"#).unwrap_err(),
            DecodeError::MissingId
        ));
        assert!(matches!(
            decode_response(r#"{"jsonrpc":"1.0","id":1,"result":{}}"#).unwrap_err(),
            DecodeError::UnsupportedVersion(_)
        ));
        assert!(matches!(
            decode_response(r#"{"jsonrpc":"2.0","id":"abc","result":{}}"#).unwrap_err(),
            DecodeError::InvalidId(_)
        ));
    }

    #[test]
    fn test_decode_notification() {
        let frame = json!({
            "jsonrpc": "2.0",
            "method": "OnConnected",
            "params": {"qSessionState": "SESSION_CREATED"}
        });
        let error = decode_response(&frame.to_string()).unwrap_err();
        assert!(error.is_notification());
    }
}

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// JSON-RPC error object as sent by the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcErrorObject {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcErrorObject {
    pub fn new(code: i64, message: impl Into<String>, data: Option<Value>) -> Self {
        Self {
            code,
            message: message.into(),
            data,
        }
    }
}

impl fmt::Display for JsonRpcErrorObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "JSON-RPC Error {}: {}", self.code, self.message)
    }
}

/// A frame that could not be tied to any request.
///
/// None of these variants carry a request id: the session drops such frames rather than
/// failing a caller.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Malformed frame: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Frame is missing the jsonrpc member")]
    MissingVersion,

    #[error("Unsupported JSON-RPC version: {0}")]
    UnsupportedVersion(String),

    #[error("Frame is missing an id")]
    MissingId,

    #[error("Invalid request id: {0}")]
    InvalidId(String),

    /// Server-initiated notification (method without id)
    #[error("Notification '{0}' carries no id")]
    Notification(String),
}

impl DecodeError {
    /// Engine housekeeping notifications are expected and not worth a warning
    pub fn is_notification(&self) -> bool {
        matches!(self, DecodeError::Notification(_))
    }
}

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::types::{Handle, JsonRpcVersion, RequestId};

/// Parameters for a JSON-RPC request
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum RequestParams {
    /// Positional parameters as an array
    Array(Vec<Value>),
    /// Named parameters as an object
    Object(Map<String, Value>),
}

impl RequestParams {
    /// Get a parameter by name (object params only)
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            RequestParams::Object(map) => map.get(key),
            RequestParams::Array(_) => None,
        }
    }

    /// Get a parameter by index (array params only)
    pub fn get_index(&self, index: usize) -> Option<&Value> {
        match self {
            RequestParams::Array(vec) => vec.get(index),
            RequestParams::Object(_) => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            RequestParams::Object(map) => map.is_empty(),
            RequestParams::Array(vec) => vec.is_empty(),
        }
    }

    /// Convert to a serde_json::Value for serialization
    pub fn to_value(&self) -> Value {
        match self {
            RequestParams::Object(map) => Value::Object(map.clone()),
            RequestParams::Array(arr) => Value::Array(arr.clone()),
        }
    }
}

impl Default for RequestParams {
    fn default() -> Self {
        RequestParams::Object(Map::new())
    }
}

impl From<Value> for RequestParams {
    /// Arrays and objects map to themselves, `null` to empty object params and any other
    /// scalar to a one-element positional list.
    fn from(value: Value) -> Self {
        match value {
            Value::Array(vec) => RequestParams::Array(vec),
            Value::Object(map) => RequestParams::Object(map),
            Value::Null => RequestParams::default(),
            other => RequestParams::Array(vec![other]),
        }
    }
}

impl From<Vec<Value>> for RequestParams {
    fn from(vec: Vec<Value>) -> Self {
        RequestParams::Array(vec)
    }
}

/// A QIX JSON-RPC request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    #[serde(rename = "jsonrpc")]
    pub version: JsonRpcVersion,
    pub id: RequestId,
    pub method: String,
    pub handle: Handle,
    pub params: RequestParams,
}

impl JsonRpcRequest {
    pub fn new(
        id: RequestId,
        method: impl Into<String>,
        handle: Handle,
        params: impl Into<RequestParams>,
    ) -> Self {
        Self {
            version: JsonRpcVersion::V2_0,
            id,
            method: method.into(),
            handle,
            params: params.into(),
        }
    }

    /// Serialize to the text frame sent on the wire
    pub fn to_wire(&self) -> String {
        json!({
            "jsonrpc": self.version.as_str(),
            "id": self.id,
            "method": self.method,
            "handle": self.handle.value(),
            "params": self.params.to_value(),
        })
        .to_string()
    }
}

/// Build the wire frame for one request.
pub fn encode_request(
    method: &str,
    handle: Handle,
    params: impl Into<RequestParams>,
    id: RequestId,
) -> String {
    JsonRpcRequest::new(id, method, handle, params).to_wire()
}

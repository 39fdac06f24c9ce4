//! # QIX JSON-RPC 2.0 Codec
//!
//! Pure, transport-agnostic encoding and decoding of the JSON-RPC 2.0 envelopes spoken by the
//! QIX engine. The engine extends the standard request with a `handle` member that addresses
//! the remote object a method is invoked on.
//!
//! ## Features
//! - Request envelopes with caller-supplied ids (id generation belongs to the session)
//! - Decoding of success, error and result-less responses
//! - Distinguishable decode errors for frames that belong to no request
//!
//! ```rust
//! use qix_json_rpc::{Handle, JsonRpcMessage, decode_response, encode_request};
//! use serde_json::json;
//!
//! let frame = encode_request("OpenDoc", Handle::GLOBAL, json!({"qDocName": "app-1"}), 1);
//! assert!(frame.contains("\"handle\":-1"));
//!
//! let reply = decode_response(r#"{"jsonrpc":"2.0","id":1,"result":{"x":1}}"#).unwrap();
//! assert!(matches!(reply, JsonRpcMessage::Success { id: 1, .. }));
//! ```

pub mod error;
pub mod request;
pub mod response;
pub mod types;

// Re-export main types
pub use error::{DecodeError, JsonRpcErrorObject};
pub use request::{JsonRpcRequest, RequestParams, encode_request};
pub use response::{JsonRpcMessage, decode_response};
pub use types::{Handle, JsonRpcVersion, RequestId};

/// JSON-RPC 2.0 version constant
pub const JSONRPC_VERSION: &str = "2.0";

/// Standard JSON-RPC 2.0 error codes
pub mod error_codes {
    pub const PARSE_ERROR: i64 = -32700;
    pub const INVALID_REQUEST: i64 = -32600;
    pub const METHOD_NOT_FOUND: i64 = -32601;
    pub const INVALID_PARAMS: i64 = -32602;
    pub const INTERNAL_ERROR: i64 = -32603;
}

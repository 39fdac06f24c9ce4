//! Error types for QIX client operations

use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

use qix_json_rpc::{DecodeError, JsonRpcErrorObject};
use qix_protocol::ExtractError;

/// Result type for QIX client operations
pub type QixClientResult<T> = Result<T, QixClientError>;

/// Comprehensive error type for QIX client operations
#[derive(Error, Debug)]
pub enum QixClientError {
    /// Missing or invalid configuration, raised before any network activity
    #[error("Configuration error: {0}")]
    Config(String),

    /// Transport-level errors
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Protocol-level errors
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Session lifecycle errors
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// A request received no reply in time
    #[error("{method} (request {request_id}) timed out after {timeout:?}")]
    Timeout {
        method: String,
        request_id: u64,
        timeout: Duration,
    },

    /// The engine answered with a JSON-RPC error
    #[error("Engine error (code {code}): {message}")]
    Remote {
        code: i64,
        message: String,
        data: Option<Value>,
    },
}

/// Transport-specific errors
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("WebSocket upgrade failed: {0}")]
    UpgradeFailed(String),

    #[error("{stage} timed out after {timeout:?}")]
    HandshakeTimeout {
        stage: &'static str,
        timeout: Duration,
    },

    #[error("Send failed: {0}")]
    SendFailed(String),

    #[error("WebSocket transport error: {0}")]
    WebSocket(String),

    #[error("Transport closed unexpectedly")]
    Closed,
}

/// Protocol-specific errors
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Invalid frame: {0}")]
    InvalidFrame(#[from] DecodeError),

    #[error("Unexpected result: {0}")]
    UnexpectedResult(#[from] ExtractError),
}

/// Session lifecycle errors
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Session closed")]
    Closed,

    #[error("Session closed: {0}")]
    ClosedWithReason(String),
}

/// Coarse classification used by callers that only care about the failure class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Network,
    Protocol,
}

impl QixClientError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a remote error from a JSON-RPC error object
    pub fn remote(error: JsonRpcErrorObject) -> Self {
        Self::Remote {
            code: error.code,
            message: error.message,
            data: error.data,
        }
    }

    /// Remote errors are reported as network-class failures with their detail preserved
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config(_) => ErrorKind::Configuration,
            Self::Protocol(_) => ErrorKind::Protocol,
            Self::Transport(_) | Self::Session(_) | Self::Timeout { .. } | Self::Remote { .. } => {
                ErrorKind::Network
            }
        }
    }

    pub fn is_network(&self) -> bool {
        self.kind() == ErrorKind::Network
    }

    /// Check if a fresh connection attempt could succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(TransportError::InvalidEndpoint(_)) => false,
            Self::Transport(_) => true,
            Self::Timeout { .. } => true,
            Self::Session(_) => true,
            _ => false,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::Timeout { .. } | Self::Transport(TransportError::HandshakeTimeout { .. })
        )
    }

    /// Get the engine error code if this is a remote error
    pub fn error_code(&self) -> Option<i64> {
        match self {
            Self::Remote { code, .. } => Some(*code),
            _ => None,
        }
    }
}

impl From<ExtractError> for QixClientError {
    fn from(error: ExtractError) -> Self {
        Self::Protocol(ProtocolError::UnexpectedResult(error))
    }
}

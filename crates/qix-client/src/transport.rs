//! Transport layer for QIX client

use async_trait::async_trait;
use serde_json::Value;

use crate::error::QixClientResult;

pub mod channel;
pub mod websocket;

pub use channel::ChannelTransport;
pub use websocket::{WebSocketTransport, websocket_url};

/// Transport type enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportType {
    /// WebSocket connection to an engine
    WebSocket,
    /// In-process frame channels
    Channel,
}

impl std::fmt::Display for TransportType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportType::WebSocket => write!(f, "WebSocket"),
            TransportType::Channel => write!(f, "Channel"),
        }
    }
}

/// Transport connection information
#[derive(Debug, Clone)]
pub struct ConnectionInfo {
    /// Transport type
    pub transport_type: TransportType,
    /// Connection endpoint
    pub endpoint: String,
    /// Connection state
    pub connected: bool,
    /// Additional metadata
    pub metadata: Value,
}

/// A full-duplex carrier of JSON-RPC text frames.
///
/// The session actor is the only owner of a transport. `recv` is polled inside
/// `tokio::select!` and therefore must be cancel safe: dropping a pending `recv`
/// future must not lose a frame.
#[async_trait]
pub trait Transport: Send {
    /// Get transport type
    fn transport_type(&self) -> TransportType;

    /// Send one text frame
    async fn send(&mut self, frame: String) -> QixClientResult<()>;

    /// Next inbound text frame; `None` once the peer has closed the connection
    async fn recv(&mut self) -> Option<QixClientResult<String>>;

    /// Close the connection. Closing twice is not an error.
    async fn close(&mut self) -> QixClientResult<()>;

    /// Get connection information
    fn connection_info(&self) -> ConnectionInfo;
}

/// Type alias for a boxed transport
pub type BoxedTransport = Box<dyn Transport>;

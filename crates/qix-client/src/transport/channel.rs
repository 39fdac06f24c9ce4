//! In-process transport over tokio channels.
//!
//! Useful for driving a session against a scripted engine without a socket.

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::mpsc;
use tracing::debug;

use crate::error::{QixClientResult, TransportError};
use crate::transport::{ConnectionInfo, Transport, TransportType};

/// Client side of an in-memory frame pipe
#[derive(Debug)]
pub struct ChannelTransport {
    outbound: mpsc::UnboundedSender<String>,
    inbound: mpsc::UnboundedReceiver<String>,
    closed: bool,
}

/// Engine side of an in-memory frame pipe. Dropping it closes the connection.
#[derive(Debug)]
pub struct ChannelPeer {
    received: mpsc::UnboundedReceiver<String>,
    replies: mpsc::UnboundedSender<String>,
}

impl ChannelTransport {
    /// Create a connected transport and the peer that plays the engine
    pub fn pair() -> (Self, ChannelPeer) {
        let (outbound, received) = mpsc::unbounded_channel();
        let (replies, inbound) = mpsc::unbounded_channel();

        (
            Self {
                outbound,
                inbound,
                closed: false,
            },
            ChannelPeer { received, replies },
        )
    }
}

impl ChannelPeer {
    /// Next frame sent by the client; `None` once the client side is gone
    pub async fn recv(&mut self) -> Option<String> {
        self.received.recv().await
    }

    /// Next frame sent by the client, parsed as JSON
    pub async fn recv_json(&mut self) -> Option<serde_json::Value> {
        let frame = self.recv().await?;
        serde_json::from_str(&frame).ok()
    }

    /// Push a frame to the client. Returns false when the client side is gone.
    pub fn send(&self, frame: impl Into<String>) -> bool {
        self.replies.send(frame.into()).is_ok()
    }

    /// Reply with a successful result for `id`
    pub fn reply(&self, id: u64, result: serde_json::Value) -> bool {
        self.send(json!({"jsonrpc": "2.0", "id": id, "result": result}).to_string())
    }

    /// Reply with an engine error for `id`
    pub fn reply_error(&self, id: u64, code: i64, message: &str) -> bool {
        self.send(
            json!({"jsonrpc": "2.0", "id": id, "error": {"code": code, "message": message}})
                .to_string(),
        )
    }
}

#[async_trait]
impl Transport for ChannelTransport {
    fn transport_type(&self) -> TransportType {
        TransportType::Channel
    }

    async fn send(&mut self, frame: String) -> QixClientResult<()> {
        if self.closed {
            return Err(TransportError::Closed.into());
        }

        self.outbound
            .send(frame)
            .map_err(|_| TransportError::SendFailed("peer dropped".to_string()).into())
    }

    async fn recv(&mut self) -> Option<QixClientResult<String>> {
        if self.closed {
            return None;
        }
        self.inbound.recv().await.map(Ok)
    }

    async fn close(&mut self) -> QixClientResult<()> {
        if !self.closed {
            debug!("Closing channel transport");
            self.closed = true;
            self.inbound.close();
        }
        Ok(())
    }

    fn connection_info(&self) -> ConnectionInfo {
        ConnectionInfo {
            transport_type: TransportType::Channel,
            endpoint: "memory".to_string(),
            connected: !self.closed,
            metadata: json!({}),
        }
    }
}

//! WebSocket transport for QIX client

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use serde_json::json;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::handshake::client::Request;
use tokio_tungstenite::tungstenite::http::{HeaderName, HeaderValue, header};
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, client_async_tls};
use tracing::{debug, info, warn};
use url::{Host, Url};

use crate::config::{ClientConfig, ConnectionConfig};
use crate::error::{QixClientError, QixClientResult, TransportError};
use crate::transport::{ConnectionInfo, Transport, TransportType};

/// Engine endpoint for a document: `http` becomes `ws`, `https` becomes `wss`, and the
/// path gains `app/{document_id}`.
pub fn websocket_url(base: &Url, document_id: &str) -> QixClientResult<Url> {
    let scheme = match base.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => {
            return Err(QixClientError::config(format!(
                "unsupported base URL scheme: {}",
                other
            )));
        }
    };

    let mut url = base.clone();
    url.set_scheme(scheme)
        .map_err(|_| QixClientError::config(format!("cannot use {} as a WebSocket base", base)))?;
    url.set_query(None);
    url.set_fragment(None);

    {
        let mut segments = url
            .path_segments_mut()
            .map_err(|_| QixClientError::config(format!("base URL cannot have a path: {}", base)))?;
        segments.pop_if_empty().push("app").push(document_id);
    }

    Ok(url)
}

/// `host[:port]` as sent in the `Host` header
fn host_header(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    Some(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    })
}

fn header_value(name: &str, value: &str) -> QixClientResult<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|_| QixClientError::config(format!("invalid value for header {}", name)))
}

/// Upgrade request carrying credentials and origin for the engine
fn build_request(
    url: &Url,
    base: &Url,
    token: &str,
    connection: &ConnectionConfig,
) -> QixClientResult<Request> {
    let mut request = url
        .as_str()
        .into_client_request()
        .map_err(|e| TransportError::InvalidEndpoint(e.to_string()))?;

    let host = host_header(url)
        .ok_or_else(|| TransportError::InvalidEndpoint(format!("no host in {}", url)))?;
    let origin = base.origin().ascii_serialization();

    let headers = request.headers_mut();
    headers.insert(
        header::AUTHORIZATION,
        header_value("Authorization", &format!("Bearer {}", token))?,
    );
    headers.insert(header::ORIGIN, header_value("Origin", &origin)?);
    headers.insert(header::HOST, header_value("Host", &host)?);

    if let Some(user_agent) = &connection.user_agent {
        headers.insert(header::USER_AGENT, header_value("User-Agent", user_agent)?);
    }

    if let Some(extra) = &connection.headers {
        for (name, value) in extra {
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| QixClientError::config(format!("invalid header name: {}", name)))?;
            headers.insert(header_name, header_value(name, value)?);
        }
    }

    Ok(request)
}

/// WebSocket transport carrying one engine session
pub struct WebSocketTransport {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
    endpoint: Url,
    connected: bool,
    frames_sent: u64,
    frames_received: u64,
}

impl std::fmt::Debug for WebSocketTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebSocketTransport")
            .field("endpoint", &self.endpoint.as_str())
            .field("connected", &self.connected)
            .finish_non_exhaustive()
    }
}

impl WebSocketTransport {
    /// Open TCP (and TLS for `wss`), then upgrade with the configured credentials.
    ///
    /// Each stage runs under its own timeout from `config.timeouts`.
    pub async fn connect(config: &ClientConfig, document_id: &str) -> QixClientResult<Self> {
        let base = config.parsed_base_url()?;
        let token = config.bearer_token()?;
        let endpoint = websocket_url(&base, document_id)?;
        let request = build_request(&endpoint, &base, token, &config.connection)?;

        let host = match endpoint.host() {
            Some(Host::Ipv6(addr)) => addr.to_string(),
            Some(host) => host.to_string(),
            None => {
                return Err(
                    TransportError::InvalidEndpoint(format!("no host in {}", endpoint)).into(),
                );
            }
        };
        let port = endpoint
            .port_or_known_default()
            .ok_or_else(|| TransportError::InvalidEndpoint(format!("no port for {}", endpoint)))?;

        if endpoint.scheme() == "wss" {
            // Fails harmlessly when a provider is already installed
            let _ = rustls::crypto::ring::default_provider().install_default();
        }

        debug!(endpoint = %endpoint, "Opening TCP connection");
        let tcp = timeout(config.timeouts.connect, TcpStream::connect((host.as_str(), port)))
            .await
            .map_err(|_| TransportError::HandshakeTimeout {
                stage: "TCP connect",
                timeout: config.timeouts.connect,
            })?
            .map_err(|e| TransportError::ConnectionFailed(format!("{}:{}: {}", host, port, e)))?;

        let (stream, response) = timeout(config.timeouts.upgrade, client_async_tls(request, tcp))
            .await
            .map_err(|_| TransportError::HandshakeTimeout {
                stage: "WebSocket upgrade",
                timeout: config.timeouts.upgrade,
            })?
            .map_err(|e| TransportError::UpgradeFailed(e.to_string()))?;

        info!(
            endpoint = %endpoint,
            status = %response.status(),
            "WebSocket connection established"
        );

        Ok(Self {
            stream,
            endpoint,
            connected: true,
            frames_sent: 0,
            frames_received: 0,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl Transport for WebSocketTransport {
    fn transport_type(&self) -> TransportType {
        TransportType::WebSocket
    }

    async fn send(&mut self, frame: String) -> QixClientResult<()> {
        if !self.connected {
            return Err(TransportError::Closed.into());
        }

        self.stream
            .send(Message::text(frame))
            .await
            .map_err(|e| TransportError::SendFailed(e.to_string()))?;
        self.frames_sent += 1;
        Ok(())
    }

    async fn recv(&mut self) -> Option<QixClientResult<String>> {
        loop {
            let message = match self.stream.next().await {
                Some(Ok(message)) => message,
                Some(Err(WsError::ConnectionClosed | WsError::AlreadyClosed)) | None => {
                    self.connected = false;
                    return None;
                }
                Some(Err(e)) => {
                    self.connected = false;
                    return Some(Err(TransportError::WebSocket(e.to_string()).into()));
                }
            };

            match message {
                Message::Text(text) => {
                    self.frames_received += 1;
                    return Some(Ok(text.as_str().to_string()));
                }
                Message::Binary(bytes) => match String::from_utf8(bytes.to_vec()) {
                    Ok(text) => {
                        self.frames_received += 1;
                        return Some(Ok(text));
                    }
                    Err(_) => warn!(len = bytes.len(), "Dropping non-UTF-8 binary frame"),
                },
                Message::Close(frame) => {
                    debug!(?frame, "Engine closed the connection");
                    self.connected = false;
                    return None;
                }
                // Control frames are answered by tungstenite itself
                Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => {}
            }
        }
    }

    async fn close(&mut self) -> QixClientResult<()> {
        if !self.connected {
            return Ok(());
        }
        self.connected = false;

        debug!(endpoint = %self.endpoint, "Closing WebSocket connection");
        if let Err(e) = self.stream.close(None).await {
            debug!(error = %e, "WebSocket close handshake did not complete");
        }
        Ok(())
    }

    fn connection_info(&self) -> ConnectionInfo {
        ConnectionInfo {
            transport_type: TransportType::WebSocket,
            endpoint: self.endpoint.to_string(),
            connected: self.connected,
            metadata: json!({
                "frames_sent": self.frames_sent,
                "frames_received": self.frames_received,
            }),
        }
    }
}

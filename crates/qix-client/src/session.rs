//! Engine session: one connection, one document, many in-flight requests.
//!
//! A [`Session`] is a cheap handle to an actor task that exclusively owns the transport,
//! the request id counter, the pending-reply table and the timeout queue. Callers submit
//! requests over a channel and wait on a per-request `oneshot`; the actor correlates
//! replies by id, so replies may arrive in any order.
//!
//! ```text
//!  Session::request ──► commands ──► actor ──► transport.send
//!        ▲                            │
//!        └──── oneshot ◄── pending ◄──┴──◄── transport.recv
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use parking_lot::RwLock;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tokio_util::time::{DelayQueue, delay_queue};
use tracing::{debug, error, info, warn};

use qix_json_rpc::{RequestId, RequestParams, decode_response, encode_request};
use qix_protocol::{Handle, MethodCall, extract_handle};

use crate::config::ClientConfig;
use crate::error::{QixClientError, QixClientResult, SessionError};
use crate::transport::{BoxedTransport, WebSocketTransport};

/// Longest deadline the timeout queue accepts; longer request timeouts are clamped to it
pub const MAX_REQUEST_TIMEOUT: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Session lifecycle; there is no way back from `Closed`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Transport is up, the document is being opened
    Connecting,
    /// Document handle assigned, requests may be issued
    Open,
    /// Disconnected or lost; every request fails
    Closed,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionState::Connecting => write!(f, "connecting"),
            SessionState::Open => write!(f, "open"),
            SessionState::Closed => write!(f, "closed"),
        }
    }
}

enum SessionCommand {
    Request {
        method: String,
        handle: Handle,
        params: RequestParams,
        timeout: Duration,
        reply: oneshot::Sender<QixClientResult<Value>>,
    },
    Close {
        done: oneshot::Sender<()>,
    },
}

#[derive(Debug)]
struct SessionShared {
    document_id: String,
    endpoint: String,
    state: RwLock<SessionState>,
    document_handle: RwLock<Option<Handle>>,
}

/// Handle to a live engine session. Clones share the same connection; the connection is
/// closed when the last clone is dropped or [`disconnect`](Self::disconnect) is called.
#[derive(Debug, Clone)]
pub struct Session {
    commands: mpsc::UnboundedSender<SessionCommand>,
    shared: Arc<SessionShared>,
    request_timeout: Duration,
}

impl Session {
    /// Connect over WebSocket and open `document_id`.
    ///
    /// Configuration is validated before any network activity. A failure at any step
    /// (TCP, upgrade, `OpenDoc`) releases the connection and returns the error.
    pub async fn connect(config: &ClientConfig, document_id: &str) -> QixClientResult<Self> {
        config.validate()?;
        check_document_id(document_id)?;

        let transport = WebSocketTransport::connect(config, document_id).await?;
        Self::connect_with_transport(Box::new(transport), config, document_id).await
    }

    /// Open `document_id` over an already connected transport
    pub async fn connect_with_transport(
        transport: BoxedTransport,
        config: &ClientConfig,
        document_id: &str,
    ) -> QixClientResult<Self> {
        check_document_id(document_id)?;

        let session = Self::spawn(transport, document_id, config.timeouts.request);

        match session.open_document(config.timeouts.open_document).await {
            Ok(handle) => {
                *session.shared.document_handle.write() = Some(handle);
                session.set_state(SessionState::Open);
                info!(
                    document_id = %document_id,
                    handle = %handle,
                    endpoint = %session.shared.endpoint,
                    "Document opened"
                );
                Ok(session)
            }
            Err(e) => {
                error!(document_id = %document_id, error = %e, "Failed to open document");
                session.disconnect().await;
                Err(e)
            }
        }
    }

    fn spawn(transport: BoxedTransport, document_id: &str, request_timeout: Duration) -> Self {
        let (commands, receiver) = mpsc::unbounded_channel();
        let shared = Arc::new(SessionShared {
            document_id: document_id.to_string(),
            endpoint: transport.connection_info().endpoint,
            state: RwLock::new(SessionState::Connecting),
            document_handle: RwLock::new(None),
        });

        let actor = SessionActor {
            transport,
            commands: receiver,
            shared: Arc::clone(&shared),
            next_id: 1,
            pending: HashMap::new(),
            timeouts: DelayQueue::new(),
        };
        tokio::spawn(actor.run());

        Self {
            commands,
            shared,
            request_timeout,
        }
    }

    async fn open_document(&self, timeout: Duration) -> QixClientResult<Handle> {
        let call = MethodCall::open_doc(&self.shared.document_id);
        let result = self
            .request(call.method.name(), Handle::GLOBAL, call.params, timeout)
            .await?;
        Ok(extract_handle(&result)?)
    }

    /// Send one request and wait for its reply or for `timeout` to elapse.
    ///
    /// Engine errors come back as [`QixClientError::Remote`]. A session that is closed,
    /// or closes while the request is pending, yields a session error.
    pub async fn request(
        &self,
        method: &str,
        handle: Handle,
        params: impl Into<RequestParams>,
        timeout: Duration,
    ) -> QixClientResult<Value> {
        if self.state() == SessionState::Closed {
            return Err(SessionError::Closed.into());
        }

        let (reply, response) = oneshot::channel();
        self.commands
            .send(SessionCommand::Request {
                method: method.to_string(),
                handle,
                params: params.into(),
                timeout,
                reply,
            })
            .map_err(|_| SessionError::Closed)?;

        response.await.map_err(|_| SessionError::Closed)?
    }

    /// Send a built method call with the default request timeout
    pub async fn call(&self, handle: Handle, call: MethodCall) -> QixClientResult<Value> {
        self.request(call.method.name(), handle, call.params, self.request_timeout)
            .await
    }

    /// Send a built method call with an explicit timeout
    pub async fn call_with_timeout(
        &self,
        handle: Handle,
        call: MethodCall,
        timeout: Duration,
    ) -> QixClientResult<Value> {
        self.request(call.method.name(), handle, call.params, timeout)
            .await
    }

    /// Close the connection and release every pending request. Calling it again is a no-op.
    pub async fn disconnect(&self) {
        let (done, closed) = oneshot::channel();
        if self.commands.send(SessionCommand::Close { done }).is_ok() {
            let _ = closed.await;
        }
        self.set_state(SessionState::Closed);
    }

    pub fn state(&self) -> SessionState {
        *self.shared.state.read()
    }

    pub fn is_open(&self) -> bool {
        self.state() == SessionState::Open
    }

    pub fn document_id(&self) -> &str {
        &self.shared.document_id
    }

    /// Root handle assigned by `OpenDoc`
    pub fn document_handle(&self) -> Option<Handle> {
        *self.shared.document_handle.read()
    }

    pub fn endpoint(&self) -> &str {
        &self.shared.endpoint
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    fn set_state(&self, state: SessionState) {
        let mut current = self.shared.state.write();
        if *current != SessionState::Closed {
            *current = state;
        }
    }
}

fn check_document_id(document_id: &str) -> QixClientResult<()> {
    if document_id.trim().is_empty() {
        return Err(QixClientError::config("document id is missing"));
    }
    Ok(())
}

struct PendingRequest {
    method: String,
    timeout: Duration,
    timeout_key: delay_queue::Key,
    reply: oneshot::Sender<QixClientResult<Value>>,
}

/// Why the actor loop ended
enum Shutdown {
    Requested(oneshot::Sender<()>),
    HandlesDropped,
    PeerClosed,
    TransportFailed(String),
}

struct SessionActor {
    transport: BoxedTransport,
    commands: mpsc::UnboundedReceiver<SessionCommand>,
    shared: Arc<SessionShared>,
    next_id: RequestId,
    pending: HashMap<RequestId, PendingRequest>,
    timeouts: DelayQueue<RequestId>,
}

impl SessionActor {
    async fn run(mut self) {
        debug!(document_id = %self.shared.document_id, "Session actor started");

        let shutdown = loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(SessionCommand::Request { method, handle, params, timeout, reply }) => {
                        self.dispatch(method, handle, params, timeout, reply).await;
                    }
                    Some(SessionCommand::Close { done }) => break Shutdown::Requested(done),
                    None => break Shutdown::HandlesDropped,
                },
                frame = self.transport.recv() => match frame {
                    Some(Ok(text)) => self.handle_frame(&text),
                    Some(Err(e)) => break Shutdown::TransportFailed(e.to_string()),
                    None => break Shutdown::PeerClosed,
                },
                Some(expired) = self.timeouts.next(), if !self.timeouts.is_empty() => {
                    self.expire(expired.into_inner());
                }
            }
        };

        self.shutdown(shutdown).await;
    }

    async fn dispatch(
        &mut self,
        method: String,
        handle: Handle,
        params: RequestParams,
        timeout: Duration,
        reply: oneshot::Sender<QixClientResult<Value>>,
    ) {
        if reply.is_closed() {
            return;
        }

        let id = self.next_id;
        self.next_id += 1;

        let frame = encode_request(&method, handle, params, id);
        let timeout = timeout.min(MAX_REQUEST_TIMEOUT);
        let timeout_key = self.timeouts.insert(id, timeout);

        debug!(request_id = id, method = %method, handle = %handle, "Sending request");

        if let Err(e) = self.transport.send(frame).await {
            warn!(request_id = id, method = %method, error = %e, "Failed to send request");
            self.timeouts.remove(&timeout_key);
            let _ = reply.send(Err(e));
            return;
        }

        self.pending.insert(
            id,
            PendingRequest {
                method,
                timeout,
                timeout_key,
                reply,
            },
        );
    }

    fn handle_frame(&mut self, text: &str) {
        let message = match decode_response(text) {
            Ok(message) => message,
            Err(e) if e.is_notification() => {
                debug!(error = %e, "Ignoring engine notification");
                return;
            }
            Err(e) => {
                warn!(error = %e, "Dropping undecodable frame");
                return;
            }
        };

        let id = message.id();
        let Some(pending) = self.pending.remove(&id) else {
            debug!(request_id = id, "Dropping reply for unknown or expired request");
            return;
        };
        self.timeouts.remove(&pending.timeout_key);

        let result = message.into_result().map_err(QixClientError::remote);
        if let Err(e) = &result {
            debug!(
                request_id = id,
                method = %pending.method,
                error = %e,
                "Engine returned an error"
            );
        }

        if pending.reply.send(result).is_err() {
            debug!(request_id = id, "Caller went away before the reply arrived");
        }
    }

    fn expire(&mut self, id: RequestId) {
        if let Some(pending) = self.pending.remove(&id) {
            warn!(
                request_id = id,
                method = %pending.method,
                timeout_ms = pending.timeout.as_millis() as u64,
                "Request timed out"
            );
            let _ = pending.reply.send(Err(QixClientError::Timeout {
                method: pending.method,
                request_id: id,
                timeout: pending.timeout,
            }));
        }
    }

    async fn shutdown(mut self, reason: Shutdown) {
        *self.shared.state.write() = SessionState::Closed;
        self.commands.close();

        if let Err(e) = self.transport.close().await {
            debug!(error = %e, "Transport close failed");
        }

        let release = |reason: &Shutdown| -> QixClientError {
            match reason {
                Shutdown::Requested(_) | Shutdown::HandlesDropped => SessionError::Closed.into(),
                Shutdown::PeerClosed => {
                    SessionError::ClosedWithReason("connection closed by engine".to_string())
                        .into()
                }
                Shutdown::TransportFailed(message) => {
                    SessionError::ClosedWithReason(message.clone()).into()
                }
            }
        };

        let released = self.pending.len();
        for (_, pending) in self.pending.drain() {
            let _ = pending.reply.send(Err(release(&reason)));
        }
        self.timeouts.clear();

        // Requests that raced with the shutdown
        while let Ok(command) = self.commands.try_recv() {
            match command {
                SessionCommand::Request { reply, .. } => {
                    let _ = reply.send(Err(release(&reason)));
                }
                SessionCommand::Close { done } => {
                    let _ = done.send(());
                }
            }
        }

        match reason {
            Shutdown::Requested(done) => {
                info!(document_id = %self.shared.document_id, released, "Session disconnected");
                let _ = done.send(());
            }
            Shutdown::HandlesDropped => {
                debug!(document_id = %self.shared.document_id, "All session handles dropped");
            }
            Shutdown::PeerClosed => {
                warn!(
                    document_id = %self.shared.document_id,
                    released,
                    "Engine closed the connection"
                );
            }
            Shutdown::TransportFailed(message) => {
                error!(
                    document_id = %self.shared.document_id,
                    released,
                    error = %message,
                    "Session lost"
                );
            }
        }
    }
}

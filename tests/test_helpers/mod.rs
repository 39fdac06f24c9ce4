//! Test Helpers Module for QIX Client Integration Tests
//!
//! A mock engine served over a real local WebSocket. It records the upgrade request and
//! every JSON-RPC request it receives, and answers the methods the client issues with
//! canned payloads. A few `EvaluateEx` expressions drive connection behaviour:
//!
//! - `never` gets no reply
//! - `hangup` makes the engine drop the connection
//! - `slow:<text>` is answered after a delay, so replies arrive out of order
//! - `later:<text>` is answered after a longer delay than `slow:`

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use futures::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::accept_hdr_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::StatusCode;
use tracing::debug;

use qix_client::{ClientConfig, TimeoutConfig};

pub const API_KEY: &str = "test-key";
pub const DOC_HANDLE: i64 = 1;
pub const OBJECT_HANDLE: i64 = 2;
pub const FIELD_HANDLE: i64 = 5;

const SLOW_REPLY: Duration = Duration::from_millis(150);
const LATER_REPLY: Duration = Duration::from_millis(400);

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Rows in every hypercube; `None` serves full pages forever
    pub total_rows: Option<u32>,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            total_rows: Some(2400),
        }
    }
}

/// What the engine saw during one WebSocket upgrade
#[derive(Debug, Clone, Default)]
pub struct Handshake {
    pub path: String,
    pub headers: HashMap<String, String>,
}

#[derive(Default)]
struct Recorded {
    connections: AtomicUsize,
    handshakes: Mutex<Vec<Handshake>>,
    requests: Mutex<Vec<Value>>,
}

pub struct MockEngine {
    addr: SocketAddr,
    recorded: Arc<Recorded>,
    task: JoinHandle<()>,
}

impl MockEngine {
    pub async fn start(options: EngineOptions) -> Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let recorded = Arc::new(Recorded::default());

        let task = tokio::spawn(accept_loop(listener, options, Arc::clone(&recorded)));
        debug!(%addr, "Mock engine listening");

        Ok(Self {
            addr,
            recorded,
            task,
        })
    }

    pub async fn start_default() -> Result<Self> {
        Self::start(EngineOptions::default()).await
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Client configuration pointing at this engine with short timeouts
    pub fn config(&self) -> ClientConfig {
        ClientConfig::new(self.base_url(), API_KEY).with_timeouts(TimeoutConfig {
            connect: Duration::from_secs(2),
            upgrade: Duration::from_secs(2),
            open_document: Duration::from_secs(2),
            request: Duration::from_secs(5),
        })
    }

    pub fn connections(&self) -> usize {
        self.recorded.connections.load(Ordering::SeqCst)
    }

    pub fn handshakes(&self) -> Vec<Handshake> {
        self.recorded.handshakes.lock().unwrap().clone()
    }

    /// Every request frame received for `method`, in arrival order
    pub fn requests(&self, method: &str) -> Vec<Value> {
        self.recorded
            .requests
            .lock()
            .unwrap()
            .iter()
            .filter(|request| request["method"] == method)
            .cloned()
            .collect()
    }

    /// `qTop`/`qHeight` of every page request, in arrival order
    pub fn page_requests(&self) -> Vec<(u64, u64)> {
        self.requests("GetHyperCubeData")
            .iter()
            .map(|request| {
                let page = &request["params"]["qPages"][0];
                (
                    page["qTop"].as_u64().unwrap_or_default(),
                    page["qHeight"].as_u64().unwrap_or_default(),
                )
            })
            .collect()
    }
}

impl Drop for MockEngine {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// A port nothing listens on
pub async fn closed_port_url() -> Result<String> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    drop(listener);
    Ok(format!("http://{}", addr))
}

async fn accept_loop(listener: TcpListener, options: EngineOptions, recorded: Arc<Recorded>) {
    while let Ok((stream, _)) = listener.accept().await {
        recorded.connections.fetch_add(1, Ordering::SeqCst);
        tokio::spawn(serve_connection(
            stream,
            options.clone(),
            Arc::clone(&recorded),
        ));
    }
}

enum Reply {
    Now(Value),
    After(Duration, Value),
    Never,
    Hangup,
}

async fn serve_connection(stream: TcpStream, options: EngineOptions, recorded: Arc<Recorded>) {
    let captured = Arc::new(Mutex::new(Handshake::default()));
    let capture = Arc::clone(&captured);
    let expected = format!("Bearer {}", API_KEY);

    let callback = move |request: &Request, response: Response| {
        let headers: HashMap<String, String> = request
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    value.to_str().unwrap_or_default().to_string(),
                )
            })
            .collect();
        let authorized = headers.get("authorization") == Some(&expected);

        *capture.lock().unwrap() = Handshake {
            path: request.uri().path().to_string(),
            headers,
        };

        if authorized {
            Ok(response)
        } else {
            let mut rejection = ErrorResponse::new(Some("invalid API key".to_string()));
            *rejection.status_mut() = StatusCode::UNAUTHORIZED;
            Err(rejection)
        }
    };

    let accepted = accept_hdr_async(stream, callback).await;
    let handshake = captured.lock().unwrap().clone();
    recorded.handshakes.lock().unwrap().push(handshake);

    let ws = match accepted {
        Ok(ws) => ws,
        Err(e) => {
            debug!(error = %e, "Mock engine rejected upgrade");
            return;
        }
    };

    let (mut sink, mut incoming) = ws.split();
    let (outgoing, mut queue) = mpsc::unbounded_channel::<Message>();
    let writer = tokio::spawn(async move {
        while let Some(message) = queue.recv().await {
            if sink.send(message).await.is_err() {
                break;
            }
        }
        let _ = sink.close().await;
    });

    let _ = outgoing.send(Message::text(
        json!({
            "jsonrpc": "2.0",
            "method": "OnConnected",
            "params": {"qSessionState": "SESSION_CREATED"}
        })
        .to_string(),
    ));

    while let Some(Ok(message)) = incoming.next().await {
        let text = match message {
            Message::Text(text) => text.as_str().to_string(),
            Message::Close(_) => break,
            _ => continue,
        };
        let Ok(request) = serde_json::from_str::<Value>(&text) else {
            continue;
        };
        recorded.requests.lock().unwrap().push(request.clone());

        let id = request["id"].clone();
        match reply_for(&options, &request) {
            Reply::Now(reply) => {
                let _ = outgoing.send(frame(&id, reply));
            }
            Reply::After(delay, reply) => {
                let outgoing = outgoing.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    let _ = outgoing.send(frame(&id, reply));
                });
            }
            Reply::Never => {}
            Reply::Hangup => break,
        }
    }

    drop(outgoing);
    let _ = writer.await;
}

/// `reply` is either `{"result": ...}` or `{"error": ...}`
fn frame(id: &Value, reply: Value) -> Message {
    let mut envelope = json!({"jsonrpc": "2.0", "id": id});
    if let (Some(envelope), Value::Object(members)) = (envelope.as_object_mut(), reply) {
        envelope.extend(members);
    }
    Message::text(envelope.to_string())
}

fn result(value: Value) -> Reply {
    Reply::Now(json!({ "result": value }))
}

fn error(code: i64, message: &str) -> Reply {
    Reply::Now(json!({ "error": {"code": code, "message": message} }))
}

fn cell(row: u32, column: u32) -> Value {
    if column == 0 {
        json!({
            "qText": format!("Region {}", row),
            "qNum": "NaN",
            "qElemNumber": row,
            "qState": "O"
        })
    } else {
        json!({"qText": format!("{}", row), "qNum": row, "qElemNumber": 0, "qState": "L"})
    }
}

fn reply_for(options: &EngineOptions, request: &Value) -> Reply {
    let params = &request["params"];

    match request["method"].as_str().unwrap_or_default() {
        "OpenDoc" if params["qDocName"] == "missing" => error(1002, "App not found"),
        "OpenDoc" => result(json!({"qReturn": {"qType": "Doc", "qHandle": DOC_HANDLE}})),
        "GetObjects" => result(json!({"qList": [
            {"qInfo": {"qId": "sheet-2", "qType": "sheet"}, "qMeta": {"title": "Sales"}},
            {"qInfo": {"qId": "sheet-1", "qType": "sheet"}, "qMeta": {"title": "Overview"}}
        ]})),
        "GetObject" if params["qId"] == "ghost" => error(2, "Object not found"),
        "GetObject" => result(json!({
            "qReturn": {"qType": "GenericObject", "qHandle": OBJECT_HANDLE}
        })),
        "GetLayout" => result(json!({"qLayout": {
            "qInfo": {"qId": "table-1", "qType": "table"},
            "qMeta": {"title": "Sales table"},
            "qChildList": {"qItems": [
                {"qInfo": {"qId": "table-1", "qType": "table"}, "qData": {"title": "Sales table"}},
                {"qInfo": {"qId": "kpi-1", "qType": "kpi"}, "qData": {"title": "Revenue"}}
            ]},
            "qHyperCube": {
                "qSize": {"qcx": 2, "qcy": options.total_rows.unwrap_or(u32::MAX)},
                "qDimensionInfo": [{"qFallbackTitle": "Region"}],
                "qMeasureInfo": [{"qFallbackTitle": "Revenue"}],
                "qDataPages": []
            }
        }})),
        "GetHyperCubeData" => {
            let page = &params["qPages"][0];
            let top = page["qTop"].as_u64().unwrap_or_default() as u32;
            let height = page["qHeight"].as_u64().unwrap_or_default() as u32;
            let rows = match options.total_rows {
                Some(total) => height.min(total.saturating_sub(top)),
                None => height,
            };
            let matrix: Vec<Value> = (top..top + rows)
                .map(|row| json!([cell(row, 0), cell(row, 1)]))
                .collect();
            result(json!({"qDataPages": [{
                "qMatrix": matrix,
                "qArea": {"qTop": top, "qLeft": 0, "qHeight": rows, "qWidth": 2}
            }]}))
        }
        "GetField" if params["qFieldName"] == "Missing" => error(2, "Field not found"),
        "GetField" => result(json!({"qReturn": {"qType": "Field", "qHandle": FIELD_HANDLE}})),
        "SelectValues" => result(json!({"qReturn": true})),
        "ClearAll" => result(json!({})),
        "EvaluateEx" => {
            let expression = params["qExpression"].as_str().unwrap_or_default();
            match expression {
                "never" => Reply::Never,
                "hangup" => Reply::Hangup,
                "Sum(Revenue)" => result(json!({
                    "qValue": {"qText": "2 878 800", "qIsNumeric": true, "qNumber": 2878800}
                })),
                _ => {
                    let (delay, text) = if let Some(text) = expression.strip_prefix("slow:") {
                        (Some(SLOW_REPLY), text)
                    } else if let Some(text) = expression.strip_prefix("later:") {
                        (Some(LATER_REPLY), text)
                    } else {
                        (None, expression)
                    };
                    let reply = json!({
                        "result": {"qValue": {"qText": text, "qIsNumeric": false, "qNumber": 0}}
                    });
                    match delay {
                        Some(delay) => Reply::After(delay, reply),
                        None => Reply::Now(reply),
                    }
                }
            }
        }
        _ => error(-32601, "Method not found"),
    }
}

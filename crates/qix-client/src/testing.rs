//! Scripted in-memory engine for unit tests

use serde_json::{Value, json};
use tokio::task::JoinHandle;

use crate::config::ClientConfig;
use crate::document::{Document, DocumentBuilder};
use crate::transport::ChannelTransport;
use crate::transport::channel::ChannelPeer;

pub(crate) const DOC_HANDLE: i64 = 1;
pub(crate) const OBJECT_HANDLE: i64 = 2;
pub(crate) const FIELD_HANDLE: i64 = 5;

/// Engine behaviour; `total_rows: None` serves full pages forever
#[derive(Debug, Clone, Copy)]
pub(crate) struct Script {
    pub total_rows: Option<u32>,
    pub select_accepted: bool,
    /// Pages starting at or after this row carry an unreadable matrix
    pub malformed_from: Option<u32>,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            total_rows: Some(0),
            select_accepted: true,
            malformed_from: None,
        }
    }
}

fn cell(row: u32, column: u32) -> Value {
    if column == 0 {
        json!({
            "qText": format!("row-{}", row),
            "qNum": "NaN",
            "qElemNumber": row,
            "qState": "O"
        })
    } else {
        json!({
            "qText": format!("{}", row * 10),
            "qNum": row * 10,
            "qElemNumber": 0,
            "qState": "L"
        })
    }
}

fn answer(script: &Script, method: &str, params: &Value) -> Value {
    match method {
        "OpenDoc" => json!({"qReturn": {"qType": "Doc", "qHandle": DOC_HANDLE}}),
        "GetObjects" => json!({"qList": [
            {"qInfo": {"qId": "sheet-b", "qType": "sheet"}, "qMeta": {"title": "Overview"}},
            {"qInfo": {"qId": "sheet-a", "qType": "sheet"}, "qMeta": {"title": "Details"}}
        ]}),
        "GetObject" => json!({"qReturn": {"qType": "GenericObject", "qHandle": OBJECT_HANDLE}}),
        "GetLayout" => json!({"qLayout": {
            "qInfo": {"qId": "chart-1", "qType": "table"},
            "title": "Sales by region",
            "qChildList": {"qItems": [
                {"qInfo": {"qId": "kpi-1", "qType": "kpi"}, "qData": {"title": "Total"}},
                {
                    "qInfo": {"qId": "chart-1", "qType": "table"},
                    "qData": {"title": "Sales by region"}
                }
            ]},
            "qHyperCube": {
                "qSize": {"qcx": 2, "qcy": script.total_rows.unwrap_or(u32::MAX)},
                "qDimensionInfo": [{"qFallbackTitle": "Region"}],
                "qMeasureInfo": [{"qFallbackTitle": "Sales"}],
                "qDataPages": []
            }
        }}),
        "GetHyperCubeData" => {
            let page = &params["qPages"][0];
            let top = page["qTop"].as_u64().unwrap_or(0) as u32;
            let height = page["qHeight"].as_u64().unwrap_or(0) as u32;
            let rows = match script.total_rows {
                Some(total) => height.min(total.saturating_sub(top)),
                None => height,
            };
            if script.malformed_from.is_some_and(|from| top >= from) {
                return json!({"qDataPages": [{"qMatrix": {"rows": rows}}]});
            }
            let matrix: Vec<Value> = (top..top + rows)
                .map(|row| Value::Array(vec![cell(row, 0), cell(row, 1)]))
                .collect();
            json!({"qDataPages": [{
                "qMatrix": matrix,
                "qArea": {"qTop": top, "qLeft": 0, "qHeight": rows, "qWidth": 2}
            }]})
        }
        "GetField" => json!({"qReturn": {"qType": "Field", "qHandle": FIELD_HANDLE}}),
        "SelectValues" => json!({"qReturn": script.select_accepted}),
        "ClearAll" => json!({}),
        "EvaluateEx" => json!({"qValue": {"qText": "1 234", "qIsNumeric": true, "qNumber": 1234}}),
        _ => Value::Null,
    }
}

/// Serve `peer` until the client hangs up; returns every request frame received
pub(crate) fn serve(mut peer: ChannelPeer, script: Script) -> JoinHandle<Vec<Value>> {
    tokio::spawn(async move {
        let mut seen = Vec::new();
        while let Some(frame) = peer.recv_json().await {
            let id = frame["id"].as_u64().unwrap_or(0);
            let method = frame["method"].as_str().unwrap_or_default().to_string();

            if method == "GetField" && frame["params"]["qFieldName"] == "Missing" {
                peer.reply_error(id, 2, "Field not found");
            } else {
                peer.reply(id, answer(&script, &method, &frame["params"]));
            }
            seen.push(frame);
        }
        seen
    })
}

/// A document open against a scripted engine
pub(crate) async fn open_document(script: Script) -> (Document, JoinHandle<Vec<Value>>) {
    let (transport, peer) = ChannelTransport::pair();
    let engine = serve(peer, script);

    let document = DocumentBuilder::new()
        .with_config(ClientConfig::default())
        .with_transport(Box::new(transport))
        .open("doc-1")
        .await
        .unwrap();

    (document, engine)
}

/// Close the document and collect the frames for `method`
pub(crate) async fn requests_for(
    document: Document,
    engine: JoinHandle<Vec<Value>>,
    method: &str,
) -> Vec<Value> {
    document.close().await;
    engine
        .await
        .unwrap()
        .into_iter()
        .filter(|frame| frame["method"] == method)
        .collect()
}

//! Turning engine results into typed records.

use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use qix_json_rpc::Handle;

use crate::layout::{GenericObjectLayout, NxCell, NxContainerEntry};
use crate::value::ScalarValue;

#[derive(Debug, Error)]
pub enum ExtractError {
    /// `qReturn.qHandle` is absent or not an integer
    #[error("Result carries no object handle")]
    NoHandle,

    #[error("Result is missing '{0}'")]
    Missing(&'static str),

    #[error("Unexpected shape for '{member}': {source}")]
    Shape {
        member: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// Handle from `qReturn.qHandle` (`OpenDoc`, `GetObject`, `GetField`)
pub fn extract_handle(result: &Value) -> Result<Handle, ExtractError> {
    result
        .get("qReturn")
        .and_then(|ret| ret.get("qHandle"))
        .and_then(Value::as_i64)
        .map(Handle::new)
        .ok_or(ExtractError::NoHandle)
}

/// Row matrix of the first data page.
///
/// An absent page or matrix yields no rows; a matrix that is present but malformed is an
/// error rather than an end-of-data signal.
pub fn extract_hypercube_matrix(result: &Value) -> Result<Vec<Vec<NxCell>>, ExtractError> {
    let matrix = result
        .get("qDataPages")
        .and_then(|pages| pages.get(0))
        .and_then(|page| page.get("qMatrix"))
        .filter(|matrix| !matrix.is_null());

    match matrix {
        Some(matrix) => serde_json::from_value(matrix.clone()).map_err(|source| {
            ExtractError::Shape {
                member: "qMatrix",
                source,
            }
        }),
        None => Ok(Vec::new()),
    }
}

/// Entries of a `GetObjects` result (`qList`), in server order
pub fn extract_object_list(result: &Value) -> Result<Vec<NxContainerEntry>, ExtractError> {
    member(result, "qList")
}

/// `qLayout` of a `GetLayout` result
pub fn extract_layout(result: &Value) -> Result<GenericObjectLayout, ExtractError> {
    member(result, "qLayout")
}

/// Boolean `qReturn` (`SelectValues`, `ClearAll`); a result without one counts as accepted
pub fn extract_bool_return(result: &Value) -> bool {
    result
        .get("qReturn")
        .and_then(Value::as_bool)
        .unwrap_or(true)
}

/// Normalize an evaluation result into one scalar.
///
/// Accepts a bare scalar, `{qReturn: ...}`, `{qValue: ...}` and the wrapped cell shapes
/// `{qIsNumeric, qNumber, qText}` and `{qNum, qText}`.
pub fn extract_scalar(result: &Value) -> ScalarValue {
    match result {
        Value::Null => ScalarValue::Null,
        Value::Bool(flag) => ScalarValue::Number(if *flag { 1.0 } else { 0.0 }),
        Value::Number(number) => number
            .as_f64()
            .map(ScalarValue::Number)
            .unwrap_or(ScalarValue::Null),
        Value::String(text) => ScalarValue::Text(text.clone()),
        Value::Array(_) => ScalarValue::Text(result.to_string()),
        Value::Object(map) => {
            if let Some(inner) = map.get("qValue").or_else(|| map.get("qReturn")) {
                return extract_scalar(inner);
            }

            if map.get("qIsNull").and_then(Value::as_bool) == Some(true) {
                return ScalarValue::Null;
            }

            let text = map.get("qText").and_then(Value::as_str);
            let numeric = map.get("qIsNumeric").and_then(Value::as_bool);
            let number = map
                .get("qNumber")
                .or_else(|| map.get("qNum"))
                .and_then(Value::as_f64)
                .filter(|n| n.is_finite());

            match (numeric, number, text) {
                (Some(false), _, Some(text)) => ScalarValue::Text(text.to_string()),
                (Some(false), _, None) => ScalarValue::Null,
                (_, Some(number), _) => ScalarValue::Number(number),
                (_, None, Some(text)) => ScalarValue::Text(text.to_string()),
                (_, None, None) => ScalarValue::Null,
            }
        }
    }
}

fn member<T: DeserializeOwned>(result: &Value, name: &'static str) -> Result<T, ExtractError> {
    let value = result.get(name).ok_or(ExtractError::Missing(name))?;
    serde_json::from_value(value.clone()).map_err(|source| ExtractError::Shape {
        member: name,
        source,
    })
}

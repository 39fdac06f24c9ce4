//! Engine methods used by the client and their parameter shapes.

use serde_json::{Value, json};
use std::fmt;

use crate::SHEET_OBJECT_TYPE;
use crate::page::NxPage;
use crate::value::ScalarValue;

/// Which kind of handle a method is invoked on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleTarget {
    /// The Global object (handle -1)
    Global,
    /// The handle returned by `OpenDoc`
    Document,
    /// A handle returned by `GetObject`
    Object,
    /// A handle returned by `GetField`
    Field,
}

/// Engine methods the client calls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QixMethod {
    OpenDoc,
    GetObjects,
    GetObject,
    GetLayout,
    GetHyperCubeData,
    GetField,
    SelectValues,
    ClearAll,
    EvaluateEx,
}

impl QixMethod {
    pub const ALL: [QixMethod; 9] = [
        QixMethod::OpenDoc,
        QixMethod::GetObjects,
        QixMethod::GetObject,
        QixMethod::GetLayout,
        QixMethod::GetHyperCubeData,
        QixMethod::GetField,
        QixMethod::SelectValues,
        QixMethod::ClearAll,
        QixMethod::EvaluateEx,
    ];

    /// Wire name
    pub fn name(&self) -> &'static str {
        match self {
            QixMethod::OpenDoc => "OpenDoc",
            QixMethod::GetObjects => "GetObjects",
            QixMethod::GetObject => "GetObject",
            QixMethod::GetLayout => "GetLayout",
            QixMethod::GetHyperCubeData => "GetHyperCubeData",
            QixMethod::GetField => "GetField",
            QixMethod::SelectValues => "SelectValues",
            QixMethod::ClearAll => "ClearAll",
            QixMethod::EvaluateEx => "EvaluateEx",
        }
    }

    pub fn target(&self) -> HandleTarget {
        match self {
            QixMethod::OpenDoc => HandleTarget::Global,
            QixMethod::GetObjects
            | QixMethod::GetObject
            | QixMethod::GetField
            | QixMethod::ClearAll
            | QixMethod::EvaluateEx => HandleTarget::Document,
            QixMethod::GetLayout | QixMethod::GetHyperCubeData => HandleTarget::Object,
            QixMethod::SelectValues => HandleTarget::Field,
        }
    }

    /// Whether the result carries `qReturn.qHandle`
    pub fn returns_handle(&self) -> bool {
        matches!(
            self,
            QixMethod::OpenDoc | QixMethod::GetObject | QixMethod::GetField
        )
    }
}

impl fmt::Display for QixMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A method together with its parameters, ready to be sent on a handle
#[derive(Debug, Clone, PartialEq)]
pub struct MethodCall {
    pub method: QixMethod,
    pub params: Value,
}

impl MethodCall {
    pub fn new(method: QixMethod, params: Value) -> Self {
        Self { method, params }
    }

    pub fn open_doc(document_id: &str) -> Self {
        Self::new(QixMethod::OpenDoc, json!({ "qDocName": document_id }))
    }

    /// List objects of the given types on the document
    pub fn get_objects(types: &[&str]) -> Self {
        Self::new(
            QixMethod::GetObjects,
            json!({
                "qOptions": {
                    "qTypes": types,
                    "qIncludeSessionObjects": false,
                    "qData": {}
                }
            }),
        )
    }

    pub fn get_sheets() -> Self {
        Self::get_objects(&[SHEET_OBJECT_TYPE])
    }

    pub fn get_object(object_id: &str) -> Self {
        Self::new(QixMethod::GetObject, json!({ "qId": object_id }))
    }

    pub fn get_layout() -> Self {
        Self::new(QixMethod::GetLayout, json!({}))
    }

    /// Request one page; `None` uses the default page window
    pub fn get_hypercube_data(path: &str, page: Option<NxPage>) -> Self {
        let page = page.unwrap_or_default();
        Self::new(
            QixMethod::GetHyperCubeData,
            json!({
                "qPath": path,
                "qPages": [page]
            }),
        )
    }

    pub fn get_field(field_name: &str) -> Self {
        Self::new(QixMethod::GetField, json!({ "qFieldName": field_name }))
    }

    /// Select values by their display text, replacing the current selection in the field
    pub fn select_values(values: &[ScalarValue]) -> Self {
        let field_values: Vec<Value> = values
            .iter()
            .map(|value| {
                json!({
                    "qText": value.display_text(),
                    "qIsNumeric": false,
                    "qNumber": 0
                })
            })
            .collect();

        Self::new(
            QixMethod::SelectValues,
            json!({
                "qFieldValues": field_values,
                "qToggleMode": false,
                "qSoftLock": false
            }),
        )
    }

    pub fn clear_all() -> Self {
        Self::new(QixMethod::ClearAll, json!({ "qLockedAlso": false }))
    }

    pub fn evaluate(expression: &str) -> Self {
        Self::new(QixMethod::EvaluateEx, json!({ "qExpression": expression }))
    }
}

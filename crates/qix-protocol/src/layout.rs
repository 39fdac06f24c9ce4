//! Layout records returned by `GetObjects` and `GetLayout`.
//!
//! The engine returns deep, loosely-typed JSON. Only the members the client reads are
//! modelled; every one of them is optional or defaulted so a missing member is a value,
//! not a parse failure.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::page::NxPage;
use crate::value::ScalarValue;

/// Identity of a generic object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NxInfo {
    pub q_id: String,
    #[serde(default)]
    pub q_type: String,
}

/// Object metadata (sheet titles live here)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NxMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// One entry of an object listing or of a sheet's child list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NxContainerEntry {
    pub q_info: NxInfo,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub q_meta: Option<NxMeta>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub q_data: Option<Value>,
}

impl NxContainerEntry {
    pub fn id(&self) -> &str {
        &self.q_info.q_id
    }

    pub fn object_type(&self) -> &str {
        &self.q_info.q_type
    }

    /// Title from the metadata, falling back to a `title` member of the data block
    pub fn title(&self) -> Option<&str> {
        self.q_meta
            .as_ref()
            .and_then(|meta| meta.title.as_deref())
            .or_else(|| {
                self.q_data
                    .as_ref()
                    .and_then(|data| data.get("title"))
                    .and_then(Value::as_str)
            })
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildList {
    #[serde(default)]
    pub q_items: Vec<NxContainerEntry>,
}

/// Hypercube dimensions: columns x rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NxSize {
    #[serde(rename = "qcx", default)]
    pub columns: u32,
    #[serde(rename = "qcy", default)]
    pub rows: u32,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DimensionInfo {
    #[serde(default)]
    pub q_fallback_title: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasureInfo {
    #[serde(default)]
    pub q_fallback_title: String,
}

/// One hypercube cell
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NxCell {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub q_text: Option<String>,
    /// A number, or the string `"NaN"` for non-numeric cells
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub q_num: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub q_elem_number: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub q_state: Option<String>,
    #[serde(default)]
    pub q_is_null: bool,
}

impl NxCell {
    /// Display string of the cell
    pub fn text(&self) -> &str {
        self.q_text.as_deref().unwrap_or_default()
    }

    /// Raw value: the number when the cell has one, otherwise its text
    pub fn value(&self) -> ScalarValue {
        if self.q_is_null {
            return ScalarValue::Null;
        }

        match self.q_num.as_ref().and_then(Value::as_f64) {
            Some(number) if number.is_finite() => ScalarValue::Number(number),
            _ => self
                .q_text
                .clone()
                .map(ScalarValue::Text)
                .unwrap_or(ScalarValue::Null),
        }
    }
}

/// One data page of a hypercube
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NxDataPage {
    #[serde(default)]
    pub q_matrix: Vec<Vec<NxCell>>,
    #[serde(default)]
    pub q_area: Option<NxPage>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HyperCubeLayout {
    #[serde(default)]
    pub q_size: NxSize,
    #[serde(default)]
    pub q_dimension_info: Vec<DimensionInfo>,
    #[serde(default)]
    pub q_measure_info: Vec<MeasureInfo>,
    #[serde(default)]
    pub q_data_pages: Vec<NxDataPage>,
}

impl HyperCubeLayout {
    /// Column labels: dimensions first, then measures, as the engine orders matrix cells
    pub fn column_labels(&self) -> Vec<String> {
        self.q_dimension_info
            .iter()
            .map(|dimension| dimension.q_fallback_title.clone())
            .chain(
                self.q_measure_info
                    .iter()
                    .map(|measure| measure.q_fallback_title.clone()),
            )
            .collect()
    }

    /// Column count, from `qSize` or from the declared dimensions and measures
    pub fn column_count(&self) -> u32 {
        if self.q_size.columns > 0 {
            self.q_size.columns
        } else {
            (self.q_dimension_info.len() + self.q_measure_info.len()) as u32
        }
    }
}

/// Layout of a generic object (sheet, chart, table ...)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenericObjectLayout {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub q_info: Option<NxInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub q_meta: Option<NxMeta>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub q_child_list: Option<ChildList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub q_hyper_cube: Option<HyperCubeLayout>,
}

impl GenericObjectLayout {
    /// Child items in server order; empty when the object has no child list
    pub fn children(&self) -> &[NxContainerEntry] {
        self.q_child_list
            .as_ref()
            .map(|list| list.q_items.as_slice())
            .unwrap_or_default()
    }
}

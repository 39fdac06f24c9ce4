//! Extraction results built from collected hypercube pages.

use serde::{Deserialize, Serialize};

use crate::layout::{HyperCubeLayout, NxCell, NxDataPage};
use crate::value::ScalarValue;

/// Output shape of an extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// The pages as the engine returned them
    Raw,
    /// Labelled rows of display text and raw values
    #[default]
    Formatted,
}

/// One formatted row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HyperCubeRow {
    pub text: Vec<String>,
    pub values: Vec<ScalarValue>,
}

impl HyperCubeRow {
    pub fn from_cells(cells: &[NxCell]) -> Self {
        Self {
            text: cells.iter().map(|cell| cell.text().to_string()).collect(),
            values: cells.iter().map(NxCell::value).collect(),
        }
    }
}

/// Formatted extraction result. Rows keep server matrix order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HyperCubeResult {
    pub headers: Vec<String>,
    pub rows: Vec<HyperCubeRow>,
    /// Rows actually collected
    pub total_rows: usize,
    /// Collection stopped at the row cap rather than at the end of data
    pub truncated: bool,
}

impl HyperCubeResult {
    pub fn from_rows(layout: &HyperCubeLayout, rows: &[Vec<NxCell>], truncated: bool) -> Self {
        let rows: Vec<HyperCubeRow> = rows
            .iter()
            .map(|cells| HyperCubeRow::from_cells(cells))
            .collect();

        Self {
            headers: layout.column_labels(),
            total_rows: rows.len(),
            rows,
            truncated,
        }
    }
}

/// Raw extraction result: one entry per page requested that returned rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawHyperCube {
    pub pages: Vec<NxDataPage>,
    pub total_rows: usize,
    pub truncated: bool,
}

impl RawHyperCube {
    pub fn new(pages: Vec<NxDataPage>, truncated: bool) -> Self {
        let total_rows = pages.iter().map(|page| page.q_matrix.len()).sum();
        Self {
            pages,
            total_rows,
            truncated,
        }
    }

    /// All rows across pages, in order
    pub fn rows(&self) -> impl Iterator<Item = &Vec<NxCell>> {
        self.pages.iter().flat_map(|page| page.q_matrix.iter())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "format", rename_all = "lowercase")]
pub enum HyperCubeOutput {
    Raw(RawHyperCube),
    Formatted(HyperCubeResult),
}

impl HyperCubeOutput {
    pub fn total_rows(&self) -> usize {
        match self {
            HyperCubeOutput::Raw(raw) => raw.total_rows,
            HyperCubeOutput::Formatted(result) => result.total_rows,
        }
    }

    pub fn is_truncated(&self) -> bool {
        match self {
            HyperCubeOutput::Raw(raw) => raw.truncated,
            HyperCubeOutput::Formatted(result) => result.truncated,
        }
    }

    pub fn into_formatted(self) -> Option<HyperCubeResult> {
        match self {
            HyperCubeOutput::Formatted(result) => Some(result),
            HyperCubeOutput::Raw(_) => None,
        }
    }

    pub fn into_raw(self) -> Option<RawHyperCube> {
        match self {
            HyperCubeOutput::Raw(raw) => Some(raw),
            HyperCubeOutput::Formatted(_) => None,
        }
    }
}

//! # QIX Engine Protocol Types
//!
//! Typed records for the engine payloads a data-extraction client needs, the request
//! parameter builders for each engine method it calls, and the extractors that turn
//! loosely-shaped results into those records.
//!
//! Everything here is pure: no I/O, no session state. "Shape absent" is always a checked
//! condition, either an [`ExtractError`] or an empty collection where the protocol uses
//! absence as a signal (an empty data page ends pagination).
//!
//! ## Usage
//!
//! ```rust
//! use qix_protocol::prelude::*;
//! use serde_json::json;
//!
//! let call = MethodCall::get_object("chart-1");
//! assert_eq!(call.method.name(), "GetObject");
//!
//! let handle = extract_handle(&json!({"qReturn": {"qType": "GenericObject", "qHandle": 4}}));
//! assert_eq!(handle.unwrap().value(), 4);
//! ```

pub mod extract;
pub mod hypercube;
pub mod layout;
pub mod methods;
pub mod page;
pub mod prelude;
pub mod value;

// Re-export main types
pub use extract::{
    ExtractError, extract_bool_return, extract_handle, extract_hypercube_matrix, extract_layout,
    extract_object_list, extract_scalar,
};
pub use hypercube::{HyperCubeOutput, HyperCubeResult, HyperCubeRow, OutputFormat, RawHyperCube};
pub use layout::{
    ChildList, DimensionInfo, GenericObjectLayout, HyperCubeLayout, MeasureInfo, NxCell,
    NxContainerEntry, NxDataPage, NxInfo, NxMeta, NxSize,
};
pub use methods::{HandleTarget, MethodCall, QixMethod};
pub use page::{DEFAULT_HYPERCUBE_PATH, DEFAULT_PAGE_HEIGHT, DEFAULT_PAGE_WIDTH, NxPage, PageCursor};
pub use value::ScalarValue;

pub use qix_json_rpc::Handle;

/// Object type of sheets in `GetObjects` listings
pub const SHEET_OBJECT_TYPE: &str = "sheet";

//! # QIX Protocol Prelude
//!
//! ```rust
//! use qix_protocol::prelude::*;
//! ```

pub use crate::extract::{
    ExtractError, extract_bool_return, extract_handle, extract_hypercube_matrix, extract_layout,
    extract_object_list, extract_scalar,
};
pub use crate::hypercube::{
    HyperCubeOutput, HyperCubeResult, HyperCubeRow, OutputFormat, RawHyperCube,
};
pub use crate::layout::{GenericObjectLayout, HyperCubeLayout, NxCell, NxContainerEntry};
pub use crate::methods::{MethodCall, QixMethod};
pub use crate::page::{NxPage, PageCursor};
pub use crate::value::ScalarValue;

pub use qix_json_rpc::Handle;

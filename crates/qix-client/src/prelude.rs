//! # QIX Client Prelude
//!
//! Convenient re-exports of the most commonly used client types.
//!
//! ```rust
//! use qix_client::prelude::*;
//! ```

// Core client types
pub use crate::config::{ClientConfig, ConnectionConfig, RetryConfig, TimeoutConfig};
pub use crate::document::{ConnectionStatus, Document, DocumentBuilder, HyperCubeQuery};
pub use crate::error::{ErrorKind, QixClientError, QixClientResult};
pub use crate::session::{Session, SessionState};
pub use crate::streaming::PageRows;

// Transport types
pub use crate::transport::{BoxedTransport, Transport, TransportType};

// Re-export protocol types for convenience
pub use qix_protocol::prelude::*;

pub use std::time::Duration;

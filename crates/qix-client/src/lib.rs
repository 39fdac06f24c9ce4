//! # QIX Client Library
//!
//! An async client for the QIX engine protocol: JSON-RPC 2.0 over one WebSocket
//! connection per analytic document. It opens a document, navigates sheets and their
//! objects, pulls hypercube rows page by page, applies and clears selections and
//! evaluates expressions, with any number of requests in flight at once.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use qix_client::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ClientConfig::from_env()?;
//!     let document = Document::open(&config, "3f1c2a-sales").await?;
//!
//!     for sheet in document.list_sheets().await? {
//!         println!("{} {:?}", sheet.id(), sheet.title());
//!     }
//!
//!     let query = HyperCubeQuery::new().with_max_rows(5_000);
//!     let output = document.get_hypercube_data("chart-1", &query).await?;
//!     println!("{} rows (truncated: {})", output.total_rows(), output.is_truncated());
//!
//!     document.close().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Streaming
//!
//! ```rust,no_run
//! # use qix_client::prelude::*;
//! # async fn example(document: &Document) -> QixClientResult<()> {
//! use futures::TryStreamExt;
//!
//! let mut pages = Box::pin(document.stream_hypercube_data("chart-1", 500, "/qHyperCubeDef"));
//! while let Some(rows) = pages.try_next().await? {
//!     println!("{} rows", rows.len());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Classes
//!
//! [`QixClientError::kind`] reports one of three classes: configuration problems found
//! before any I/O, network failures (including engine errors and timeouts) and protocol
//! violations in engine replies.

pub mod config;
pub mod document;
pub mod error;
pub mod prelude;
pub mod session;
pub mod streaming;
pub mod transport;

#[cfg(test)]
mod testing;

// Re-export main types
pub use config::{ClientConfig, ConnectionConfig, RetryConfig, TimeoutConfig};
pub use document::{ConnectionStatus, Document, DocumentBuilder, HyperCubeQuery};
pub use error::{
    ErrorKind, ProtocolError, QixClientError, QixClientResult, SessionError, TransportError,
};
pub use session::{Session, SessionState};
pub use transport::{BoxedTransport, Transport, TransportType};

// Re-export protocol crates for convenience
pub use qix_json_rpc;
pub use qix_protocol;

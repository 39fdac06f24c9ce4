//! Document-level API over a session

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use qix_protocol::{
    DEFAULT_HYPERCUBE_PATH, DEFAULT_PAGE_HEIGHT, GenericObjectLayout, Handle, HyperCubeOutput,
    HyperCubeResult, MethodCall, NxCell, NxContainerEntry, NxDataPage, NxPage, OutputFormat,
    PageCursor, RawHyperCube, ScalarValue, extract_bool_return, extract_handle,
    extract_hypercube_matrix, extract_layout, extract_object_list, extract_scalar,
};

use crate::config::ClientConfig;
use crate::error::{QixClientResult, SessionError};
use crate::session::{Session, SessionState};
use crate::transport::BoxedTransport;

/// Default cap on rows collected by one extraction
pub const DEFAULT_MAX_ROWS: u32 = 10_000;

/// Parameters of a hypercube extraction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HyperCubeQuery {
    /// Rows requested per page
    pub page_size: u32,
    /// Stop once this many rows are collected
    pub max_rows: u32,
    /// Path of the hypercube definition inside the object properties
    pub path: String,
    pub format: OutputFormat,
}

impl Default for HyperCubeQuery {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_HEIGHT,
            max_rows: DEFAULT_MAX_ROWS,
            path: DEFAULT_HYPERCUBE_PATH.to_string(),
            format: OutputFormat::Formatted,
        }
    }
}

impl HyperCubeQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_max_rows(mut self, max_rows: u32) -> Self {
        self.max_rows = max_rows;
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }
}

/// An open engine document.
///
/// Every operation runs on the shared [`Session`]; clones of a `Document` issue requests
/// concurrently over the same connection.
#[derive(Debug, Clone)]
pub struct Document {
    session: Session,
    handle: Handle,
}

impl Document {
    /// Connect and open `document_id` with a single attempt
    pub async fn open(config: &ClientConfig, document_id: &str) -> QixClientResult<Self> {
        let session = Session::connect(config, document_id).await?;
        Self::from_session(session)
    }

    /// Connect and open `document_id`, retrying network failures per `config.retry`.
    ///
    /// Each attempt is a fresh connection; configuration and engine errors are returned
    /// without retrying.
    pub async fn open_with_retry(
        config: &ClientConfig,
        document_id: &str,
    ) -> QixClientResult<Self> {
        config.validate()?;

        let mut attempt = 0;
        loop {
            attempt += 1;
            match Self::open(config, document_id).await {
                Ok(document) => return Ok(document),
                Err(e) if e.is_retryable() && config.retry.should_retry(attempt) => {
                    let delay = config.retry.delay_for_attempt(attempt);
                    warn!(
                        document_id = %document_id,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Opening document failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Wrap a session whose document is already open
    pub fn from_session(session: Session) -> QixClientResult<Self> {
        let handle = session.document_handle().ok_or(SessionError::Closed)?;
        Ok(Self { session, handle })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Root handle of the document
    pub fn handle(&self) -> Handle {
        self.handle
    }

    pub fn document_id(&self) -> &str {
        self.session.document_id()
    }

    pub fn connection_status(&self) -> ConnectionStatus {
        ConnectionStatus {
            document_id: self.session.document_id().to_string(),
            endpoint: self.session.endpoint().to_string(),
            state: self.session.state(),
            document_handle: self.session.document_handle(),
        }
    }

    /// Disconnect the underlying session
    pub async fn close(&self) {
        self.session.disconnect().await;
    }

    /// Sheets of the document, in server order
    pub async fn list_sheets(&self) -> QixClientResult<Vec<NxContainerEntry>> {
        debug!(document_id = %self.document_id(), "Listing sheets");

        let result = self.session.call(self.handle, MethodCall::get_sheets()).await?;
        let sheets = extract_object_list(&result)?;

        debug!(count = sheets.len(), "Retrieved sheets");
        Ok(sheets)
    }

    /// Child objects of a sheet, in server order
    pub async fn list_objects(&self, sheet_id: &str) -> QixClientResult<Vec<NxContainerEntry>> {
        debug!(sheet_id = sheet_id, "Listing sheet objects");

        let layout = self.get_layout(sheet_id).await?;
        let objects = layout.children().to_vec();

        debug!(sheet_id = sheet_id, count = objects.len(), "Retrieved sheet objects");
        Ok(objects)
    }

    /// Typed layout of a generic object
    pub async fn get_layout(&self, object_id: &str) -> QixClientResult<GenericObjectLayout> {
        let handle = self.object_handle(object_id).await?;
        self.layout_of(handle).await
    }

    /// Collect hypercube rows page by page, up to `query.max_rows`
    pub async fn get_hypercube_data(
        &self,
        object_id: &str,
        query: &HyperCubeQuery,
    ) -> QixClientResult<HyperCubeOutput> {
        debug!(
            object_id = object_id,
            page_size = query.page_size,
            max_rows = query.max_rows,
            "Extracting hypercube"
        );

        let handle = self.object_handle(object_id).await?;
        let cube = self
            .layout_of(handle)
            .await?
            .q_hyper_cube
            .unwrap_or_default();

        let mut cursor = PageCursor::new(query.page_size)
            .with_max_rows(query.max_rows)
            .with_width(cube.column_count());
        let mut pages = Vec::new();

        while let Some(page) = cursor.next_page() {
            let mut rows = self.fetch_rows(handle, &query.path, page).await?;
            let kept = cursor.record(&page, rows.len());
            if kept == 0 {
                break;
            }
            rows.truncate(kept);

            pages.push(NxDataPage {
                q_matrix: rows,
                q_area: Some(NxPage {
                    q_height: kept as u32,
                    ..page
                }),
            });
        }

        let truncated = cursor.is_truncated();
        info!(
            object_id = object_id,
            rows = cursor.rows_fetched(),
            pages = cursor.pages_requested(),
            truncated,
            "Hypercube extracted"
        );

        Ok(match query.format {
            OutputFormat::Raw => HyperCubeOutput::Raw(RawHyperCube::new(pages, truncated)),
            OutputFormat::Formatted => {
                let rows: Vec<Vec<NxCell>> =
                    pages.into_iter().flat_map(|page| page.q_matrix).collect();
                HyperCubeOutput::Formatted(HyperCubeResult::from_rows(&cube, &rows, truncated))
            }
        })
    }

    /// Select `values` in a field by display text. Returns whether the engine accepted it.
    ///
    /// The field handle is looked up on every call.
    pub async fn select_values(
        &self,
        field_name: &str,
        values: &[ScalarValue],
    ) -> QixClientResult<bool> {
        debug!(field = field_name, count = values.len(), "Selecting values");

        let field = self
            .session
            .call(self.handle, MethodCall::get_field(field_name))
            .await?;
        let field_handle = extract_handle(&field)?;

        let result = self
            .session
            .call(field_handle, MethodCall::select_values(values))
            .await?;
        let accepted = extract_bool_return(&result);

        if !accepted {
            warn!(field = field_name, "Engine declined the selection");
        }
        Ok(accepted)
    }

    /// Clear selections in every field. Returns whether the engine accepted it.
    pub async fn clear_selections(&self) -> QixClientResult<bool> {
        debug!(document_id = %self.document_id(), "Clearing selections");

        let result = self.session.call(self.handle, MethodCall::clear_all()).await?;
        Ok(extract_bool_return(&result))
    }

    /// Evaluate an expression in the current selection state
    pub async fn evaluate(&self, expression: &str) -> QixClientResult<ScalarValue> {
        debug!(expression = expression, "Evaluating expression");

        let result = self
            .session
            .call(self.handle, MethodCall::evaluate(expression))
            .await?;
        Ok(extract_scalar(&result))
    }

    pub(crate) async fn object_handle(&self, object_id: &str) -> QixClientResult<Handle> {
        let result = self
            .session
            .call(self.handle, MethodCall::get_object(object_id))
            .await?;
        let handle = extract_handle(&result)?;

        debug!(object_id = object_id, handle = %handle, "Resolved object handle");
        Ok(handle)
    }

    pub(crate) async fn layout_of(&self, handle: Handle) -> QixClientResult<GenericObjectLayout> {
        let result = self.session.call(handle, MethodCall::get_layout()).await?;
        Ok(extract_layout(&result)?)
    }

    /// Rows of one page, as returned by the engine
    pub(crate) async fn fetch_rows(
        &self,
        handle: Handle,
        path: &str,
        page: NxPage,
    ) -> QixClientResult<Vec<Vec<NxCell>>> {
        let result = self
            .session
            .call(handle, MethodCall::get_hypercube_data(path, Some(page)))
            .await?;
        let rows = extract_hypercube_matrix(&result)?;

        debug!(
            handle = %handle,
            top = page.q_top,
            requested = page.q_height,
            returned = rows.len(),
            "Fetched hypercube page"
        );
        Ok(rows)
    }
}

/// Connection status information
#[derive(Debug, Clone)]
pub struct ConnectionStatus {
    pub document_id: String,
    pub endpoint: String,
    pub state: SessionState,
    pub document_handle: Option<Handle>,
}

impl ConnectionStatus {
    /// Check if the document is open and usable
    pub fn is_ready(&self) -> bool {
        self.state == SessionState::Open && self.document_handle.is_some()
    }

    /// Get status summary
    pub fn summary(&self) -> String {
        let handle = self
            .document_handle
            .map(|handle| handle.to_string())
            .unwrap_or_else(|| "none".to_string());
        format!(
            "Document {} at {} - {} (handle {})",
            self.document_id, self.endpoint, self.state, handle
        )
    }
}

/// Builder for opening documents
pub struct DocumentBuilder {
    config: Option<ClientConfig>,
    transport: Option<BoxedTransport>,
}

impl DocumentBuilder {
    /// Create a new document builder
    pub fn new() -> Self {
        Self {
            config: None,
            transport: None,
        }
    }

    /// Set configuration
    pub fn with_config(mut self, config: ClientConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Use an already connected transport instead of dialing the engine
    pub fn with_transport(mut self, transport: BoxedTransport) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Open the document
    pub async fn open(self, document_id: &str) -> QixClientResult<Document> {
        let config = self.config.unwrap_or_default();

        let session = match self.transport {
            Some(transport) => {
                Session::connect_with_transport(transport, &config, document_id).await?
            }
            None => Session::connect(&config, document_id).await?,
        };

        Document::from_session(session)
    }
}

impl Default for DocumentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

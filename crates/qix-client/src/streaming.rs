//! Lazy page-by-page hypercube reads

use async_stream::try_stream;
use futures::Stream;
use tracing::debug;

use qix_protocol::{NxCell, PageCursor};

use crate::document::Document;
use crate::error::QixClientResult;

/// Rows of one hypercube page
pub type PageRows = Vec<Vec<NxCell>>;

impl Document {
    /// Stream hypercube rows one page per step until the engine runs out of rows.
    ///
    /// Nothing is requested until the stream is first polled. There is no row cap, and
    /// every call starts again from the first row.
    pub fn stream_hypercube_data<'a>(
        &'a self,
        object_id: &'a str,
        page_size: u32,
        path: &'a str,
    ) -> impl Stream<Item = QixClientResult<PageRows>> + Send + 'a {
        try_stream! {
            let handle = self.object_handle(object_id).await?;
            let width = self
                .layout_of(handle)
                .await?
                .q_hyper_cube
                .map(|cube| cube.column_count())
                .unwrap_or_default();

            let mut cursor = PageCursor::new(page_size).with_width(width);

            while let Some(page) = cursor.next_page() {
                let mut rows = self.fetch_rows(handle, path, page).await?;
                let kept = cursor.record(&page, rows.len());
                if kept == 0 {
                    break;
                }
                rows.truncate(kept);
                yield rows;
            }

            debug!(
                object_id = object_id,
                rows = cursor.rows_fetched(),
                pages = cursor.pages_requested(),
                "Hypercube stream exhausted"
            );
        }
    }
}

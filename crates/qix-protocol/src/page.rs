//! Hypercube paging: the page window sent to the engine and the cursor that walks a result
//! matrix from the top until the engine runs out of rows or a row cap is reached.

use serde::{Deserialize, Serialize};

/// Page height used when the caller does not pick one
pub const DEFAULT_PAGE_HEIGHT: u32 = 1000;

/// Page width used when the column count is unknown. The engine caps a page at 10 000 cells.
pub const DEFAULT_PAGE_WIDTH: u32 = 10;

/// Property path of the hypercube definition on a generic object
pub const DEFAULT_HYPERCUBE_PATH: &str = "/qHyperCubeDef";

/// A rectangular window into a hypercube's row/column space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NxPage {
    #[serde(default)]
    pub q_top: u32,
    #[serde(default)]
    pub q_left: u32,
    #[serde(default)]
    pub q_height: u32,
    #[serde(default)]
    pub q_width: u32,
}

impl Default for NxPage {
    fn default() -> Self {
        Self::new(0, DEFAULT_PAGE_HEIGHT)
    }
}

impl NxPage {
    pub fn new(top: u32, height: u32) -> Self {
        Self {
            q_top: top,
            q_left: 0,
            q_height: height,
            q_width: DEFAULT_PAGE_WIDTH,
        }
    }

    pub fn with_left(mut self, left: u32) -> Self {
        self.q_left = left;
        self
    }

    pub fn with_width(mut self, width: u32) -> Self {
        self.q_width = width;
        self
    }
}

/// Pagination state for one extraction run.
///
/// Call [`next_page`](Self::next_page) for the window to request and
/// [`record`](Self::record) with the number of rows the engine returned. A short or empty
/// page ends the run; reaching `max_rows` ends it as truncated.
#[derive(Debug, Clone)]
pub struct PageCursor {
    top: u32,
    page_size: u32,
    width: u32,
    max_rows: Option<u32>,
    finished: bool,
    truncated: bool,
    pages: usize,
}

impl PageCursor {
    /// Uncapped cursor; a page size of zero falls back to [`DEFAULT_PAGE_HEIGHT`]
    pub fn new(page_size: u32) -> Self {
        let page_size = if page_size == 0 {
            DEFAULT_PAGE_HEIGHT
        } else {
            page_size
        };
        Self {
            top: 0,
            page_size,
            width: DEFAULT_PAGE_WIDTH,
            max_rows: None,
            finished: false,
            truncated: false,
            pages: 0,
        }
    }

    pub fn with_max_rows(mut self, max_rows: u32) -> Self {
        self.max_rows = Some(max_rows);
        self
    }

    /// Column count of the hypercube; zero keeps the default width
    pub fn with_width(mut self, width: u32) -> Self {
        if width > 0 {
            self.width = width;
        }
        self
    }

    /// The next window to request, or `None` once the run is over
    pub fn next_page(&self) -> Option<NxPage> {
        if self.finished {
            return None;
        }

        let height = match self.max_rows {
            Some(max_rows) => self.page_size.min(max_rows.saturating_sub(self.top)),
            None => self.page_size,
        };

        if height == 0 {
            return None;
        }

        Some(NxPage::new(self.top, height).with_width(self.width))
    }

    /// Record the engine's answer to `page`; returns how many of the returned rows to keep.
    ///
    /// Rows beyond the requested height are never kept, so a cap is honored even when the
    /// engine over-delivers.
    pub fn record(&mut self, page: &NxPage, returned: usize) -> usize {
        self.pages += 1;

        let kept = returned.min(page.q_height as usize);
        if kept == 0 {
            self.finished = true;
            return 0;
        }

        self.top = self.top.saturating_add(kept as u32);

        if kept < page.q_height as usize {
            self.finished = true;
        } else if let Some(max_rows) = self.max_rows {
            if self.top >= max_rows {
                self.finished = true;
                self.truncated = true;
            }
        }

        kept
    }

    pub fn is_finished(&self) -> bool {
        self.finished || self.next_page().is_none()
    }

    /// Whether the row cap, not the end of data, stopped the run
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    /// Rows kept so far
    pub fn rows_fetched(&self) -> u32 {
        self.top
    }

    /// Pages requested so far
    pub fn pages_requested(&self) -> usize {
        self.pages
    }
}

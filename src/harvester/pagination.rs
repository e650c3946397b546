//! Pagination controller
//!
//! Owns the page cursor of one run. The cursor pair is mutated from two
//! places (advancing after a fetch and recording the last page a fetched
//! page reports), so both go through the same run-scoped lock.

use crate::HarvestError;
use std::future::Future;
use tokio::sync::Mutex;

/// Cursor pair plus page size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageCursor {
    /// Next page to fetch; never decreases within a run
    pub current_page: u32,

    /// Last page as reported by the most recently fetched page
    pub last_page: u32,

    /// Items requested per page
    pub page_size: usize,
}

#[derive(Debug)]
pub struct Pagination {
    cursor: Mutex<PageCursor>,
}

impl Pagination {
    /// Starts at page 0 with a provisional last page of 1
    pub fn new(page_size: usize) -> Self {
        Self {
            cursor: Mutex::new(PageCursor {
                current_page: 0,
                last_page: 1,
                page_size,
            }),
        }
    }

    /// True once the cursor has reached the last reported page
    pub async fn done(&self) -> bool {
        let cursor = self.cursor.lock().await;
        cursor.current_page >= cursor.last_page
    }

    /// Fetches the current page and advances the cursor
    ///
    /// `fetch` receives `(current_page, page_size)`. The cursor stays locked
    /// for the duration of the fetch so overlapping advances cannot request
    /// the same page twice; it only advances when the fetch succeeds.
    pub async fn next<T, F, Fut>(&self, fetch: F) -> Result<T, HarvestError>
    where
        F: FnOnce(u32, usize) -> Fut,
        Fut: Future<Output = Result<T, HarvestError>>,
    {
        let mut cursor = self.cursor.lock().await;
        let result = fetch(cursor.current_page, cursor.page_size).await?;
        cursor.current_page += 1;
        Ok(result)
    }

    /// Overwrites the last page with the value a fetched page reported
    ///
    /// The source may revise its total between pages, so this is not
    /// monotonic. A value below the current page ends the run.
    pub async fn set_last_page(&self, last_page: u32) {
        let mut cursor = self.cursor.lock().await;
        if last_page != cursor.last_page {
            tracing::debug!(
                "Last page revised from {} to {}",
                cursor.last_page,
                last_page
            );
        }
        cursor.last_page = last_page;
    }

    pub async fn cursor(&self) -> PageCursor {
        *self.cursor.lock().await
    }
}

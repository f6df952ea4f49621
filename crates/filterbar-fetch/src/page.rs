//! Bridge from the 1-based options contract to the 0-based paginated-list
//! contract used by searchable dropdowns.

use crate::transform::create_transform;
use async_trait::async_trait;
use filterbar_model::{
    AbortSignal, FetchContext, FetchError, OptionsFetchInput, OptionsFetcher, SelectOption,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One page request from the paginated-list renderer.
#[derive(Debug, Clone)]
pub struct PageRequest {
    /// 0-based page index.
    pub page_index: u32,
    pub page_size: u32,
    pub global_filter: String,
    pub signal: AbortSignal,
}

impl PageRequest {
    pub fn new(page_index: u32, page_size: u32, global_filter: impl Into<String>) -> Self {
        Self {
            page_index,
            page_size,
            global_filter: global_filter.into(),
            signal: AbortSignal::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageResponse {
    pub rows: Vec<SelectOption>,
    /// Estimated total row count across all pages.
    pub total: u64,
}

/// The paginated-list contract: `({pageIndex, pageSize, globalFilter,
/// signal}) -> {rows, total}`.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch_page(&self, request: PageRequest) -> Result<PageResponse, FetchError>;
}

/// Supplies the current working/applied selections at request time.
pub type ContextFn = Arc<dyn Fn() -> FetchContext + Send + Sync>;

/// An [`OptionsFetcher`] exposed as a [`PageSource`].
#[derive(Clone)]
pub struct WrappedFetcher {
    fetcher: Arc<dyn OptionsFetcher>,
    get_context: ContextFn,
}

pub fn wrap_options_fetcher(fetcher: Arc<dyn OptionsFetcher>, get_context: ContextFn) -> WrappedFetcher {
    WrappedFetcher {
        fetcher,
        get_context,
    }
}

#[async_trait]
impl PageSource for WrappedFetcher {
    async fn fetch_page(&self, request: PageRequest) -> Result<PageResponse, FetchError> {
        let context = (self.get_context)();
        let page = request.page_index.saturating_add(1);
        tracing::debug!(
            page_index = request.page_index,
            page,
            limit = request.page_size,
            "fetching options page"
        );

        let result = self
            .fetcher
            .fetch(OptionsFetchInput {
                page,
                limit: request.page_size,
                search: request.global_filter,
                signal: request.signal,
                working: context.working,
                applied: context.applied,
            })
            .await?;

        let transform = create_transform();
        let rows: Vec<SelectOption> = result.options.into_iter().map(transform).collect();
        let total = estimate_total(result.total_pages, request.page_size, rows.len());
        Ok(PageResponse { rows, total })
    }
}

/// `total_pages * page_size` when the page count is known, otherwise the
/// number of rows returned; never less than the rows actually returned.
pub fn estimate_total(total_pages: Option<u32>, page_size: u32, returned: usize) -> u64 {
    let returned = returned as u64;
    let estimated = match total_pages {
        Some(pages) => u64::from(pages) * u64::from(page_size),
        None => returned,
    };
    estimated.max(returned)
}

//! The engine-level "fetch a page of options" contract.
//!
//! Remote filters are backed by an [`OptionsFetcher`]. It receives a 1-based
//! page request together with the sibling selections so a fetcher can narrow
//! its query by what the user already picked.

use crate::error::FetchError;
use crate::value::{AppliedFilters, SelectOption};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared abort flag handed down from the paginated-list collaborator.
///
/// The engine only forwards it; whoever issued the request decides when to
/// abort.
#[derive(Debug, Clone, Default)]
pub struct AbortSignal {
    aborted: Arc<AtomicBool>,
}

impl AbortSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn abort(&self) {
        self.aborted.store(true, Ordering::Release);
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted.load(Ordering::Acquire)
    }
}

/// Selections visible to a fetcher at call time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchContext {
    pub working: AppliedFilters,
    pub applied: AppliedFilters,
}

impl FetchContext {
    /// Applied selections with the staged working entries written on top.
    pub fn current(&self) -> AppliedFilters {
        self.applied.overlaid_with(&self.working)
    }
}

#[derive(Debug, Clone)]
pub struct OptionsFetchInput {
    /// 1-based page number.
    pub page: u32,
    pub limit: u32,
    pub search: String,
    pub signal: AbortSignal,
    pub working: AppliedFilters,
    pub applied: AppliedFilters,
}

impl OptionsFetchInput {
    pub fn context(&self) -> FetchContext {
        FetchContext {
            working: self.working.clone(),
            applied: self.applied.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionsFetchResult {
    pub options: Vec<SelectOption>,
    /// `None` when the backend does not report a page count.
    pub total_pages: Option<u32>,
}

impl OptionsFetchResult {
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Source of options for a remote filter.
#[async_trait]
pub trait OptionsFetcher: Send + Sync {
    async fn fetch(&self, input: OptionsFetchInput) -> Result<OptionsFetchResult, FetchError>;
}

/// Adapter that lets an async closure act as an [`OptionsFetcher`].
pub struct FnFetcher<F> {
    f: F,
}

#[async_trait]
impl<F, Fut> OptionsFetcher for FnFetcher<F>
where
    F: Fn(OptionsFetchInput) -> Fut + Send + Sync,
    Fut: Future<Output = Result<OptionsFetchResult, FetchError>> + Send,
{
    async fn fetch(&self, input: OptionsFetchInput) -> Result<OptionsFetchResult, FetchError> {
        (self.f)(input).await
    }
}

/// Wrap an async closure as a shareable fetcher.
pub fn fetcher_fn<F, Fut>(f: F) -> Arc<dyn OptionsFetcher>
where
    F: Fn(OptionsFetchInput) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<OptionsFetchResult, FetchError>> + Send + 'static,
{
    Arc::new(FnFetcher { f })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{FilterSelection, FilterValue};

    #[test]
    fn abort_signal_is_shared_between_clones() {
        let signal = AbortSignal::new();
        let forwarded = signal.clone();
        assert!(!forwarded.is_aborted());
        signal.abort();
        assert!(forwarded.is_aborted());
    }

    #[test]
    fn context_prefers_working_entries() {
        let mut applied = AppliedFilters::new();
        applied.set("brand", Some(FilterSelection::Single(FilterValue::new("b1", "Old"))));
        applied.set("region", Some(FilterSelection::Single(FilterValue::new("r1", "North"))));
        let mut working = AppliedFilters::new();
        working.set("brand", Some(FilterSelection::Single(FilterValue::new("b2", "New"))));

        let current = FetchContext { working, applied }.current();
        assert_eq!(current.get("brand").map(|s| s.values()[0].value.as_str()), Some("b2"));
        assert_eq!(current.get("region").map(|s| s.values()[0].value.as_str()), Some("r1"));
    }

    #[tokio::test]
    async fn closure_fetcher_receives_input() {
        let fetcher = fetcher_fn(|input: OptionsFetchInput| async move {
            Ok(OptionsFetchResult {
                options: vec![SelectOption::new(input.page.to_string(), input.search)],
                total_pages: Some(1),
            })
        });

        let result = fetcher
            .fetch(OptionsFetchInput {
                page: 3,
                limit: 10,
                search: "acme".to_string(),
                signal: AbortSignal::new(),
                working: AppliedFilters::new(),
                applied: AppliedFilters::new(),
            })
            .await
            .expect("closure fetcher should succeed");

        assert_eq!(result.options, vec![SelectOption::new("3", "acme")]);
    }
}

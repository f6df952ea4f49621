//! Fetcher resolution for remote filters.

use crate::legacy::{HttpGet, create_legacy_fetcher};
use async_trait::async_trait;
use filterbar_model::{
    FetchError, OptionsFetchInput, OptionsFetchResult, OptionsFetcher, RemoteSource,
};
use std::sync::Arc;

/// Always answers `{options: [], totalPages: null}`.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyFetcher;

#[async_trait]
impl OptionsFetcher for EmptyFetcher {
    async fn fetch(&self, _input: OptionsFetchInput) -> Result<OptionsFetchResult, FetchError> {
        Ok(OptionsFetchResult::empty())
    }
}

/// Pick the fetcher for a remote filter: the function fetcher if set, else
/// the legacy adapter (when an HTTP capability is available), else
/// [`EmptyFetcher`]. A misconfigured filter ends up inert rather than
/// failing.
pub fn resolve_fetcher(
    key: &str,
    remote: &RemoteSource,
    http: Option<&Arc<dyn HttpGet>>,
) -> Arc<dyn OptionsFetcher> {
    if let Some(fetcher) = &remote.fetcher {
        return Arc::clone(fetcher);
    }

    match (&remote.legacy, http) {
        (Some(legacy), Some(http)) => create_legacy_fetcher(legacy.clone(), Arc::clone(http)),
        (Some(_), None) => {
            tracing::warn!(
                filter = %key,
                "legacy adapter configured without an HTTP client; filter has no options"
            );
            Arc::new(EmptyFetcher)
        }
        (None, _) => {
            tracing::debug!(filter = %key, "remote filter has no fetcher; using empty fallback");
            Arc::new(EmptyFetcher)
        }
    }
}

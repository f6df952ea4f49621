//! Remote option fetch adapters.
//!
//! Remote filters are declared with either a function fetcher or a legacy
//! endpoint descriptor. This crate resolves the declared source into an
//! `OptionsFetcher` and wraps it in the 0-based `PageSource` contract the
//! searchable dropdown consumes:
//!
//! ```text
//! RemoteSource ──resolve_fetcher──▶ OptionsFetcher (fn | LegacyFetcher | EmptyFetcher)
//!                                        │ wrap_options_fetcher
//!                                        ▼
//!                                   PageSource {pageIndex, pageSize} → {rows, total}
//! ```

pub mod fallback;
pub mod legacy;
pub mod page;
pub mod transform;

pub use fallback::{EmptyFetcher, resolve_fetcher};
pub use legacy::{
    HttpGet, LegacyFetcher, create_legacy_fetcher, derive_total_pages, fill_template,
    parse_response,
};
pub use page::{
    ContextFn, PageRequest, PageResponse, PageSource, WrappedFetcher, estimate_total,
    wrap_options_fetcher,
};
pub use transform::{create_transform, transform_all};

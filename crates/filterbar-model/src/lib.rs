//! # filterbar-model
//!
//! Data model for the cascading filter bar.
//!
//! This crate provides:
//! - `FilterConfig` and its data sources (the declarative filter definitions)
//! - `FilterValue` / `AppliedFilters` and the dropdown normalization helpers
//! - `DependencyGraph` (validated parent → child edges) and `FilterSet`
//! - the `OptionsFetcher` contract shared by fetch adapters and the engine
//! - TOML/JSON filter manifests
//!
//! It owns no state transitions; those live in `filterbar-engine`.
//!
//! ## Data model
//!
//! ```text
//! FilterManifest (TOML / JSON)
//!     ↓  into_configs
//! FilterConfig[] ──build──▶ FilterSet { configs, DependencyGraph }
//!
//! AppliedFilters: key → FilterValue | FilterValue[] | null
//! ```

pub mod config;
pub mod error;
pub mod fetch;
pub mod graph;
pub mod manifest;
pub mod set;
pub mod value;

pub use config::{
    DEFAULT_MIN_QUERY_LENGTH, DEFAULT_PAGE_SIZE, DEFAULT_SEARCH_DEBOUNCE_MS, DataSource,
    DependsOnBehavior, Endpoint, EndpointFn, ExtraParams, ExtraParamsFn, FilterConfig, FilterUi,
    LegacyAdapterConfig, RemoteSource, SelectionMode,
};
pub use error::{FetchError, ModelError};
pub use fetch::{
    AbortSignal, FetchContext, FnFetcher, OptionsFetchInput, OptionsFetchResult, OptionsFetcher,
    fetcher_fn,
};
pub use graph::{CascadeMode, DependencyGraph};
pub use manifest::{DataEntry, FilterEntry, FilterManifest, LegacyEntry};
pub use set::FilterSet;
pub use value::{
    AppliedFilters, ControlledValue, FilterSelection, FilterValue, OptionPick, SelectOption,
    is_empty_slot, options_to_filter_value, scalar_to_string, to_applied, to_controlled_value,
    to_options,
};

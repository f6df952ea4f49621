//! Declarative filter definitions.
//!
//! A host page describes each filter once per render pass; the engine never
//! mutates a [`FilterConfig`].

use crate::fetch::OptionsFetcher;
use crate::value::{AppliedFilters, SelectOption};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const DEFAULT_SEARCH_DEBOUNCE_MS: u64 = 300;
pub const DEFAULT_MIN_QUERY_LENGTH: usize = 0;

/// Whether a filter slot holds one selection or many.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionMode {
    #[default]
    Single,
    Multi,
}

/// What happens to a filter when one of its parents changes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DependsOnBehavior {
    /// Reset the value only.
    #[serde(rename = "clear")]
    Clear,
    /// Reset the value and block interaction while any parent is empty.
    #[default]
    #[serde(rename = "disable+clear", alias = "disable_clear")]
    DisableAndClear,
}

/// Declared control type. Only dropdowns are rendered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FilterUi {
    #[default]
    Dropdown,
    Unsupported(String),
}

impl FilterUi {
    pub fn as_str(&self) -> &str {
        match self {
            FilterUi::Dropdown => "dropdown",
            FilterUi::Unsupported(name) => name,
        }
    }
}

impl From<String> for FilterUi {
    fn from(raw: String) -> Self {
        if raw.eq_ignore_ascii_case("dropdown") {
            FilterUi::Dropdown
        } else {
            FilterUi::Unsupported(raw)
        }
    }
}

impl From<FilterUi> for String {
    fn from(ui: FilterUi) -> Self {
        ui.as_str().to_string()
    }
}

pub type EndpointFn = Arc<dyn Fn(&AppliedFilters) -> String + Send + Sync>;
pub type ExtraParamsFn = Arc<dyn Fn(&AppliedFilters) -> Vec<(String, String)> + Send + Sync>;

/// Where a legacy adapter sends its GET request.
#[derive(Clone)]
pub enum Endpoint {
    /// A path, optionally containing `{filterKey}` placeholders that are
    /// replaced with the current value of that filter.
    Template(String),
    /// Computed from the current selections.
    Dynamic(EndpointFn),
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Template(path) => f.debug_tuple("Template").field(path).finish(),
            Endpoint::Dynamic(_) => f.write_str("Dynamic(<fn>)"),
        }
    }
}

/// Extra query parameters derived from sibling selections.
#[derive(Clone)]
pub enum ExtraParams {
    /// `param = "{filterKey}"` templates; a parameter whose placeholders
    /// resolve to nothing is omitted.
    Templates(BTreeMap<String, String>),
    Builder(ExtraParamsFn),
}

impl fmt::Debug for ExtraParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtraParams::Templates(map) => f.debug_tuple("Templates").field(map).finish(),
            ExtraParams::Builder(_) => f.write_str("Builder(<fn>)"),
        }
    }
}

/// Declarative description of a remote options endpoint, kept for pages
/// that predate function fetchers.
#[derive(Debug, Clone)]
pub struct LegacyAdapterConfig {
    /// Field under `data` that holds the item array.
    pub resource_key: String,
    pub endpoint: Endpoint,
    pub id_field: String,
    pub label_field: String,
    pub extra_params: Option<ExtraParams>,
}

impl LegacyAdapterConfig {
    pub fn new(
        endpoint: impl Into<String>,
        resource_key: impl Into<String>,
        id_field: impl Into<String>,
        label_field: impl Into<String>,
    ) -> Self {
        Self {
            resource_key: resource_key.into(),
            endpoint: Endpoint::Template(endpoint.into()),
            id_field: id_field.into(),
            label_field: label_field.into(),
            extra_params: None,
        }
    }

    pub fn with_dynamic_endpoint(mut self, endpoint: EndpointFn) -> Self {
        self.endpoint = Endpoint::Dynamic(endpoint);
        self
    }

    pub fn with_extra_params(mut self, extra: ExtraParams) -> Self {
        self.extra_params = Some(extra);
        self
    }
}

/// Settings for a remote, paginated, searchable filter.
#[derive(Clone)]
pub struct RemoteSource {
    pub fetcher: Option<Arc<dyn OptionsFetcher>>,
    pub legacy: Option<LegacyAdapterConfig>,
    pub page_size: u32,
    pub debounce_ms: u64,
    pub min_query_length: usize,
    /// Cache hints passed through to the host's data-fetching layer.
    pub stale_time: Option<Duration>,
    pub gc_time: Option<Duration>,
}

impl Default for RemoteSource {
    fn default() -> Self {
        Self {
            fetcher: None,
            legacy: None,
            page_size: DEFAULT_PAGE_SIZE,
            debounce_ms: DEFAULT_SEARCH_DEBOUNCE_MS,
            min_query_length: DEFAULT_MIN_QUERY_LENGTH,
            stale_time: None,
            gc_time: None,
        }
    }
}

impl fmt::Debug for RemoteSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteSource")
            .field("fetcher", &self.fetcher.as_ref().map(|_| "<fetcher>"))
            .field("legacy", &self.legacy)
            .field("page_size", &self.page_size)
            .field("debounce_ms", &self.debounce_ms)
            .field("min_query_length", &self.min_query_length)
            .field("stale_time", &self.stale_time)
            .field("gc_time", &self.gc_time)
            .finish()
    }
}

/// Where a filter's options come from.
#[derive(Debug, Clone)]
pub enum DataSource {
    Static { options: Vec<SelectOption> },
    Remote(RemoteSource),
}

impl DataSource {
    pub fn static_options(options: Vec<SelectOption>) -> Self {
        DataSource::Static { options }
    }

    pub fn remote(fetcher: Arc<dyn OptionsFetcher>) -> Self {
        DataSource::Remote(RemoteSource {
            fetcher: Some(fetcher),
            ..RemoteSource::default()
        })
    }

    pub fn legacy(adapter: LegacyAdapterConfig) -> Self {
        DataSource::Remote(RemoteSource {
            legacy: Some(adapter),
            ..RemoteSource::default()
        })
    }
}

/// One filter as declared by the host page.
#[derive(Debug, Clone)]
pub struct FilterConfig {
    pub key: String,
    pub label: Option<String>,
    pub mode: SelectionMode,
    pub ui: FilterUi,
    pub data: DataSource,
    /// Parent keys in declaration order; one edge parent → this filter each.
    pub depends_on: Vec<String>,
    pub depends_on_behavior: DependsOnBehavior,
}

impl FilterConfig {
    pub fn new(key: impl Into<String>, mode: SelectionMode, data: DataSource) -> Self {
        Self {
            key: key.into(),
            label: None,
            mode,
            ui: FilterUi::Dropdown,
            data,
            depends_on: Vec::new(),
            depends_on_behavior: DependsOnBehavior::default(),
        }
    }

    pub fn single(key: impl Into<String>, data: DataSource) -> Self {
        Self::new(key, SelectionMode::Single, data)
    }

    pub fn multi(key: impl Into<String>, data: DataSource) -> Self {
        Self::new(key, SelectionMode::Multi, data)
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_ui(mut self, ui: FilterUi) -> Self {
        self.ui = ui;
        self
    }

    pub fn depends_on<I, S>(mut self, parents: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.depends_on = parents.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_behavior(mut self, behavior: DependsOnBehavior) -> Self {
        self.depends_on_behavior = behavior;
        self
    }

    /// Attach a function fetcher. A static filter becomes remote with
    /// default paging settings.
    pub fn with_fetcher(mut self, fetcher: Arc<dyn OptionsFetcher>) -> Self {
        match &mut self.data {
            DataSource::Remote(remote) => remote.fetcher = Some(fetcher),
            DataSource::Static { .. } => self.data = DataSource::remote(fetcher),
        }
        self
    }

    pub fn is_remote(&self) -> bool {
        matches!(self.data, DataSource::Remote(_))
    }
}

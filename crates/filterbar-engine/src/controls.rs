//! Control dispatch: one descriptor per renderable filter.

use crate::state::FilterState;
use filterbar_fetch::{ContextFn, HttpGet, PageSource, resolve_fetcher, wrap_options_fetcher};
use filterbar_model::{
    AppliedFilters, ControlledValue, DataSource, FilterConfig, FilterSet, FilterUi, RemoteSource,
    SelectOption, SelectionMode, to_controlled_value,
};
use serde::Serialize;
use serde_json::{Value, json};
use sha2::{Digest, Sha256};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Everything a host needs to render one filter control.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlDescriptor {
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub mode: SelectionMode,
    pub disabled: bool,
    pub value: ControlledValue,
    pub source: ControlSource,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ControlSource {
    /// Finite option list rendered directly.
    Static { options: Vec<SelectOption> },
    /// Paginated, searchable list.
    Remote(RemoteControl),
}

#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteControl {
    #[serde(skip)]
    pub source: Arc<dyn PageSource>,
    pub page_size: u32,
    pub search_debounce_ms: u64,
    pub min_query_length: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stale_time_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gc_time_ms: Option<u64>,
    /// Changes whenever a parent selection changes, so cached pages for the
    /// previous parent values are not reused.
    pub cache_key: String,
}

impl fmt::Debug for RemoteControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteControl")
            .field("page_size", &self.page_size)
            .field("search_debounce_ms", &self.search_debounce_ms)
            .field("min_query_length", &self.min_query_length)
            .field("stale_time_ms", &self.stale_time_ms)
            .field("gc_time_ms", &self.gc_time_ms)
            .field("cache_key", &self.cache_key)
            .finish_non_exhaustive()
    }
}

/// Non-fatal configuration problems found while building controls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    pub filter: String,
    pub class: String,
    pub message: String,
}

pub const DIAGNOSTIC_CLASS_UNSUPPORTED_UI: &str = "filter.ui.unsupported";

/// Controls in declaration order plus diagnostics for skipped filters.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ControlsView {
    pub controls: Vec<ControlDescriptor>,
    pub diagnostics: Vec<Diagnostic>,
}

impl ControlsView {
    pub fn control(&self, key: &str) -> Option<&ControlDescriptor> {
        self.controls.iter().find(|c| c.key == key)
    }
}

pub(crate) fn build_controls(
    set: &FilterSet,
    state: &FilterState,
    http: Option<&Arc<dyn HttpGet>>,
    context: &ContextFn,
) -> ControlsView {
    let mut view = ControlsView::default();
    let current = state.applied.overlaid_with(&state.working);

    for config in set.iter() {
        if let FilterUi::Unsupported(ui) = &config.ui {
            tracing::warn!(filter = %config.key, ui = %ui, "unsupported filter ui type; not rendered");
            view.diagnostics.push(Diagnostic {
                filter: config.key.clone(),
                class: DIAGNOSTIC_CLASS_UNSUPPORTED_UI.to_string(),
                message: format!("ui type `{ui}` is not supported; only `dropdown` renders"),
            });
            continue;
        }

        let source = match &config.data {
            DataSource::Static { options } => ControlSource::Static {
                options: options.clone(),
            },
            DataSource::Remote(remote) => {
                ControlSource::Remote(remote_control(config, remote, &current, http, context))
            }
        };

        view.controls.push(ControlDescriptor {
            key: config.key.clone(),
            label: config.label.clone(),
            mode: config.mode,
            disabled: state.is_filter_disabled(config),
            value: to_controlled_value(state.working.get(&config.key)),
            source,
        });
    }
    view
}

fn remote_control(
    config: &FilterConfig,
    remote: &RemoteSource,
    current: &AppliedFilters,
    http: Option<&Arc<dyn HttpGet>>,
    context: &ContextFn,
) -> RemoteControl {
    let fetcher = resolve_fetcher(&config.key, remote, http);
    RemoteControl {
        source: Arc::new(wrap_options_fetcher(fetcher, Arc::clone(context))),
        page_size: remote.page_size,
        search_debounce_ms: remote.debounce_ms,
        min_query_length: remote.min_query_length,
        stale_time_ms: remote.stale_time.map(duration_ms),
        gc_time_ms: remote.gc_time.map(duration_ms),
        cache_key: cache_key(config, current),
    }
}

pub(crate) fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Digest of the filter key and its parents' current selections.
pub fn cache_key(config: &FilterConfig, current: &AppliedFilters) -> String {
    let parents: Vec<Value> = config
        .depends_on
        .iter()
        .map(|parent| {
            let values: Vec<&str> = current
                .get(parent)
                .map(|s| s.values().iter().map(|v| v.value.as_str()).collect())
                .unwrap_or_default();
            json!([parent, values])
        })
        .collect();
    let canonical = json!({ "filter": config.key, "parents": parents }).to_string();

    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    format!("fb1_{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use filterbar_model::{FilterSelection, FilterValue};

    #[test]
    fn cache_key_changes_with_parent_selection() {
        let config = FilterConfig::single("seller", DataSource::static_options(Vec::new()))
            .depends_on(["brand"]);

        let mut current = AppliedFilters::new();
        let empty = cache_key(&config, &current);

        current.set(
            "brand",
            Some(FilterSelection::Single(FilterValue::new("b1", "Acme"))),
        );
        let with_brand = cache_key(&config, &current);
        assert_ne!(empty, with_brand);
        assert!(with_brand.starts_with("fb1_"));

        current.set("unrelated", Some(FilterSelection::Multi(Vec::new())));
        assert_eq!(cache_key(&config, &current), with_brand);
    }

    #[test]
    fn oversized_durations_saturate() {
        assert_eq!(duration_ms(Duration::from_millis(1500)), 1500);
        assert_eq!(duration_ms(Duration::MAX), u64::MAX);
    }
}

//! TOML/JSON filter manifests.
//!
//! A manifest declares filters without code. Function fetchers cannot be
//! serialized; attach them after loading with [`FilterConfig::with_fetcher`].
//!
//! ```toml
//! [[filters]]
//! key = "brand"
//! data = { kind = "remote", legacy = { endpoint = "/brands", resource_key = "brands" } }
//!
//! [[filters]]
//! key = "seller"
//! depends_on = ["brand"]
//! data = { kind = "remote", legacy = { endpoint = "/brands/{brand}/sellers", resource_key = "sellers" } }
//! ```

use crate::config::{
    DEFAULT_PAGE_SIZE, DEFAULT_SEARCH_DEBOUNCE_MS, DataSource, DependsOnBehavior, ExtraParams,
    FilterConfig, FilterUi, LegacyAdapterConfig, RemoteSource, SelectionMode,
};
use crate::error::ModelError;
use crate::set::FilterSet;
use crate::value::SelectOption;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterManifest {
    #[serde(default)]
    pub filters: Vec<FilterEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterEntry {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub mode: SelectionMode,
    #[serde(default)]
    pub ui: FilterUi,
    pub data: DataEntry,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
    #[serde(default)]
    pub depends_on_behavior: DependsOnBehavior,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DataEntry {
    Static {
        #[serde(default)]
        options: Vec<SelectOption>,
    },
    Remote {
        #[serde(default = "default_page_size")]
        page_size: u32,
        #[serde(default = "default_debounce_ms")]
        debounce_ms: u64,
        #[serde(default)]
        min_query_length: usize,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        stale_time_ms: Option<u64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        gc_time_ms: Option<u64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        legacy: Option<LegacyEntry>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyEntry {
    pub endpoint: String,
    pub resource_key: String,
    #[serde(default = "default_id_field")]
    pub id_field: String,
    #[serde(default = "default_label_field")]
    pub label_field: String,
    /// `param = "{filterKey}"` templates.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra_params: BTreeMap<String, String>,
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

fn default_debounce_ms() -> u64 {
    DEFAULT_SEARCH_DEBOUNCE_MS
}

fn default_id_field() -> String {
    "id".to_string()
}

fn default_label_field() -> String {
    "name".to_string()
}

impl FilterManifest {
    pub fn from_toml_str(raw: &str) -> Result<Self, ModelError> {
        toml::from_str(raw).map_err(|e| ModelError::Manifest(e.to_string()))
    }

    pub fn from_json_str(raw: &str) -> Result<Self, ModelError> {
        serde_json::from_str(raw).map_err(|e| ModelError::Manifest(e.to_string()))
    }

    /// Load a manifest file, choosing the format by extension (`.json`,
    /// anything else is read as TOML).
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| ModelError::Manifest(format!("failed to read {}: {e}", path.display())))?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json_str(&raw),
            _ => Self::from_toml_str(&raw),
        }
    }

    pub fn into_configs(self) -> Vec<FilterConfig> {
        self.filters.into_iter().map(FilterEntry::into_config).collect()
    }

    pub fn into_filter_set(self) -> Result<FilterSet, ModelError> {
        FilterSet::new(self.into_configs())
    }
}

impl FilterEntry {
    pub fn into_config(self) -> FilterConfig {
        let data = match self.data {
            DataEntry::Static { options } => DataSource::Static { options },
            DataEntry::Remote {
                page_size,
                debounce_ms,
                min_query_length,
                stale_time_ms,
                gc_time_ms,
                legacy,
            } => DataSource::Remote(RemoteSource {
                fetcher: None,
                legacy: legacy.map(LegacyEntry::into_adapter),
                page_size,
                debounce_ms,
                min_query_length,
                stale_time: stale_time_ms.map(Duration::from_millis),
                gc_time: gc_time_ms.map(Duration::from_millis),
            }),
        };

        FilterConfig {
            key: self.key,
            label: self.label,
            mode: self.mode,
            ui: self.ui,
            data,
            depends_on: self.depends_on,
            depends_on_behavior: self.depends_on_behavior,
        }
    }
}

impl LegacyEntry {
    pub fn into_adapter(self) -> LegacyAdapterConfig {
        let adapter =
            LegacyAdapterConfig::new(self.endpoint, self.resource_key, self.id_field, self.label_field);
        if self.extra_params.is_empty() {
            adapter
        } else {
            adapter.with_extra_params(ExtraParams::Templates(self.extra_params))
        }
    }
}

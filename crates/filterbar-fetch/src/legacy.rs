//! Legacy endpoint adapter.
//!
//! Older pages describe a remote filter declaratively
//! (`{endpoint, idField, labelField, resourceKey, extraParams}`) instead of
//! passing a fetch function. [`create_legacy_fetcher`] turns that descriptor
//! into an [`OptionsFetcher`] over an injected [`HttpGet`] capability.
//!
//! Responses must have the shape
//! `{"data": {"<resourceKey>": [...], "totalPages"?: n, "totalRecords"?: n}}`.

use async_trait::async_trait;
use filterbar_model::{
    AppliedFilters, Endpoint, ExtraParams, FetchError, LegacyAdapterConfig, OptionsFetchInput,
    OptionsFetchResult, OptionsFetcher, SelectOption, scalar_to_string,
};
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::{Arc, OnceLock};

/// HTTP GET returning a decoded JSON body. Failures are reported as
/// [`FetchError::Http`] and propagate to the caller unchanged.
#[async_trait]
pub trait HttpGet: Send + Sync {
    async fn get_json(&self, endpoint: &str, query: &[(String, String)]) -> Result<Value, FetchError>;
}

pub struct LegacyFetcher {
    config: LegacyAdapterConfig,
    http: Arc<dyn HttpGet>,
}

pub fn create_legacy_fetcher(
    config: LegacyAdapterConfig,
    http: Arc<dyn HttpGet>,
) -> Arc<dyn OptionsFetcher> {
    Arc::new(LegacyFetcher::new(config, http))
}

impl LegacyFetcher {
    pub fn new(config: LegacyAdapterConfig, http: Arc<dyn HttpGet>) -> Self {
        Self { config, http }
    }

    /// Endpoint for the current selections.
    pub fn resolve_endpoint(&self, selections: &AppliedFilters) -> String {
        match &self.config.endpoint {
            Endpoint::Template(template) => fill_template(template, selections),
            Endpoint::Dynamic(build) => build(selections),
        }
    }

    /// Paging parameters first, then the extra parameters.
    pub fn build_query(
        &self,
        input: &OptionsFetchInput,
        selections: &AppliedFilters,
    ) -> Vec<(String, String)> {
        let mut query = vec![
            ("page".to_string(), input.page.to_string()),
            ("limit".to_string(), input.limit.to_string()),
        ];
        if !input.search.is_empty() {
            query.push(("search".to_string(), input.search.clone()));
        }

        match &self.config.extra_params {
            None => {}
            Some(ExtraParams::Builder(build)) => query.extend(build(selections)),
            Some(ExtraParams::Templates(templates)) => {
                for (param, template) in templates {
                    if let Some(value) = fill_template_strict(template, selections) {
                        query.push((param.clone(), value));
                    }
                }
            }
        }
        query
    }
}

#[async_trait]
impl OptionsFetcher for LegacyFetcher {
    async fn fetch(&self, input: OptionsFetchInput) -> Result<OptionsFetchResult, FetchError> {
        if input.signal.is_aborted() {
            return Err(FetchError::Aborted);
        }

        let selections = input.context().current();
        let endpoint = self.resolve_endpoint(&selections);
        let query = self.build_query(&input, &selections);
        tracing::debug!(
            endpoint = %endpoint,
            resource = %self.config.resource_key,
            page = input.page,
            "legacy options request"
        );

        let body = self.http.get_json(&endpoint, &query).await?;
        if input.signal.is_aborted() {
            return Err(FetchError::Aborted);
        }
        parse_response(&body, &self.config, input.limit)
    }
}

/// Validate a legacy response and normalize it into options.
pub fn parse_response(
    body: &Value,
    config: &LegacyAdapterConfig,
    limit: u32,
) -> Result<OptionsFetchResult, FetchError> {
    let data = body
        .get("data")
        .and_then(Value::as_object)
        .ok_or_else(|| FetchError::MalformedResponse("missing `data` object".to_string()))?;

    let items = data
        .get(&config.resource_key)
        .and_then(Value::as_array)
        .ok_or_else(|| {
            FetchError::MalformedResponse(format!(
                "`data.{}` is missing or not an array",
                config.resource_key
            ))
        })?;

    let options = items
        .iter()
        .enumerate()
        .map(|(pos, item)| item_to_option(pos, item, config))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(OptionsFetchResult {
        options,
        total_pages: derive_total_pages(
            count_field(data, "totalPages"),
            count_field(data, "totalRecords"),
            limit,
        ),
    })
}

fn item_to_option(
    pos: usize,
    item: &Value,
    config: &LegacyAdapterConfig,
) -> Result<SelectOption, FetchError> {
    let value = item
        .get(&config.id_field)
        .and_then(scalar_to_string)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| {
            FetchError::MalformedResponse(format!(
                "item {pos} has no usable `{}` field",
                config.id_field
            ))
        })?;
    let label = item
        .get(&config.label_field)
        .and_then(scalar_to_string)
        .unwrap_or_default();

    Ok(SelectOption::new(value, label).with_meta(item.clone()))
}

fn count_field(data: &Map<String, Value>, name: &str) -> Option<u64> {
    data.get(name).and_then(|value| match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

/// The reported page count, else `ceil(total_records / limit)`, else `None`.
pub fn derive_total_pages(
    total_pages: Option<u64>,
    total_records: Option<u64>,
    limit: u32,
) -> Option<u32> {
    let pages = match (total_pages, total_records) {
        (Some(pages), _) => pages,
        (None, Some(records)) if limit > 0 => records.div_ceil(u64::from(limit)),
        _ => return None,
    };
    Some(u32::try_from(pages).unwrap_or(u32::MAX))
}

fn placeholder_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\{([A-Za-z0-9_.\-]+)\}").expect("placeholder regex must compile")
    })
}

/// Current value(s) of a filter as a query string fragment. Multi-select
/// values are comma-joined in selection order.
fn selection_text(selections: &AppliedFilters, key: &str) -> Option<String> {
    let selection = selections.get(key)?;
    if selection.is_empty() {
        return None;
    }
    let joined = selection
        .values()
        .iter()
        .map(|v| v.value.as_str())
        .collect::<Vec<_>>()
        .join(",");
    Some(joined)
}

/// Substitute placeholders; empty selections become empty strings.
pub fn fill_template(template: &str, selections: &AppliedFilters) -> String {
    placeholder_re()
        .replace_all(template, |caps: &regex::Captures<'_>| {
            selection_text(selections, &caps[1]).unwrap_or_default()
        })
        .into_owned()
}

/// Substitute placeholders, yielding `None` if any of them is empty.
fn fill_template_strict(template: &str, selections: &AppliedFilters) -> Option<String> {
    let all_present = placeholder_re()
        .captures_iter(template)
        .all(|caps| selection_text(selections, &caps[1]).is_some());
    all_present.then(|| fill_template(template, selections))
}

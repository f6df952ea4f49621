//! Selected values and the dropdown normalization helpers.
//!
//! The engine stores selections as [`FilterValue`]s (`{value, label}`), while
//! a dropdown control works with primitive values (`""`, `"id"` or
//! `["id", ...]`) and picks whole option objects. The helpers here convert
//! between the two without side effects.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// One selected item: the canonical representation held by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterValue {
    #[serde(deserialize_with = "coerce_scalar")]
    pub value: String,
    #[serde(default, deserialize_with = "coerce_scalar")]
    pub label: String,
}

impl FilterValue {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// The content of one filter slot.
///
/// Single-select filters hold one value, multi-select filters hold an
/// ordered sequence (insertion order = selection order).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterSelection {
    Multi(Vec<FilterValue>),
    Single(FilterValue),
}

impl FilterSelection {
    /// An empty multi-select sequence counts as no selection.
    pub fn is_empty(&self) -> bool {
        match self {
            FilterSelection::Multi(values) => values.is_empty(),
            FilterSelection::Single(_) => false,
        }
    }

    pub fn is_multi(&self) -> bool {
        matches!(self, FilterSelection::Multi(_))
    }

    /// Selected values as a slice, regardless of shape.
    pub fn values(&self) -> &[FilterValue] {
        match self {
            FilterSelection::Multi(values) => values,
            FilterSelection::Single(value) => std::slice::from_ref(value),
        }
    }
}

/// Whether a slot holds nothing: absent, null, or an empty sequence.
pub fn is_empty_slot(slot: Option<&FilterSelection>) -> bool {
    slot.is_none_or(FilterSelection::is_empty)
}

/// Mapping from filter key to its selection (`None` = cleared).
///
/// Two instances exist per filter bar: the staged *working* state and the
/// confirmed *applied* state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AppliedFilters(BTreeMap<String, Option<FilterSelection>>);

impl AppliedFilters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a defaults object such as `{"brand": {"value": "b1", "label": "Acme"}}`.
    pub fn from_json_str(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// The selection stored under `key`, flattening absent and null.
    pub fn get(&self, key: &str) -> Option<&FilterSelection> {
        self.0.get(key).and_then(Option::as_ref)
    }

    /// The raw slot: `None` when the key has no entry at all,
    /// `Some(None)` when it is explicitly cleared.
    pub fn slot(&self, key: &str) -> Option<Option<&FilterSelection>> {
        self.0.get(key).map(Option::as_ref)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn set(&mut self, key: impl Into<String>, selection: Option<FilterSelection>) {
        self.0.insert(key.into(), selection);
    }

    pub fn clear(&mut self, key: impl Into<String>) {
        self.0.insert(key.into(), None);
    }

    pub fn is_empty_at(&self, key: &str) -> bool {
        is_empty_slot(self.get(key))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&FilterSelection>)> {
        self.0.iter().map(|(key, slot)| (key.as_str(), slot.as_ref()))
    }

    /// Keep only entries whose key satisfies `keep`.
    pub fn retain_keys(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.0.retain(|key, _| keep(key));
    }

    /// `self` with every entry of `overlay` written on top.
    pub fn overlaid_with(&self, overlay: &AppliedFilters) -> AppliedFilters {
        let mut merged = self.clone();
        for (key, slot) in &overlay.0 {
            merged.0.insert(key.clone(), slot.clone());
        }
        merged
    }
}

impl FromIterator<(String, Option<FilterSelection>)> for AppliedFilters {
    fn from_iter<I: IntoIterator<Item = (String, Option<FilterSelection>)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// An option as offered by a dropdown (static list entry or remote row).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectOption {
    #[serde(deserialize_with = "coerce_scalar")]
    pub value: String,
    #[serde(default, deserialize_with = "coerce_scalar")]
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
}

impl SelectOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
            meta: None,
        }
    }

    pub fn with_meta(mut self, meta: Value) -> Self {
        self.meta = Some(meta);
        self
    }
}

/// What a dropdown hands back on change: one picked option or several.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionPick {
    Many(Vec<SelectOption>),
    One(SelectOption),
}

/// The primitive value a dropdown control is driven with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ControlledValue {
    One(String),
    Many(Vec<String>),
}

impl ControlledValue {
    pub fn empty() -> Self {
        ControlledValue::One(String::new())
    }
}

/// `""` for a cleared slot, the `value` of a single selection, or the
/// ordered `value`s of a multi selection.
pub fn to_controlled_value(applied: Option<&FilterSelection>) -> ControlledValue {
    match applied {
        None => ControlledValue::empty(),
        Some(FilterSelection::Single(value)) => ControlledValue::One(value.value.clone()),
        Some(FilterSelection::Multi(values)) => {
            ControlledValue::Many(values.iter().map(|v| v.value.clone()).collect())
        }
    }
}

/// Convert picked option(s) back into the canonical selection, keeping the
/// single-vs-array shape of the input.
pub fn to_applied(picked: Option<&OptionPick>) -> Option<FilterSelection> {
    match picked? {
        OptionPick::One(option) => Some(FilterSelection::Single(option_to_filter_value(option))),
        OptionPick::Many(options) => Some(FilterSelection::Multi(options_to_filter_value(options))),
    }
}

/// Inverse of [`to_applied`] for host code that needs option objects.
pub fn to_options(selection: &FilterSelection) -> OptionPick {
    match selection {
        FilterSelection::Single(value) => OptionPick::One(filter_value_to_option(value)),
        FilterSelection::Multi(values) => {
            OptionPick::Many(values.iter().map(filter_value_to_option).collect())
        }
    }
}

pub fn options_to_filter_value(options: &[SelectOption]) -> Vec<FilterValue> {
    options.iter().map(option_to_filter_value).collect()
}

fn option_to_filter_value(option: &SelectOption) -> FilterValue {
    FilterValue::new(option.value.clone(), option.label.clone())
}

fn filter_value_to_option(value: &FilterValue) -> SelectOption {
    SelectOption::new(value.value.clone(), value.label.clone())
}

/// Render a JSON scalar as the string a control displays.
///
/// Objects and arrays have no display form and yield `None`.
pub fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null => Some(String::new()),
        Value::Array(_) | Value::Object(_) => None,
    }
}

fn coerce_scalar<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    scalar_to_string(&raw)
        .ok_or_else(|| serde::de::Error::custom("expected a string, number or boolean"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fv(value: &str, label: &str) -> FilterValue {
        FilterValue::new(value, label)
    }

    #[test]
    fn controlled_value_of_cleared_slot_is_empty_string() {
        assert_eq!(to_controlled_value(None), ControlledValue::One(String::new()));
    }

    #[test]
    fn controlled_value_preserves_multi_order() {
        let selection = FilterSelection::Multi(vec![fv("c", "C"), fv("a", "A"), fv("b", "B")]);
        assert_eq!(
            to_controlled_value(Some(&selection)),
            ControlledValue::Many(vec!["c".into(), "a".into(), "b".into()])
        );
    }

    #[test]
    fn to_applied_keeps_shape_and_handles_missing_input() {
        assert_eq!(to_applied(None), None);

        let one = OptionPick::One(SelectOption::new("7", "Seven"));
        assert_eq!(
            to_applied(Some(&one)),
            Some(FilterSelection::Single(fv("7", "Seven")))
        );

        let many = OptionPick::Many(Vec::new());
        assert_eq!(to_applied(Some(&many)), Some(FilterSelection::Multi(Vec::new())));
    }

    #[test]
    fn numeric_labels_are_coerced_to_strings() {
        let option: SelectOption =
            serde_json::from_value(json!({"value": 12, "label": 2024})).expect("must parse");
        assert_eq!(option.value, "12");
        assert_eq!(option.label, "2024");

        let picked = OptionPick::One(option);
        assert_eq!(
            to_applied(Some(&picked)),
            Some(FilterSelection::Single(fv("12", "2024")))
        );
    }

    #[test]
    fn round_trip_through_options() {
        let samples = [
            FilterSelection::Single(fv("b1", "Acme")),
            FilterSelection::Multi(vec![fv("x", "X"), fv("y", "Y")]),
            FilterSelection::Multi(Vec::new()),
        ];

        for selection in samples {
            let picked = to_options(&selection);
            let back = to_applied(Some(&picked)).expect("non-null input stays non-null");
            assert_eq!(back, selection);
            assert_eq!(
                to_controlled_value(Some(&back)),
                to_controlled_value(Some(&selection))
            );
        }
    }

    #[test]
    fn applied_filters_deserialize_nulls_objects_and_arrays() {
        let applied = AppliedFilters::from_json_str(
            r#"{
                "brand": {"value": "b1", "label": "Acme"},
                "tags": [{"value": "a"}, {"value": "b"}],
                "region": null
            }"#,
        )
        .expect("defaults must parse");

        assert_eq!(applied.get("brand"), Some(&FilterSelection::Single(fv("b1", "Acme"))));
        assert_eq!(
            applied.get("tags"),
            Some(&FilterSelection::Multi(vec![fv("a", ""), fv("b", "")]))
        );
        assert_eq!(applied.slot("region"), Some(None));
        assert_eq!(applied.slot("missing"), None);
    }

    #[test]
    fn empty_multi_selection_counts_as_empty() {
        let mut applied = AppliedFilters::new();
        applied.set("tags", Some(FilterSelection::Multi(Vec::new())));
        assert!(applied.is_empty_at("tags"));
        assert!(applied.is_empty_at("unknown"));
    }
}

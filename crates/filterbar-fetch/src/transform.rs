//! Row transform applied to fetched options before they reach a control.

use filterbar_model::SelectOption;

/// Identity over options, except that a `null` meta is treated as absent so
/// serialized rows never carry `"meta": null`.
pub fn create_transform() -> impl Fn(SelectOption) -> SelectOption {
    |option| SelectOption {
        meta: option.meta.filter(|meta| !meta.is_null()),
        ..option
    }
}

/// Convenience for transforming a whole page.
pub fn transform_all(options: Vec<SelectOption>) -> Vec<SelectOption> {
    options.into_iter().map(create_transform()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    #[test]
    fn absent_meta_is_not_serialized() {
        let rows = transform_all(vec![
            SelectOption::new("1", "One"),
            SelectOption::new("2", "Two").with_meta(Value::Null),
        ]);
        let encoded = serde_json::to_value(&rows).expect("rows serialize");
        assert_eq!(
            encoded,
            json!([{"value": "1", "label": "One"}, {"value": "2", "label": "Two"}])
        );
    }

    #[test]
    fn present_meta_passes_through() {
        let meta = json!({"id": 1, "region": "north"});
        let rows = transform_all(vec![SelectOption::new("1", "One").with_meta(meta.clone())]);
        assert_eq!(rows[0].meta, Some(meta));
        assert_eq!(rows[0].value, "1");
        assert_eq!(rows[0].label, "One");
    }
}

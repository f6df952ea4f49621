//! Working/applied state and the pure rules over it.
//!
//! Nothing here touches timers or callbacks; [`crate::FilterBar`] drives
//! these functions and owns the side effects.

use filterbar_model::{
    AppliedFilters, CascadeMode, DependencyGraph, DependsOnBehavior, FilterConfig,
    FilterSelection, FilterSet, SelectionMode, is_empty_slot,
};
use serde::Serialize;

/// The two parallel selection maps of one filter bar.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    /// Staged, unconfirmed selections.
    pub working: AppliedFilters,
    /// Last confirmed selections; the only state handed to `on_apply`.
    pub applied: AppliedFilters,
}

/// Whether the Apply and Clear-all actions are enabled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionState {
    /// Actions are only shown in manual mode.
    pub visible: bool,
    pub apply_enabled: bool,
    pub clear_enabled: bool,
}

/// Result of staging one change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedChange {
    pub working: AppliedFilters,
    /// Dependents reset to null, in cascade order.
    pub cleared: Vec<String>,
}

impl FilterState {
    /// Seed both maps from `defaults`, keeping only configured keys whose
    /// selection shape matches the filter mode.
    pub fn seeded(set: &FilterSet, defaults: &AppliedFilters) -> Self {
        let seed: AppliedFilters = defaults
            .iter()
            .filter(|(key, slot)| match set.get(key) {
                None => {
                    tracing::warn!(filter = %key, "dropping default value for unconfigured filter");
                    false
                }
                Some(config) if !shape_matches(config, *slot) => {
                    tracing::warn!(
                        filter = %key,
                        mode = ?config.mode,
                        "dropping default value whose shape does not match the filter mode"
                    );
                    false
                }
                Some(_) => true,
            })
            .map(|(key, slot)| (key.to_string(), slot.cloned()))
            .collect();
        Self {
            working: seed.clone(),
            applied: seed,
        }
    }

    /// Both maps with every configured key set to null.
    pub fn cleared(set: &FilterSet) -> Self {
        let cleared = set.cleared();
        Self {
            working: cleared.clone(),
            applied: cleared,
        }
    }

    /// A filter with `disable+clear` behavior is disabled while any parent
    /// is empty, looking at working first and falling back to applied when
    /// working has no entry for that parent.
    pub fn is_filter_disabled(&self, config: &FilterConfig) -> bool {
        if config.depends_on_behavior == DependsOnBehavior::Clear {
            return false;
        }
        config.depends_on.iter().any(|parent| {
            let slot = match self.working.slot(parent) {
                Some(slot) => slot,
                None => self.applied.get(parent),
            };
            is_empty_slot(slot)
        })
    }

    /// Whether working and applied disagree for `key`.
    ///
    /// Multi-select values compare as sets, so reordering is not a change.
    pub fn filter_changed(&self, key: &str) -> bool {
        let working = self.working.get(key).filter(|s| !s.is_empty());
        let applied = self.applied.get(key).filter(|s| !s.is_empty());
        match (working, applied) {
            (None, None) => false,
            (Some(_), None) | (None, Some(_)) => true,
            (Some(w), Some(a)) => sorted_values(w) != sorted_values(a),
        }
    }

    pub fn has_changes(&self, set: &FilterSet) -> bool {
        set.keys().any(|key| self.filter_changed(key))
    }

    pub fn action_state(&self, set: &FilterSet, show_action: bool) -> ActionState {
        let any_selected = set
            .keys()
            .any(|key| !self.working.is_empty_at(key) || !self.applied.is_empty_at(key));
        ActionState {
            visible: show_action,
            apply_enabled: show_action && self.has_changes(set),
            clear_enabled: show_action && any_selected,
        }
    }
}

/// Whether `selection` has the single-vs-multi shape `config` expects.
/// A cleared slot fits either mode.
pub fn shape_matches(config: &FilterConfig, selection: Option<&FilterSelection>) -> bool {
    selection.is_none_or(|s| s.is_multi() == (config.mode == SelectionMode::Multi))
}

fn sorted_values(selection: &FilterSelection) -> Vec<&str> {
    let mut values: Vec<&str> = selection.values().iter().map(|v| v.value.as_str()).collect();
    values.sort_unstable();
    values
}

/// Copy of `working` with `key` set to `value` and every cascade target of
/// `key` reset to null.
pub fn cascade(
    working: &AppliedFilters,
    graph: &DependencyGraph,
    key: &str,
    value: Option<FilterSelection>,
    mode: CascadeMode,
) -> StagedChange {
    let mut next = working.clone();
    next.set(key, value);

    let cleared = graph.cascade_targets(key, mode);
    for dependent in &cleared {
        next.clear(dependent.as_str());
    }

    StagedChange {
        working: next,
        cleared,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use filterbar_model::{DataSource, FilterValue};

    fn filter(key: &str, parents: &[&str]) -> FilterConfig {
        FilterConfig::single(key, DataSource::static_options(Vec::new()))
            .depends_on(parents.iter().copied())
    }

    fn single(value: &str) -> Option<FilterSelection> {
        Some(FilterSelection::Single(FilterValue::new(value, value.to_uppercase())))
    }

    fn multi(values: &[&str]) -> Option<FilterSelection> {
        Some(FilterSelection::Multi(
            values.iter().map(|v| FilterValue::new(*v, "")).collect(),
        ))
    }

    fn chain_set() -> FilterSet {
        FilterSet::new(vec![
            filter("a", &[]),
            filter("b", &["a"]),
            filter("c", &["b"]),
            filter("d", &["c"]),
        ])
        .expect("set should build")
    }

    #[test]
    fn cascade_clears_direct_and_second_level_dependents() {
        let set = chain_set();
        let mut working = AppliedFilters::new();
        working.set("b", single("b1"));
        working.set("c", single("c1"));

        let staged = cascade(&working, set.graph(), "a", single("a1"), CascadeMode::Shallow);
        assert_eq!(staged.working.get("a"), single("a1").as_ref());
        assert_eq!(staged.working.slot("b"), Some(None));
        assert_eq!(staged.working.slot("c"), Some(None));
        assert_eq!(staged.cleared, ["b", "c"]);

        let mut refilled = staged.working.clone();
        refilled.set("b", single("b2"));
        refilled.set("c", single("c2"));
        let again = cascade(&refilled, set.graph(), "a", single("a2"), CascadeMode::Shallow);
        assert_eq!(again.working.slot("b"), Some(None));
        assert_eq!(again.working.slot("c"), Some(None));
    }

    #[test]
    fn shallow_cascade_leaves_deep_descendants_stale() {
        let set = chain_set();
        let mut working = AppliedFilters::new();
        working.set("d", single("d1"));

        let shallow = cascade(&working, set.graph(), "a", single("a1"), CascadeMode::Shallow);
        assert_eq!(shallow.working.get("d"), single("d1").as_ref());

        let full = cascade(&working, set.graph(), "a", single("a1"), CascadeMode::Transitive);
        assert_eq!(full.working.slot("d"), Some(None));
        assert_eq!(full.cleared, ["b", "c", "d"]);
    }

    #[test]
    fn clear_behavior_is_never_disabled() {
        let config = filter("b", &["a"]).with_behavior(DependsOnBehavior::Clear);
        let state = FilterState::default();
        assert!(!state.is_filter_disabled(&config));
    }

    #[test]
    fn default_behavior_disables_on_empty_parent() {
        let config = filter("b", &["a"]);
        let mut state = FilterState::default();
        assert!(state.is_filter_disabled(&config));

        state.working.set("a", single("a1"));
        assert!(!state.is_filter_disabled(&config));

        state.working.set("a", multi(&[]));
        assert!(state.is_filter_disabled(&config));
    }

    #[test]
    fn disablement_falls_back_to_applied_only_without_working_entry() {
        let config = filter("b", &["a"]);
        let mut state = FilterState::default();
        state.applied.set("a", single("a1"));
        assert!(!state.is_filter_disabled(&config));

        state.working.set("a", None);
        assert!(state.is_filter_disabled(&config));
    }

    #[test]
    fn filter_without_parents_is_never_disabled() {
        assert!(!FilterState::default().is_filter_disabled(&filter("a", &[])));
    }

    #[test]
    fn change_detection_ignores_multi_order() {
        let set = FilterSet::new(vec![
            FilterConfig::multi("tags", DataSource::static_options(Vec::new())),
            filter("brand", &[]),
        ])
        .expect("set should build");

        let mut state = FilterState::default();
        assert!(!state.has_changes(&set));

        state.working.set("tags", multi(&["a", "b"]));
        state.applied.set("tags", multi(&["b", "a"]));
        assert!(!state.has_changes(&set));

        state.working.set("tags", multi(&["a", "c"]));
        assert!(state.has_changes(&set));
    }

    #[test]
    fn change_detection_on_single_values_and_emptiness() {
        let set = FilterSet::new(vec![filter("brand", &[])]).expect("set should build");
        let mut state = FilterState::default();

        state.working.set("brand", single("b1"));
        assert!(state.filter_changed("brand"));

        state.applied.set("brand", single("b1"));
        assert!(!state.filter_changed("brand"));

        state.applied.set("brand", single("b2"));
        assert!(state.has_changes(&set));

        state.working.set("brand", None);
        state.applied.set("brand", multi(&[]));
        assert!(!state.has_changes(&set));
    }

    #[test]
    fn action_state_tracks_changes_and_selections() {
        let set = FilterSet::new(vec![filter("brand", &[])]).expect("set should build");
        let mut state = FilterState::default();
        assert_eq!(
            state.action_state(&set, true),
            ActionState {
                visible: true,
                apply_enabled: false,
                clear_enabled: false,
            }
        );

        state.working.set("brand", single("b1"));
        let actions = state.action_state(&set, true);
        assert!(actions.apply_enabled);
        assert!(actions.clear_enabled);

        assert_eq!(state.action_state(&set, false), ActionState::default());
    }

    #[test]
    fn seeding_drops_unconfigured_keys() {
        let set = FilterSet::new(vec![filter("brand", &[])]).expect("set should build");
        let mut defaults = AppliedFilters::new();
        defaults.set("brand", single("b1"));
        defaults.set("legacy_key", single("x"));

        let state = FilterState::seeded(&set, &defaults);
        assert_eq!(state.working, state.applied);
        assert!(state.working.contains_key("brand"));
        assert!(!state.applied.contains_key("legacy_key"));
    }

    #[test]
    fn seeding_drops_defaults_with_the_wrong_shape() {
        let set = FilterSet::new(vec![
            filter("brand", &[]),
            FilterConfig::multi("tags", DataSource::static_options(Vec::new())),
            filter("region", &[]),
        ])
        .expect("set should build");
        let mut defaults = AppliedFilters::new();
        defaults.set("brand", multi(&["b1", "b2"]));
        defaults.set("tags", single("t1"));
        defaults.set("region", None);

        let state = FilterState::seeded(&set, &defaults);
        assert!(!state.working.contains_key("brand"));
        assert!(!state.applied.contains_key("tags"));
        assert_eq!(state.applied.slot("region"), Some(None));
    }
}

//! The filter bar: owns state, the debounce timer and the host callbacks.

use crate::controls::{ControlsView, build_controls, duration_ms};
use crate::debounce::DebounceTimer;
use crate::error::EngineError;
use crate::host::FilterHost;
use crate::state::{ActionState, FilterState, cascade, shape_matches};
use filterbar_fetch::{ContextFn, HttpGet};
use filterbar_model::{
    AppliedFilters, CascadeMode, FetchContext, FilterConfig, FilterSelection, FilterSet,
    OptionPick, to_applied,
};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Quiet period before an auto-apply change is committed.
pub const AUTO_APPLY_DEBOUNCE: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    /// `true` shows Apply / Clear-all and stages changes until Apply.
    /// `false` commits every change after `debounce`.
    pub show_action: bool,
    pub debounce: Duration,
    pub cascade: CascadeMode,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            show_action: true,
            debounce: AUTO_APPLY_DEBOUNCE,
            cascade: CascadeMode::default(),
        }
    }
}

impl EngineOptions {
    pub fn auto_apply() -> Self {
        Self {
            show_action: false,
            ..Self::default()
        }
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn with_cascade(mut self, cascade: CascadeMode) -> Self {
        self.cascade = cascade;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    PendingAutoApply,
}

#[derive(Debug, Default)]
struct Shared {
    state: FilterState,
    /// Bumped whenever a pending auto-apply is superseded or discarded.
    generation: u64,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A cascading filter bar.
///
/// Operations take `&mut self` and run synchronously. In auto-apply mode
/// the commit runs later on the tokio runtime, which is why state lives
/// behind a shared mutex.
pub struct FilterBar {
    set: FilterSet,
    options: EngineOptions,
    host: Arc<dyn FilterHost>,
    shared: Arc<Mutex<Shared>>,
    /// Held from a commit decision until its `on_apply` returns, so the
    /// host sees commits in the order the engine made them.
    apply_gate: Arc<Mutex<()>>,
    timer: DebounceTimer,
    http: Option<Arc<dyn HttpGet>>,
}

impl fmt::Debug for FilterBar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterBar")
            .field("filters", &self.set.len())
            .field("options", &self.options)
            .field("timer", &self.timer)
            .field("http", &self.http.is_some())
            .finish_non_exhaustive()
    }
}

impl FilterBar {
    /// Seed working and applied state from `defaults`.
    pub fn new(
        set: FilterSet,
        defaults: &AppliedFilters,
        host: Arc<dyn FilterHost>,
        options: EngineOptions,
    ) -> Self {
        let shared = Shared {
            state: FilterState::seeded(&set, defaults),
            generation: 0,
        };
        Self {
            set,
            options,
            host,
            shared: Arc::new(Mutex::new(shared)),
            apply_gate: Arc::default(),
            timer: DebounceTimer::new(),
            http: None,
        }
    }

    pub fn from_configs(
        configs: Vec<FilterConfig>,
        defaults: &AppliedFilters,
        host: Arc<dyn FilterHost>,
        options: EngineOptions,
    ) -> Result<Self, EngineError> {
        let set = FilterSet::new(configs)?;
        Ok(Self::new(set, defaults, host, options))
    }

    /// HTTP capability used by legacy adapter filters.
    pub fn with_http(mut self, http: Arc<dyn HttpGet>) -> Self {
        self.http = Some(http);
        self
    }

    pub fn filters(&self) -> &FilterSet {
        &self.set
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn state(&self) -> FilterState {
        lock(&self.shared).state.clone()
    }

    pub fn working(&self) -> AppliedFilters {
        lock(&self.shared).state.working.clone()
    }

    pub fn applied(&self) -> AppliedFilters {
        lock(&self.shared).state.applied.clone()
    }

    pub fn phase(&self) -> Phase {
        if self.timer.is_pending() {
            Phase::PendingAutoApply
        } else {
            Phase::Idle
        }
    }

    /// Stage a new selection for `key` and cascade to its dependents.
    ///
    /// In auto-apply mode this also (re)arms the debounce timer; only the
    /// last change inside the quiet period reaches `on_apply`.
    pub fn value_changed(
        &mut self,
        key: &str,
        value: Option<FilterSelection>,
    ) -> Result<(), EngineError> {
        let config = self
            .set
            .get(key)
            .ok_or_else(|| EngineError::UnknownFilter(key.to_string()))?;
        check_shape(config, value.as_ref())?;
        if !self.options.show_action && tokio::runtime::Handle::try_current().is_err() {
            return Err(EngineError::NoRuntime);
        }

        let (working, generation) = {
            let mut shared = lock(&self.shared);
            let clearing = value.as_ref().is_none_or(FilterSelection::is_empty);
            if !clearing && shared.state.is_filter_disabled(config) {
                return Err(EngineError::FilterDisabled(key.to_string()));
            }

            let staged = cascade(
                &shared.state.working,
                self.set.graph(),
                key,
                value,
                self.options.cascade,
            );
            if !staged.cleared.is_empty() {
                tracing::debug!(filter = %key, cleared = ?staged.cleared, "cascade cleared dependents");
            }
            shared.state.working = staged.working;
            if !self.options.show_action {
                shared.generation += 1;
            }
            (shared.state.working.clone(), shared.generation)
        };

        self.host.on_change_working(&working);
        if !self.options.show_action {
            self.schedule_auto_apply(working, generation);
        }
        Ok(())
    }

    /// [`Self::value_changed`] for options picked in a dropdown.
    pub fn select(&mut self, key: &str, picked: Option<&OptionPick>) -> Result<(), EngineError> {
        self.value_changed(key, to_applied(picked))
    }

    fn schedule_auto_apply(&mut self, snapshot: AppliedFilters, generation: u64) {
        let shared = Arc::clone(&self.shared);
        let gate = Arc::clone(&self.apply_gate);
        let host = Arc::clone(&self.host);
        let delay = self.options.debounce;
        tracing::debug!(generation, delay_ms = duration_ms(delay), "auto-apply armed");

        self.timer.arm(delay, async move {
            let _serial = lock(&gate);
            let applied = {
                let mut shared = lock(&shared);
                if shared.generation != generation {
                    tracing::debug!(generation, "stale auto-apply skipped");
                    return;
                }
                shared.state.applied = snapshot;
                shared.state.applied.clone()
            };
            tracing::info!(trigger = "auto", filters = applied.len(), "applied filters");
            host.on_apply(&applied);
        });
    }

    /// Confirm the staged selections. Only available with the action bar.
    pub fn apply_clicked(&mut self) -> Result<(), EngineError> {
        if !self.options.show_action {
            return Err(EngineError::ManualModeOnly);
        }
        let gate = Arc::clone(&self.apply_gate);
        let _serial = lock(&gate);
        let applied = {
            let mut shared = lock(&self.shared);
            shared.state.applied = shared.state.working.clone();
            shared.state.applied.clone()
        };
        tracing::info!(trigger = "apply", filters = applied.len(), "applied filters");
        self.host.on_apply(&applied);
        Ok(())
    }

    /// Null every filter in both maps and apply once.
    pub fn clear_all_clicked(&mut self) {
        let gate = Arc::clone(&self.apply_gate);
        let _serial = lock(&gate);
        self.discard_pending();
        let state = {
            let mut shared = lock(&self.shared);
            shared.state = FilterState::cleared(&self.set);
            shared.state.clone()
        };
        self.host.on_change_working(&state.working);
        tracing::info!(trigger = "clear", filters = state.applied.len(), "applied filters");
        self.host.on_apply(&state.applied);
    }

    /// Re-seed both maps from new host defaults, discarding staged changes
    /// and any pending auto-apply.
    pub fn default_values_changed(&mut self, defaults: &AppliedFilters) {
        let gate = Arc::clone(&self.apply_gate);
        let _serial = lock(&gate);
        self.discard_pending();
        lock(&self.shared).state = FilterState::seeded(&self.set, defaults);
        tracing::info!(trigger = "reset", "filter state re-seeded from defaults");
    }

    /// Cancel a pending auto-apply. Dropping the bar has the same effect.
    pub fn shutdown(&mut self) {
        let gate = Arc::clone(&self.apply_gate);
        let _serial = lock(&gate);
        self.discard_pending();
    }

    /// Callers hold the apply gate, so a timer that already passed its
    /// generation check finishes its `on_apply` before this returns.
    fn discard_pending(&mut self) {
        if self.timer.cancel() {
            tracing::debug!("pending auto-apply cancelled");
        }
        lock(&self.shared).generation += 1;
    }

    pub fn is_filter_disabled(&self, key: &str) -> Result<bool, EngineError> {
        let config = self
            .set
            .get(key)
            .ok_or_else(|| EngineError::UnknownFilter(key.to_string()))?;
        Ok(lock(&self.shared).state.is_filter_disabled(config))
    }

    pub fn filter_changed(&self, key: &str) -> bool {
        lock(&self.shared).state.filter_changed(key)
    }

    pub fn has_changes(&self) -> bool {
        lock(&self.shared).state.has_changes(&self.set)
    }

    pub fn action_state(&self) -> ActionState {
        lock(&self.shared)
            .state
            .action_state(&self.set, self.options.show_action)
    }

    /// Descriptors for every renderable filter, in declaration order.
    ///
    /// Remote sources read sibling selections at fetch time, so a source
    /// built here keeps seeing the latest state.
    pub fn controls(&self) -> ControlsView {
        let shared = Arc::clone(&self.shared);
        let context: ContextFn = Arc::new(move || {
            let shared = lock(&shared);
            FetchContext {
                working: shared.state.working.clone(),
                applied: shared.state.applied.clone(),
            }
        });
        let state = self.state();
        build_controls(&self.set, &state, self.http.as_ref(), &context)
    }
}

fn check_shape(config: &FilterConfig, value: Option<&FilterSelection>) -> Result<(), EngineError> {
    if shape_matches(config, value) {
        Ok(())
    } else {
        Err(EngineError::SelectionShape {
            filter: config.key.clone(),
            expected: config.mode,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::CallbackHost;
    use filterbar_model::{DataSource, FilterValue, SelectionMode};

    fn bar(options: EngineOptions) -> FilterBar {
        let configs = vec![
            FilterConfig::single("brand", DataSource::static_options(Vec::new())),
            FilterConfig::multi("tags", DataSource::static_options(Vec::new())),
            FilterConfig::single("seller", DataSource::static_options(Vec::new()))
                .depends_on(["brand"]),
        ];
        FilterBar::from_configs(
            configs,
            &AppliedFilters::new(),
            Arc::new(CallbackHost::new(|_| {})),
            options,
        )
        .expect("bar should build")
    }

    fn single(value: &str) -> Option<FilterSelection> {
        Some(FilterSelection::Single(FilterValue::new(value, value)))
    }

    #[test]
    fn rejects_unknown_filter() {
        let mut bar = bar(EngineOptions::default());
        let err = bar.value_changed("nope", single("x")).expect_err("unknown key");
        assert_eq!(err, EngineError::UnknownFilter("nope".into()));
    }

    #[test]
    fn rejects_mismatched_shape_without_mutating() {
        let mut bar = bar(EngineOptions::default());
        let err = bar.value_changed("tags", single("x")).expect_err("shape mismatch");
        assert!(matches!(
            err,
            EngineError::SelectionShape { expected: SelectionMode::Multi, .. }
        ));
        assert!(bar.working().is_empty());
    }

    #[test]
    fn rejects_selection_on_disabled_filter() {
        let mut bar = bar(EngineOptions::default());
        assert_eq!(bar.is_filter_disabled("seller"), Ok(true));
        let err = bar.value_changed("seller", single("s1")).expect_err("disabled");
        assert_eq!(err, EngineError::FilterDisabled("seller".into()));

        bar.value_changed("seller", None).expect("clearing a disabled filter is allowed");
        bar.value_changed("brand", single("b1")).expect("parent change");
        assert_eq!(bar.is_filter_disabled("seller"), Ok(false));
        bar.value_changed("seller", single("s1")).expect("enabled now");
    }

    #[test]
    fn apply_requires_manual_mode() {
        let mut bar = bar(EngineOptions::auto_apply());
        assert_eq!(bar.apply_clicked(), Err(EngineError::ManualModeOnly));
    }

    #[test]
    fn auto_apply_without_runtime_is_rejected() {
        let mut bar = bar(EngineOptions::auto_apply());
        assert_eq!(
            bar.value_changed("brand", single("b1")),
            Err(EngineError::NoRuntime)
        );
        assert!(bar.working().is_empty());
        assert_eq!(bar.phase(), Phase::Idle);
    }

    #[test]
    fn manual_change_leaves_applied_untouched() {
        let mut bar = bar(EngineOptions::default());
        bar.value_changed("brand", single("b1")).expect("change");
        assert_eq!(bar.working().get("brand"), single("b1").as_ref());
        assert!(bar.applied().is_empty());
        assert!(bar.has_changes());
        assert!(bar.filter_changed("brand"));
    }
}

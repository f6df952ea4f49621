//! Host-page callback contract.

use filterbar_model::AppliedFilters;
use std::fmt;

/// Receives state from a filter bar. The host only reads state through
/// these callbacks and only writes it by resetting the defaults.
pub trait FilterHost: Send + Sync + 'static {
    /// Called on every confirmed change with the new applied state.
    fn on_apply(&self, applied: &AppliedFilters);

    /// Called on every staged change with the new working state.
    fn on_change_working(&self, _working: &AppliedFilters) {}
}

type Callback = Box<dyn Fn(&AppliedFilters) + Send + Sync>;

/// A [`FilterHost`] built from closures.
pub struct CallbackHost {
    on_apply: Callback,
    on_change_working: Option<Callback>,
}

impl CallbackHost {
    pub fn new(on_apply: impl Fn(&AppliedFilters) + Send + Sync + 'static) -> Self {
        Self {
            on_apply: Box::new(on_apply),
            on_change_working: None,
        }
    }

    pub fn with_change_working(
        mut self,
        on_change_working: impl Fn(&AppliedFilters) + Send + Sync + 'static,
    ) -> Self {
        self.on_change_working = Some(Box::new(on_change_working));
        self
    }
}

impl fmt::Debug for CallbackHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackHost")
            .field("on_change_working", &self.on_change_working.is_some())
            .finish_non_exhaustive()
    }
}

impl FilterHost for CallbackHost {
    fn on_apply(&self, applied: &AppliedFilters) {
        (self.on_apply)(applied);
    }

    fn on_change_working(&self, working: &AppliedFilters) {
        if let Some(callback) = &self.on_change_working {
            callback(working);
        }
    }
}

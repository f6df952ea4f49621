//! # filterbar-engine
//!
//! Dependency and state engine for the cascading filter bar.
//!
//! A [`FilterBar`] keeps two selection maps per filter set:
//!
//! ```text
//!            value_changed / select
//! host ─────────────────────────────▶ working ──cascade──▶ dependents := null
//!                                        │
//!        apply_clicked (manual)          │  250 ms trailing debounce (auto)
//!                                        ▼
//!                                     applied ──on_apply──▶ host
//! ```
//!
//! `controls()` turns the filter set into render descriptors: static option
//! lists, or paginated [`filterbar_fetch::PageSource`]s for remote filters.

pub mod controls;
pub mod debounce;
pub mod engine;
pub mod error;
pub mod host;
pub mod state;

pub use controls::{
    ControlDescriptor, ControlSource, ControlsView, DIAGNOSTIC_CLASS_UNSUPPORTED_UI, Diagnostic,
    RemoteControl, cache_key,
};
pub use debounce::DebounceTimer;
pub use engine::{AUTO_APPLY_DEBOUNCE, EngineOptions, FilterBar, Phase};
pub use error::EngineError;
pub use host::{CallbackHost, FilterHost};
pub use state::{ActionState, FilterState, StagedChange, cascade, shape_matches};

//! Error types for filter-bar operations.

use filterbar_model::{ModelError, SelectionMode};

/// Errors raised by [`crate::FilterBar`] operations. A rejected operation
/// leaves both working and applied state untouched.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("unknown filter: {0}")]
    UnknownFilter(String),

    /// The filter is blocked until every parent has a value.
    #[error("filter {0} is disabled until its parent filters have a value")]
    FilterDisabled(String),

    #[error("filter {filter} expects a {expected:?} selection")]
    SelectionShape {
        filter: String,
        expected: SelectionMode,
    },

    #[error("apply is only available when the action bar is shown")]
    ManualModeOnly,

    #[error("auto-apply requires a running tokio runtime")]
    NoRuntime,

    #[error(transparent)]
    Model(#[from] ModelError),
}

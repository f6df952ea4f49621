//! Error types for filter configuration and option fetching.

/// Errors raised while building a filter set.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("duplicate filter key: {0}")]
    DuplicateKey(String),

    /// A `depends_on` entry names a filter that is not configured.
    #[error("filter {filter} depends on unknown filter {parent}")]
    UnknownDependency { filter: String, parent: String },

    /// The dependency graph is not acyclic. `cycle` lists the keys along
    /// the cycle in parent → child order, closing on its first key.
    #[error("cycle detected in filter dependencies: {}", cycle.join(" -> "))]
    CycleDetected { cycle: Vec<String> },

    #[error("invalid filter manifest: {0}")]
    Manifest(String),
}

/// Errors surfaced by an options fetcher.
///
/// The engine never catches these; the paginated-list collaborator decides
/// how to present them.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("GET {endpoint} failed: {message}")]
    Http { endpoint: String, message: String },

    #[error("malformed options response: {0}")]
    MalformedResponse(String),

    #[error("options fetch aborted")]
    Aborted,

    #[error("{0}")]
    Other(String),
}

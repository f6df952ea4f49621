//! A validated, immutable collection of filter configs.

use crate::config::FilterConfig;
use crate::error::ModelError;
use crate::graph::DependencyGraph;
use crate::value::AppliedFilters;
use std::collections::BTreeMap;

/// Filter configs in declaration order, indexed by key, with their
/// dependency graph.
#[derive(Debug, Clone)]
pub struct FilterSet {
    configs: Vec<FilterConfig>,
    index: BTreeMap<String, usize>,
    graph: DependencyGraph,
}

impl FilterSet {
    pub fn new(configs: Vec<FilterConfig>) -> Result<Self, ModelError> {
        let graph = DependencyGraph::build(&configs)?;
        let index = configs
            .iter()
            .enumerate()
            .map(|(pos, config)| (config.key.clone(), pos))
            .collect();
        Ok(Self {
            configs,
            index,
            graph,
        })
    }

    pub fn get(&self, key: &str) -> Option<&FilterConfig> {
        self.index.get(key).map(|&pos| &self.configs[pos])
    }

    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FilterConfig> {
        self.configs.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.configs.iter().map(|c| c.key.as_str())
    }

    pub fn len(&self) -> usize {
        self.configs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }

    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    /// A map with every configured key set to null.
    pub fn cleared(&self) -> AppliedFilters {
        self.keys().map(|key| (key.to_string(), None)).collect()
    }
}

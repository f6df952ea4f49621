//! Dependency graph between filters.
//!
//! Edges point from a parent filter to the filters that declare it in
//! `depends_on`. The graph is rebuilt whenever the configuration changes and
//! is validated to be acyclic at build time.

use crate::config::FilterConfig;
use crate::error::ModelError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, VecDeque};

/// How far a change propagates through dependents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CascadeMode {
    /// Every descendant of the changed filter.
    #[default]
    Transitive,
    /// Direct dependents and their direct dependents only.
    Shallow,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyGraph {
    children: BTreeMap<String, Vec<String>>,
    parents: BTreeMap<String, Vec<String>>,
    topo_order: Vec<String>,
}

impl DependencyGraph {
    /// Build and validate the graph for `configs`.
    ///
    /// Rejects duplicate keys, parents that are not configured, and cycles.
    pub fn build(configs: &[FilterConfig]) -> Result<Self, ModelError> {
        let mut declared = BTreeSet::new();
        for config in configs {
            if !declared.insert(config.key.as_str()) {
                return Err(ModelError::DuplicateKey(config.key.clone()));
            }
        }

        let mut children: BTreeMap<String, Vec<String>> = BTreeMap::new();
        let mut parents: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for config in configs {
            for parent in &config.depends_on {
                if !declared.contains(parent.as_str()) {
                    return Err(ModelError::UnknownDependency {
                        filter: config.key.clone(),
                        parent: parent.clone(),
                    });
                }
                let siblings = children.entry(parent.clone()).or_default();
                if !siblings.contains(&config.key) {
                    siblings.push(config.key.clone());
                }
                let declared_parents = parents.entry(config.key.clone()).or_default();
                if !declared_parents.contains(parent) {
                    declared_parents.push(parent.clone());
                }
            }
        }

        let order: Vec<String> = configs.iter().map(|c| c.key.clone()).collect();
        let mut graph = Self {
            children,
            parents,
            topo_order: Vec::new(),
        };
        graph.topo_order = graph.toposort(&order)?;
        Ok(graph)
    }

    /// Kahn's algorithm, breaking ties by declaration order.
    fn toposort(&self, order: &[String]) -> Result<Vec<String>, ModelError> {
        let mut in_degree: BTreeMap<&str, usize> = order
            .iter()
            .map(|key| (key.as_str(), self.parents_of(key).len()))
            .collect();

        let mut queue: VecDeque<&str> = order
            .iter()
            .map(String::as_str)
            .filter(|key| in_degree.get(key).copied().unwrap_or(0) == 0)
            .collect();

        let mut sorted = Vec::with_capacity(order.len());
        while let Some(key) = queue.pop_front() {
            sorted.push(key.to_string());
            for child in self.children_of(key) {
                if let Some(degree) = in_degree.get_mut(child.as_str()) {
                    *degree = degree.saturating_sub(1);
                    if *degree == 0 {
                        queue.push_back(child.as_str());
                    }
                }
            }
        }

        if sorted.len() == order.len() {
            return Ok(sorted);
        }

        let visited: BTreeSet<&str> = sorted.iter().map(String::as_str).collect();
        Err(ModelError::CycleDetected {
            cycle: self.trace_cycle(order, &visited),
        })
    }

    /// Walk parents among the unsorted nodes until a key repeats. Every
    /// unsorted node has at least one unsorted parent, so the walk closes.
    fn trace_cycle(&self, order: &[String], visited: &BTreeSet<&str>) -> Vec<String> {
        let Some(start) = order.iter().find(|key| !visited.contains(key.as_str())) else {
            return Vec::new();
        };

        let mut walk: Vec<&str> = vec![start.as_str()];
        loop {
            let current = walk[walk.len() - 1];
            let Some(next) = self
                .parents_of(current)
                .iter()
                .map(String::as_str)
                .find(|parent| !visited.contains(parent))
            else {
                return walk.iter().rev().map(|k| k.to_string()).collect();
            };

            if let Some(pos) = walk.iter().position(|k| *k == next) {
                let mut cycle: Vec<String> =
                    walk[pos..].iter().rev().map(|k| k.to_string()).collect();
                cycle.push(cycle[0].clone());
                return cycle;
            }
            walk.push(next);
        }
    }

    /// Direct dependents of `key`, in declaration order.
    pub fn children_of(&self, key: &str) -> &[String] {
        self.children.get(key).map(Vec::as_slice).unwrap_or_default()
    }

    /// Declared parents of `key`, in `depends_on` order.
    pub fn parents_of(&self, key: &str) -> &[String] {
        self.parents.get(key).map(Vec::as_slice).unwrap_or_default()
    }

    /// Keys ordered so every parent precedes its dependents.
    pub fn topological_order(&self) -> &[String] {
        &self.topo_order
    }

    /// Every filter reachable from `key`, breadth-first, excluding `key`.
    pub fn descendants(&self, key: &str) -> Vec<String> {
        let mut seen = BTreeSet::from([key.to_string()]);
        let mut out = Vec::new();
        let mut queue: VecDeque<&str> = VecDeque::from([key]);

        while let Some(current) = queue.pop_front() {
            for child in self.children_of(current) {
                if seen.insert(child.clone()) {
                    out.push(child.clone());
                    queue.push_back(child.as_str());
                }
            }
        }
        out
    }

    /// Direct dependents plus one more hop.
    pub fn shallow_dependents(&self, key: &str) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for child in self.children_of(key) {
            if !out.contains(child) {
                out.push(child.clone());
            }
        }
        for child in self.children_of(key) {
            for grandchild in self.children_of(child) {
                if grandchild != key && !out.contains(grandchild) {
                    out.push(grandchild.clone());
                }
            }
        }
        out
    }

    /// Filters that must be cleared when `key` changes.
    pub fn cascade_targets(&self, key: &str, mode: CascadeMode) -> Vec<String> {
        match mode {
            CascadeMode::Transitive => self.descendants(key),
            CascadeMode::Shallow => self.shallow_dependents(key),
        }
    }
}

//! Task dependency graph using `petgraph`.
//!
//! Nodes are task labels, edges point from a task to each task named in its
//! `dependsOn`. A cycle is any strongly connected component with more than
//! one node, or a task that depends on itself.

use std::collections::HashMap;

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};

/// Directed graph of `dependsOn` references between task labels.
#[derive(Debug, Default)]
pub struct TaskGraph {
    graph: DiGraph<String, ()>,
    nodes: HashMap<String, NodeIndex>,
}

impl TaskGraph {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a task label, returning the existing node if already present.
    pub fn add_task(&mut self, label: &str) -> NodeIndex {
        if let Some(&idx) = self.nodes.get(label) {
            return idx;
        }
        let idx = self.graph.add_node(label.to_string());
        let _ = self.nodes.insert(label.to_string(), idx);
        idx
    }

    /// Records that `task` depends on `dependency`.
    pub fn add_dependency(&mut self, task: &str, dependency: &str) {
        let from = self.add_task(task);
        let to = self.add_task(dependency);
        let _ = self.graph.update_edge(from, to, ());
    }

    /// Number of labels in the graph.
    #[must_use]
    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    /// Whether the graph holds no labels.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Every dependency cycle, each as a sorted list of labels.
    ///
    /// Cycles are returned in a stable order (by their first label).
    #[must_use]
    pub fn cycles(&self) -> Vec<Vec<String>> {
        let mut cycles: Vec<Vec<String>> = tarjan_scc(&self.graph)
            .into_iter()
            .filter(|component| {
                component.len() > 1
                    || component
                        .first()
                        .is_some_and(|&idx| self.graph.contains_edge(idx, idx))
            })
            .map(|component| {
                let mut labels: Vec<String> = component
                    .iter()
                    .filter_map(|&idx| self.graph.node_weight(idx).cloned())
                    .collect();
                labels.sort();
                labels
            })
            .collect();
        cycles.sort();
        cycles
    }
}

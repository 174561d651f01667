//! Origin resolution over the dependency graph
//!
//! Breadth-first search from a variable back to the receiver of the first
//! model-producing call found on its lineage.

use std::collections::{HashSet, VecDeque};

use crate::config::{DEFAULT_MODEL_OPERATIONS, LineageConfig};

use super::graph::DependencyGraph;

/// Operation names whose receiver is considered the producing model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelOperations {
    names: HashSet<String>,
}

impl Default for ModelOperations {
    fn default() -> Self {
        Self::new(DEFAULT_MODEL_OPERATIONS.iter().copied())
    }
}

impl ModelOperations {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn from_config(config: &LineageConfig) -> Self {
        Self::new(config.model_operations.iter().cloned())
    }

    pub fn contains(&self, operation: &str) -> bool {
        self.names.contains(operation)
    }
}

pub struct OriginResolver<'a> {
    graph: &'a DependencyGraph,
    operations: &'a ModelOperations,
}

impl<'a> OriginResolver<'a> {
    pub fn new(graph: &'a DependencyGraph, operations: &'a ModelOperations) -> Self {
        Self { graph, operations }
    }

    pub fn graph(&self) -> &'a DependencyGraph {
        self.graph
    }

    /// Returns the receiver of the nearest model-producing call that `start`
    /// depends on. Dependencies that are themselves method results are
    /// explored before the rest at each step.
    pub fn resolve(&self, start: &str) -> Option<&'a str> {
        let mut visited: HashSet<&str> = HashSet::new();
        let mut queue: VecDeque<&str> = VecDeque::new();
        queue.push_back(start);

        while let Some(current) = queue.pop_front() {
            if visited.contains(current) {
                continue;
            }
            let Some(node) = self.graph.get(current) else {
                continue;
            };
            visited.insert(node.name.as_str());

            if let (Some(method), Some(parent)) = (&node.method_call, &node.parent_obj) {
                if self.operations.contains(method) {
                    tracing::trace!(start, origin = %parent, via = %node.name, "origin resolved");
                    return Some(parent.as_str());
                }
            }

            let (with_method, without_method): (Vec<&str>, Vec<&str>) = node
                .assigned_from
                .iter()
                .map(String::as_str)
                .partition(|dep| self.graph.get(dep).is_some_and(|n| n.has_method_call()));

            queue.extend(with_method);
            queue.extend(without_method);
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve(graph: &DependencyGraph, start: &str) -> Option<String> {
        let operations = ModelOperations::default();
        OriginResolver::new(graph, &operations)
            .resolve(start)
            .map(str::to_string)
    }

    #[test]
    fn resolves_direct_predict_call() {
        let mut graph = DependencyGraph::new();
        graph.add_assignment("m", Vec::<String>::new(), None, None);
        graph.add_assignment("p", ["m", "X"], Some("predict"), Some("m"));

        assert_eq!(resolve(&graph, "p"), Some("m".to_string()));
    }

    #[test]
    fn resolves_through_intermediate_variables() {
        let mut graph = DependencyGraph::new();
        graph.add_assignment("proba", ["clf", "X"], Some("predict_proba"), Some("clf"));
        graph.add_assignment("scores", ["proba"], None, None);
        graph.add_assignment("ranked", ["scores"], Some("argsort"), Some("np"));

        assert_eq!(resolve(&graph, "ranked"), Some("clf".to_string()));
    }

    #[test]
    fn unknown_variable_has_no_origin() {
        let graph = DependencyGraph::new();

        assert_eq!(resolve(&graph, "missing"), None);
    }

    #[test]
    fn non_model_method_is_not_an_origin() {
        let mut graph = DependencyGraph::new();
        graph.add_assignment("df", ["pd"], Some("read_csv"), Some("pd"));

        assert_eq!(resolve(&graph, "df"), None);
    }

    #[test]
    fn cycle_terminates_without_origin() {
        let mut graph = DependencyGraph::new();
        graph.add_assignment("a", ["b"], None, None);
        graph.add_assignment("b", ["a"], None, None);

        assert_eq!(resolve(&graph, "a"), None);
        assert_eq!(resolve(&graph, "b"), None);
    }

    #[test]
    fn self_dependency_terminates() {
        let mut graph = DependencyGraph::new();
        graph.add_assignment("a", ["a"], None, None);

        assert_eq!(resolve(&graph, "a"), None);
    }

    #[test]
    fn method_dependencies_are_explored_first() {
        let mut graph = DependencyGraph::new();
        // `plain` leads to model_b through two hops, `scored` reaches model_a
        // in one; both are at the same depth from `combined`.
        graph.add_assignment("raw", ["model_b", "X"], Some("predict"), Some("model_b"));
        graph.add_assignment("plain", ["raw"], None, None);
        graph.add_assignment("scored", ["model_a", "X"], Some("predict"), Some("model_a"));
        graph.add_assignment("combined", ["plain", "scored"], None, None);

        assert_eq!(resolve(&graph, "combined"), Some("model_a".to_string()));
    }

    #[test]
    fn first_seen_order_breaks_ties() {
        let mut graph = DependencyGraph::new();
        graph.add_assignment("p1", ["m1"], Some("predict"), Some("m1"));
        graph.add_assignment("p2", ["m2"], Some("predict"), Some("m2"));
        graph.add_assignment("both", ["p2", "p1"], None, None);

        assert_eq!(resolve(&graph, "both"), Some("m2".to_string()));
    }

    #[test]
    fn method_without_parent_is_not_an_origin() {
        let mut graph = DependencyGraph::new();
        graph.add_assignment("p", ["X"], Some("predict"), None);

        assert_eq!(resolve(&graph, "p"), None);
    }

    #[test]
    fn custom_operations_are_honored() {
        let mut graph = DependencyGraph::new();
        graph.add_assignment("f", ["prophet"], Some("forecast"), Some("prophet"));

        let operations = ModelOperations::new(["forecast"]);
        let resolver = OriginResolver::new(&graph, &operations);

        assert_eq!(resolver.resolve("f"), Some("prophet"));
        assert_eq!(resolve(&graph, "f"), None);
    }
}

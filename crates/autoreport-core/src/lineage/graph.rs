//! Dependency graph of assigned variables
//!
//! One node per variable name. Repeated assignments to the same name
//! accumulate their right-hand-side dependencies into the same node, so a
//! node may carry edges from several assignment sites.

use indexmap::{IndexMap, IndexSet};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VarNode {
    pub name: String,
    /// Identifiers read on the right-hand side of every assignment, in
    /// first-seen order.
    pub assigned_from: IndexSet<String>,
    pub method_call: Option<String>,
    pub parent_obj: Option<String>,
}

impl VarNode {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            assigned_from: IndexSet::new(),
            method_call: None,
            parent_obj: None,
        }
    }

    pub fn has_method_call(&self) -> bool {
        self.method_call.as_deref().is_some_and(|m| !m.is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DependencyGraph {
    nodes: IndexMap<String, VarNode>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `target = <expr>` where `deps` are the identifiers read by
    /// `<expr>` and `method`/`parent` describe its `receiver.method(...)`
    /// call, if any. Dependencies are unioned into the existing node;
    /// `method`/`parent` only overwrite when present.
    pub fn add_assignment<I, S>(
        &mut self,
        target: &str,
        deps: I,
        method: Option<&str>,
        parent: Option<&str>,
    ) where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let node = self
            .nodes
            .entry(target.to_string())
            .or_insert_with(|| VarNode::new(target));

        node.assigned_from.extend(deps.into_iter().map(Into::into));

        if let Some(method) = method {
            node.method_call = Some(method.to_string());
        }
        if let Some(parent) = parent {
            node.parent_obj = Some(parent.to_string());
        }
    }

    pub fn get(&self, name: &str) -> Option<&VarNode> {
        self.nodes.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &VarNode> {
        self.nodes.values()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.nodes.values().map(|n| n.assigned_from.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

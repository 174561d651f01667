//! Builds a `DependencyGraph` from assignment statements.

use indexmap::IndexSet;
use rustpython_parser::ast::{self, Expr, ExprContext, Stmt};

use super::graph::DependencyGraph;
use super::walk::{SourceVisitor, walk_body, walk_expr, walk_stmt};

/// Identifiers and the `receiver.method(...)` call observed while reading
/// one right-hand side.
#[derive(Debug, Default)]
struct RhsSummary {
    deps: IndexSet<String>,
    method: Option<String>,
    parent: Option<String>,
}

impl SourceVisitor for RhsSummary {
    fn visit_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Name(ast::ExprName { id, ctx, .. }) => {
                if matches!(ctx, ExprContext::Load) {
                    self.deps.insert(id.as_str().to_string());
                }
            }
            Expr::Call(ast::ExprCall {
                func,
                args,
                keywords,
                ..
            }) => {
                if let Expr::Attribute(ast::ExprAttribute { value, attr, .. }) = func.as_ref() {
                    match value.as_ref() {
                        Expr::Name(ast::ExprName { id, .. }) => {
                            self.parent = Some(id.as_str().to_string());
                            self.method = Some(attr.as_str().to_string());
                            self.deps.insert(id.as_str().to_string());
                        }
                        receiver => self.visit_expr(receiver),
                    }
                }
                for arg in args {
                    self.visit_expr(arg);
                }
                for keyword in keywords {
                    self.visit_expr(&keyword.value);
                }
            }
            // The index of `value[index]` is not lineage-relevant.
            Expr::Subscript(ast::ExprSubscript { value, .. }) => self.visit_expr(value),
            _ => walk_expr(self, expr),
        }
    }
}

pub struct GraphBuilder {
    graph: DependencyGraph,
}

impl GraphBuilder {
    fn new() -> Self {
        Self {
            graph: DependencyGraph::new(),
        }
    }

    /// Graph for a parsed module body. Only simple-name targets of `=` and
    /// annotated assignments with a value create nodes.
    pub fn build(body: &[Stmt]) -> DependencyGraph {
        let mut builder = Self::new();
        walk_body(&mut builder, body);
        tracing::debug!(
            nodes = builder.graph.node_count(),
            edges = builder.graph.edge_count(),
            "dependency graph built"
        );
        builder.graph
    }

    fn record(&mut self, targets: &[Expr], value: &Expr) {
        let mut rhs = RhsSummary::default();
        rhs.visit_expr(value);

        for target in targets {
            if let Expr::Name(ast::ExprName { id, .. }) = target {
                self.graph.add_assignment(
                    id.as_str(),
                    rhs.deps.iter().cloned(),
                    rhs.method.as_deref(),
                    rhs.parent.as_deref(),
                );
            }
        }
    }
}

impl SourceVisitor for GraphBuilder {
    fn visit_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Assign(ast::StmtAssign { targets, value, .. }) => self.record(targets, value),
            Stmt::AnnAssign(ast::StmtAnnAssign {
                target,
                value: Some(value),
                ..
            }) => self.record(std::slice::from_ref(target.as_ref()), value),
            _ => walk_stmt(self, stmt),
        }
    }

    fn visit_expr(&mut self, _expr: &Expr) {}
}

//! Plotting call detection and plot-to-origin mapping
//!
//! A plotting call is `<alias>.<function>(...)` with a recognized alias and
//! function name. Calls are numbered from 1 in source order; that number is
//! the plot index used to join against captured figures.

use std::collections::{BTreeMap, HashSet};

use indexmap::IndexSet;
use rustpython_parser::ast::{self, Expr};
use serde::Serialize;

use crate::config::{DEFAULT_PLOT_ALIASES, DEFAULT_PLOT_FUNCTIONS, LineageConfig};
use crate::parser::ParsedScript;

use super::resolver::OriginResolver;
use super::walk::{SourceVisitor, walk_body, walk_expr};

/// Plot index (1-based) to the resolved origin, `None` when unresolved.
pub type PlotMapping = BTreeMap<usize, Option<String>>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlotCall {
    pub function_name: String,
    pub referenced_variables: IndexSet<String>,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlotRecognizer {
    aliases: HashSet<String>,
    functions: HashSet<String>,
}

impl Default for PlotRecognizer {
    fn default() -> Self {
        Self::new(
            DEFAULT_PLOT_ALIASES.iter().copied(),
            DEFAULT_PLOT_FUNCTIONS.iter().copied(),
        )
    }
}

impl PlotRecognizer {
    pub fn new<A, F, S, T>(aliases: A, functions: F) -> Self
    where
        A: IntoIterator<Item = S>,
        F: IntoIterator<Item = T>,
        S: Into<String>,
        T: Into<String>,
    {
        Self {
            aliases: aliases.into_iter().map(Into::into).collect(),
            functions: functions.into_iter().map(Into::into).collect(),
        }
    }

    pub fn from_config(config: &LineageConfig) -> Self {
        Self::new(
            config.plot_aliases.iter().cloned(),
            config.plot_functions.iter().cloned(),
        )
    }

    /// Returns the plotting function name if `call` targets a recognized
    /// `<alias>.<function>`.
    pub fn match_call<'e>(&self, call: &'e ast::ExprCall) -> Option<&'e str> {
        let Expr::Attribute(ast::ExprAttribute { value, attr, .. }) = call.func.as_ref() else {
            return None;
        };
        let Expr::Name(ast::ExprName { id, .. }) = value.as_ref() else {
            return None;
        };

        (self.aliases.contains(id.as_str()) && self.functions.contains(attr.as_str()))
            .then_some(attr.as_str())
    }
}

pub struct PlotCallCollector<'a> {
    recognizer: &'a PlotRecognizer,
    source: &'a str,
    calls: Vec<PlotCall>,
}

impl<'a> PlotCallCollector<'a> {
    pub fn collect(script: &'a ParsedScript, recognizer: &'a PlotRecognizer) -> Vec<PlotCall> {
        let mut collector = Self {
            recognizer,
            source: script.source(),
            calls: Vec::new(),
        };
        walk_body(&mut collector, script.body());
        tracing::debug!(plot_calls = collector.calls.len(), "plot calls collected");
        collector.calls
    }

    fn line_of(&self, call: &ast::ExprCall) -> usize {
        let offset = (u32::from(call.range.start()) as usize).min(self.source.len());
        self.source.as_bytes()[..offset]
            .iter()
            .filter(|b| **b == b'\n')
            .count()
            + 1
    }
}

impl SourceVisitor for PlotCallCollector<'_> {
    fn visit_expr(&mut self, expr: &Expr) {
        if let Expr::Call(call) = expr {
            if let Some(function_name) = self.recognizer.match_call(call) {
                let mut referenced_variables = IndexSet::new();
                for arg in &call.args {
                    collect_names(arg, &mut referenced_variables);
                }
                for keyword in &call.keywords {
                    collect_names(&keyword.value, &mut referenced_variables);
                }

                self.calls.push(PlotCall {
                    function_name: function_name.to_string(),
                    referenced_variables,
                    line: self.line_of(call),
                });
            }
        }
        walk_expr(self, expr);
    }
}

/// Leaf identifiers reachable through subscripts, attributes and operators.
fn collect_names(expr: &Expr, names: &mut IndexSet<String>) {
    match expr {
        Expr::Name(ast::ExprName { id, .. }) => {
            names.insert(id.as_str().to_string());
        }
        Expr::Subscript(ast::ExprSubscript { value, .. })
        | Expr::Attribute(ast::ExprAttribute { value, .. }) => collect_names(value, names),
        Expr::BinOp(ast::ExprBinOp { left, right, .. }) => {
            collect_names(left, names);
            collect_names(right, names);
        }
        Expr::UnaryOp(ast::ExprUnaryOp { operand, .. }) => collect_names(operand, names),
        _ => {}
    }
}

/// Maps each plot index to the origin of the first referenced variable
/// that resolves.
pub fn map_plots_to_origins(calls: &[PlotCall], resolver: &OriginResolver<'_>) -> PlotMapping {
    calls
        .iter()
        .enumerate()
        .map(|(i, call)| {
            let origin = call
                .referenced_variables
                .iter()
                .find_map(|var| resolver.resolve(var))
                .map(str::to_string);
            (i + 1, origin)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lineage::builder::GraphBuilder;
    use crate::lineage::resolver::ModelOperations;

    fn collect(code: &str) -> Vec<PlotCall> {
        let parsed = ParsedScript::from_source("cell.py", code);
        PlotCallCollector::collect(&parsed, &PlotRecognizer::default())
    }

    fn map(code: &str) -> PlotMapping {
        let parsed = ParsedScript::from_source("cell.py", code);
        let graph = GraphBuilder::build(parsed.body());
        let operations = ModelOperations::default();
        let resolver = OriginResolver::new(&graph, &operations);
        let calls = PlotCallCollector::collect(&parsed, &PlotRecognizer::default());
        map_plots_to_origins(&calls, &resolver)
    }

    fn vars(call: &PlotCall) -> Vec<&str> {
        call.referenced_variables.iter().map(String::as_str).collect()
    }

    #[test]
    fn collects_recognized_plot_call() {
        let calls = collect("plt.hist(y_prob, bins=bins)");

        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].function_name, "hist");
        assert_eq!(vars(&calls[0]), vec!["y_prob", "bins"]);
        assert_eq!(calls[0].line, 1);
    }

    #[test]
    fn ignores_unrecognized_calls() {
        let calls = collect("plt.title(name)\nplt.show()\nax.plot(x)\nnp.hist(x)");

        assert!(calls.is_empty());
    }

    #[test]
    fn collects_through_subscripts_attributes_and_operators() {
        let calls = collect("plt.scatter(X_test[:, 0], -model.coef_ * scale + y[mask])");

        assert_eq!(vars(&calls[0]), vec!["X_test", "model", "scale", "y"]);
    }

    #[test]
    fn ignores_literals_and_nested_calls_in_arguments() {
        let calls = collect("plt.plot([1, 2], np.log(x), 'r--')");

        assert_eq!(calls.len(), 1);
        assert!(calls[0].referenced_variables.is_empty());
    }

    #[test]
    fn plot_calls_are_in_source_order() {
        let code = r#"
plt.plot(fpr, tpr)
for name in names:
    plt.bar(name, scores)
plt.pyplot = None
pyplot.imshow(matrix)
"#;

        let calls = collect(code);

        let functions: Vec<&str> = calls.iter().map(|c| c.function_name.as_str()).collect();
        assert_eq!(functions, vec!["plot", "bar", "imshow"]);
        assert_eq!(
            calls.iter().map(|c| c.line).collect::<Vec<_>>(),
            vec![2, 4, 6]
        );
    }

    #[test]
    fn custom_recognizer() {
        let parsed = ParsedScript::from_source("cell.py", "sns.histplot(data)\nplt.hist(x)");
        let recognizer = PlotRecognizer::new(["sns"], ["histplot"]);

        let calls = PlotCallCollector::collect(&parsed, &recognizer);

        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].function_name, "histplot");
    }

    #[test]
    fn maps_plot_to_model_through_proba_slice() {
        let mapping = map("y_prob = clf.predict_proba(X)[:, 1]\nplt.hist(y_prob)\n");

        assert_eq!(mapping.len(), 1);
        assert_eq!(mapping[&1], Some("clf".to_string()));
    }

    #[test]
    fn unresolved_plot_maps_to_none() {
        let mapping = map("data = load()\nplt.plot(data)\nplt.hist(y_prob)");

        assert_eq!(mapping[&1], None);
        assert_eq!(mapping[&2], None);
    }

    #[test]
    fn first_resolving_variable_wins() {
        let code = r#"
pa = model_a.predict(X)
pb = model_b.predict(X)
plt.scatter(raw, pb, pa)
"#;

        let mapping = map(code);

        assert_eq!(mapping[&1], Some("model_b".to_string()));
    }

    #[test]
    fn script_with_parse_error_has_no_plots() {
        let mapping = map("plt.plot(x\n");

        assert!(mapping.is_empty());
    }
}

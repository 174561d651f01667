//! Pretty formatter for human-readable terminal output

use autoreport_core::analysis::{LineageAnalyzer, ScriptLineage};
use autoreport_core::diagnostic::{Diagnostic, Severity};
use autoreport_core::report::LineageReport;
use colored::{ColoredString, Colorize};

use crate::commands::lineage::ScriptResult;

pub struct PrettyFormatter<'a> {
    analyzer: &'a LineageAnalyzer,
}

impl<'a> PrettyFormatter<'a> {
    pub fn new(analyzer: &'a LineageAnalyzer) -> Self {
        Self { analyzer }
    }

    pub fn format(&self, results: &[ScriptResult]) -> String {
        let mut sections = Vec::new();
        for result in results {
            sections.push(self.format_script(result));
        }

        let mut output = sections.join("\n");
        output.push_str(&self.format_summary(results));
        output
    }

    fn format_script(&self, result: &ScriptResult) -> String {
        let lineage = &result.lineage;
        let mut lines = vec![format!("{}", result.path.display().to_string().bold())];

        lines.extend(self.format_graph(lineage));
        lines.extend(self.format_plots(lineage));
        if let Some(report) = &result.report {
            lines.extend(self.format_report(report));
        }

        let diagnostics = result
            .report
            .as_ref()
            .map(|r| r.diagnostics.as_slice())
            .unwrap_or(&lineage.diagnostics);
        for diag in diagnostics {
            lines.push(self.format_diagnostic(diag));
        }

        let mut section = lines.join("\n");
        section.push('\n');
        section
    }

    fn format_graph(&self, lineage: &ScriptLineage) -> Vec<String> {
        let graph = &lineage.graph;
        let mut lines = vec![format!(
            "  {} {} variable(s), {} edge(s)",
            "graph".blue().bold(),
            graph.node_count(),
            graph.edge_count()
        )];

        for node in graph.nodes() {
            let deps: Vec<&str> = node.assigned_from.iter().map(String::as_str).collect();
            let call = match (&node.parent_obj, &node.method_call) {
                (Some(parent), Some(method)) => format!(" via {}.{}()", parent, method),
                _ => String::new(),
            };
            let origin = self
                .analyzer
                .resolve(lineage, &node.name)
                .map(|o| o.green())
                .unwrap_or_else(|| "-".dimmed());

            lines.push(format!(
                "    {} <- [{}]{} {} {}",
                node.name.cyan(),
                deps.join(", "),
                call.dimmed(),
                "=>".blue(),
                origin
            ));
        }
        lines
    }

    fn format_plots(&self, lineage: &ScriptLineage) -> Vec<String> {
        if lineage.plot_calls.is_empty() {
            return Vec::new();
        }

        let mut lines = vec![format!("  {}", "plots".blue().bold())];
        for (i, call) in lineage.plot_calls.iter().enumerate() {
            let index = i + 1;
            let vars: Vec<&str> = call
                .referenced_variables
                .iter()
                .map(String::as_str)
                .collect();
            let origin = lineage
                .plot_mapping
                .get(&index)
                .and_then(|o| o.as_deref())
                .map(|o| o.green())
                .unwrap_or_else(|| "unresolved".yellow());

            lines.push(format!(
                "    #{} {}({}) {} {} {}",
                index,
                call.function_name,
                vars.join(", "),
                format!("line {}", call.line).dimmed(),
                "=>".blue(),
                origin
            ));
        }
        lines
    }

    fn format_report(&self, report: &LineageReport) -> Vec<String> {
        let mut lines = Vec::new();

        if !report.groups.is_empty() {
            lines.push(format!("  {}", "owners".blue().bold()));
            for (owner, variables) in &report.groups {
                lines.push(format!("    {}: {}", owner.green(), variables.join(", ")));
            }
        }

        if !report.models.is_empty() || !report.predictor_classes.is_empty() {
            lines.push(format!("  {}", "models".blue().bold()));
            for model in &report.models {
                lines.push(format!("    {} {}", model.name.cyan(), model.type_name.dimmed()));
            }
            for class in &report.predictor_classes {
                lines.push(format!(
                    "    {} {}",
                    class.dimmed(),
                    "(class with predict, not a fitted model)".dimmed()
                ));
            }
        }

        if !report.metrics.is_empty() {
            lines.push(format!("  {}", "metrics".blue().bold()));
            for (owner, metrics) in &report.metrics {
                let values: Vec<String> = metrics
                    .iter()
                    .map(|m| format!("{}={}", m.key, m.value))
                    .collect();
                lines.push(format!("    {}: {}", owner.green(), values.join(", ")));
            }
        }

        if !report.artifacts.is_empty() {
            lines.push(format!("  {}", "artifacts".blue().bold()));
            for attribution in &report.artifacts {
                let plot = attribution
                    .plot_index
                    .map(|i| format!("plot #{}", i))
                    .unwrap_or_else(|| "no plot".to_string());
                lines.push(format!(
                    "    {} {} {} {}",
                    attribution.artifact,
                    plot.dimmed(),
                    "=>".blue(),
                    attribution.owner.green()
                ));
            }
        }

        lines
    }

    fn format_diagnostic(&self, diag: &Diagnostic) -> String {
        format!("  {}: {}", self.colorize_severity(&diag.severity), diag.message)
    }

    fn colorize_severity(&self, severity: &Severity) -> ColoredString {
        match severity {
            Severity::Error => "error".red().bold(),
            Severity::Warning => "warning".yellow().bold(),
            Severity::Info => "info".blue().bold(),
        }
    }

    fn format_summary(&self, results: &[ScriptResult]) -> String {
        let plots: usize = results.iter().map(|r| r.lineage.plot_calls.len()).sum();
        let resolved: usize = results
            .iter()
            .map(|r| {
                r.lineage
                    .plot_mapping
                    .values()
                    .filter(|o| o.is_some())
                    .count()
            })
            .sum();

        format!(
            "\nAnalyzed {} script(s): {} of {} plot(s) traced to a model\n",
            results.len(),
            resolved,
            plots
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use autoreport_core::capture::CaptureContext;
    use autoreport_core::snapshot::Snapshot;
    use std::path::PathBuf;

    fn plain() {
        colored::control::set_override(false);
    }

    fn result_for(
        analyzer: &LineageAnalyzer,
        code: &str,
        runtime: Option<(&str, Option<CaptureContext>)>,
    ) -> ScriptResult {
        let lineage = analyzer.analyze(&analyzer.parse("train.py", code));
        let report = runtime.map(|(snapshot, capture)| {
            let snapshot = Snapshot::from_json_str(snapshot).unwrap();
            analyzer.report(&lineage, &snapshot, capture.as_ref())
        });
        ScriptResult {
            path: PathBuf::from("train.py"),
            lineage,
            report,
        }
    }

    const SVC_SNAPSHOT: &str = r#"{"clf": {"kind": "model", "type": "SVC"}}"#;

    #[test]
    fn pretty_output_lists_variables_and_plots() {
        plain();
        let analyzer = LineageAnalyzer::new();
        let results = vec![result_for(
            &analyzer,
            "clf = SVC()\np = clf.predict(X)\nplt.plot(p)\nplt.hist(noise)\n",
            None,
        )];

        let output = PrettyFormatter::new(&analyzer).format(&results);

        assert!(output.contains("train.py"));
        assert!(output.contains("p <- [clf, X] via clf.predict() => clf"));
        assert!(output.contains("#1 plot(p) line 3 => clf"));
        assert!(output.contains("#2 hist(noise) line 4 => unresolved"));
        assert!(output.contains("1 of 2 plot(s) traced"));
    }

    #[test]
    fn pretty_output_includes_report_and_mismatch() {
        plain();
        let analyzer = LineageAnalyzer::new();
        let results = vec![result_for(
            &analyzer,
            "clf = SVC()\np = clf.predict(X)\nplt.plot(p)\n",
            Some((SVC_SNAPSHOT, Some(CaptureContext::new()))),
        )];

        let output = PrettyFormatter::new(&analyzer).format(&results);

        assert!(output.contains("clf: clf"));
        assert!(output.contains("clf SVC"));
        assert!(output.contains("warning: 1 plot call(s) but only 0 captured figure(s)"));
    }

    #[test]
    fn parse_failure_is_reported() {
        plain();
        let analyzer = LineageAnalyzer::new();
        let results = vec![result_for(&analyzer, "x = (\n", None)];

        let output = PrettyFormatter::new(&analyzer).format(&results);

        assert!(output.contains("warning: source could not be parsed"));
        assert!(output.contains("0 variable(s)"));
    }

    #[test]
    fn metrics_and_predictor_classes_are_listed() {
        plain();
        let analyzer = LineageAnalyzer::new();
        let snapshot = r#"{
            "clf": {"kind": "model", "type": "SVC"},
            "SVC": {"kind": "class", "name": "SVC", "has_predict": true},
            "acc": {"kind": "scalar", "value": 0.5},
            "scores": {"kind": "mapping", "values": {"f1": 0.25}}
        }"#;
        let results = vec![result_for(
            &analyzer,
            "clf = SVC()\np = clf.predict(X)\nacc = score(y, p)\nplt.plot(p)\n",
            Some((snapshot, None)),
        )];

        let output = PrettyFormatter::new(&analyzer).format(&results);

        assert!(output.contains("SVC (class with predict, not a fitted model)"));
        assert!(output.contains("clf: acc=0.5"));
        assert!(output.contains("ungrouped: scores/f1=0.25"));
        assert!(!output.contains("warning"));
    }
}

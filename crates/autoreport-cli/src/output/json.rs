//! JSON output formatter for programmatic integration

use autoreport_core::analysis::LineageAnalyzer;
use autoreport_core::diagnostic::Diagnostic;
use autoreport_core::report::LineageReport;
use serde::Serialize;

use crate::commands::lineage::ScriptResult;

#[derive(Serialize)]
pub struct JsonOutput<'a> {
    pub version: &'static str,
    pub metadata: JsonMetadata,
    pub summary: JsonSummary,
    pub scripts: Vec<JsonScript<'a>>,
}

#[derive(Serialize)]
pub struct JsonMetadata {
    pub autoreport_version: &'static str,
    pub working_directory: String,
    pub analyzed_path: String,
}

#[derive(Serialize)]
pub struct JsonSummary {
    pub total_scripts: usize,
    pub parse_failures: usize,
    pub plot_calls: usize,
    pub resolved_plots: usize,
}

#[derive(Serialize)]
pub struct JsonScript<'a> {
    pub path: String,
    pub variables: Vec<JsonVariable<'a>>,
    pub plots: Vec<JsonPlot<'a>>,
    pub diagnostics: &'a [Diagnostic],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<&'a LineageReport>,
}

#[derive(Serialize)]
pub struct JsonVariable<'a> {
    pub name: &'a str,
    pub assigned_from: Vec<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method_call: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_obj: Option<&'a str>,
    pub origin: Option<&'a str>,
}

#[derive(Serialize)]
pub struct JsonPlot<'a> {
    pub index: usize,
    pub function: &'a str,
    pub line: usize,
    pub referenced_variables: Vec<&'a str>,
    pub origin: Option<&'a str>,
}

pub struct JsonFormatter<'a> {
    analyzer: &'a LineageAnalyzer,
}

impl<'a> JsonFormatter<'a> {
    pub fn new(analyzer: &'a LineageAnalyzer) -> Self {
        Self { analyzer }
    }

    pub fn format(&self, results: &[ScriptResult], analyzed_path: &str) -> String {
        let output = self.build_output(results, analyzed_path);
        serde_json::to_string_pretty(&output).unwrap_or_else(|_| "{}".to_string())
    }

    fn build_output<'r>(&self, results: &'r [ScriptResult], analyzed_path: &str) -> JsonOutput<'r>
    where
        'a: 'r,
    {
        JsonOutput {
            version: "1.0",
            metadata: JsonMetadata {
                autoreport_version: env!("CARGO_PKG_VERSION"),
                working_directory: std::env::current_dir()
                    .map(|p| p.to_string_lossy().to_string())
                    .unwrap_or_default(),
                analyzed_path: analyzed_path.to_string(),
            },
            summary: build_summary(results),
            scripts: results.iter().map(|r| self.convert_script(r)).collect(),
        }
    }

    fn convert_script<'r>(&self, result: &'r ScriptResult) -> JsonScript<'r>
    where
        'a: 'r,
    {
        let lineage = &result.lineage;

        let variables = lineage
            .graph
            .nodes()
            .map(|node| JsonVariable {
                name: &node.name,
                assigned_from: node.assigned_from.iter().map(String::as_str).collect(),
                method_call: node.method_call.as_deref(),
                parent_obj: node.parent_obj.as_deref(),
                origin: self.analyzer.resolve(lineage, &node.name),
            })
            .collect();

        let plots = lineage
            .plot_calls
            .iter()
            .enumerate()
            .map(|(i, call)| JsonPlot {
                index: i + 1,
                function: &call.function_name,
                line: call.line,
                referenced_variables: call
                    .referenced_variables
                    .iter()
                    .map(String::as_str)
                    .collect(),
                origin: lineage.plot_mapping.get(&(i + 1)).and_then(|o| o.as_deref()),
            })
            .collect();

        JsonScript {
            path: result.path.to_string_lossy().to_string(),
            variables,
            plots,
            diagnostics: &lineage.diagnostics,
            report: result.report.as_ref(),
        }
    }
}

fn build_summary(results: &[ScriptResult]) -> JsonSummary {
    let mut summary = JsonSummary {
        total_scripts: results.len(),
        parse_failures: 0,
        plot_calls: 0,
        resolved_plots: 0,
    };

    for result in results {
        let lineage = &result.lineage;
        if lineage.diagnostics.iter().any(|d| d.is_parse_failure()) {
            summary.parse_failures += 1;
        }
        summary.plot_calls += lineage.plot_calls.len();
        summary.resolved_plots += lineage.plot_mapping.values().filter(|o| o.is_some()).count();
    }

    summary
}

//! Lineage analysis engine
//!
//! Runs the static pipeline over one script and joins the result with the
//! runtime snapshot and captured artifacts of the same execution.

use serde::Serialize;

use crate::capture::{CaptureContext, join_artifacts};
use crate::config::LineageConfig;
use crate::diagnostic::Diagnostic;
use crate::lineage::{
    ClassifyOptions, DependencyGraph, GraphBuilder, ModelOperations, OriginResolver, PlotCall,
    PlotCallCollector, PlotMapping, PlotRecognizer, classify, map_plots_to_origins, model_names,
    predictor_classes,
};
use crate::parser::{ParsedScript, SourceNormalizer};
use crate::report::{LineageReport, group_by_owner, group_metrics, summarize_models};
use crate::snapshot::Snapshot;

/// Static lineage of one script. Owns its graph; nothing is shared across
/// scripts.
#[derive(Debug, Clone, Serialize)]
pub struct ScriptLineage {
    pub script: String,
    pub graph: DependencyGraph,
    pub plot_calls: Vec<PlotCall>,
    pub plot_mapping: PlotMapping,
    pub diagnostics: Vec<Diagnostic>,
}

pub struct LineageAnalyzer {
    normalizer: SourceNormalizer,
    operations: ModelOperations,
    recognizer: PlotRecognizer,
    classify_options: ClassifyOptions,
}

impl LineageAnalyzer {
    pub fn new() -> Self {
        Self {
            normalizer: SourceNormalizer::default(),
            operations: ModelOperations::default(),
            recognizer: PlotRecognizer::default(),
            classify_options: ClassifyOptions::default(),
        }
    }

    pub fn with_config(config: &LineageConfig) -> Self {
        Self {
            normalizer: SourceNormalizer::from_config(config),
            operations: ModelOperations::from_config(config),
            recognizer: PlotRecognizer::from_config(config),
            classify_options: ClassifyOptions::from_config(config),
        }
    }

    /// Normalizes and parses `source` with this analyzer's directive rules.
    pub fn parse(&self, name: &str, source: &str) -> ParsedScript {
        ParsedScript::with_normalizer(name, source, &self.normalizer)
    }

    pub fn analyze(&self, script: &ParsedScript) -> ScriptLineage {
        let mut diagnostics = Vec::new();
        if let Some(error) = script.error() {
            diagnostics.push(Diagnostic::parse_failure(script.name(), error));
        }

        let graph = GraphBuilder::build(script.body());
        let plot_calls = PlotCallCollector::collect(script, &self.recognizer);
        let plot_mapping = {
            let resolver = OriginResolver::new(&graph, &self.operations);
            map_plots_to_origins(&plot_calls, &resolver)
        };

        ScriptLineage {
            script: script.name().to_string(),
            graph,
            plot_calls,
            plot_mapping,
            diagnostics,
        }
    }

    pub fn resolve<'s>(&'s self, lineage: &'s ScriptLineage, variable: &str) -> Option<&'s str> {
        OriginResolver::new(&lineage.graph, &self.operations).resolve(variable)
    }

    /// Joins `lineage` with the runtime state of the same execution.
    ///
    /// `capture` is `None` when the captured artifacts are unknown; no
    /// artifact join runs and no PositionalMismatch can be reported.
    pub fn report(
        &self,
        lineage: &ScriptLineage,
        snapshot: &Snapshot,
        capture: Option<&CaptureContext>,
    ) -> LineageReport {
        let resolver = OriginResolver::new(&lineage.graph, &self.operations);
        let variables = classify(snapshot, &resolver, &self.classify_options);
        let models = model_names(snapshot, &self.classify_options);

        let mut diagnostics = lineage.diagnostics.clone();
        let artifacts = match capture {
            Some(capture) => {
                let join = join_artifacts(
                    &lineage.script,
                    &lineage.plot_mapping,
                    capture.artifacts(),
                    &self.classify_options.ungrouped_label,
                );
                diagnostics.extend(join.mismatch);
                join.attributions
            }
            None => Vec::new(),
        };

        LineageReport {
            script: lineage.script.clone(),
            groups: group_by_owner(&variables),
            metrics: group_metrics(snapshot, &variables),
            models: summarize_models(snapshot, &models),
            predictor_classes: predictor_classes(snapshot, &self.classify_options),
            variables,
            plots: lineage.plot_mapping.clone(),
            artifacts,
            diagnostics,
        }
    }
}

impl Default for LineageAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

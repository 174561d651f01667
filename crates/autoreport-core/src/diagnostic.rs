//! Diagnostic reporting for lineage analysis
//!
//! Lineage never fails the surrounding execution. Conditions that make
//! attribution less precise are reported as diagnostics instead.

use serde::Serialize;

use crate::parser::ParseError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// Normalized source did not parse; the graph is empty.
    ParseFailure { line: usize, column: usize },
    /// Number of recognized plot calls differs from captured figures.
    PositionalMismatch { plot_calls: usize, artifacts: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub script: String,
    pub message: String,
    #[serde(flatten)]
    pub kind: DiagnosticKind,
}

impl Diagnostic {
    pub fn parse_failure(script: &str, error: &ParseError) -> Self {
        Self {
            severity: Severity::Warning,
            script: script.to_string(),
            message: format!("source could not be parsed: {}", error.message),
            kind: DiagnosticKind::ParseFailure {
                line: error.line,
                column: error.column,
            },
        }
    }

    pub fn positional_mismatch(script: &str, plot_calls: usize, artifacts: usize) -> Self {
        let message = if plot_calls > artifacts {
            format!(
                "{} plot call(s) but only {} captured figure(s); plots after position {} are unmapped",
                plot_calls, artifacts, artifacts
            )
        } else {
            format!(
                "{} captured figure(s) but only {} plot call(s); figures after position {} are ungrouped",
                artifacts, plot_calls, plot_calls
            )
        };

        Self {
            severity: Severity::Warning,
            script: script.to_string(),
            message,
            kind: DiagnosticKind::PositionalMismatch {
                plot_calls,
                artifacts,
            },
        }
    }

    pub fn is_parse_failure(&self) -> bool {
        matches!(self.kind, DiagnosticKind::ParseFailure { .. })
    }

    pub fn is_positional_mismatch(&self) -> bool {
        matches!(self.kind, DiagnosticKind::PositionalMismatch { .. })
    }
}

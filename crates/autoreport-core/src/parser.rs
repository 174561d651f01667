//! Parser module for notebook and script source code
//!
//! Strips interpreter directives and parses the remaining Python source
//! into a syntax tree with `rustpython-parser`.

use std::ops::Range;
use std::sync::OnceLock;

use rustpython_parser::{Mode, ast, parse};

use crate::config::LineageConfig;

pub use rustpython_parser::ast::{Expr, Stmt};

pub const DEFAULT_DIRECTIVE_PREFIXES: &[&str] = &["%%", "%"];
pub const DEFAULT_INTROSPECTION_MARKERS: &[&str] = &["get_ipython()"];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message} at {line}:{column}")]
pub struct ParseError {
    pub line: usize,
    pub column: usize,
    pub offset: usize,
    pub message: String,
}

/// Blanks out lines the Python grammar cannot parse (cell magics, line
/// magics, shell introspection) while keeping the line count intact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceNormalizer {
    directive_prefixes: Vec<String>,
    introspection_markers: Vec<String>,
}

impl Default for SourceNormalizer {
    fn default() -> Self {
        Self {
            directive_prefixes: DEFAULT_DIRECTIVE_PREFIXES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            introspection_markers: DEFAULT_INTROSPECTION_MARKERS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl SourceNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &LineageConfig) -> Self {
        Self {
            directive_prefixes: config.directive_prefixes.clone(),
            introspection_markers: config.introspection_markers.clone(),
        }
    }

    pub fn is_directive(&self, line: &str) -> bool {
        let trimmed = line.trim();
        self.directive_prefixes
            .iter()
            .any(|prefix| !prefix.is_empty() && trimmed.starts_with(prefix.as_str()))
            || self
                .introspection_markers
                .iter()
                .any(|marker| !marker.is_empty() && trimmed.contains(marker.as_str()))
    }

    pub fn normalize(&self, source: &str) -> String {
        source
            .split('\n')
            .map(|line| if self.is_directive(line) { "" } else { line })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

pub struct ParsedScript {
    name: String,
    source: String,
    body: Vec<Stmt>,
    error: Option<ParseError>,
    line_ranges: OnceLock<Vec<Range<usize>>>,
}

impl std::fmt::Debug for ParsedScript {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParsedScript")
            .field("name", &self.name)
            .field("statement_count", &self.body.len())
            .field("error", &self.error)
            .finish()
    }
}

impl ParsedScript {
    pub fn from_source(name: &str, source: &str) -> Self {
        Self::with_normalizer(name, source, &SourceNormalizer::default())
    }

    pub fn with_normalizer(name: &str, source: &str, normalizer: &SourceNormalizer) -> Self {
        let normalized = normalizer.normalize(source);

        let (body, error) = match parse(&normalized, Mode::Module, name) {
            Ok(ast::Mod::Module(module)) => (module.body, None),
            Ok(_) => (Vec::new(), None),
            Err(err) => {
                let offset = u32::from(err.offset) as usize;
                let (line, column) = offset_to_location(&normalized, offset);
                let error = ParseError {
                    line,
                    column,
                    offset,
                    message: err.error.to_string(),
                };
                tracing::warn!(script = name, %error, "source did not parse, lineage is empty");
                (Vec::new(), Some(error))
            }
        };

        Self {
            name: name.to_string(),
            source: normalized,
            body,
            error,
            line_ranges: OnceLock::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Normalized source; has the same number of lines as the input.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn body(&self) -> &[Stmt] {
        &self.body
    }

    pub fn error(&self) -> Option<&ParseError> {
        self.error.as_ref()
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    pub fn line_count(&self) -> usize {
        self.line_ranges
            .get_or_init(|| build_line_ranges(&self.source))
            .len()
    }

    pub fn get_line(&self, line_number: usize) -> Option<&str> {
        if line_number == 0 {
            return None;
        }

        let ranges = self
            .line_ranges
            .get_or_init(|| build_line_ranges(&self.source));
        ranges
            .get(line_number - 1)
            .map(|range| &self.source[range.clone()])
    }
}

fn build_line_ranges(source: &str) -> Vec<Range<usize>> {
    let mut ranges = Vec::new();
    let mut start = 0;

    for (i, c) in source.char_indices() {
        if c == '\n' {
            ranges.push(start..i);
            start = i + 1;
        }
    }

    if start < source.len() {
        ranges.push(start..source.len());
    }

    ranges
}

fn offset_to_location(source: &str, offset: usize) -> (usize, usize) {
    let mut end = offset.min(source.len());
    while !source.is_char_boundary(end) {
        end -= 1;
    }
    let prefix = &source[..end];
    let line = prefix.matches('\n').count() + 1;
    let line_start = prefix.rfind('\n').map(|i| i + 1).unwrap_or(0);
    (line, prefix[line_start..].chars().count() + 1)
}

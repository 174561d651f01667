//! Jupyter notebook input
//!
//! Code cells are joined into one script in document order, each under a
//! `# === Cell N ===` header. Blank cells are skipped but still counted.

use std::path::{Path, PathBuf};

use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum NotebookError {
    #[error("Failed to read notebook '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid notebook JSON: {0}")]
    ParseError(#[from] serde_json::Error),
}

#[derive(Debug, Deserialize)]
struct RawNotebook {
    #[serde(default)]
    cells: Vec<RawCell>,
}

#[derive(Debug, Deserialize)]
struct RawCell {
    cell_type: String,
    #[serde(default)]
    source: CellSource,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CellSource {
    Text(String),
    Lines(Vec<String>),
}

impl Default for CellSource {
    fn default() -> Self {
        Self::Text(String::new())
    }
}

impl CellSource {
    fn into_text(self) -> String {
        match self {
            Self::Text(text) => text,
            Self::Lines(lines) => lines.concat(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeCell {
    /// 1-based position among code cells.
    pub index: usize,
    pub source: String,
}

pub fn code_cells(json: &str) -> Result<Vec<CodeCell>, NotebookError> {
    let notebook: RawNotebook = serde_json::from_str(json)?;

    Ok(notebook
        .cells
        .into_iter()
        .filter(|cell| cell.cell_type == "code")
        .enumerate()
        .map(|(i, cell)| CodeCell {
            index: i + 1,
            source: cell.source.into_text(),
        })
        .collect())
}

pub fn join_cells(cells: &[CodeCell]) -> String {
    cells
        .iter()
        .filter(|cell| !cell.source.trim().is_empty())
        .map(|cell| format!("# === Cell {} ===\n{}", cell.index, cell.source))
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn notebook_source(json: &str) -> Result<String, NotebookError> {
    let cells = code_cells(json)?;
    tracing::debug!(code_cells = cells.len(), "notebook cells read");
    Ok(join_cells(&cells))
}

pub fn load_notebook(path: &Path) -> Result<String, NotebookError> {
    let content = std::fs::read_to_string(path).map_err(|e| NotebookError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;
    notebook_source(&content)
}

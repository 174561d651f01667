//! Lineage command - traces variables and plots back to the producing model

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use autoreport_core::analysis::{LineageAnalyzer, ScriptLineage};
use autoreport_core::capture::{Artifact, CaptureContext};
use autoreport_core::config::load_config_or_default_with_warnings;
use autoreport_core::notebook::notebook_source;
use autoreport_core::report::LineageReport;
use autoreport_core::snapshot::Snapshot;
use clap::{Args, ValueEnum};
use colored::Colorize;
use rayon::prelude::*;
use walkdir::WalkDir;

use crate::output::json::JsonFormatter;
use crate::output::pretty::PrettyFormatter;

const SUPPORTED_EXTENSIONS: &[&str] = &["py", "ipynb"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Pretty,
    Json,
}

#[derive(Args, Debug)]
pub struct LineageArgs {
    /// Python script, notebook, or directory to analyze
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// Runtime namespace snapshot (JSON) used to classify variables
    #[arg(long, value_name = "FILE")]
    pub snapshot: Option<PathBuf>,

    /// Captured artifacts (JSON list) joined with plot calls by position
    #[arg(long, value_name = "FILE")]
    pub artifacts: Option<PathBuf>,

    #[arg(short, long, value_enum, default_value = "pretty")]
    pub format: OutputFormat,

    #[arg(long)]
    pub no_color: bool,
}

/// Runtime state of the single execution being reported. `capture` is
/// `None` when no artifact list was given.
struct Runtime {
    snapshot: Snapshot,
    capture: Option<CaptureContext>,
}

/// Analysis of one input file, with the runtime join when requested.
pub struct ScriptResult {
    pub path: PathBuf,
    pub lineage: ScriptLineage,
    pub report: Option<LineageReport>,
}

impl LineageArgs {
    pub fn run(&self) -> Result<()> {
        self.configure_colors();

        let config_result = load_config_or_default_with_warnings(&config_dir(&self.path));
        for warning in &config_result.warnings {
            eprintln!("{} {}", "warning:".yellow().bold(), warning);
        }
        let analyzer = LineageAnalyzer::with_config(&config_result.config.lineage);

        let files = discover_files(&self.path)?;
        if files.is_empty() {
            println!("No Python scripts or notebooks found.");
            return Ok(());
        }

        let runtime = self.load_runtime(files.len())?;
        let results = analyze_files(&analyzer, &files, runtime.as_ref());

        match self.format {
            OutputFormat::Json => {
                let formatter = JsonFormatter::new(&analyzer);
                println!(
                    "{}",
                    formatter.format(&results, &self.path.to_string_lossy())
                );
            }
            OutputFormat::Pretty => {
                let formatter = PrettyFormatter::new(&analyzer);
                print!("{}", formatter.format(&results));
            }
        }

        Ok(())
    }

    fn configure_colors(&self) {
        let no_color_env = std::env::var("NO_COLOR").is_ok();
        if self.no_color || no_color_env {
            colored::control::set_override(false);
        }
    }

    fn load_runtime(&self, file_count: usize) -> Result<Option<Runtime>> {
        if self.snapshot.is_none() && self.artifacts.is_none() {
            return Ok(None);
        }
        if file_count > 1 {
            anyhow::bail!(
                "--snapshot and --artifacts describe a single execution; pass one script or notebook"
            );
        }

        let snapshot = match &self.snapshot {
            Some(path) => Snapshot::load(path)?,
            None => Snapshot::new(),
        };
        let capture = self
            .artifacts
            .as_deref()
            .map(load_artifacts)
            .transpose()?
            .map(CaptureContext::from_artifacts);

        Ok(Some(Runtime { snapshot, capture }))
    }
}

fn analyze_files(
    analyzer: &LineageAnalyzer,
    files: &[PathBuf],
    runtime: Option<&Runtime>,
) -> Vec<ScriptResult> {
    files
        .par_iter()
        .filter_map(|file| {
            let source = match read_source(file) {
                Ok(source) => source,
                Err(err) => {
                    tracing::warn!(path = %file.display(), error = %err, "skipping unreadable input");
                    return None;
                }
            };

            let script = analyzer.parse(&file.to_string_lossy(), &source);
            let lineage = analyzer.analyze(&script);
            let report = runtime.map(|runtime| {
                analyzer.report(&lineage, &runtime.snapshot, runtime.capture.as_ref())
            });

            Some(ScriptResult {
                path: file.clone(),
                lineage,
                report,
            })
        })
        .collect()
}

fn read_source(path: &Path) -> Result<String> {
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;

    if is_notebook(path) {
        return notebook_source(&content)
            .with_context(|| format!("Failed to read notebook {}", path.display()));
    }
    Ok(content)
}

fn load_artifacts(path: &Path) -> Result<Vec<Artifact>> {
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Invalid artifacts list in {}", path.display()))
}

fn config_dir(path: &Path) -> PathBuf {
    if path.is_file() {
        path.parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    } else {
        path.to_path_buf()
    }
}

fn discover_files(path: &Path) -> Result<Vec<PathBuf>> {
    if !path.exists() {
        anyhow::bail!("Path does not exist: {}", path.display());
    }

    if path.is_file() {
        if is_supported_file(path) {
            return Ok(vec![path.to_path_buf()]);
        } else {
            return Ok(vec![]);
        }
    }

    let mut files: Vec<PathBuf> = WalkDir::new(path)
        .into_iter()
        .filter_entry(|e| !is_hidden(e))
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| is_supported_file(e.path()))
        .map(|e| e.path().to_path_buf())
        .collect();
    files.sort();

    Ok(files)
}

fn is_supported_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| SUPPORTED_EXTENSIONS.contains(&ext))
        .unwrap_or(false)
}

fn is_notebook(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "ipynb")
}

fn is_hidden(entry: &walkdir::DirEntry) -> bool {
    if entry.depth() == 0 {
        return false;
    }
    entry
        .file_name()
        .to_str()
        .map(|name| name.starts_with('.') || name == "__pycache__" || name == "venv")
        .unwrap_or(false)
}

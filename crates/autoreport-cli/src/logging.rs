//! Log setup for the CLI.
//!
//! `--log-level` applies to the lineage crates only (graph statistics,
//! parse failures, positional mismatches); everything else stays at
//! `warn`. A non-empty `RUST_LOG` replaces the whole filter.

use std::path::{Path, PathBuf};

use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan, writer::BoxMakeWriter},
    prelude::*,
};

use crate::cli::Cli;

const LINEAGE_TARGETS: &[&str] = &["autoreport_core", "autoreport"];
const DEFAULT_LOG_FILE: &str = "autoreport.log";

/// Installs the global subscriber. The returned guard must outlive all
/// logging when writing to a file.
pub fn init_logging(cli: &Cli) -> Option<WorkerGuard> {
    let filter = build_filter(cli.log_level.as_tracing_level());

    let (writer, guard) = match &cli.log_file {
        Some(path) => {
            let (dir, file_name) = log_file_location(path);
            let appender = tracing_appender::rolling::never(dir, file_name);
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            (BoxMakeWriter::new(non_blocking), Some(guard))
        }
        None => (BoxMakeWriter::new(std::io::stderr), None),
    };

    let layer = if cli.log_json {
        fmt::layer()
            .json()
            .with_writer(writer)
            .with_span_events(FmtSpan::CLOSE)
            .boxed()
    } else {
        fmt::layer()
            .with_writer(writer)
            .with_target(false)
            .with_ansi(guard.is_none())
            .boxed()
    };

    tracing_subscriber::registry().with(filter).with(layer).init();
    guard
}

fn build_filter(level: Level) -> EnvFilter {
    match std::env::var(EnvFilter::DEFAULT_ENV) {
        Ok(directives) if !directives.trim().is_empty() => EnvFilter::try_new(&directives)
            .unwrap_or_else(|_| EnvFilter::new(lineage_directives(level))),
        _ => EnvFilter::new(lineage_directives(level)),
    }
}

/// Filter directives: `warn` globally, `level` for the lineage crates.
fn lineage_directives(level: Level) -> String {
    let level = level.as_str().to_ascii_lowercase();
    let mut directives = vec!["warn".to_string()];
    directives.extend(
        LINEAGE_TARGETS
            .iter()
            .map(|target| format!("{}={}", target, level)),
    );
    directives.join(",")
}

/// Splits `--log-file` into the directory and file name the appender
/// expects. A directory argument gets the default file name.
fn log_file_location(path: &Path) -> (PathBuf, String) {
    if path.is_dir() {
        return (path.to_path_buf(), DEFAULT_LOG_FILE.to_string());
    }

    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    let file_name = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or(DEFAULT_LOG_FILE)
        .to_string();

    (dir, file_name)
}

pub mod analysis;
pub mod capture;
pub mod config;
pub mod diagnostic;
pub mod lineage;
pub mod notebook;
pub mod parser;
pub mod report;
pub mod snapshot;

pub use analysis::{LineageAnalyzer, ScriptLineage};
pub use capture::{Artifact, ArtifactAttribution, CaptureContext};
pub use diagnostic::{Diagnostic, DiagnosticKind, Severity};
pub use parser::ParsedScript;
pub use report::{LineageReport, Metric};
pub use snapshot::{ModelLike, RuntimeValue, Snapshot};

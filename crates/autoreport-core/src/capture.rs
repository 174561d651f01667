//! Captured artifacts and their positional join with plot calls
//!
//! A `CaptureContext` is owned by the caller for one execution and collects
//! the artifacts that execution produced, in capture order. Figures are
//! joined to plot calls by position: the n-th captured figure belongs to
//! plot index n.

use serde::{Deserialize, Serialize};

use crate::diagnostic::Diagnostic;
use crate::lineage::PlotMapping;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    #[default]
    Figure,
    File,
    Model,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    pub name: String,
    pub path: String,
    #[serde(default)]
    pub kind: ArtifactKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
}

impl Artifact {
    pub fn new(name: &str, path: &str, kind: ArtifactKind) -> Self {
        Self {
            name: name.to_string(),
            path: path.to_string(),
            kind,
            mime: None,
            sha256: None,
            size_bytes: None,
        }
    }

    /// A figure named after its 1-based capture position (`figure_3`).
    pub fn figure(position: usize, path: &str) -> Self {
        Self::new(&format!("figure_{}", position), path, ArtifactKind::Figure)
    }

    pub fn with_digest(mut self, sha256: &str, size_bytes: u64) -> Self {
        self.sha256 = Some(sha256.to_string());
        self.size_bytes = Some(size_bytes);
        self
    }

    pub fn is_figure(&self) -> bool {
        self.kind == ArtifactKind::Figure
    }
}

#[derive(Debug, Default)]
pub struct CaptureContext {
    artifacts: Vec<Artifact>,
}

impl CaptureContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_artifacts(artifacts: Vec<Artifact>) -> Self {
        Self { artifacts }
    }

    pub fn record(&mut self, artifact: Artifact) {
        tracing::trace!(name = %artifact.name, kind = ?artifact.kind, "artifact recorded");
        self.artifacts.push(artifact);
    }

    pub fn artifacts(&self) -> &[Artifact] {
        &self.artifacts
    }

    pub fn figure_count(&self) -> usize {
        self.artifacts.iter().filter(|a| a.is_figure()).count()
    }

    /// Drains the recorded artifacts, leaving the context empty for the
    /// next execution.
    pub fn take(&mut self) -> Vec<Artifact> {
        std::mem::take(&mut self.artifacts)
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactAttribution {
    pub artifact: String,
    /// Plot index the artifact was joined with, absent for surplus
    /// figures and non-figure artifacts.
    pub plot_index: Option<usize>,
    pub owner: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArtifactJoin {
    pub attributions: Vec<ArtifactAttribution>,
    pub mismatch: Option<Diagnostic>,
}

/// Joins captured figures with plot indices by position. Joining stops at
/// the shorter of the two sequences; a count mismatch is reported, never
/// absorbed.
pub fn join_artifacts(
    script: &str,
    plot_mapping: &PlotMapping,
    artifacts: &[Artifact],
    ungrouped_label: &str,
) -> ArtifactJoin {
    let mut attributions = Vec::with_capacity(artifacts.len());
    let mut figure_position = 0;

    for artifact in artifacts {
        if !artifact.is_figure() {
            attributions.push(ArtifactAttribution {
                artifact: artifact.name.clone(),
                plot_index: None,
                owner: ungrouped_label.to_string(),
            });
            continue;
        }

        figure_position += 1;
        let attribution = match plot_mapping.get(&figure_position) {
            Some(origin) => ArtifactAttribution {
                artifact: artifact.name.clone(),
                plot_index: Some(figure_position),
                owner: origin.as_deref().unwrap_or(ungrouped_label).to_string(),
            },
            None => ArtifactAttribution {
                artifact: artifact.name.clone(),
                plot_index: None,
                owner: ungrouped_label.to_string(),
            },
        };
        attributions.push(attribution);
    }

    let plot_calls = plot_mapping.len();
    let mismatch = (plot_calls != figure_position).then(|| {
        tracing::warn!(
            script,
            plot_calls,
            figures = figure_position,
            "plot calls and captured figures differ"
        );
        Diagnostic::positional_mismatch(script, plot_calls, figure_position)
    });

    ArtifactJoin {
        attributions,
        mismatch,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapping(entries: &[(usize, Option<&str>)]) -> PlotMapping {
        entries
            .iter()
            .map(|(i, origin)| (*i, origin.map(str::to_string)))
            .collect()
    }

    fn figures(count: usize) -> Vec<Artifact> {
        (1..=count)
            .map(|i| Artifact::figure(i, &format!("artifacts/{}.png", i)))
            .collect()
    }

    #[test]
    fn equal_counts_join_by_position() {
        let plots = mapping(&[(1, Some("clf")), (2, None)]);

        let join = join_artifacts("cell.py", &plots, &figures(2), "ungrouped");

        assert!(join.mismatch.is_none());
        assert_eq!(
            join.attributions,
            vec![
                ArtifactAttribution {
                    artifact: "figure_1".into(),
                    plot_index: Some(1),
                    owner: "clf".into(),
                },
                ArtifactAttribution {
                    artifact: "figure_2".into(),
                    plot_index: Some(2),
                    owner: "ungrouped".into(),
                },
            ]
        );
    }

    #[test]
    fn more_plots_than_figures_is_reported() {
        let plots = mapping(&[(1, Some("clf")), (2, Some("svm"))]);

        let join = join_artifacts("cell.py", &plots, &figures(1), "ungrouped");

        assert_eq!(join.attributions.len(), 1);
        assert_eq!(join.attributions[0].owner, "clf");
        let mismatch = join.mismatch.unwrap();
        assert!(mismatch.is_positional_mismatch());
        assert!(mismatch.message.contains("2 plot call(s)"));
    }

    #[test]
    fn surplus_figures_are_ungrouped() {
        let plots = mapping(&[(1, Some("clf"))]);

        let join = join_artifacts("cell.py", &plots, &figures(3), "ungrouped");

        let owners: Vec<_> = join.attributions.iter().map(|a| a.owner.as_str()).collect();
        assert_eq!(owners, vec!["clf", "ungrouped", "ungrouped"]);
        assert_eq!(join.attributions[2].plot_index, None);
        assert!(join.mismatch.is_some());
    }

    #[test]
    fn non_figure_artifacts_do_not_shift_positions() {
        let plots = mapping(&[(1, Some("clf"))]);
        let artifacts = vec![
            Artifact::new("model.pkl", "out/model.pkl", ArtifactKind::Model),
            Artifact::figure(1, "out/1.png"),
        ];

        let join = join_artifacts("cell.py", &plots, &artifacts, "ungrouped");

        assert_eq!(join.attributions[0].owner, "ungrouped");
        assert_eq!(join.attributions[1].plot_index, Some(1));
        assert_eq!(join.attributions[1].owner, "clf");
        assert!(join.mismatch.is_none());
    }

    #[test]
    fn context_records_and_drains() {
        let mut context = CaptureContext::new();
        context.record(Artifact::figure(1, "a.png").with_digest("ab12", 2048));
        context.record(Artifact::new("log.txt", "log.txt", ArtifactKind::File));

        assert_eq!(context.figure_count(), 1);
        let taken = context.take();
        assert_eq!(taken.len(), 2);
        assert_eq!(taken[0].size_bytes, Some(2048));
        assert!(context.is_empty());
    }

    #[test]
    fn artifact_kind_defaults_to_figure() {
        let artifact: Artifact =
            serde_json::from_str(r#"{"name": "figure_1", "path": "f.png"}"#).unwrap();

        assert_eq!(artifact.kind, ArtifactKind::Figure);
        assert!(artifact.sha256.is_none());
    }
}

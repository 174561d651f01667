//! Owner-grouped lineage report
//!
//! The hand-off shape for report rendering: every mapping is keyed by plain
//! identifiers so consumers never need graph internals.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::capture::ArtifactAttribution;
use crate::diagnostic::Diagnostic;
use crate::lineage::{OwnerMapping, PlotMapping};
use crate::snapshot::{RuntimeValue, Snapshot};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelSummary {
    pub name: String,
    pub type_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Map<String, Value>>,
}

/// A numeric namespace value reported under its owning model.
///
/// `key` is the variable name, or `variable/subkey` for entries of a
/// mapping; `name` is the short label shown in reports.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metric {
    pub key: String,
    pub name: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineageReport {
    pub script: String,
    pub variables: OwnerMapping,
    pub plots: PlotMapping,
    pub artifacts: Vec<ArtifactAttribution>,
    /// Owner to the variables it owns, both sorted.
    pub groups: BTreeMap<String, Vec<String>>,
    /// Owner to its metrics, in snapshot order.
    pub metrics: BTreeMap<String, Vec<Metric>>,
    pub models: Vec<ModelSummary>,
    /// Type objects defining `predict`, which are not counted as models.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub predictor_classes: Vec<String>,
    pub diagnostics: Vec<Diagnostic>,
}

impl LineageReport {
    pub fn owner_of(&self, variable: &str) -> Option<&str> {
        self.variables.get(variable).map(String::as_str)
    }

    pub fn has_warnings(&self) -> bool {
        !self.diagnostics.is_empty()
    }

    pub fn metrics_of(&self, owner: &str) -> &[Metric] {
        self.metrics.get(owner).map(Vec::as_slice).unwrap_or(&[])
    }
}

pub fn group_by_owner(owners: &OwnerMapping) -> BTreeMap<String, Vec<String>> {
    let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (variable, owner) in owners {
        groups
            .entry(owner.clone())
            .or_default()
            .push(variable.clone());
    }
    for variables in groups.values_mut() {
        variables.sort();
    }
    groups
}

/// Collects scalar and mapping values as metrics under the owner `owners`
/// assigns their variable. Mapping entries expand to `variable/subkey`.
/// Variables without an owner (private names) are skipped.
pub fn group_metrics(
    snapshot: &Snapshot,
    owners: &OwnerMapping,
) -> BTreeMap<String, Vec<Metric>> {
    let mut metrics: BTreeMap<String, Vec<Metric>> = BTreeMap::new();
    for (variable, value) in snapshot.iter() {
        let Some(owner) = owners.get(variable) else {
            continue;
        };
        match value {
            RuntimeValue::Scalar(v) => {
                metrics.entry(owner.clone()).or_default().push(Metric {
                    key: variable.to_string(),
                    name: variable.to_string(),
                    value: *v,
                });
            }
            RuntimeValue::Mapping(entries) => {
                let group = metrics.entry(owner.clone()).or_default();
                for (subkey, v) in entries {
                    group.push(Metric {
                        key: format!("{}/{}", variable, subkey),
                        name: subkey.clone(),
                        value: *v,
                    });
                }
            }
            _ => {}
        }
    }
    metrics.retain(|_, group| !group.is_empty());
    metrics
}

pub fn summarize_models<'a, I>(snapshot: &Snapshot, names: I) -> Vec<ModelSummary>
where
    I: IntoIterator<Item = &'a String>,
{
    names
        .into_iter()
        .filter_map(|name| {
            let model = snapshot.get(name)?.as_model()?;
            Some(ModelSummary {
                name: name.clone(),
                type_name: model.type_name().to_string(),
                params: model.params().cloned(),
            })
        })
        .collect()
}

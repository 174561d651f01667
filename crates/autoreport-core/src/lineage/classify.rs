//! Attribution of snapshot variables to the model that owns them.

use indexmap::{IndexMap, IndexSet};

use crate::config::{DEFAULT_PRIVATE_PREFIX, DEFAULT_UNGROUPED_LABEL, LineageConfig};
use crate::snapshot::{RuntimeValue, Snapshot};

use super::resolver::OriginResolver;

/// Variable name to owning model name (or the ungrouped label), in
/// snapshot order.
pub type OwnerMapping = IndexMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifyOptions {
    pub private_prefix: String,
    pub ungrouped_label: String,
}

impl Default for ClassifyOptions {
    fn default() -> Self {
        Self {
            private_prefix: DEFAULT_PRIVATE_PREFIX.to_string(),
            ungrouped_label: DEFAULT_UNGROUPED_LABEL.to_string(),
        }
    }
}

impl ClassifyOptions {
    pub fn from_config(config: &LineageConfig) -> Self {
        Self {
            private_prefix: config.private_prefix.clone(),
            ungrouped_label: config.ungrouped_label.clone(),
        }
    }

    fn is_private(&self, name: &str) -> bool {
        !self.private_prefix.is_empty() && name.starts_with(&self.private_prefix)
    }
}

/// Non-private snapshot names whose value is a model instance.
pub fn model_names(snapshot: &Snapshot, options: &ClassifyOptions) -> IndexSet<String> {
    snapshot
        .iter()
        .filter(|(name, value)| !options.is_private(name) && value.as_model().is_some())
        .map(|(name, _)| name.to_string())
        .collect()
}

/// Non-private type objects that define `predict`. They look like models
/// by name but are never owners, so reports list them separately.
pub fn predictor_classes(snapshot: &Snapshot, options: &ClassifyOptions) -> Vec<String> {
    snapshot
        .iter()
        .filter(|(name, value)| {
            !options.is_private(name)
                && matches!(value, RuntimeValue::Class { has_predict: true, .. })
        })
        .map(|(name, _)| name.to_string())
        .collect()
}

pub fn classify(
    snapshot: &Snapshot,
    resolver: &OriginResolver<'_>,
    options: &ClassifyOptions,
) -> OwnerMapping {
    let models = model_names(snapshot, options);
    let mut owners = OwnerMapping::new();

    for name in snapshot.names() {
        if options.is_private(name) {
            continue;
        }

        let owner = if models.contains(name) {
            name
        } else {
            match resolver.resolve(name) {
                Some(origin) if models.contains(origin) => origin,
                _ => options.ungrouped_label.as_str(),
            }
        };
        owners.insert(name.to_string(), owner.to_string());
    }

    tracing::debug!(
        variables = owners.len(),
        models = models.len(),
        "variables classified"
    );
    owners
}

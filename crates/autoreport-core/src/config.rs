//! Configuration loading and parsing for autoreport
//!
//! Provides functionality to load and parse `autoreport.toml` configuration files.

use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::parser::{DEFAULT_DIRECTIVE_PREFIXES, DEFAULT_INTROSPECTION_MARKERS};

pub const CONFIG_FILENAME: &str = "autoreport.toml";

pub const DEFAULT_MODEL_OPERATIONS: &[&str] = &[
    "predict",
    "predict_proba",
    "fit",
    "transform",
    "score",
    "decision_function",
];

pub const DEFAULT_PLOT_ALIASES: &[&str] = &["plt", "pyplot"];

pub const DEFAULT_PLOT_FUNCTIONS: &[&str] = &[
    "plot", "scatter", "hist", "bar", "imshow", "contour", "boxplot", "violin", "pie", "fill",
    "step",
];

pub const DEFAULT_PRIVATE_PREFIX: &str = "_";
pub const DEFAULT_UNGROUPED_LABEL: &str = "ungrouped";

const KNOWN_TOP_LEVEL_KEYS: &[&str] = &["lineage"];
const KNOWN_LINEAGE_KEYS: &[&str] = &[
    "model_operations",
    "plot_aliases",
    "plot_functions",
    "directive_prefixes",
    "introspection_markers",
    "private_prefix",
    "ungrouped_label",
];

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid TOML in '{path}': {message}")]
    ParseError { path: PathBuf, message: String },
}

#[derive(Debug, Clone, Default)]
pub struct ConfigResult {
    pub config: Config,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub lineage: LineageConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct LineageConfig {
    /// Method names whose receiver is treated as the producing model.
    pub model_operations: Vec<String>,
    pub plot_aliases: Vec<String>,
    pub plot_functions: Vec<String>,
    pub directive_prefixes: Vec<String>,
    pub introspection_markers: Vec<String>,
    pub private_prefix: String,
    pub ungrouped_label: String,
}

impl Default for LineageConfig {
    fn default() -> Self {
        Self {
            model_operations: to_strings(DEFAULT_MODEL_OPERATIONS),
            plot_aliases: to_strings(DEFAULT_PLOT_ALIASES),
            plot_functions: to_strings(DEFAULT_PLOT_FUNCTIONS),
            directive_prefixes: to_strings(DEFAULT_DIRECTIVE_PREFIXES),
            introspection_markers: to_strings(DEFAULT_INTROSPECTION_MARKERS),
            private_prefix: DEFAULT_PRIVATE_PREFIX.to_string(),
            ungrouped_label: DEFAULT_UNGROUPED_LABEL.to_string(),
        }
    }
}

fn to_strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

pub fn find_config_file(start_dir: &Path) -> Option<PathBuf> {
    let mut current = start_dir.to_path_buf();
    loop {
        let config_path = current.join(CONFIG_FILENAME);
        if config_path.exists() {
            return Some(config_path);
        }
        if !current.pop() {
            return None;
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;

    toml::from_str(&content).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        message: e.message().to_string(),
    })
}

pub fn load_config_with_warnings(path: &Path) -> Result<ConfigResult, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;

    let config: Config = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        message: e.message().to_string(),
    })?;

    let warnings = detect_unknown_keys(&content);

    Ok(ConfigResult { config, warnings })
}

fn detect_unknown_keys(content: &str) -> Vec<String> {
    let mut warnings = Vec::new();

    let table: toml::Table = match content.parse() {
        Ok(t) => t,
        Err(_) => return warnings,
    };

    let known_top: HashSet<&str> = KNOWN_TOP_LEVEL_KEYS.iter().copied().collect();
    for key in table.keys() {
        if !known_top.contains(key.as_str()) {
            warnings.push(format!("Unknown config option: '{}'", key));
        }
    }

    if let Some(toml::Value::Table(lineage)) = table.get("lineage") {
        let known_lineage: HashSet<&str> = KNOWN_LINEAGE_KEYS.iter().copied().collect();
        for key in lineage.keys() {
            if !known_lineage.contains(key.as_str()) {
                warnings.push(format!("Unknown config option in [lineage]: '{}'", key));
            }
        }
    }

    warnings
}

pub fn load_config_or_default(start_dir: &Path) -> Config {
    find_config_file(start_dir)
        .and_then(|path| load_config(&path).ok())
        .unwrap_or_default()
}

pub fn load_config_or_default_with_warnings(start_dir: &Path) -> ConfigResult {
    match find_config_file(start_dir) {
        Some(path) => match load_config_with_warnings(&path) {
            Ok(result) => result,
            Err(err) => ConfigResult {
                config: Config::default(),
                warnings: vec![err.to_string()],
            },
        },
        None => ConfigResult::default(),
    }
}

/// Commented configuration written by `autoreport init`.
pub fn default_config_template() -> String {
    fn list(values: &[&str]) -> String {
        let quoted: Vec<String> = values.iter().map(|v| format!("\"{}\"", v)).collect();
        format!("[{}]", quoted.join(", "))
    }

    format!(
        "# autoreport configuration\n\
         \n\
         [lineage]\n\
         # Calls of the form `receiver.<operation>(...)` mark `receiver` as a model.\n\
         model_operations = {}\n\
         \n\
         # Plotting calls are recognized as `<alias>.<function>(...)`.\n\
         plot_aliases = {}\n\
         plot_functions = {}\n\
         \n\
         # Lines starting with these prefixes are blanked before parsing.\n\
         directive_prefixes = {}\n\
         introspection_markers = {}\n\
         \n\
         private_prefix = \"{}\"\n\
         ungrouped_label = \"{}\"\n",
        list(DEFAULT_MODEL_OPERATIONS),
        list(DEFAULT_PLOT_ALIASES),
        list(DEFAULT_PLOT_FUNCTIONS),
        list(DEFAULT_DIRECTIVE_PREFIXES),
        list(DEFAULT_INTROSPECTION_MARKERS),
        DEFAULT_PRIVATE_PREFIX,
        DEFAULT_UNGROUPED_LABEL,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn create_temp_dir() -> tempfile::TempDir {
        tempfile::tempdir().expect("Failed to create temp dir")
    }

    #[test]
    fn default_config_uses_builtin_sets() {
        let config = Config::default();

        assert_eq!(config.lineage.model_operations.len(), 6);
        assert!(config.lineage.plot_aliases.contains(&"plt".to_string()));
        assert!(config.lineage.plot_functions.contains(&"hist".to_string()));
        assert_eq!(config.lineage.private_prefix, "_");
        assert_eq!(config.lineage.ungrouped_label, "ungrouped");
    }

    #[test]
    fn load_config_from_file() {
        let dir = create_temp_dir();
        let config_path = dir.path().join(CONFIG_FILENAME);
        fs::write(
            &config_path,
            r#"
[lineage]
model_operations = ["predict", "forecast"]
plot_aliases = ["plt", "sns"]
"#,
        )
        .unwrap();

        let config = load_config(&config_path).unwrap();

        assert_eq!(config.lineage.model_operations, vec!["predict", "forecast"]);
        assert_eq!(config.lineage.plot_aliases, vec!["plt", "sns"]);
        assert_eq!(
            config.lineage.plot_functions,
            LineageConfig::default().plot_functions,
            "unspecified keys keep their defaults"
        );
    }

    #[test]
    fn load_empty_config_is_default() {
        let dir = create_temp_dir();
        let config_path = dir.path().join(CONFIG_FILENAME);
        fs::write(&config_path, "").unwrap();

        let config = load_config(&config_path).unwrap();

        assert_eq!(config, Config::default());
    }

    #[test]
    fn load_config_rejects_invalid_toml() {
        let dir = create_temp_dir();
        let config_path = dir.path().join(CONFIG_FILENAME);
        fs::write(&config_path, "[lineage\nplot_aliases = ").unwrap();

        let result = load_config(&config_path);

        assert!(matches!(result, Err(ConfigError::ParseError { .. })));
    }

    #[test]
    fn load_config_reports_missing_file() {
        let dir = create_temp_dir();
        let result = load_config(&dir.path().join("missing.toml"));

        assert!(matches!(result, Err(ConfigError::ReadError { .. })));
    }

    #[test]
    fn unknown_keys_produce_warnings() {
        let dir = create_temp_dir();
        let config_path = dir.path().join(CONFIG_FILENAME);
        fs::write(
            &config_path,
            r#"
telemetry = true

[lineage]
plot_alias = ["plt"]
"#,
        )
        .unwrap();

        let result = load_config_with_warnings(&config_path).unwrap();

        assert_eq!(result.warnings.len(), 2);
        assert!(result.warnings[0].contains("telemetry"));
        assert!(result.warnings[1].contains("plot_alias"));
    }

    #[test]
    fn find_config_walks_up_directories() {
        let dir = create_temp_dir();
        let nested = dir.path().join("notebooks").join("experiments");
        fs::create_dir_all(&nested).unwrap();
        fs::write(dir.path().join(CONFIG_FILENAME), "").unwrap();

        let found = find_config_file(&nested);

        assert_eq!(found, Some(dir.path().join(CONFIG_FILENAME)));
    }

    #[test]
    fn load_or_default_without_file() {
        let dir = create_temp_dir();

        let config = load_config_or_default(dir.path());

        assert_eq!(config, Config::default());
    }

    #[test]
    fn load_or_default_with_warnings_reports_broken_file() {
        let dir = create_temp_dir();
        fs::write(dir.path().join(CONFIG_FILENAME), "[lineage").unwrap();

        let result = load_config_or_default_with_warnings(dir.path());

        assert_eq!(result.config, Config::default());
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn default_template_parses_back_to_default() {
        let config: Config = toml::from_str(&default_config_template()).unwrap();

        assert_eq!(config, Config::default());
    }
}

//! Init command - writes a default autoreport.toml

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use autoreport_core::config::{CONFIG_FILENAME, default_config_template};
use clap::Args;
use colored::Colorize;

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Force overwrite existing configuration
    #[arg(short, long)]
    pub force: bool,
}

impl InitArgs {
    pub fn run(&self) -> Result<()> {
        let config_path = self.write_config(Path::new("."))?;
        println!(
            "{} Created {} configuration file",
            "✓".green().bold(),
            config_path.display().to_string().cyan()
        );
        Ok(())
    }

    fn write_config(&self, dir: &Path) -> Result<PathBuf> {
        let config_path = dir.join(CONFIG_FILENAME);

        if config_path.exists() && !self.force {
            anyhow::bail!(
                "Config file '{}' already exists. Use --force to overwrite.",
                CONFIG_FILENAME
            );
        }

        fs::write(&config_path, default_config_template())
            .with_context(|| format!("Failed to write {}", config_path.display()))?;
        tracing::info!(path = %config_path.display(), "config written");
        Ok(config_path)
    }
}

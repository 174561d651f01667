//! autoreport CLI - static lineage for ML experiment reports
//!
//! Traces variables and figures of a training script or notebook back to
//! the model that produced them.

mod cli;
mod commands;
mod logging;
mod output;

use clap::Parser;
use cli::Cli;
use commands::Commands;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _guard = logging::init_logging(&cli);

    tracing::debug!(command = ?cli.command, "starting");

    match cli.command {
        Commands::Lineage(args) => args.run(),
        Commands::Init(args) => args.run(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::lineage::OutputFormat;
    use clap::CommandFactory;
    use std::path::PathBuf;

    #[test]
    fn cli_parses_lineage_command() {
        let cli = Cli::try_parse_from(["autoreport", "lineage", "train.py"]).unwrap();
        match cli.command {
            Commands::Lineage(args) => {
                assert_eq!(args.path, PathBuf::from("train.py"));
                assert_eq!(args.format, OutputFormat::Pretty);
                assert!(args.snapshot.is_none());
                assert!(args.artifacts.is_none());
            }
            _ => panic!("Expected Lineage command"),
        }
    }

    #[test]
    fn cli_parses_lineage_with_runtime_inputs() {
        let cli = Cli::try_parse_from([
            "autoreport",
            "lineage",
            "train.ipynb",
            "--snapshot",
            "ns.json",
            "--artifacts",
            "figures.json",
            "--format",
            "json",
            "--no-color",
        ])
        .unwrap();
        match cli.command {
            Commands::Lineage(args) => {
                assert_eq!(args.snapshot, Some(PathBuf::from("ns.json")));
                assert_eq!(args.artifacts, Some(PathBuf::from("figures.json")));
                assert_eq!(args.format, OutputFormat::Json);
                assert!(args.no_color);
            }
            _ => panic!("Expected Lineage command"),
        }
    }

    #[test]
    fn cli_requires_lineage_path() {
        assert!(Cli::try_parse_from(["autoreport", "lineage"]).is_err());
    }

    #[test]
    fn cli_rejects_unknown_format() {
        assert!(Cli::try_parse_from(["autoreport", "lineage", ".", "--format", "sarif"]).is_err());
    }

    #[test]
    fn cli_parses_init_with_force() {
        let cli = Cli::try_parse_from(["autoreport", "init", "--force"]).unwrap();
        match cli.command {
            Commands::Init(args) => assert!(args.force),
            _ => panic!("Expected Init command"),
        }
    }

    #[test]
    fn cli_version_is_set() {
        let cmd = Cli::command();
        assert_eq!(cmd.get_version(), Some("0.1.0"));
    }

    #[test]
    fn cli_help_contains_commands() {
        let mut cmd = Cli::command();
        let help = cmd.render_help().to_string();
        assert!(help.contains("lineage"));
        assert!(help.contains("init"));
    }

    #[test]
    fn lineage_help_shows_options() {
        let mut cmd = Cli::command();
        let lineage_cmd = cmd
            .get_subcommands_mut()
            .find(|c| c.get_name() == "lineage")
            .unwrap();
        let help = lineage_cmd.render_help().to_string();
        assert!(help.contains("PATH"));
        assert!(help.contains("--snapshot"));
        assert!(help.contains("--format"));
    }
}

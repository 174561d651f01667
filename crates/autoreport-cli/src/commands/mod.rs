//! CLI command implementations

pub mod init;
pub mod lineage;

pub use init::InitArgs;
pub use lineage::LineageArgs;

use clap::Subcommand;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Trace variables and plots of a script or notebook back to models
    Lineage(LineageArgs),

    /// Write a default autoreport.toml in the current directory
    Init(InitArgs),
}

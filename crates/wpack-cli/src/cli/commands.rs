use std::path::PathBuf;

use clap::{Args, Subcommand};

use crate::cli::enums::{ModeArg, TargetArg};

/// Available wpack subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build the widget
    ///
    /// Resolves the module graph from the configured entries, links it into
    /// one script, shrinks it and writes it with its assets to the output
    /// directory.
    Build(BuildArgs),

    /// Validate the configuration
    ///
    /// Loads the configuration with every override applied and checks it,
    /// including that the entries exist, without building.
    Check(CheckArgs),
}

/// Options shared by every command that loads a configuration.
#[derive(Args, Debug, Clone, Default)]
pub struct ConfigArgs {
    /// Configuration file (wpack.toml, wpack.json or package.json)
    ///
    /// When omitted, the project root is searched for one.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Project root searched for a configuration file
    #[arg(long, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Build mode, overriding the configuration
    #[arg(short, long, value_enum)]
    pub mode: Option<ModeArg>,

    /// Syntax target, overriding the configuration
    #[arg(short, long, value_enum)]
    pub target: Option<TargetArg>,

    /// Entry points, replacing the configured ones
    #[arg(short, long = "entry", value_name = "ENTRY")]
    pub entries: Vec<PathBuf>,
}

/// Arguments for the build command
#[derive(Args, Debug)]
pub struct BuildArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Output directory, overriding the configuration
    #[arg(short, long, value_name = "DIR")]
    pub out_dir: Option<PathBuf>,

    /// Keep files already in the output directory
    #[arg(long)]
    pub no_clean: bool,
}

/// Arguments for the check command
#[derive(Args, Debug)]
pub struct CheckArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Print the resolved configuration as JSON
    #[arg(long)]
    pub print: bool,
}

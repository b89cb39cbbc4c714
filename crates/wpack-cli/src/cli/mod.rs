//! Command-line interface definition.
//!
//! - `wpack build` - package the widget and write it to the output directory
//! - `wpack check` - load and validate the configuration without building

mod commands;
pub mod enums;

use clap::Parser;

pub use commands::{BuildArgs, CheckArgs, Command, ConfigArgs};
pub use enums::{ModeArg, TargetArg};

/// wpack - package a widget into one production script
#[derive(Parser, Debug)]
#[command(
    name = "wpack",
    version,
    about = "Package a widget into one production script",
    long_about = "wpack bundles a widget's module graph into a single script file,\n\
                  shrinks it while keeping its public names intact, and reports\n\
                  the result against size budgets."
)]
pub struct Cli {
    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

//! wpack CLI entry point: argument parsing and command dispatch.

use clap::Parser;
use miette::Result;
use wpack_cli::commands::{self, GlobalFlags};
use wpack_cli::{cli, error};

fn main() -> Result<()> {
    let args = cli::Cli::parse();
    let flags = GlobalFlags {
        verbose: args.verbose,
        quiet: args.quiet,
        no_color: args.no_color,
    };

    let result = match args.command {
        cli::Command::Build(build_args) => commands::build_execute(build_args, flags),
        cli::Command::Check(check_args) => commands::check_execute(check_args, flags),
    };

    result.map_err(error::cli_error_to_miette)
}

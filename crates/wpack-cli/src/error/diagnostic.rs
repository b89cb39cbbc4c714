use miette::Report;
use wpack_config::ConfigError;

use crate::error::CliError;

/// Convert a CliError to a miette Report.
pub fn cli_error_to_miette(err: CliError) -> Report {
    match err {
        CliError::Build(e) => Report::new(e),
        CliError::Config(e) => config_error_to_miette(e),
        CliError::FileNotFound(path) => miette::miette!(
            help = "Pass the path with --config or run wpack from the project root",
            "File not found: {}",
            path.display()
        ),
        other => miette::miette!("{}", other),
    }
}

fn config_error_to_miette(err: ConfigError) -> Report {
    match &err {
        ConfigError::NoEntries => miette::miette!(
            help = "Add `entries = [\"src/index.ts\"]` to wpack.toml or pass --entry",
            "Configuration error: {}",
            err
        ),
        ConfigError::EntryNotFound { .. } => miette::miette!(
            help = "Entry paths are resolved against the configuration's `root`",
            "Configuration error: {}",
            err
        ),
        ConfigError::ReservedPureFunction { .. } => miette::miette!(
            help = "A reserved name is part of the widget's public surface and cannot be dropped",
            "Configuration error: {}",
            err
        ),
        ConfigError::UnsafeOutDir { .. } => miette::miette!(
            help = "Point `out_dir` at a directory of its own, such as \"dist\"",
            "Configuration error: {}",
            err
        ),
        _ => miette::miette!("Configuration error: {}", err),
    }
}

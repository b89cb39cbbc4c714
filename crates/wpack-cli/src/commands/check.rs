//! Check command implementation.
//!
//! Loads and validates the configuration without building.

use wpack_config::validate_fs;

use crate::cli::CheckArgs;
use crate::commands::GlobalFlags;
use crate::commands::utils::{Overrides, load_config};
use crate::error::Result;
use crate::logger::init_logger;
use crate::ui;

/// Execute the check command.
///
/// Prints every configuration warning, then a summary of what a build
/// would use. `--print` also writes the resolved configuration to stdout.
pub fn execute(args: CheckArgs, flags: GlobalFlags) -> Result<()> {
    let overrides = Overrides::from_args(&args.config, None);
    let config = load_config(&args.config, &overrides)?;
    init_logger(&flags.log_settings(&config));
    let warnings = validate_fs(&config)?;

    if args.print {
        println!("{}", serde_json::to_string_pretty(&config)?);
    }
    if flags.quiet {
        return Ok(());
    }

    for warning in &warnings {
        ui::warning(&warning.to_string());
    }
    ui::success("Configuration is valid");
    for entry in &config.entries {
        ui::info(&format!("entry {}", config.resolve_path(entry).display()));
    }
    if flags.verbose {
        for external in &config.externals {
            ui::info(&format!(
                "external {} -> {}",
                external.module_id, external.global_name
            ));
        }
    }
    ui::info(&format!(
        "{} build targeting {}, writing {}",
        config.mode,
        config.target,
        config.output_dir().join(&config.output_file_name).display()
    ));
    Ok(())
}

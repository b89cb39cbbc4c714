//! Build command implementation.

use std::time::Instant;

use wpack_bundler::{BuildConfig, Pipeline, SizeReporter};

use crate::cli::BuildArgs;
use crate::commands::GlobalFlags;
use crate::commands::utils::{Overrides, load_config};
use crate::error::Result;
use crate::logger::init_logger;
use crate::ui;

/// Execute the build command.
///
/// 1. Load the configuration and apply command-line overrides
/// 2. Install the logger from the configuration and global flags
/// 3. Run the pipeline with the size reporter attached
/// 4. Write the artifacts, cleaning the output directory unless `--no-clean`
pub fn execute(args: BuildArgs, flags: GlobalFlags) -> Result<()> {
    let overrides = Overrides::from_args(&args.config, args.out_dir.as_deref());
    let config = load_config(&args.config, &overrides)?;

    init_logger(&flags.log_settings(&config));

    run(&config, !args.no_clean, flags.quiet)
}

fn run(config: &BuildConfig, clean: bool, quiet: bool) -> Result<()> {
    let started = Instant::now();
    let mut reporter = SizeReporter::new(config);
    let output = Pipeline::new(config).observe(&mut reporter).run()?;

    let out_dir = config.output_dir();
    let written = output.write_to(&out_dir, clean)?;
    tracing::debug!(files = written.len(), dir = %out_dir.display(), "output written");

    if !quiet {
        let chunk = output.artifacts.chunk();
        ui::success(&format!(
            "Built {} ({}) in {}",
            out_dir.join(&chunk.file_name).display(),
            ui::format_size(chunk.byte_length()),
            ui::format_duration(started.elapsed())
        ));
    }
    Ok(())
}

//! Command implementations.

pub mod build;
pub mod check;
mod utils;

pub use build::execute as build_execute;
pub use check::execute as check_execute;
pub use utils::{Overrides, load_config};

use wpack_config::BuildConfig;

use crate::logger::LogSettings;

/// Global flags that affect every command's output.
#[derive(Debug, Clone, Copy, Default)]
pub struct GlobalFlags {
    pub verbose: bool,
    pub quiet: bool,
    pub no_color: bool,
}

impl GlobalFlags {
    /// Logger settings from `config`, overridden by these flags.
    pub fn log_settings(&self, config: &BuildConfig) -> LogSettings {
        LogSettings::from_options(&config.logger, config.effective_log_level()).with_flags(
            self.verbose,
            self.quiet,
            self.no_color,
        )
    }
}

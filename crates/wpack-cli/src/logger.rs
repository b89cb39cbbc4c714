//! Logging setup for the CLI.
//!
//! The level comes from, in order: `--verbose`, `--quiet`, `RUST_LOG`, and
//! the configuration's logger options. Size report lines are always shown
//! unless the output is silenced altogether.
//!
//! ```rust,no_run
//! use wpack_cli::logger::{LogSettings, init_logger};
//! use wpack_config::LoggerOptions;
//!
//! init_logger(&LogSettings::from_options(&LoggerOptions::default(), "warn".parse().unwrap()));
//! ```

use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use wpack_bundler::report::REPORT_TARGET;
use wpack_config::{LogLevel, LoggerOptions};

/// Everything the subscriber needs, resolved from flags and configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    pub level: LogLevel,
    pub timestamp: bool,
    pub colors: bool,
    /// Read `RUST_LOG` instead of `level` when it is set.
    pub use_env: bool,
}

impl LogSettings {
    pub fn from_options(options: &LoggerOptions, level: LogLevel) -> Self {
        Self {
            level,
            timestamp: options.timestamp,
            colors: options.colors.unwrap_or_else(should_use_colors),
            use_env: true,
        }
    }

    /// Apply the global `--verbose/--quiet/--no-color` flags.
    pub fn with_flags(mut self, verbose: bool, quiet: bool, no_color: bool) -> Self {
        if verbose {
            self.level = LogLevel::Debug;
            self.use_env = false;
        } else if quiet {
            self.level = LogLevel::Error;
            self.use_env = false;
        }
        if no_color {
            self.colors = false;
        }
        self
    }

    /// The filter directive for these settings.
    pub fn directive(&self) -> String {
        match self.level {
            LogLevel::Silent => "off".to_string(),
            LogLevel::Error => "error".to_string(),
            level => format!("{},{REPORT_TARGET}=info", level.as_filter()),
        }
    }
}

/// Install the global tracing subscriber.
///
/// Must be called at most once per process.
pub fn init_logger(settings: &LogSettings) {
    let filter = if settings.use_env {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(settings.directive()))
    } else {
        EnvFilter::new(settings.directive())
    };

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true)
        .with_ansi(settings.colors)
        .compact();
    let fmt_layer = if settings.timestamp {
        fmt_layer.boxed()
    } else {
        fmt_layer.without_time().boxed()
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}

/// Whether stderr should be colored: `NO_COLOR` wins over `FORCE_COLOR`,
/// which wins over terminal detection.
pub fn should_use_colors() -> bool {
    let set = |name: &str| std::env::var_os(name).is_some();
    !set("NO_COLOR") && (set("FORCE_COLOR") || console::Term::stderr().features().colors_supported())
}

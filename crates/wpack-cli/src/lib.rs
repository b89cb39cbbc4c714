//! wpack CLI - package a widget into one production script.
//!
//! - [`cli`] - clap argument definitions
//! - `commands` - `build` and `check`
//! - [`error`] - CLI errors and their miette rendering
//! - [`logger`] - tracing subscriber setup from flags and configuration
//! - [`ui`] - status lines and size formatting

pub mod cli;
pub mod commands;
pub mod error;
pub mod logger;
pub mod ui;

pub use error::{CliError, Result};

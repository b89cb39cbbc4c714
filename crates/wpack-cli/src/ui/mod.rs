//! Terminal output helpers for command results.
//!
//! Build progress and the size report go through `tracing`; these helpers
//! print the final per-command status lines.

mod format;
mod messages;

pub use format::{format_duration, format_size};
pub use messages::{info, success, warning};

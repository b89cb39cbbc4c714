//! One-line status messages on stderr.

use owo_colors::OwoColorize;

pub fn success(message: &str) {
    eprintln!("{} {message}", "✓".green().bold());
}

pub fn info(message: &str) {
    eprintln!("{} {message}", "ℹ".blue().bold());
}

/// Non-fatal problems, such as configuration warnings.
pub fn warning(message: &str) {
    eprintln!("{} {}", "⚠".yellow().bold(), message.yellow());
}

//! Error types for configuration loading and validation.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Error)]
pub enum ConfigError {
    // Filesystem validation errors (for CLI use)
    #[error("entry path not found: {}", path.display())]
    EntryNotFound { path: PathBuf },

    #[error("config file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("unsupported configuration format: {extension}")]
    UnsupportedFormat { extension: String },

    #[error("invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },

    #[error(
        "output directory {} contains {}, which cleaning the output would delete",
        out_dir.display(),
        path.display()
    )]
    UnsafeOutDir { out_dir: PathBuf, path: PathBuf },

    #[error("no entries specified")]
    NoEntries,

    #[error("extension '{extension}' is registered for both {first} and {second}")]
    OverlappingExtension {
        extension: String,
        first: &'static str,
        second: &'static str,
    },

    #[error("'{name}' is reserved and cannot also be listed as a pure function")]
    ReservedPureFunction { name: String },

    #[error("failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConfigError {
    pub(crate) fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Load(Box::new(err))
    }
}

/// A non-fatal configuration problem.
///
/// Warnings are returned by validation and logged, they never stop a build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigWarning {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

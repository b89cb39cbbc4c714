use std::path::PathBuf;

/// Error types for wpack build operations.
///
/// Every variant is fatal: a build that returns one of these produced no
/// artifacts.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    Config(#[from] wpack_config::ConfigError),

    /// An import specifier could not be mapped to an existing file.
    #[error("Cannot resolve '{specifier}' from {}: {reason}", importer.display())]
    Resolution {
        specifier: String,
        importer: PathBuf,
        reason: String,
    },

    /// A collaborator transform failed on one source unit.
    #[error("Failed to transform {}: {cause:#}", unit.display())]
    Transform {
        unit: PathBuf,
        cause: anyhow::Error,
    },

    /// The module graph would need more than one script artifact.
    #[error("Multi-chunk violation: {reason}")]
    MultiChunkViolation { reason: String },

    /// A module imports a binding its dependency cannot provide.
    #[error("'{name}' is not exported by {}", module.display())]
    MissingExport { name: String, module: PathBuf },

    /// Renaming would touch the public surface or produce a collision.
    #[error("Shrink invariant violated: {reason}")]
    ShrinkInvariantViolation { reason: String },

    /// The merged artifact could not be parsed by the shrink stage.
    #[error("Failed to parse {origin}: {message}")]
    Parse { origin: String, message: String },

    /// Target lowering failed or needed a runtime helper with no definition.
    #[error("Syntax lowering to {target} failed: {message}")]
    Lowering { target: String, message: String },

    /// Invalid output path (e.g., directory traversal attempt).
    #[error("Invalid output path: {0}")]
    InvalidOutputPath(String),

    /// File write operation failed.
    #[error("Write failure: {0}")]
    WriteFailure(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for wpack-bundler operations.
pub type Result<T> = std::result::Result<T, BuildError>;

impl BuildError {
    pub fn transform(unit: impl Into<PathBuf>, cause: impl Into<anyhow::Error>) -> Self {
        Self::Transform {
            unit: unit.into(),
            cause: cause.into(),
        }
    }

    pub fn multi_chunk(reason: impl Into<String>) -> Self {
        Self::MultiChunkViolation {
            reason: reason.into(),
        }
    }

    pub fn shrink_invariant(reason: impl Into<String>) -> Self {
        Self::ShrinkInvariantViolation {
            reason: reason.into(),
        }
    }

    /// Stable identifier for the error kind.
    pub fn code(&self) -> &'static str {
        match self {
            BuildError::Config(_) => "INVALID_CONFIG",
            BuildError::Resolution { .. } => "RESOLUTION_ERROR",
            BuildError::Transform { .. } => "TRANSFORM_ERROR",
            BuildError::MultiChunkViolation { .. } => "MULTI_CHUNK_VIOLATION",
            BuildError::MissingExport { .. } => "MISSING_EXPORT",
            BuildError::ShrinkInvariantViolation { .. } => "SHRINK_INVARIANT_VIOLATION",
            BuildError::Parse { .. } => "PARSE_ERROR",
            BuildError::Lowering { .. } => "LOWERING_ERROR",
            BuildError::InvalidOutputPath(_) => "INVALID_OUTPUT_PATH",
            BuildError::WriteFailure(_) => "WRITE_FAILURE",
            BuildError::Io(_) => "IO_ERROR",
        }
    }
}

impl miette::Diagnostic for BuildError {
    fn code(&self) -> Option<Box<dyn std::fmt::Display + '_>> {
        Some(Box::new(BuildError::code(self)))
    }

    fn severity(&self) -> Option<miette::Severity> {
        Some(miette::Severity::Error)
    }

    fn help(&self) -> Option<Box<dyn std::fmt::Display + '_>> {
        match self {
            BuildError::Resolution { specifier, .. } if !specifier.starts_with('.') => {
                Some(Box::new(format!(
                    "Bare specifiers must be registered as externals or match an alias.\nAdd '{}' to `externals` if the host page provides it.",
                    specifier
                )))
            }
            BuildError::Resolution { .. } => Some(Box::new(
                "Check that the file exists and its extension is listed in `extensions.resolve`.",
            )),
            BuildError::MultiChunkViolation { .. } => Some(Box::new(
                "Widgets ship as a single script. Use string-literal specifiers for dynamic import() so the target can be inlined.",
            )),
            BuildError::ShrinkInvariantViolation { .. } => Some(Box::new(
                "This is a bug in the shrinker. Disable `shrink.mangle` to work around it.",
            )),
            BuildError::Lowering { .. } => Some(Box::new(
                "Raise `target` or avoid the syntax that needs this helper.",
            )),
            BuildError::InvalidOutputPath(path) => Some(Box::new(format!(
                "The output path '{}' is invalid. Ensure it's within the output directory and doesn't contain '..' components.",
                path
            ))),
            BuildError::WriteFailure(_) => {
                Some(Box::new("Check disk space and permissions."))
            }
            _ => None,
        }
    }
}

//! Pluggable config validation strategies
//!
//! Separates filesystem validation (for CLI use) from schema validation (for
//! library use). Both return the non-fatal warnings they collected.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::config::BuildConfig;
use crate::error::{ConfigError, ConfigWarning, Result};

static IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*$").expect("valid identifier regex"));

static DOTTED_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*(\.[A-Za-z_$][A-Za-z0-9_$]*)*$")
        .expect("valid dotted path regex")
});

/// Trait for pluggable config validation strategies
pub trait ConfigValidator {
    fn validate(&self, config: &BuildConfig) -> Result<Vec<ConfigWarning>>;
}

/// Schema-only validation (no filesystem checks)
///
/// ```
/// use wpack_config::{BuildConfig, ConfigValidator, SchemaValidator};
///
/// let config = BuildConfig::new("src/index.ts");
/// assert!(SchemaValidator.validate(&config).unwrap().is_empty());
/// ```
pub struct SchemaValidator;

impl ConfigValidator for SchemaValidator {
    fn validate(&self, config: &BuildConfig) -> Result<Vec<ConfigWarning>> {
        let mut warnings = Vec::new();

        if config.entries.is_empty() {
            return Err(ConfigError::NoEntries);
        }

        let name = config.output_file_name.as_str();
        if name.is_empty() || name.contains(['/', '\\']) {
            return Err(ConfigError::invalid(
                "output_file_name",
                format!("'{name}' must be a plain file name"),
            ));
        }
        if !name.ends_with(".js") {
            warnings.push(ConfigWarning {
                field: "output_file_name".into(),
                message: format!("'{name}' does not end in .js"),
            });
        }

        if config.assets_dir.contains("..") {
            return Err(ConfigError::invalid(
                "assets_dir",
                "must stay inside the output directory",
            ));
        }

        config.extensions.validate()?;
        validate_shrink(config)?;
        validate_externals(config, &mut warnings)?;
        validate_thresholds(config, &mut warnings)?;

        for key in config.define.keys() {
            if !DOTTED_PATH.is_match(key) {
                return Err(ConfigError::invalid(
                    "define",
                    format!("'{key}' is not an identifier or dotted member path"),
                ));
            }
        }

        for prefix in config.aliases.keys() {
            if prefix.is_empty() {
                return Err(ConfigError::invalid("aliases", "alias prefix cannot be empty"));
            }
        }

        Ok(warnings)
    }
}

fn validate_shrink(config: &BuildConfig) -> Result<()> {
    let shrink = &config.shrink;
    if shrink.compress_passes == 0 {
        return Err(ConfigError::invalid(
            "shrink.compress_passes",
            "must be at least 1",
        ));
    }

    for name in &shrink.reserved_names {
        if !IDENTIFIER.is_match(name) {
            return Err(ConfigError::invalid(
                "shrink.reserved_names",
                format!("'{name}' is not a valid identifier"),
            ));
        }
    }

    for name in &shrink.pure_functions {
        if !DOTTED_PATH.is_match(name) {
            return Err(ConfigError::invalid(
                "shrink.pure_functions",
                format!("'{name}' is not a function name"),
            ));
        }
        if name.split('.').any(|part| shrink.reserved_names.contains(part)) {
            return Err(ConfigError::ReservedPureFunction { name: name.clone() });
        }
    }
    Ok(())
}

fn validate_externals(config: &BuildConfig, warnings: &mut Vec<ConfigWarning>) -> Result<()> {
    let mut seen = HashSet::new();
    for external in &config.externals {
        if external.module_id.trim().is_empty() {
            return Err(ConfigError::invalid(
                "externals",
                "module ids cannot be empty",
            ));
        }
        if !DOTTED_PATH.is_match(&external.global_name) {
            return Err(ConfigError::invalid(
                "externals",
                format!(
                    "global name '{}' for '{}' is not an identifier",
                    external.global_name, external.module_id
                ),
            ));
        }
        if !seen.insert(external.module_id.as_str()) {
            warnings.push(ConfigWarning {
                field: "externals".into(),
                message: format!(
                    "'{}' is registered more than once, the last registration wins",
                    external.module_id
                ),
            });
        }
    }
    Ok(())
}

fn validate_thresholds(config: &BuildConfig, warnings: &mut Vec<ConfigWarning>) -> Result<()> {
    let mut limits = HashSet::new();
    for threshold in &config.size_thresholds {
        if threshold.classification.trim().is_empty() {
            return Err(ConfigError::invalid(
                "size_thresholds",
                format!("threshold at {} bytes has no classification", threshold.limit_bytes),
            ));
        }
        if !limits.insert(threshold.limit_bytes) {
            warnings.push(ConfigWarning {
                field: "size_thresholds".into(),
                message: format!(
                    "more than one threshold at {} bytes, the first listed wins",
                    threshold.limit_bytes
                ),
            });
        }
    }
    Ok(())
}

/// Filesystem validation (for CLI use)
///
/// Runs schema validation, then checks that every entry exists and that the
/// output directory contains neither the project root nor an entry.
pub struct FsValidator;

impl ConfigValidator for FsValidator {
    fn validate(&self, config: &BuildConfig) -> Result<Vec<ConfigWarning>> {
        let warnings = SchemaValidator.validate(config)?;

        for entry in &config.entries {
            let path = config.resolve_path(entry);
            if !path.exists() {
                return Err(ConfigError::EntryNotFound { path });
            }
        }

        if let Some(path) = config.output_dir_overlap() {
            return Err(ConfigError::UnsafeOutDir {
                out_dir: config.output_dir(),
                path,
            });
        }

        Ok(warnings)
    }
}

/// Convenience function for schema validation
pub fn validate_schema(config: &BuildConfig) -> Result<Vec<ConfigWarning>> {
    SchemaValidator.validate(config)
}

/// Convenience function for filesystem validation
pub fn validate_fs(config: &BuildConfig) -> Result<Vec<ConfigWarning>> {
    FsValidator.validate(config)
}

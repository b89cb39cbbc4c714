//! Path and extension resolution.
//!
//! Specifiers are mapped to files by the longest matching alias prefix, or
//! relative to the importing file. Resolved files are classified into a
//! [`ModuleRole`] by extension.

use std::path::{Path, PathBuf};

use path_clean::PathClean;
use wpack_config::{BuildConfig, ExtensionSets};

use crate::error::{BuildError, Result};

/// How a resolved file is processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModuleRole {
    Script,
    Template,
    Style,
    Data,
    /// Copied verbatim next to the script artifact.
    Asset,
}

impl ModuleRole {
    pub fn as_str(self) -> &'static str {
        match self {
            ModuleRole::Script => "script",
            ModuleRole::Template => "template",
            ModuleRole::Style => "style",
            ModuleRole::Data => "data",
            ModuleRole::Asset => "asset",
        }
    }
}

impl std::fmt::Display for ModuleRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One resolved source file, read from disk.
#[derive(Debug, Clone)]
pub struct ModuleUnit {
    /// The specifier as written by the first importer (or the entry path).
    pub specifier: String,
    pub resolved_path: PathBuf,
    pub role: ModuleRole,
    pub raw_content: Vec<u8>,
}

impl ModuleUnit {
    pub fn read(specifier: impl Into<String>, resolved_path: PathBuf, role: ModuleRole) -> Result<Self> {
        let raw_content = std::fs::read(&resolved_path).map_err(|e| BuildError::Resolution {
            specifier: resolved_path.display().to_string(),
            importer: resolved_path.clone(),
            reason: format!("failed to read file: {e}"),
        })?;
        Ok(Self {
            specifier: specifier.into(),
            resolved_path,
            role,
            raw_content,
        })
    }

    /// The content as UTF-8 text.
    pub fn text(&self) -> anyhow::Result<&str> {
        std::str::from_utf8(&self.raw_content)
            .map_err(|e| anyhow::anyhow!("source is not valid UTF-8: {e}"))
    }
}

/// Alias-aware specifier resolver.
#[derive(Debug, Clone)]
pub struct Resolver {
    /// Sorted longest prefix first.
    aliases: Vec<(String, PathBuf)>,
    extensions: ExtensionSets,
}

impl Resolver {
    pub fn new(config: &BuildConfig) -> Self {
        let mut aliases: Vec<(String, PathBuf)> = config
            .aliases
            .iter()
            .map(|(prefix, target)| (prefix.clone(), config.resolve_path(target).clean()))
            .collect();
        aliases.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then_with(|| a.0.cmp(&b.0)));

        Self {
            aliases,
            extensions: config.extensions.clone(),
        }
    }

    /// Resolve `specifier` as imported from the file `importer`.
    pub fn resolve(&self, specifier: &str, importer: &Path) -> Result<PathBuf> {
        let fail = |reason: &str| BuildError::Resolution {
            specifier: specifier.to_string(),
            importer: importer.to_path_buf(),
            reason: reason.to_string(),
        };

        let candidate = if let Some(target) = self.match_alias(specifier) {
            target
        } else if specifier.starts_with("./") || specifier.starts_with("../") || specifier == "." || specifier == ".." {
            importer
                .parent()
                .unwrap_or_else(|| Path::new("."))
                .join(specifier)
        } else if Path::new(specifier).is_absolute() {
            PathBuf::from(specifier)
        } else {
            return Err(fail("bare specifier is neither an external nor an alias"));
        };

        self.probe(&candidate.clean())
            .ok_or_else(|| fail("no file found with any recognized extension"))
    }

    fn match_alias(&self, specifier: &str) -> Option<PathBuf> {
        self.aliases.iter().find_map(|(prefix, target)| {
            let rest = specifier.strip_prefix(prefix.as_str())?;
            if rest.is_empty() {
                Some(target.clone())
            } else {
                rest.strip_prefix('/').map(|rest| target.join(rest))
            }
        })
    }

    /// The path as written, then each resolve extension appended, then
    /// `index.<ext>` inside a directory.
    fn probe(&self, path: &Path) -> Option<PathBuf> {
        if path.is_file() {
            return Some(path.to_path_buf());
        }

        for ext in &self.extensions.resolve {
            let mut with_ext = path.as_os_str().to_os_string();
            with_ext.push(ext);
            let with_ext = PathBuf::from(with_ext);
            if with_ext.is_file() {
                return Some(with_ext);
            }
        }

        if path.is_dir() {
            for ext in &self.extensions.resolve {
                let index = path.join(format!("index{ext}"));
                if index.is_file() {
                    return Some(index);
                }
            }
        }

        None
    }

    /// Classify a resolved file by extension.
    pub fn classify(&self, path: &Path) -> ModuleRole {
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return ModuleRole::Asset;
        };
        let dotted = format!(".{}", ext.to_ascii_lowercase());
        let sets = &self.extensions;
        if sets.script.contains(&dotted) {
            ModuleRole::Script
        } else if sets.template.contains(&dotted) {
            ModuleRole::Template
        } else if sets.style.contains(&dotted) {
            ModuleRole::Style
        } else if sets.data.contains(&dotted) {
            ModuleRole::Data
        } else {
            ModuleRole::Asset
        }
    }
}

//! The top-level build configuration record.
//!
//! A [`BuildConfig`] is created once per build invocation (from a file, the
//! environment and CLI overrides, see [`crate::discovery`]) and is read-only
//! afterwards. Workers share it by reference.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use path_clean::PathClean;
use serde::{Deserialize, Serialize};

use crate::extensions::ExtensionSets;
use crate::settings::{LogLevel, LoggerOptions, TransformOptions};
use crate::shrink::ShrinkPolicy;
use crate::thresholds::{SizeThreshold, default_thresholds};

/// Build mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Development,
    #[default]
    Production,
}

impl Mode {
    pub fn is_production(self) -> bool {
        matches!(self, Mode::Production)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Development => "development",
            Mode::Production => "production",
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Target ECMAScript version for syntax lowering
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EsTarget {
    /// ECMAScript 2015 (ES6)
    ES2015,
    /// ECMAScript 2016
    ES2016,
    /// ECMAScript 2017
    ES2017,
    /// ECMAScript 2018
    ES2018,
    /// ECMAScript 2019
    ES2019,
    /// ECMAScript 2020 (default)
    #[default]
    ES2020,
    /// ECMAScript 2021
    ES2021,
    /// ECMAScript 2022
    ES2022,
    /// ECMAScript 2023
    ES2023,
    /// ECMAScript 2024
    ES2024,
    /// Latest ECMAScript, nothing is lowered
    ESNext,
}

impl EsTarget {
    pub fn as_str(self) -> &'static str {
        match self {
            EsTarget::ES2015 => "es2015",
            EsTarget::ES2016 => "es2016",
            EsTarget::ES2017 => "es2017",
            EsTarget::ES2018 => "es2018",
            EsTarget::ES2019 => "es2019",
            EsTarget::ES2020 => "es2020",
            EsTarget::ES2021 => "es2021",
            EsTarget::ES2022 => "es2022",
            EsTarget::ES2023 => "es2023",
            EsTarget::ES2024 => "es2024",
            EsTarget::ESNext => "esnext",
        }
    }
}

impl std::fmt::Display for EsTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A module that is referenced but never embedded, read at runtime from
/// `global_name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalSpec {
    pub module_id: String,
    pub global_name: String,
}

impl ExternalSpec {
    pub fn new(module_id: impl Into<String>, global_name: impl Into<String>) -> Self {
        Self {
            module_id: module_id.into(),
            global_name: global_name.into(),
        }
    }
}

/// Build configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    pub mode: Mode,
    pub target: EsTarget,

    /// Project root; entries, aliases and `out_dir` are resolved against it.
    pub root: PathBuf,
    pub entries: Vec<PathBuf>,
    pub out_dir: PathBuf,

    /// Name of the single script artifact. Never content-hashed.
    pub output_file_name: String,
    /// Subdirectory of `out_dir` receiving verbatim assets.
    pub assets_dir: String,
    /// Public URL prefix for asset references.
    pub base_url: String,

    pub externals: Vec<ExternalSpec>,
    pub shrink: ShrinkPolicy,
    pub size_thresholds: Vec<SizeThreshold>,
    /// Warn when the script artifact alone exceeds this many KiB.
    pub chunk_size_warning_limit_kb: u64,
    pub report_compressed_size: bool,

    /// Alias prefix to path (`@` -> `src`).
    pub aliases: IndexMap<String, PathBuf>,
    pub extensions: ExtensionSets,
    pub transform: TransformOptions,

    /// Build-time constants substituted verbatim into script code.
    pub define: IndexMap<String, String>,

    /// Comment line prepended to the final artifact.
    pub banner: Option<String>,
    pub logger: LoggerOptions,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            mode: Mode::Production,
            target: EsTarget::ES2020,
            root: PathBuf::from("."),
            entries: Vec::new(),
            out_dir: PathBuf::from("dist"),
            output_file_name: "widget.js".to_string(),
            assets_dir: "assets".to_string(),
            base_url: "/".to_string(),
            externals: Vec::new(),
            shrink: ShrinkPolicy::default(),
            size_thresholds: default_thresholds(),
            chunk_size_warning_limit_kb: 500,
            report_compressed_size: true,
            aliases: IndexMap::new(),
            extensions: ExtensionSets::default(),
            transform: TransformOptions::default(),
            define: IndexMap::new(),
            banner: None,
            logger: LoggerOptions::default(),
        }
    }
}

impl BuildConfig {
    /// Create a production configuration with a single entry point.
    pub fn new(entry: impl Into<PathBuf>) -> Self {
        Self {
            entries: vec![entry.into()],
            ..Self::default()
        }
    }

    pub fn root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    pub fn mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    pub fn entry(mut self, entry: impl Into<PathBuf>) -> Self {
        self.entries.push(entry.into());
        self
    }

    pub fn external(mut self, module_id: impl Into<String>, global_name: impl Into<String>) -> Self {
        self.externals.push(ExternalSpec::new(module_id, global_name));
        self
    }

    pub fn alias(mut self, prefix: impl Into<String>, target: impl Into<PathBuf>) -> Self {
        self.aliases.insert(prefix.into(), target.into());
        self
    }

    pub fn define(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.define.insert(key.into(), value.into());
        self
    }

    pub fn shrink(mut self, policy: ShrinkPolicy) -> Self {
        self.shrink = policy;
        self
    }

    pub fn thresholds(mut self, thresholds: Vec<SizeThreshold>) -> Self {
        self.size_thresholds = thresholds;
        self
    }

    /// Resolve a config-relative path against `root`.
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    pub fn output_dir(&self) -> PathBuf {
        self.resolve_path(&self.out_dir)
    }

    /// The project root and every entry, absolute and normalized.
    ///
    /// Cleaning an output directory that contains one of these would delete
    /// the project itself.
    pub fn protected_paths(&self) -> Vec<PathBuf> {
        std::iter::once(self.root.clone())
            .chain(self.entries.iter().map(|entry| self.resolve_path(entry)))
            .map(|path| absolute(&path))
            .collect()
    }

    /// The first protected path that lies inside the output directory.
    pub fn output_dir_overlap(&self) -> Option<PathBuf> {
        let out_dir = absolute(&self.output_dir());
        self.protected_paths()
            .into_iter()
            .find(|path| path.starts_with(&out_dir))
    }

    /// The shrink policy with mode gating applied: development builds keep
    /// console and debugger statements.
    pub fn effective_shrink(&self) -> ShrinkPolicy {
        let mut policy = self.shrink.clone();
        if !self.mode.is_production() {
            policy.drop_statements.clear();
        }
        policy
    }

    /// Log level from the logger options, defaulting by mode.
    pub fn effective_log_level(&self) -> LogLevel {
        if !self.logger.enabled {
            return LogLevel::Silent;
        }
        self.logger.level.unwrap_or(match self.mode {
            Mode::Production => LogLevel::Warn,
            Mode::Development => LogLevel::Info,
        })
    }

    /// The define table with the mode constant filled in when absent.
    pub fn effective_defines(&self) -> IndexMap<String, String> {
        let mut defines = self.define.clone();
        defines
            .entry("process.env.NODE_ENV".to_string())
            .or_insert_with(|| format!("\"{}\"", self.mode.as_str()));
        defines
    }
}

/// `path` made absolute against the working directory, with `.` and `..`
/// components resolved lexically.
pub fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).map_or_else(|_| path.clean(), |path| path.clean())
}

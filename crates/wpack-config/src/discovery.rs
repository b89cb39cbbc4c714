//! File-based config discovery and layered loading.
//!
//! Priority: explicit overrides > `WPACK_*` environment variables > config
//! file > defaults.

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format as _, Json, Serialized, Toml},
};
use serde::Serialize;

use crate::config::BuildConfig;
use crate::error::{ConfigError, Result};

const TOML_FILE: &str = "wpack.toml";
const JSON_FILE: &str = "wpack.json";
const PACKAGE_JSON: &str = "package.json";
const PACKAGE_FIELD: &str = "wpack";
const ENV_PREFIX: &str = "WPACK_";

/// Searches conventional locations for a wpack configuration file.
///
/// ```no_run
/// use wpack_config::ConfigDiscovery;
///
/// let config = ConfigDiscovery::new(".").load().unwrap();
/// ```
pub struct ConfigDiscovery {
    root: PathBuf,
}

impl ConfigDiscovery {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Find a config file in the root directory
    ///
    /// Searches in this order:
    /// 1. `wpack.toml`
    /// 2. `wpack.json`
    /// 3. `package.json` with a `wpack` field
    pub fn find(&self) -> Option<PathBuf> {
        for name in [TOML_FILE, JSON_FILE] {
            let path = self.root.join(name);
            if path.is_file() {
                return Some(path);
            }
        }

        let pkg_path = self.root.join(PACKAGE_JSON);
        let content = std::fs::read_to_string(&pkg_path).ok()?;
        let parsed: serde_json::Value = serde_json::from_str(&content).ok()?;
        parsed
            .get(PACKAGE_FIELD)
            .is_some_and(|v| !v.is_null())
            .then_some(pkg_path)
    }

    /// Load the discovered file, or defaults rooted here when none exists.
    pub fn load(&self) -> Result<BuildConfig> {
        match self.find() {
            Some(path) => load_file(&path, None::<()>),
            None => {
                let mut config: BuildConfig = base_figment(None)?.extract()?;
                config.root = rebase(&self.root, &config.root);
                Ok(config)
            }
        }
    }
}

/// Load a specific config file, applying environment variables and then
/// `overrides` (any serializable partial of [`BuildConfig`]) on top.
///
/// A relative `root` inside the file is resolved against the file's directory.
pub fn load_file<O: Serialize>(path: &Path, overrides: Option<O>) -> Result<BuildConfig> {
    if !path.is_file() {
        return Err(ConfigError::NotFound {
            path: path.to_path_buf(),
        });
    }

    let mut figment = base_figment(Some(path))?;
    if let Some(overrides) = overrides {
        figment = figment.merge(Serialized::defaults(overrides));
    }

    let mut config: BuildConfig = figment.extract()?;
    let base = path.parent().unwrap_or_else(|| Path::new("."));
    config.root = rebase(base, &config.root);
    tracing::debug!(path = %path.display(), "loaded configuration");
    Ok(config)
}

/// Parse a TOML document into a config without touching the environment.
pub fn from_toml_str(source: &str) -> Result<BuildConfig> {
    Ok(Figment::new()
        .merge(Serialized::defaults(BuildConfig::default()))
        .merge(Toml::string(source))
        .extract()?)
}

fn base_figment(path: Option<&Path>) -> Result<Figment> {
    let mut figment = Figment::new().merge(Serialized::defaults(BuildConfig::default()));

    if let Some(path) = path {
        let file_name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or_default();
        figment = match extension {
            "toml" => figment.merge(Toml::file(path)),
            "json" if file_name == PACKAGE_JSON => {
                figment.merge(Serialized::defaults(package_field(path)?))
            }
            "json" => figment.merge(Json::file(path)),
            other => {
                return Err(ConfigError::UnsupportedFormat {
                    extension: other.to_string(),
                });
            }
        };
    }

    // WPACK_MODE, WPACK_OUT_DIR, WPACK_SHRINK__COMPRESS_PASSES, ...
    Ok(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
}

fn package_field(path: &Path) -> Result<serde_json::Value> {
    let content = std::fs::read_to_string(path)?;
    let mut parsed: serde_json::Value = serde_json::from_str(&content).map_err(|e| {
        ConfigError::invalid(PACKAGE_JSON, format!("invalid JSON: {e}"))
    })?;
    match parsed.get_mut(PACKAGE_FIELD).map(serde_json::Value::take) {
        Some(value) if !value.is_null() => Ok(value),
        _ => Err(ConfigError::invalid(
            PACKAGE_FIELD,
            "add a 'wpack' field to your package.json",
        )),
    }
}

fn rebase(base: &Path, root: &Path) -> PathBuf {
    if root.is_absolute() {
        root.to_path_buf()
    } else if root == Path::new(".") {
        base.to_path_buf()
    } else {
        base.join(root)
    }
}

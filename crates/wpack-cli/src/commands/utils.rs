use std::path::{Path, PathBuf};

use wpack_config::{BuildConfig, ConfigDiscovery, load_file};

use crate::cli::ConfigArgs;
use crate::error::{CliError, Result};

/// Values given on the command line, applied after file and environment.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub mode: Option<wpack_config::Mode>,
    pub target: Option<wpack_config::EsTarget>,
    pub entries: Vec<PathBuf>,
    pub out_dir: Option<PathBuf>,
}

impl Overrides {
    pub fn from_args(args: &ConfigArgs, out_dir: Option<&Path>) -> Self {
        Self {
            mode: args.mode.map(Into::into),
            target: args.target.map(Into::into),
            entries: args.entries.clone(),
            out_dir: out_dir.map(Path::to_path_buf),
        }
    }

    /// Command-line paths are relative to the working directory, not to
    /// the configuration root.
    pub fn apply(&self, config: &mut BuildConfig, cwd: &Path) {
        if let Some(mode) = self.mode {
            config.mode = mode;
        }
        if let Some(target) = self.target {
            config.target = target;
        }
        if !self.entries.is_empty() {
            config.entries = self.entries.iter().map(|entry| cwd.join(entry)).collect();
        }
        if let Some(out_dir) = &self.out_dir {
            config.out_dir = cwd.join(out_dir);
        }
    }
}

/// Load the configuration named by `args`, or the one discovered in the
/// project root, then apply `overrides`.
pub fn load_config(args: &ConfigArgs, overrides: &Overrides) -> Result<BuildConfig> {
    let cwd = std::env::current_dir()?;
    let mut config = match &args.config {
        Some(path) => {
            let path = cwd.join(path);
            if !path.is_file() {
                return Err(CliError::FileNotFound(path));
            }
            load_file(&path, None::<()>)?
        }
        None => {
            let root = args
                .root
                .as_ref()
                .map_or_else(|| cwd.clone(), |root| cwd.join(root));
            ConfigDiscovery::new(root).load()?
        }
    };
    overrides.apply(&mut config, &cwd);
    Ok(config)
}

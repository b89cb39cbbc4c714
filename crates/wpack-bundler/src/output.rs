//! Writing a finished build to disk.
//!
//! All files are written to temporary siblings first and renamed into place
//! once every write succeeded, so a failed write leaves no partial build
//! behind. Every target path is checked to stay inside the output directory.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use path_clean::PathClean;
use wpack_config::ConfigWarning;

use crate::bundle::ArtifactSet;
use crate::error::{BuildError, Result};
use crate::report::SizeReport;

/// The result of a successful build, not yet written anywhere.
#[derive(Debug, Clone)]
pub struct BuildOutput {
    pub artifacts: ArtifactSet,
    pub report: SizeReport,
    /// Non-fatal configuration problems found while validating.
    pub warnings: Vec<ConfigWarning>,
    /// Paths that cleaning the output directory must never delete.
    pub protected: Vec<PathBuf>,
}

impl BuildOutput {
    /// Write every artifact below `dir`, returning the written paths in
    /// artifact order. With `clean`, files already in `dir` are removed first.
    pub fn write_to(&self, dir: &Path, clean: bool) -> Result<Vec<PathBuf>> {
        let dir = validate_and_normalize_dir(dir)?;

        let mut operations = Vec::new();
        for (name, bytes, _) in self.artifacts.entries() {
            operations.push((validate_output_path(&dir, name)?, bytes));
        }

        if clean && dir.exists() {
            if let Some(path) = self.protected.iter().find(|path| path.starts_with(&dir)) {
                return Err(BuildError::InvalidOutputPath(format!(
                    "refusing to clean '{}', it contains '{}'",
                    dir.display(),
                    path.display()
                )));
            }
            empty_dir(&dir)?;
        }
        fs::create_dir_all(&dir).map_err(|e| write_failure("create", &dir, e))?;

        write_files_atomic(&operations)?;
        for (path, bytes) in &operations {
            tracing::debug!(path = %path.display(), bytes = bytes.len(), "wrote artifact");
        }
        Ok(operations.into_iter().map(|(path, _)| path).collect())
    }
}

/// Normalize `dir` and make it absolute.
fn validate_and_normalize_dir(dir: &Path) -> Result<PathBuf> {
    let dir = if dir.is_absolute() {
        dir.to_path_buf()
    } else {
        std::env::current_dir()
            .map_err(|e| BuildError::InvalidOutputPath(format!("no working directory: {e}")))?
            .join(dir)
    };
    Ok(dir.clean())
}

#[cfg(target_os = "windows")]
const DEVICE_NAMES: [&str; 22] = [
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// Join `name` onto `dir`, refusing anything that escapes it.
fn validate_output_path(dir: &Path, name: &str) -> Result<PathBuf> {
    let invalid = |why: &str| BuildError::InvalidOutputPath(format!("'{}' {why}", name.escape_debug()));
    if name.is_empty() || name.contains('\0') {
        return Err(invalid("is not a valid file name"));
    }

    #[cfg(target_os = "windows")]
    {
        let stem = name.split('.').next().unwrap_or(name).to_ascii_uppercase();
        if DEVICE_NAMES.contains(&stem.as_str()) {
            return Err(invalid("is a reserved device name"));
        }
    }

    let target = dir.join(name).clean();
    if target == dir || !target.starts_with(dir) {
        return Err(invalid(&format!(
            "resolves to '{}', outside of '{}'",
            target.display(),
            dir.display()
        )));
    }
    Ok(target)
}

/// A file written next to its target, removed again unless committed.
struct Staged {
    temp: PathBuf,
    target: PathBuf,
    committed: bool,
}

impl Staged {
    fn write(target: &Path, bytes: &[u8]) -> Result<Self> {
        let parent = target.parent().unwrap_or(Path::new("."));
        fs::create_dir_all(parent).map_err(|e| write_failure("create", parent, e))?;

        let mut temp = target.as_os_str().to_owned();
        temp.push(OsString::from(".wpack-tmp"));
        let temp = PathBuf::from(temp);
        fs::write(&temp, bytes).map_err(|e| write_failure("write", &temp, e))?;
        Ok(Self {
            temp,
            target: target.to_path_buf(),
            committed: false,
        })
    }

    fn commit(&mut self) -> Result<()> {
        fs::rename(&self.temp, &self.target).map_err(|e| write_failure("move", &self.target, e))?;
        self.committed = true;
        Ok(())
    }
}

impl Drop for Staged {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        if let Err(error) = fs::remove_file(&self.temp) {
            tracing::warn!(path = %self.temp.display(), %error, "temporary file left behind");
        }
    }
}

fn write_failure(action: &str, path: &Path, error: std::io::Error) -> BuildError {
    BuildError::WriteFailure(format!("could not {action} '{}': {error}", path.display()))
}

/// Stage every file first, then move them all into place.
fn write_files_atomic(operations: &[(PathBuf, &[u8])]) -> Result<()> {
    let mut staged = operations
        .iter()
        .map(|(target, bytes)| Staged::write(target, bytes))
        .collect::<Result<Vec<_>>>()?;
    staged.iter_mut().try_for_each(Staged::commit)
}

fn empty_dir(dir: &Path) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            fs::remove_dir_all(&path)?;
        } else {
            fs::remove_file(&path)?;
        }
    }
    Ok(())
}

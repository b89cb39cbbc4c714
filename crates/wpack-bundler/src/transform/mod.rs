//! Transform stage: turns each [`ModuleUnit`] into executable JavaScript.
//!
//! Every role is handled by a collaborator implementing [`Transform`].
//! Collaborators only ever see one unit; ordering, dispatch and failure
//! handling live here.
//!
//! ```text
//! ModuleUnit ─┬─ script   → strip types, substitute defines ──┐
//!             ├─ template → minify markup, export string      ├→ IntermediateFragment
//!             ├─ style    → lightningcss, inject <style>      │
//!             └─ data     → validate JSON, export value ──────┘
//! ```

mod data;
mod script;
mod style;
mod template;

use std::path::Path;
use std::sync::Arc;

use rayon::prelude::*;
use rustc_hash::FxHashMap;
use wpack_config::BuildConfig;

use crate::define::DefineMap;
use crate::error::{BuildError, Result};
use crate::resolve::{ModuleRole, ModuleUnit};

pub use data::DataTransform;
pub use script::ScriptTransform;
pub use style::{CssPostProcess, StyleTransform};
pub use template::TemplateTransform;

/// A collaborator that compiles one kind of source into an ES module.
///
/// Implementations must be pure functions of their input: they are called
/// concurrently from the worker pool.
pub trait Transform: Send + Sync {
    fn name(&self) -> &'static str;

    fn transform(&self, path: &Path, source: &str) -> anyhow::Result<TransformOutput>;
}

/// What a collaborator hands back.
///
/// Builds carry no source maps, so a collaborator only returns code.
#[derive(Debug, Clone, Default)]
pub struct TransformOutput {
    pub code: String,
}

impl TransformOutput {
    pub fn code(code: impl Into<String>) -> Self {
        Self { code: code.into() }
    }
}

/// Executable output for one unit.
#[derive(Debug, Clone)]
pub struct IntermediateFragment {
    pub unit: ModuleUnit,
    /// ES module source.
    pub code: String,
}

/// Role-dispatching transform stage.
pub struct TransformStage {
    transforms: FxHashMap<ModuleRole, Arc<dyn Transform>>,
    show_processed_files: bool,
}

impl TransformStage {
    /// The built-in collaborators configured from `config`.
    pub fn new(config: &BuildConfig) -> Self {
        let defines = Arc::new(DefineMap::new(config.effective_defines()));
        let options = config.transform;

        let mut transforms: FxHashMap<ModuleRole, Arc<dyn Transform>> = FxHashMap::default();
        transforms.insert(ModuleRole::Script, Arc::new(ScriptTransform::new(defines)));
        transforms.insert(ModuleRole::Template, Arc::new(TemplateTransform::new(options)));
        transforms.insert(ModuleRole::Style, Arc::new(StyleTransform::new(options)));
        transforms.insert(ModuleRole::Data, Arc::new(DataTransform));

        Self {
            transforms,
            show_processed_files: config.logger.show_processed_files,
        }
    }

    /// Replace the collaborator for `role`.
    pub fn with_transform(mut self, role: ModuleRole, transform: impl Transform + 'static) -> Self {
        self.transforms.insert(role, Arc::new(transform));
        self
    }

    /// Transform a single unit.
    pub fn transform(&self, unit: ModuleUnit) -> Result<IntermediateFragment> {
        let transform = self.transforms.get(&unit.role).ok_or_else(|| {
            BuildError::transform(
                &unit.resolved_path,
                anyhow::anyhow!("no transform registered for {} modules", unit.role),
            )
        })?;

        let output = unit
            .text()
            .and_then(|source| transform.transform(&unit.resolved_path, source))
            .map_err(|cause| BuildError::transform(&unit.resolved_path, cause))?;

        if self.show_processed_files {
            tracing::debug!(
                transform = transform.name(),
                path = %unit.resolved_path.display(),
                bytes = output.code.len(),
                "processed"
            );
        }

        Ok(IntermediateFragment {
            unit,
            code: output.code,
        })
    }

    /// Transform independent units on the worker pool.
    ///
    /// Results keep the input order. The first failure stops the remaining
    /// work and is returned; no partial result escapes.
    pub fn transform_all(&self, units: Vec<ModuleUnit>) -> Result<Vec<IntermediateFragment>> {
        units
            .into_par_iter()
            .map(|unit| self.transform(unit))
            .collect()
    }
}

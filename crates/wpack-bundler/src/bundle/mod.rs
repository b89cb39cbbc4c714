//! Bundling engine: module graph discovery and single-chunk linking.
//!
//! Discovery walks the graph breadth first from the entries. Each level is
//! read from disk and handed to the transform stage as one batch, so the
//! worker pool sees every independent unit of that level at once. Module
//! ids, asset names and the final chunk layout follow discovery order, which
//! only depends on the sources.
//!
//! Dynamic imports are ordinary graph edges; their targets are linked into
//! the same chunk and required lazily.

mod artifact;
mod link;
mod runtime;
mod scan;

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use path_clean::PathClean;
use rayon::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};
use wpack_config::BuildConfig;

use crate::error::{BuildError, Result};
use crate::externals::ExternalRegistry;
use crate::resolve::{ModuleRole, ModuleUnit, Resolver};
use crate::transform::{IntermediateFragment, TransformStage};

pub use artifact::{ArtifactKind, ArtifactSet, AssetArtifact, BundleArtifact};

use link::{LinkInput, LinkedModule};
use scan::{ScanError, scan_dependencies};

/// Position of a module in discovery order.
pub type ModuleId = usize;

/// What an import specifier of one module points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkTarget {
    Module(ModuleId),
    /// Global name provided by the host page.
    External(String),
    /// Public URL of a copied asset.
    Asset(String),
}

/// A transformed module with its resolved imports.
#[derive(Debug, Clone)]
pub struct GraphModule {
    pub id: ModuleId,
    pub fragment: IntermediateFragment,
    /// Specifier -> target, in first-seen order.
    pub targets: IndexMap<String, LinkTarget>,
}

/// Every module reachable from the entries, plus discovered assets.
#[derive(Debug, Clone)]
pub struct ModuleGraph {
    root: PathBuf,
    modules: Vec<GraphModule>,
    entries: Vec<ModuleId>,
    assets: Vec<AssetArtifact>,
}

impl ModuleGraph {
    /// Discover and transform the graph of `config`.
    pub fn discover(
        config: &BuildConfig,
        externals: &ExternalRegistry,
        stage: &TransformStage,
    ) -> Result<Self> {
        GraphBuilder::new(config, externals).build(stage)
    }

    pub fn modules(&self) -> &[GraphModule] {
        &self.modules
    }

    pub fn entries(&self) -> &[ModuleId] {
        &self.entries
    }

    pub fn assets(&self) -> &[AssetArtifact] {
        &self.assets
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    fn label(&self, path: &Path) -> String {
        path.strip_prefix(&self.root)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/")
    }
}

struct Pending {
    id: ModuleId,
    specifier: String,
    path: PathBuf,
    role: ModuleRole,
}

struct GraphBuilder<'c> {
    config: &'c BuildConfig,
    externals: &'c ExternalRegistry,
    resolver: Resolver,
    ids: FxHashMap<PathBuf, ModuleId>,
    asset_urls: FxHashMap<PathBuf, String>,
    asset_names: FxHashSet<String>,
    assets: Vec<AssetArtifact>,
}

impl<'c> GraphBuilder<'c> {
    fn new(config: &'c BuildConfig, externals: &'c ExternalRegistry) -> Self {
        Self {
            config,
            externals,
            resolver: Resolver::new(config),
            ids: FxHashMap::default(),
            asset_urls: FxHashMap::default(),
            asset_names: FxHashSet::default(),
            assets: Vec::new(),
        }
    }

    fn build(mut self, stage: &TransformStage) -> Result<ModuleGraph> {
        let config = self.config;
        let mut frontier = Vec::new();
        let mut entries = Vec::new();
        for entry in &config.entries {
            let path = config.resolve_path(entry).clean();
            let fail = |reason: &str| BuildError::Resolution {
                specifier: entry.display().to_string(),
                importer: config.root.clone(),
                reason: reason.to_string(),
            };
            if !path.is_file() {
                return Err(fail("entry file does not exist"));
            }
            let role = self.resolver.classify(&path);
            if role == ModuleRole::Asset {
                return Err(fail("entry is not a script, template, style or data file"));
            }
            let specifier = entry.display().to_string();
            let id = self.module_id(specifier, path, role, &mut frontier);
            if !entries.contains(&id) {
                entries.push(id);
            }
        }

        let mut modules: Vec<GraphModule> = Vec::new();
        let mut level = 0;
        while !frontier.is_empty() {
            let batch = std::mem::take(&mut frontier);
            let ids: Vec<ModuleId> = batch.iter().map(|p| p.id).collect();
            let units = batch
                .into_iter()
                .map(|p| ModuleUnit::read(p.specifier, p.path, p.role))
                .collect::<Result<Vec<_>>>()?;

            let fragments = stage.transform_all(units)?;
            let scans = fragments
                .par_iter()
                .map(|fragment| {
                    scan_dependencies(&fragment.code)
                        .map_err(|err| scan_error(err, &fragment.unit.resolved_path))
                })
                .collect::<Result<Vec<_>>>()?;

            tracing::debug!(level, modules = ids.len(), "transformed graph level");

            for ((id, fragment), deps) in ids.into_iter().zip(fragments).zip(scans) {
                let mut targets = IndexMap::new();
                for dep in deps {
                    if targets.contains_key(&dep.specifier) {
                        continue;
                    }
                    let target = self.link_target(
                        &dep.specifier,
                        &fragment.unit.resolved_path,
                        &mut frontier,
                    )?;
                    if dep.dynamic {
                        tracing::debug!(
                            specifier = %dep.specifier,
                            importer = %fragment.unit.resolved_path.display(),
                            "inlining dynamic import"
                        );
                    }
                    targets.insert(dep.specifier, target);
                }
                modules.push(GraphModule {
                    id,
                    fragment,
                    targets,
                });
            }
            level += 1;
        }

        modules.sort_by_key(|module| module.id);

        Ok(ModuleGraph {
            root: config.root.clean(),
            modules,
            entries,
            assets: self.assets,
        })
    }

    fn link_target(
        &mut self,
        specifier: &str,
        importer: &Path,
        frontier: &mut Vec<Pending>,
    ) -> Result<LinkTarget> {
        if let Some(global) = self.externals.global_name_for(specifier) {
            return Ok(LinkTarget::External(global.to_string()));
        }

        let path = self.resolver.resolve(specifier, importer)?;
        match self.resolver.classify(&path) {
            ModuleRole::Asset => self.asset(specifier, path).map(LinkTarget::Asset),
            role => Ok(LinkTarget::Module(self.module_id(
                specifier.to_string(),
                path,
                role,
                frontier,
            ))),
        }
    }

    fn module_id(
        &mut self,
        specifier: String,
        path: PathBuf,
        role: ModuleRole,
        frontier: &mut Vec<Pending>,
    ) -> ModuleId {
        if let Some(id) = self.ids.get(&path) {
            return *id;
        }
        let id = self.ids.len();
        self.ids.insert(path.clone(), id);
        frontier.push(Pending {
            id,
            specifier,
            path,
            role,
        });
        id
    }

    /// Register an asset once, returning its public URL.
    fn asset(&mut self, specifier: &str, path: PathBuf) -> Result<String> {
        if let Some(url) = self.asset_urls.get(&path) {
            return Ok(url.clone());
        }

        let unit = ModuleUnit::read(specifier, path.clone(), ModuleRole::Asset)?;
        let file_name = self.asset_file_name(&path);
        let base = &self.config.base_url;
        let url = if base.ends_with('/') {
            format!("{base}{file_name}")
        } else {
            format!("{base}/{file_name}")
        };

        self.asset_names.insert(file_name.clone());
        self.asset_urls.insert(path, url.clone());
        self.assets.push(AssetArtifact {
            file_name,
            source: unit.raw_content,
        });
        Ok(url)
    }

    /// `<assets_dir>/<stem><ext>`, numbered when two assets share a name.
    fn asset_file_name(&self, path: &Path) -> String {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "asset".to_string());
        let ext = path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();
        let dir = self.config.assets_dir.trim_matches('/');
        let name = |suffix: String| {
            if dir.is_empty() {
                format!("{stem}{suffix}{ext}")
            } else {
                format!("{dir}/{stem}{suffix}{ext}")
            }
        };

        let mut candidate = name(String::new());
        let mut n = 1;
        while self.asset_names.contains(&candidate) {
            candidate = name(format!("-{n}"));
            n += 1;
        }
        candidate
    }
}

fn scan_error(err: ScanError, path: &Path) -> BuildError {
    match err {
        ScanError::Parse(message) => BuildError::transform(path, anyhow::anyhow!(message)),
        ScanError::ComputedDynamicImport(text) => BuildError::multi_chunk(format!(
            "{text} in {} has a computed specifier and cannot be inlined",
            path.display()
        )),
    }
}

/// Link every module of `graph` into the single script chunk.
pub fn bundle(graph: &ModuleGraph, config: &BuildConfig) -> Result<ArtifactSet> {
    let labels: Vec<String> = graph
        .modules
        .iter()
        .map(|module| graph.label(&module.fragment.unit.resolved_path))
        .collect();

    let linked = graph
        .modules
        .par_iter()
        .zip(labels.par_iter())
        .map(|(module, label)| {
            link::link_module(&LinkInput {
                id: module.id,
                label,
                path: &module.fragment.unit.resolved_path,
                code: &module.fragment.code,
                targets: &module.targets,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    check_imports(graph, &linked)?;

    let uses_reexport = linked.iter().any(|module| module.uses_reexport);
    let mut code = runtime::prelude(uses_reexport);
    for module in &linked {
        code.push_str(&module.code);
    }
    code.push_str(&runtime::epilogue(&graph.entries));

    tracing::debug!(
        modules = linked.len(),
        assets = graph.assets.len(),
        bytes = code.len(),
        "linked chunk"
    );

    ArtifactSet::new(
        vec![BundleArtifact::new(config.output_file_name.clone(), code)],
        graph.assets.clone(),
    )
}

/// Every named import of an internal module must be exported by it.
fn check_imports(graph: &ModuleGraph, linked: &[LinkedModule]) -> Result<()> {
    for module in linked {
        for (name, dep) in &module.imported {
            let mut visited = FxHashSet::default();
            if !provides(linked, *dep, name, &mut visited) {
                return Err(BuildError::MissingExport {
                    name: name.clone(),
                    module: graph.modules[*dep].fragment.unit.resolved_path.clone(),
                });
            }
        }
    }
    Ok(())
}

fn provides(
    linked: &[LinkedModule],
    id: ModuleId,
    name: &str,
    visited: &mut FxHashSet<ModuleId>,
) -> bool {
    if !visited.insert(id) {
        return false;
    }
    let exports = &linked[id].exports;
    if exports.names.contains(name) || exports.open {
        return true;
    }
    name != "default"
        && exports
            .stars
            .iter()
            .any(|star| provides(linked, *star, name, visited))
}

//! # wpack-bundler
//!
//! Packages a widget into one distributable script: the module graph is
//! resolved and transformed, linked into a single chunk, shrunk with a
//! protected public surface, and measured against size budgets.
//!
//! ## Quick Start
//!
//! ```no_run
//! use wpack_bundler::{BuildConfig, SizeReporter};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = BuildConfig::new("src/index.ts")
//!     .external("jquery", "jQuery")
//!     .define("__WIDGET_VERSION__", "\"1.0.0\"");
//!
//! let mut reporter = SizeReporter::new(&config);
//! let output = wpack_bundler::Pipeline::new(&config)
//!     .observe(&mut reporter)
//!     .run()?;
//! output.write_to(&config.output_dir(), true)?;
//! # Ok(()) }
//! ```
//!
//! ## Shrinking on its own
//!
//! ```
//! use wpack_bundler::{ShrinkEngine, ShrinkPolicy, EsTarget};
//!
//! let policy = ShrinkPolicy::default().with_reserved(["Widget"]);
//! let engine = ShrinkEngine::new(policy, EsTarget::ES2020);
//! let out = engine
//!     .shrink_code("function Widget(options) { var settings = options; return settings; }")
//!     .unwrap();
//! assert!(out.contains("Widget"));
//! ```

pub mod bundle;
pub mod define;
pub mod error;
pub mod externals;
pub mod lifecycle;
pub mod output;
pub mod report;
pub mod resolve;
pub mod shrink;
pub mod transform;

mod edits;
mod js;

pub use wpack_config::{
    BuildConfig, DropKind, EsTarget, ExternalSpec, Mode, Severity, ShrinkPolicy, SizeThreshold,
};

pub use bundle::{ArtifactKind, ArtifactSet, AssetArtifact, BundleArtifact, ModuleGraph};
pub use define::DefineMap;
pub use error::{BuildError, Result};
pub use externals::ExternalRegistry;
pub use lifecycle::{BuildObserver, BuildState, Pipeline};
pub use output::BuildOutput;
pub use report::{ArtifactSize, Classification, SizeReport, SizeReporter, classify};
pub use resolve::{ModuleRole, ModuleUnit, Resolver};
pub use shrink::{PublicSurface, ShrinkEngine};
pub use transform::{IntermediateFragment, Transform, TransformOutput, TransformStage};

/// Build `config` without observers.
pub fn build(config: &BuildConfig) -> Result<BuildOutput> {
    Pipeline::new(config).run()
}

/// Build `config` with the size reporter attached.
pub fn build_with_report(config: &BuildConfig) -> Result<BuildOutput> {
    let mut reporter = SizeReporter::new(config);
    Pipeline::new(config).observe(&mut reporter).run()
}

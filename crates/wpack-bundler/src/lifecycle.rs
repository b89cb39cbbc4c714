//! The build lifecycle as a typestate pipeline.
//!
//! ```text
//! Idle -> Starting -> Transforming -> Bundling -> Shrinking -> Reporting -> Completed
//! ```
//!
//! Each transition consumes the pipeline and returns it in the next state,
//! so stages run in order and every hook fires at most once. A failing
//! transition notifies the observers with the state it was entering and returns
//! the error; nothing has been written at that point.

use std::fmt;

use wpack_config::{BuildConfig, ConfigWarning, validate_fs};

use crate::bundle::{self, ArtifactSet, ModuleGraph};
use crate::error::{BuildError, Result};
use crate::externals::ExternalRegistry;
use crate::output::BuildOutput;
use crate::report::SizeReport;
use crate::resolve::ModuleRole;
use crate::shrink::ShrinkEngine;
use crate::transform::{Transform, TransformStage};

/// Where a build is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildState {
    Idle,
    Starting,
    Transforming,
    Bundling,
    Shrinking,
    Reporting,
    Completed,
    Failed,
}

impl fmt::Display for BuildState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BuildState::Idle => "idle",
            BuildState::Starting => "starting",
            BuildState::Transforming => "transforming",
            BuildState::Bundling => "bundling",
            BuildState::Shrinking => "shrinking",
            BuildState::Reporting => "reporting",
            BuildState::Completed => "completed",
            BuildState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Lifecycle hooks. Observers see the build, they cannot change it.
pub trait BuildObserver {
    /// Fired on `Idle -> Starting`.
    fn on_build_start(&mut self, _config: &BuildConfig) {}

    /// Fired once after shrinking with the final artifacts.
    fn on_bundle_generated(&mut self, _artifacts: &ArtifactSet, _report: &SizeReport) {}

    /// Fired on `Reporting -> Completed`.
    fn on_build_end(&mut self, _report: &SizeReport) {}

    /// Fired when entering `state` failed. The build is then `Failed`.
    fn on_build_failed(&mut self, _state: BuildState, _error: &BuildError) {}
}

/// A typestate marker.
pub trait Stage {
    const STATE: BuildState;
}

pub struct Idle {
    transforms: TransformStage,
}

pub struct Starting {
    transforms: TransformStage,
}

pub struct Transforming {
    graph: ModuleGraph,
}

pub struct Bundling {
    artifacts: ArtifactSet,
}

pub struct Shrinking {
    artifacts: ArtifactSet,
}

pub struct Reporting {
    artifacts: ArtifactSet,
    report: SizeReport,
}

pub struct Completed {
    output: BuildOutput,
}

impl Stage for Idle {
    const STATE: BuildState = BuildState::Idle;
}
impl Stage for Starting {
    const STATE: BuildState = BuildState::Starting;
}
impl Stage for Transforming {
    const STATE: BuildState = BuildState::Transforming;
}
impl Stage for Bundling {
    const STATE: BuildState = BuildState::Bundling;
}
impl Stage for Shrinking {
    const STATE: BuildState = BuildState::Shrinking;
}
impl Stage for Reporting {
    const STATE: BuildState = BuildState::Reporting;
}
impl Stage for Completed {
    const STATE: BuildState = BuildState::Completed;
}

/// One build of one configuration.
pub struct Pipeline<'a, S> {
    config: &'a BuildConfig,
    observers: Vec<&'a mut dyn BuildObserver>,
    warnings: Vec<ConfigWarning>,
    state: S,
}

impl<'a, S: Stage> Pipeline<'a, S> {
    pub fn state(&self) -> BuildState {
        S::STATE
    }

    pub fn config(&self) -> &'a BuildConfig {
        self.config
    }

    pub fn warnings(&self) -> &[ConfigWarning] {
        &self.warnings
    }

    fn advance<T: Stage>(self, state: T) -> Pipeline<'a, T> {
        tracing::trace!(from = %S::STATE, to = %T::STATE, "build state changed");
        Pipeline {
            config: self.config,
            observers: self.observers,
            warnings: self.warnings,
            state,
        }
    }

    /// Swap the state for a placeholder, keeping the rest of the pipeline.
    fn take_state<T>(self, take: impl FnOnce(S) -> T) -> (T, Pipeline<'a, Vacant>) {
        let Pipeline {
            config,
            observers,
            warnings,
            state,
        } = self;
        let pipeline = Pipeline {
            config,
            observers,
            warnings,
            state: Vacant(S::STATE),
        };
        (take(state), pipeline)
    }
}

/// A pipeline whose state has been moved out mid-transition.
struct Vacant(BuildState);

impl<'a> Pipeline<'a, Vacant> {
    fn resume<T: Stage>(self, state: T) -> Pipeline<'a, T> {
        tracing::trace!(from = %self.state.0, to = %T::STATE, "build state changed");
        Pipeline {
            config: self.config,
            observers: self.observers,
            warnings: self.warnings,
            state,
        }
    }
}

impl<S> Pipeline<'_, S> {
    /// Notify observers that entering `state` failed.
    fn fail(mut self, state: BuildState, error: BuildError) -> BuildError {
        tracing::debug!(%state, code = error.code(), "build failed");
        for observer in &mut self.observers {
            observer.on_build_failed(state, &error);
        }
        error
    }
}

impl<'a> Pipeline<'a, Idle> {
    pub fn new(config: &'a BuildConfig) -> Self {
        Self {
            config,
            observers: Vec::new(),
            warnings: Vec::new(),
            state: Idle {
                transforms: TransformStage::new(config),
            },
        }
    }

    /// Register an observer; observers are notified in registration order.
    pub fn observe(mut self, observer: &'a mut dyn BuildObserver) -> Self {
        self.observers.push(observer);
        self
    }

    /// Replace the collaborator transform for `role`.
    pub fn with_transform(mut self, role: ModuleRole, transform: impl Transform + 'static) -> Self {
        self.state.transforms = self.state.transforms.with_transform(role, transform);
        self
    }

    /// Fire `on_build_start` and validate the configuration.
    pub fn start(mut self) -> Result<Pipeline<'a, Starting>> {
        for observer in &mut self.observers {
            observer.on_build_start(self.config);
        }

        match validate_fs(self.config) {
            Ok(warnings) => {
                for warning in &warnings {
                    tracing::warn!(field = %warning.field, "{}", warning.message);
                }
                self.warnings = warnings;
            }
            Err(error) => return Err(self.fail(BuildState::Starting, error.into())),
        }

        let (transforms, pipeline) = self.take_state(|idle| idle.transforms);
        Ok(pipeline.resume(Starting { transforms }))
    }

    /// Run every stage to completion.
    pub fn run(self) -> Result<BuildOutput> {
        Ok(self
            .start()?
            .transform()?
            .bundle()?
            .shrink()?
            .report()
            .finish()
            .into_output())
    }
}

impl<'a> Pipeline<'a, Starting> {
    /// Resolve, read and transform every module reachable from the entries.
    pub fn transform(self) -> Result<Pipeline<'a, Transforming>> {
        let externals = ExternalRegistry::from_specs(&self.config.externals);
        match ModuleGraph::discover(self.config, &externals, &self.state.transforms) {
            Ok(graph) => {
                tracing::debug!(
                    modules = graph.len(),
                    assets = graph.assets().len(),
                    "module graph discovered"
                );
                Ok(self.advance(Transforming { graph }))
            }
            Err(error) => Err(self.fail(BuildState::Transforming, error)),
        }
    }
}

impl<'a> Pipeline<'a, Transforming> {
    pub fn graph(&self) -> &ModuleGraph {
        &self.state.graph
    }

    /// Link the graph into the single script artifact.
    pub fn bundle(self) -> Result<Pipeline<'a, Bundling>> {
        match bundle::bundle(&self.state.graph, self.config) {
            Ok(artifacts) => Ok(self.advance(Bundling { artifacts })),
            Err(error) => Err(self.fail(BuildState::Bundling, error)),
        }
    }
}

impl<'a> Pipeline<'a, Bundling> {
    pub fn artifacts(&self) -> &ArtifactSet {
        &self.state.artifacts
    }

    pub fn shrink(self) -> Result<Pipeline<'a, Shrinking>> {
        let engine = ShrinkEngine::from_config(self.config);
        let (result, pipeline) = self.take_state(|bundling| engine.shrink(bundling.artifacts));
        match result {
            Ok(artifacts) => Ok(pipeline.resume(Shrinking { artifacts })),
            Err(error) => Err(pipeline.fail(BuildState::Shrinking, error)),
        }
    }
}

impl<'a> Pipeline<'a, Shrinking> {
    pub fn artifacts(&self) -> &ArtifactSet {
        &self.state.artifacts
    }

    /// Measure the final artifacts and fire `on_bundle_generated`.
    pub fn report(mut self) -> Pipeline<'a, Reporting> {
        let config = self.config;
        let report = SizeReport::compute(
            &self.state.artifacts,
            &config.size_thresholds,
            config.report_compressed_size,
        );
        for observer in &mut self.observers {
            observer.on_bundle_generated(&self.state.artifacts, &report);
        }

        let (artifacts, pipeline) = self.take_state(|shrinking| shrinking.artifacts);
        pipeline.resume(Reporting { artifacts, report })
    }
}

impl<'a> Pipeline<'a, Reporting> {
    pub fn size_report(&self) -> &SizeReport {
        &self.state.report
    }

    /// Fire `on_build_end`.
    pub fn finish(mut self) -> Pipeline<'a, Completed> {
        for observer in &mut self.observers {
            observer.on_build_end(&self.state.report);
        }
        let warnings = std::mem::take(&mut self.warnings);
        let protected = self.config.protected_paths();
        let (output, pipeline) = self.take_state(|Reporting { artifacts, report }| BuildOutput {
            artifacts,
            report,
            warnings,
            protected,
        });
        pipeline.resume(Completed { output })
    }
}

impl Pipeline<'_, Completed> {
    pub fn output(&self) -> &BuildOutput {
        &self.state.output
    }

    pub fn into_output(self) -> BuildOutput {
        self.state.output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;
    use wpack_config::ShrinkPolicy;

    #[derive(Default)]
    struct Recorder {
        events: Vec<String>,
    }

    impl BuildObserver for Recorder {
        fn on_build_start(&mut self, _config: &BuildConfig) {
            self.events.push("start".to_string());
        }

        fn on_bundle_generated(&mut self, artifacts: &ArtifactSet, report: &SizeReport) {
            assert_eq!(artifacts.total_bytes(), report.total_bytes);
            self.events.push(format!("generated:{}", artifacts.chunk().file_name));
        }

        fn on_build_end(&mut self, report: &SizeReport) {
            self.events.push(format!("end:{}", report.classification.name));
        }

        fn on_build_failed(&mut self, state: BuildState, error: &BuildError) {
            self.events.push(format!("failed:{state}:{}", error.code()));
        }
    }

    fn project(source: &str) -> (TempDir, BuildConfig) {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("src/index.js"), source).unwrap();
        let config = BuildConfig::new("src/index.js")
            .root(dir.path())
            .shrink(ShrinkPolicy::passthrough());
        (dir, config)
    }

    #[test]
    fn hooks_fire_once_in_order() {
        let (_dir, config) = project("export const answer = 42;\n");
        let mut recorder = Recorder::default();
        let output = Pipeline::new(&config).observe(&mut recorder).run().unwrap();

        assert_eq!(
            recorder.events,
            vec!["start", "generated:widget.js", "end:optimal"]
        );
        assert!(output.artifacts.chunk().code.contains("42"));
    }

    #[test]
    fn states_advance_step_by_step() {
        let (_dir, config) = project("export default 1;\n");
        let pipeline = Pipeline::new(&config);
        assert_eq!(pipeline.state(), BuildState::Idle);
        let pipeline = pipeline.start().unwrap();
        assert_eq!(pipeline.state(), BuildState::Starting);
        let pipeline = pipeline.transform().unwrap();
        assert_eq!(pipeline.graph().len(), 1);
        let pipeline = pipeline.bundle().unwrap();
        assert_eq!(pipeline.state(), BuildState::Bundling);
        let pipeline = pipeline.shrink().unwrap().report();
        assert_eq!(pipeline.state(), BuildState::Reporting);
        let completed = pipeline.finish();
        assert_eq!(completed.state(), BuildState::Completed);
        assert_eq!(completed.output().report.per_artifact.len(), 1);
    }

    #[test]
    fn missing_entry_fails_while_starting() {
        let (_dir, mut config) = project("");
        config.entries = vec!["src/missing.js".into()];
        let mut recorder = Recorder::default();
        let err = match Pipeline::new(&config).observe(&mut recorder).run() {
            Ok(_) => panic!("build should fail"),
            Err(err) => err,
        };
        assert!(matches!(err, BuildError::Config(_)));
        assert_eq!(recorder.events, vec!["start", "failed:starting:INVALID_CONFIG"]);
    }

    #[test]
    fn unresolved_import_fails_while_transforming() {
        let (_dir, config) = project("import x from './nope';\nconsole.log(x);\n");
        let mut recorder = Recorder::default();
        let result = Pipeline::new(&config).observe(&mut recorder).run();
        assert!(matches!(result, Err(BuildError::Resolution { .. })));
        assert_eq!(
            recorder.events,
            vec!["start", "failed:transforming:RESOLUTION_ERROR"]
        );
    }

    #[test]
    fn custom_transforms_replace_builtins() {
        struct Upper;
        impl Transform for Upper {
            fn name(&self) -> &'static str {
                "upper"
            }
            fn transform(
                &self,
                _path: &std::path::Path,
                source: &str,
            ) -> anyhow::Result<crate::transform::TransformOutput> {
                Ok(crate::transform::TransformOutput::code(format!(
                    "export default {};",
                    crate::js::json_string(&source.trim().to_uppercase())
                )))
            }
        }

        let (dir, config) = project("import t from './view.html';\nwindow.t = t;\n");
        fs::write(dir.path().join("src/view.html"), "<p>hi</p>").unwrap();
        let output = Pipeline::new(&config)
            .with_transform(ModuleRole::Template, Upper)
            .run()
            .unwrap();
        assert!(output.artifacts.chunk().code.contains("<P>HI</P>"));
    }
}

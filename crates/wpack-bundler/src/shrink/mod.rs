//! Shrink/obfuscate engine for the merged script artifact.
//!
//! Stages run in a fixed order over the chunk text:
//!
//! 1. `compress_passes` compression passes (statement dropping, pure call
//!    removal, literal folding, dead branch elimination), stopping early once
//!    a pass changes nothing
//! 2. identifier renaming, gated by the [`PublicSurface`]
//! 3. comment stripping
//! 4. syntax lowering to the configured target, with the runtime helpers it
//!    calls defined around the chunk
//! 5. compaction
//!
//! The banner, when configured, is prepended last so it survives comment
//! stripping. Every stage is a pure function of its input text and the
//! policy, so identical inputs produce byte-identical output.

mod comments;
mod compress;
mod helpers;
mod lower;
mod mangle;

use std::collections::{BTreeMap, BTreeSet};

use oxc_allocator::Allocator;
use oxc_codegen::{Codegen, CodegenOptions};
use oxc_span::SourceType;
use wpack_config::{BuildConfig, EsTarget, ShrinkPolicy};

use crate::bundle::ArtifactSet;
use crate::error::{BuildError, Result};
use crate::js;

/// Identifiers that must survive shrinking verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublicSurface {
    names: BTreeSet<String>,
}

impl PublicSurface {
    pub fn new(names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Refuse a rename of `from` before it is committed.
    pub fn check_rename(&self, from: &str, to: &str) -> Result<()> {
        if self.contains(from) {
            return Err(BuildError::shrink_invariant(format!(
                "reserved name '{from}' was selected for renaming"
            )));
        }
        if self.contains(to) {
            return Err(BuildError::shrink_invariant(format!(
                "'{from}' would be renamed to reserved name '{to}'"
            )));
        }
        Ok(())
    }

    /// Whether `text` mentions any reserved name.
    pub(crate) fn mentioned_in(&self, text: &str) -> bool {
        !self.names.is_empty() && js::identifier_tokens(text).any(|token| self.contains(token))
    }

    /// Occurrence count of every reserved name in `code`.
    pub(crate) fn snapshot(&self, code: &str) -> BTreeMap<String, usize> {
        let mut counts: BTreeMap<String, usize> =
            self.names.iter().map(|name| (name.clone(), 0)).collect();
        for token in js::identifier_tokens(code) {
            if let Some(count) = counts.get_mut(token) {
                *count += 1;
            }
        }
        counts
    }

    /// Every reserved name present in `before` is still present in `code`.
    pub(crate) fn ensure_present(
        &self,
        before: &BTreeMap<String, usize>,
        code: &str,
        stage: &str,
    ) -> Result<()> {
        let after = self.snapshot(code);
        for (name, count) in before {
            if *count > 0 && after.get(name).copied().unwrap_or(0) == 0 {
                return Err(BuildError::shrink_invariant(format!(
                    "reserved name '{name}' disappeared during {stage}"
                )));
            }
        }
        Ok(())
    }
}

/// Applies a [`ShrinkPolicy`] to the script artifact.
#[derive(Debug, Clone)]
pub struct ShrinkEngine {
    policy: ShrinkPolicy,
    surface: PublicSurface,
    target: EsTarget,
    banner: Option<String>,
}

impl ShrinkEngine {
    pub fn new(policy: ShrinkPolicy, target: EsTarget) -> Self {
        let surface = PublicSurface::new(policy.reserved_names.iter().cloned());
        Self {
            policy,
            surface,
            target,
            banner: None,
        }
    }

    /// Engine for `config`, with mode gating applied to the policy.
    pub fn from_config(config: &BuildConfig) -> Self {
        let mut engine = Self::new(config.effective_shrink(), config.target);
        engine.banner = config.banner.clone();
        engine
    }

    pub fn with_banner(mut self, banner: impl Into<String>) -> Self {
        self.banner = Some(banner.into());
        self
    }

    pub fn policy(&self) -> &ShrinkPolicy {
        &self.policy
    }

    pub fn surface(&self) -> &PublicSurface {
        &self.surface
    }

    /// Shrink the chunk of `artifacts`, leaving assets untouched.
    pub fn shrink(&self, artifacts: ArtifactSet) -> Result<ArtifactSet> {
        let code = self.shrink_code(&artifacts.chunk().code)?;
        Ok(artifacts.with_code(code))
    }

    pub fn shrink_code(&self, source: &str) -> Result<String> {
        let before_bytes = source.len();
        let mut code = source.to_string();

        for pass in 0..self.policy.compress_passes.max(1) {
            let (next, edits) = compress::run_pass(&code, &self.policy, &self.surface)?;
            tracing::debug!(pass = pass + 1, edits, "compression pass");
            if edits == 0 {
                break;
            }
            code = next;
        }

        if self.policy.mangle {
            code = mangle::mangle(&code, &self.surface)?;
        }

        if self.policy.strip_comments {
            code = comments::strip(&code)?;
        }

        let snapshot = self.surface.snapshot(&code);
        if self.target != EsTarget::ESNext {
            code = lower::lower(&code, self.target)?;
            self.surface.ensure_present(&snapshot, &code, "lowering")?;
        }

        if self.policy.compact {
            code = compact(&code)?;
            self.surface.ensure_present(&snapshot, &code, "compaction")?;
        }

        if let Some(banner) = &self.banner {
            code = format!("{}\n{code}", banner_comment(banner));
        }

        tracing::debug!(before = before_bytes, after = code.len(), "shrunk chunk");
        Ok(code)
    }
}

/// Reprint without insignificant whitespace.
fn compact(code: &str) -> Result<String> {
    let allocator = Allocator::default();
    let program = js::parse(&allocator, code, SourceType::mjs()).map_err(|message| {
        BuildError::Parse {
            origin: "compaction".to_string(),
            message,
        }
    })?;
    Ok(Codegen::new()
        .with_options(CodegenOptions::minify())
        .build(&program)
        .code)
}

fn banner_comment(banner: &str) -> String {
    let trimmed = banner.trim();
    if trimmed.starts_with("/*") || trimmed.starts_with("//") {
        trimmed.to_string()
    } else {
        format!("/*! {} */", trimmed.replace("*/", "* /"))
    }
}

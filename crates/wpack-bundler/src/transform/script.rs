use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, bail};
use oxc_allocator::Allocator;
use oxc_codegen::Codegen;
use oxc_semantic::SemanticBuilder;
use oxc_span::SourceType;
use oxc_transformer::{TransformOptions, Transformer};

use super::{Transform, TransformOutput};
use crate::define::DefineMap;
use crate::js;

/// JavaScript and TypeScript modules.
///
/// TypeScript is reduced to JavaScript (type-only imports are elided), then
/// build-time constants are substituted. JavaScript input is only validated
/// and substituted, so its formatting survives into the bundle.
pub struct ScriptTransform {
    defines: Arc<DefineMap>,
}

impl ScriptTransform {
    pub fn new(defines: Arc<DefineMap>) -> Self {
        Self { defines }
    }
}

fn source_type_for(path: &Path) -> SourceType {
    match path.extension().and_then(|e| e.to_str()) {
        Some("ts" | "mts" | "cts") => SourceType::ts(),
        Some("tsx") => SourceType::tsx(),
        Some("jsx") => SourceType::jsx(),
        _ => SourceType::mjs(),
    }
}

fn strip_types(path: &Path, source: &str, source_type: SourceType) -> anyhow::Result<String> {
    let allocator = Allocator::default();
    let mut program = js::parse(&allocator, source, source_type).map_err(anyhow::Error::msg)?;

    let scoping = SemanticBuilder::new().build(&program).semantic.into_scoping();
    let mut options = TransformOptions::default();
    options.assumptions.set_public_class_fields = true;
    options.typescript.remove_class_fields_without_initializer = true;
    let ret = Transformer::new(&allocator, path, &options).build_with_scoping(scoping, &mut program);
    if !ret.errors.is_empty() {
        let messages: Vec<String> = ret.errors.iter().map(|e| e.to_string()).collect();
        bail!("TypeScript transform failed: {}", messages.join("; "));
    }

    Ok(Codegen::new().build(&program).code)
}

impl Transform for ScriptTransform {
    fn name(&self) -> &'static str {
        "script"
    }

    fn transform(&self, path: &Path, source: &str) -> anyhow::Result<TransformOutput> {
        let source_type = source_type_for(path);
        let code = if source_type.is_typescript() {
            strip_types(path, source, source_type)?
        } else {
            source.to_string()
        };

        let code = if self.defines.is_empty() {
            let allocator = Allocator::default();
            js::parse(&allocator, &code, SourceType::mjs()).map_err(anyhow::Error::msg)?;
            code
        } else {
            self.defines
                .apply(&code, SourceType::mjs())
                .map_err(anyhow::Error::msg)
                .context("failed to substitute build-time constants")?
        };

        Ok(TransformOutput::code(code))
    }
}

use std::path::Path;

use oxc_allocator::Allocator;
use oxc_codegen::Codegen;
use oxc_semantic::SemanticBuilder;
use oxc_span::SourceType;
use oxc_transformer::{HelperLoaderMode, TransformOptions, Transformer};
use wpack_config::EsTarget;

use super::helpers;
use crate::error::{BuildError, Result};
use crate::js;

/// Transform options for `target` that never emit helper imports.
///
/// Public class fields become plain assignments and fields without an
/// initializer are dropped. Remaining helpers are called through the
/// `babelHelpers` object that [`helpers::link`] defines.
pub(crate) fn options_for(target: EsTarget) -> std::result::Result<TransformOptions, String> {
    let mut options = TransformOptions::from_target(target.as_str())?;
    options.assumptions.set_public_class_fields = true;
    options.typescript.remove_class_fields_without_initializer = true;
    options.helper_loader.mode = HelperLoaderMode::External;
    Ok(options)
}

/// Rewrite syntax newer than `target`.
///
/// Code that needs no rewriting is returned as is.
pub(crate) fn lower(code: &str, target: EsTarget) -> Result<String> {
    if target == EsTarget::ESNext {
        return Ok(code.to_string());
    }
    let fail = |message: String| BuildError::Lowering {
        target: target.to_string(),
        message,
    };

    let allocator = Allocator::default();
    let mut program =
        js::parse(&allocator, code, SourceType::mjs()).map_err(|message| BuildError::Parse {
            origin: "lowering".to_string(),
            message,
        })?;
    let before = Codegen::new().build(&program).code;

    let options = options_for(target).map_err(fail)?;
    let scoping = SemanticBuilder::new().build(&program).semantic.into_scoping();
    let ret = Transformer::new(&allocator, Path::new("widget.js"), &options)
        .build_with_scoping(scoping, &mut program);
    if !ret.errors.is_empty() {
        let messages: Vec<String> = ret.errors.iter().map(|e| e.to_string()).collect();
        return Err(fail(messages.join("; ")));
    }

    let after = Codegen::new().build(&program).code;
    if after == before {
        return Ok(code.to_string());
    }
    helpers::link(&after)
        .map_err(|helper| fail(format!("no runtime definition for helper '{helper}'")))
}

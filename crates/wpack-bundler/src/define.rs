//! Build-time constant substitution.
//!
//! A [`DefineMap`] is built once per build from the configuration and
//! threaded through the transform stage by reference; substitution never
//! touches process-wide state.

use std::sync::LazyLock;

use indexmap::IndexMap;
use oxc_allocator::Allocator;
use oxc_ast::ast::Expression;
use oxc_ast_visit::{Visit, walk};
use oxc_semantic::{Scoping, SemanticBuilder};
use oxc_span::{GetSpan, SourceType};
use regex::Regex;

use crate::edits::SourceEdits;
use crate::js::{self, Shorthands};

static SIMPLE_VALUE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"^(?:[A-Za-z_$][A-Za-z0-9_$]*(?:\.[A-Za-z_$][A-Za-z0-9_$]*)*|-?\d+(?:\.\d+)?|"(?:[^"\\]|\\.)*"|'(?:[^'\\]|\\.)*')$"#,
    )
    .expect("valid define value regex")
});

/// Immutable table of `identifier or member path -> replacement code`.
#[derive(Debug, Clone, Default)]
pub struct DefineMap {
    entries: IndexMap<String, String>,
}

impl DefineMap {
    pub fn new(entries: IndexMap<String, String>) -> Self {
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Replace every free occurrence of a defined name in `source`.
    ///
    /// Locally bound names shadow defines, and a member path only matches
    /// when its root identifier is free.
    pub fn apply(&self, source: &str, source_type: SourceType) -> Result<String, String> {
        if self.entries.is_empty() {
            return Ok(source.to_string());
        }

        let allocator = Allocator::default();
        let program = js::parse(&allocator, source, source_type)?;
        let semantic = SemanticBuilder::new().build(&program).semantic;
        let shorthands = Shorthands::collect(&program);

        let mut substitutor = Substitutor {
            defines: self,
            scoping: semantic.scoping(),
            shorthands: &shorthands,
            edits: SourceEdits::new(source),
        };
        substitutor.visit_program(&program);

        Ok(substitutor.edits.apply())
    }

    fn replacement(&self, key: &str) -> Option<String> {
        let value = self.entries.get(key)?;
        Some(if SIMPLE_VALUE.is_match(value) {
            value.clone()
        } else {
            format!("({value})")
        })
    }
}

struct Substitutor<'d, 's> {
    defines: &'d DefineMap,
    scoping: &'d Scoping,
    shorthands: &'d Shorthands,
    edits: SourceEdits<'s>,
}

impl Substitutor<'_, '_> {
    fn is_free(&self, ident: &oxc_ast::ast::IdentifierReference<'_>) -> bool {
        self.scoping
            .get_reference(ident.reference_id())
            .symbol_id()
            .is_none()
    }
}

impl<'a> Visit<'a> for Substitutor<'_, '_> {
    fn visit_expression(&mut self, expr: &Expression<'a>) {
        let matched = js::member_path(expr)
            .filter(|(_, root)| self.is_free(root))
            .and_then(|(path, _)| Some((self.defines.replacement(&path)?, path)));

        match matched {
            Some((replacement, path)) => {
                let span = expr.span();
                let shorthand = self.shorthands.contains(span.start);
                self.edits.replace(
                    span.start,
                    span.end,
                    js::rename_text(&path, &replacement, shorthand),
                );
            }
            None => walk::walk_expression(self, expr),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defines() -> DefineMap {
        let mut entries = IndexMap::new();
        entries.insert("__XCON_DEV__".to_string(), "false".to_string());
        entries.insert("__XCON_VERSION__".to_string(), "\"1.0.0\"".to_string());
        entries.insert("process.env.NODE_ENV".to_string(), "\"production\"".to_string());
        entries.insert("global".to_string(), "globalThis".to_string());
        entries.insert("__BUILD__".to_string(), "1 + 1".to_string());
        DefineMap::new(entries)
    }

    fn apply(source: &str) -> String {
        defines().apply(source, SourceType::mjs()).unwrap()
    }

    #[test]
    fn substitutes_free_identifiers_and_paths() {
        assert_eq!(
            apply("if (__XCON_DEV__) log(__XCON_VERSION__, process.env.NODE_ENV);"),
            "if (false) log(\"1.0.0\", \"production\");"
        );
    }

    #[test]
    fn shadowed_names_are_kept() {
        assert_eq!(
            apply("function f(__XCON_DEV__) { return __XCON_DEV__; }"),
            "function f(__XCON_DEV__) { return __XCON_DEV__; }"
        );
        assert_eq!(
            apply("const process = {}; process.env.NODE_ENV;"),
            "const process = {}; process.env.NODE_ENV;"
        );
    }

    #[test]
    fn shorthand_and_complex_values() {
        assert_eq!(apply("x = { __XCON_DEV__ };"), "x = { __XCON_DEV__: false };");
        assert_eq!(apply("y = __BUILD__ * 2;"), "y = (1 + 1) * 2;");
        assert_eq!(apply("global.foo = 1;"), "globalThis.foo = 1;");
    }

    #[test]
    fn partial_paths_do_not_match() {
        assert_eq!(apply("process.env.OTHER;"), "process.env.OTHER;");
    }
}

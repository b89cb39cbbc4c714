//! Import discovery for a transformed module.

use oxc_allocator::Allocator;
use oxc_ast::ast::{Expression, ImportExpression, ModuleDeclaration, Program};
use oxc_ast_visit::{Visit, walk};
use oxc_span::SourceType;

use crate::js;

/// A specifier a module depends on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Dependency {
    pub specifier: String,
    pub dynamic: bool,
}

#[derive(Debug)]
pub(crate) enum ScanError {
    Parse(String),
    /// `import()` with a computed specifier at the given source text.
    ComputedDynamicImport(String),
}

/// The specifier of `import(...)` when it is known at build time.
pub(crate) fn static_specifier(expr: &Expression<'_>) -> Option<String> {
    match expr {
        Expression::StringLiteral(lit) => Some(lit.value.to_string()),
        Expression::TemplateLiteral(template) if template.expressions.is_empty() => template
            .quasis
            .first()
            .and_then(|quasi| quasi.value.cooked.as_ref())
            .map(|cooked| cooked.to_string()),
        Expression::ParenthesizedExpression(paren) => static_specifier(&paren.expression),
        _ => None,
    }
}

/// Every dependency of `code` in source order, static and dynamic.
pub(crate) fn scan_dependencies(code: &str) -> Result<Vec<Dependency>, ScanError> {
    let allocator = Allocator::default();
    let program = js::parse(&allocator, code, SourceType::mjs()).map_err(ScanError::Parse)?;

    let mut collector = Collector {
        code,
        dependencies: Vec::new(),
        computed: None,
    };
    collector.visit_program(&program);

    match collector.computed {
        Some(text) => Err(ScanError::ComputedDynamicImport(text)),
        None => Ok(collector.dependencies),
    }
}

struct Collector<'s> {
    code: &'s str,
    dependencies: Vec<Dependency>,
    computed: Option<String>,
}

impl Collector<'_> {
    fn push(&mut self, specifier: &str, dynamic: bool) {
        self.dependencies.push(Dependency {
            specifier: specifier.to_string(),
            dynamic,
        });
    }
}

impl<'a> Visit<'a> for Collector<'_> {
    fn visit_program(&mut self, program: &Program<'a>) {
        for stmt in &program.body {
            if let Some(decl) = stmt.as_module_declaration() {
                match decl {
                    ModuleDeclaration::ImportDeclaration(import) => {
                        if !import.import_kind.is_type() {
                            self.push(&import.source.value, false);
                        }
                    }
                    ModuleDeclaration::ExportNamedDeclaration(export) => {
                        if let Some(source) = &export.source {
                            self.push(&source.value, false);
                        }
                    }
                    ModuleDeclaration::ExportAllDeclaration(export) => {
                        self.push(&export.source.value, false);
                    }
                    _ => {}
                }
            }
        }
        walk::walk_program(self, program);
    }

    fn visit_import_expression(&mut self, expr: &ImportExpression<'a>) {
        match static_specifier(&expr.source) {
            Some(specifier) => self.push(&specifier, true),
            None => {
                if self.computed.is_none() {
                    let span = expr.span;
                    self.computed =
                        Some(self.code[span.start as usize..span.end as usize].to_string());
                }
            }
        }
        walk::walk_import_expression(self, expr);
    }
}

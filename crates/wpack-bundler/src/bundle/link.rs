//! Rewrites one ES module into a function registered with the runtime.
//!
//! Import declarations disappear; every reference to an imported binding is
//! rewritten in place to read the dependency's exports object, the external
//! global or the asset URL. Export declarations lose their `export` keyword
//! and are published through getters, so bindings stay live across modules.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use indexmap::{IndexMap, IndexSet};
use oxc_allocator::Allocator;
use oxc_ast::ast::{
    CallExpression, Declaration, ExportAllDeclaration, ExportDefaultDeclaration,
    ExportDefaultDeclarationKind, ExportNamedDeclaration, IdentifierReference, ImportDeclaration,
    ImportDeclarationSpecifier, ImportExpression, ModuleExportName, Statement,
};
use oxc_ast_visit::{Visit, walk};
use oxc_semantic::{Scoping, SemanticBuilder, SymbolId};
use oxc_span::{GetSpan, SourceType};
use rustc_hash::{FxHashMap, FxHashSet};

use super::runtime::{self, DEFAULT_LOCAL, EXPORTS};
use super::scan::static_specifier;
use super::{LinkTarget, ModuleId};
use crate::edits::SourceEdits;
use crate::error::{BuildError, Result};
use crate::js::{self, Shorthands};

/// Names a module publishes.
#[derive(Debug, Clone, Default)]
pub(crate) struct ExportNames {
    pub names: FxHashSet<String>,
    /// Modules re-exported with `export *`.
    pub stars: Vec<ModuleId>,
    /// Re-exports an external, so any name may exist at runtime.
    pub open: bool,
}

#[derive(Debug)]
pub(crate) struct LinkedModule {
    pub code: String,
    pub uses_reexport: bool,
    pub exports: ExportNames,
    /// Named bindings this module reads from internal dependencies.
    pub imported: Vec<(String, ModuleId)>,
}

/// One graph module ready to link.
pub(crate) struct LinkInput<'m> {
    pub id: ModuleId,
    /// Shown in the comment heading the module.
    pub label: &'m str,
    pub path: &'m Path,
    pub code: &'m str,
    pub targets: &'m IndexMap<String, LinkTarget>,
}

pub(crate) fn link_module(input: &LinkInput<'_>) -> Result<LinkedModule> {
    let allocator = Allocator::default();
    let program = js::parse(&allocator, input.code, SourceType::mjs())
        .map_err(|message| BuildError::transform(input.path, anyhow::anyhow!(message)))?;
    let scoping = SemanticBuilder::new().build(&program).semantic.into_scoping();
    let shorthands = Shorthands::collect(&program);

    let mut linker = Linker {
        path: input.path,
        targets: input.targets,
        scoping: &scoping,
        shorthands: &shorthands,
        edits: SourceEdits::new(input.code),
        requires: IndexSet::new(),
        bindings: FxHashMap::default(),
        callees: FxHashSet::default(),
        getters: Vec::new(),
        reexports: Vec::new(),
        exports: ExportNames::default(),
        imported: Vec::new(),
        error: None,
    };

    // Dependencies execute in the order their first request appears.
    for stmt in &program.body {
        if let Some(source) = request_source(stmt) {
            if let LinkTarget::Module(id) = linker.target(source)? {
                linker.requires.insert(*id);
            }
        }
    }
    for stmt in &program.body {
        if let Statement::ImportDeclaration(import) = stmt {
            linker.import(import)?;
        }
    }
    for stmt in &program.body {
        match stmt {
            Statement::ExportNamedDeclaration(export) => linker.export_named(export)?,
            Statement::ExportDefaultDeclaration(export) => linker.export_default(export),
            Statement::ExportAllDeclaration(export) => linker.export_all(export)?,
            _ => {}
        }
    }

    linker.visit_program(&program);
    if let Some(err) = linker.error.take() {
        return Err(err);
    }

    Ok(linker.finish(input.id, input.label))
}

fn request_source<'s>(stmt: &'s Statement<'_>) -> Option<&'s str> {
    match stmt {
        Statement::ImportDeclaration(import) if !import.import_kind.is_type() => {
            Some(import.source.value.as_str())
        }
        Statement::ExportNamedDeclaration(export) if !export.export_kind.is_type() => {
            export.source.as_ref().map(|source| source.value.as_str())
        }
        Statement::ExportAllDeclaration(export) if !export.export_kind.is_type() => {
            Some(export.source.value.as_str())
        }
        _ => None,
    }
}

fn export_name(name: &ModuleExportName<'_>) -> String {
    match name {
        ModuleExportName::IdentifierName(ident) => ident.name.to_string(),
        ModuleExportName::IdentifierReference(ident) => ident.name.to_string(),
        ModuleExportName::StringLiteral(lit) => lit.value.to_string(),
    }
}

fn declaration_names(decl: &Declaration<'_>) -> Vec<String> {
    let mut names = Vec::new();
    match decl {
        Declaration::VariableDeclaration(var) => {
            for declarator in &var.declarations {
                js::pattern_names(&declarator.id, &mut names);
            }
        }
        Declaration::FunctionDeclaration(func) => {
            names.extend(func.id.as_ref().map(|id| id.name.to_string()));
        }
        Declaration::ClassDeclaration(class) => {
            names.extend(class.id.as_ref().map(|id| id.name.to_string()));
        }
        _ => {}
    }
    names
}

struct Linker<'m, 's> {
    path: &'m Path,
    targets: &'m IndexMap<String, LinkTarget>,
    scoping: &'m Scoping,
    shorthands: &'m Shorthands,
    edits: SourceEdits<'s>,
    requires: IndexSet<ModuleId>,
    /// Import binding -> expression that reads it.
    bindings: FxHashMap<SymbolId, String>,
    callees: FxHashSet<u32>,
    getters: Vec<(String, String)>,
    reexports: Vec<String>,
    exports: ExportNames,
    imported: Vec<(String, ModuleId)>,
    error: Option<BuildError>,
}

impl<'m> Linker<'m, '_> {
    fn target(&self, specifier: &str) -> Result<&'m LinkTarget> {
        self.targets
            .get(specifier)
            .ok_or_else(|| BuildError::Resolution {
                specifier: specifier.to_string(),
                importer: self.path.to_path_buf(),
                reason: "specifier was not resolved during graph discovery".to_string(),
            })
    }

    fn fail(&mut self, err: BuildError) {
        if self.error.is_none() {
            self.error = Some(err);
        }
    }

    /// Expression reading export `name` of `target`.
    fn member(&mut self, target: &LinkTarget, name: &str, specifier: &str) -> Result<String> {
        match target {
            LinkTarget::Module(id) => {
                self.imported.push((name.to_string(), *id));
                Ok(js::property_access(&runtime::module_var(*id), name))
            }
            LinkTarget::External(global) if name == "default" => Ok(global.clone()),
            LinkTarget::External(global) => Ok(js::property_access(global, name)),
            LinkTarget::Asset(url) if name == "default" => Ok(js::json_string(url)),
            LinkTarget::Asset(_) => Err(BuildError::MissingExport {
                name: name.to_string(),
                module: PathBuf::from(specifier),
            }),
        }
    }

    fn namespace(target: &LinkTarget) -> String {
        match target {
            LinkTarget::Module(id) => runtime::module_var(*id),
            LinkTarget::External(global) => global.clone(),
            LinkTarget::Asset(url) => format!("({{ \"default\": {} }})", js::json_string(url)),
        }
    }

    fn export(&mut self, name: String, expr: String) {
        self.exports.names.insert(name.clone());
        self.getters.push((name, expr));
    }

    fn import(&mut self, import: &ImportDeclaration<'_>) -> Result<()> {
        self.edits.remove(import.span.start, import.span.end);
        if import.import_kind.is_type() {
            return Ok(());
        }

        let specifier = import.source.value.as_str();
        let target = self.target(specifier)?;
        for spec in import.specifiers.iter().flatten() {
            let (local, replacement) = match spec {
                ImportDeclarationSpecifier::ImportDefaultSpecifier(spec) => {
                    (&spec.local, self.member(target, "default", specifier)?)
                }
                ImportDeclarationSpecifier::ImportNamespaceSpecifier(spec) => {
                    (&spec.local, Self::namespace(target))
                }
                ImportDeclarationSpecifier::ImportSpecifier(spec) => {
                    if spec.import_kind.is_type() {
                        continue;
                    }
                    let name = export_name(&spec.imported);
                    (&spec.local, self.member(target, &name, specifier)?)
                }
            };
            self.bindings.insert(local.symbol_id(), replacement);
        }
        Ok(())
    }

    fn export_named(&mut self, export: &ExportNamedDeclaration<'_>) -> Result<()> {
        if export.export_kind.is_type() {
            self.edits.remove(export.span.start, export.span.end);
            return Ok(());
        }

        if let Some(decl) = &export.declaration {
            self.edits.remove(export.span.start, decl.span().start);
            for name in declaration_names(decl) {
                self.export(name.clone(), name);
            }
            return Ok(());
        }

        self.edits.remove(export.span.start, export.span.end);
        match &export.source {
            Some(source) => {
                let target = self.target(&source.value)?;
                for spec in &export.specifiers {
                    if spec.export_kind.is_type() {
                        continue;
                    }
                    let expr = self.member(target, &export_name(&spec.local), &source.value)?;
                    self.export(export_name(&spec.exported), expr);
                }
            }
            None => {
                for spec in &export.specifiers {
                    if spec.export_kind.is_type() {
                        continue;
                    }
                    let expr = match &spec.local {
                        ModuleExportName::IdentifierReference(ident) => self
                            .binding_of(ident)
                            .cloned()
                            .unwrap_or_else(|| ident.name.to_string()),
                        other => export_name(other),
                    };
                    self.export(export_name(&spec.exported), expr);
                }
            }
        }
        Ok(())
    }

    fn export_default(&mut self, export: &ExportDefaultDeclaration<'_>) {
        let named = match &export.declaration {
            ExportDefaultDeclarationKind::FunctionDeclaration(func) => {
                func.id.as_ref().map(|id| id.name.to_string())
            }
            ExportDefaultDeclarationKind::ClassDeclaration(class) => {
                class.id.as_ref().map(|id| id.name.to_string())
            }
            ExportDefaultDeclarationKind::TSInterfaceDeclaration(_) => {
                self.edits.remove(export.span.start, export.span.end);
                return;
            }
            _ => None,
        };

        let decl_start = export.declaration.span().start;
        match named {
            Some(name) => {
                self.edits.remove(export.span.start, decl_start);
                self.export("default".to_string(), name);
            }
            None => {
                self.edits.replace(
                    export.span.start,
                    decl_start,
                    format!("var {DEFAULT_LOCAL} = "),
                );
                let text = self.edits.slice(export.span.start, export.span.end);
                if !text.trim_end().ends_with(';') {
                    self.edits.insert(export.span.end, ";");
                }
                self.export("default".to_string(), DEFAULT_LOCAL.to_string());
            }
        }
    }

    fn export_all(&mut self, export: &ExportAllDeclaration<'_>) -> Result<()> {
        self.edits.remove(export.span.start, export.span.end);
        if export.export_kind.is_type() {
            return Ok(());
        }

        let target = self.target(&export.source.value)?;
        match (&export.exported, target) {
            (Some(name), _) => self.export(export_name(name), Self::namespace(target)),
            (None, LinkTarget::Module(id)) => {
                self.exports.stars.push(*id);
                self.reexports.push(runtime::module_var(*id));
            }
            (None, LinkTarget::External(global)) => {
                self.exports.open = true;
                self.reexports.push(global.clone());
            }
            (None, LinkTarget::Asset(_)) => {}
        }
        Ok(())
    }

    fn binding_of(&self, ident: &IdentifierReference<'_>) -> Option<&String> {
        self.scoping
            .get_reference(ident.reference_id())
            .symbol_id()
            .and_then(|symbol| self.bindings.get(&symbol))
    }

    fn finish(self, id: ModuleId, label: &str) -> LinkedModule {
        let mut out = String::new();
        let _ = writeln!(out, "// {label}");
        let _ = writeln!(out, "__wp_modules[{id}] = function ({EXPORTS}) {{");

        if !self.getters.is_empty() {
            let _ = writeln!(out, "__wp_export({EXPORTS}, {{");
            let last = self.getters.len() - 1;
            for (i, (name, expr)) in self.getters.iter().enumerate() {
                let comma = if i == last { "" } else { "," };
                let _ = writeln!(
                    out,
                    "\t{}: function () {{ return {expr}; }}{comma}",
                    js::json_string(name)
                );
            }
            out.push_str("});\n");
        }
        for dep in &self.requires {
            let _ = writeln!(
                out,
                "var {} = {};",
                runtime::module_var(*dep),
                runtime::require_call(*dep)
            );
        }
        for source in &self.reexports {
            let _ = writeln!(out, "__wp_reexport({EXPORTS}, {source});");
        }

        let body = self.edits.apply();
        out.push_str(&body);
        if !body.ends_with('\n') {
            out.push('\n');
        }
        out.push_str("};\n");

        LinkedModule {
            code: out,
            uses_reexport: !self.reexports.is_empty(),
            exports: self.exports,
            imported: self.imported,
        }
    }
}

impl<'a> Visit<'a> for Linker<'_, '_> {
    fn visit_call_expression(&mut self, call: &CallExpression<'a>) {
        if let oxc_ast::ast::Expression::Identifier(ident) = &call.callee {
            self.callees.insert(ident.span.start);
        }
        walk::walk_call_expression(self, call);
    }

    fn visit_identifier_reference(&mut self, ident: &IdentifierReference<'a>) {
        let Some(replacement) = self.binding_of(ident).cloned() else {
            return;
        };
        // Imported functions are called without a receiver.
        let text = if self.callees.contains(&ident.span.start) && !js::is_identifier_name(&replacement)
        {
            format!("(0, {replacement})")
        } else {
            replacement
        };
        let shorthand = self.shorthands.contains(ident.span.start);
        self.edits.replace(
            ident.span.start,
            ident.span.end,
            js::rename_text(&ident.name, &text, shorthand),
        );
    }

    fn visit_import_expression(&mut self, expr: &ImportExpression<'a>) {
        let Some(specifier) = static_specifier(&expr.source) else {
            let text = self.edits.slice(expr.span.start, expr.span.end).to_string();
            self.fail(BuildError::multi_chunk(format!(
                "{text} in {} has a computed specifier and cannot be inlined",
                self.path.display()
            )));
            return;
        };

        let replacement = match self.target(&specifier) {
            Ok(LinkTarget::Module(id)) => runtime::lazy_require(*id),
            Ok(target) => format!("Promise.resolve({})", Self::namespace(target)),
            Err(err) => {
                self.fail(err);
                return;
            }
        };
        self.edits
            .replace(expr.span.start, expr.span.end, replacement);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn targets() -> IndexMap<String, LinkTarget> {
        let mut targets = IndexMap::new();
        targets.insert("./a".to_string(), LinkTarget::Module(1));
        targets.insert("./b".to_string(), LinkTarget::Module(2));
        targets.insert("jquery".to_string(), LinkTarget::External("jQuery".to_string()));
        targets.insert(
            "./logo.png".to_string(),
            LinkTarget::Asset("/assets/logo.png".to_string()),
        );
        targets
    }

    fn link(code: &str) -> Result<LinkedModule> {
        let targets = targets();
        link_module(&LinkInput {
            id: 0,
            label: "src/index.js",
            path: Path::new("src/index.js"),
            code,
            targets: &targets,
        })
    }

    #[test]
    fn externals_read_the_global() {
        let linked = link("import $ from 'jquery';\n$(x);\n").unwrap();
        assert_eq!(
            linked.code,
            "// src/index.js\n__wp_modules[0] = function (__wp_exports) {\n\njQuery(x);\n};\n"
        );
    }

    #[test]
    fn internal_imports_and_exports() {
        let linked = link(
            "import { greet } from './a';\nimport * as b from './b';\nexport const x = greet(b.y);\nexport default function main() {}\n",
        )
        .unwrap();
        assert_eq!(
            linked.code,
            "// src/index.js\n\
             __wp_modules[0] = function (__wp_exports) {\n\
             __wp_export(__wp_exports, {\n\
             \t\"x\": function () { return x; },\n\
             \t\"default\": function () { return main; }\n\
             });\n\
             var __wp_m1 = __wp_require(1);\n\
             var __wp_m2 = __wp_require(2);\n\
             \n\
             \n\
             const x = (0, __wp_m1.greet)(__wp_m2.y);\n\
             function main() {}\n\
             };\n"
        );
        assert_eq!(linked.imported, vec![("greet".to_string(), 1)]);
        assert!(linked.exports.names.contains("default"));
    }

    #[test]
    fn default_expression_gets_a_local() {
        let linked = link("export default 1 + 2\n").unwrap();
        assert!(linked.code.contains("var __wp_default = 1 + 2;"));
        assert!(linked.code.contains("\"default\": function () { return __wp_default; }"));
    }

    #[test]
    fn shorthand_import_references() {
        let linked = link("import { greet } from './a';\nconst o = { greet };\n").unwrap();
        assert!(linked.code.contains("const o = { greet: __wp_m1.greet };"));
    }

    #[test]
    fn reexports() {
        let linked = link("export * from './a';\nexport { c as d } from './b';\nexport * as q from 'jquery';\n")
            .unwrap();
        assert!(linked.uses_reexport);
        assert_eq!(linked.exports.stars, vec![1]);
        assert!(linked.code.contains("\"d\": function () { return __wp_m2.c; }"));
        assert!(linked.code.contains("\"q\": function () { return jQuery; }"));
        assert!(linked.code.contains("__wp_reexport(__wp_exports, __wp_m1);"));
    }

    #[test]
    fn local_export_of_an_import() {
        let linked = link("import $ from 'jquery';\nexport { $ as jq };\n").unwrap();
        assert!(linked.code.contains("\"jq\": function () { return jQuery; }"));
    }

    #[test]
    fn dynamic_imports_are_inlined() {
        let linked = link("const m = import('./b');\nconst j = import('jquery');\n").unwrap();
        assert!(linked.code.contains(
            "const m = Promise.resolve().then(function () { return __wp_require(2); });"
        ));
        assert!(linked.code.contains("const j = Promise.resolve(jQuery);"));
        // lazily required, not eagerly
        assert!(!linked.code.contains("var __wp_m2"));
    }

    #[test]
    fn assets_become_urls() {
        let linked = link("import logo from './logo.png';\nimg.src = logo;\n").unwrap();
        assert!(linked.code.contains("img.src = \"/assets/logo.png\";"));

        let err = link("import { nope } from './logo.png';\n").unwrap_err();
        assert!(matches!(err, BuildError::MissingExport { name, .. } if name == "nope"));
    }

    #[test]
    fn computed_dynamic_import_is_rejected() {
        let err = link("import(name);\n").unwrap_err();
        assert!(matches!(err, BuildError::MultiChunkViolation { .. }));
    }

    #[test]
    fn shadowed_import_names_are_untouched() {
        let linked = link("import $ from 'jquery';\nfunction f($) { return $; }\n").unwrap();
        assert!(linked.code.contains("function f($) { return $; }"));
    }
}

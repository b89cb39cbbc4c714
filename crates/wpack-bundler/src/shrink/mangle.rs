//! Identifier renaming.
//!
//! Every symbol below the program scope gets a short name that appears
//! nowhere in the source, so a rename can never capture or shadow another
//! binding. Symbols declared at the program scope are externally visible and
//! keep their names, as does every name on the [`PublicSurface`].

use std::cmp::Reverse;

use oxc_allocator::Allocator;
use oxc_ast::ast::{BindingIdentifier, CallExpression, Expression, IdentifierReference, WithStatement};
use oxc_ast_visit::{Visit, walk};
use oxc_semantic::{Scoping, SemanticBuilder, SymbolId};
use oxc_span::SourceType;
use rustc_hash::{FxHashMap, FxHashSet};

use super::PublicSurface;
use crate::edits::SourceEdits;
use crate::error::{BuildError, Result};
use crate::js::{self, Shorthands};

const FIRST_CHARS: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ_$";

const KEYWORDS: &[&str] = &[
    "as", "do", "if", "in", "is", "of", "for", "get", "let", "new", "set", "try", "var", "case",
    "else", "enum", "eval", "null", "this", "true", "void", "with", "async", "await", "break",
    "catch", "class", "const", "false", "super", "throw", "while", "yield", "delete", "export",
    "import", "public", "return", "static", "switch", "typeof", "default", "extends", "finally",
    "package", "private", "continue", "debugger", "function", "arguments", "interface",
    "protected", "implements", "instanceof", "undefined", "NaN", "Infinity",
];

/// Short names in a fixed order: `a`..`$`, then `a0`..`$0`, `a1`, ...
struct NameGenerator<'s> {
    next: usize,
    taken: &'s FxHashSet<&'s str>,
}

impl NameGenerator<'_> {
    fn candidate(index: usize) -> String {
        let first = FIRST_CHARS[index % FIRST_CHARS.len()] as char;
        match index / FIRST_CHARS.len() {
            0 => first.to_string(),
            round => format!("{first}{}", round - 1),
        }
    }

    /// The next free name, without consuming it.
    fn peek(&mut self, surface: &PublicSurface) -> String {
        loop {
            let name = Self::candidate(self.next);
            if !self.taken.contains(name.as_str())
                && !surface.contains(&name)
                && !KEYWORDS.contains(&name.as_str())
            {
                return name;
            }
            self.next += 1;
        }
    }

    fn advance(&mut self) {
        self.next += 1;
    }
}

/// Rename every eligible local symbol in `code`.
pub(crate) fn mangle(code: &str, surface: &PublicSurface) -> Result<String> {
    let allocator = Allocator::default();
    let program =
        js::parse(&allocator, code, SourceType::mjs()).map_err(|message| BuildError::Parse {
            origin: "renaming".to_string(),
            message,
        })?;
    let semantic = SemanticBuilder::new().build(&program).semantic;
    let scoping = semantic.scoping();

    let mut dynamic = DynamicScopeFinder {
        scoping,
        found: false,
    };
    dynamic.visit_program(&program);
    if dynamic.found {
        tracing::warn!("direct eval or with statement found, identifier renaming skipped");
        return Ok(code.to_string());
    }

    let root = scoping.root_scope_id();
    let mut candidates: Vec<(SymbolId, usize, u32)> = scoping
        .symbol_ids()
        .filter(|symbol| scoping.symbol_scope_id(*symbol) != root)
        .filter(|symbol| !surface.contains(scoping.symbol_name(*symbol)))
        .map(|symbol| {
            (
                symbol,
                scoping.get_resolved_reference_ids(symbol).len(),
                scoping.symbol_span(symbol).start,
            )
        })
        .collect();
    candidates.sort_by_key(|(_, references, start)| (Reverse(*references), *start));

    let taken: FxHashSet<&str> = js::identifier_tokens(code).collect();
    let mut names = NameGenerator {
        next: 0,
        taken: &taken,
    };
    let mut renames: FxHashMap<SymbolId, String> = FxHashMap::default();
    let mut assigned: FxHashSet<String> = FxHashSet::default();

    for (symbol, _, _) in candidates {
        let original = scoping.symbol_name(symbol);
        let fresh = names.peek(surface);
        if fresh.len() >= original.len() {
            continue;
        }
        surface.check_rename(original, &fresh)?;
        if !assigned.insert(fresh.clone()) {
            return Err(BuildError::shrink_invariant(format!(
                "synthetic name '{fresh}' was assigned twice"
            )));
        }
        names.advance();
        renames.insert(symbol, fresh);
    }

    if renames.is_empty() {
        return Ok(code.to_string());
    }

    let before = surface.snapshot(code);
    let shorthands = Shorthands::collect(&program);
    let mut renamer = Renamer {
        scoping,
        renames: &renames,
        shorthands: &shorthands,
        edits: SourceEdits::new(code),
    };
    renamer.visit_program(&program);
    let renamed = renamer.edits.apply();

    if surface.snapshot(&renamed) != before {
        return Err(BuildError::shrink_invariant(
            "renaming changed the occurrences of a reserved name",
        ));
    }
    let check = Allocator::default();
    if let Err(message) = js::parse(&check, &renamed, SourceType::mjs()) {
        return Err(BuildError::shrink_invariant(format!(
            "renamed output no longer parses: {message}"
        )));
    }

    tracing::debug!(renamed = renames.len(), "renamed local identifiers");
    Ok(renamed)
}

struct DynamicScopeFinder<'s> {
    scoping: &'s Scoping,
    found: bool,
}

impl<'a> Visit<'a> for DynamicScopeFinder<'_> {
    fn visit_call_expression(&mut self, call: &CallExpression<'a>) {
        if let Expression::Identifier(ident) = &call.callee {
            if ident.name == "eval"
                && self
                    .scoping
                    .get_reference(ident.reference_id())
                    .symbol_id()
                    .is_none()
            {
                self.found = true;
            }
        }
        walk::walk_call_expression(self, call);
    }

    fn visit_with_statement(&mut self, stmt: &WithStatement<'a>) {
        self.found = true;
        walk::walk_with_statement(self, stmt);
    }
}

struct Renamer<'r, 's> {
    scoping: &'r Scoping,
    renames: &'r FxHashMap<SymbolId, String>,
    shorthands: &'r Shorthands,
    edits: SourceEdits<'s>,
}

impl Renamer<'_, '_> {
    fn rename(&mut self, symbol: Option<SymbolId>, start: u32, end: u32, original: &str) {
        let renames = self.renames;
        let Some(fresh) = symbol.and_then(|symbol| renames.get(&symbol)) else {
            return;
        };
        let text = js::rename_text(original, fresh, self.shorthands.contains(start));
        self.edits.replace(start, end, text);
    }
}

impl<'a> Visit<'a> for Renamer<'_, '_> {
    fn visit_binding_identifier(&mut self, ident: &BindingIdentifier<'a>) {
        self.rename(ident.symbol_id.get(), ident.span.start, ident.span.end, &ident.name);
    }

    fn visit_identifier_reference(&mut self, ident: &IdentifierReference<'a>) {
        let symbol = self.scoping.get_reference(ident.reference_id()).symbol_id();
        self.rename(symbol, ident.span.start, ident.span.end, &ident.name);
    }
}

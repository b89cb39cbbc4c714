//! Shared helpers for working with parsed JavaScript.

use std::sync::LazyLock;

use oxc_allocator::Allocator;
use oxc_ast::ast::{
    AssignmentTargetPropertyIdentifier, BindingPattern, BindingPatternKind, BindingProperty,
    Expression, IdentifierReference, ObjectProperty, Program,
};
use oxc_ast_visit::{Visit, walk};
use oxc_parser::{Parser, ParserReturn};
use oxc_span::{GetSpan, SourceType};
use regex::Regex;
use rustc_hash::FxHashSet;

static IDENTIFIER_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z_$][A-Za-z0-9_$]*").expect("valid token regex"));

/// Parse `source`, folding every parser diagnostic into one message.
pub(crate) fn parse<'a>(
    allocator: &'a Allocator,
    source: &'a str,
    source_type: SourceType,
) -> Result<Program<'a>, String> {
    let ParserReturn {
        program, errors, ..
    } = Parser::new(allocator, source, source_type).parse();

    if errors.is_empty() {
        Ok(program)
    } else {
        Err(errors
            .iter()
            .map(|e| format!("{:?}", e))
            .collect::<Vec<_>>()
            .join("; "))
    }
}

/// `a.b.c` for a chain of static member accesses rooted at an identifier.
pub(crate) fn member_path<'e, 'a>(
    expr: &'e Expression<'a>,
) -> Option<(String, &'e IdentifierReference<'a>)> {
    match expr {
        Expression::Identifier(ident) => Some((ident.name.to_string(), ident)),
        Expression::StaticMemberExpression(member) if !member.optional => {
            let (mut path, root) = member_path(&member.object)?;
            path.push('.');
            path.push_str(&member.property.name);
            Some((path, root))
        }
        _ => None,
    }
}

/// Every identifier-shaped token in `source`, strings and comments included.
pub(crate) fn identifier_tokens(source: &str) -> impl Iterator<Item = &str> {
    IDENTIFIER_TOKEN.find_iter(source).map(|m| m.as_str())
}

pub(crate) fn is_identifier_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

pub(crate) fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$' || !c.is_ascii()
}

/// A JSON string literal, which is also a valid JavaScript string literal.
pub(crate) fn json_string(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}

/// `object.name`, or `object["name"]` when `name` is not an identifier.
pub(crate) fn property_access(object: &str, name: &str) -> String {
    if is_identifier_name(name) {
        format!("{object}.{name}")
    } else {
        format!("{object}[{}]", json_string(name))
    }
}

/// Replacement text for an identifier occurrence, keeping the property key
/// when the identifier was written as a shorthand property.
pub(crate) fn rename_text(original: &str, replacement: &str, shorthand: bool) -> String {
    if shorthand {
        format!("{original}: {replacement}")
    } else {
        replacement.to_string()
    }
}

/// Start offsets of identifiers written as shorthand properties
/// (`{ a }`, `const { a } = o`, `({ a } = o)`).
#[derive(Debug, Default)]
pub(crate) struct Shorthands(FxHashSet<u32>);

impl Shorthands {
    pub(crate) fn collect(program: &Program<'_>) -> Self {
        let mut collector = Self::default();
        collector.visit_program(program);
        collector
    }

    pub(crate) fn contains(&self, start: u32) -> bool {
        self.0.contains(&start)
    }
}

impl<'a> Visit<'a> for Shorthands {
    fn visit_object_property(&mut self, prop: &ObjectProperty<'a>) {
        if prop.shorthand {
            self.0.insert(prop.key.span().start);
        }
        walk::walk_object_property(self, prop);
    }

    fn visit_binding_property(&mut self, prop: &BindingProperty<'a>) {
        if prop.shorthand {
            self.0.insert(prop.key.span().start);
        }
        walk::walk_binding_property(self, prop);
    }

    fn visit_assignment_target_property_identifier(
        &mut self,
        prop: &AssignmentTargetPropertyIdentifier<'a>,
    ) {
        self.0.insert(prop.binding.span.start);
        walk::walk_assignment_target_property_identifier(self, prop);
    }
}

/// Names bound by a declaration pattern, in source order.
pub(crate) fn pattern_names(pattern: &BindingPattern<'_>, names: &mut Vec<String>) {
    match &pattern.kind {
        BindingPatternKind::BindingIdentifier(ident) => names.push(ident.name.to_string()),
        BindingPatternKind::ObjectPattern(object) => {
            for prop in &object.properties {
                pattern_names(&prop.value, names);
            }
            if let Some(rest) = &object.rest {
                pattern_names(&rest.argument, names);
            }
        }
        BindingPatternKind::ArrayPattern(array) => {
            for element in array.elements.iter().flatten() {
                pattern_names(element, names);
            }
            if let Some(rest) = &array.rest {
                pattern_names(&rest.argument, names);
            }
        }
        BindingPatternKind::AssignmentPattern(assign) => pattern_names(&assign.left, names),
    }
}

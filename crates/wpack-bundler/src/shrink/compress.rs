//! One compression pass.
//!
//! A pass parses the current text and records edits for dropped statements,
//! removed pure calls, folded literal comparisons and dead branches. Folds
//! expose new constants to the next pass (`"a" === "a"` becomes `true`, then
//! `if (true)` collapses), which is why the pass count is a policy knob.
//!
//! No edit ever removes text that mentions a reserved name.

use oxc_allocator::{Allocator, Vec as ArenaVec};
use oxc_ast::ast::{
    BinaryExpression, BinaryOperator, CallExpression, Expression, IfStatement, LogicalExpression,
    LogicalOperator, Statement, UnaryOperator, VariableDeclaration, VariableDeclarationKind,
};
use oxc_ast_visit::{Visit, walk};
use oxc_semantic::{Scoping, SemanticBuilder};
use oxc_span::{GetSpan, SourceType, Span};
use wpack_config::{DropKind, ShrinkPolicy};

use super::PublicSurface;
use crate::edits::SourceEdits;
use crate::error::{BuildError, Result};
use crate::js;

/// Run one pass over `code`, returning the new text and the number of edits.
pub(crate) fn run_pass(
    code: &str,
    policy: &ShrinkPolicy,
    surface: &PublicSurface,
) -> Result<(String, usize)> {
    let allocator = Allocator::default();
    let program =
        js::parse(&allocator, code, SourceType::mjs()).map_err(|message| BuildError::Parse {
            origin: "compression".to_string(),
            message,
        })?;
    let semantic = SemanticBuilder::new().build(&program).semantic;

    let mut compressor = Compressor {
        policy,
        surface,
        scoping: semantic.scoping(),
        edits: SourceEdits::new(code),
    };
    compressor.visit_program(&program);

    let count = compressor.edits.len();
    Ok((compressor.edits.apply(), count))
}

enum Fold<'e, 'a> {
    Literal(&'static str),
    Keep(&'e Expression<'a>),
}

struct Compressor<'p, 's> {
    policy: &'p ShrinkPolicy,
    surface: &'p PublicSurface,
    scoping: &'p Scoping,
    edits: SourceEdits<'s>,
}

impl Compressor<'_, '_> {
    /// Replace a span unless that would lose a reserved name.
    fn guarded(&mut self, span: Span, text: &str) -> bool {
        if self.surface.mentioned_in(self.edits.slice(span.start, span.end)) {
            return false;
        }
        self.edits.replace(span.start, span.end, text);
        true
    }

    /// `;` unless the statement before `start` is already terminated.
    fn separator(&self, start: u32) -> &'static str {
        let before = self.edits.slice(0, start).trim_end();
        match before.chars().last() {
            None | Some(';') | Some('{') => "",
            Some(_) => ";",
        }
    }

    fn is_free(&self, ident: &oxc_ast::ast::IdentifierReference<'_>) -> bool {
        self.scoping
            .get_reference(ident.reference_id())
            .symbol_id()
            .is_none()
    }

    fn droppable_call(&self, call: &CallExpression<'_>) -> bool {
        if call.optional {
            return false;
        }
        let Some((path, root)) = js::member_path(&call.callee) else {
            return false;
        };
        if !self.is_free(root) {
            return false;
        }
        if let Some(method) = path.strip_prefix("console.") {
            if !method.contains('.') && self.policy.drops_console_method(method) {
                return true;
            }
        }
        self.policy.pure_functions.contains(&path)
    }

    fn removable(&self, stmt: &Statement<'_>) -> bool {
        match stmt {
            Statement::DebuggerStatement(_) => self.policy.drops(DropKind::Debugger),
            Statement::ExpressionStatement(expr) => match &expr.expression {
                Expression::CallExpression(call) => self.droppable_call(call),
                _ => false,
            },
            _ => false,
        }
    }

    /// Handle a statement; `false` means it should be walked as usual.
    fn statement(&mut self, stmt: &Statement<'_>, in_list: bool) -> bool {
        if self.removable(stmt) {
            let span = stmt.span();
            let text = if in_list { self.separator(span.start) } else { ";" };
            if self.guarded(span, text) {
                return true;
            }
        }
        if let Statement::IfStatement(if_stmt) = stmt {
            return self.fold_if(if_stmt, in_list);
        }
        false
    }

    fn fold_if(&mut self, stmt: &IfStatement<'_>, in_list: bool) -> bool {
        let Some(truthy) = const_truthy(&stmt.test) else {
            return false;
        };
        let (kept, dropped) = if truthy {
            (Some(&stmt.consequent), stmt.alternate.as_ref())
        } else {
            (stmt.alternate.as_ref(), Some(&stmt.consequent))
        };
        if dropped.is_some_and(|branch| declares_var(branch)) {
            return false;
        }

        let Some(kept) = kept else {
            let text = if in_list { self.separator(stmt.span.start) } else { ";" };
            return self.guarded(stmt.span, text);
        };

        let k = kept.span();
        let removed = format!(
            "{}{}",
            self.edits.slice(stmt.span.start, k.start),
            self.edits.slice(k.end, stmt.span.end)
        );
        if self.surface.mentioned_in(&removed) {
            return false;
        }

        let kept_text = self.edits.slice(k.start, k.end);
        let prefix = if in_list
            && kept_text.starts_with(['(', '[', '`', '+', '-', '/'])
            && !self.separator(stmt.span.start).is_empty()
        {
            ";"
        } else {
            ""
        };
        self.edits.replace(stmt.span.start, k.start, prefix);
        self.edits.remove(k.end, stmt.span.end);
        self.visit_statement(kept);
        true
    }

    fn fold<'e, 'a>(&self, expr: &'e Expression<'a>) -> Option<Fold<'e, 'a>> {
        match expr {
            Expression::BinaryExpression(binary) => fold_equality(binary).map(Fold::Literal),
            Expression::UnaryExpression(unary)
                if unary.operator == UnaryOperator::LogicalNot
                    && is_non_numeric_literal(&unary.argument) =>
            {
                const_truthy(&unary.argument).map(|b| bool_text(!b)).map(Fold::Literal)
            }
            Expression::LogicalExpression(logical) => fold_logical(logical).map(Fold::Keep),
            Expression::ConditionalExpression(cond) => const_truthy(&cond.test).map(|truthy| {
                Fold::Keep(if truthy {
                    &cond.consequent
                } else {
                    &cond.alternate
                })
            }),
            _ => None,
        }
    }

    /// Replace `outer` with `inner`, then keep compressing inside `inner`.
    fn keep(&mut self, outer: Span, inner: &Expression<'_>) -> bool {
        let k = inner.span();
        let removed = format!(
            "{}{}",
            self.edits.slice(outer.start, k.start),
            self.edits.slice(k.end, outer.end)
        );
        if self.surface.mentioned_in(&removed) {
            return false;
        }

        let text = self.edits.slice(k.start, k.end);
        let wrap = text.starts_with('{')
            || text.starts_with("function")
            || text.starts_with("class")
            || text.starts_with("let [");
        let (open, close) = if wrap { ("(", ")") } else { ("", "") };
        self.edits.replace(outer.start, k.start, open);
        self.edits.replace(k.end, outer.end, close);
        self.visit_expression(inner);
        true
    }
}

impl<'a> Visit<'a> for Compressor<'_, '_> {
    fn visit_statements(&mut self, stmts: &ArenaVec<'a, Statement<'a>>) {
        for stmt in stmts {
            if !self.statement(stmt, true) {
                walk::walk_statement(self, stmt);
            }
        }
    }

    fn visit_statement(&mut self, stmt: &Statement<'a>) {
        if !self.statement(stmt, false) {
            walk::walk_statement(self, stmt);
        }
    }

    fn visit_expression(&mut self, expr: &Expression<'a>) {
        let handled = match self.fold(expr) {
            Some(Fold::Literal(text)) => self.guarded(expr.span(), text),
            Some(Fold::Keep(inner)) => self.keep(expr.span(), inner),
            None => false,
        };
        if !handled {
            walk::walk_expression(self, expr);
        }
    }
}

fn strip_parens<'e, 'a>(expr: &'e Expression<'a>) -> &'e Expression<'a> {
    match expr {
        Expression::ParenthesizedExpression(paren) => strip_parens(&paren.expression),
        _ => expr,
    }
}

fn bool_text(value: bool) -> &'static str {
    if value { "true" } else { "false" }
}

/// Truthiness of a side-effect free constant.
fn const_truthy(expr: &Expression<'_>) -> Option<bool> {
    match strip_parens(expr) {
        Expression::BooleanLiteral(lit) => Some(lit.value),
        Expression::NumericLiteral(lit) => Some(lit.value != 0.0 && !lit.value.is_nan()),
        Expression::StringLiteral(lit) => Some(!lit.value.is_empty()),
        Expression::NullLiteral(_) => Some(false),
        Expression::UnaryExpression(unary) => match unary.operator {
            UnaryOperator::LogicalNot => const_truthy(&unary.argument).map(|b| !b),
            UnaryOperator::Void if const_truthy(&unary.argument).is_some() => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn is_non_numeric_literal(expr: &Expression<'_>) -> bool {
    matches!(
        strip_parens(expr),
        Expression::BooleanLiteral(_) | Expression::StringLiteral(_) | Expression::NullLiteral(_)
    )
}

fn fold_equality(binary: &BinaryExpression<'_>) -> Option<&'static str> {
    let negated = match binary.operator {
        BinaryOperator::Equality | BinaryOperator::StrictEquality => false,
        BinaryOperator::Inequality | BinaryOperator::StrictInequality => true,
        _ => return None,
    };
    let equal = match (strip_parens(&binary.left), strip_parens(&binary.right)) {
        (Expression::StringLiteral(a), Expression::StringLiteral(b)) => a.value == b.value,
        (Expression::NumericLiteral(a), Expression::NumericLiteral(b)) => a.value == b.value,
        (Expression::BooleanLiteral(a), Expression::BooleanLiteral(b)) => a.value == b.value,
        (Expression::NullLiteral(_), Expression::NullLiteral(_)) => true,
        _ => return None,
    };
    Some(bool_text(equal != negated))
}

fn fold_logical<'e, 'a>(logical: &'e LogicalExpression<'a>) -> Option<&'e Expression<'a>> {
    match logical.operator {
        LogicalOperator::And => {
            const_truthy(&logical.left).map(|t| if t { &logical.right } else { &logical.left })
        }
        LogicalOperator::Or => {
            const_truthy(&logical.left).map(|t| if t { &logical.left } else { &logical.right })
        }
        LogicalOperator::Coalesce => {
            let nullish = match strip_parens(&logical.left) {
                Expression::NullLiteral(_) => true,
                Expression::BooleanLiteral(_)
                | Expression::NumericLiteral(_)
                | Expression::StringLiteral(_) => false,
                _ => return None,
            };
            Some(if nullish { &logical.right } else { &logical.left })
        }
    }
}

/// Whether a branch declares a `var`, which hoists out of it.
fn declares_var(stmt: &Statement<'_>) -> bool {
    struct Finder(bool);
    impl<'a> Visit<'a> for Finder {
        fn visit_variable_declaration(&mut self, decl: &VariableDeclaration<'a>) {
            if decl.kind == VariableDeclarationKind::Var {
                self.0 = true;
            }
            walk::walk_variable_declaration(self, decl);
        }
    }
    let mut finder = Finder(false);
    finder.visit_statement(stmt);
    finder.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn pass(code: &str, policy: &ShrinkPolicy) -> String {
        run_pass(code, policy, &PublicSurface::new(policy.reserved_names.iter().cloned()))
            .unwrap()
            .0
    }

    fn passes(code: &str, policy: &ShrinkPolicy, n: usize) -> String {
        (0..n).fold(code.to_string(), |code, _| pass(&code, policy))
    }

    #[test]
    fn console_call_keeps_diagnostics() {
        let policy = ShrinkPolicy::passthrough().with_drop(DropKind::ConsoleCall);
        assert_eq!(
            pass(
                "console.log(1);\nconsole.error(2);\nconsole.warn(3);\nconsole.info(4);\n",
                &policy
            ),
            "\nconsole.error(2);\nconsole.warn(3);\n\n"
        );
    }

    #[test]
    fn console_all_and_debugger() {
        let policy = ShrinkPolicy::passthrough()
            .with_drop(DropKind::ConsoleAll)
            .with_drop(DropKind::Debugger);
        assert_eq!(
            pass("function f() { debugger; console.error(e); return 1; }", &policy),
            "function f() {   return 1; }"
        );
    }

    #[test]
    fn shadowed_console_is_kept() {
        let policy = ShrinkPolicy::passthrough().with_drop(DropKind::ConsoleAll);
        let code = "function f(console) { console.log(1); }";
        assert_eq!(pass(code, &policy), code);
    }

    #[test]
    fn pure_calls_only_as_statements() {
        let policy = ShrinkPolicy::passthrough().with_pure(["assert", "log.trace"]);
        assert_eq!(
            pass("assert(x);\nlog.trace(y);\nvar z = assert(x);\n", &policy),
            "\n\nvar z = assert(x);\n"
        );
    }

    #[test]
    fn removal_keeps_statements_apart() {
        let policy = ShrinkPolicy::passthrough().with_drop(DropKind::Debugger);
        assert_eq!(pass("a = b\ndebugger\n(c)\n", &policy), "a = b\n;\n(c)\n");
        assert_eq!(pass("if (x) debugger;", &policy), "if (x) ;");
    }

    #[test]
    fn folds_then_eliminates_branches() {
        let policy = ShrinkPolicy::passthrough();
        let code = "if (\"production\" !== \"production\") { dev(); } else { prod(); }\n";
        assert_eq!(pass(code, &policy), "if (false) { dev(); } else { prod(); }\n");
        assert_eq!(passes(code, &policy, 2), "{ prod(); }\n");
    }

    #[test]
    fn logical_and_conditional_folds() {
        let policy = ShrinkPolicy::passthrough();
        assert_eq!(pass("x = false && f();", &policy), "x = false;");
        assert_eq!(pass("x = true && f();", &policy), "x = f();");
        assert_eq!(pass("x = null ?? d;", &policy), "x = d;");
        assert_eq!(pass("x = 0 || y;", &policy), "x = y;");
        assert_eq!(pass("f(true ? a : b);", &policy), "f(a);");
        assert_eq!(pass("g = () => true ? {} : 0;", &policy), "g = () => ({});");
        assert_eq!(pass("x = !\"s\";", &policy), "x = false;");
        assert_eq!(pass("x = !0;", &policy), "x = !0;");
    }

    #[test]
    fn var_in_dead_branch_blocks_elimination() {
        let policy = ShrinkPolicy::passthrough();
        let code = "if (false) { var hoisted = 1; }\n";
        assert_eq!(pass(code, &policy), code);
    }

    #[test]
    fn reserved_names_are_never_removed() {
        let policy = ShrinkPolicy::passthrough()
            .with_reserved(["Widget"])
            .with_pure(["register"]);
        let code = "register(Widget);\nif (false) { Widget.init(); }\nx = false && Widget;\n";
        assert_eq!(pass(code, &policy), code);
    }

    #[test]
    fn counts_edits() {
        let policy = ShrinkPolicy::passthrough();
        let surface = PublicSurface::default();
        assert_eq!(run_pass("f(a);", &policy, &surface).unwrap().1, 0);
        assert!(run_pass("f(1 === 1);", &policy, &surface).unwrap().1 > 0);
    }
}

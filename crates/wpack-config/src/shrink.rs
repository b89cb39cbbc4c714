//! Shrink policy: compression passes, statement dropping and the rename allowlist.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Statement kinds the compressor may drop outright.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DropKind {
    /// Console output calls (`console.log`, `console.info`, ...), keeping
    /// `console.warn` and `console.error`.
    #[serde(alias = "console")]
    ConsoleCall,
    /// Every `console.*` call, diagnostics included.
    ConsoleAll,
    /// `debugger` statements.
    #[serde(alias = "debugger-break")]
    Debugger,
}

impl DropKind {
    /// Console methods kept by [`DropKind::ConsoleCall`].
    pub const DIAGNOSTIC_CONSOLE_METHODS: &'static [&'static str] = &["warn", "error"];

    /// Whether a call to `console.<method>` is dropped under this kind.
    pub fn drops_console_method(self, method: &str) -> bool {
        match self {
            DropKind::ConsoleAll => true,
            DropKind::ConsoleCall => !Self::DIAGNOSTIC_CONSOLE_METHODS.contains(&method),
            DropKind::Debugger => false,
        }
    }
}

/// Shrink/obfuscate policy applied to the merged script artifact.
///
/// `reserved_names` is the public surface of the widget: the renamer consults it
/// before any rename and the compressor never removes code that references it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShrinkPolicy {
    /// Number of sequential compression passes (at least one).
    pub compress_passes: u32,

    /// Statement kinds removed by every pass.
    pub drop_statements: BTreeSet<DropKind>,

    /// Dotted callee names (`console.info`, `assert`) whose calls are removed
    /// when their result is unused.
    pub pure_functions: BTreeSet<String>,

    /// Identifiers exempt from renaming.
    pub reserved_names: BTreeSet<String>,

    /// Remove all comments from the output.
    pub strip_comments: bool,

    /// Rename local identifiers to short synthetic names.
    pub mangle: bool,

    /// Reprint the artifact without insignificant whitespace.
    pub compact: bool,
}

impl Default for ShrinkPolicy {
    fn default() -> Self {
        Self {
            compress_passes: 2,
            drop_statements: [DropKind::ConsoleAll, DropKind::Debugger].into_iter().collect(),
            pure_functions: ["console.info", "console.debug"]
                .into_iter()
                .map(String::from)
                .collect(),
            reserved_names: BTreeSet::new(),
            strip_comments: true,
            mangle: true,
            compact: true,
        }
    }
}

impl ShrinkPolicy {
    /// A policy that changes nothing itself. Syntax newer than the build
    /// target is still lowered.
    pub fn passthrough() -> Self {
        Self {
            compress_passes: 1,
            drop_statements: BTreeSet::new(),
            pure_functions: BTreeSet::new(),
            reserved_names: BTreeSet::new(),
            strip_comments: false,
            mangle: false,
            compact: false,
        }
    }

    pub fn with_reserved(mut self, names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.reserved_names.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn with_drop(mut self, kind: DropKind) -> Self {
        self.drop_statements.insert(kind);
        self
    }

    pub fn with_pure(mut self, names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.pure_functions.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn drops(&self, kind: DropKind) -> bool {
        self.drop_statements.contains(&kind)
    }

    /// Whether a `console.<method>(...)` statement is dropped.
    pub fn drops_console_method(&self, method: &str) -> bool {
        self.drop_statements
            .iter()
            .any(|kind| kind.drops_console_method(method))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn console_call_keeps_diagnostics() {
        assert!(DropKind::ConsoleCall.drops_console_method("log"));
        assert!(DropKind::ConsoleCall.drops_console_method("info"));
        assert!(!DropKind::ConsoleCall.drops_console_method("error"));
        assert!(!DropKind::ConsoleCall.drops_console_method("warn"));
        assert!(DropKind::ConsoleAll.drops_console_method("error"));
        assert!(!DropKind::Debugger.drops_console_method("log"));
    }

    #[test]
    fn drop_kind_serde_names() {
        let kinds: Vec<DropKind> =
            serde_json::from_str(r#"["console-call", "console", "console-all", "debugger"]"#)
                .unwrap();
        assert_eq!(
            kinds,
            vec![
                DropKind::ConsoleCall,
                DropKind::ConsoleCall,
                DropKind::ConsoleAll,
                DropKind::Debugger
            ]
        );
    }

    #[test]
    fn passthrough_disables_everything() {
        let policy = ShrinkPolicy::passthrough();
        assert!(!policy.mangle);
        assert!(!policy.drops_console_method("log"));
        assert!(!policy.drops(DropKind::Debugger));
    }
}

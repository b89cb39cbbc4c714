//! The module runtime emitted around linked modules.
//!
//! Everything lives inside one strict-mode IIFE. Modules are registered in
//! `__wp_modules` and instantiated lazily by `__wp_require`, which caches the
//! exports object before running the module body so import cycles see the
//! partially initialised exports. Exports are getters, keeping bindings live.

use std::fmt::Write as _;

use super::ModuleId;

pub(crate) const EXPORTS: &str = "__wp_exports";
pub(crate) const DEFAULT_LOCAL: &str = "__wp_default";

pub(crate) fn module_var(id: ModuleId) -> String {
    format!("__wp_m{id}")
}

pub(crate) fn require_call(id: ModuleId) -> String {
    format!("__wp_require({id})")
}

pub(crate) fn lazy_require(id: ModuleId) -> String {
    format!(
        "Promise.resolve().then(function () {{ return {}; }})",
        require_call(id)
    )
}

const PRELUDE: &str = r#"(function () {
"use strict";
var __wp_modules = {};
var __wp_cache = {};
function __wp_require(id) {
	var cached = __wp_cache[id];
	if (cached) return cached;
	var exports = __wp_cache[id] = {};
	__wp_modules[id].call(void 0, exports);
	return exports;
}
function __wp_export(target, getters) {
	for (var key in getters) Object.defineProperty(target, key, { enumerable: true, get: getters[key] });
}
"#;

const REEXPORT: &str = r#"function __wp_reexport(target, source) {
	Object.keys(source).forEach(function (key) {
		if (key === "default" || Object.prototype.hasOwnProperty.call(target, key)) return;
		Object.defineProperty(target, key, { enumerable: true, get: function () { return source[key]; } });
	});
}
"#;

pub(crate) fn prelude(with_reexport: bool) -> String {
    let mut out = String::from(PRELUDE);
    if with_reexport {
        out.push_str(REEXPORT);
    }
    out
}

/// Run every entry in order and close the IIFE.
pub(crate) fn epilogue(entries: &[ModuleId]) -> String {
    let mut out = String::new();
    for id in entries {
        let _ = writeln!(out, "{};", require_call(*id));
    }
    out.push_str("})();\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reexport_helper_is_optional() {
        assert!(!prelude(false).contains("__wp_reexport"));
        assert!(prelude(true).contains("function __wp_reexport"));
    }

    #[test]
    fn entries_run_in_order() {
        assert_eq!(epilogue(&[0, 2]), "__wp_require(0);\n__wp_require(2);\n})();\n");
    }
}

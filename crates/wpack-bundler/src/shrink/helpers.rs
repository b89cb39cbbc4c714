//! Runtime helpers for lowered syntax.
//!
//! Lowering calls helpers as `babelHelpers.<name>(...)`. The chunk has no
//! module system to import them from, so the ones it uses are defined in a
//! wrapper around the lowered code.

use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::sync::LazyLock;

use regex::Regex;

const HELPERS_VAR: &str = "babelHelpers";

static HELPER_CALL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bbabelHelpers\.([A-Za-z_$][A-Za-z0-9_$]*)").expect("valid helper regex")
});

struct Helper {
    name: &'static str,
    requires: &'static [&'static str],
    source: &'static str,
}

/// Table order is emission order.
const HELPERS: &[Helper] = &[
    Helper {
        name: "toPropertyKey",
        requires: &[],
        source: r#"function (arg) {
	if (typeof arg === "symbol") return arg;
	if (typeof arg !== "object" || arg === null) return String(arg);
	var toPrimitive = arg[Symbol.toPrimitive];
	if (toPrimitive === undefined) return String(arg);
	var key = toPrimitive.call(arg, "string");
	if (typeof key === "object") throw new TypeError("@@toPrimitive must return a primitive value.");
	return typeof key === "symbol" ? key : String(key);
}"#,
    },
    Helper {
        name: "defineProperty",
        requires: &["toPropertyKey"],
        source: r#"function (obj, key, value) {
	key = babelHelpers.toPropertyKey(key);
	if (key in obj) Object.defineProperty(obj, key, { value: value, enumerable: true, configurable: true, writable: true });
	else obj[key] = value;
	return obj;
}"#,
    },
    Helper {
        name: "extends",
        requires: &[],
        source: r#"function () {
	return Object.assign.apply(Object, arguments);
}"#,
    },
    Helper {
        name: "objectSpread2",
        requires: &["defineProperty"],
        source: r#"function (target) {
	function ownKeys(object, enumerableOnly) {
		var keys = Object.keys(object);
		if (Object.getOwnPropertySymbols) {
			var symbols = Object.getOwnPropertySymbols(object);
			if (enumerableOnly) symbols = symbols.filter(function (sym) { return Object.getOwnPropertyDescriptor(object, sym).enumerable; });
			keys.push.apply(keys, symbols);
		}
		return keys;
	}
	for (var i = 1; i < arguments.length; i++) {
		var source = arguments[i] != null ? arguments[i] : {};
		if (i % 2) {
			ownKeys(Object(source), true).forEach(function (key) { babelHelpers.defineProperty(target, key, source[key]); });
		} else if (Object.getOwnPropertyDescriptors) {
			Object.defineProperties(target, Object.getOwnPropertyDescriptors(source));
		} else {
			ownKeys(Object(source)).forEach(function (key) { Object.defineProperty(target, key, Object.getOwnPropertyDescriptor(source, key)); });
		}
	}
	return target;
}"#,
    },
    Helper {
        name: "objectWithoutProperties",
        requires: &[],
        source: r#"function (source, excluded) {
	if (source == null) return {};
	var target = {};
	var key;
	for (key in source) {
		if (!Object.prototype.hasOwnProperty.call(source, key) || excluded.indexOf(key) !== -1) continue;
		target[key] = source[key];
	}
	if (Object.getOwnPropertySymbols) {
		var symbols = Object.getOwnPropertySymbols(source);
		for (var i = 0; i < symbols.length; i++) {
			key = symbols[i];
			if (excluded.indexOf(key) !== -1 || !Object.prototype.propertyIsEnumerable.call(source, key)) continue;
			target[key] = source[key];
		}
	}
	return target;
}"#,
    },
    Helper {
        name: "objectDestructuringEmpty",
        requires: &[],
        source: r#"function (obj) {
	if (obj == null) throw new TypeError("Cannot destructure " + obj);
}"#,
    },
    Helper {
        name: "asyncToGenerator",
        requires: &[],
        source: r#"function (fn) {
	return function () {
		var self = this, args = arguments;
		return new Promise(function (resolve, reject) {
			var gen = fn.apply(self, args);
			function step(key, arg) {
				var info;
				try {
					info = gen[key](arg);
				} catch (error) {
					reject(error);
					return;
				}
				if (info.done) resolve(info.value);
				else Promise.resolve(info.value).then(next, fail);
			}
			function next(value) { step("next", value); }
			function fail(error) { step("throw", error); }
			next(undefined);
		});
	};
}"#,
    },
    Helper {
        name: "checkPrivateRedeclaration",
        requires: &[],
        source: r#"function (obj, collection) {
	if (collection.has(obj)) throw new TypeError("Cannot initialize the same private elements twice on an object");
}"#,
    },
    Helper {
        name: "classPrivateFieldInitSpec",
        requires: &["checkPrivateRedeclaration"],
        source: r#"function (obj, privateMap, value) {
	babelHelpers.checkPrivateRedeclaration(obj, privateMap);
	privateMap.set(obj, value);
}"#,
    },
    Helper {
        name: "classPrivateMethodInitSpec",
        requires: &["checkPrivateRedeclaration"],
        source: r#"function (obj, privateSet) {
	babelHelpers.checkPrivateRedeclaration(obj, privateSet);
	privateSet.add(obj);
}"#,
    },
    Helper {
        name: "assertClassBrand",
        requires: &[],
        source: r#"function (brand, receiver, value) {
	if (typeof brand === "function" ? brand === receiver : brand.has(receiver)) return arguments.length < 3 ? receiver : value;
	throw new TypeError("Private element is not present on this object");
}"#,
    },
    Helper {
        name: "classPrivateFieldGet2",
        requires: &["assertClassBrand"],
        source: r#"function (privateMap, receiver) {
	return privateMap.get(babelHelpers.assertClassBrand(privateMap, receiver));
}"#,
    },
    Helper {
        name: "classPrivateFieldSet2",
        requires: &["assertClassBrand"],
        source: r#"function (privateMap, receiver, value) {
	privateMap.set(babelHelpers.assertClassBrand(privateMap, receiver), value);
	return value;
}"#,
    },
    Helper {
        name: "checkInRHS",
        requires: &[],
        source: r#"function (value) {
	if (Object(value) !== value) throw new TypeError("right-hand side of 'in' should be an object, got " + (value !== null ? typeof value : "null"));
	return value;
}"#,
    },
    Helper {
        name: "toSetter",
        requires: &[],
        source: r#"function (fn, args, thisArg) {
	if (!args) args = [];
	var index = args.length++;
	return Object.defineProperty({}, "_", { set: function (value) { args[index] = value; fn.apply(thisArg, args); } });
}"#,
    },
    Helper {
        name: "readOnlyError",
        requires: &[],
        source: r#"function (name) {
	throw new TypeError('"' + name + '" is read-only');
}"#,
    },
    Helper {
        name: "writeOnlyError",
        requires: &[],
        source: r#"function (name) {
	throw new TypeError('"' + name + '" is write-only');
}"#,
    },
    Helper {
        name: "taggedTemplateLiteral",
        requires: &[],
        source: r#"function (strings, raw) {
	if (!raw) raw = strings.slice(0);
	return Object.freeze(Object.defineProperties(strings, { raw: { value: Object.freeze(raw) } }));
}"#,
    },
];

fn find(name: &str) -> Option<&'static Helper> {
    HELPERS.iter().find(|helper| helper.name == name)
}

/// Names of the helpers `code` calls.
pub(crate) fn used(code: &str) -> BTreeSet<&str> {
    HELPER_CALL
        .captures_iter(code)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .collect()
}

/// Wrap `code` with definitions of every helper it calls.
///
/// Returns `code` unchanged when it calls none, and the name of a
/// helper without a definition when one is missing.
pub(crate) fn link(code: &str) -> Result<String, String> {
    let used = used(code);
    if used.is_empty() {
        return Ok(code.to_string());
    }

    let mut needed = BTreeSet::new();
    let mut pending: Vec<&str> = used.into_iter().collect();
    while let Some(name) = pending.pop() {
        let helper = find(name).ok_or_else(|| name.to_string())?;
        if needed.insert(helper.name) {
            pending.extend(helper.requires);
        }
    }

    let mut out = format!("(function () {{\nvar {HELPERS_VAR} = {{\n");
    for helper in HELPERS.iter().filter(|helper| needed.contains(helper.name)) {
        let _ = writeln!(out, "{}: {},", helper.name, helper.source);
    }
    out.push_str("};\n");
    out.push_str(code);
    if !code.ends_with('\n') {
        out.push('\n');
    }
    out.push_str("})();\n");
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_without_helpers_is_untouched() {
        assert_eq!(link("f();\n").unwrap(), "f();\n");
    }

    #[test]
    fn dependencies_are_pulled_in() {
        let out = link("babelHelpers.classPrivateFieldGet2(_x, this);\n").unwrap();
        assert!(out.contains("classPrivateFieldGet2: function"));
        assert!(out.contains("assertClassBrand: function"));
        assert!(!out.contains("defineProperty: function"));
        assert!(out.starts_with("(function () {\nvar babelHelpers = {"));
        assert!(out.ends_with("})();\n"));
    }

    #[test]
    fn unknown_helpers_are_reported() {
        assert_eq!(
            link("babelHelpers.wrapAsyncGenerator(f);").unwrap_err(),
            "wrapAsyncGenerator"
        );
    }

    #[test]
    fn every_table_dependency_exists() {
        for helper in HELPERS {
            for dep in helper.requires {
                assert!(find(dep).is_some(), "{} requires missing {dep}", helper.name);
            }
        }
    }
}

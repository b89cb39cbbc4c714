use std::fmt::Write as _;
use std::path::Path;

use anyhow::Context;
use serde_json::Value;

use super::{Transform, TransformOutput};
use crate::js;

/// Words that cannot name a `const` binding in a module.
const RESERVED_WORDS: &[&str] = &[
    "arguments", "await", "break", "case", "catch", "class", "const", "continue", "debugger",
    "default", "delete", "do", "else", "enum", "eval", "export", "extends", "false", "finally",
    "for", "function", "if", "implements", "import", "in", "instanceof", "interface", "let", "new",
    "null", "package", "private", "protected", "public", "return", "static", "super", "switch",
    "this", "throw", "true", "try", "typeof", "var", "void", "while", "with", "yield",
];

fn is_binding_name(key: &str) -> bool {
    js::is_identifier_name(key) && !RESERVED_WORDS.contains(&key)
}

/// JSON documents, validated and exported as a value.
///
/// Top-level object keys that are valid binding names are also exported by
/// name, and the default export refers to those same values.
pub struct DataTransform;

impl Transform for DataTransform {
    fn name(&self) -> &'static str {
        "data"
    }

    fn transform(&self, _path: &Path, source: &str) -> anyhow::Result<TransformOutput> {
        let value: Value = serde_json::from_str(source).context("invalid JSON")?;
        let Value::Object(map) = &value else {
            return Ok(TransformOutput::code(format!(
                "export default {};\n",
                serde_json::to_string(&value)?
            )));
        };

        let mut code = String::new();
        let mut fields = Vec::with_capacity(map.len());
        for (key, value) in map {
            let json = serde_json::to_string(value)?;
            if is_binding_name(key) {
                let _ = writeln!(code, "export const {key} = {json};");
                fields.push(format!("{}:{key}", js::json_string(key)));
            } else {
                fields.push(format!("{}:{json}", js::json_string(key)));
            }
        }
        let _ = writeln!(code, "export default {{{}}};", fields.join(","));
        Ok(TransformOutput::code(code))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn top_level_keys_become_named_exports() {
        let out = DataTransform
            .transform(
                Path::new("d.json"),
                "{\n  \"class\": \"x\",\n  \"data-id\": 7,\n  \"name\": \"widget\",\n  \"tags\": [1, 2]\n}",
            )
            .unwrap();
        assert_eq!(
            out.code,
            "export const name = \"widget\";\n\
             export const tags = [1,2];\n\
             export default {\"class\":\"x\",\"data-id\":7,\"name\":name,\"tags\":tags};\n"
        );
    }

    #[test]
    fn non_objects_only_have_a_default() {
        let out = DataTransform
            .transform(Path::new("d.json"), "[1, 2]")
            .unwrap();
        assert_eq!(out.code, "export default [1,2];\n");
    }

    #[test]
    fn rejects_invalid_json() {
        let err = DataTransform
            .transform(Path::new("d.json"), "{ name: 1 }")
            .unwrap_err();
        assert!(err.to_string().contains("invalid JSON"));
    }
}

use proptest::prelude::*;
use regex::Regex;
use wpack_bundler::{EsTarget, ShrinkEngine, ShrinkPolicy};

fn occurrences(code: &str, name: &str) -> usize {
    Regex::new(&format!(r"\b{}\b", regex::escape(name)))
        .unwrap()
        .find_iter(code)
        .count()
}

fn widget_source(reserved: &str, locals: &[String], calls: usize) -> String {
    let mut body = String::new();
    for (i, local) in locals.iter().enumerate() {
        body.push_str(&format!("  var {local} = {reserved}({i});\n"));
    }
    for i in 0..calls {
        body.push_str(&format!("  console.log({i});\n"));
    }
    let sum = if locals.is_empty() {
        "0".to_string()
    } else {
        locals.join(" + ")
    };
    format!(
        "(function () {{\n  function {reserved}(value) {{ return value * 2; }}\n{body}  window.{reserved} = {reserved};\n  return {sum};\n}})();\n"
    )
}

fn locals() -> impl Strategy<Value = Vec<String>> {
    prop::collection::btree_set("v_[a-z]{1,6}", 0..6).prop_map(|set| set.into_iter().collect())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn reserved_names_survive_every_pass(
        reserved in "r_[a-z]{1,6}",
        locals in locals(),
        calls in 0usize..4,
        passes in 1u32..4,
    ) {
        let source = widget_source(&reserved, &locals, calls);
        let policy = ShrinkPolicy {
            compress_passes: passes,
            ..ShrinkPolicy::default()
        }
        .with_reserved([reserved.clone()]);
        let engine = ShrinkEngine::new(policy, EsTarget::ES2019);

        let out = engine.shrink_code(&source).unwrap();
        prop_assert_eq!(occurrences(&out, &reserved), occurrences(&source, &reserved));
        prop_assert!(!out.contains("console.log"));
        for local in &locals {
            prop_assert_eq!(occurrences(&out, local), 0);
        }
    }

    #[test]
    fn shrinking_is_deterministic(
        reserved in "r_[a-z]{1,6}",
        locals in locals(),
        calls in 0usize..4,
    ) {
        let source = widget_source(&reserved, &locals, calls);
        let engine = ShrinkEngine::new(
            ShrinkPolicy::default().with_reserved([reserved]),
            EsTarget::ES2020,
        );
        let first = engine.shrink_code(&source).unwrap();
        let second = engine.shrink_code(&source).unwrap();
        prop_assert_eq!(first, second);
    }
}

#[test]
fn reserved_callee_is_never_dropped_as_pure() {
    let policy = ShrinkPolicy::default()
        .with_reserved(["Widget"])
        .with_pure(["track"]);
    let engine = ShrinkEngine::new(policy, EsTarget::ESNext);
    let out = engine
        .shrink_code("(function () { function Widget() {} track(Widget); window.Widget = Widget; })();")
        .unwrap();
    assert_eq!(occurrences(&out, "Widget"), 4);
}

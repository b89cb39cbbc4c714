use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use wpack_config::TransformOptions;

use super::{Transform, TransformOutput};
use crate::js::json_string;

static HTML_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").expect("valid comment regex"));
static BETWEEN_TAGS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r">\s+<").expect("valid whitespace regex"));
static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

/// Markup templates, exported as a string.
pub struct TemplateTransform {
    options: TransformOptions,
}

impl TemplateTransform {
    pub fn new(options: TransformOptions) -> Self {
        Self { options }
    }

    fn minify(&self, source: &str) -> String {
        let mut markup = source.to_string();
        if self.options.remove_comments {
            markup = HTML_COMMENT.replace_all(&markup, "").into_owned();
        }
        if !self.options.preserve_whitespace {
            markup = BETWEEN_TAGS.replace_all(&markup, "><").into_owned();
            markup = WHITESPACE.replace_all(&markup, " ").trim().to_string();
        }
        markup
    }
}

impl Transform for TemplateTransform {
    fn name(&self) -> &'static str {
        "template"
    }

    fn transform(&self, _path: &Path, source: &str) -> anyhow::Result<TransformOutput> {
        let markup = if self.options.minify_templates {
            self.minify(source)
        } else {
            source.to_string()
        };
        Ok(TransformOutput::code(format!(
            "export default {};\n",
            json_string(&markup)
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIEW: &str = "<div class=\"w\">\n  <!-- header -->\n  <span>  Hello\n  world </span>\n</div>\n";

    fn run(options: TransformOptions) -> String {
        TemplateTransform::new(options)
            .transform(Path::new("view.tbhtml"), VIEW)
            .unwrap()
            .code
    }

    #[test]
    fn minifies_by_default() {
        assert_eq!(
            run(TransformOptions::default()),
            "export default \"<div class=\\\"w\\\"><span> Hello world </span></div>\";\n"
        );
    }

    #[test]
    fn preserve_whitespace_keeps_layout() {
        let code = run(TransformOptions {
            preserve_whitespace: true,
            ..TransformOptions::default()
        });
        assert!(code.contains("\\n  <span>"));
        assert!(!code.contains("header"));
    }

    #[test]
    fn minify_off_is_verbatim() {
        let code = run(TransformOptions {
            minify_templates: false,
            ..TransformOptions::default()
        });
        assert!(code.contains("<!-- header -->"));
    }
}

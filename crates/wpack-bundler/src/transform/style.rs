use std::path::Path;
use std::sync::Arc;

use lightningcss::{
    printer::PrinterOptions,
    stylesheet::{MinifyOptions, ParserOptions, StyleSheet},
};
use wpack_config::TransformOptions;

use super::{Transform, TransformOutput};
use crate::js::json_string;

/// A step in the CSS post-processing chain, run after lightningcss.
pub type CssPostProcess = Arc<dyn Fn(&Path, String) -> anyhow::Result<String> + Send + Sync>;

/// Stylesheets, parsed and optionally minified with lightningcss.
///
/// With `inject_styles` the module appends a `<style>` element when it runs,
/// so the widget stays a single script tag. The CSS text is the default
/// export either way.
pub struct StyleTransform {
    options: TransformOptions,
    post_process: Vec<CssPostProcess>,
}

impl StyleTransform {
    pub fn new(options: TransformOptions) -> Self {
        Self {
            options,
            post_process: Vec::new(),
        }
    }

    pub fn with_post_process(mut self, step: CssPostProcess) -> Self {
        self.post_process.push(step);
        self
    }

    fn process_css(&self, path: &Path, source: &str) -> anyhow::Result<String> {
        let minify = self.options.minify_styles;
        let mut stylesheet = StyleSheet::parse(
            source,
            ParserOptions {
                filename: path.to_string_lossy().to_string(),
                ..Default::default()
            },
        )
        .map_err(|e| anyhow::anyhow!("Failed to parse CSS from {}: {}", path.display(), e))?;

        if minify {
            stylesheet.minify(MinifyOptions::default()).map_err(|e| {
                anyhow::anyhow!("Failed to minify CSS from {}: {}", path.display(), e)
            })?;
        }

        let result = stylesheet
            .to_css(PrinterOptions {
                minify,
                ..Default::default()
            })
            .map_err(|e| anyhow::anyhow!("Failed to print CSS from {}: {}", path.display(), e))?;

        Ok(result.code)
    }
}

impl Transform for StyleTransform {
    fn name(&self) -> &'static str {
        "style"
    }

    fn transform(&self, path: &Path, source: &str) -> anyhow::Result<TransformOutput> {
        let mut css = self.process_css(path, source)?;
        for step in &self.post_process {
            css = step(path, css)?;
        }

        let literal = json_string(&css);
        let code = if self.options.inject_styles {
            format!(
                "var __wp_css = {literal};\n\
                 if (typeof document !== \"undefined\") {{\n\
                 \tvar __wp_style = document.createElement(\"style\");\n\
                 \t__wp_style.textContent = __wp_css;\n\
                 \tdocument.head.appendChild(__wp_style);\n\
                 }}\n\
                 export default __wp_css;\n"
            )
        } else {
            format!("export default {literal};\n")
        };
        Ok(TransformOutput::code(code))
    }
}

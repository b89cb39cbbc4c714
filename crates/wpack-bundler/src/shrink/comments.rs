use oxc_allocator::Allocator;
use oxc_span::SourceType;

use crate::edits::SourceEdits;
use crate::error::{BuildError, Result};
use crate::js;

/// Remove every comment, keeping line breaks that ASI may depend on.
pub(crate) fn strip(code: &str) -> Result<String> {
    let allocator = Allocator::default();
    let program =
        js::parse(&allocator, code, SourceType::mjs()).map_err(|message| BuildError::Parse {
            origin: "comment stripping".to_string(),
            message,
        })?;

    let mut edits = SourceEdits::new(code);
    for comment in &program.comments {
        let (start, end) = delimited(code, comment.span.start, comment.span.end);
        let text = &code[start as usize..end as usize];
        let before = code[..start as usize].chars().next_back();
        let after = code[end as usize..].chars().next();

        let replacement = if text.contains('\n') {
            "\n"
        } else {
            match (before, after) {
                (Some(b), Some(a)) if js::is_identifier_char(b) && js::is_identifier_char(a) => " ",
                (Some(b), Some(a)) if b == a && (b == '+' || b == '-') => " ",
                _ => "",
            }
        };
        edits.replace(start, end, replacement);
    }
    Ok(edits.apply())
}

/// Widen a comment span to include its `//` or `/* */` delimiters.
fn delimited(code: &str, start: u32, end: u32) -> (u32, u32) {
    let opens = |at: u32| {
        let rest = &code[at as usize..];
        rest.starts_with("//") || rest.starts_with("/*")
    };
    if opens(start) || start < 2 || !opens(start - 2) {
        return (start, end);
    }
    let block = code[(start - 2) as usize..].starts_with("/*");
    let end = if block && code[end as usize..].starts_with("*/") {
        end + 2
    } else {
        end
    };
    (start - 2, end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn strips_line_and_block_comments() {
        assert_eq!(
            strip("// header\nvar a = 1; /* inline */\nf(a); // trailing\n").unwrap(),
            "\nvar a = 1; \nf(a); \n"
        );
    }

    #[test]
    fn multiline_block_keeps_a_break() {
        assert_eq!(strip("a = b/*\n*/(c)").unwrap(), "a = b\n(c)");
    }

    #[test]
    fn tokens_are_not_joined() {
        assert_eq!(strip("var a=b/**/in c;").unwrap(), "var a=b in c;");
        assert_eq!(strip("x = a+/**/+b;").unwrap(), "x = a+ +b;");
    }

    #[test]
    fn strings_are_untouched() {
        assert_eq!(strip("s = '/* not */';").unwrap(), "s = '/* not */';");
    }
}

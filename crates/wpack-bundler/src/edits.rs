//! Span-based text rewriting.
//!
//! Stages analyse a read-only AST and record byte-range edits against the
//! source it was parsed from. Applying them produces the rewritten text while
//! leaving every untouched byte (formatting, comments) exactly as it was.

use std::cmp::Reverse;

#[derive(Debug, Clone)]
struct Edit {
    start: u32,
    end: u32,
    text: String,
}

/// An ordered collection of replacements over a single source string.
///
/// When two edits overlap, the one starting first wins; for equal starts the
/// wider edit wins. Inner edits swallowed by an outer one are dropped.
#[derive(Debug)]
pub struct SourceEdits<'s> {
    source: &'s str,
    edits: Vec<Edit>,
}

impl<'s> SourceEdits<'s> {
    pub fn new(source: &'s str) -> Self {
        Self {
            source,
            edits: Vec::new(),
        }
    }

    pub fn replace(&mut self, start: u32, end: u32, text: impl Into<String>) {
        debug_assert!(start <= end && end as usize <= self.source.len());
        self.edits.push(Edit {
            start,
            end,
            text: text.into(),
        });
    }

    pub fn remove(&mut self, start: u32, end: u32) {
        self.replace(start, end, String::new());
    }

    pub fn insert(&mut self, at: u32, text: impl Into<String>) {
        self.replace(at, at, text);
    }

    pub fn slice(&self, start: u32, end: u32) -> &'s str {
        &self.source[start as usize..end as usize]
    }

    pub fn len(&self) -> usize {
        self.edits.len()
    }

    pub fn apply(mut self) -> String {
        // Insertions at a position go before a replacement starting there.
        self.edits
            .sort_by_key(|e| (e.start, e.end > e.start, Reverse(e.end)));

        let mut out = String::with_capacity(self.source.len());
        let mut cursor = 0u32;
        for edit in &self.edits {
            if edit.start < cursor {
                continue;
            }
            out.push_str(&self.source[cursor as usize..edit.start as usize]);
            out.push_str(&edit.text);
            cursor = edit.end;
        }
        out.push_str(&self.source[cursor as usize..]);
        out
    }
}

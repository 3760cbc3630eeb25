use std::cmp::Ordering;

use serde::Serialize;

use crate::syntax::Span;

/// One replacement against the original text.
///
/// `start..end` is a byte range of the input; an insertion has
/// `start == end`. The sorted list of edits is the mapping between input and
/// output positions: text outside every edit is copied unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Edit {
    pub start: usize,
    pub end: usize,
    pub replacement: String,
}

impl Edit {
    /// Output offset of `offset` in the input, given the sorted edits that
    /// precede it. Offsets inside a replaced range map to the replacement's
    /// start.
    pub fn map_offset(edits: &[Edit], offset: usize) -> usize {
        let mut shift: isize = 0;
        for edit in edits {
            if edit.start > offset || (edit.start == offset && edit.end > offset) {
                break;
            }
            if offset < edit.end {
                return (edit.start as isize + shift) as usize;
            }
            shift += edit.replacement.len() as isize - (edit.end - edit.start) as isize;
        }
        (offset as isize + shift) as usize
    }
}

/// Two edits touched the same text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlappingEdits {
    pub first: Span,
    pub second: Span,
}

/// Collects edits and applies them in one pass.
///
/// Edits are expressed against the original text, so no edit sees another's
/// shifted offsets. Insertions at the same offset keep the order they were
/// added in and come before a replacement starting there.
#[derive(Debug)]
pub struct Rewriter<'s> {
    source: &'s str,
    edits: Vec<Edit>,
}

impl<'s> Rewriter<'s> {
    pub fn new(source: &'s str) -> Self {
        Self {
            source,
            edits: Vec::new(),
        }
    }

    pub fn replace(&mut self, span: Span, replacement: impl Into<String>) {
        self.edits.push(Edit {
            start: span.start,
            end: span.end,
            replacement: replacement.into(),
        });
    }

    pub fn insert(&mut self, at: usize, text: impl Into<String>) {
        self.replace(Span::new(at, at), text);
    }

    pub fn remove(&mut self, span: Span) {
        self.replace(span, String::new());
    }

    /// Removes `span` together with the whitespace directly before it.
    pub fn remove_with_leading_space(&mut self, span: Span) {
        let before = &self.source[..span.start];
        let start = before.trim_end().len();
        self.remove(Span::new(start, span.end));
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    /// Applies every edit, returning the new text and the sorted edits.
    pub fn finish(mut self) -> Result<(String, Vec<Edit>), OverlappingEdits> {
        // stable: equal keys keep insertion order
        self.edits.sort_by(|a, b| match a.start.cmp(&b.start) {
            Ordering::Equal => (a.end > a.start).cmp(&(b.end > b.start)),
            other => other,
        });

        for pair in self.edits.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            if b.start < a.end {
                return Err(OverlappingEdits {
                    first: Span::new(a.start, a.end),
                    second: Span::new(b.start, b.end),
                });
            }
        }

        let added: usize = self.edits.iter().map(|e| e.replacement.len()).sum();
        let mut out = String::with_capacity(self.source.len() + added);
        let mut cursor = 0;
        for edit in &self.edits {
            out.push_str(&self.source[cursor..edit.start]);
            out.push_str(&edit.replacement);
            cursor = edit.end;
        }
        out.push_str(&self.source[cursor..]);
        Ok((out, self.edits))
    }
}

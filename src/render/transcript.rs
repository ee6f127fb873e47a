//! Append-only chat transcript.

use std::ops::Range;

use super::style::TextStyle;

/// A run of text sharing one style.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub text: String,
    pub style: TextStyle,
}

/// Ordered, append-only record of rendered chat content.
///
/// Text is only ever inserted at the tail. `cursor` is the end-of-content
/// position in characters and always equals the total length.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    spans: Vec<Span>,
    entries: Vec<Range<usize>>,
    cursor: usize,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one rendered message made of `parts`. Returns the span range
    /// it occupies.
    pub(crate) fn append_entry<I>(&mut self, parts: I) -> Range<usize>
    where
        I: IntoIterator<Item = Span>,
    {
        let start = self.spans.len();
        for span in parts {
            if span.text.is_empty() {
                continue;
            }
            self.cursor += span.text.chars().count();
            self.spans.push(span);
        }
        let range = start..self.spans.len();
        self.entries.push(range.clone());
        range
    }

    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    /// Spans of the `index`-th rendered message.
    pub fn entry(&self, index: usize) -> Option<&[Span]> {
        self.entries.get(index).map(|r| &self.spans[r.clone()])
    }

    /// Number of rendered messages.
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Concatenated text of one rendered message.
    pub fn entry_text(&self, index: usize) -> Option<String> {
        self.entry(index)
            .map(|spans| spans.iter().map(|s| s.text.as_str()).collect())
    }

    /// End-of-content position, in characters.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Whole transcript as unstyled text.
    pub fn plain_text(&self) -> String {
        self.spans.iter().map(|s| s.text.as_str()).collect()
    }
}

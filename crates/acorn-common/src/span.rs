use std::fmt;

use serde::Serialize;

/// Byte-offset span into source text. Start is inclusive, end is exclusive.
///
/// All positions in the Acorn compiler are tracked as byte offsets into the
/// original source string. Human-readable line/column pairs are carried
/// alongside in [`SourceLocation`], which the lexer fills in as it goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    /// Create a new span from byte offsets.
    pub fn new(start: u32, end: u32) -> Self {
        debug_assert!(start <= end, "span start ({start}) must be <= end ({end})");
        Self { start, end }
    }

    /// Length of the span in bytes.
    pub fn len(&self) -> u32 {
        self.end - self.start
    }

    /// Whether the span is empty (zero-length).
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Merge two spans into one that covers both.
    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

/// Where a token (or the node built from it) came from.
///
/// Unlike [`Span`], a location is self-contained: it carries the offending
/// line's text so a diagnostic can be printed without re-reading the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceLocation {
    pub filename: String,
    /// 1-based line number.
    pub line_number: u32,
    /// 1-based column, measured in characters.
    pub column: u32,
    /// The full text of the line, without its trailing newline.
    pub line_text: String,
}

impl SourceLocation {
    pub fn new(filename: impl Into<String>, line_number: u32, column: u32, line_text: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            line_number,
            column,
            line_text: line_text.into(),
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.filename, self.line_number, self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_new_and_len() {
        let span = Span::new(5, 10);
        assert_eq!(span.len(), 5);
        assert!(!span.is_empty());
    }

    #[test]
    fn span_merge() {
        let merged = Span::new(5, 10).merge(Span::new(8, 15));
        assert_eq!(merged, Span::new(5, 15));
    }

    #[test]
    fn location_display() {
        let loc = SourceLocation::new("main.acorn", 3, 7, "let x = 1");
        assert_eq!(loc.to_string(), "main.acorn:3:7");
    }

}

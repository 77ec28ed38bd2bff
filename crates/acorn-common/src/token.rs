use std::fmt;

use serde::Serialize;

use crate::span::{SourceLocation, Span};

/// A token produced by the Acorn lexer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub span: Span,
    pub location: SourceLocation,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: impl Into<String>, span: Span, location: SourceLocation) -> Self {
        Self {
            kind,
            lexeme: lexeme.into(),
            span,
            location,
        }
    }
}

/// Every kind of token in the Acorn language.
///
/// This enum is the complete vocabulary for the lexer: structural tokens
/// (including the synthetic indentation pair), literals, delimiters, and the
/// keyword/name/operator identifier kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TokenKind {
    // ── Source structure ───────────────────────────────────────────────
    /// End of file.
    EndOfFile,
    /// Significant newline (statement terminator).
    Newline,
    /// Synthetic token opening an indented block.
    Indent,
    /// Synthetic token closing an indented block.
    Deindent,

    // ── Literals ───────────────────────────────────────────────────────
    /// Integer literal, e.g. `42`.
    IntLiteral,
    /// Floating-point literal, e.g. `3.14`.
    FloatLiteral,
    /// String literal between `"` characters. No escape processing.
    StringLiteral,

    // ── Delimiters ─────────────────────────────────────────────────────
    /// `[`
    OpenBracket,
    /// `]`
    CloseBracket,
    /// `(`
    OpenParenthesis,
    /// `)`
    CloseParenthesis,
    /// `{`
    OpenBrace,
    /// `}`
    CloseBrace,
    /// `,`
    Comma,
    /// `.`
    Dot,
    /// `:`
    Colon,
    /// `;`
    Semicolon,
    /// `=` not followed by `=`.
    Assignment,

    // ── Identifiers ────────────────────────────────────────────────────
    /// One of the reserved words in [`KEYWORDS`].
    Keyword,
    /// Regular identifier, e.g. `foo`, `my_var`.
    Name,
    /// Operator such as `+`, `<`, `==`.
    Operator,
}

impl TokenKind {
    /// Human-readable name for this kind of token. Never empty.
    pub fn as_str(self) -> &'static str {
        match self {
            TokenKind::EndOfFile => "end of file",
            TokenKind::Newline => "newline",
            TokenKind::Indent => "indent",
            TokenKind::Deindent => "deindent",
            TokenKind::IntLiteral => "integer",
            TokenKind::FloatLiteral => "float",
            TokenKind::StringLiteral => "string",
            TokenKind::OpenBracket => "[",
            TokenKind::CloseBracket => "]",
            TokenKind::OpenParenthesis => "(",
            TokenKind::CloseParenthesis => ")",
            TokenKind::OpenBrace => "{",
            TokenKind::CloseBrace => "}",
            TokenKind::Comma => ",",
            TokenKind::Dot => ".",
            TokenKind::Colon => ":",
            TokenKind::Semicolon => ";",
            TokenKind::Assignment => "=",
            TokenKind::Keyword => "keyword",
            TokenKind::Name => "name",
            TokenKind::Operator => "operator",
        }
    }

    /// All token kinds, in declaration order.
    pub fn all() -> &'static [TokenKind] {
        &[
            TokenKind::EndOfFile,
            TokenKind::Newline,
            TokenKind::Indent,
            TokenKind::Deindent,
            TokenKind::IntLiteral,
            TokenKind::FloatLiteral,
            TokenKind::StringLiteral,
            TokenKind::OpenBracket,
            TokenKind::CloseBracket,
            TokenKind::OpenParenthesis,
            TokenKind::CloseParenthesis,
            TokenKind::OpenBrace,
            TokenKind::CloseBrace,
            TokenKind::Comma,
            TokenKind::Dot,
            TokenKind::Colon,
            TokenKind::Semicolon,
            TokenKind::Assignment,
            TokenKind::Keyword,
            TokenKind::Name,
            TokenKind::Operator,
        ]
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The reserved words of the language, alphabetically.
pub const KEYWORDS: &[&str] = &[
    "as", "builtin", "case", "ccall", "def", "default", "else", "end", "for",
    "if", "import", "in", "inout", "let", "module", "mutable", "return",
    "spawn", "switch", "type", "using", "while",
];

/// Whether `s` is a reserved word.
///
/// The lexer calls this after scanning an identifier-shaped token to decide
/// between [`TokenKind::Keyword`] and [`TokenKind::Name`].
pub fn is_keyword(s: &str) -> bool {
    KEYWORDS.binary_search(&s).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span::{SourceLocation, Span};

    #[test]
    fn every_kind_has_a_nonempty_string() {
        for kind in TokenKind::all() {
            assert!(!kind.as_str().is_empty(), "{kind:?} has an empty display string");
        }
    }

    #[test]
    fn keywords_are_sorted_for_binary_search() {
        let mut sorted = KEYWORDS.to_vec();
        sorted.sort_unstable();
        assert_eq!(sorted, KEYWORDS);
    }

    #[test]
    fn is_keyword_recognizes_reserved_words() {
        for kw in KEYWORDS {
            assert!(is_keyword(kw), "{kw} should be a keyword");
        }
        assert!(!is_keyword("foo"));
        assert!(!is_keyword("Let")); // case-sensitive
        assert!(!is_keyword(""));
    }

    #[test]
    fn token_new_constructor() {
        let tok = Token::new(
            TokenKind::Name,
            "x",
            Span::new(4, 5),
            SourceLocation::new("main.acorn", 1, 5, "let x = 1"),
        );
        assert_eq!(tok.kind, TokenKind::Name);
        assert_eq!(tok.lexeme, "x");
        assert_eq!(tok.span, Span::new(4, 5));
    }
}

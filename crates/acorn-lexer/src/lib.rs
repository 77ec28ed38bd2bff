//! Acorn lexer: UTF-8 aware, indentation-sensitive tokenizer.
//!
//! Blocks in Acorn are bracketed by synthetic [`TokenKind::Indent`] and
//! [`TokenKind::Deindent`] tokens derived from a stack of indentation
//! widths, and statements are terminated by [`TokenKind::Newline`] tokens.
//! The lexer buffers the synthetic tokens in a deque so that a single
//! newline can fan out into several tokens.
//!
//! Errors are collected rather than aborting the scan, so a single run can
//! surface every lexical problem in a file.

mod cursor;

use std::collections::VecDeque;
use std::path::Path;

use acorn_common::diagnostics::{Diagnostic, DiagnosticKind};
use acorn_common::span::{SourceLocation, Span};
use acorn_common::token::{is_keyword, Token, TokenKind};

use cursor::Cursor;

/// Slurp a source file, producing a `FileNotFound` diagnostic on failure.
pub fn read_source(path: &Path) -> Result<String, Diagnostic> {
    std::fs::read_to_string(path).map_err(|_| {
        Diagnostic::new(
            DiagnosticKind::FileNotFound,
            format!("{}", path.display()),
            Span::new(0, 0),
            SourceLocation::new(path.display().to_string(), 1, 1, ""),
        )
    })
}

/// The Acorn lexer. Converts source text into a stream of tokens.
///
/// Implements `Iterator<Item = Token>`; the final item is always an
/// `EndOfFile` token, preceded by one `Deindent` per indentation level
/// still open.
pub struct Lexer<'src> {
    cursor: Cursor<'src>,
    filename: String,
    /// Tokens queued for emission before resuming the scan.
    pending: VecDeque<Token>,
    /// Stack of indentation column widths. The bottom entry is always 0.
    indentation: Vec<u32>,
    emitted_eof: bool,
    errors: Vec<Diagnostic>,
}

impl<'src> Lexer<'src> {
    /// Create a new lexer over the given source text.
    pub fn new(filename: impl Into<String>, source: &'src str) -> Self {
        Self {
            cursor: Cursor::new(source),
            filename: filename.into(),
            pending: VecDeque::new(),
            indentation: vec![0],
            emitted_eof: false,
            errors: Vec::new(),
        }
    }

    /// Convenience: tokenize an entire source string into a `Vec<Token>`.
    pub fn tokenize(filename: &str, source: &str) -> (Vec<Token>, Vec<Diagnostic>) {
        let mut lexer = Lexer::new(filename, source);
        let tokens: Vec<Token> = lexer.by_ref().collect();
        (tokens, lexer.errors)
    }

    /// Lexical errors collected so far.
    pub fn errors(&self) -> &[Diagnostic] {
        &self.errors
    }

    /// Drain the collected errors, leaving the lexer's error list empty.
    pub fn take_errors(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.errors)
    }

    // ── Token production ───────────────────────────────────────────────

    fn produce(&mut self) -> Token {
        if let Some(token) = self.pending.pop_front() {
            return token;
        }

        self.skip_insignificant();

        let start = self.cursor.pos();
        let location = self.here();

        let Some(c) = self.cursor.peek() else {
            return self.finish(start, location);
        };

        match c {
            '\n' => {
                self.cursor.bump();
                let token = self.token(TokenKind::Newline, start, location);
                self.measure_indentation();
                token
            }

            '[' => self.single(TokenKind::OpenBracket, start, location),
            ']' => self.single(TokenKind::CloseBracket, start, location),
            '(' => self.single(TokenKind::OpenParenthesis, start, location),
            ')' => self.single(TokenKind::CloseParenthesis, start, location),
            '{' => self.single(TokenKind::OpenBrace, start, location),
            '}' => self.single(TokenKind::CloseBrace, start, location),
            ',' => self.single(TokenKind::Comma, start, location),
            '.' => self.single(TokenKind::Dot, start, location),
            ':' => self.single(TokenKind::Colon, start, location),
            ';' => self.single(TokenKind::Semicolon, start, location),

            '=' => {
                self.cursor.bump();
                if self.cursor.peek() == Some('=') {
                    self.cursor.bump();
                    self.token(TokenKind::Operator, start, location)
                } else {
                    self.token(TokenKind::Assignment, start, location)
                }
            }

            '<' | '>' => {
                self.cursor.bump();
                if self.cursor.peek() == Some('=') {
                    self.cursor.bump();
                }
                self.token(TokenKind::Operator, start, location)
            }

            '!' => {
                self.cursor.bump();
                if self.cursor.peek() == Some('=') {
                    self.cursor.bump();
                    self.token(TokenKind::Operator, start, location)
                } else {
                    self.error_here("code", start, location);
                    self.produce()
                }
            }

            '+' | '-' | '*' | '/' | '%' | '|' => {
                self.cursor.bump();
                self.token(TokenKind::Operator, start, location)
            }

            '"' => self.lex_string(start, location),
            '0'..='9' => self.lex_number(start, location),
            c if is_name_start(c) => self.lex_name(start, location),

            _ => {
                self.cursor.bump();
                self.error_here("code", start, location);
                self.produce()
            }
        }
    }

    /// Skip spaces, tabs, comments and `\`-continuations between tokens.
    fn skip_insignificant(&mut self) {
        loop {
            self.cursor.eat_while(|c| c == ' ' || c == '\t' || c == '\u{c}');

            if self.cursor.peek() == Some('#') {
                self.cursor.eat_while(|c| c != '\n');
                continue;
            }

            // A backslash absorbs the following newline, indentation included.
            if self.cursor.peek() == Some('\\') {
                let start = self.cursor.pos();
                let location = self.here();
                self.cursor.bump();
                self.cursor.eat_while(|c| c == ' ' || c == '\t');
                if self.cursor.peek() == Some('#') {
                    self.cursor.eat_while(|c| c != '\n');
                }
                if self.cursor.peek() == Some('\n') {
                    self.cursor.bump();
                    self.cursor.eat_while(|c| c == ' ' || c == '\t');
                } else {
                    self.error_here("newline after '\\'", start, location);
                }
                continue;
            }

            break;
        }
    }

    /// Compare the indentation of the next non-blank line against the stack,
    /// queueing `Indent`/`Deindent` tokens as required.
    fn measure_indentation(&mut self) {
        let level = loop {
            let mut width = 0u32;
            while let Some(c) = self.cursor.peek() {
                if c == ' ' || c == '\t' {
                    self.cursor.bump();
                    width += 1;
                } else {
                    break;
                }
            }

            match self.cursor.peek() {
                // Blank and comment-only lines carry no indentation signal.
                Some('#') => {
                    self.cursor.eat_while(|c| c != '\n');
                }
                Some('\n') => {
                    self.cursor.bump();
                }
                // Deindents at end of input are flushed by `finish`.
                None => return,
                Some(_) => break width,
            }
        };

        let start = self.cursor.pos();
        let location = self.here();
        let current = *self.indentation.last().expect("indentation stack is never empty");

        if level > current {
            self.indentation.push(level);
            self.pending.push_back(Token::new(
                TokenKind::Indent,
                "",
                Span::new(start, start),
                location,
            ));
        } else if level < current {
            if !self.indentation.contains(&level) {
                self.error_here("indentation", start, location.clone());
                return;
            }
            while *self.indentation.last().unwrap() > level {
                self.indentation.pop();
                self.pending.push_back(Token::new(
                    TokenKind::Deindent,
                    "",
                    Span::new(start, start),
                    location.clone(),
                ));
            }
        }
    }

    /// Close open indentation levels and emit the end-of-file token.
    fn finish(&mut self, start: u32, location: SourceLocation) -> Token {
        while self.indentation.len() > 1 {
            self.indentation.pop();
            self.pending.push_back(Token::new(
                TokenKind::Deindent,
                "",
                Span::new(start, start),
                location.clone(),
            ));
        }
        self.pending.push_back(Token::new(
            TokenKind::EndOfFile,
            "",
            Span::new(start, start),
            location,
        ));
        self.pending
            .pop_front()
            .expect("the pending queue was just filled")
    }

    // ── Recognisers ────────────────────────────────────────────────────

    fn lex_name(&mut self, start: u32, location: SourceLocation) -> Token {
        self.cursor.eat_while(is_name_continue);
        let lexeme = self.cursor.slice(start, self.cursor.pos());
        let kind = if is_keyword(lexeme) {
            TokenKind::Keyword
        } else {
            TokenKind::Name
        };
        self.token(kind, start, location)
    }

    fn lex_number(&mut self, start: u32, location: SourceLocation) -> Token {
        self.cursor.eat_while(|c| c.is_ascii_digit());

        let mut kind = TokenKind::IntLiteral;
        if self.cursor.peek() == Some('.')
            && self.cursor.peek_second().is_some_and(|c| c.is_ascii_digit())
        {
            self.cursor.bump();
            self.cursor.eat_while(|c| c.is_ascii_digit());
            kind = TokenKind::FloatLiteral;
        }

        self.token(kind, start, location)
    }

    fn lex_string(&mut self, start: u32, location: SourceLocation) -> Token {
        self.cursor.bump(); // opening quote
        self.cursor.eat_while(|c| c != '"');

        if self.cursor.is_eof() {
            self.error_here("closing '\"'", start, location.clone());
        } else {
            self.cursor.bump(); // closing quote
        }

        // The lexeme is the content between the quotes, unprocessed.
        let end = self.cursor.pos();
        let inner = self
            .cursor
            .slice(start + 1, end.saturating_sub(1).max(start + 1));
        Token::new(
            TokenKind::StringLiteral,
            inner,
            Span::new(start, end),
            location,
        )
    }

    // ── Helpers ────────────────────────────────────────────────────────

    fn here(&self) -> SourceLocation {
        SourceLocation::new(
            self.filename.clone(),
            self.cursor.line(),
            self.cursor.column(),
            self.cursor.line_text(),
        )
    }

    fn single(&mut self, kind: TokenKind, start: u32, location: SourceLocation) -> Token {
        self.cursor.bump();
        self.token(kind, start, location)
    }

    fn token(&mut self, kind: TokenKind, start: u32, location: SourceLocation) -> Token {
        let end = self.cursor.pos();
        Token::new(kind, self.cursor.slice(start, end), Span::new(start, end), location)
    }

    fn error_here(&mut self, expectation: &str, start: u32, location: SourceLocation) {
        self.errors.push(Diagnostic::new(
            DiagnosticKind::Syntax,
            format!("Expected: {expectation}"),
            Span::new(start, self.cursor.pos().max(start + 1)),
            location,
        ));
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        if self.emitted_eof && self.pending.is_empty() {
            return None;
        }
        let token = self.produce();
        if token.kind == TokenKind::EndOfFile {
            self.emitted_eof = true;
        }
        Some(token)
    }
}

/// Whether `c` can start a name. Unicode letters and `_` qualify.
fn is_name_start(c: char) -> bool {
    c == '_' || c.is_alphabetic()
}

/// Whether `c` can continue a name.
fn is_name_continue(c: char) -> bool {
    c == '_' || c.is_alphanumeric()
}

//! Token plumbing and statement-level dispatch.
//!
//! The parser pulls tokens through a two-slot lookahead deque. Newlines are
//! dropped at intake (block structure is carried entirely by the synthetic
//! indentation tokens), and adjacent `Deindent`/`Indent` pairs are collapsed
//! by a peephole filter so `else` and `end` clauses at the enclosing level
//! do not appear re-indented.

mod expressions;
mod items;

use std::collections::VecDeque;

use acorn_common::diagnostics::{Diagnostic, DiagnosticKind, Reporter};
use acorn_common::token::{Token, TokenKind};
use acorn_lexer::Lexer;
use rustc_hash::FxHashMap;

use crate::ast::{Expr, ExprKind, NodeIdGen};

pub(crate) struct Parser<'src, 'ctx> {
    lexer: Lexer<'src>,
    tokens: VecDeque<Token>,
    /// The end-of-file token, kept around to pad the lookahead window.
    eof: Option<Token>,
    pub(crate) ids: &'ctx mut NodeIdGen,
    pub(crate) reporter: &'ctx mut Reporter,
    /// Binary operator precedence, keyed by lexeme. Mutable by design:
    /// unknown operators default to the lowest tier.
    precedence: FxHashMap<String, i32>,
}

impl<'src, 'ctx> Parser<'src, 'ctx> {
    pub(crate) fn new(
        filename: &str,
        source: &'src str,
        ids: &'ctx mut NodeIdGen,
        reporter: &'ctx mut Reporter,
    ) -> Self {
        let mut precedence = FxHashMap::default();
        for (op, level) in [
            ("=", 0),
            ("|", 1),
            ("==", 2),
            ("!=", 2),
            ("<", 2),
            ("<=", 2),
            (">", 2),
            (">=", 2),
            ("+", 3),
            ("-", 3),
            ("*", 4),
            ("/", 4),
            ("%", 4),
        ] {
            precedence.insert(op.to_string(), level);
        }

        Self {
            lexer: Lexer::new(filename, source),
            tokens: VecDeque::new(),
            eof: None,
            ids,
            reporter,
            precedence,
        }
    }

    pub(crate) fn precedence_of(&self, lexeme: &str) -> i32 {
        self.precedence.get(lexeme).copied().unwrap_or(0)
    }

    // ── Token plumbing ─────────────────────────────────────────────────

    /// Pull the next non-newline token from the lexer, if any.
    fn pull(&mut self) -> Option<Token> {
        for token in self.lexer.by_ref() {
            if token.kind == TokenKind::Newline {
                continue;
            }
            if token.kind == TokenKind::EndOfFile {
                self.eof = Some(token.clone());
            }
            return Some(token);
        }
        None
    }

    /// Keep the two-token lookahead window full, collapsing adjacent
    /// `Deindent`/`Indent` pairs as they surface.
    fn fill(&mut self) {
        loop {
            while self.tokens.len() < 2 {
                match self.pull() {
                    Some(token) => self.tokens.push_back(token),
                    None => match &self.eof {
                        Some(eof) => self.tokens.push_back(eof.clone()),
                        // Lexers always end with EndOfFile; an empty source
                        // still produces one.
                        None => return,
                    },
                }
            }

            if self.tokens[0].kind == TokenKind::Deindent
                && self.tokens[1].kind == TokenKind::Indent
            {
                self.tokens.pop_front();
                self.tokens.pop_front();
                continue;
            }

            return;
        }
    }

    pub(crate) fn front(&mut self) -> &Token {
        self.fill();
        &self.tokens[0]
    }

    pub(crate) fn second(&mut self) -> &Token {
        self.fill();
        &self.tokens[1]
    }

    pub(crate) fn advance(&mut self) -> Token {
        self.fill();
        self.tokens.pop_front().expect("lookahead window is kept full")
    }

    pub(crate) fn is(&mut self, kind: TokenKind) -> bool {
        self.front().kind == kind
    }

    pub(crate) fn eat(&mut self, kind: TokenKind) -> bool {
        if self.is(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consume a token of the given kind or report a syntax error.
    pub(crate) fn expect(&mut self, kind: TokenKind) -> Option<Token> {
        let token = self.advance();
        if token.kind == kind {
            Some(token)
        } else {
            self.syntax_error(&token, kind.as_str());
            None
        }
    }

    pub(crate) fn is_keyword(&mut self, name: &str) -> bool {
        let token = self.front();
        token.kind == TokenKind::Keyword && token.lexeme == name
    }

    pub(crate) fn eat_keyword(&mut self, name: &str) -> bool {
        if self.is_keyword(name) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn expect_keyword(&mut self, name: &str) -> Option<Token> {
        let token = self.advance();
        if token.kind == TokenKind::Keyword && token.lexeme == name {
            Some(token)
        } else {
            self.syntax_error(&token, name);
            None
        }
    }

    pub(crate) fn syntax_error(&mut self, got: &Token, expectation: &str) {
        let shown = if got.lexeme.is_empty() {
            format!("({})", got.kind)
        } else {
            got.lexeme.clone()
        };
        self.reporter.report(Diagnostic::at_token(
            DiagnosticKind::Syntax,
            format!("Got: {shown}\nExpected: {expectation}"),
            got,
        ));
    }

    /// Drain lexical errors into the reporter.
    pub(crate) fn flush_lexer_errors(&mut self) {
        for error in self.lexer.take_errors() {
            self.reporter.report(error);
        }
    }

    // ── File and block structure ───────────────────────────────────────

    /// Parse the whole token stream: leading imports, then top-level
    /// statements until end of file.
    ///
    /// Returns the import paths (with their tokens, for diagnostics) and
    /// the top-level block. `None` means a syntax error was reported and
    /// this translation unit is abandoned.
    pub(crate) fn parse(&mut self) -> Option<(Vec<(String, Token)>, Expr)> {
        let file_token = self.front().clone();

        let mut imports = Vec::new();
        while self.is_keyword("import") {
            let import_token = self.expect_keyword("import")?;
            let path = self.expect(TokenKind::StringLiteral)?;
            imports.push((path.lexeme, import_token));
        }

        let mut statements = Vec::new();
        while !self.is(TokenKind::EndOfFile) {
            let statement = self.read_expression()?;
            statements.push(statement);
        }

        let block = Expr::new(self.ids.fresh(), file_token, ExprKind::Block(statements));
        Some((imports, block))
    }

    /// Read an indented block: `Indent statement* Deindent`.
    ///
    /// The caller consumes whatever closes the construct (`end`, `else`).
    pub(crate) fn read_block(&mut self) -> Option<Expr> {
        let block_token = self.expect(TokenKind::Indent)?;

        let mut statements = Vec::new();
        while !self.is(TokenKind::Deindent) && !self.is(TokenKind::EndOfFile) {
            let statement = self.read_expression()?;
            statements.push(statement);
        }

        self.expect(TokenKind::Deindent)?;
        Some(Expr::new(
            self.ids.fresh(),
            block_token,
            ExprKind::Block(statements),
        ))
    }

    /// Read an indented block followed by the `end` keyword.
    pub(crate) fn read_block_to_end(&mut self) -> Option<Expr> {
        let block = self.read_block()?;
        self.expect_keyword("end")?;
        Some(block)
    }

    /// One expression-statement: a declaration keyword form or a
    /// unary-then-binary expression chain.
    pub(crate) fn read_expression(&mut self) -> Option<Expr> {
        if self.is_keyword("let") {
            self.read_let()
        } else if self.is_keyword("def") {
            self.read_def()
        } else if self.is_keyword("type") {
            self.read_type()
        } else if self.is_keyword("module") {
            self.read_module()
        } else {
            let unary = self.read_unary_expression()?;
            if self.is(TokenKind::Operator) || self.is(TokenKind::Assignment) {
                self.read_binary_expression(unary, 0)
            } else {
                Some(unary)
            }
        }
    }
}

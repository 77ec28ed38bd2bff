//! Diagnostics: error kinds, the reporter, and rendering.
//!
//! Every pass reports failures through a [`Reporter`] instead of propagating
//! them as control flow, so one run surfaces as many problems as possible.
//! The driver checks [`Reporter::has_errors`] at each pass boundary and
//! refuses to start the next pass if anything was recorded.

use std::fmt;
use std::ops::Range;

use ariadne::{Config, Label, Report, ReportKind, Source};
use serde::Serialize;

use crate::span::{SourceLocation, Span};
use crate::token::Token;

/// The closed set of error kinds the compiler can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DiagnosticKind {
    FileNotFound,
    Syntax,
    Undefined,
    Redefined,
    TooManyDefined,
    InvalidTypeConstructor,
    InvalidTypeParameters,
    TypeMismatch,
    TypeInference,
    ConstantAssignment,
    /// Reserved for invariant violations of the compiler itself.
    Internal,
}

impl DiagnosticKind {
    /// The header printed before the location, e.g. `Invalid syntax in ...`.
    pub fn prefix(self) -> &'static str {
        match self {
            DiagnosticKind::FileNotFound => "File not found",
            DiagnosticKind::Syntax => "Invalid syntax",
            DiagnosticKind::Undefined => "Undefined error",
            DiagnosticKind::Redefined => "Redefined error",
            DiagnosticKind::TooManyDefined => "Too many defined error",
            DiagnosticKind::InvalidTypeConstructor => "Invalid type",
            DiagnosticKind::InvalidTypeParameters => "Invalid type parameters",
            DiagnosticKind::TypeMismatch => "Invalid types",
            DiagnosticKind::TypeInference => "Type inference error",
            DiagnosticKind::ConstantAssignment => "Assignment to constant",
            DiagnosticKind::Internal => "Internal error",
        }
    }

    /// Stable error code for machine consumption.
    pub fn code(self) -> &'static str {
        match self {
            DiagnosticKind::FileNotFound => "E0001",
            DiagnosticKind::Syntax => "E0002",
            DiagnosticKind::Undefined => "E0003",
            DiagnosticKind::Redefined => "E0004",
            DiagnosticKind::TooManyDefined => "E0005",
            DiagnosticKind::InvalidTypeConstructor => "E0006",
            DiagnosticKind::InvalidTypeParameters => "E0007",
            DiagnosticKind::TypeMismatch => "E0008",
            DiagnosticKind::TypeInference => "E0009",
            DiagnosticKind::ConstantAssignment => "E0010",
            DiagnosticKind::Internal => "E9999",
        }
    }
}

/// A single reported problem: what kind, where, and a human-readable message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
    pub span: Span,
    pub location: SourceLocation,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, message: impl Into<String>, span: Span, location: SourceLocation) -> Self {
        Self {
            kind,
            message: message.into(),
            span,
            location,
        }
    }

    /// Build a diagnostic pointing at a token.
    pub fn at_token(kind: DiagnosticKind, message: impl Into<String>, token: &Token) -> Self {
        Self::new(kind, message, token.span, token.location.clone())
    }

    /// Render this diagnostic as an ariadne report against the source text.
    pub fn render(&self, source: &str) -> String {
        let span = clamp_range(self.span, source.len());
        let mut out = Vec::new();
        let _ = Report::<Range<usize>>::build(ReportKind::Error, span.clone())
            .with_config(Config::default().with_color(false))
            .with_code(self.kind.code())
            .with_message(self.kind.prefix())
            .with_label(Label::new(span).with_message(&self.message))
            .finish()
            .write(Source::from(source), &mut out);
        String::from_utf8_lossy(&out).into_owned()
    }
}

/// Ariadne needs spans that fall inside the source and are non-empty.
fn clamp_range(span: Span, source_len: usize) -> Range<usize> {
    let start = (span.start as usize).min(source_len);
    let end = (span.end as usize).min(source_len).max(start);
    if start == end {
        start..end.saturating_add(1).min(source_len.max(1))
    } else {
        start..end
    }
}

impl fmt::Display for Diagnostic {
    /// The classic self-contained format: header, offending line, caret.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} in {}", self.kind.prefix(), self.location)?;
        writeln!(f)?;
        writeln!(f, "    {}", self.location.line_text)?;
        let caret_indent = (self.location.column as usize).saturating_sub(1) + 4;
        writeln!(f, "{}^", " ".repeat(caret_indent))?;
        writeln!(f)?;
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for Diagnostic {}

/// Collects diagnostics across a compilation.
///
/// Shared by all passes of a single compilation; the driver owns it and
/// checks `has_errors` between passes.
#[derive(Debug, Default)]
pub struct Reporter {
    diagnostics: Vec<Diagnostic>,
}

impl Reporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a diagnostic.
    pub fn report(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// Whether any diagnostic has been recorded so far.
    pub fn has_errors(&self) -> bool {
        !self.diagnostics.is_empty()
    }

    /// All diagnostics recorded so far, in report order.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }
}

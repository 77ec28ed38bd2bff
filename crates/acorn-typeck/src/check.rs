//! The type checker: defence-in-depth verification of the inferrer's work.
//!
//! The checker never alters the tree or the tables. For every expression it
//! asserts that inference left a type behind (a missing type at this point
//! is a bug in the compiler, reported as an internal error), re-checks
//! assignment and declaration compatibility, and re-checks that selector
//! fields exist.

use acorn_common::diagnostics::{Diagnostic, DiagnosticKind, Reporter};
use acorn_parser::ast::{Expr, ExprKind, SourceFile};

use crate::ty::Ty;
use crate::TypeckContext;

/// Check a fully inferred file (imports first).
pub fn check(file: &SourceFile, ctx: &TypeckContext, reporter: &mut Reporter) {
    let mut checker = Checker { ctx, reporter };
    checker.check_source_file(file);
}

struct Checker<'a> {
    ctx: &'a TypeckContext,
    reporter: &'a mut Reporter,
}

impl Checker<'_> {
    fn check_source_file(&mut self, file: &SourceFile) {
        for import in &file.imports {
            self.check_source_file(import);
        }
        self.check_expr(&file.code);
    }

    fn check_not_null(&mut self, expr: &Expr) {
        if !self.ctx.types.contains_key(&expr.id) {
            self.reporter.report(Diagnostic::at_token(
                DiagnosticKind::Internal,
                format!("No type given for: {}", expr.token.kind),
                &expr.token,
            ));
        }
    }

    fn check_compatible(&mut self, got: Option<&Ty>, expected: Option<&Ty>, expr: &Expr) {
        if let (Some(got), Some(expected)) = (got, expected) {
            if !expected.is_compatible(got) {
                self.reporter.report(Diagnostic::at_token(
                    DiagnosticKind::TypeMismatch,
                    format!(
                        "Got: {}\nExpected: {}",
                        got.name(&self.ctx.registry),
                        expected.name(&self.ctx.registry)
                    ),
                    &expr.token,
                ));
            }
        }
    }

    fn check_expr(&mut self, expr: &Expr) {
        self.check_not_null(expr);

        match &expr.kind {
            ExprKind::Int(_)
            | ExprKind::Float(_)
            | ExprKind::Complex(_)
            | ExprKind::Str(_)
            | ExprKind::Name(_)
            | ExprKind::Import { .. } => {}

            ExprKind::List(elements) | ExprKind::Tuple(elements) => {
                for element in elements {
                    self.check_expr(element);
                }
            }
            ExprKind::Dictionary { keys, values } => {
                for expr in keys.iter().chain(values) {
                    self.check_expr(expr);
                }
            }

            ExprKind::Selector { operand, field } => {
                self.check_expr(operand);
                // Re-verify the field resolves on record operands.
                if let Some(Ty::Record(record)) = self.ctx.types.get(&operand.id) {
                    if record.field_index(field.value()).is_none() {
                        self.reporter.report(Diagnostic::at_token(
                            DiagnosticKind::TypeInference,
                            format!("{} has no field {}.", record.name, field.value()),
                            &field.token,
                        ));
                    }
                }
            }

            ExprKind::Call(call) => {
                self.check_expr(&call.operand);
                for argument in &call.positional {
                    self.check_expr(argument);
                }
                for (_, argument) in &call.keyword {
                    self.check_expr(argument);
                }
            }
            ExprKind::CCall(ccall) => {
                for argument in &ccall.arguments {
                    self.check_expr(argument);
                }
            }
            ExprKind::Cast { operand, .. } => self.check_expr(operand),

            ExprKind::Assignment { target, value } => {
                self.check_expr(value);
                let got = self.ctx.types.get(&value.id).cloned();
                let expected = self.ctx.types.get(&target.id).cloned();
                self.check_compatible(got.as_ref(), expected.as_ref(), expr);
            }

            ExprKind::While { condition, body } => {
                self.check_expr(condition);
                self.check_expr(body);
            }
            ExprKind::If {
                condition,
                true_case,
                false_case,
            } => {
                self.check_expr(condition);
                self.check_expr(true_case);
                if let Some(false_case) = false_case {
                    self.check_expr(false_case);
                }
            }
            ExprKind::Return(value) => self.check_expr(value),
            ExprKind::Spawn(call) => self.check_expr(call),
            ExprKind::Case {
                condition,
                assignment,
                body,
            } => {
                self.check_expr(condition);
                if let Some(assignment) = assignment {
                    self.check_expr(assignment);
                }
                self.check_expr(body);
            }
            ExprKind::Switch {
                subject,
                cases,
                default_case,
            } => {
                self.check_expr(subject);
                for case in cases {
                    self.check_expr(case);
                }
                if let Some(default_case) = default_case {
                    self.check_expr(default_case);
                }
            }

            ExprKind::Let {
                declaration,
                value,
                body,
            } => {
                if let Some(value) = value {
                    self.check_expr(value);
                    let got = self.ctx.types.get(&value.id).cloned();
                    let expected = self.ctx.types.get(&declaration.id).cloned();
                    self.check_compatible(got.as_ref(), expected.as_ref(), expr);
                }
                if let Some(body) = body {
                    self.check_expr(body);
                }
            }

            ExprKind::Def(holder) => {
                if let Some(body) = &holder.decl.body {
                    self.check_expr(body);
                }
            }
            ExprKind::TypeDef(_) => {}
            ExprKind::Module { body, .. } => self.check_expr(body),

            ExprKind::Block(statements) => {
                for statement in statements {
                    self.check_expr(statement);
                }
            }
        }
    }
}

//! Expression nodes.
//!
//! Acorn is expression-oriented: control flow, declarations, and blocks are
//! all expressions. The closed [`ExprKind`] enum is matched on by every
//! pass in place of a visitor interface.

use acorn_common::token::Token;

use super::item::{DeclHolder, DefDecl, TypeDecl, VarDecl};
use super::{Name, NodeId, NodeIdGen, ParamName, TypeName};

/// An expression node: identity, originating token, and the variant payload.
#[derive(Debug)]
pub struct Expr {
    pub id: NodeId,
    pub token: Token,
    pub kind: ExprKind,
}

#[derive(Debug)]
pub enum ExprKind {
    // ── Literals ───────────────────────────────────────────────────────
    Int(String),
    Float(String),
    /// Parsed but not emitted; the emitter reports an internal error.
    Complex(String),
    Str(String),
    List(Vec<Expr>),
    Tuple(Vec<Expr>),
    /// Parsed but not emitted.
    Dictionary { keys: Vec<Expr>, values: Vec<Expr> },

    // ── Names ──────────────────────────────────────────────────────────
    Name(ParamName),

    // ── Operations ─────────────────────────────────────────────────────
    /// `operand.field` — field read, module access, or constructor access.
    Selector { operand: Box<Expr>, field: ParamName },
    Call(Box<Call>),
    /// Foreign call: `ccall name(ParamTypes) as ReturnType using args`.
    CCall(Box<CCall>),
    /// `operand as TypeName`.
    Cast { operand: Box<Expr>, target: TypeName },
    /// Mutation of an existing binding: `x = value`.
    Assignment { target: ParamName, value: Box<Expr> },

    // ── Control flow ───────────────────────────────────────────────────
    While { condition: Box<Expr>, body: Box<Expr> },
    If {
        condition: Box<Expr>,
        true_case: Box<Expr>,
        false_case: Option<Box<Expr>>,
    },
    Return(Box<Expr>),
    /// Parsed but not emitted.
    Spawn(Box<Expr>),
    /// One arm of a `switch`. Parsed but not emitted.
    Case {
        condition: Box<Expr>,
        assignment: Option<Box<Expr>>,
        body: Box<Expr>,
    },
    /// Parsed but not emitted.
    Switch {
        subject: Box<Expr>,
        cases: Vec<Expr>,
        default_case: Option<Box<Expr>>,
    },

    // ── Declarations ───────────────────────────────────────────────────
    /// `let [mutable] name [as Type] = value`, with an optional indented body.
    Let {
        declaration: VarDecl,
        value: Option<Box<Expr>>,
        body: Option<Box<Expr>>,
    },
    Def(DeclHolder<DefDecl>),
    TypeDef(DeclHolder<TypeDecl>),
    Module { name: Name, body: Box<Expr> },
    /// Kept in the tree for fidelity; the importer records the loaded file
    /// on the enclosing `SourceFile`.
    Import { path: String },

    Block(Vec<Expr>),
}

/// A call expression: operand plus positional and keyword arguments.
#[derive(Debug)]
pub struct Call {
    pub operand: Expr,
    pub positional: Vec<Expr>,
    /// Keyword arguments in source order.
    pub keyword: Vec<(Name, Expr)>,
}

/// A foreign function call.
#[derive(Debug)]
pub struct CCall {
    pub name: Name,
    pub parameter_types: Vec<TypeName>,
    pub return_type: TypeName,
    pub arguments: Vec<Expr>,
}

impl Expr {
    pub fn new(id: NodeId, token: Token, kind: ExprKind) -> Self {
        Self { id, token, kind }
    }

    /// Deep clone with fresh node ids throughout the subtree.
    ///
    /// Tokens are preserved so diagnostics on the clone still point at the
    /// original source; decorations are not copied (they key off the ids).
    pub fn clone_with(&self, ids: &mut NodeIdGen) -> Expr {
        let kind = match &self.kind {
            ExprKind::Int(v) => ExprKind::Int(v.clone()),
            ExprKind::Float(v) => ExprKind::Float(v.clone()),
            ExprKind::Complex(v) => ExprKind::Complex(v.clone()),
            ExprKind::Str(v) => ExprKind::Str(v.clone()),
            ExprKind::List(elements) => {
                ExprKind::List(elements.iter().map(|e| e.clone_with(ids)).collect())
            }
            ExprKind::Tuple(elements) => {
                ExprKind::Tuple(elements.iter().map(|e| e.clone_with(ids)).collect())
            }
            ExprKind::Dictionary { keys, values } => ExprKind::Dictionary {
                keys: keys.iter().map(|e| e.clone_with(ids)).collect(),
                values: values.iter().map(|e| e.clone_with(ids)).collect(),
            },
            ExprKind::Name(name) => ExprKind::Name(name.clone_with(ids)),
            ExprKind::Selector { operand, field } => ExprKind::Selector {
                operand: Box::new(operand.clone_with(ids)),
                field: field.clone_with(ids),
            },
            ExprKind::Call(call) => ExprKind::Call(Box::new(Call {
                operand: call.operand.clone_with(ids),
                positional: call.positional.iter().map(|e| e.clone_with(ids)).collect(),
                keyword: call
                    .keyword
                    .iter()
                    .map(|(name, value)| (name.clone_with(ids), value.clone_with(ids)))
                    .collect(),
            })),
            ExprKind::CCall(ccall) => ExprKind::CCall(Box::new(CCall {
                name: ccall.name.clone_with(ids),
                parameter_types: ccall
                    .parameter_types
                    .iter()
                    .map(|t| t.clone_with(ids))
                    .collect(),
                return_type: ccall.return_type.clone_with(ids),
                arguments: ccall.arguments.iter().map(|e| e.clone_with(ids)).collect(),
            })),
            ExprKind::Cast { operand, target } => ExprKind::Cast {
                operand: Box::new(operand.clone_with(ids)),
                target: target.clone_with(ids),
            },
            ExprKind::Assignment { target, value } => ExprKind::Assignment {
                target: target.clone_with(ids),
                value: Box::new(value.clone_with(ids)),
            },
            ExprKind::While { condition, body } => ExprKind::While {
                condition: Box::new(condition.clone_with(ids)),
                body: Box::new(body.clone_with(ids)),
            },
            ExprKind::If {
                condition,
                true_case,
                false_case,
            } => ExprKind::If {
                condition: Box::new(condition.clone_with(ids)),
                true_case: Box::new(true_case.clone_with(ids)),
                false_case: false_case.as_ref().map(|e| Box::new(e.clone_with(ids))),
            },
            ExprKind::Return(value) => ExprKind::Return(Box::new(value.clone_with(ids))),
            ExprKind::Spawn(call) => ExprKind::Spawn(Box::new(call.clone_with(ids))),
            ExprKind::Case {
                condition,
                assignment,
                body,
            } => ExprKind::Case {
                condition: Box::new(condition.clone_with(ids)),
                assignment: assignment.as_ref().map(|e| Box::new(e.clone_with(ids))),
                body: Box::new(body.clone_with(ids)),
            },
            ExprKind::Switch {
                subject,
                cases,
                default_case,
            } => ExprKind::Switch {
                subject: Box::new(subject.clone_with(ids)),
                cases: cases.iter().map(|c| c.clone_with(ids)).collect(),
                default_case: default_case.as_ref().map(|e| Box::new(e.clone_with(ids))),
            },
            ExprKind::Let {
                declaration,
                value,
                body,
            } => ExprKind::Let {
                declaration: declaration.clone_with(ids),
                value: value.as_ref().map(|e| Box::new(e.clone_with(ids))),
                body: body.as_ref().map(|e| Box::new(e.clone_with(ids))),
            },
            ExprKind::Def(holder) => ExprKind::Def(holder.clone_with(ids)),
            ExprKind::TypeDef(holder) => ExprKind::TypeDef(holder.clone_with(ids)),
            ExprKind::Module { name, body } => ExprKind::Module {
                name: name.clone_with(ids),
                body: Box::new(body.clone_with(ids)),
            },
            ExprKind::Import { path } => ExprKind::Import { path: path.clone() },
            ExprKind::Block(statements) => {
                ExprKind::Block(statements.iter().map(|e| e.clone_with(ids)).collect())
            }
        };

        Expr {
            id: ids.fresh(),
            token: self.token.clone(),
            kind,
        }
    }
}

//! Declaration nodes: variables, functions, types, and the holder that
//! carries generic specialisations.

use acorn_common::token::Token;

use super::expr::Expr;
use super::{DeclName, Name, NodeId, NodeIdGen, TypeName};

/// A variable declaration: `[mutable] name [as Type]`.
///
/// The declaration name may introduce type parameters for generic variable
/// types; they populate the symbol's nested namespace.
#[derive(Debug)]
pub struct VarDecl {
    pub id: NodeId,
    pub token: Token,
    pub name: DeclName,
    pub given_type: Option<TypeName>,
    pub mutable: bool,
    pub builtin: bool,
}

impl VarDecl {
    pub fn clone_with(&self, ids: &mut NodeIdGen) -> VarDecl {
        VarDecl {
            id: ids.fresh(),
            token: self.token.clone(),
            name: self.name.clone_with(ids),
            given_type: self.given_type.as_ref().map(|t| t.clone_with(ids)),
            mutable: self.mutable,
            builtin: self.builtin,
        }
    }
}

/// One formal parameter of a `def`.
#[derive(Debug)]
pub struct Param {
    pub id: NodeId,
    pub token: Token,
    /// Caller passes a pointer to its storage instead of a value.
    pub inout: bool,
    pub name: Name,
    pub given_type: Option<TypeName>,
}

impl Param {
    pub fn clone_with(&self, ids: &mut NodeIdGen) -> Param {
        Param {
            id: ids.fresh(),
            token: self.token.clone(),
            inout: self.inout,
            name: self.name.clone_with(ids),
            given_type: self.given_type.as_ref().map(|t| t.clone_with(ids)),
        }
    }
}

/// A function (method) definition.
///
/// `builtin` definitions have no body; the emitter supplies one.
#[derive(Debug)]
pub struct DefDecl {
    pub id: NodeId,
    pub token: Token,
    pub name: DeclName,
    pub builtin: bool,
    pub parameters: Vec<Param>,
    pub given_return_type: Option<TypeName>,
    pub body: Option<Box<Expr>>,
}

impl DefDecl {
    pub fn clone_with(&self, ids: &mut NodeIdGen) -> DefDecl {
        DefDecl {
            id: ids.fresh(),
            token: self.token.clone(),
            name: self.name.clone_with(ids),
            builtin: self.builtin,
            parameters: self.parameters.iter().map(|p| p.clone_with(ids)).collect(),
            given_return_type: self.given_return_type.as_ref().map(|t| t.clone_with(ids)),
            body: self.body.as_ref().map(|b| Box::new(b.clone_with(ids))),
        }
    }
}

/// The three shapes a `type` declaration can take.
#[derive(Debug)]
pub enum TypeShape {
    /// `type builtin Name` — the constructor is supplied by the compiler.
    Builtin,
    /// `type Name as Other{...}`.
    Alias(TypeName),
    /// A record with named, typed fields.
    Record {
        field_names: Vec<Name>,
        field_types: Vec<TypeName>,
    },
}

impl TypeShape {
    pub fn clone_with(&self, ids: &mut NodeIdGen) -> TypeShape {
        match self {
            TypeShape::Builtin => TypeShape::Builtin,
            TypeShape::Alias(target) => TypeShape::Alias(target.clone_with(ids)),
            TypeShape::Record {
                field_names,
                field_types,
            } => TypeShape::Record {
                field_names: field_names.iter().map(|n| n.clone_with(ids)).collect(),
                field_types: field_types.iter().map(|t| t.clone_with(ids)).collect(),
            },
        }
    }
}

/// A type declaration.
#[derive(Debug)]
pub struct TypeDecl {
    pub id: NodeId,
    pub token: Token,
    pub name: DeclName,
    pub shape: TypeShape,
}

impl TypeDecl {
    pub fn clone_with(&self, ids: &mut NodeIdGen) -> TypeDecl {
        TypeDecl {
            id: ids.fresh(),
            token: self.token.clone(),
            name: self.name.clone_with(ids),
            shape: self.shape.clone_with(ids),
        }
    }
}

/// Wraps a declaration together with its generic specialisations.
///
/// The parser creates every holder with an empty specialisation list; the
/// generic reifier appends one [`SpecialisedDecl`] per substitution the
/// inferrer recorded on the declaration's method.
#[derive(Debug)]
pub struct DeclHolder<T> {
    pub decl: T,
    pub specialised: Vec<SpecialisedDecl<T>>,
}

impl<T> DeclHolder<T> {
    pub fn new(decl: T) -> Self {
        Self {
            decl,
            specialised: Vec::new(),
        }
    }
}

/// A clone of a generic declaration, tied to one recorded substitution.
///
/// The index refers into the specialisation list of the method the inferrer
/// attached the substitution to.
#[derive(Debug)]
pub struct SpecialisedDecl<T> {
    pub decl: T,
    pub specialisation_index: usize,
}

impl DeclHolder<DefDecl> {
    pub fn clone_with(&self, ids: &mut NodeIdGen) -> DeclHolder<DefDecl> {
        DeclHolder {
            decl: self.decl.clone_with(ids),
            specialised: self
                .specialised
                .iter()
                .map(|s| SpecialisedDecl {
                    decl: s.decl.clone_with(ids),
                    specialisation_index: s.specialisation_index,
                })
                .collect(),
        }
    }
}

impl DeclHolder<TypeDecl> {
    pub fn clone_with(&self, ids: &mut NodeIdGen) -> DeclHolder<TypeDecl> {
        DeclHolder {
            decl: self.decl.clone_with(ids),
            specialised: self
                .specialised
                .iter()
                .map(|s| SpecialisedDecl {
                    decl: s.decl.clone_with(ids),
                    specialisation_index: s.specialisation_index,
                })
                .collect(),
        }
    }
}

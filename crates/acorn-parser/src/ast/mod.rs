//! The typed Acorn AST.
//!
//! The tree is strictly owned: every node is owned by exactly one parent,
//! and cross-subtree references go through the symbol table, never through
//! node pointers. Later passes decorate nodes through side tables keyed by
//! [`NodeId`], so cloning a subtree with fresh ids (see the `clone_with`
//! methods) automatically leaves the clone undecorated while keeping its
//! tokens, which lets diagnostics on a clone point at the original source.

pub mod expr;
pub mod item;

use acorn_common::token::Token;

pub use expr::{Call, CCall, Expr, ExprKind};
pub use item::{DeclHolder, DefDecl, Param, SpecialisedDecl, TypeDecl, TypeShape, VarDecl};

/// Identity of an AST node, unique within one compilation.
///
/// Decoration tables (resolved types, call resolution) are keyed by this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

/// Allocator for [`NodeId`]s.
///
/// One generator lives for the whole compilation: the parser creates it, and
/// the generic reifier keeps drawing from it when cloning declarations.
#[derive(Debug, Default)]
pub struct NodeIdGen {
    next: u32,
}

impl NodeIdGen {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fresh(&mut self) -> NodeId {
        let id = NodeId(self.next);
        self.next += 1;
        id
    }
}

// ── Name flavours ──────────────────────────────────────────────────────
//
// Four kinds of name appear in the grammar:
//   Name      -- a bare identifier
//   TypeName  -- a type reference, optionally applied: `UnsafePointer{Integer64}`
//   DeclName  -- a declaration site introducing type parameters: `id{T}`
//   ParamName -- an identifier use that may carry type arguments: `id{Integer64}`

/// A bare identifier.
#[derive(Debug)]
pub struct Name {
    pub id: NodeId,
    pub token: Token,
    pub value: String,
}

impl Name {
    pub fn new(id: NodeId, token: Token) -> Self {
        let value = token.lexeme.clone();
        Self { id, token, value }
    }

    /// Deep clone with a fresh id. Token and value are preserved.
    pub fn clone_with(&self, ids: &mut NodeIdGen) -> Name {
        Name {
            id: ids.fresh(),
            token: self.token.clone(),
            value: self.value.clone(),
        }
    }
}

/// A reference to a type, with optional type parameters.
#[derive(Debug)]
pub struct TypeName {
    pub id: NodeId,
    pub token: Token,
    pub name: Name,
    pub parameters: Vec<TypeName>,
}

impl TypeName {
    pub fn clone_with(&self, ids: &mut NodeIdGen) -> TypeName {
        TypeName {
            id: ids.fresh(),
            token: self.token.clone(),
            name: self.name.clone_with(ids),
            parameters: self.parameters.iter().map(|p| p.clone_with(ids)).collect(),
        }
    }
}

/// A declaration-site name, listing the type parameters it introduces.
#[derive(Debug)]
pub struct DeclName {
    pub id: NodeId,
    pub token: Token,
    pub name: Name,
    /// Type parameters introduced by this declaration, e.g. `T` in `id{T}`.
    pub parameters: Vec<Name>,
}

impl DeclName {
    pub fn is_generic(&self) -> bool {
        !self.parameters.is_empty()
    }

    pub fn clone_with(&self, ids: &mut NodeIdGen) -> DeclName {
        DeclName {
            id: ids.fresh(),
            token: self.token.clone(),
            name: self.name.clone_with(ids),
            parameters: self.parameters.iter().map(|p| p.clone_with(ids)).collect(),
        }
    }
}

/// An identifier use in expression position, possibly with type arguments.
#[derive(Debug)]
pub struct ParamName {
    pub id: NodeId,
    pub token: Token,
    pub name: Name,
    pub parameters: Vec<TypeName>,
}

impl ParamName {
    pub fn value(&self) -> &str {
        &self.name.value
    }

    pub fn clone_with(&self, ids: &mut NodeIdGen) -> ParamName {
        ParamName {
            id: ids.fresh(),
            token: self.token.clone(),
            name: self.name.clone_with(ids),
            parameters: self.parameters.iter().map(|p| p.clone_with(ids)).collect(),
        }
    }
}

/// A parsed source file: its own code block plus transitively loaded imports.
#[derive(Debug)]
pub struct SourceFile {
    pub id: NodeId,
    pub token: Token,
    /// The path this file was loaded from.
    pub name: String,
    /// Imported files, depth-first, in import order.
    pub imports: Vec<SourceFile>,
    /// The top-level code block.
    pub code: Expr,
}

#[cfg(test)]
mod tests {
    use super::*;
    use acorn_common::span::{SourceLocation, Span};
    use acorn_common::token::TokenKind;

    fn name_token(lexeme: &str) -> Token {
        Token::new(
            TokenKind::Name,
            lexeme,
            Span::new(0, lexeme.len() as u32),
            SourceLocation::new("test.acorn", 1, 1, lexeme),
        )
    }

    #[test]
    fn clone_preserves_value_with_fresh_identity() {
        let mut ids = NodeIdGen::new();
        let original = Name::new(ids.fresh(), name_token("counter"));
        let clone = original.clone_with(&mut ids);

        assert_eq!(clone.value, original.value);
        assert_eq!(clone.token, original.token);
        assert_ne!(clone.id, original.id);
    }

    #[test]
    fn node_ids_are_sequential_and_unique() {
        let mut ids = NodeIdGen::new();
        let a = ids.fresh();
        let b = ids.fresh();
        assert_ne!(a, b);
        assert!(a < b);
    }

    #[test]
    fn type_name_clone_recurses_into_parameters() {
        let mut ids = NodeIdGen::new();
        let inner = TypeName {
            id: ids.fresh(),
            token: name_token("Integer64"),
            name: Name::new(ids.fresh(), name_token("Integer64")),
            parameters: vec![],
        };
        let outer = TypeName {
            id: ids.fresh(),
            token: name_token("UnsafePointer"),
            name: Name::new(ids.fresh(), name_token("UnsafePointer")),
            parameters: vec![inner],
        };

        let clone = outer.clone_with(&mut ids);
        assert_ne!(clone.id, outer.id);
        assert_eq!(clone.parameters.len(), 1);
        assert_ne!(clone.parameters[0].id, outer.parameters[0].id);
        assert_eq!(clone.parameters[0].name.value, "Integer64");
    }
}

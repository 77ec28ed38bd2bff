//! Declaration grammar: names, `let`, `def`, `type`, `module`.

use acorn_common::token::TokenKind;

use crate::ast::{
    DeclHolder, DeclName, DefDecl, Expr, ExprKind, Name, Param, ParamName, TypeDecl, TypeName,
    TypeShape, VarDecl,
};

use super::Parser;

impl Parser<'_, '_> {
    // ── Name flavours ──────────────────────────────────────────────────

    /// A bare identifier.
    pub(crate) fn read_plain_name(&mut self) -> Option<Name> {
        let token = self.expect(TokenKind::Name)?;
        Some(Name::new(self.ids.fresh(), token))
    }

    /// An operator token used as a name (declaration or selector position).
    pub(crate) fn read_operator_name(&mut self) -> Option<ParamName> {
        let token = self.expect(TokenKind::Operator)?;
        Some(ParamName {
            id: self.ids.fresh(),
            token: token.clone(),
            name: Name::new(self.ids.fresh(), token),
            parameters: Vec::new(),
        })
    }

    /// An identifier use with optional type arguments: `id{Integer64}`.
    pub(crate) fn read_param_name(&mut self) -> Option<ParamName> {
        let token = self.expect(TokenKind::Name)?;
        let name = Name::new(self.ids.fresh(), token.clone());
        let parameters = self.read_type_argument_list()?;
        Some(ParamName {
            id: self.ids.fresh(),
            token,
            name,
            parameters,
        })
    }

    /// A type reference with optional type parameters:
    /// `UnsafePointer{Integer64}`.
    pub(crate) fn read_type_name(&mut self) -> Option<TypeName> {
        let token = self.expect(TokenKind::Name)?;
        let name = Name::new(self.ids.fresh(), token.clone());
        let parameters = self.read_type_argument_list()?;
        Some(TypeName {
            id: self.ids.fresh(),
            token,
            name,
            parameters,
        })
    }

    fn read_type_argument_list(&mut self) -> Option<Vec<TypeName>> {
        let mut parameters = Vec::new();
        if self.eat(TokenKind::OpenBrace) {
            while !self.is(TokenKind::CloseBrace) {
                parameters.push(self.read_type_name()?);
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
            self.expect(TokenKind::CloseBrace)?;
        }
        Some(parameters)
    }

    /// A declaration-site name with optional introduced type parameters:
    /// `id{T}`. Operator tokens are accepted so operators can be overloaded.
    pub(crate) fn read_decl_name(&mut self) -> Option<DeclName> {
        let token = if self.is(TokenKind::Operator) {
            self.advance()
        } else {
            self.expect(TokenKind::Name)?
        };
        let name = Name::new(self.ids.fresh(), token.clone());

        let mut parameters = Vec::new();
        if self.eat(TokenKind::OpenBrace) {
            while !self.is(TokenKind::CloseBrace) {
                parameters.push(self.read_plain_name()?);
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
            self.expect(TokenKind::CloseBrace)?;
        }

        Some(DeclName {
            id: self.ids.fresh(),
            token,
            name,
            parameters,
        })
    }

    // ── let ────────────────────────────────────────────────────────────

    /// `let [builtin] [mutable] name{T...} [as Type] = expression`, with an
    /// optional indented body closed by `end`. Builtin declarations have no
    /// initialiser; the emitter supplies their values.
    pub(crate) fn read_let(&mut self) -> Option<Expr> {
        let let_token = self.expect_keyword("let")?;
        let builtin = self.eat_keyword("builtin");
        let mutable = self.eat_keyword("mutable");
        let name = self.read_decl_name()?;

        let given_type = if self.eat_keyword("as") || self.eat(TokenKind::Colon) {
            Some(self.read_type_name()?)
        } else {
            None
        };

        let value = if builtin {
            None
        } else {
            self.expect(TokenKind::Assignment)?;
            Some(Box::new(self.read_expression()?))
        };

        let body = if self.is(TokenKind::Indent) {
            Some(Box::new(self.read_block_to_end()?))
        } else {
            None
        };

        let declaration = VarDecl {
            id: self.ids.fresh(),
            token: let_token.clone(),
            name,
            given_type,
            mutable,
            builtin,
        };

        Some(Expr::new(
            self.ids.fresh(),
            let_token,
            ExprKind::Let {
                declaration,
                value,
                body,
            },
        ))
    }

    // ── def ────────────────────────────────────────────────────────────

    /// One formal parameter: `[inout] name [as Type]`.
    fn read_parameter(&mut self) -> Option<Param> {
        let token = self.front().clone();
        let inout = self.eat_keyword("inout");
        let name = self.read_plain_name()?;

        let given_type = if self.eat_keyword("as") {
            Some(self.read_type_name()?)
        } else {
            None
        };

        Some(Param {
            id: self.ids.fresh(),
            token,
            inout,
            name,
            given_type,
        })
    }

    /// `def [builtin] name{T...}(params) [as Type]` followed by an indented
    /// body and `end` for non-builtin definitions. Builtin definitions must
    /// state their return type and have no body.
    pub(crate) fn read_def(&mut self) -> Option<Expr> {
        let def_token = self.expect_keyword("def")?;
        let builtin = self.eat_keyword("builtin");
        let name = self.read_decl_name()?;

        let mut parameters = Vec::new();
        if self.eat(TokenKind::OpenParenthesis) {
            while !self.is(TokenKind::CloseParenthesis) {
                parameters.push(self.read_parameter()?);
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
            self.expect(TokenKind::CloseParenthesis)?;
        }

        let given_return_type = if builtin {
            self.expect_keyword("as")?;
            Some(self.read_type_name()?)
        } else if self.eat_keyword("as") {
            Some(self.read_type_name()?)
        } else {
            None
        };

        let body = if builtin {
            None
        } else {
            Some(Box::new(self.read_block_to_end()?))
        };

        let decl = DefDecl {
            id: self.ids.fresh(),
            token: def_token.clone(),
            name,
            builtin,
            parameters,
            given_return_type,
            body,
        };

        Some(Expr::new(
            self.ids.fresh(),
            def_token,
            ExprKind::Def(DeclHolder::new(decl)),
        ))
    }

    // ── type ───────────────────────────────────────────────────────────

    /// `type builtin Name`, `type Name as Alias`, or a record:
    ///
    /// ```text
    /// type Point
    ///     x as Integer64
    ///     y as Integer64
    /// end
    /// ```
    pub(crate) fn read_type(&mut self) -> Option<Expr> {
        let type_token = self.expect_keyword("type")?;
        let builtin = self.eat_keyword("builtin");
        let name = self.read_decl_name()?;

        let shape = if builtin {
            TypeShape::Builtin
        } else if self.eat_keyword("as") {
            TypeShape::Alias(self.read_type_name()?)
        } else {
            self.expect(TokenKind::Indent)?;

            let mut field_names = Vec::new();
            let mut field_types = Vec::new();
            while !self.is(TokenKind::Deindent) && !self.is(TokenKind::EndOfFile) {
                field_names.push(self.read_plain_name()?);
                self.expect_keyword("as")?;
                field_types.push(self.read_type_name()?);
            }

            self.expect(TokenKind::Deindent)?;
            self.expect_keyword("end")?;

            TypeShape::Record {
                field_names,
                field_types,
            }
        };

        let decl = TypeDecl {
            id: self.ids.fresh(),
            token: type_token.clone(),
            name,
            shape,
        };

        Some(Expr::new(
            self.ids.fresh(),
            type_token,
            ExprKind::TypeDef(DeclHolder::new(decl)),
        ))
    }

    // ── module ─────────────────────────────────────────────────────────

    pub(crate) fn read_module(&mut self) -> Option<Expr> {
        let module_token = self.expect_keyword("module")?;
        let name = self.read_plain_name()?;
        let body = self.read_block_to_end()?;

        Some(Expr::new(
            self.ids.fresh(),
            module_token,
            ExprKind::Module {
                name,
                body: Box::new(body),
            },
        ))
    }
}

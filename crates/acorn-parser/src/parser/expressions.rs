//! Expression-level grammar: literals, operators, calls, control flow.

use acorn_common::token::{Token, TokenKind};

use crate::ast::{Call, CCall, Expr, ExprKind, Name, ParamName, VarDecl};

use super::Parser;

impl Parser<'_, '_> {
    // ── Operator layers ────────────────────────────────────────────────

    /// A prefix operator application, or a plain operand.
    pub(crate) fn read_unary_expression(&mut self) -> Option<Expr> {
        if self.is(TokenKind::Operator) {
            let operator = self.read_operator_name()?;
            let argument = self.read_unary_expression()?;
            let token = operator.token.clone();
            let operand = Expr::new(
                self.ids.fresh(),
                token.clone(),
                ExprKind::Name(operator),
            );
            Some(Expr::new(
                self.ids.fresh(),
                token,
                ExprKind::Call(Box::new(Call {
                    operand,
                    positional: vec![argument],
                    keyword: Vec::new(),
                })),
            ))
        } else {
            self.read_operand_expression()
        }
    }

    /// The Pratt-style binary layer. `=` is the assignment form and binds
    /// loosest; it consumes the rest of the expression, making chained
    /// assignment right-associative.
    pub(crate) fn read_binary_expression(&mut self, mut lhs: Expr, min_precedence: i32) -> Option<Expr> {
        loop {
            let front = self.front().clone();
            let is_op = front.kind == TokenKind::Operator;
            let is_assign = front.kind == TokenKind::Assignment;
            if !is_op && !is_assign {
                break;
            }
            if self.precedence_of(&front.lexeme) < min_precedence {
                break;
            }

            if is_assign {
                self.advance();
                let target = match lhs.kind {
                    ExprKind::Name(name) => name,
                    _ => {
                        self.syntax_error(&front, "assignable name");
                        return None;
                    }
                };
                let value = self.read_expression()?;
                lhs = Expr::new(
                    self.ids.fresh(),
                    front,
                    ExprKind::Assignment {
                        target,
                        value: Box::new(value),
                    },
                );
                continue;
            }

            let operator = self.read_operator_name()?;
            let operator_precedence = self.precedence_of(operator.value());
            let mut rhs = self.read_operand_expression()?;

            loop {
                if !self.is(TokenKind::Operator) {
                    break;
                }
                let next_lexeme = self.front().lexeme.clone();
                let next_precedence = self.precedence_of(&next_lexeme);
                if next_precedence <= operator_precedence {
                    break;
                }
                rhs = self.read_binary_expression(rhs, next_precedence)?;
            }

            let op_token = operator.token.clone();
            let operand = Expr::new(
                self.ids.fresh(),
                op_token.clone(),
                ExprKind::Name(operator),
            );
            lhs = Expr::new(
                self.ids.fresh(),
                op_token,
                ExprKind::Call(Box::new(Call {
                    operand,
                    positional: vec![lhs, rhs],
                    keyword: Vec::new(),
                })),
            );
        }

        Some(lhs)
    }

    /// A primary expression followed by any chain of postfix forms:
    /// calls, index sugar, casts, and selectors.
    pub(crate) fn read_operand_expression(&mut self) -> Option<Expr> {
        let mut left = self.read_primary_expression()?;

        loop {
            if self.is(TokenKind::OpenParenthesis) {
                left = self.read_call(left)?;
            } else if self.is(TokenKind::OpenBracket) {
                left = self.read_index(left)?;
            } else if self.is_keyword("as") {
                left = self.read_cast(left)?;
            } else if self.is(TokenKind::Dot) {
                left = self.read_selector(left)?;
            } else {
                break;
            }
        }

        Some(left)
    }

    fn read_primary_expression(&mut self) -> Option<Expr> {
        if self.is(TokenKind::OpenParenthesis) {
            self.read_parenthesis_expression()
        } else if self.is(TokenKind::IntLiteral) {
            let token = self.advance();
            let value = token.lexeme.clone();
            Some(Expr::new(self.ids.fresh(), token, ExprKind::Int(value)))
        } else if self.is(TokenKind::FloatLiteral) {
            let token = self.advance();
            let value = token.lexeme.clone();
            Some(Expr::new(self.ids.fresh(), token, ExprKind::Float(value)))
        } else if self.is(TokenKind::StringLiteral) {
            let token = self.advance();
            let value = token.lexeme.clone();
            Some(Expr::new(self.ids.fresh(), token, ExprKind::Str(value)))
        } else if self.is(TokenKind::OpenBracket) {
            self.read_list()
        } else if self.is(TokenKind::OpenBrace) {
            self.read_dictionary()
        } else if self.is_keyword("while") {
            self.read_while()
        } else if self.is_keyword("for") {
            self.read_for()
        } else if self.is_keyword("if") {
            self.read_if()
        } else if self.is_keyword("switch") {
            self.read_switch()
        } else if self.is_keyword("return") {
            self.read_return()
        } else if self.is_keyword("spawn") {
            self.read_spawn()
        } else if self.is_keyword("ccall") {
            self.read_ccall()
        } else if self.is(TokenKind::Name) {
            let name = self.read_param_name()?;
            let token = name.token.clone();
            Some(Expr::new(self.ids.fresh(), token, ExprKind::Name(name)))
        } else {
            let token = self.front().clone();
            self.syntax_error(&token, "primary expression");
            None
        }
    }

    /// `( expr )` grouping, or `( expr, expr, ... )` tuple literal.
    fn read_parenthesis_expression(&mut self) -> Option<Expr> {
        let open = self.expect(TokenKind::OpenParenthesis)?;
        let first = self.read_expression()?;

        if !self.is(TokenKind::Comma) {
            self.expect(TokenKind::CloseParenthesis)?;
            return Some(first);
        }

        let mut elements = vec![first];
        while self.eat(TokenKind::Comma) {
            elements.push(self.read_expression()?);
        }
        self.expect(TokenKind::CloseParenthesis)?;
        Some(Expr::new(self.ids.fresh(), open, ExprKind::Tuple(elements)))
    }

    fn read_list(&mut self) -> Option<Expr> {
        let open = self.expect(TokenKind::OpenBracket)?;

        let mut elements = Vec::new();
        while !self.is(TokenKind::CloseBracket) {
            elements.push(self.read_expression()?);
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }

        self.expect(TokenKind::CloseBracket)?;
        Some(Expr::new(self.ids.fresh(), open, ExprKind::List(elements)))
    }

    fn read_dictionary(&mut self) -> Option<Expr> {
        let open = self.expect(TokenKind::OpenBrace)?;

        let mut keys = Vec::new();
        let mut values = Vec::new();
        while !self.is(TokenKind::CloseBrace) {
            keys.push(self.read_expression()?);
            self.expect(TokenKind::Colon)?;
            values.push(self.read_expression()?);
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }

        self.expect(TokenKind::CloseBrace)?;
        Some(Expr::new(
            self.ids.fresh(),
            open,
            ExprKind::Dictionary { keys, values },
        ))
    }

    // ── Postfix forms ──────────────────────────────────────────────────

    /// `operand(positional, keyword: value, ...)`. A keyword argument is
    /// recognised by a name directly followed by a colon.
    pub(crate) fn read_call(&mut self, operand: Expr) -> Option<Expr> {
        let call_token = self.expect(TokenKind::OpenParenthesis)?;

        let mut positional = Vec::new();
        let mut keyword = Vec::new();

        while !self.is(TokenKind::CloseParenthesis) {
            if self.is(TokenKind::Name) && self.second().kind == TokenKind::Colon {
                let name = self.read_plain_name()?;
                self.expect(TokenKind::Colon)?;
                let value = self.read_expression()?;
                keyword.push((name, value));
            } else {
                positional.push(self.read_expression()?);
            }

            if !self.eat(TokenKind::Comma) {
                break;
            }
        }

        self.expect(TokenKind::CloseParenthesis)?;
        Some(Expr::new(
            self.ids.fresh(),
            call_token,
            ExprKind::Call(Box::new(Call {
                operand,
                positional,
                keyword,
            })),
        ))
    }

    /// `a[i]` and `a[i] = v` desugar to `getindex`/`setindex` calls.
    fn read_index(&mut self, operand: Expr) -> Option<Expr> {
        let bracket = self.expect(TokenKind::OpenBracket)?;
        let index = self.read_expression()?;
        self.expect(TokenKind::CloseBracket)?;

        let mut arguments = vec![operand, index];
        let callee = if self.eat(TokenKind::Assignment) {
            arguments.push(self.read_expression()?);
            "setindex"
        } else {
            "getindex"
        };

        let callee_expr = self.synthetic_name(callee, &bracket);
        Some(Expr::new(
            self.ids.fresh(),
            bracket,
            ExprKind::Call(Box::new(Call {
                operand: callee_expr,
                positional: arguments,
                keyword: Vec::new(),
            })),
        ))
    }

    fn read_cast(&mut self, operand: Expr) -> Option<Expr> {
        let as_token = self.expect_keyword("as")?;
        let target = self.read_type_name()?;
        Some(Expr::new(
            self.ids.fresh(),
            as_token,
            ExprKind::Cast {
                operand: Box::new(operand),
                target,
            },
        ))
    }

    /// `operand.field`. A field may be an integer (tuple/record position),
    /// an operator, or a name with type arguments.
    fn read_selector(&mut self, operand: Expr) -> Option<Expr> {
        let dot = self.expect(TokenKind::Dot)?;

        let field = if self.is(TokenKind::IntLiteral) {
            let token = self.advance();
            ParamName {
                id: self.ids.fresh(),
                token: token.clone(),
                name: Name::new(self.ids.fresh(), token),
                parameters: Vec::new(),
            }
        } else if self.is(TokenKind::Operator) {
            self.read_operator_name()?
        } else {
            self.read_param_name()?
        };

        Some(Expr::new(
            self.ids.fresh(),
            dot,
            ExprKind::Selector {
                operand: Box::new(operand),
                field,
            },
        ))
    }

    // ── FFI ────────────────────────────────────────────────────────────

    /// `ccall name(Type, ...) as Type [using arg, ...]`.
    fn read_ccall(&mut self) -> Option<Expr> {
        let ccall_token = self.expect_keyword("ccall")?;
        let name = self.read_plain_name()?;

        self.expect(TokenKind::OpenParenthesis)?;
        let mut parameter_types = Vec::new();
        while !self.is(TokenKind::CloseParenthesis) {
            parameter_types.push(self.read_type_name()?);
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::CloseParenthesis)?;

        self.expect_keyword("as")?;
        let return_type = self.read_type_name()?;

        let mut arguments = Vec::new();
        if self.eat_keyword("using") {
            loop {
                arguments.push(self.read_expression()?);
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
        }

        Some(Expr::new(
            self.ids.fresh(),
            ccall_token,
            ExprKind::CCall(Box::new(CCall {
                name,
                parameter_types,
                return_type,
                arguments,
            })),
        ))
    }

    // ── Control flow ───────────────────────────────────────────────────

    fn read_while(&mut self) -> Option<Expr> {
        let while_token = self.expect_keyword("while")?;
        let condition = self.read_expression()?;
        let body = self.read_block_to_end()?;

        Some(Expr::new(
            self.ids.fresh(),
            while_token,
            ExprKind::While {
                condition: Box::new(condition),
                body: Box::new(body),
            },
        ))
    }

    /// `for x in e` desugars here, at parse time:
    ///
    /// ```text
    /// let <state> = start(e)
    /// while not(done(<state>))
    ///     let x = next(<state>)
    ///     <body>
    /// end
    /// ```
    fn read_for(&mut self) -> Option<Expr> {
        let for_token = self.expect_keyword("for")?;
        let variable = self.read_plain_name()?;
        self.expect_keyword("in")?;
        let iterable = self.read_expression()?;
        let body = self.read_block_to_end()?;

        let state_name = format!("__for_state_{}", self.ids.fresh().0);

        // let <state> = start(iterable)
        let start_call = self.synthetic_call("start", &for_token, vec![iterable]);
        let state_decl = Expr::new(
            self.ids.fresh(),
            for_token.clone(),
            ExprKind::Let {
                declaration: self.synthetic_var_decl(&state_name, &for_token),
                value: Some(Box::new(start_call)),
                body: None,
            },
        );

        // not(done(<state>))
        let state_ref = self.synthetic_name(&state_name, &for_token);
        let done_call = self.synthetic_call("done", &for_token, vec![state_ref]);
        let condition = self.synthetic_call("not", &for_token, vec![done_call]);

        // let x = next(<state>)
        let state_ref = self.synthetic_name(&state_name, &for_token);
        let next_call = self.synthetic_call("next", &for_token, vec![state_ref]);
        let item_decl = Expr::new(
            self.ids.fresh(),
            variable.token.clone(),
            ExprKind::Let {
                declaration: VarDecl {
                    id: self.ids.fresh(),
                    token: variable.token.clone(),
                    name: crate::ast::DeclName {
                        id: self.ids.fresh(),
                        token: variable.token.clone(),
                        name: variable,
                        parameters: Vec::new(),
                    },
                    given_type: None,
                    mutable: false,
                    builtin: false,
                },
                value: Some(Box::new(next_call)),
                body: None,
            },
        );

        let loop_body = match body.kind {
            ExprKind::Block(statements) => {
                let mut all = vec![item_decl];
                all.extend(statements);
                Expr::new(self.ids.fresh(), body.token, ExprKind::Block(all))
            }
            _ => unreachable!("read_block always produces a block"),
        };

        let while_loop = Expr::new(
            self.ids.fresh(),
            for_token.clone(),
            ExprKind::While {
                condition: Box::new(condition),
                body: Box::new(loop_body),
            },
        );

        Some(Expr::new(
            self.ids.fresh(),
            for_token,
            ExprKind::Block(vec![state_decl, while_loop]),
        ))
    }

    fn read_if(&mut self) -> Option<Expr> {
        let if_token = self.expect_keyword("if")?;
        let condition = self.read_expression()?;
        let true_case = self.read_block()?;

        let false_case = if self.eat_keyword("else") {
            if self.is_keyword("if") {
                // `else if` chains; the innermost `if` consumes the `end`.
                Some(self.read_if()?)
            } else {
                let block = self.read_block()?;
                self.expect_keyword("end")?;
                Some(block)
            }
        } else {
            self.expect_keyword("end")?;
            None
        };

        Some(Expr::new(
            self.ids.fresh(),
            if_token,
            ExprKind::If {
                condition: Box::new(condition),
                true_case: Box::new(true_case),
                false_case: false_case.map(Box::new),
            },
        ))
    }

    fn read_return(&mut self) -> Option<Expr> {
        let return_token = self.expect_keyword("return")?;
        let value = self.read_expression()?;
        Some(Expr::new(
            self.ids.fresh(),
            return_token,
            ExprKind::Return(Box::new(value)),
        ))
    }

    fn read_spawn(&mut self) -> Option<Expr> {
        let spawn_token = self.expect_keyword("spawn")?;
        let call = self.read_expression()?;

        if !matches!(call.kind, ExprKind::Call(_)) {
            self.syntax_error(&call.token.clone(), "function call");
            return None;
        }

        Some(Expr::new(
            self.ids.fresh(),
            spawn_token,
            ExprKind::Spawn(Box::new(call)),
        ))
    }

    fn read_case(&mut self) -> Option<Expr> {
        let case_token = self.expect_keyword("case")?;
        let condition = self.read_expression()?;

        let assignment = if self.eat_keyword("using") {
            Some(Box::new(self.read_expression()?))
        } else {
            None
        };

        let body = self.read_block()?;
        Some(Expr::new(
            self.ids.fresh(),
            case_token,
            ExprKind::Case {
                condition: Box::new(condition),
                assignment,
                body: Box::new(body),
            },
        ))
    }

    fn read_switch(&mut self) -> Option<Expr> {
        let switch_token = self.expect_keyword("switch")?;
        let subject = self.read_expression()?;

        let mut cases = Vec::new();
        while self.is_keyword("case") {
            cases.push(self.read_case()?);
        }

        let default_case = if self.eat_keyword("default") {
            Some(Box::new(self.read_block()?))
        } else {
            None
        };

        self.expect_keyword("end")?;
        Some(Expr::new(
            self.ids.fresh(),
            switch_token,
            ExprKind::Switch {
                subject: Box::new(subject),
                cases,
                default_case,
            },
        ))
    }

    // ── Synthetic nodes for desugaring ─────────────────────────────────

    pub(crate) fn synthetic_name(&mut self, value: &str, token: &Token) -> Expr {
        let name = ParamName {
            id: self.ids.fresh(),
            token: token.clone(),
            name: Name {
                id: self.ids.fresh(),
                token: token.clone(),
                value: value.to_string(),
            },
            parameters: Vec::new(),
        };
        Expr::new(self.ids.fresh(), token.clone(), ExprKind::Name(name))
    }

    fn synthetic_call(&mut self, callee: &str, token: &Token, arguments: Vec<Expr>) -> Expr {
        let operand = self.synthetic_name(callee, token);
        Expr::new(
            self.ids.fresh(),
            token.clone(),
            ExprKind::Call(Box::new(Call {
                operand,
                positional: arguments,
                keyword: Vec::new(),
            })),
        )
    }

    fn synthetic_var_decl(&mut self, name: &str, token: &Token) -> VarDecl {
        VarDecl {
            id: self.ids.fresh(),
            token: token.clone(),
            name: crate::ast::DeclName {
                id: self.ids.fresh(),
                token: token.clone(),
                name: Name {
                    id: self.ids.fresh(),
                    token: token.clone(),
                    value: name.to_string(),
                },
                parameters: Vec::new(),
            },
            given_type: None,
            mutable: false,
            builtin: false,
        }
    }
}

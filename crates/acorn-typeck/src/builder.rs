//! The symbol-table building pass.
//!
//! One walk over the AST that creates binding structure: a symbol per
//! declaration, nested namespaces for functions, types, modules, and
//! generic variables. No uses are resolved here; lookups happen in the
//! inferrer.
//!
//! Function declarations are special: the function symbol is looked up in
//! the current namespace *without* following parents (defining a function
//! shadows any outer binding of the same name rather than extending it),
//! and each `def` gets a method symbol inside the function's namespace,
//! keyed by a tag derived from the declaration's node id until the
//! inferrer renames it to the method's mangled name.

use acorn_common::diagnostics::{Diagnostic, DiagnosticKind, Reporter};
use acorn_parser::ast::{
    DefDecl, Expr, ExprKind, Name, Param, SourceFile, TypeDecl, TypeShape, VarDecl,
};

use crate::symtab::{ScopeId, Symbol, SymbolTable};
use crate::ty::{FunctionRegistry, Ty, TyCtor};
use crate::TypeckContext;

/// Build the symbol table for a parsed file (imports first).
pub fn build(file: &SourceFile, ctx: &mut TypeckContext, reporter: &mut Reporter) {
    let root = ctx.symtab.root();
    let mut builder = Builder {
        symtab: &mut ctx.symtab,
        registry: &mut ctx.registry,
        reporter,
        scopes: vec![root],
    };
    builder.visit_source_file(file);
}

pub(crate) struct Builder<'a> {
    pub(crate) symtab: &'a mut SymbolTable,
    pub(crate) registry: &'a mut FunctionRegistry,
    pub(crate) reporter: &'a mut Reporter,
    pub(crate) scopes: Vec<ScopeId>,
}

impl Builder<'_> {
    fn scope(&self) -> ScopeId {
        *self.scopes.last().expect("scope stack is never empty")
    }

    fn redefined(&mut self, name: &str, expr: &Expr) {
        self.reporter.report(Diagnostic::at_token(
            DiagnosticKind::Redefined,
            format!("{name} is already defined in this scope."),
            &expr.token,
        ));
    }

    fn visit_source_file(&mut self, file: &SourceFile) {
        for import in &file.imports {
            self.visit_source_file(import);
        }
        self.visit_expr(&file.code);
    }

    pub(crate) fn visit_expr(&mut self, expr: &Expr) {
        match &expr.kind {
            ExprKind::Let {
                declaration,
                value,
                body,
            } => {
                self.declare_var(declaration, expr);
                if let Some(value) = value {
                    self.visit_expr(value);
                }
                if let Some(body) = body {
                    self.visit_expr(body);
                }
            }

            ExprKind::Def(holder) => self.declare_def(&holder.decl, expr),
            ExprKind::TypeDef(holder) => self.declare_type(&holder.decl, expr),

            ExprKind::Module { name, body } => self.declare_module(name, body, expr),

            // Everything else introduces no bindings; walk children so
            // nested declarations inside values and bodies are seen.
            ExprKind::Block(statements) => {
                for statement in statements {
                    self.visit_expr(statement);
                }
            }
            ExprKind::List(elements) | ExprKind::Tuple(elements) => {
                for element in elements {
                    self.visit_expr(element);
                }
            }
            ExprKind::Dictionary { keys, values } => {
                for expr in keys.iter().chain(values) {
                    self.visit_expr(expr);
                }
            }
            ExprKind::Selector { operand, .. } => self.visit_expr(operand),
            ExprKind::Call(call) => {
                self.visit_expr(&call.operand);
                for argument in &call.positional {
                    self.visit_expr(argument);
                }
                for (_, argument) in &call.keyword {
                    self.visit_expr(argument);
                }
            }
            ExprKind::CCall(ccall) => {
                for argument in &ccall.arguments {
                    self.visit_expr(argument);
                }
            }
            ExprKind::Cast { operand, .. } => self.visit_expr(operand),
            ExprKind::Assignment { value, .. } => self.visit_expr(value),
            ExprKind::While { condition, body } => {
                self.visit_expr(condition);
                self.visit_expr(body);
            }
            ExprKind::If {
                condition,
                true_case,
                false_case,
            } => {
                self.visit_expr(condition);
                self.visit_expr(true_case);
                if let Some(false_case) = false_case {
                    self.visit_expr(false_case);
                }
            }
            ExprKind::Return(value) => self.visit_expr(value),
            ExprKind::Spawn(call) => self.visit_expr(call),
            ExprKind::Case {
                condition,
                assignment,
                body,
            } => {
                self.visit_expr(condition);
                if let Some(assignment) = assignment {
                    self.visit_expr(assignment);
                }
                self.visit_expr(body);
            }
            ExprKind::Switch {
                subject,
                cases,
                default_case,
            } => {
                self.visit_expr(subject);
                for case in cases {
                    self.visit_expr(case);
                }
                if let Some(default_case) = default_case {
                    self.visit_expr(default_case);
                }
            }

            ExprKind::Int(_)
            | ExprKind::Float(_)
            | ExprKind::Complex(_)
            | ExprKind::Str(_)
            | ExprKind::Name(_)
            | ExprKind::Import { .. } => {}
        }
    }

    // ── Declarations ───────────────────────────────────────────────────

    fn declare_var(&mut self, declaration: &VarDecl, expr: &Expr) {
        let mut symbol = Symbol::new(declaration.name.name.value.clone())
            .with_node(declaration.id);
        symbol.is_mutable = declaration.mutable;
        symbol.is_builtin = declaration.builtin;

        // Generic variable types get a nested namespace holding their
        // type parameters.
        if declaration.name.is_generic() {
            let nested = self.symtab.new_scope(self.scope());
            for parameter in &declaration.name.parameters {
                self.insert_type_parameter(nested, parameter, declaration.id);
            }
            symbol.scope = Some(nested);
        }

        let scope = self.scope();
        if self.symtab.insert(scope, symbol).is_err() {
            self.redefined(&declaration.name.name.value, expr);
        }
    }

    fn declare_def(&mut self, def: &DefDecl, expr: &Expr) {
        let function_name = def.name.name.value.clone();
        let scope = self.scope();

        // Find or create the function symbol in the current namespace,
        // deliberately not following parents: a new `def` here hides any
        // outer binding of the same name.
        let function_symbol = match self.symtab.lookup_local(scope, &function_name) {
            Some(id) => {
                if !matches!(self.symtab.symbol(id).ty, Some(Ty::Function(_))) {
                    self.redefined(&function_name, expr);
                    return;
                }
                id
            }
            None => {
                let function_id = self.registry.add_function(function_name.clone());
                let nested = self.symtab.new_scope(scope);
                let mut symbol = Symbol::new(function_name.clone()).with_ty(Ty::Function(function_id));
                symbol.scope = Some(nested);
                match self.symtab.insert(scope, symbol) {
                    Ok(id) => id,
                    Err(name) => {
                        self.redefined(&name, expr);
                        return;
                    }
                }
            }
        };

        let function_scope = self
            .symtab
            .symbol(function_symbol)
            .scope
            .expect("function symbols carry a namespace");

        // The method symbol, keyed by a unique tag until inference renames
        // it to the mangled signature. Its scope hangs off the *current*
        // namespace so the body sees enclosing bindings.
        let method_scope = self.symtab.new_scope(scope);
        let mut method_symbol = Symbol::new(format!("method${}", def.id.0)).with_node(def.id);
        method_symbol.scope = Some(method_scope);
        if self.symtab.insert(function_scope, method_symbol).is_err() {
            self.redefined(&function_name, expr);
            return;
        }

        self.scopes.push(method_scope);
        for parameter in &def.name.parameters {
            self.insert_type_parameter(method_scope, parameter, def.id);
        }
        for parameter in &def.parameters {
            self.declare_param(parameter);
        }
        if let Some(body) = &def.body {
            self.visit_expr(body);
        }
        self.scopes.pop();
    }

    pub(crate) fn declare_param(&mut self, parameter: &Param) {
        let scope = self.scope();
        let mut symbol = Symbol::new(parameter.name.value.clone()).with_node(parameter.id);
        // Inout parameters alias the caller's storage and are assignable.
        symbol.is_mutable = parameter.inout;
        if self.symtab.insert(scope, symbol).is_err() {
            self.reporter.report(Diagnostic::at_token(
                DiagnosticKind::Redefined,
                format!("{} is already defined in this scope.", parameter.name.value),
                &parameter.token,
            ));
        }
    }

    fn declare_type(&mut self, decl: &TypeDecl, expr: &Expr) {
        let nested = self.symtab.new_scope(self.scope());
        for parameter in &decl.name.parameters {
            self.insert_type_parameter(nested, parameter, decl.id);
        }

        if let TypeShape::Record { field_names, .. } = &decl.shape {
            for field in field_names {
                let symbol = Symbol::new(field.value.clone()).with_node(field.id);
                if self.symtab.insert(nested, symbol).is_err() {
                    self.redefined(&field.value, expr);
                }
            }
        }

        let mut symbol = Symbol::new(decl.name.name.value.clone()).with_node(decl.id);
        symbol.scope = Some(nested);
        let scope = self.scope();
        if self.symtab.insert(scope, symbol).is_err() {
            self.redefined(&decl.name.name.value, expr);
        }
    }

    fn declare_module(&mut self, name: &Name, body: &Expr, expr: &Expr) {
        let nested = self.symtab.new_scope(self.scope());
        let mut symbol = Symbol::new(name.value.clone()).with_node(expr.id);
        symbol.scope = Some(nested);

        let scope = self.scope();
        if self.symtab.insert(scope, symbol).is_err() {
            self.redefined(&name.value, expr);
            return;
        }

        self.scopes.push(nested);
        self.visit_expr(body);
        self.scopes.pop();
    }

    /// Bind a declaration-introduced type parameter as a constructor.
    fn insert_type_parameter(
        &mut self,
        scope: ScopeId,
        parameter: &Name,
        node: acorn_parser::ast::NodeId,
    ) {
        let symbol = Symbol::new(parameter.value.clone())
            .with_node(node)
            .with_ty(Ty::Constructor(Box::new(TyCtor::Parameter(
                parameter.value.clone(),
            ))));
        if self.symtab.insert(scope, symbol).is_err() {
            self.reporter.report(Diagnostic::at_token(
                DiagnosticKind::Redefined,
                format!("{} is already defined in this scope.", parameter.value),
                &parameter.token,
            ));
        }
    }
}

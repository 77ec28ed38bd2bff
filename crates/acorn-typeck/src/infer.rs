//! Type inference: assign a `Ty` to every expression, resolve calls to
//! methods, and collect generic specialisations.
//!
//! Inference is bottom-up and structural. Errors are reported to the
//! shared reporter and inference continues with the remaining siblings,
//! so one run surfaces as many problems as the tree allows. An expression
//! whose type could not be established simply has no entry in the type
//! table; the checker turns any survivors into internal errors, and the
//! driver's per-pass gate keeps such trees away from the emitter.

use rustc_hash::FxHashMap;

use acorn_common::diagnostics::{Diagnostic, DiagnosticKind, Reporter};
use acorn_common::token::Token;
use acorn_parser::ast::{
    DefDecl, Expr, ExprKind, ParamName, SourceFile, TypeDecl, TypeName, TypeShape, VarDecl,
};

use crate::symtab::{ScopeId, SymbolId};
use crate::ty::{
    AliasCtor, CreateError, MethodData, MethodRef, RecordCtor, RecordTy, Specialisation, Ty,
    TyCtor,
};
use crate::{CallResolution, TypeckContext};

/// Infer types for a parsed file (imports first).
pub fn infer(file: &SourceFile, ctx: &mut TypeckContext, reporter: &mut Reporter) {
    let root = ctx.symtab.root();
    let mut inferrer = Inferrer {
        ctx,
        reporter,
        scopes: vec![root],
        frames: Vec::new(),
    };
    inferrer.infer_source_file(file);
}

/// The function definition currently being inferred, for `return` checking.
struct Frame {
    return_type: Ty,
}

pub(crate) struct Inferrer<'a> {
    pub(crate) ctx: &'a mut TypeckContext,
    pub(crate) reporter: &'a mut Reporter,
    pub(crate) scopes: Vec<ScopeId>,
    frames: Vec<Frame>,
}

impl<'a> Inferrer<'a> {
    pub(crate) fn new(ctx: &'a mut TypeckContext, reporter: &'a mut Reporter, scope: ScopeId) -> Self {
        Inferrer {
            ctx,
            reporter,
            scopes: vec![scope],
            frames: Vec::new(),
        }
    }

    fn scope(&self) -> ScopeId {
        *self.scopes.last().expect("scope stack is never empty")
    }

    fn error(&mut self, kind: DiagnosticKind, message: impl Into<String>, token: &Token) {
        self.reporter
            .report(Diagnostic::at_token(kind, message, token));
    }

    fn set_type(&mut self, node: acorn_parser::ast::NodeId, ty: Ty) {
        self.ctx.types.insert(node, ty);
    }

    fn infer_source_file(&mut self, file: &SourceFile) {
        for import in &file.imports {
            self.infer_source_file(import);
        }
        let ty = self.infer_expr(&file.code).unwrap_or(Ty::Void);
        self.set_type(file.id, ty);
    }

    // ── Name and type resolution ───────────────────────────────────────

    fn lookup(&mut self, name: &str, token: &Token) -> Option<SymbolId> {
        match self.ctx.symtab.lookup(self.scope(), name) {
            Some(id) => Some(id),
            None => {
                self.error(
                    DiagnosticKind::Undefined,
                    format!("{name} is not defined in scope."),
                    token,
                );
                None
            }
        }
    }

    /// Resolve a type reference to a concrete instance: look the name up,
    /// expect a constructor, resolve child type names, instantiate.
    pub(crate) fn resolve_type_name(&mut self, type_name: &TypeName) -> Option<Ty> {
        let symbol = self.lookup(&type_name.name.value, &type_name.token)?;
        let symbol_ty = self.ctx.symtab.symbol(symbol).ty.clone();

        let Some(Ty::Constructor(ctor)) = symbol_ty else {
            self.error(
                DiagnosticKind::InvalidTypeConstructor,
                "This is not a type.",
                &type_name.token,
            );
            return None;
        };

        let mut parameters = Vec::with_capacity(type_name.parameters.len());
        for parameter in &type_name.parameters {
            parameters.push(self.resolve_type_name(parameter)?);
        }

        match ctor.create(&parameters) {
            Ok(ty) => {
                self.set_type(type_name.id, ty.clone());
                Some(ty)
            }
            Err(CreateError::Arity { given, expected }) => {
                self.error(
                    DiagnosticKind::InvalidTypeParameters,
                    format!("Got {given} parameters, but expected {expected}."),
                    &type_name.token,
                );
                None
            }
            Err(CreateError::NotConstructible) => {
                self.error(
                    DiagnosticKind::InvalidTypeConstructor,
                    "This type cannot be instantiated.",
                    &type_name.token,
                );
                None
            }
        }
    }

    /// Instantiate a nullary root-namespace constructor, for literals.
    fn find_type(&mut self, name: &str, token: &Token) -> Option<Ty> {
        let symbol = self.lookup(name, token)?;
        let symbol_ty = self.ctx.symtab.symbol(symbol).ty.clone();
        let Some(Ty::Constructor(ctor)) = symbol_ty else {
            self.error(
                DiagnosticKind::InvalidTypeConstructor,
                "This is not a type.",
                token,
            );
            return None;
        };
        match ctor.create(&[]) {
            Ok(ty) => Some(ty),
            Err(_) => {
                self.error(
                    DiagnosticKind::InvalidTypeConstructor,
                    "This type cannot be instantiated.",
                    token,
                );
                None
            }
        }
    }

    // ── Expressions ────────────────────────────────────────────────────

    pub(crate) fn infer_expr(&mut self, expr: &Expr) -> Option<Ty> {
        let ty = self.infer_expr_inner(expr)?;
        self.set_type(expr.id, ty.clone());
        Some(ty)
    }

    fn infer_expr_inner(&mut self, expr: &Expr) -> Option<Ty> {
        match &expr.kind {
            ExprKind::Int(_) => self.find_type("Integer", &expr.token),
            ExprKind::Float(_) => self.find_type("Float", &expr.token),
            ExprKind::Str(_) => self.find_type("String", &expr.token),
            ExprKind::Complex(_) => {
                self.error(
                    DiagnosticKind::TypeInference,
                    "Complex literals are not supported.",
                    &expr.token,
                );
                None
            }

            ExprKind::List(elements) => self.infer_list(elements, expr),
            ExprKind::Tuple(elements) => {
                let mut types = Vec::with_capacity(elements.len());
                for element in elements {
                    types.push(self.infer_expr(element)?);
                }
                Some(Ty::Tuple(types))
            }
            ExprKind::Dictionary { .. } => {
                self.error(
                    DiagnosticKind::TypeInference,
                    "Dictionary literals are not supported.",
                    &expr.token,
                );
                None
            }

            ExprKind::Name(name) => self.infer_name(name),

            ExprKind::Selector { operand, field } => self.infer_selector(operand, field, expr),
            ExprKind::Call(call) => {
                let operand_ty = self.infer_expr(&call.operand)?;

                let mut positional = Vec::with_capacity(call.positional.len());
                for argument in &call.positional {
                    positional.push(self.infer_expr(argument)?);
                }
                let mut keyword = Vec::with_capacity(call.keyword.len());
                for (name, argument) in &call.keyword {
                    keyword.push((name.value.clone(), self.infer_expr(argument)?));
                }

                match operand_ty {
                    Ty::Function(function) => {
                        self.resolve_call(expr, function, &positional, &keyword)
                    }
                    Ty::Constructor(ctor) => match *ctor {
                        TyCtor::Record(record) => {
                            self.resolve_call(expr, record.constructor, &positional, &keyword)
                        }
                        _ => {
                            self.not_callable(expr);
                            None
                        }
                    },
                    _ => {
                        self.not_callable(expr);
                        None
                    }
                }
            }
            ExprKind::CCall(ccall) => {
                let mut parameter_types = Vec::with_capacity(ccall.parameter_types.len());
                for parameter in &ccall.parameter_types {
                    parameter_types.push(self.resolve_type_name(parameter)?);
                }

                if ccall.arguments.len() != parameter_types.len() {
                    self.error(
                        DiagnosticKind::TypeMismatch,
                        format!(
                            "Got {} arguments, but expected {}.",
                            ccall.arguments.len(),
                            parameter_types.len()
                        ),
                        &expr.token,
                    );
                    return None;
                }

                for (argument, parameter) in ccall.arguments.iter().zip(&parameter_types) {
                    let argument_ty = self.infer_expr(argument)?;
                    if !parameter.is_compatible(&argument_ty) {
                        self.type_mismatch(&argument_ty, parameter, &argument.token);
                        return None;
                    }
                }

                self.resolve_type_name(&ccall.return_type)
            }
            ExprKind::Cast { operand, target } => {
                self.infer_expr(operand)?;
                self.resolve_type_name(target)
            }
            ExprKind::Assignment { target, value } => self.infer_assignment(target, value),

            ExprKind::While { condition, body } => {
                let condition_ty = self.infer_expr(condition)?;
                if !condition_ty.is_compatible(&Ty::Boolean) {
                    self.type_mismatch(&condition_ty, &Ty::Boolean, &condition.token);
                }
                self.infer_expr(body)
            }
            ExprKind::If {
                condition,
                true_case,
                false_case,
            } => {
                let condition_ty = self.infer_expr(condition)?;
                if !condition_ty.is_compatible(&Ty::Boolean) {
                    self.type_mismatch(&condition_ty, &Ty::Boolean, &condition.token);
                }
                let true_ty = self.infer_expr(true_case)?;
                if let Some(false_case) = false_case {
                    let false_ty = self.infer_expr(false_case)?;
                    if !true_ty.is_compatible(&false_ty) {
                        self.type_mismatch(&false_ty, &true_ty, &false_case.token);
                    }
                }
                Some(true_ty)
            }
            ExprKind::Return(value) => {
                let value_ty = self.infer_expr(value)?;
                match self.frames.last() {
                    Some(frame) => {
                        if !frame.return_type.is_compatible(&value_ty) {
                            let expected = frame.return_type.clone();
                            self.type_mismatch(&value_ty, &expected, &expr.token);
                        }
                    }
                    None => {
                        self.error(
                            DiagnosticKind::TypeMismatch,
                            "return outside of a function definition.",
                            &expr.token,
                        );
                    }
                }
                Some(value_ty)
            }
            ExprKind::Spawn(call) => self.infer_expr(call),
            ExprKind::Case {
                condition,
                assignment,
                body,
            } => {
                self.infer_expr(condition);
                if let Some(assignment) = assignment {
                    self.infer_expr(assignment);
                }
                self.infer_expr(body);
                Some(Ty::Void)
            }
            ExprKind::Switch {
                subject,
                cases,
                default_case,
            } => {
                self.infer_expr(subject);
                for case in cases {
                    self.infer_expr(case);
                }
                if let Some(default_case) = default_case {
                    self.infer_expr(default_case);
                }
                Some(Ty::Void)
            }

            ExprKind::Let {
                declaration,
                value,
                body,
            } => self.infer_let(declaration, value.as_deref(), body.as_deref()),
            ExprKind::Def(holder) => self.infer_def(expr, &holder.decl),
            ExprKind::TypeDef(holder) => self.infer_type_decl(expr, &holder.decl),
            ExprKind::Module { name, body } => {
                let symbol = self.lookup(&name.value, &name.token)?;
                let nested = self.ctx.symtab.symbol(symbol).scope?;
                self.ctx.symtab.symbol_mut(symbol).ty = Some(Ty::Module(nested));

                self.scopes.push(nested);
                self.infer_expr(body);
                self.scopes.pop();

                Some(Ty::Module(nested))
            }
            ExprKind::Import { .. } => Some(Ty::Void),

            ExprKind::Block(statements) => {
                let mut last = Some(Ty::Void);
                for statement in statements {
                    // Keep going after a failed statement so one run
                    // reports as much as possible.
                    last = self.infer_expr(statement).or(Some(Ty::Void));
                }
                last
            }
        }
    }

    /// Lists lower to a `{length, elements}` record; every element must be
    /// compatible with the first.
    fn infer_list(&mut self, elements: &[Expr], expr: &Expr) -> Option<Ty> {
        let mut element_ty: Option<Ty> = None;
        for element in elements {
            let ty = self.infer_expr(element)?;
            match &element_ty {
                None => element_ty = Some(ty),
                Some(first) => {
                    if !first.is_compatible(&ty) {
                        self.type_mismatch(&ty, first, &element.token);
                        return None;
                    }
                }
            }
        }

        let Some(element_ty) = element_ty else {
            self.error(
                DiagnosticKind::TypeInference,
                "Try specifying the type you want.",
                &expr.token,
            );
            return None;
        };

        Some(Ty::Record(RecordTy {
            name: "List".to_string(),
            field_names: vec!["length".to_string(), "elements".to_string()],
            field_types: vec![
                Ty::Integer(64),
                Ty::UnsafePointer(Box::new(element_ty)),
            ],
        }))
    }

    fn infer_name(&mut self, name: &ParamName) -> Option<Ty> {
        // Type arguments on value names are resolved for validity; method
        // selection still infers the substitution from argument types.
        for parameter in &name.parameters {
            self.resolve_type_name(parameter)?;
        }

        let symbol = self.lookup(name.value(), &name.token)?;
        match self.ctx.symtab.symbol(symbol).ty.clone() {
            Some(ty) => Some(ty),
            None => {
                self.error(
                    DiagnosticKind::Undefined,
                    format!("{} is not defined in scope.", name.value()),
                    &name.token,
                );
                None
            }
        }
    }

    fn infer_selector(&mut self, operand: &Expr, field: &ParamName, expr: &Expr) -> Option<Ty> {
        let operand_ty = self.infer_expr(operand)?;

        match operand_ty {
            Ty::Record(record) => match record.field_index(field.value()) {
                Some(index) => Some(record.field_types[index].clone()),
                None => {
                    self.error(
                        DiagnosticKind::TypeInference,
                        format!("{} has no field {}.", record.name, field.value()),
                        &field.token,
                    );
                    None
                }
            },
            Ty::Tuple(elements) => match field.value().parse::<usize>().ok() {
                Some(index) if index < elements.len() => Some(elements[index].clone()),
                _ => {
                    self.error(
                        DiagnosticKind::TypeInference,
                        format!("tuple has no field {}.", field.value()),
                        &field.token,
                    );
                    None
                }
            },
            Ty::Module(scope) => {
                let Some(symbol) = self.ctx.symtab.lookup_local(scope, field.value()) else {
                    self.error(
                        DiagnosticKind::Undefined,
                        format!("{} is not defined in this module.", field.value()),
                        &field.token,
                    );
                    return None;
                };
                self.ctx.symtab.symbol(symbol).ty.clone()
            }
            Ty::Constructor(ctor) => match (*ctor, field.value()) {
                (TyCtor::Record(record), "new") => Some(Ty::Function(record.constructor)),
                _ => {
                    self.error(
                        DiagnosticKind::TypeInference,
                        format!("type has no member {}.", field.value()),
                        &field.token,
                    );
                    None
                }
            },
            other => {
                let name = other.name(&self.ctx.registry);
                self.error(
                    DiagnosticKind::TypeInference,
                    format!("{} has no fields.", name),
                    &expr.token,
                );
                None
            }
        }
    }

    // ── Calls ──────────────────────────────────────────────────────────

    fn not_callable(&mut self, expr: &Expr) {
        self.error(
            DiagnosticKind::TypeMismatch,
            "Got: a value that is not callable\nExpected: a function or record constructor",
            &expr.token,
        );
    }

    fn resolve_call(
        &mut self,
        expr: &Expr,
        function: crate::ty::FunctionId,
        positional: &[Ty],
        keyword: &[(String, Ty)],
    ) -> Option<Ty> {
        let Some(method_index) = self
            .ctx
            .registry
            .function(function)
            .find_method(positional, keyword)
        else {
            let name = self.ctx.registry.function(function).name.clone();
            let signatures: Vec<String> = self
                .ctx
                .registry
                .function(function)
                .methods
                .iter()
                .map(|m| m.signature(&self.ctx.registry))
                .collect();
            let given: Vec<String> = positional
                .iter()
                .map(|ty| ty.name(&self.ctx.registry))
                .collect();
            self.error(
                DiagnosticKind::TypeMismatch,
                format!(
                    "Got: {name}({})\nExpected one of: {}",
                    given.join(", "),
                    signatures.join("; ")
                ),
                &expr.token,
            );
            return None;
        };

        let mref = MethodRef {
            function,
            index: method_index,
        };
        let method = self.ctx.registry.method(mref).clone();

        let mut specialisation_index = 0;
        let mut return_type = method.return_type.clone();

        if method.is_generic() {
            let Some(ordered) = method.ordered_arguments(positional, keyword) else {
                self.internal("resolved method no longer accepts its arguments", &expr.token);
                return None;
            };

            let mut substitution = FxHashMap::default();
            for (parameter, argument) in method.parameter_types.iter().zip(&ordered) {
                if !unify(parameter, argument, &mut substitution) {
                    self.error(
                        DiagnosticKind::TypeInference,
                        "Try specifying the type you want.",
                        &expr.token,
                    );
                    return None;
                }
            }

            let mut required = Vec::new();
            for parameter in &method.parameter_types {
                collect_parameters(parameter, &mut required);
            }
            collect_parameters(&method.return_type, &mut required);
            for name in &required {
                if !substitution.contains_key(name) {
                    self.error(
                        DiagnosticKind::TypeInference,
                        format!("could not infer type parameter {name}."),
                        &expr.token,
                    );
                    return None;
                }
            }

            // A call inside another generic body binds parameters to
            // parameters; it re-resolves with concrete types when the
            // enclosing clone is inferred, so only concrete substitutions
            // are recorded as specialisations.
            if substitution.values().any(Ty::is_abstract) {
                return_type = return_type.substitute(&substitution);
            } else {
                let mut specialisation: Specialisation = substitution
                    .iter()
                    .map(|(name, ty)| (name.clone(), ty.clone()))
                    .collect();
                specialisation.sort_by(|a, b| a.0.cmp(&b.0));

                specialisation_index = self
                    .ctx
                    .registry
                    .method_mut(mref)
                    .add_specialisation(specialisation);
                return_type = return_type.substitute(&substitution);
            }
        }

        self.ctx.calls.insert(
            expr.id,
            CallResolution {
                function,
                method_index,
                specialisation_index,
            },
        );
        Some(return_type)
    }

    // ── Assignments and declarations ───────────────────────────────────

    fn infer_assignment(&mut self, target: &ParamName, value: &Expr) -> Option<Ty> {
        let value_ty = self.infer_expr(value)?;

        let symbol_id = self.lookup(target.value(), &target.token)?;
        let symbol = self.ctx.symtab.symbol(symbol_id);
        let target_ty = symbol.ty.clone();
        let is_mutable = symbol.is_mutable;

        let Some(target_ty) = target_ty else {
            self.error(
                DiagnosticKind::Undefined,
                format!("{} is not defined in scope.", target.value()),
                &target.token,
            );
            return None;
        };

        if !is_mutable {
            self.error(
                DiagnosticKind::ConstantAssignment,
                format!("{} was not declared mutable.", target.value()),
                &target.token,
            );
        }

        if !target_ty.is_compatible(&value_ty) {
            self.type_mismatch(&value_ty, &target_ty, &value.token);
        }

        self.set_type(target.id, target_ty);
        Some(value_ty)
    }

    fn infer_let(
        &mut self,
        declaration: &VarDecl,
        value: Option<&Expr>,
        body: Option<&Expr>,
    ) -> Option<Ty> {
        let Some(symbol_id) = self.ctx.symtab.lookup_by_node(self.scope(), declaration.id) else {
            self.internal("variable declaration has no symbol", &declaration.token);
            return None;
        };

        let value_ty = match value {
            Some(value) => Some(self.infer_expr(value)?),
            None => None,
        };

        // Generic given types resolve inside the declaration's namespace.
        let given_ty = match &declaration.given_type {
            Some(given) => {
                if let Some(nested) = self.ctx.symtab.symbol(symbol_id).scope {
                    self.scopes.push(nested);
                    let ty = self.resolve_type_name(given);
                    self.scopes.pop();
                    Some(ty?)
                } else {
                    Some(self.resolve_type_name(given)?)
                }
            }
            None => None,
        };

        let ty = match (&given_ty, &value_ty) {
            (Some(given), Some(value)) => {
                if !given.is_compatible(value) {
                    self.type_mismatch(value, given, &declaration.token);
                }
                given.clone()
            }
            (Some(given), None) => given.clone(),
            (None, Some(value)) => value.clone(),
            (None, None) => {
                self.error(
                    DiagnosticKind::TypeInference,
                    "Try specifying the type you want.",
                    &declaration.token,
                );
                return None;
            }
        };

        self.ctx.symtab.symbol_mut(symbol_id).ty = Some(ty.clone());
        self.set_type(declaration.id, ty.clone());

        match body {
            Some(body) => self.infer_expr(body),
            None => Some(ty),
        }
    }

    fn infer_def(&mut self, expr: &Expr, def: &DefDecl) -> Option<Ty> {
        let function_name = def.name.name.value.clone();
        let function_symbol = self.lookup(&function_name, &def.token)?;
        let Some(Ty::Function(function)) = self.ctx.symtab.symbol(function_symbol).ty.clone()
        else {
            self.internal("function symbol lost its overload set", &def.token);
            return None;
        };
        let function_scope = self.ctx.symtab.symbol(function_symbol).scope?;

        let Some(method_symbol) = self.ctx.symtab.lookup_by_node(function_scope, def.id) else {
            self.internal("def has no method symbol", &def.token);
            return None;
        };
        let method_scope = self.ctx.symtab.symbol(method_symbol).scope?;

        self.scopes.push(method_scope);

        let mut names = Vec::with_capacity(def.parameters.len());
        let mut types = Vec::with_capacity(def.parameters.len());
        let mut inouts = Vec::with_capacity(def.parameters.len());
        for parameter in &def.parameters {
            let Some(given) = &parameter.given_type else {
                self.error(
                    DiagnosticKind::TypeInference,
                    format!("parameter {} needs a type.", parameter.name.value),
                    &parameter.token,
                );
                self.scopes.pop();
                return None;
            };
            let Some(parameter_ty) = self.resolve_type_name(given) else {
                self.scopes.pop();
                return None;
            };
            if let Some(symbol) = self.ctx.symtab.lookup_by_node(method_scope, parameter.id) {
                self.ctx.symtab.symbol_mut(symbol).ty = Some(parameter_ty.clone());
            }
            names.push(parameter.name.value.clone());
            types.push(parameter_ty);
            inouts.push(parameter.inout);
        }

        let return_type = match &def.given_return_type {
            Some(given) => match self.resolve_type_name(given) {
                Some(ty) => ty,
                None => {
                    self.scopes.pop();
                    return None;
                }
            },
            None => Ty::Void,
        };

        let mut method = MethodData::new(names, types, inouts, return_type.clone());
        method.builtin = def.builtin;
        method.decl = Some(def.id);

        let index = self.ctx.registry.function_mut(function).add_method(method);
        let mref = MethodRef { function, index };
        self.ctx.defs.insert(def.id, mref);

        let mangled = self
            .ctx
            .registry
            .method(mref)
            .mangled_name(&self.ctx.registry);
        if self
            .ctx
            .symtab
            .rename(function_scope, method_symbol, &mangled)
            .is_err()
        {
            self.error(
                DiagnosticKind::TooManyDefined,
                format!("{function_name} has multiple definitions."),
                &def.token,
            );
        }
        self.ctx.symtab.symbol_mut(method_symbol).ty = Some(Ty::Method(mref));

        self.frames.push(Frame {
            return_type: return_type.clone(),
        });
        if let Some(body) = &def.body {
            if let Some(body_ty) = self.infer_expr(body) {
                // The body's value is the implicit return.
                if return_type != Ty::Void && !return_type.is_compatible(&body_ty) {
                    self.type_mismatch(&body_ty, &return_type, &def.token);
                }
            }
        }
        self.frames.pop();
        self.scopes.pop();

        self.set_type(def.id, Ty::Method(mref));
        self.set_type(expr.id, Ty::Method(mref));
        Some(Ty::Method(mref))
    }

    fn infer_type_decl(&mut self, expr: &Expr, decl: &TypeDecl) -> Option<Ty> {
        let Some(symbol_id) = self.ctx.symtab.lookup_by_node(self.scope(), decl.id) else {
            self.internal("type declaration has no symbol", &decl.token);
            return None;
        };
        let nested = self.ctx.symtab.symbol(symbol_id).scope?;
        let type_name = decl.name.name.value.clone();
        let input_parameters: Vec<String> = decl
            .name
            .parameters
            .iter()
            .map(|p| p.value.clone())
            .collect();

        self.scopes.push(nested);

        let ctor = match &decl.shape {
            TypeShape::Builtin => match builtin_ctor_for(&type_name) {
                Some(ctor) => Some(ctor),
                None => {
                    self.error(
                        DiagnosticKind::InvalidTypeConstructor,
                        format!("{type_name} is not a known builtin type."),
                        &decl.token,
                    );
                    None
                }
            },
            TypeShape::Alias(target) => self.resolve_type_name(target).map(|target_ty| {
                TyCtor::Alias(AliasCtor {
                    name: type_name.clone(),
                    input_parameters: input_parameters.clone(),
                    target: target_ty,
                })
            }),
            TypeShape::Record {
                field_names,
                field_types,
            } => {
                let mut resolved = Vec::with_capacity(field_types.len());
                let mut ok = true;
                for field_type in field_types {
                    match self.resolve_type_name(field_type) {
                        Some(ty) => resolved.push(ty),
                        None => ok = false,
                    }
                }
                if ok {
                    let names: Vec<String> =
                        field_names.iter().map(|n| n.value.clone()).collect();

                    // The canonical constructor: one method taking the
                    // fields in order and returning the record.
                    let constructor = self.ctx.registry.add_function(type_name.clone());
                    let method = MethodData::new(
                        names.clone(),
                        resolved.clone(),
                        vec![false; resolved.len()],
                        Ty::Record(RecordTy {
                            name: type_name.clone(),
                            field_names: names.clone(),
                            field_types: resolved.clone(),
                        }),
                    );
                    self.ctx
                        .registry
                        .function_mut(constructor)
                        .add_method(method);

                    Some(TyCtor::Record(RecordCtor {
                        name: type_name.clone(),
                        input_parameters: input_parameters.clone(),
                        field_names: names,
                        field_types: resolved,
                        constructor,
                    }))
                } else {
                    None
                }
            }
        };

        self.scopes.pop();

        let ctor = ctor?;
        let ty = Ty::Constructor(Box::new(ctor));
        self.ctx.symtab.symbol_mut(symbol_id).ty = Some(ty.clone());
        self.set_type(decl.id, ty.clone());
        self.set_type(expr.id, ty.clone());
        Some(ty)
    }

    /// Infer the interior of a specialised clone: parameters resolve in a
    /// scope where the type parameters are bound to concrete types, and
    /// the return frame uses the substituted return type. Used by the
    /// generic reifier; does not add a method to the registry.
    pub(crate) fn infer_method_interior(
        &mut self,
        def: &DefDecl,
        mref: MethodRef,
        substitution: &FxHashMap<String, Ty>,
    ) {
        let method_scope = self.scope();

        for parameter in &def.parameters {
            let Some(given) = &parameter.given_type else {
                continue;
            };
            let Some(parameter_ty) = self.resolve_type_name(given) else {
                continue;
            };
            if let Some(symbol) = self.ctx.symtab.lookup_by_node(method_scope, parameter.id) {
                self.ctx.symtab.symbol_mut(symbol).ty = Some(parameter_ty);
            }
        }

        let return_type = self
            .ctx
            .registry
            .method(mref)
            .return_type
            .substitute(substitution);

        self.ctx.defs.insert(def.id, mref);
        self.set_type(def.id, Ty::Method(mref));

        self.frames.push(Frame { return_type });
        if let Some(body) = &def.body {
            self.infer_expr(body);
        }
        self.frames.pop();
    }

    // ── Error helpers ──────────────────────────────────────────────────

    fn type_mismatch(&mut self, got: &Ty, expected: &Ty, token: &Token) {
        let got = got.name(&self.ctx.registry);
        let expected = expected.name(&self.ctx.registry);
        self.error(
            DiagnosticKind::TypeMismatch,
            format!("Got: {got}\nExpected: {expected}"),
            token,
        );
    }

    fn internal(&mut self, message: &str, token: &Token) {
        self.error(DiagnosticKind::Internal, message.to_string(), token);
    }
}

/// Map a `type builtin` declaration name to its compiler-supplied
/// constructor.
fn builtin_ctor_for(name: &str) -> Option<TyCtor> {
    match name {
        "Void" => Some(TyCtor::Void),
        "Boolean" => Some(TyCtor::Boolean),
        "UnsafePointer" => Some(TyCtor::UnsafePointer),
        "Function" => Some(TyCtor::Function),
        "Method" => Some(TyCtor::Method),
        "Tuple" => Some(TyCtor::Tuple),
        "Type" => Some(TyCtor::TypeDescription),
        _ => {
            if let Some(size) = name.strip_prefix("UnsignedInteger") {
                return size.parse().ok().map(TyCtor::UnsignedInteger);
            }
            if let Some(size) = name.strip_prefix("Integer") {
                return size.parse().ok().map(TyCtor::Integer);
            }
            if let Some(size) = name.strip_prefix("Float") {
                return size.parse().ok().map(TyCtor::Float);
            }
            None
        }
    }
}

/// Structural unification of a declared parameter type against an argument
/// type, treating `Ty::Parameter` leaves as variables.
fn unify(parameter: &Ty, argument: &Ty, substitution: &mut FxHashMap<String, Ty>) -> bool {
    match (parameter, argument) {
        (Ty::Parameter(name), argument) => match substitution.get(name) {
            Some(bound) => bound.is_compatible(argument),
            None => {
                substitution.insert(name.clone(), argument.clone());
                true
            }
        },
        (Ty::UnsafePointer(a), Ty::UnsafePointer(b)) => unify(a, b, substitution),
        (Ty::Record(a), Ty::Record(b)) => {
            a.field_types.len() == b.field_types.len()
                && a.field_types
                    .iter()
                    .zip(&b.field_types)
                    .all(|(x, y)| unify(x, y, substitution))
        }
        (Ty::Tuple(a), Ty::Tuple(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| unify(x, y, substitution))
        }
        _ => parameter.is_compatible(argument),
    }
}

/// Collect the names of every parameter leaf in a type.
fn collect_parameters(ty: &Ty, out: &mut Vec<String>) {
    match ty {
        Ty::Parameter(name) => {
            if !out.contains(name) {
                out.push(name.clone());
            }
        }
        Ty::UnsafePointer(element) => collect_parameters(element, out),
        Ty::Record(record) => {
            for field in &record.field_types {
                collect_parameters(field, out);
            }
        }
        Ty::Tuple(elements) => {
            for element in elements {
                collect_parameters(element, out);
            }
        }
        _ => {}
    }
}

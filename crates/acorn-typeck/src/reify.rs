//! The generic reifier: materialise the specialisations collected during
//! inference as cloned declarations.
//!
//! The inferrer records substitutions on methods as call sites resolve;
//! this pass only *materialises* them. For each generic `def` and each of
//! its recorded specialisations, the declaration is deep-cloned (fresh
//! node ids, so no stale decorations), the clone gets a method scope in
//! which its type parameters are bound to the substitution's concrete
//! types, and its interior is re-inferred there. Identical substitutions
//! were already deduplicated by the method, so each clone corresponds to
//! exactly one emitted IR function.
//!
//! Re-inferring a clone body can resolve calls into *other* generic
//! methods and record fresh substitutions there, so the pass loops until
//! no unmaterialised specialisation remains.

use rustc_hash::FxHashMap;

use acorn_common::diagnostics::{Diagnostic, DiagnosticKind, Reporter};
use acorn_parser::ast::{
    DeclHolder, DefDecl, Expr, ExprKind, NodeIdGen, SourceFile, SpecialisedDecl,
};

use crate::builder::Builder;
use crate::infer::Inferrer;
use crate::symtab::{ScopeId, Symbol};
use crate::ty::{AliasCtor, MethodRef, Ty, TyCtor};
use crate::TypeckContext;

/// Upper bound on materialisation rounds. Real programs converge in a
/// handful; hitting this means the compiler is chasing its own tail.
const MAX_ROUNDS: usize = 32;

/// Materialise all recorded specialisations onto their declaration holders.
pub fn reify(
    file: &mut SourceFile,
    ids: &mut NodeIdGen,
    ctx: &mut TypeckContext,
    reporter: &mut Reporter,
) {
    for round in 0.. {
        if round == MAX_ROUNDS {
            reporter.report(Diagnostic::at_token(
                DiagnosticKind::Internal,
                "generic specialisation did not converge",
                &file.token,
            ));
            return;
        }

        let root = ctx.symtab.root();
        let mut reifier = Reifier {
            ctx: &mut *ctx,
            ids: &mut *ids,
            reporter: &mut *reporter,
            scopes: vec![root],
            changed: false,
        };
        reifier.walk_source_file(file);
        if !reifier.changed {
            break;
        }
    }
}

struct Reifier<'a> {
    ctx: &'a mut TypeckContext,
    ids: &'a mut NodeIdGen,
    reporter: &'a mut Reporter,
    scopes: Vec<ScopeId>,
    changed: bool,
}

impl Reifier<'_> {
    fn scope(&self) -> ScopeId {
        *self.scopes.last().expect("scope stack is never empty")
    }

    fn walk_source_file(&mut self, file: &mut SourceFile) {
        for import in &mut file.imports {
            self.walk_source_file(import);
        }
        self.walk_expr(&mut file.code);
    }

    fn walk_expr(&mut self, expr: &mut Expr) {
        match &mut expr.kind {
            ExprKind::Def(holder) => {
                if holder.decl.name.is_generic() {
                    self.materialise(holder);
                } else if holder.decl.body.is_some() {
                    // Walk the body for nested generic defs, inside the
                    // method's scope.
                    if let Some(method_scope) = self.method_scope_of(&holder.decl) {
                        self.scopes.push(method_scope);
                        if let Some(body) = &mut holder.decl.body {
                            self.walk_expr(body);
                        }
                        self.scopes.pop();
                    }
                }
            }

            ExprKind::Module { name, body } => {
                let module_scope = self
                    .ctx
                    .symtab
                    .lookup(self.scope(), &name.value)
                    .and_then(|id| self.ctx.symtab.symbol(id).scope);
                if let Some(module_scope) = module_scope {
                    self.scopes.push(module_scope);
                    self.walk_expr(body);
                    self.scopes.pop();
                }
            }

            ExprKind::Block(statements) => {
                for statement in statements {
                    self.walk_expr(statement);
                }
            }
            ExprKind::Let { value, body, .. } => {
                if let Some(value) = value {
                    self.walk_expr(value);
                }
                if let Some(body) = body {
                    self.walk_expr(body);
                }
            }
            ExprKind::If {
                condition,
                true_case,
                false_case,
            } => {
                self.walk_expr(condition);
                self.walk_expr(true_case);
                if let Some(false_case) = false_case {
                    self.walk_expr(false_case);
                }
            }
            ExprKind::While { condition, body } => {
                self.walk_expr(condition);
                self.walk_expr(body);
            }

            // Remaining forms cannot contain a `def`.
            _ => {}
        }
    }

    fn method_scope_of(&self, def: &DefDecl) -> Option<ScopeId> {
        let function_symbol = self.ctx.symtab.lookup(self.scope(), &def.name.name.value)?;
        let function_scope = self.ctx.symtab.symbol(function_symbol).scope?;
        let method_symbol = self.ctx.symtab.lookup_by_node(function_scope, def.id)?;
        self.ctx.symtab.symbol(method_symbol).scope
    }

    /// Ensure the holder carries one specialised clone per substitution
    /// recorded on its method.
    fn materialise(&mut self, holder: &mut DeclHolder<DefDecl>) {
        let Some(&mref) = self.ctx.defs.get(&holder.decl.id) else {
            // Inference failed on this def; nothing to materialise.
            return;
        };

        let total = self.ctx.registry.method(mref).specialisations.len();
        for index in 0..total {
            if holder
                .specialised
                .iter()
                .any(|s| s.specialisation_index == index)
            {
                continue;
            }

            let substitution: FxHashMap<String, Ty> = self.ctx.registry.method(mref).specialisations
                [index]
                .iter()
                .cloned()
                .collect();

            if let Some(clone) = self.specialise(&holder.decl, mref, &substitution) {
                holder.specialised.push(SpecialisedDecl {
                    decl: clone,
                    specialisation_index: index,
                });
                self.changed = true;
            }
        }
    }

    /// Clone the declaration and re-infer it with its type parameters
    /// bound to the substitution's concrete types.
    fn specialise(
        &mut self,
        def: &DefDecl,
        mref: MethodRef,
        substitution: &FxHashMap<String, Ty>,
    ) -> Option<DefDecl> {
        let clone = def.clone_with(self.ids);

        let function_symbol = self
            .ctx
            .symtab
            .lookup(self.scope(), &def.name.name.value)?;
        let function_scope = self.ctx.symtab.symbol(function_symbol).scope?;

        // A scope for the clone, hanging off the namespace that encloses
        // the original declaration.
        let method_scope = self.ctx.symtab.new_scope(self.scope());
        let mut method_symbol =
            Symbol::new(format!("spec${}", clone.id.0)).with_node(clone.id);
        method_symbol.scope = Some(method_scope);
        if self.ctx.symtab.insert(function_scope, method_symbol).is_err() {
            return None;
        }

        // Bind each type parameter to its concrete type, as a nullary
        // alias so type-name resolution lands on the substituted type.
        for parameter in &clone.name.parameters {
            let Some(bound) = substitution.get(&parameter.value) else {
                self.reporter.report(Diagnostic::at_token(
                    DiagnosticKind::TypeInference,
                    format!("could not infer type parameter {}.", parameter.value),
                    &parameter.token,
                ));
                return None;
            };
            let symbol = Symbol::new(parameter.value.clone())
                .with_node(clone.id)
                .with_ty(Ty::Constructor(Box::new(TyCtor::Alias(AliasCtor {
                    name: parameter.value.clone(),
                    input_parameters: Vec::new(),
                    target: bound.clone(),
                }))));
            if self.ctx.symtab.insert(method_scope, symbol).is_err() {
                return None;
            }
        }

        // Binding structure for the clone's parameters and body.
        {
            let mut builder = Builder {
                symtab: &mut self.ctx.symtab,
                registry: &mut self.ctx.registry,
                reporter: &mut *self.reporter,
                scopes: vec![method_scope],
            };
            for parameter in &clone.parameters {
                builder.declare_param(parameter);
            }
            if let Some(body) = &clone.body {
                builder.visit_expr(body);
            }
        }

        // Re-infer the clone interior with the bound parameters.
        let mut inferrer = Inferrer::new(self.ctx, self.reporter, method_scope);
        inferrer.infer_method_interior(&clone, mref, substitution);

        Some(clone)
    }
}

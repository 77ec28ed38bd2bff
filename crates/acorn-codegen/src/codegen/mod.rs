//! LLVM IR emission.
//!
//! The emitter walks the decorated AST and produces one LLVM module per
//! compilation. Three functions form the skeleton: `_init_variables_`
//! (stores for module-level variables and the builtin method tables),
//! `_user_code_` (the top-level block), and `main` (calls both, returns 0).
//!
//! Every function value is lowered as a *method table*: a global struct
//! whose element *i* is a struct whose element *j* is a pointer to the IR
//! function for overload *i* under its *j*-th specialisation. Definitions
//! store their function pointer into the appropriate slot; calls load it
//! back out using the `(method, specialisation)` pair the inferrer
//! recorded.

pub mod builtins;
pub mod expr;
pub mod types;

use std::path::Path;

use inkwell::basic_block::BasicBlock;
use inkwell::builder::Builder;
use inkwell::context::Context;
use inkwell::module::{Linkage, Module};
use inkwell::passes::PassBuilderOptions;
use inkwell::targets::{
    CodeModel, FileType, InitializationConfig, RelocMode, Target, TargetMachine, TargetTriple,
};
use inkwell::types::StructType;
use inkwell::values::{BasicValueEnum, FunctionValue, PointerValue};
use inkwell::OptimizationLevel;
use rustc_hash::FxHashMap;

use acorn_common::diagnostics::{Diagnostic, DiagnosticKind, Reporter};
use acorn_common::token::Token;
use acorn_parser::ast::{DeclHolder, DefDecl, Expr, ExprKind, SourceFile, TypeDecl, VarDecl};
use acorn_typeck::symtab::{ScopeId, SymbolId};
use acorn_typeck::ty::{FunctionId, MethodRef, Ty, TyCtor};
use acorn_typeck::TypeckContext;

use crate::mangle::{mangle, mangle_method};

/// How a symbol is backed at emission time.
pub(crate) enum Binding<'ctx> {
    /// Storage the symbol lives in (global or alloca) plus its type, for
    /// typed loads.
    Ptr(PointerValue<'ctx>, Ty),
    /// An immediate value (builtin `true`/`false`).
    Value(BasicValueEnum<'ctx>),
}

/// The LLVM emission context for one compilation.
pub struct Emitter<'ctx, 'a> {
    pub(crate) context: &'ctx Context,
    pub(crate) module: Module<'ctx>,
    pub(crate) builder: Builder<'ctx>,
    pub(crate) target_machine: TargetMachine,

    pub(crate) ctx: &'a mut TypeckContext,
    pub(crate) reporter: &'a mut Reporter,

    /// Mirror of the scope structure, for name resolution during emission.
    pub(crate) scopes: Vec<ScopeId>,
    /// Backing storage per symbol.
    pub(crate) bindings: FxHashMap<SymbolId, Binding<'ctx>>,
    /// Method-table globals per function, created on first use.
    tables: FxHashMap<FunctionId, (PointerValue<'ctx>, StructType<'ctx>)>,

    user_fn: FunctionValue<'ctx>,
    /// The block currently at the end of `_init_variables_`.
    init_block: BasicBlock<'ctx>,
}

impl<'ctx, 'a> Emitter<'ctx, 'a> {
    /// Create the emitter: target machine, module, and skeleton functions.
    pub fn new(
        context: &'ctx Context,
        module_name: &str,
        opt_level: u8,
        target_triple: Option<&str>,
        ctx: &'a mut TypeckContext,
        reporter: &'a mut Reporter,
    ) -> Result<Self, String> {
        Target::initialize_native(&InitializationConfig::default())
            .map_err(|e| format!("Failed to initialize native target: {}", e))?;

        let triple = match target_triple {
            Some(triple) => TargetTriple::create(triple),
            None => TargetMachine::get_default_triple(),
        };
        let target = Target::from_triple(&triple)
            .map_err(|e| format!("Invalid target triple '{}': {}", triple, e))?;
        let opt = match opt_level {
            0 => OptimizationLevel::None,
            1 => OptimizationLevel::Less,
            _ => OptimizationLevel::Default,
        };
        let target_machine = target
            .create_target_machine(&triple, "generic", "", opt, RelocMode::PIC, CodeModel::Default)
            .ok_or_else(|| format!("Failed to create target machine for '{}'", triple))?;

        let module = context.create_module(module_name);
        module.set_triple(&triple);
        let builder = context.create_builder();

        // Module skeleton: _init_variables_, _user_code_, and main.
        let void_fn = context.void_type().fn_type(&[], false);
        let init_fn = module.add_function("_init_variables_", void_fn, None);
        let init_block = context.append_basic_block(init_fn, "entry");

        let user_fn = module.add_function("_user_code_", void_fn, None);
        let user_block = context.append_basic_block(user_fn, "entry");

        let main_ty = context.i32_type().fn_type(&[], false);
        let main_fn = module.add_function("main", main_ty, None);
        let main_block = context.append_basic_block(main_fn, "entry");
        builder.position_at_end(main_block);
        builder
            .build_call(init_fn, &[], "init")
            .map_err(|e| e.to_string())?;
        builder
            .build_call(user_fn, &[], "user")
            .map_err(|e| e.to_string())?;
        builder
            .build_return(Some(&context.i32_type().const_zero()))
            .map_err(|e| e.to_string())?;

        builder.position_at_end(user_block);

        let root = ctx.symtab.root();
        Ok(Emitter {
            context,
            module,
            builder,
            target_machine,
            ctx,
            reporter,
            scopes: vec![root],
            bindings: FxHashMap::default(),
            tables: FxHashMap::default(),
            user_fn,
            init_block,
        })
    }

    /// Emit a whole file: builtin tables first, then imports depth-first,
    /// then the top-level block into `_user_code_`.
    pub fn compile(&mut self, file: &SourceFile) -> Result<(), String> {
        self.emit_builtin_tables();

        self.emit_source_file(file);

        // Close the skeleton function bodies.
        if self
            .builder
            .get_insert_block()
            .and_then(|b| b.get_terminator())
            .is_none()
        {
            self.builder.build_return(None).map_err(|e| e.to_string())?;
        }
        self.builder.position_at_end(self.init_block);
        self.builder.build_return(None).map_err(|e| e.to_string())?;

        self.module.verify().map_err(|e| e.to_string())
    }

    fn emit_source_file(&mut self, file: &SourceFile) {
        for import in &file.imports {
            self.emit_source_file(import);
        }
        if let ExprKind::Block(statements) = &file.code.kind {
            for statement in statements {
                self.emit_statement(statement);
            }
        }
    }

    /// Emit one statement, reporting failures as internal errors and
    /// carrying on with the next sibling.
    pub(crate) fn emit_statement(&mut self, statement: &Expr) {
        if let Err(message) = self.emit_expr(statement) {
            self.internal(&message, &statement.token);
        }
    }

    pub(crate) fn internal(&mut self, message: &str, token: &Token) {
        self.reporter.report(Diagnostic::at_token(
            DiagnosticKind::Internal,
            message.to_string(),
            token,
        ));
    }

    pub(crate) fn scope(&self) -> ScopeId {
        *self.scopes.last().expect("scope stack is never empty")
    }

    /// Whether the builder currently sits in `_user_code_`, i.e. at module
    /// level, where declarations become globals.
    pub(crate) fn at_module_level(&self) -> bool {
        self.builder
            .get_insert_block()
            .and_then(|b| b.get_parent())
            == Some(self.user_fn)
    }

    // ── Method tables ──────────────────────────────────────────────────

    /// The method-table global for a function, created on first use with a
    /// zero (null pointers) initialiser. Lowering fixes each method's slot
    /// index in the table.
    pub(crate) fn table_for(
        &mut self,
        function: FunctionId,
    ) -> Result<(PointerValue<'ctx>, StructType<'ctx>), String> {
        if let Some(entry) = self.tables.get(&function) {
            return Ok(*entry);
        }

        let table_ty = self.method_table_type(function)?;
        let method_count = self.ctx.registry.function(function).methods.len();
        for index in 0..method_count {
            self.ctx
                .registry
                .function_mut(function)
                .set_llvm_index(index, index);
        }

        let name = mangle(&self.ctx.registry.function(function).name);
        let global = self.module.add_global(table_ty, None, &name);
        global.set_initializer(&table_ty.const_zero());
        global.set_linkage(Linkage::Internal);

        let entry = (global.as_pointer_value(), table_ty);
        self.tables.insert(function, entry);
        Ok(entry)
    }

    /// Store a compiled function's pointer into its table slot. At module
    /// level the store is redirected into `_init_variables_` so tables are
    /// filled before any module-level initialiser runs; nested definitions
    /// store in place.
    pub(crate) fn store_method_pointer_in_place(
        &mut self,
        function: FunctionId,
        llvm_index: usize,
        specialisation_index: usize,
        value: FunctionValue<'ctx>,
    ) -> Result<(), String> {
        if self.at_module_level() {
            let saved = self.builder.get_insert_block();
            self.builder.position_at_end(self.init_block);
            self.store_method_pointer(function, llvm_index, specialisation_index, value)?;
            self.init_block = self
                .builder
                .get_insert_block()
                .ok_or("builder lost its position")?;
            if let Some(block) = saved {
                self.builder.position_at_end(block);
            }
            Ok(())
        } else {
            self.store_method_pointer(function, llvm_index, specialisation_index, value)
        }
    }

    /// Store a compiled function's pointer into its table slot at the
    /// builder's current position.
    pub(crate) fn store_method_pointer(
        &mut self,
        function: FunctionId,
        llvm_index: usize,
        specialisation_index: usize,
        value: FunctionValue<'ctx>,
    ) -> Result<(), String> {
        let (table_ptr, table_ty) = self.table_for(function)?;

        let method_ptr = self
            .builder
            .build_struct_gep(table_ty, table_ptr, llvm_index as u32, "method")
            .map_err(|e| e.to_string())?;
        let method_ty = table_ty
            .get_field_type_at_index(llvm_index as u32)
            .ok_or("method index out of range in table")?
            .into_struct_type();
        let slot = self
            .builder
            .build_struct_gep(method_ty, method_ptr, specialisation_index as u32, "slot")
            .map_err(|e| e.to_string())?;
        self.builder
            .build_store(slot, value.as_global_value().as_pointer_value())
            .map_err(|e| e.to_string())?;
        Ok(())
    }

    // ── Builtins ───────────────────────────────────────────────────────

    /// Emit the method tables and fixed bodies for the pre-registered
    /// builtin functions. Their table stores run in `_init_variables_`.
    fn emit_builtin_tables(&mut self) {
        let root = self.ctx.symtab.root();
        let builtin_functions: Vec<(String, FunctionId)> = self
            .ctx
            .symtab
            .symbols_in(root)
            .filter_map(|id| {
                let symbol = self.ctx.symtab.symbol(id);
                match (&symbol.ty, symbol.is_builtin) {
                    (Some(Ty::Function(function)), true) => {
                        Some((symbol.name.clone(), *function))
                    }
                    _ => None,
                }
            })
            .collect();

        for (name, function) in builtin_functions {
            let method_count = self.ctx.registry.function(function).methods.len();
            for index in 0..method_count {
                if let Err(message) = self.emit_builtin_function(&name, function, index) {
                    let token = synthetic_token(&name);
                    self.internal(&message, &token);
                }
            }
        }
    }

    fn emit_builtin_function(
        &mut self,
        name: &str,
        function: FunctionId,
        index: usize,
    ) -> Result<(), String> {
        let mref = MethodRef { function, index };
        let method = self.ctx.registry.method(mref).clone();
        // User definitions may extend a builtin overload set; their bodies
        // come from the AST when their `def` statement is reached.
        if !method.builtin {
            return Ok(());
        }
        let fn_ty = self.lower_fn_type(&method.parameter_types, &method.inout, &method.return_type)?;
        let tag = method.mangled_name(&self.ctx.registry);
        let mangled = mangle_method(name, &tag);

        let value = self.module.add_function(&mangled, fn_ty, None);
        let saved = self.builder.get_insert_block();
        let entry = self.context.append_basic_block(value, "entry");
        self.builder.position_at_end(entry);

        self.emit_builtin_body(name, value, &method.parameter_types, &method.return_type)?;

        if !value.verify(true) {
            return Err(format!("LLVM verification failed for builtin {mangled}"));
        }

        // Table stores run during initialisation.
        self.builder.position_at_end(self.init_block);
        self.table_for(function)?;
        let llvm_index = self
            .ctx
            .registry
            .function(function)
            .llvm_index(index)
            .ok_or("builtin method has no table slot")?;
        self.store_method_pointer(function, llvm_index, 0, value)?;
        self.init_block = self
            .builder
            .get_insert_block()
            .ok_or("builder lost its position")?;

        match saved {
            Some(block) => self.builder.position_at_end(block),
            None => {}
        }
        Ok(())
    }

    // ── Definitions ────────────────────────────────────────────────────

    /// Emit a `def`: the main declaration for non-generic methods, one
    /// clone per recorded specialisation for generic ones.
    pub(crate) fn emit_def(&mut self, holder: &DeclHolder<DefDecl>) -> Result<(), String> {
        let def = &holder.decl;
        let Some(&mref) = self.ctx.defs.get(&def.id) else {
            return Err("definition was never resolved to a method".to_string());
        };

        self.table_for(mref.function)?;

        if self.ctx.registry.method(mref).is_generic() {
            for specialised in &holder.specialised {
                let substitution: FxHashMap<String, Ty> = self.ctx.registry.method(mref)
                    .specialisations[specialised.specialisation_index]
                    .iter()
                    .cloned()
                    .collect();
                self.emit_method_function(
                    &specialised.decl,
                    mref,
                    specialised.specialisation_index,
                    &substitution,
                )?;
            }
        } else {
            self.emit_method_function(def, mref, 0, &FxHashMap::default())?;
        }
        Ok(())
    }

    fn emit_method_function(
        &mut self,
        def: &DefDecl,
        mref: MethodRef,
        specialisation_index: usize,
        substitution: &FxHashMap<String, Ty>,
    ) -> Result<(), String> {
        let method = self.ctx.registry.method(mref).clone();
        let function_name = self.ctx.registry.function(mref.function).name.clone();

        let parameter_types: Vec<Ty> = method
            .parameter_types
            .iter()
            .map(|ty| ty.substitute(substitution))
            .collect();
        let return_type = method.return_type.substitute(substitution);

        let tag = signature_tag(&parameter_types, &return_type, &self.ctx.registry);
        let mangled = mangle_method(&function_name, &tag);
        let llvm_index = self
            .ctx
            .registry
            .function(mref.function)
            .llvm_index(mref.index)
            .ok_or("method has no table slot")?;

        // Identical substitutions share one IR function.
        if let Some(existing) = self.module.get_function(&mangled) {
            self.store_method_pointer_in_place(mref.function, llvm_index, specialisation_index, existing)?;
            return Ok(());
        }

        let fn_ty = self.lower_fn_type(&parameter_types, &method.inout, &return_type)?;
        let value = self.module.add_function(&mangled, fn_ty, None);

        // The method's scope, via its symbol in the function's namespace.
        let function_symbol = self
            .ctx
            .symtab
            .lookup(self.scope(), &function_name)
            .ok_or("function symbol disappeared")?;
        let function_scope = self
            .ctx
            .symtab
            .symbol(function_symbol)
            .scope
            .ok_or("function symbol has no namespace")?;
        let method_symbol = self
            .ctx
            .symtab
            .lookup_by_node(function_scope, def.id)
            .ok_or("definition has no method symbol")?;
        let method_scope = self
            .ctx
            .symtab
            .symbol(method_symbol)
            .scope
            .ok_or("method symbol has no scope")?;

        let saved = self.builder.get_insert_block();
        let entry = self.context.append_basic_block(value, "entry");
        self.builder.position_at_end(entry);

        for (i, parameter) in def.parameters.iter().enumerate() {
            let arg = value
                .get_nth_param(i as u32)
                .ok_or("parameter count mismatch")?;
            arg.set_name(&parameter.name.value);
            let symbol = self
                .ctx
                .symtab
                .lookup_by_node(method_scope, parameter.id)
                .ok_or("parameter has no symbol")?;

            if method.inout[i] {
                // Inout arguments arrive as pointers to the caller's
                // storage; bind the pointer directly.
                self.bindings.insert(
                    symbol,
                    Binding::Ptr(arg.into_pointer_value(), parameter_types[i].clone()),
                );
            } else {
                let lowered = self.lower_ty(&parameter_types[i])?;
                let slot = self
                    .builder
                    .build_alloca(lowered, &parameter.name.value)
                    .map_err(|e| e.to_string())?;
                self.builder.build_store(slot, arg).map_err(|e| e.to_string())?;
                self.bindings
                    .insert(symbol, Binding::Ptr(slot, parameter_types[i].clone()));
            }
        }

        self.scopes.push(method_scope);
        let body_result = if method.builtin {
            self.emit_builtin_body(&function_name, value, &parameter_types, &return_type)
                .map(|_| None)
        } else if let Some(body) = &def.body {
            self.emit_expr(body)
        } else {
            Ok(None)
        };
        self.scopes.pop();

        match body_result {
            Ok(last_value) => {
                let unterminated = self
                    .builder
                    .get_insert_block()
                    .and_then(|b| b.get_terminator())
                    .is_none();
                if unterminated && !method.builtin {
                    match &return_type {
                        Ty::Void => {
                            self.builder.build_return(None).map_err(|e| e.to_string())?;
                        }
                        other => {
                            let fallback = self.lower_ty(other).map(|t| self.zero_value(t))?;
                            let result = last_value.unwrap_or(fallback);
                            self.builder
                                .build_return(Some(&result))
                                .map_err(|e| e.to_string())?;
                        }
                    }
                }
            }
            Err(message) => {
                if let Some(block) = saved {
                    self.builder.position_at_end(block);
                }
                self.internal(&message, &def.token);
                return Ok(());
            }
        }

        if !value.verify(true) {
            self.internal(
                &format!("LLVM verification failed for {mangled}"),
                &def.token,
            );
        }

        if let Some(block) = saved {
            self.builder.position_at_end(block);
        }
        self.store_method_pointer_in_place(mref.function, llvm_index, specialisation_index, value)?;
        Ok(())
    }

    // ── Type declarations ──────────────────────────────────────────────

    /// Emit a record type's canonical constructor: one IR function per
    /// specialisation, building the struct from its arguments. Aliases and
    /// builtin types need no code.
    pub(crate) fn emit_type_def(&mut self, holder: &DeclHolder<TypeDecl>) -> Result<(), String> {
        let decl = &holder.decl;
        let Some(Ty::Constructor(ctor)) = self.ctx.types.get(&decl.id).cloned() else {
            return Err("type declaration was never resolved".to_string());
        };
        let TyCtor::Record(record) = *ctor else {
            return Ok(());
        };

        let constructor = record.constructor;
        self.table_for(constructor)?;
        let method = self.ctx.registry.function(constructor).methods[0].clone();

        for (specialisation_index, specialisation) in method.specialisations.iter().enumerate() {
            let substitution: FxHashMap<String, Ty> = specialisation.iter().cloned().collect();
            let parameter_types: Vec<Ty> = method
                .parameter_types
                .iter()
                .map(|ty| ty.substitute(&substitution))
                .collect();
            let return_type = method.return_type.substitute(&substitution);

            let tag = signature_tag(&parameter_types, &return_type, &self.ctx.registry);
            let mangled = mangle_method(&record.name, &tag);

            let value = match self.module.get_function(&mangled) {
                Some(existing) => existing,
                None => {
                    let fn_ty =
                        self.lower_fn_type(&parameter_types, &method.inout, &return_type)?;
                    let value = self.module.add_function(&mangled, fn_ty, None);

                    let saved = self.builder.get_insert_block();
                    let entry = self.context.append_basic_block(value, "entry");
                    self.builder.position_at_end(entry);

                    let struct_ty = self.lower_ty(&return_type)?.into_struct_type();
                    let instance = self
                        .builder
                        .build_alloca(struct_ty, "instance")
                        .map_err(|e| e.to_string())?;
                    for (i, _) in parameter_types.iter().enumerate() {
                        let arg = value
                            .get_nth_param(i as u32)
                            .ok_or("constructor arity mismatch")?;
                        let field = self
                            .builder
                            .build_struct_gep(struct_ty, instance, i as u32, "field")
                            .map_err(|e| e.to_string())?;
                        self.builder.build_store(field, arg).map_err(|e| e.to_string())?;
                    }
                    let loaded = self
                        .builder
                        .build_load(struct_ty, instance, "record")
                        .map_err(|e| e.to_string())?;
                    self.builder
                        .build_return(Some(&loaded))
                        .map_err(|e| e.to_string())?;

                    if !value.verify(true) {
                        self.internal(
                            &format!("LLVM verification failed for {mangled}"),
                            &decl.token,
                        );
                    }
                    if let Some(block) = saved {
                        self.builder.position_at_end(block);
                    }
                    value
                }
            };

            self.store_method_pointer_in_place(constructor, 0, specialisation_index, value)?;
        }
        Ok(())
    }

    // ── Variables ──────────────────────────────────────────────────────

    /// Emit a `let`. Module-level declarations become zero-initialised
    /// globals whose initialising store runs in `_init_variables_`; nested
    /// declarations alloca in place.
    pub(crate) fn emit_let(
        &mut self,
        declaration: &VarDecl,
        value: Option<&Expr>,
        body: Option<&Expr>,
    ) -> Result<Option<BasicValueEnum<'ctx>>, String> {
        let symbol = self
            .ctx
            .symtab
            .lookup_by_node(self.scope(), declaration.id)
            .ok_or("variable declaration has no symbol")?;
        let ty = self
            .ctx
            .types
            .get(&declaration.id)
            .cloned()
            .ok_or("variable declaration has no type")?;

        if declaration.builtin {
            let backed = match declaration.name.name.value.as_str() {
                "true" => Some(self.context.bool_type().const_int(1, false).into()),
                "false" => Some(self.context.bool_type().const_zero().into()),
                _ => None,
            };
            if let Some(value) = backed {
                self.bindings.insert(symbol, Binding::Value(value));
            }
            return Ok(None);
        }

        let lowered = self.lower_ty(&ty)?;

        if self.at_module_level() {
            let global = self
                .module
                .add_global(lowered, None, &mangle(&declaration.name.name.value));
            global.set_initializer(&self.zero_value(lowered));
            global.set_linkage(Linkage::Internal);
            self.bindings
                .insert(symbol, Binding::Ptr(global.as_pointer_value(), ty));

            if let Some(value) = value {
                let saved = self.builder.get_insert_block();
                self.builder.position_at_end(self.init_block);
                let initialiser = self.emit_expr(value)?;
                if let Some(initialiser) = initialiser {
                    self.builder
                        .build_store(global.as_pointer_value(), initialiser)
                        .map_err(|e| e.to_string())?;
                }
                self.init_block = self
                    .builder
                    .get_insert_block()
                    .ok_or("builder lost its position")?;
                if let Some(block) = saved {
                    self.builder.position_at_end(block);
                }
            }
        } else {
            let slot = self
                .builder
                .build_alloca(lowered, &declaration.name.name.value)
                .map_err(|e| e.to_string())?;
            self.bindings.insert(symbol, Binding::Ptr(slot, ty));
            if let Some(value) = value {
                let initialiser = self.emit_expr(value)?;
                if let Some(initialiser) = initialiser {
                    self.builder
                        .build_store(slot, initialiser)
                        .map_err(|e| e.to_string())?;
                }
            }
        }

        match body {
            Some(body) => self.emit_expr(body),
            None => Ok(None),
        }
    }

    // ── Output ─────────────────────────────────────────────────────────

    /// Run LLVM optimisation passes on the module.
    pub fn run_optimization_passes(&self, opt_level: u8) -> Result<(), String> {
        let passes = match opt_level {
            0 => "default<O0>",
            1 => "default<O1>",
            _ => "default<O2>",
        };
        self.module
            .run_passes(passes, &self.target_machine, PassBuilderOptions::create())
            .map_err(|e| format!("Optimization passes failed: {}", e))
    }

    /// Emit the module as an object file.
    pub fn emit_object(&self, path: &Path) -> Result<(), String> {
        self.target_machine
            .write_to_file(&self.module, FileType::Object, path)
            .map_err(|e| format!("Failed to emit object file: {}", e))
    }

    /// Emit the module as human-readable LLVM IR.
    pub fn emit_llvm_ir(&self, path: &Path) -> Result<(), String> {
        self.module
            .print_to_file(path)
            .map_err(|e| format!("Failed to emit LLVM IR: {}", e))
    }

    /// The LLVM IR as a string, for tests.
    pub fn llvm_ir(&self) -> String {
        self.module.print_to_string().to_string()
    }

    /// Whether any diagnostic was reported during emission.
    pub fn had_errors(&self) -> bool {
        self.reporter.has_errors()
    }
}

/// The `m` + return + parameters signature tag under a substitution.
pub(crate) fn signature_tag(
    parameter_types: &[Ty],
    return_type: &Ty,
    registry: &acorn_typeck::ty::FunctionRegistry,
) -> String {
    let mut tag = "m".to_string();
    tag.push_str(&return_type.mangled_name(registry));
    for parameter in parameter_types {
        tag.push_str(&parameter.mangled_name(registry));
    }
    tag
}

/// A location-free token for diagnostics about compiler-supplied code.
fn synthetic_token(name: &str) -> Token {
    use acorn_common::span::{SourceLocation, Span};
    use acorn_common::token::TokenKind;
    Token::new(
        TokenKind::Name,
        name,
        Span::new(0, 0),
        SourceLocation::new("<builtin>", 1, 1, ""),
    )
}

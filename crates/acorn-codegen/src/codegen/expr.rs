//! Expression lowering.
//!
//! `emit_expr` returns `Ok(None)` for value-less expressions (void calls,
//! statements, declarations) and `Ok(Some(_))` for everything that
//! produces an SSA value. Builder failures and invariant violations
//! surface as `Err(String)` and are reported as internal errors at the
//! nearest statement boundary.

use inkwell::types::BasicTypeEnum;
use inkwell::values::{AggregateValueEnum, BasicMetadataValueEnum, BasicValueEnum};
use inkwell::AddressSpace;

use acorn_parser::ast::{Call, CCall, Expr, ExprKind, ParamName};
use acorn_typeck::symtab::SymbolId;
use acorn_typeck::ty::{MethodRef, Ty};

use super::{Binding, Emitter};

impl<'ctx> Emitter<'ctx, '_> {
    pub(crate) fn emit_expr(&mut self, expr: &Expr) -> Result<Option<BasicValueEnum<'ctx>>, String> {
        match &expr.kind {
            ExprKind::Int(text) => {
                let ty = self.expr_ty(expr)?;
                let lowered = self.lower_ty(&ty)?.into_int_type();
                let value: i64 = text
                    .parse()
                    .map_err(|_| format!("integer literal out of range: {text}"))?;
                Ok(Some(lowered.const_int(value as u64, true).into()))
            }
            ExprKind::Float(text) => {
                let ty = self.expr_ty(expr)?;
                let lowered = self.lower_ty(&ty)?.into_float_type();
                let value: f64 = text
                    .parse()
                    .map_err(|_| format!("float literal out of range: {text}"))?;
                Ok(Some(lowered.const_float(value).into()))
            }
            ExprKind::Str(text) => {
                let data = self.context.const_string(text.as_bytes(), true);
                let global = self.module.add_global(data.get_type(), None, ".str");
                global.set_initializer(&data);
                global.set_constant(true);
                global.set_unnamed_addr(true);
                Ok(Some(global.as_pointer_value().into()))
            }

            ExprKind::List(elements) => self.emit_list(expr, elements),
            ExprKind::Tuple(elements) => self.emit_tuple(expr, elements),

            ExprKind::Name(name) => self.emit_name(name),
            ExprKind::Selector { operand, field } => self.emit_selector(operand, field),
            ExprKind::Call(call) => self.emit_call(expr, call),
            ExprKind::CCall(ccall) => self.emit_ccall(ccall),
            ExprKind::Cast { operand, target: _ } => self.emit_cast(expr, operand),
            ExprKind::Assignment { target, value } => self.emit_assignment(target, value),

            ExprKind::While { condition, body } => self.emit_while(expr, condition, body),
            ExprKind::If {
                condition,
                true_case,
                false_case,
            } => self.emit_if(expr, condition, true_case, false_case.as_deref()),
            ExprKind::Return(value) => self.emit_return(value),

            ExprKind::Let {
                declaration,
                value,
                body,
            } => self.emit_let(declaration, value.as_deref(), body.as_deref()),
            ExprKind::Def(holder) => {
                self.emit_def(holder)?;
                Ok(None)
            }
            ExprKind::TypeDef(holder) => {
                self.emit_type_def(holder)?;
                Ok(None)
            }
            ExprKind::Module { name, body } => {
                let symbol = self
                    .ctx
                    .symtab
                    .lookup(self.scope(), &name.value)
                    .ok_or("module symbol disappeared")?;
                let nested = self
                    .ctx
                    .symtab
                    .symbol(symbol)
                    .scope
                    .ok_or("module symbol has no namespace")?;
                self.scopes.push(nested);
                if let ExprKind::Block(statements) = &body.kind {
                    for statement in statements {
                        self.emit_statement(statement);
                    }
                }
                self.scopes.pop();
                Ok(None)
            }

            ExprKind::Block(statements) => {
                let mut last = None;
                for statement in statements {
                    last = self.emit_expr(statement)?;
                }
                Ok(last)
            }

            // Parsed but not emitted.
            ExprKind::Complex(_) => Err("complex literals are not emitted".to_string()),
            ExprKind::Dictionary { .. } => Err("dictionary literals are not emitted".to_string()),
            ExprKind::Spawn(_) => Err("spawn is not emitted".to_string()),
            ExprKind::Case { .. } | ExprKind::Switch { .. } => {
                Err("switch is not emitted".to_string())
            }
            ExprKind::Import { .. } => Err("imports are resolved before emission".to_string()),
        }
    }

    fn expr_ty(&self, expr: &Expr) -> Result<Ty, String> {
        self.ctx
            .types
            .get(&expr.id)
            .cloned()
            .ok_or_else(|| format!("no type for expression at {}", expr.token.location))
    }

    /// The zero value of an expression's inferred type, for constructs that
    /// yield a default rather than a computed value (`while`, else-less
    /// `if`). Types with no value representation yield nothing.
    fn zero_result(&self, expr: &Expr) -> Result<Option<BasicValueEnum<'ctx>>, String> {
        let ty = self.expr_ty(expr)?;
        match ty {
            Ty::Void | Ty::Module(_) | Ty::Constructor(_) => Ok(None),
            other => {
                let lowered = self.lower_ty(&other)?;
                Ok(Some(self.zero_value(lowered)))
            }
        }
    }

    // ── Values and storage ─────────────────────────────────────────────

    fn emit_name(&mut self, name: &ParamName) -> Result<Option<BasicValueEnum<'ctx>>, String> {
        let symbol = self
            .ctx
            .symtab
            .lookup(self.scope(), name.value())
            .ok_or_else(|| format!("{} is not bound at emission time", name.value()))?;
        self.emit_symbol_value(symbol, name.value())
    }

    fn emit_symbol_value(
        &mut self,
        symbol: SymbolId,
        name: &str,
    ) -> Result<Option<BasicValueEnum<'ctx>>, String> {
        if let Some(binding) = self.bindings.get(&symbol) {
            return match binding {
                Binding::Ptr(ptr, ty) => {
                    let ptr = *ptr;
                    let ty = ty.clone();
                    let lowered = self.lower_ty(&ty)?;
                    let value = self
                        .builder
                        .build_load(lowered, ptr, name)
                        .map_err(|e| e.to_string())?;
                    Ok(Some(value))
                }
                Binding::Value(value) => Ok(Some(*value)),
            };
        }

        // Symbols without storage: builtin values and function references.
        match self.ctx.symtab.symbol(symbol).ty.clone() {
            Some(Ty::Boolean) => {
                let truth = self.ctx.symtab.symbol(symbol).name == "true";
                Ok(Some(
                    self.context
                        .bool_type()
                        .const_int(truth as u64, false)
                        .into(),
                ))
            }
            Some(Ty::Void) => Ok(None),
            Some(Ty::Function(function)) => {
                let (table_ptr, table_ty) = self.table_for(function)?;
                let value = self
                    .builder
                    .build_load(table_ty, table_ptr, name)
                    .map_err(|e| e.to_string())?;
                Ok(Some(value))
            }
            _ => Err(format!("the value of {name} is not available")),
        }
    }

    fn emit_assignment(
        &mut self,
        target: &ParamName,
        value: &Expr,
    ) -> Result<Option<BasicValueEnum<'ctx>>, String> {
        let new_value = self
            .emit_expr(value)?
            .ok_or("assignment needs a value on the right")?;

        let symbol = self
            .ctx
            .symtab
            .lookup(self.scope(), target.value())
            .ok_or_else(|| format!("{} is not bound at emission time", target.value()))?;
        let Some(Binding::Ptr(ptr, _)) = self.bindings.get(&symbol) else {
            return Err(format!("{} has no storage", target.value()));
        };
        self.builder
            .build_store(*ptr, new_value)
            .map_err(|e| e.to_string())?;
        Ok(Some(new_value))
    }

    fn emit_selector(
        &mut self,
        operand: &Expr,
        field: &ParamName,
    ) -> Result<Option<BasicValueEnum<'ctx>>, String> {
        let operand_ty = self.expr_ty(operand)?;

        match operand_ty {
            Ty::Record(record) => {
                let value = self
                    .emit_expr(operand)?
                    .ok_or("record operand has no value")?;
                let index = record
                    .field_index(field.value())
                    .ok_or_else(|| format!("no field {} on {}", field.value(), record.name))?;
                let extracted = self
                    .builder
                    .build_extract_value(value.into_struct_value(), index as u32, field.value())
                    .map_err(|e| e.to_string())?;
                Ok(Some(extracted))
            }
            Ty::Tuple(_) => {
                let value = self
                    .emit_expr(operand)?
                    .ok_or("tuple operand has no value")?;
                let index: u32 = field
                    .value()
                    .parse()
                    .map_err(|_| format!("bad tuple index {}", field.value()))?;
                let extracted = self
                    .builder
                    .build_extract_value(value.into_struct_value(), index, field.value())
                    .map_err(|e| e.to_string())?;
                Ok(Some(extracted))
            }
            Ty::Module(scope) => {
                let symbol = self
                    .ctx
                    .symtab
                    .lookup_local(scope, field.value())
                    .ok_or_else(|| format!("{} is not in the module", field.value()))?;
                self.emit_symbol_value(symbol, field.value())
            }
            // `Type.new` produces no value here; calls resolve the
            // constructor's table through the operand's type.
            Ty::Constructor(_) => Ok(None),
            other => Err(format!(
                "selector on a value of type {}",
                other.name(&self.ctx.registry)
            )),
        }
    }

    // ── Calls ──────────────────────────────────────────────────────────

    /// Call through the method table: load the function pointer at the
    /// `(method, specialisation)` pair the inferrer recorded, order the
    /// arguments per the method's keyword map, and call. Inout arguments
    /// pass the address of the named binding's storage.
    fn emit_call(
        &mut self,
        expr: &Expr,
        call: &Call,
    ) -> Result<Option<BasicValueEnum<'ctx>>, String> {
        let resolution = *self
            .ctx
            .calls
            .get(&expr.id)
            .ok_or("call was never resolved")?;
        let mref = MethodRef {
            function: resolution.function,
            index: resolution.method_index,
        };
        let method = self.ctx.registry.method(mref).clone();

        // Emit operand side effects only for selector chains that read
        // values; plain function names are resolved through the table.
        let substitution: rustc_hash::FxHashMap<String, Ty> = if method.is_generic() {
            method.specialisations[resolution.specialisation_index]
                .iter()
                .cloned()
                .collect()
        } else {
            rustc_hash::FxHashMap::default()
        };
        let parameter_types: Vec<Ty> = method
            .parameter_types
            .iter()
            .map(|ty| ty.substitute(&substitution))
            .collect();
        let return_type = method.return_type.substitute(&substitution);

        // Order the argument expressions per the keyword map.
        let positional: Vec<&Expr> = call.positional.iter().collect();
        let keyword: Vec<(String, &Expr)> = call
            .keyword
            .iter()
            .map(|(name, value)| (name.value.clone(), value))
            .collect();
        let ordered = method
            .ordered_arguments(&positional, &keyword)
            .ok_or("arguments could not be ordered")?;

        let mut arguments: Vec<BasicMetadataValueEnum<'ctx>> =
            Vec::with_capacity(ordered.len());
        for (i, argument) in ordered.into_iter().enumerate() {
            if method.inout[i] {
                arguments.push(self.inout_argument(argument)?.into());
            } else {
                let value = self
                    .emit_expr(argument)?
                    .ok_or("argument has no value")?;
                arguments.push(value.into());
            }
        }

        // Load the function pointer from the table slot.
        let llvm_index = self
            .ctx
            .registry
            .function(resolution.function)
            .llvm_index(resolution.method_index)
            .ok_or("called method has no table slot")?;
        let (table_ptr, table_ty) = self.table_for(resolution.function)?;
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
            .build_struct_gep(
                method_ty,
                method_ptr,
                resolution.specialisation_index as u32,
                "slot",
            )
            .map_err(|e| e.to_string())?;
        let fn_ptr = self
            .builder
            .build_load(self.context.ptr_type(AddressSpace::default()), slot, "fn")
            .map_err(|e| e.to_string())?
            .into_pointer_value();

        let fn_ty = self.lower_fn_type(&parameter_types, &method.inout, &return_type)?;
        let result = self
            .builder
            .build_indirect_call(fn_ty, fn_ptr, &arguments, "call")
            .map_err(|e| e.to_string())?;

        Ok(result.try_as_basic_value().left())
    }

    /// The address passed for an inout argument: the named binding's
    /// storage itself.
    fn inout_argument(
        &mut self,
        argument: &Expr,
    ) -> Result<inkwell::values::PointerValue<'ctx>, String> {
        let ExprKind::Name(name) = &argument.kind else {
            return Err("inout arguments must be variable names".to_string());
        };
        let symbol = self
            .ctx
            .symtab
            .lookup(self.scope(), name.value())
            .ok_or_else(|| format!("{} is not bound at emission time", name.value()))?;
        match self.bindings.get(&symbol) {
            Some(Binding::Ptr(ptr, _)) => Ok(*ptr),
            _ => Err(format!("{} has no addressable storage", name.value())),
        }
    }

    /// Foreign call: declare (or reuse) the C function and call it
    /// directly, bypassing method tables.
    fn emit_ccall(&mut self, ccall: &CCall) -> Result<Option<BasicValueEnum<'ctx>>, String> {
        let mut parameter_types = Vec::with_capacity(ccall.parameter_types.len());
        for parameter in &ccall.parameter_types {
            let ty = self
                .ctx
                .types
                .get(&parameter.id)
                .cloned()
                .ok_or("ccall parameter type was never resolved")?;
            parameter_types.push(ty);
        }
        let return_type = self
            .ctx
            .types
            .get(&ccall.return_type.id)
            .cloned()
            .ok_or("ccall return type was never resolved")?;

        let function = match self.module.get_function(&ccall.name.value) {
            Some(function) => function,
            None => {
                let inout = vec![false; parameter_types.len()];
                let fn_ty = self.lower_fn_type(&parameter_types, &inout, &return_type)?;
                self.module.add_function(&ccall.name.value, fn_ty, None)
            }
        };

        let mut arguments: Vec<BasicMetadataValueEnum<'ctx>> =
            Vec::with_capacity(ccall.arguments.len());
        for argument in &ccall.arguments {
            let value = self
                .emit_expr(argument)?
                .ok_or("ccall argument has no value")?;
            arguments.push(value.into());
        }

        let result = self
            .builder
            .build_call(function, &arguments, "ccall")
            .map_err(|e| e.to_string())?;
        Ok(result.try_as_basic_value().left())
    }

    // ── Casts ──────────────────────────────────────────────────────────

    fn emit_cast(
        &mut self,
        expr: &Expr,
        operand: &Expr,
    ) -> Result<Option<BasicValueEnum<'ctx>>, String> {
        let value = self.emit_expr(operand)?.ok_or("cast needs a value")?;
        let from = self.expr_ty(operand)?;
        let to = self.expr_ty(expr)?;
        let target = self.lower_ty(&to)?;

        if from.is_compatible(&to) {
            return Ok(Some(value));
        }

        let cast = match (&from, &to) {
            (Ty::Integer(_) | Ty::UnsignedInteger(_), Ty::Integer(_) | Ty::UnsignedInteger(_)) => {
                let signed = matches!(from, Ty::Integer(_));
                self.builder
                    .build_int_cast_sign_flag(
                        value.into_int_value(),
                        target.into_int_type(),
                        signed,
                        "cast",
                    )
                    .map_err(|e| e.to_string())?
                    .into()
            }
            (Ty::Integer(_), Ty::Float(_)) => self
                .builder
                .build_signed_int_to_float(value.into_int_value(), target.into_float_type(), "cast")
                .map_err(|e| e.to_string())?
                .into(),
            (Ty::Float(_), Ty::Integer(_)) => self
                .builder
                .build_float_to_signed_int(
                    value.into_float_value(),
                    target.into_int_type(),
                    "cast",
                )
                .map_err(|e| e.to_string())?
                .into(),
            (Ty::Float(_), Ty::Float(_)) => self
                .builder
                .build_float_cast(value.into_float_value(), target.into_float_type(), "cast")
                .map_err(|e| e.to_string())?
                .into(),
            (Ty::UnsafePointer(_), Ty::UnsafePointer(_)) => value,
            _ => self
                .builder
                .build_bit_cast(value, target, "cast")
                .map_err(|e| e.to_string())?,
        };
        Ok(Some(cast))
    }

    // ── Aggregates ─────────────────────────────────────────────────────

    fn emit_tuple(
        &mut self,
        expr: &Expr,
        elements: &[Expr],
    ) -> Result<Option<BasicValueEnum<'ctx>>, String> {
        let ty = self.expr_ty(expr)?;
        let struct_ty = self.lower_ty(&ty)?.into_struct_type();

        let mut aggregate: AggregateValueEnum<'ctx> = struct_ty.get_undef().into();
        for (i, element) in elements.iter().enumerate() {
            let value = self
                .emit_expr(element)?
                .ok_or("tuple element has no value")?;
            aggregate = self
                .builder
                .build_insert_value(aggregate, value, i as u32, "tuple")
                .map_err(|e| e.to_string())?;
        }
        Ok(Some(aggregate.into_struct_value().into()))
    }

    /// Lists lower to a `{length, elements}` struct; the elements live in
    /// a stack allocation.
    fn emit_list(
        &mut self,
        expr: &Expr,
        elements: &[Expr],
    ) -> Result<Option<BasicValueEnum<'ctx>>, String> {
        let ty = self.expr_ty(expr)?;
        let struct_ty = self.lower_ty(&ty)?.into_struct_type();

        let Ty::Record(record) = &ty else {
            return Err("list literal did not lower to a record".to_string());
        };
        let Ty::UnsafePointer(element_ty) = &record.field_types[1] else {
            return Err("list record has no element pointer".to_string());
        };
        let element_lowered = self.lower_ty(element_ty)?;

        let storage = self
            .builder
            .build_array_alloca(
                element_lowered,
                self.context
                    .i64_type()
                    .const_int(elements.len().max(1) as u64, false),
                "list_storage",
            )
            .map_err(|e| e.to_string())?;

        for (i, element) in elements.iter().enumerate() {
            let value = self
                .emit_expr(element)?
                .ok_or("list element has no value")?;
            let place = unsafe {
                self.builder.build_in_bounds_gep(
                    element_lowered,
                    storage,
                    &[self.context.i64_type().const_int(i as u64, false)],
                    "element",
                )
            }
            .map_err(|e| e.to_string())?;
            self.builder
                .build_store(place, value)
                .map_err(|e| e.to_string())?;
        }

        let length = self
            .context
            .i64_type()
            .const_int(elements.len() as u64, false);
        let mut aggregate: AggregateValueEnum<'ctx> = struct_ty.get_undef().into();
        aggregate = self
            .builder
            .build_insert_value(aggregate, length, 0, "list")
            .map_err(|e| e.to_string())?;
        aggregate = self
            .builder
            .build_insert_value(aggregate, storage, 1, "list")
            .map_err(|e| e.to_string())?;
        Ok(Some(aggregate.into_struct_value().into()))
    }

    // ── Control flow ───────────────────────────────────────────────────

    fn emit_while(
        &mut self,
        expr: &Expr,
        condition: &Expr,
        body: &Expr,
    ) -> Result<Option<BasicValueEnum<'ctx>>, String> {
        let function = self
            .builder
            .get_insert_block()
            .and_then(|b| b.get_parent())
            .ok_or("while outside of a function")?;

        let entry = self.context.append_basic_block(function, "while_entry");
        let loop_block = self.context.append_basic_block(function, "while_loop");
        let join = self.context.append_basic_block(function, "while_join");

        self.builder
            .build_unconditional_branch(entry)
            .map_err(|e| e.to_string())?;

        self.builder.position_at_end(entry);
        let cond = self
            .emit_expr(condition)?
            .ok_or("while condition has no value")?;
        self.builder
            .build_conditional_branch(cond.into_int_value(), loop_block, join)
            .map_err(|e| e.to_string())?;

        self.builder.position_at_end(loop_block);
        self.emit_expr(body)?;
        if self
            .builder
            .get_insert_block()
            .and_then(|b| b.get_terminator())
            .is_none()
        {
            self.builder
                .build_unconditional_branch(entry)
                .map_err(|e| e.to_string())?;
        }

        self.builder.position_at_end(join);
        // The loop body may not have run; a while yields the zero value of
        // its inferred type.
        self.zero_result(expr)
    }

    fn emit_if(
        &mut self,
        expr: &Expr,
        condition: &Expr,
        true_case: &Expr,
        false_case: Option<&Expr>,
    ) -> Result<Option<BasicValueEnum<'ctx>>, String> {
        let function = self
            .builder
            .get_insert_block()
            .and_then(|b| b.get_parent())
            .ok_or("if outside of a function")?;

        let then_block = self.context.append_basic_block(function, "if_then");
        let else_block = self.context.append_basic_block(function, "if_else");
        let join = self.context.append_basic_block(function, "if_join");

        let cond = self
            .emit_expr(condition)?
            .ok_or("if condition has no value")?;
        self.builder
            .build_conditional_branch(cond.into_int_value(), then_block, else_block)
            .map_err(|e| e.to_string())?;

        self.builder.position_at_end(then_block);
        let then_value = self.emit_expr(true_case)?;
        let then_end = self.builder.get_insert_block();
        let then_open = then_end.and_then(|b| b.get_terminator()).is_none();
        if then_open {
            self.builder
                .build_unconditional_branch(join)
                .map_err(|e| e.to_string())?;
        }

        self.builder.position_at_end(else_block);
        let else_value = match false_case {
            Some(false_case) => self.emit_expr(false_case)?,
            None => None,
        };
        let else_end = self.builder.get_insert_block();
        let else_open = else_end.and_then(|b| b.get_terminator()).is_none();
        if else_open {
            self.builder
                .build_unconditional_branch(join)
                .map_err(|e| e.to_string())?;
        }

        self.builder.position_at_end(join);

        // Both branches live and valued joins with a phi; any other shape
        // (no else, a branch that returned, void branches) yields the zero
        // value of the if's inferred type.
        if let (Some(then_value), Some(else_value), true, true) =
            (then_value, else_value, then_open, else_open)
        {
            let ty = self.expr_ty(expr)?;
            let lowered: BasicTypeEnum<'ctx> = self.lower_ty(&ty)?;
            let phi = self
                .builder
                .build_phi(lowered, "if_value")
                .map_err(|e| e.to_string())?;
            phi.add_incoming(&[
                (&then_value, then_end.ok_or("then branch lost its block")?),
                (&else_value, else_end.ok_or("else branch lost its block")?),
            ]);
            Ok(Some(phi.as_basic_value()))
        } else {
            self.zero_result(expr)
        }
    }

    /// `return` terminates the block; emission continues on a fresh dead
    /// block so trailing siblings stay well-formed.
    fn emit_return(&mut self, value: &Expr) -> Result<Option<BasicValueEnum<'ctx>>, String> {
        let result = self.emit_expr(value)?;
        let function = self
            .builder
            .get_insert_block()
            .and_then(|b| b.get_parent())
            .ok_or("return outside of a function")?;

        let returns_void = function.get_type().get_return_type().is_none();
        if returns_void {
            self.builder.build_return(None).map_err(|e| e.to_string())?;
        } else {
            let value = match result {
                Some(value) => value,
                None => {
                    let ret_ty = function
                        .get_type()
                        .get_return_type()
                        .ok_or("function lost its return type")?;
                    self.zero_value(ret_ty)
                }
            };
            self.builder
                .build_return(Some(&value))
                .map_err(|e| e.to_string())?;
        }

        let dead = self.context.append_basic_block(function, "after_return");
        self.builder.position_at_end(dead);
        Ok(None)
    }
}

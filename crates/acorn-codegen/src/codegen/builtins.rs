//! Fixed IR bodies for the builtin methods.
//!
//! Builtin definitions have no AST body; the emitter produces one from the
//! method's name and parameter types. Arithmetic and comparison come in
//! integer and float flavours, selected by the first parameter type.
//! `_debug_print_` goes through the C `printf`.

use inkwell::values::{BasicValueEnum, FunctionValue};
use inkwell::{AddressSpace, FloatPredicate, IntPredicate};

use acorn_typeck::ty::Ty;

use super::Emitter;

impl<'ctx> Emitter<'ctx, '_> {
    /// Emit the body of a builtin method into `function` and terminate it.
    pub(crate) fn emit_builtin_body(
        &mut self,
        name: &str,
        function: FunctionValue<'ctx>,
        parameter_types: &[Ty],
        return_type: &Ty,
    ) -> Result<(), String> {
        let is_float = matches!(parameter_types.first(), Some(Ty::Float(_)));

        let value: Option<BasicValueEnum<'ctx>> = match name {
            "+" | "-" | "*" | "/" | "%" => {
                Some(self.arithmetic(name, function, is_float)?)
            }
            "==" | "!=" | "<" | "<=" | ">" | ">=" => {
                Some(self.comparison(name, function, is_float)?)
            }
            "not" => {
                let operand = argument(function, 0)?.into_int_value();
                Some(
                    self.builder
                        .build_not(operand, "not")
                        .map_err(|e| e.to_string())?
                        .into(),
                )
            }
            "to_float" => {
                let operand = argument(function, 0)?.into_int_value();
                let target = self.lower_ty(return_type)?.into_float_type();
                Some(
                    self.builder
                        .build_signed_int_to_float(operand, target, "float")
                        .map_err(|e| e.to_string())?
                        .into(),
                )
            }
            "to_int" => {
                let operand = argument(function, 0)?.into_float_value();
                let target = self.lower_ty(return_type)?.into_int_type();
                Some(
                    self.builder
                        .build_float_to_signed_int(operand, target, "int")
                        .map_err(|e| e.to_string())?
                        .into(),
                )
            }
            "_debug_print_" => {
                self.emit_debug_print(function)?;
                None
            }
            other => return Err(format!("Unknown builtin definition {other}.")),
        };

        match value {
            Some(value) => self
                .builder
                .build_return(Some(&value))
                .map_err(|e| e.to_string())?,
            None => self.builder.build_return(None).map_err(|e| e.to_string())?,
        };
        Ok(())
    }

    fn arithmetic(
        &mut self,
        name: &str,
        function: FunctionValue<'ctx>,
        is_float: bool,
    ) -> Result<BasicValueEnum<'ctx>, String> {
        if is_float {
            let a = argument(function, 0)?.into_float_value();
            let b = argument(function, 1)?.into_float_value();
            let value = match name {
                "+" => self.builder.build_float_add(a, b, "addition"),
                "-" => self.builder.build_float_sub(a, b, "subtraction"),
                "*" => self.builder.build_float_mul(a, b, "multiplication"),
                "/" => self.builder.build_float_div(a, b, "division"),
                _ => self.builder.build_float_rem(a, b, "remainder"),
            }
            .map_err(|e| e.to_string())?;
            Ok(value.into())
        } else {
            let a = argument(function, 0)?.into_int_value();
            let b = argument(function, 1)?.into_int_value();
            let value = match name {
                "+" => self.builder.build_int_add(a, b, "addition"),
                "-" => self.builder.build_int_sub(a, b, "subtraction"),
                "*" => self.builder.build_int_mul(a, b, "multiplication"),
                "/" => self.builder.build_int_signed_div(a, b, "division"),
                _ => self.builder.build_int_signed_rem(a, b, "remainder"),
            }
            .map_err(|e| e.to_string())?;
            Ok(value.into())
        }
    }

    fn comparison(
        &mut self,
        name: &str,
        function: FunctionValue<'ctx>,
        is_float: bool,
    ) -> Result<BasicValueEnum<'ctx>, String> {
        if is_float {
            let a = argument(function, 0)?.into_float_value();
            let b = argument(function, 1)?.into_float_value();
            let predicate = match name {
                "==" => FloatPredicate::OEQ,
                "!=" => FloatPredicate::ONE,
                "<" => FloatPredicate::OLT,
                "<=" => FloatPredicate::OLE,
                ">" => FloatPredicate::OGT,
                _ => FloatPredicate::OGE,
            };
            let value = self
                .builder
                .build_float_compare(predicate, a, b, "comparison")
                .map_err(|e| e.to_string())?;
            Ok(value.into())
        } else {
            let a = argument(function, 0)?.into_int_value();
            let b = argument(function, 1)?.into_int_value();
            let predicate = match name {
                "==" => IntPredicate::EQ,
                "!=" => IntPredicate::NE,
                "<" => IntPredicate::SLT,
                "<=" => IntPredicate::SLE,
                ">" => IntPredicate::SGT,
                _ => IntPredicate::SGE,
            };
            let value = self
                .builder
                .build_int_compare(predicate, a, b, "comparison")
                .map_err(|e| e.to_string())?;
            Ok(value.into())
        }
    }

    /// `_debug_print_(x)` calls `printf("%lld\n", x)`.
    fn emit_debug_print(&mut self, function: FunctionValue<'ctx>) -> Result<(), String> {
        let printf = match self.module.get_function("printf") {
            Some(function) => function,
            None => {
                let ptr = self.context.ptr_type(AddressSpace::default());
                let ty = self.context.i32_type().fn_type(&[ptr.into()], true);
                self.module.add_function("printf", ty, None)
            }
        };

        let format = match self.module.get_global("_A_debug_format_") {
            Some(global) => global.as_pointer_value(),
            None => {
                let data = self.context.const_string(b"%lld\n", true);
                let global = self
                    .module
                    .add_global(data.get_type(), None, "_A_debug_format_");
                global.set_initializer(&data);
                global.set_constant(true);
                global.as_pointer_value()
            }
        };

        let value = argument(function, 0)?;
        self.builder
            .build_call(printf, &[format.into(), value.into()], "printed")
            .map_err(|e| e.to_string())?;
        Ok(())
    }
}

fn argument<'ctx>(function: FunctionValue<'ctx>, index: u32) -> Result<BasicValueEnum<'ctx>, String> {
    function
        .get_nth_param(index)
        .ok_or_else(|| format!("builtin body expected parameter {index}"))
}

//! Language type to LLVM type mapping.
//!
//! Primitives lower directly; records and tuples lower to structs; a
//! `Function` lowers to its *method table*: a struct with one element per
//! overload, each element itself a struct with one function pointer per
//! generic specialisation. With opaque pointers every slot is a plain
//! `ptr`, but the two-level struct shape is what call sites index with
//! their `(method, specialisation)` pair.

use inkwell::types::{BasicMetadataTypeEnum, BasicType, BasicTypeEnum, FunctionType, StructType};
use inkwell::values::BasicValueEnum;
use inkwell::AddressSpace;

use acorn_typeck::ty::{FunctionId, MethodData, Ty};

use super::Emitter;

impl<'ctx> Emitter<'ctx, '_> {
    /// Lower a value type. Fails on types with no value representation.
    pub(crate) fn lower_ty(&self, ty: &Ty) -> Result<BasicTypeEnum<'ctx>, String> {
        match ty {
            Ty::Parameter(name) => Err(format!("unsubstituted type parameter {name}")),
            // Void in value position is the empty struct.
            Ty::Void => Ok(self.context.struct_type(&[], false).into()),
            Ty::Boolean => Ok(self.context.bool_type().into()),
            Ty::Integer(size) | Ty::UnsignedInteger(size) => {
                Ok(self.context.custom_width_int_type(*size).into())
            }
            Ty::Float(size) => match size {
                16 => Ok(self.context.f16_type().into()),
                32 => Ok(self.context.f32_type().into()),
                64 => Ok(self.context.f64_type().into()),
                128 => Ok(self.context.f128_type().into()),
                other => Err(format!("unsupported float width {other}")),
            },
            Ty::UnsafePointer(_) => Ok(self.context.ptr_type(AddressSpace::default()).into()),
            Ty::Record(record) => {
                let mut fields = Vec::with_capacity(record.field_types.len());
                for field in &record.field_types {
                    fields.push(self.lower_ty(field)?);
                }
                Ok(self.context.struct_type(&fields, false).into())
            }
            Ty::Tuple(elements) => {
                let mut fields = Vec::with_capacity(elements.len());
                for element in elements {
                    fields.push(self.lower_ty(element)?);
                }
                Ok(self.context.struct_type(&fields, false).into())
            }
            Ty::Function(id) => Ok(self.method_table_type(*id)?.into()),
            Ty::Method(mref) => {
                let method = self.ctx.registry.method(*mref);
                Ok(self.method_slot_struct(method).into())
            }
            Ty::Module(_) => Err("modules have no value representation".to_string()),
            Ty::Constructor(_) => Err("types have no value representation".to_string()),
        }
    }

    /// The struct-of-structs for a function's method table.
    pub(crate) fn method_table_type(&self, function: FunctionId) -> Result<StructType<'ctx>, String> {
        let function_data = self.ctx.registry.function(function);
        let mut elements: Vec<BasicTypeEnum<'ctx>> =
            Vec::with_capacity(function_data.methods.len());
        for method in &function_data.methods {
            elements.push(self.method_slot_struct(method).into());
        }
        Ok(self.context.struct_type(&elements, false))
    }

    /// One function pointer slot per specialisation of a method.
    fn method_slot_struct(&self, method: &MethodData) -> StructType<'ctx> {
        let ptr: BasicTypeEnum<'ctx> = self.context.ptr_type(AddressSpace::default()).into();
        let slots = vec![ptr; method.specialisations.len().max(1)];
        self.context.struct_type(&slots, false)
    }

    /// The concrete IR function type for a method under a substitution.
    /// Inout parameters are passed as pointers.
    pub(crate) fn lower_fn_type(
        &self,
        parameter_types: &[Ty],
        inout: &[bool],
        return_type: &Ty,
    ) -> Result<FunctionType<'ctx>, String> {
        let mut parameters: Vec<BasicMetadataTypeEnum<'ctx>> =
            Vec::with_capacity(parameter_types.len());
        for (parameter, is_inout) in parameter_types.iter().zip(inout) {
            if *is_inout {
                parameters.push(self.context.ptr_type(AddressSpace::default()).into());
            } else {
                parameters.push(self.lower_ty(parameter)?.into());
            }
        }

        Ok(match return_type {
            Ty::Void => self.context.void_type().fn_type(&parameters, false),
            other => self.lower_ty(other)?.fn_type(&parameters, false),
        })
    }

    /// The default zero value for a lowered type.
    pub(crate) fn zero_value(&self, ty: BasicTypeEnum<'ctx>) -> BasicValueEnum<'ctx> {
        match ty {
            BasicTypeEnum::IntType(t) => t.const_zero().into(),
            BasicTypeEnum::FloatType(t) => t.const_zero().into(),
            BasicTypeEnum::PointerType(t) => t.const_null().into(),
            BasicTypeEnum::StructType(t) => t.const_zero().into(),
            BasicTypeEnum::ArrayType(t) => t.const_zero().into(),
            BasicTypeEnum::VectorType(t) => t.const_zero().into(),
            BasicTypeEnum::ScalableVectorType(t) => t.const_zero().into(),
        }
    }
}

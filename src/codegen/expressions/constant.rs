//! `Constant` lowering: a typed literal to an IR constant of the matching scalar type.

use inkwell::values::BasicValueEnum;

use crate::ast::ConstantValue;
use crate::codegen::CodegenContext;
use crate::error::{CodegenError, UnknownType};
use crate::types::TypeDescriptor;

pub fn codegen_constant<'ctx>(
    ctx: &CodegenContext<'ctx>,
    value_type: &TypeDescriptor,
    value: &ConstantValue,
) -> Result<BasicValueEnum<'ctx>, CodegenError> {
    let context = ctx.jit.context();

    Ok(match (value_type, value) {
        (TypeDescriptor::Bool, ConstantValue::Bool(b)) => {
            context.bool_type().const_int(*b as u64, false).into()
        }
        (TypeDescriptor::I8, ConstantValue::Int(n)) => {
            context.i8_type().const_int(*n as u64, true).into()
        }
        (TypeDescriptor::I16, ConstantValue::Int(n)) => {
            context.i16_type().const_int(*n as u64, true).into()
        }
        (TypeDescriptor::I32, ConstantValue::Int(n)) => {
            context.i32_type().const_int(*n as u64, true).into()
        }
        (TypeDescriptor::I64, ConstantValue::Int(n)) => {
            context.i64_type().const_int(*n as u64, true).into()
        }
        (TypeDescriptor::F32, ConstantValue::Float(f)) => {
            context.f32_type().const_float(*f).into()
        }
        (TypeDescriptor::F64, ConstantValue::Float(f)) => {
            context.f64_type().const_float(*f).into()
        }
        (other, _) => {
            return Err(CodegenError::UnknownType(UnknownType {
                type_name: format!("{other:?}"),
            }))
        }
    })
}

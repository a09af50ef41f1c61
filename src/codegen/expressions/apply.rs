//! `Apply` lowering: generate the callee as a closure value, extract its two fields, and
//! either dispatch an indirect call through the wrapped signature or, for an
//! instruction-backed intrinsic hint, emit the native arithmetic instruction directly.

use std::rc::Rc;

use inkwell::values::{BasicValueEnum, CallableValue};
use std::convert::TryFrom;

use crate::ast::{IntrinsicHint, Node};
use crate::codegen::expressions::primitive::codegen_intrinsic_instruction;
use crate::codegen::CodegenContext;
use crate::error::{ArityMismatch, CodegenError, TypeMismatch};
use crate::types::TypeDescriptor;

pub fn codegen_apply<'ctx>(
    ctx: &CodegenContext<'ctx>,
    callee: &Rc<Node>,
    args: &[Rc<Node>],
) -> Result<BasicValueEnum<'ctx>, CodegenError> {
    let intrinsic_hint = match callee.as_ref() {
        Node::Primitive { intrinsic_hint, .. } => Some(*intrinsic_hint),
        _ => None,
    };

    let (callee_params, callee_return) = match callee.value_type() {
        TypeDescriptor::Function {
            params,
            return_value,
        } => (params, *return_value),
        other => {
            return Err(CodegenError::ArityMismatch(ArityMismatch {
                callee: format!("{other:?}"),
                expected: 0,
                found: args.len(),
            }))
        }
    };

    if callee_params.len() != args.len() {
        return Err(CodegenError::ArityMismatch(ArityMismatch {
            callee: describe_callee(callee),
            expected: callee_params.len(),
            found: args.len(),
        }));
    }

    for (argno, (arg, expected)) in args.iter().zip(callee_params.iter()).enumerate() {
        let found = arg.value_type();
        if &found != expected {
            return Err(CodegenError::TypeMismatch(TypeMismatch {
                callee: describe_callee(callee),
                argno,
                expected: expected.display_name(),
                found: found.display_name(),
            }));
        }
    }

    let closure_value = ctx.codegen_expr(callee)?;
    let fn_ptr = ctx.extract_closure_fn_ptr(closure_value);
    let env_ptr = ctx.extract_closure_env_ptr(closure_value);

    let mut arg_values = Vec::with_capacity(args.len());
    for arg in args {
        arg_values.push(ctx.codegen_expr(arg)?);
    }

    if let Some(hint) = intrinsic_hint {
        if hint.is_instruction_backed() {
            return Ok(codegen_intrinsic_instruction(ctx, hint, &arg_values));
        }
    }

    let wrapped_fn_type =
        ctx.jit
            .types()
            .function_type(ctx.jit.context(), &callee_params, &callee_return, true)?;

    let mut call_args: Vec<inkwell::values::BasicMetadataValueEnum> = vec![env_ptr.into()];
    call_args.extend(
        arg_values
            .iter()
            .map(|v| inkwell::values::BasicMetadataValueEnum::from(*v)),
    );

    let callable_fn_ptr = ctx
        .builder
        .build_pointer_cast(
            fn_ptr,
            wrapped_fn_type.ptr_type(inkwell::AddressSpace::default()),
            "apply.fn_ptr",
        )
        .expect("pointer cast to wrapped function signature");
    let callable = CallableValue::try_from(callable_fn_ptr)
        .expect("extracted closure function pointer is a function pointer");

    let call = ctx
        .builder
        .build_call(callable, &call_args, "apply")
        .expect("indirect call through extracted closure function pointer");

    call.try_as_basic_value()
        .left()
        .ok_or_else(|| CodegenError::ArityMismatch(ArityMismatch {
            callee: describe_callee(callee),
            expected: callee_params.len(),
            found: args.len(),
        }))
}

fn describe_callee(callee: &Node) -> String {
    match callee {
        Node::Primitive { name, .. } => name.clone(),
        Node::Variable { name, .. } => name.clone(),
        Node::Lambda(lambda) => lambda.name.clone(),
        other => format!("{other:?}"),
    }
}

//! `Lambda` lowering: declaration, lazy definition and closure construction.
//!
//! Declaration happens once per lambda, up front, during pre-order discovery
//! (`codegen::CodegenContext::discover_lambdas`). Definition is deferred until the lambda is
//! actually reached by ordinary expression traversal, which is what lets a nested lambda's
//! body see its enclosing lambda's still-open activation record.

use std::rc::Rc;

use inkwell::values::{BasicValueEnum, FunctionValue};
use inkwell::AddressSpace;
use log::debug;

use crate::ast::Lambda;
use crate::codegen::activation_record::ActivationRecord;
use crate::codegen::CodegenContext;
use crate::error::{CodegenError, IrVerificationFailure};

/// Emits an empty externally-linked IR function with the wrapped signature (`.env` first,
/// then the source formals by name). Idempotent.
pub fn codegen_lambda_decl<'ctx>(
    ctx: &CodegenContext<'ctx>,
    lambda: &Rc<Lambda>,
) -> Result<FunctionValue<'ctx>, CodegenError> {
    if let Some(existing) = ctx.declared_function(&lambda.name) {
        return Ok(existing);
    }

    let fn_type = ctx.jit.types().function_type(
        ctx.jit.context(),
        &lambda.param_types(),
        &lambda.return_type,
        true,
    )?;
    let function = ctx
        .jit
        .with_module(|module| module.add_function(&lambda.name, fn_type, None));

    function
        .get_nth_param(0)
        .expect("wrapped signature always has the environment parameter")
        .set_name(".env");
    for (index, formal) in lambda.formals.iter().enumerate() {
        function
            .get_nth_param((index + 1) as u32)
            .expect("arity matches declared param count")
            .set_name(&formal.name);
    }

    ctx.mark_declared(&lambda.name, function);
    Ok(function)
}

/// Emits the function body: entry block, activation record, recursive body emission, return,
/// verification and optimization. On any failure the partially-built function is erased from
/// the module and the activation record is still popped.
pub fn codegen_lambda_defn<'ctx>(
    ctx: &CodegenContext<'ctx>,
    lambda: &Rc<Lambda>,
) -> Result<FunctionValue<'ctx>, CodegenError> {
    let function = codegen_lambda_decl(ctx, lambda)?;
    if ctx.is_defined(&lambda.name) {
        return Ok(function);
    }
    debug!("defining lambda '{}'", lambda.name);

    let context = ctx.jit.context();
    let entry = context.append_basic_block(function, "entry");
    let saved_block = ctx.builder.get_insert_block();
    ctx.builder.position_at_end(entry);

    let mut record = ActivationRecord::new(lambda.clone());
    let bind_result = record.bind_locals(ctx.jit, function, &ctx.builder);
    ctx.push_activation(record);

    let result = bind_result.and_then(|()| ctx.codegen_expr(&lambda.body));

    ctx.pop_activation();

    match result {
        Ok(body_value) => {
            ctx.builder
                .build_return(Some(&body_value))
                .expect("return from lambda body");

            if !function.verify(true) {
                unsafe { function.delete() };
                if let Some(block) = saved_block {
                    ctx.builder.position_at_end(block);
                }
                return Err(CodegenError::IrVerificationFailure(IrVerificationFailure {
                    function: lambda.name.clone(),
                    message: "generated function failed IR verification".into(),
                }));
            }

            ctx.jit.pipeline().borrow().run(function);
            ctx.mark_defined(&lambda.name);
            debug!("lambda '{}' defined and optimised", lambda.name);
            if let Some(block) = saved_block {
                ctx.builder.position_at_end(block);
            }
            Ok(function)
        }
        Err(error) => {
            unsafe { function.delete() };
            debug!("lambda '{}' definition failed: {error}", lambda.name);
            if let Some(block) = saved_block {
                ctx.builder.position_at_end(block);
            }
            Err(error)
        }
    }
}

/// Ensures `lambda` is defined, then builds its closure struct: the function pointer in slot 0
/// and the *current* environment pointer (of the lambda being emitted right now, if any) in
/// slot 1.
pub fn codegen_lambda_closure<'ctx>(
    ctx: &CodegenContext<'ctx>,
    lambda: &Rc<Lambda>,
) -> Result<BasicValueEnum<'ctx>, CodegenError> {
    let function = codegen_lambda_defn(ctx, lambda)?;
    let fn_ptr = function.as_global_value().as_pointer_value();

    let env_ptr = if lambda.capture_info.needs_closure {
        ctx.current_env_ptr()
    } else {
        ctx.jit.context().i8_type().ptr_type(AddressSpace::default()).const_null()
    };

    Ok(ctx.build_closure_value(&lambda.name, fn_ptr, env_ptr))
}

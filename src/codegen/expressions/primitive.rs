//! `Primitive` lowering: declaring the raw primitive, wrapping it behind the uniform wrapped
//! signature, and building the closure value used at application sites.

use inkwell::values::{BasicValueEnum, FunctionValue};
use inkwell::AddressSpace;
use log::warn;

use crate::ast::IntrinsicHint;
use crate::codegen::CodegenContext;
use crate::error::CodegenError;
use crate::types::TypeDescriptor;

/// Emits (or reuses) an IR function declaration for a primitive's unwrapped source signature.
/// When `explicit_symbol` is set, the primitive's native address is interned in the execution
/// session under that name so the JIT resolves it at commit time.
pub fn codegen_primitive<'ctx>(
    ctx: &CodegenContext<'ctx>,
    name: &str,
    native_address: Option<usize>,
    explicit_symbol: Option<&str>,
    params: &[TypeDescriptor],
    return_type: &TypeDescriptor,
) -> Result<FunctionValue<'ctx>, CodegenError> {
    if let Some(existing) = ctx.declared_function(name) {
        return Ok(existing);
    }

    let fn_type = ctx
        .jit
        .types()
        .function_type(ctx.jit.context(), params, return_type, false)?;
    let function = ctx.jit.with_module(|module| module.add_function(name, fn_type, None));
    ctx.mark_declared(name, function);

    match (explicit_symbol, native_address) {
        (Some(symbol), Some(address)) => ctx.jit.intern(symbol, address),
        (Some(symbol), None) => warn!(
            "primitive '{name}' registered with explicit symbol '{symbol}' but no native address; \
             the JIT will only resolve it if '{symbol}' is already defined in a committed module"
        ),
        (None, _) => {}
    }

    Ok(function)
}

/// Emits (or reuses) `w.<name>`: the wrapped-signature tail-call forwarder.
pub fn codegen_primitive_wrapper<'ctx>(
    ctx: &CodegenContext<'ctx>,
    name: &str,
    native_address: Option<usize>,
    explicit_symbol: Option<&str>,
    params: &[TypeDescriptor],
    return_type: &TypeDescriptor,
) -> Result<FunctionValue<'ctx>, CodegenError> {
    let wrapper_name = format!("w.{name}");
    if let Some(existing) = ctx.wrapper_function(&wrapper_name) {
        return Ok(existing);
    }

    let raw = codegen_primitive(ctx, name, native_address, explicit_symbol, params, return_type)?;

    let wrapped_type =
        ctx.jit
            .types()
            .function_type(ctx.jit.context(), params, return_type, true)?;
    let wrapper = ctx
        .jit
        .with_module(|module| module.add_function(&wrapper_name, wrapped_type, None));

    let context = ctx.jit.context();
    let entry = context.append_basic_block(wrapper, "entry");
    let builder = context.create_builder();
    builder.position_at_end(entry);

    // Forward every argument except the injected environment pointer at index 0.
    let forwarded: Vec<_> = wrapper
        .get_param_iter()
        .skip(1)
        .map(|p| p.into())
        .collect();
    let call = builder
        .build_call(raw, &forwarded, "tailcall")
        .expect("forwarding call to declared primitive");
    call.set_tail_call(true);

    match call.try_as_basic_value().left() {
        Some(value) => {
            builder.build_return(Some(&value)).expect("wrapper return");
        }
        None => {
            builder.build_return(None).expect("wrapper void return");
        }
    }

    ctx.mark_wrapper(&wrapper_name, wrapper);
    ctx.jit.pipeline().borrow().run(wrapper);
    Ok(wrapper)
}

/// Builds `closure { fn_ptr: w.<name>, env_ptr: null }` for a primitive reference.
pub fn codegen_primitive_closure<'ctx>(
    ctx: &CodegenContext<'ctx>,
    name: &str,
    native_address: Option<usize>,
    explicit_symbol: Option<&str>,
    _intrinsic_hint: IntrinsicHint,
    params: &[TypeDescriptor],
    return_type: &TypeDescriptor,
) -> Result<BasicValueEnum<'ctx>, CodegenError> {
    let wrapper =
        codegen_primitive_wrapper(ctx, name, native_address, explicit_symbol, params, return_type)?;
    let fn_ptr = wrapper.as_global_value().as_pointer_value();
    let null_env = ctx
        .jit
        .context()
        .i8_type()
        .ptr_type(AddressSpace::default())
        .const_null();
    Ok(ctx.build_closure_value(name, fn_ptr, null_env))
}

/// Emits the native arithmetic instruction for an instruction-backed intrinsic hint. The
/// environment slot in `args` (if present) must already have been stripped by the caller; this
/// only ever sees the source-level operands.
pub fn codegen_intrinsic_instruction<'ctx>(
    ctx: &CodegenContext<'ctx>,
    hint: IntrinsicHint,
    args: &[BasicValueEnum<'ctx>],
) -> BasicValueEnum<'ctx> {
    let builder = &ctx.builder;
    match hint {
        IntrinsicHint::INeg => builder
            .build_int_neg(args[0].into_int_value(), "i_neg")
            .expect("int neg")
            .into(),
        IntrinsicHint::IAdd => builder
            .build_int_add(args[0].into_int_value(), args[1].into_int_value(), "i_add")
            .expect("int add")
            .into(),
        IntrinsicHint::ISub => builder
            .build_int_sub(args[0].into_int_value(), args[1].into_int_value(), "i_sub")
            .expect("int sub")
            .into(),
        IntrinsicHint::IMul => builder
            .build_int_mul(args[0].into_int_value(), args[1].into_int_value(), "i_mul")
            .expect("int mul")
            .into(),
        IntrinsicHint::ISdiv => builder
            .build_int_signed_div(args[0].into_int_value(), args[1].into_int_value(), "i_sdiv")
            .expect("int sdiv")
            .into(),
        IntrinsicHint::IUdiv => builder
            .build_int_unsigned_div(args[0].into_int_value(), args[1].into_int_value(), "i_udiv")
            .expect("int udiv")
            .into(),
        IntrinsicHint::FpAdd => builder
            .build_float_add(args[0].into_float_value(), args[1].into_float_value(), "fp_add")
            .expect("float add")
            .into(),
        IntrinsicHint::FpSub => builder
            .build_float_sub(args[0].into_float_value(), args[1].into_float_value(), "fp_sub")
            .expect("float sub")
            .into(),
        IntrinsicHint::FpMul => builder
            .build_float_mul(args[0].into_float_value(), args[1].into_float_value(), "fp_mul")
            .expect("float mul")
            .into(),
        IntrinsicHint::FpDiv => builder
            .build_float_div(args[0].into_float_value(), args[1].into_float_value(), "fp_div")
            .expect("float div")
            .into(),
        hint => unreachable!("{hint:?} is not instruction-backed"),
    }
}

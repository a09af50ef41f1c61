//! `Variable` lowering: resolves a binding in the activation-record stack and emits a typed
//! load of its recorded address.

use inkwell::values::BasicValueEnum;

use crate::codegen::CodegenContext;
use crate::error::{CodegenError, UnboundVariable};
use crate::types::TypeDescriptor;

/// Depth 0 is a direct load from the current frame's own recorded address. Depth > 0 means the
/// binding lives in an ancestor lambda's environment: start from the *current frame's own
/// incoming* `.env` parameter — which, by construction, already points at the depth-1 ancestor's
/// environment struct, since that is exactly the pointer the closure was built with — then walk
/// `env_api.parent` one fewer time than the depth to reach deeper ancestors, and GEP into the
/// resolved ancestor environment struct at its recorded slot. The ancestor frame's own
/// `ir_address` cannot be reused as-is — it is an SSA value that belongs to the ancestor's own
/// function — so the slot is re-derived against the pointer resolved in the *current* function
/// instead. Note this must never start from the current frame's *outgoing* environment pointer
/// (`CodegenContext::current_env_ptr`), which is a different, unrelated pointer: the one lambdas
/// nested inside the current frame close over, not the one the current frame itself was called
/// with.
pub fn codegen_variable<'ctx>(
    ctx: &CodegenContext<'ctx>,
    name: &str,
    _value_type: &TypeDescriptor,
) -> Result<BasicValueEnum<'ctx>, CodegenError> {
    let (depth, detail) = ctx.lookup_var_with_depth(name).ok_or_else(|| {
        CodegenError::UnboundVariable(UnboundVariable {
            name: name.to_string(),
        })
    })?;

    if depth == 0 {
        return Ok(ctx
            .builder
            .build_load(detail.ir_address, name)
            .expect("load from recorded binding address"));
    }

    let (ancestor_lambda, slot) = ctx
        .env_slot_at_depth(depth, name)
        .expect("bound at this depth by lookup_var_with_depth");

    let context = ctx.jit.context();
    let mut env_ptr = ctx.current_incoming_env_ptr();
    for _ in 1..depth {
        env_ptr = ctx
            .builder
            .build_load(env_ptr, "env.parent")
            .expect("load env_api.parent slot")
            .into_pointer_value();
    }

    let _env_type = ctx.jit.types().local_env_type(context, &ancestor_lambda)?;
    let slot_addr = ctx
        .builder
        .build_struct_gep(env_ptr, slot, name)
        .expect("captured slot index in bounds");

    Ok(ctx
        .builder
        .build_load(slot_addr, name)
        .expect("load from resolved ancestor environment slot"))
}

//! `IfExpr` lowering: three basic blocks and a merging phi-node.
//!
//! The test value is compared against zero of its own numeric type rather than assumed to
//! already be a one-bit boolean: an integer test builds `icmp ne` against an integer zero, a
//! float test builds `fcmp one` against a float zero.

use inkwell::values::BasicValueEnum;
use inkwell::{FloatPredicate, IntPredicate};

use crate::ast::Node;
use crate::codegen::CodegenContext;
use crate::error::{CodegenError, TypeMismatch};

fn build_nonzero_test<'ctx>(
    ctx: &CodegenContext<'ctx>,
    test: BasicValueEnum<'ctx>,
) -> inkwell::values::IntValue<'ctx> {
    match test {
        BasicValueEnum::IntValue(i) => {
            let zero = i.get_type().const_zero();
            ctx.builder
                .build_int_compare(IntPredicate::NE, i, zero, "ifcond")
                .expect("int comparison against zero")
        }
        BasicValueEnum::FloatValue(f) => {
            let zero = f.get_type().const_zero();
            ctx.builder
                .build_float_compare(FloatPredicate::ONE, f, zero, "ifcond")
                .expect("float comparison against zero")
        }
        other => panic!("cannot build a zero test for {other:?}"),
    }
}

pub fn codegen_ifexpr<'ctx>(
    ctx: &CodegenContext<'ctx>,
    test: &Node,
    when_true: &Node,
    when_false: &Node,
) -> Result<BasicValueEnum<'ctx>, CodegenError> {
    let test_value = ctx.codegen_expr(test)?;
    let condition = build_nonzero_test(ctx, test_value);

    let context = ctx.jit.context();
    let current_fn = ctx
        .builder
        .get_insert_block()
        .expect("builder positioned in a block")
        .get_parent()
        .expect("block belongs to a function");

    let then_block = context.append_basic_block(current_fn, "if.then");
    let else_block = context.append_basic_block(current_fn, "if.else");
    let merge_block = context.append_basic_block(current_fn, "if.merge");

    ctx.builder
        .build_conditional_branch(condition, then_block, else_block)
        .expect("conditional branch");

    ctx.builder.position_at_end(then_block);
    let then_value = ctx.codegen_expr(when_true)?;
    let then_end_block = ctx.builder.get_insert_block().expect("still in a block");
    ctx.builder
        .build_unconditional_branch(merge_block)
        .expect("branch to merge");

    ctx.builder.position_at_end(else_block);
    let else_value = ctx.codegen_expr(when_false)?;
    let else_end_block = ctx.builder.get_insert_block().expect("still in a block");
    ctx.builder
        .build_unconditional_branch(merge_block)
        .expect("branch to merge");

    if then_value.get_type() != else_value.get_type() {
        return Err(CodegenError::TypeMismatch(TypeMismatch {
            callee: "if".into(),
            argno: 1,
            expected: format!("{:?}", then_value.get_type()),
            found: format!("{:?}", else_value.get_type()),
        }));
    }

    ctx.builder.position_at_end(merge_block);
    let phi = ctx
        .builder
        .build_phi(then_value.get_type(), "if.result")
        .expect("phi node");
    phi.add_incoming(&[(&then_value, then_end_block), (&else_value, else_end_block)]);

    Ok(phi.as_basic_value())
}

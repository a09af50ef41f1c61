//! Per-lambda binding analysis and activation-record state.
//!
//! One `ActivationRecord` exists per lambda body currently being emitted; it is pushed on
//! entry to that lambda's definition and popped on exit (including on error paths), giving it
//! stack-shaped lifetime bound to the surrounding `codegen_lambda_defn` call.

use std::collections::HashMap;
use std::rc::Rc;

use inkwell::builder::Builder;
use inkwell::types::BasicTypeEnum;
use inkwell::values::{FunctionValue, PointerValue};
use inkwell::AddressSpace;

use crate::ast::{Capture, Lambda};
use crate::error::{CodegenError, DuplicateBinding};
use crate::jit::Jit;

/// `{i_link, j_slot}`. `i_link == -2` is the unused sentinel value of a freshly constructed
/// entry; real bindings always replace it before code generation reads them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeBindingPath {
    pub i_link: i32,
    pub j_slot: i32,
}

impl RuntimeBindingPath {
    pub const SENTINEL: Self = Self {
        i_link: -2,
        j_slot: -2,
    };

    pub fn stackonly() -> Self {
        Self {
            i_link: 0,
            j_slot: -1,
        }
    }

    pub fn local(slot: i32) -> Self {
        Self { i_link: 0, j_slot: slot }
    }
}

/// `{argno, ir_address, ir_type}`: the concrete IR value backing a binding.
#[derive(Debug, Clone, Copy)]
pub struct RuntimeBindingDetail<'ctx> {
    pub argno: usize,
    pub ir_address: PointerValue<'ctx>,
    pub ir_type: BasicTypeEnum<'ctx>,
}

pub struct ActivationRecord<'ctx> {
    pub lambda: Rc<Lambda>,
    binding_v: Vec<RuntimeBindingPath>,
    env_alloca: Option<PointerValue<'ctx>>,
    /// This frame's incoming `.env` parameter (argument 0 of the wrapped signature) — the
    /// pointer a nested lambda's variable lookup must start its `env_api.parent` walk from,
    /// as opposed to `env_alloca`, which is this frame's own *outgoing* environment (the one
    /// lambdas nested inside *this* frame close over).
    incoming_env: Option<PointerValue<'ctx>>,
    bindings: HashMap<String, RuntimeBindingDetail<'ctx>>,
}

impl<'ctx> ActivationRecord<'ctx> {
    /// Classifies every formal of `lambda` as stack-only or captured, assigning increasing
    /// environment slot numbers (starting past the two header slots) to captured formals.
    pub fn new(lambda: Rc<Lambda>) -> Self {
        let mut next_slot = 2;
        let binding_v = lambda
            .capture_info
            .formals
            .iter()
            .map(|capture| match capture {
                Capture::StackOnly => RuntimeBindingPath::stackonly(),
                Capture::Captured => {
                    let slot = next_slot;
                    next_slot += 1;
                    RuntimeBindingPath::local(slot)
                }
            })
            .collect();

        Self {
            lambda,
            binding_v,
            env_alloca: None,
            incoming_env: None,
            bindings: HashMap::new(),
        }
    }

    pub fn env_alloca(&self) -> Option<PointerValue<'ctx>> {
        self.env_alloca
    }

    /// This frame's incoming `.env` parameter. Set unconditionally by `bind_locals`, so any
    /// call after that point is safe.
    pub fn incoming_env(&self) -> PointerValue<'ctx> {
        self.incoming_env
            .expect("bind_locals always records the incoming .env parameter")
    }

    pub fn lookup_var(&self, name: &str) -> Option<&RuntimeBindingDetail<'ctx>> {
        self.bindings.get(name)
    }

    /// The environment slot index of `name`, if it names a captured formal of this record's
    /// lambda. Used to re-derive a GEP into this frame's environment struct from a *different*
    /// function's IR, where this frame's own `ir_address` (bound to this frame's builder
    /// position) cannot be referenced directly.
    pub fn env_slot(&self, name: &str) -> Option<u32> {
        let index = self.lambda.formals.iter().position(|f| f.name == name)?;
        let path = self.binding_v[index];
        (path.j_slot >= 0).then_some(path.j_slot as u32)
    }

    /// Emits the entry-block prologue: stack-only formals first, then (if `needs_closure`) the
    /// environment struct and its captured-formal slots.
    pub fn bind_locals(
        &mut self,
        jit: &Jit<'ctx>,
        ir_fn: FunctionValue<'ctx>,
        builder: &Builder<'ctx>,
    ) -> Result<(), CodegenError> {
        self.incoming_env = Some(
            ir_fn
                .get_nth_param(0)
                .expect("wrapped signature always has the environment parameter")
                .into_pointer_value(),
        );

        for (index, formal) in self.lambda.formals.iter().enumerate() {
            if self.binding_v[index].j_slot != -1 {
                continue;
            }
            let argno = index + 1;
            let param = ir_fn.get_nth_param(argno as u32).expect("arity checked by caller");
            let ir_type = jit.types().lower(jit.context(), &formal.value_type)?;
            let address = builder
                .build_alloca(ir_type, &formal.name)
                .expect("alloca in valid entry block");
            builder.build_store(address, param).expect("store to fresh alloca");

            if self.bindings.contains_key(&formal.name) {
                return Err(CodegenError::DuplicateBinding(DuplicateBinding {
                    name: formal.name.clone(),
                    lambda: self.lambda.name.clone(),
                }));
            }
            self.bindings.insert(
                formal.name.clone(),
                RuntimeBindingDetail {
                    argno,
                    ir_address: address,
                    ir_type,
                },
            );
        }

        if !self.lambda.capture_info.needs_closure {
            return Ok(());
        }

        let env_type = jit.types().local_env_type(jit.context(), &self.lambda)?;
        let env_alloca = builder
            .build_alloca(env_type, &format!("e.{}", self.lambda.name))
            .expect("alloca in valid entry block");

        // Header: parent = null, unwind = null (reserved, never invoked at emission time).
        let null_ptr = jit.context().i8_type().ptr_type(AddressSpace::default()).const_null();
        for header_slot in 0..2 {
            let slot_addr = builder
                .build_struct_gep(env_alloca, header_slot, "env.header")
                .expect("header slot index in bounds");
            builder.build_store(slot_addr, null_ptr).expect("store env header");
        }
        self.env_alloca = Some(env_alloca);

        for (index, formal) in self.lambda.formals.iter().enumerate() {
            let path = self.binding_v[index];
            if path.j_slot < 0 {
                continue;
            }
            let argno = index + 1;
            let param = ir_fn.get_nth_param(argno as u32).expect("arity checked by caller");
            let slot_addr = builder
                .build_struct_gep(env_alloca, path.j_slot as u32, &formal.name)
                .expect("captured slot index in bounds");
            builder.build_store(slot_addr, param).expect("store captured formal");

            let ir_type = jit.types().lower(jit.context(), &formal.value_type)?;
            if self.bindings.contains_key(&formal.name) {
                return Err(CodegenError::DuplicateBinding(DuplicateBinding {
                    name: formal.name.clone(),
                    lambda: self.lambda.name.clone(),
                }));
            }
            self.bindings.insert(
                formal.name.clone(),
                RuntimeBindingDetail {
                    argno,
                    ir_address: slot_addr,
                    ir_type,
                },
            );
        }

        Ok(())
    }
}

//! Type descriptors and their lowering into LLVM IR types.
//!
//! `TypeDescriptor` is the reflection collaborator's vocabulary (spec-level "type descriptor"):
//! native scalars, pointers, structs and function signatures. Everything in this module is a
//! pure, idempotent constructor over an `inkwell::context::Context` — repeated calls for the
//! same descriptor return the same `inkwell` type handle, mirroring the caching idiom of the
//! teacher's `CodegenContext::get_llvm_type`.

use std::cell::RefCell;
use std::collections::HashMap;

use inkwell::context::Context;
use inkwell::types::{BasicType, BasicTypeEnum, FunctionType, PointerType, StructType};
use inkwell::AddressSpace;
use serde::{Deserialize, Serialize};

use crate::ast::Lambda;
use crate::error::{CodegenError, UnknownType};

/// The reflection collaborator's vocabulary, handed to this crate already resolved. Derives
/// `Serialize`/`Deserialize` in the same habit as the parser's own AST node types, so a type
/// descriptor can round-trip through whatever persists an already-typed program between the
/// front end and this generator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeDescriptor {
    Bool,
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
    Pointer(Box<TypeDescriptor>),
    Struct {
        name: String,
        members: Vec<(String, TypeDescriptor)>,
    },
    Function {
        params: Vec<TypeDescriptor>,
        return_value: Box<TypeDescriptor>,
    },
}

impl TypeDescriptor {
    pub fn display_name(&self) -> String {
        match self {
            Self::Bool => "bool".into(),
            Self::I8 => "i8".into(),
            Self::I16 => "i16".into(),
            Self::I32 => "i32".into(),
            Self::I64 => "i64".into(),
            Self::F32 => "f32".into(),
            Self::F64 => "f64".into(),
            Self::Pointer(inner) => format!("{}*", inner.display_name()),
            Self::Struct { name, .. } => format!("struct {name}"),
            Self::Function {
                params,
                return_value,
            } => format!(
                "({}) -> {}",
                params
                    .iter()
                    .map(Self::display_name)
                    .collect::<Vec<_>>()
                    .join(", "),
                return_value.display_name()
            ),
        }
    }
}

/// Per-context cache of lowered basic types, keyed by descriptor.
///
/// Kept as a standalone cache (rather than folded into `CodegenContext`) so that `types.rs`
/// has no dependency on the generator's scope/activation-record state — only on the raw
/// `inkwell::context::Context`.
#[derive(Default)]
pub struct TypeCache<'ctx> {
    basic: RefCell<HashMap<TypeDescriptor, BasicTypeEnum<'ctx>>>,
    closures_literal: RefCell<Option<StructType<'ctx>>>,
    environments: RefCell<HashMap<String, StructType<'ctx>>>,
    env_api: RefCell<Option<StructType<'ctx>>>,
}

impl<'ctx> TypeCache<'ctx> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Maps a type descriptor to its lowered IR type (spec's `lower(td)`).
    pub fn lower(
        &self,
        context: &'ctx Context,
        td: &TypeDescriptor,
    ) -> Result<BasicTypeEnum<'ctx>, CodegenError> {
        if let Some(found) = self.basic.borrow().get(td) {
            return Ok(*found);
        }

        let lowered = match td {
            TypeDescriptor::Bool => context.bool_type().into(),
            TypeDescriptor::I8 => context.i8_type().into(),
            TypeDescriptor::I16 => context.i16_type().into(),
            TypeDescriptor::I32 => context.i32_type().into(),
            TypeDescriptor::I64 => context.i64_type().into(),
            TypeDescriptor::F32 => context.f32_type().into(),
            TypeDescriptor::F64 => context.f64_type().into(),
            TypeDescriptor::Pointer(_) => context.i8_type().ptr_type(AddressSpace::default()).into(),
            TypeDescriptor::Struct { members, .. } => {
                let mut field_types = Vec::with_capacity(members.len());
                for (_, member_td) in members {
                    field_types.push(self.lower(context, member_td)?);
                }
                context.struct_type(&field_types, false).into()
            }
            TypeDescriptor::Function { .. } => {
                // Any storage slot holding a function-typed value (a formal, a variable, an
                // apply argument) holds a closure, never a bare function pointer — all
                // closures share the same two-pointer layout, so one generic nominal struct
                // is reused here regardless of the particular callee a value happens to hold
                // at construction time (see `closure_type` for the per-callee nominal structs
                // built at construction sites).
                self.closure_type(context, "value").into()
            }
        };

        self.basic.borrow_mut().insert(td.clone(), lowered);
        Ok(lowered)
    }

    /// Builds the IR function type for a signature; prepends `env_api*` when `wrapper_flag`.
    pub fn function_type(
        &self,
        context: &'ctx Context,
        params: &[TypeDescriptor],
        return_value: &TypeDescriptor,
        wrapper_flag: bool,
    ) -> Result<FunctionType<'ctx>, CodegenError> {
        let mut llvm_params = Vec::with_capacity(params.len() + 1);
        if wrapper_flag {
            llvm_params.push(self.env_api_ptr_type(context).into());
        }
        for param in params {
            llvm_params.push(self.lower(context, param)?.into());
        }

        Ok(self.lower(context, return_value)?.fn_type(&llvm_params, false))
    }

    /// The two-slot abstract environment header: `{ parent: env_api*, unwind: env_api*(env_api*, i32) }`.
    pub fn env_api_type(&self, context: &'ctx Context) -> StructType<'ctx> {
        if let Some(found) = *self.env_api.borrow() {
            return found;
        }
        let ptr = context.i8_type().ptr_type(AddressSpace::default());
        let api = context.opaque_struct_type("env_api");
        api.set_body(&[ptr.into(), ptr.into()], false);
        *self.env_api.borrow_mut() = Some(api);
        api
    }

    pub fn env_api_ptr_type(&self, context: &'ctx Context) -> PointerType<'ctx> {
        // env_api is always passed by pointer; LLVM18's opaque pointers make the pointee
        // identical regardless of the struct behind it, so a plain `ptr` suffices here.
        let _ = self.env_api_type(context);
        context.i8_type().ptr_type(AddressSpace::default())
    }

    /// `env_api* (env_api*, i32)`, reserved for a future copy-to-heap/unwind protocol.
    pub fn unwind_fn_ptr_type(&self, context: &'ctx Context) -> PointerType<'ctx> {
        context.i8_type().ptr_type(AddressSpace::default())
    }

    /// Produces `e.<lambda.name>`: the env_api header followed by one slot per captured formal.
    pub fn local_env_type(
        &self,
        context: &'ctx Context,
        lambda: &Lambda,
    ) -> Result<StructType<'ctx>, CodegenError> {
        let name = format!("e.{}", lambda.name);
        if let Some(found) = self.environments.borrow().get(&name) {
            return Ok(*found);
        }

        let ptr = context.i8_type().ptr_type(AddressSpace::default());
        let mut members = vec![ptr.into(), ptr.into()];
        for formal in lambda.captured_formals() {
            members.push(self.lower(context, &formal.value_type)?);
        }

        let env_struct = context.opaque_struct_type(&name);
        env_struct.set_body(&members, false);
        self.environments.borrow_mut().insert(name, env_struct);
        Ok(env_struct)
    }

    /// Produces the canonical `{ fn_ptr, env_ptr }` closure struct.
    ///
    /// `callee` names the construction site for readability in diagnostics only (matching the
    /// `c.<callee>` convention used for symbol names elsewhere) — it does not change the IR
    /// type produced. LLVM's identified (named) struct types are nominal, not structural: a
    /// value of a per-callee-named struct type could not be passed where a different
    /// per-callee-named struct type is expected, even with byte-identical layout, which would
    /// break every higher-order call (a formal typed `(f64->f64)` must accept a closure built
    /// at *any* construction site). The closure type is therefore always LLVM's literal
    /// (unnamed) `{ ptr, ptr }` struct, which LLVM treats structurally — any two closures are
    /// interchangeable regardless of which callee constructed them.
    pub fn closure_type(&self, context: &'ctx Context, _callee: &str) -> StructType<'ctx> {
        if let Some(found) = *self.closures_literal.borrow() {
            return found;
        }
        let ptr = context.i8_type().ptr_type(AddressSpace::default());
        let closure = context.struct_type(&[ptr.into(), ptr.into()], false);
        *self.closures_literal.borrow_mut() = Some(closure);
        closure
    }
}

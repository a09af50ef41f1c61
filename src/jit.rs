//! JIT façade: owns the IR context and the current module, commits finished modules into a
//! running execution session, interns and resolves symbols.
//!
//! `inkwell`'s `ExecutionEngine<'ctx>` and `Module<'ctx>` both borrow the context that built
//! them, so a struct that owns its own `Context` and also holds types/values derived from it
//! is self-referential and not expressible safely in Rust. The resolution used here, modelled
//! on the teacher's own `CodegenContext<'ctx>` (`context: &'ctx Context`), is for `Jit<'ctx>`
//! to *borrow* a `Context` the caller constructs and keeps alive for the façade's entire
//! lifetime, rather than to own one.
//!
//! The façade bootstraps its `ExecutionEngine` against a throwaway empty module purely so the
//! engine has an owner before any real code exists; every subsequent module — including the
//! very first one the code generator fills in — is transferred the same way via
//! `ExecutionEngine::add_module`, so `commit_module` never special-cases "the first module."

use std::cell::RefCell;
use std::sync::Once;

use inkwell::context::Context;
use inkwell::execution_engine::ExecutionEngine;
use inkwell::module::Module;
use inkwell::targets::{CodeModel, InitializationConfig, RelocMode, Target, TargetMachine};
use inkwell::OptimizationLevel;

use crate::error::{CodegenError, SymbolNotFound};
use crate::pipeline::IrPipeline;
use crate::types::TypeCache;

static INIT_NATIVE_TARGET: Once = Once::new();

fn ensure_native_target_initialized() {
    INIT_NATIVE_TARGET.call_once(|| {
        Target::initialize_native(&InitializationConfig::default())
            .expect("failed to initialize native target");
    });
}

pub struct Jit<'ctx> {
    context: &'ctx Context,
    engine: ExecutionEngine<'ctx>,
    module: RefCell<Module<'ctx>>,
    pipeline: RefCell<IrPipeline<'ctx>>,
    types: TypeCache<'ctx>,
    target_machine: TargetMachine,
    module_counter: RefCell<usize>,
}

impl<'ctx> Jit<'ctx> {
    pub fn new(context: &'ctx Context) -> Self {
        ensure_native_target_initialized();

        let triple = TargetMachine::get_default_triple();
        let target = Target::from_triple(&triple).expect("no target backend for host triple");
        let target_machine = target
            .create_target_machine(
                &triple,
                &TargetMachine::get_host_cpu_name().to_string(),
                &TargetMachine::get_host_cpu_features().to_string(),
                OptimizationLevel::None,
                RelocMode::Default,
                CodeModel::Default,
            )
            .expect("failed to create target machine for host triple");

        let bootstrap = context.create_module("bootstrap");
        let engine = bootstrap
            .create_jit_execution_engine(OptimizationLevel::None)
            .expect("failed to create JIT execution engine");

        let module = context.create_module("module.0");
        module.set_data_layout(&target_machine.get_target_data().get_data_layout());
        module.set_triple(&triple);
        let pipeline = IrPipeline::new(&module);

        Self {
            context,
            engine,
            module: RefCell::new(module),
            pipeline: RefCell::new(pipeline),
            types: TypeCache::new(),
            target_machine,
            module_counter: RefCell::new(1),
        }
    }

    pub fn context(&self) -> &'ctx Context {
        self.context
    }

    pub fn types(&self) -> &TypeCache<'ctx> {
        &self.types
    }

    pub fn engine(&self) -> &ExecutionEngine<'ctx> {
        &self.engine
    }

    pub fn with_module<R>(&self, f: impl FnOnce(&Module<'ctx>) -> R) -> R {
        f(&self.module.borrow())
    }

    pub fn pipeline(&self) -> &RefCell<IrPipeline<'ctx>> {
        &self.pipeline
    }

    pub fn data_layout(&self) -> String {
        self.target_machine
            .get_target_data()
            .get_data_layout()
            .as_str()
            .to_string_lossy()
            .into_owned()
    }

    pub fn target_triple(&self) -> String {
        self.target_machine.get_triple().as_str().to_string_lossy().into_owned()
    }

    pub fn function_names(&self) -> Vec<String> {
        self.module
            .borrow()
            .get_functions()
            .map(|f| f.get_name().to_string_lossy().into_owned())
            .collect()
    }

    /// Binds `symbol` to `address` in the execution session. Must precede `commit_module` for
    /// any module that references the symbol.
    pub fn intern(&self, symbol: &str, address: usize) {
        let module = self.module.borrow();
        if let Some(function) = module.get_function(symbol) {
            self.engine.add_global_mapping(&function, address);
        }
    }

    /// User-supplied names pass through unchanged: on the ELF-like targets this crate runs
    /// against, `inkwell`'s JIT symbol resolution operates on the name given to
    /// `Module::add_function` directly, so there is no separate mangling step to perform.
    pub fn mangle(&self, symbol: &str) -> String {
        symbol.to_string()
    }

    /// Transfers the current module into the execution session, then installs a fresh module
    /// and pipeline. The previous module's functions and builder positions become unreachable
    /// through this façade after the call returns.
    pub fn commit_module(&self) -> Result<(), CodegenError> {
        let finished = self.module.borrow();
        self.engine
            .add_module(&finished)
            .map_err(|_| CodegenError::RedeclaredFunction(crate::error::RedeclaredFunction {
                name: finished.get_name().to_string_lossy().into_owned(),
                existing_signature: "already owned by execution engine".into(),
                requested_signature: "new commit".into(),
            }))?;
        drop(finished);

        let mut counter = self.module_counter.borrow_mut();
        let fresh = self.context.create_module(&format!("module.{counter}"));
        fresh.set_data_layout(&self.target_machine.get_target_data().get_data_layout());
        fresh.set_triple(&self.target_machine.get_triple());
        *counter += 1;

        *self.pipeline.borrow_mut() = IrPipeline::new(&fresh);
        *self.module.borrow_mut() = fresh;
        Ok(())
    }

    /// Resolves a previously committed symbol to a native function pointer.
    pub fn lookup(&self, symbol: &str) -> Result<usize, CodegenError> {
        self.engine
            .get_function_address(symbol)
            .map(|addr| addr as usize)
            .map_err(|_| {
                CodegenError::SymbolNotFound(SymbolNotFound {
                    symbol: symbol.to_string(),
                })
            })
    }
}

//! Fixed per-function IR optimization pipeline.
//!
//! instruction combining -> mem-to-register promotion -> reassociation -> global value
//! numbering -> control-flow simplification. No adaptive selection, no thresholds; the whole
//! sequence runs once on every function immediately after it verifies.

use inkwell::module::Module;
use inkwell::passes::PassManager;
use inkwell::values::FunctionValue;

pub struct IrPipeline<'ctx> {
    fpm: PassManager<FunctionValue<'ctx>>,
}

impl<'ctx> IrPipeline<'ctx> {
    pub fn new(module: &Module<'ctx>) -> Self {
        let fpm = PassManager::create(module);
        fpm.add_instruction_combining_pass();
        fpm.add_promote_memory_to_register_pass();
        fpm.add_reassociate_pass();
        fpm.add_gvn_pass();
        fpm.add_cfg_simplification_pass();
        fpm.initialize();
        Self { fpm }
    }

    /// Runs the fixed sequence once against `function`. Mem-to-reg is the load-bearing pass:
    /// it is what turns the activation record's alloca/load/store traffic back into SSA values.
    pub fn run(&self, function: FunctionValue<'ctx>) {
        self.fpm.run_on(&function);
    }
}

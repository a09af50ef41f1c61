//! Code generation: walks the AST, emits IR for every node kind, and performs closure
//! conversion.
//!
//! ## Closure representation
//!
//! Every callable value — primitive or user lambda — is represented at the IR level as the
//! same two-pointer struct, nominally named `c.<callee>` per callee but structurally
//! `{ fn_ptr, env_ptr }` in every case:
//!
//! ```text
//! closure { fn_ptr: wrapped_fn_ptr, env_ptr: env_api* }
//! ```
//!
//! `fn_ptr` always points to the *wrapped* signature (an injected `env_api*` parameter ahead
//! of the source parameters). `env_ptr` is the null pointer for primitives and for lambdas
//! that do not need a closure; for lambdas that do, it points to a concrete `e.<lambda>`
//! environment struct, itself built on the stack by that lambda's own `ActivationRecord`.
//!
//! ## Lambda lifecycle
//!
//! `declared -> defining (activation pushed) -> verified -> optimised -> committed-to-module`.
//! Discovery happens once, up front, in pre-order over the whole AST, so mutually recursive
//! lambdas resolve without forward-declaration gymnastics (`discover_lambdas` +
//! `codegen_lambda_decl`). Definitions are emitted lazily, during ordinary expression
//! traversal, which is what lets a nested lambda see its enclosing lambda's still-open
//! activation record.

pub mod activation_record;
pub mod expressions;

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use inkwell::builder::Builder;
use inkwell::values::{BasicValueEnum, FunctionValue, PointerValue};
use inkwell::AddressSpace;
use log::{debug, trace};

use crate::ast::{Lambda, Node};
use crate::error::CodegenError;
use crate::jit::Jit;

use activation_record::ActivationRecord;

pub struct CodegenContext<'ctx> {
    pub jit: &'ctx Jit<'ctx>,
    pub builder: Builder<'ctx>,
    activation_stack: RefCell<Vec<ActivationRecord<'ctx>>>,
    globals: RefCell<HashMap<String, Rc<Lambda>>>,
    declared: RefCell<HashMap<String, FunctionValue<'ctx>>>,
    defined: RefCell<HashMap<String, bool>>,
    wrappers: RefCell<HashMap<String, FunctionValue<'ctx>>>,
}

impl<'ctx> CodegenContext<'ctx> {
    pub fn new(jit: &'ctx Jit<'ctx>) -> Self {
        Self {
            jit,
            builder: jit.context().create_builder(),
            activation_stack: RefCell::new(Vec::new()),
            globals: RefCell::new(HashMap::new()),
            declared: RefCell::new(HashMap::new()),
            defined: RefCell::new(HashMap::new()),
            wrappers: RefCell::new(HashMap::new()),
        }
    }

    fn push_activation(&self, record: ActivationRecord<'ctx>) {
        self.activation_stack.borrow_mut().push(record);
    }

    fn pop_activation(&self) -> Option<ActivationRecord<'ctx>> {
        self.activation_stack.borrow_mut().pop()
    }

    /// Walks the whole activation-record stack from innermost to outermost, returning how many
    /// `env_api.parent` hops separate the binding's frame from the current one (`0` for the
    /// current frame itself) together with the detail recorded there.
    fn lookup_var_with_depth(
        &self,
        name: &str,
    ) -> Option<(usize, activation_record::RuntimeBindingDetail<'ctx>)> {
        let stack = self.activation_stack.borrow();
        for (depth, record) in stack.iter().rev().enumerate() {
            if let Some(detail) = record.lookup_var(name) {
                return Some((depth, *detail));
            }
        }
        None
    }

    /// Looks up the captured-slot index of `name` in the activation record `depth` hops up
    /// from the current one (0 = current), together with that record's lambda (needed to
    /// rebuild the environment struct's IR type for a fresh GEP).
    fn env_slot_at_depth(&self, depth: usize, name: &str) -> Option<(Rc<Lambda>, u32)> {
        let stack = self.activation_stack.borrow();
        let record = stack.iter().rev().nth(depth)?;
        let slot = record.env_slot(name)?;
        Some((record.lambda.clone(), slot))
    }

    fn declared_function(&self, name: &str) -> Option<FunctionValue<'ctx>> {
        self.declared.borrow().get(name).copied()
    }

    fn mark_declared(&self, name: &str, function: FunctionValue<'ctx>) {
        self.declared.borrow_mut().insert(name.to_string(), function);
    }

    fn is_defined(&self, name: &str) -> bool {
        self.defined.borrow().get(name).copied().unwrap_or(false)
    }

    fn mark_defined(&self, name: &str) {
        self.defined.borrow_mut().insert(name.to_string(), true);
    }

    fn global_lambda(&self, name: &str) -> Option<Rc<Lambda>> {
        self.globals.borrow().get(name).cloned()
    }

    fn wrapper_function(&self, name: &str) -> Option<FunctionValue<'ctx>> {
        self.wrappers.borrow().get(name).copied()
    }

    fn mark_wrapper(&self, name: &str, function: FunctionValue<'ctx>) {
        self.wrappers.borrow_mut().insert(name.to_string(), function);
    }

    /// The current lambda's environment pointer, or null outside any lambda / when the current
    /// lambda does not need a closure. Used at *closure construction* sites: a lambda nested in
    /// the current one closes over the current one's own outgoing environment.
    fn current_env_ptr(&self) -> PointerValue<'ctx> {
        self.activation_stack
            .borrow()
            .last()
            .and_then(|record| record.env_alloca())
            .unwrap_or_else(|| self.jit.context().i8_type().ptr_type(AddressSpace::default()).const_null())
    }

    /// The current frame's *incoming* environment pointer (argument 0 of the wrapped
    /// signature), or null at top level. Used at *variable resolution* sites: walking up to an
    /// ancestor's captured slot starts from what this frame itself received, not from whatever
    /// environment this frame happens to be building for its own nested lambdas.
    fn current_incoming_env_ptr(&self) -> PointerValue<'ctx> {
        self.activation_stack
            .borrow()
            .last()
            .map(|record| record.incoming_env())
            .unwrap_or_else(|| self.jit.context().i8_type().ptr_type(AddressSpace::default()).const_null())
    }

    /// Builds `{ fn_ptr, env_ptr }` named `c.<callee>`.
    fn build_closure_value(
        &self,
        callee: &str,
        fn_ptr: PointerValue<'ctx>,
        env_ptr: PointerValue<'ctx>,
    ) -> BasicValueEnum<'ctx> {
        let closure_type = self.jit.types().closure_type(self.jit.context(), callee);
        let undef = closure_type.get_undef();
        let with_fn = self
            .builder
            .build_insert_value(undef, fn_ptr, 0, "closure.fn")
            .expect("closure struct has field 0")
            .into_struct_value();
        let complete = self
            .builder
            .build_insert_value(with_fn, env_ptr, 1, "closure.env")
            .expect("closure struct has field 1")
            .into_struct_value();
        complete.into()
    }

    fn extract_closure_fn_ptr(&self, closure: BasicValueEnum<'ctx>) -> PointerValue<'ctx> {
        self.builder
            .build_extract_value(closure.into_struct_value(), 0, "closure.fn.extract")
            .expect("closure struct has field 0")
            .into_pointer_value()
    }

    fn extract_closure_env_ptr(&self, closure: BasicValueEnum<'ctx>) -> PointerValue<'ctx> {
        self.builder
            .build_extract_value(closure.into_struct_value(), 1, "closure.env.extract")
            .expect("closure struct has field 1")
            .into_pointer_value()
    }

    /// Discovers every lambda reachable from `node` in pre-order, registers it in the global
    /// environment and emits its declaration (idempotent — repeat occurrences are a no-op).
    fn discover_lambdas(&self, node: &Node) -> Result<(), CodegenError> {
        match node {
            Node::Lambda(lambda) => {
                if self.global_lambda(&lambda.name).is_none() {
                    debug!("discovered lambda '{}', declaring", lambda.name);
                    self.globals
                        .borrow_mut()
                        .insert(lambda.name.clone(), lambda.clone());
                    expressions::lambda::codegen_lambda_decl(self, lambda)?;
                }
                self.discover_lambdas(&lambda.body)?;
            }
            Node::Apply { callee, args } => {
                self.discover_lambdas(callee)?;
                for arg in args {
                    self.discover_lambdas(arg)?;
                }
            }
            Node::IfExpr {
                test,
                when_true,
                when_false,
            } => {
                self.discover_lambdas(test)?;
                self.discover_lambdas(when_true)?;
                self.discover_lambdas(when_false)?;
            }
            Node::Constant { .. } | Node::Primitive { .. } | Node::Variable { .. } => {}
        }
        Ok(())
    }

    /// Entry point: discovers and declares every lambda reachable from `ast`, then emits IR
    /// for `ast` itself.
    pub fn codegen_toplevel(&self, ast: &Node) -> Result<BasicValueEnum<'ctx>, CodegenError> {
        self.discover_lambdas(ast)?;
        self.codegen_expr(ast)
    }

    pub fn codegen_expr(&self, node: &Node) -> Result<BasicValueEnum<'ctx>, CodegenError> {
        trace!("emitting node {node:?}");
        match node {
            Node::Constant { value_type, value } => {
                expressions::constant::codegen_constant(self, value_type, value)
            }
            Node::Primitive {
                name,
                native_address,
                explicit_symbol,
                intrinsic_hint,
                params,
                return_type,
            } => expressions::primitive::codegen_primitive_closure(
                self,
                name,
                *native_address,
                explicit_symbol.as_deref(),
                *intrinsic_hint,
                params,
                return_type,
            ),
            Node::Variable { name, value_type } => {
                expressions::variable::codegen_variable(self, name, value_type)
            }
            Node::Apply { callee, args } => expressions::apply::codegen_apply(self, callee, args),
            Node::IfExpr {
                test,
                when_true,
                when_false,
            } => expressions::if_expr::codegen_ifexpr(self, test, when_true, when_false),
            Node::Lambda(lambda) => expressions::lambda::codegen_lambda_closure(self, lambda),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use anyhow::Result;
    use inkwell::context::Context;
    use inkwell::execution_engine::JitFunction;

    use crate::ast::{
        Capture, CaptureInfo, ConstantValue, Formal, IntrinsicHint, Lambda, Node,
    };
    use crate::jit::Jit;
    use crate::types::TypeDescriptor;

    use super::CodegenContext;

    fn sqrt_primitive() -> Rc<Node> {
        Rc::new(Node::Primitive {
            name: "sqrt".into(),
            native_address: Some(f64::sqrt as usize),
            explicit_symbol: Some("sqrt".into()),
            intrinsic_hint: IntrinsicHint::FpSqrt,
            params: vec![TypeDescriptor::F64],
            return_type: TypeDescriptor::F64,
        })
    }

    fn variable(name: &str, ty: TypeDescriptor) -> Rc<Node> {
        Rc::new(Node::Variable {
            name: name.into(),
            value_type: ty,
        })
    }

    /// Scenario A: `lambda x:f64. sqrt(sqrt(x))`, named `root4`.
    #[test]
    fn nested_primitive_call() -> Result<()> {
        let body = Rc::new(Node::Apply {
            callee: sqrt_primitive(),
            args: vec![Rc::new(Node::Apply {
                callee: sqrt_primitive(),
                args: vec![variable("x", TypeDescriptor::F64)],
            })],
        });

        let lambda = Rc::new(Lambda {
            name: "root4".into(),
            formals: vec![Formal {
                name: "x".into(),
                value_type: TypeDescriptor::F64,
            }],
            body,
            return_type: TypeDescriptor::F64,
            capture_info: CaptureInfo::none_captured(1),
        });

        let context = Context::create();
        let jit = Jit::new(&context);
        let ctx = CodegenContext::new(&jit);

        ctx.codegen_toplevel(&Node::Lambda(lambda))?;
        jit.commit_module()?;

        unsafe {
            // The emitted function's real IR signature always prepends the environment
            // pointer (null here, since `root4` never closes over anything); the source-level
            // call in the scenario description omits it, but a native caller must still pass
            // it through.
            let f: JitFunction<unsafe extern "C" fn(*mut u8, f64) -> f64> =
                jit.engine().get_function("root4")?;
            let env = std::ptr::null_mut();
            assert!((f.call(env, 1.0) - 1.0).abs() < 1e-9);
            assert!((f.call(env, 16.0) - 2.0).abs() < 1e-9);
            assert!((f.call(env, 81.0) - 3.0).abs() < 1e-9);
        }
        Ok(())
    }

    /// Scenario C: `lambda x:f64. if x then 1.0 else 2.0`, named `sgn`.
    #[test]
    fn conditional_dispatch() -> Result<()> {
        let body = Rc::new(Node::IfExpr {
            test: variable("x", TypeDescriptor::F64),
            when_true: Rc::new(Node::Constant {
                value_type: TypeDescriptor::F64,
                value: ConstantValue::Float(1.0),
            }),
            when_false: Rc::new(Node::Constant {
                value_type: TypeDescriptor::F64,
                value: ConstantValue::Float(2.0),
            }),
        });

        let lambda = Rc::new(Lambda {
            name: "sgn".into(),
            formals: vec![Formal {
                name: "x".into(),
                value_type: TypeDescriptor::F64,
            }],
            body,
            return_type: TypeDescriptor::F64,
            capture_info: CaptureInfo::none_captured(1),
        });

        let context = Context::create();
        let jit = Jit::new(&context);
        let ctx = CodegenContext::new(&jit);

        ctx.codegen_toplevel(&Node::Lambda(lambda))?;
        jit.commit_module()?;

        unsafe {
            let f: JitFunction<unsafe extern "C" fn(*mut u8, f64) -> f64> =
                jit.engine().get_function("sgn")?;
            let env = std::ptr::null_mut();
            assert_eq!(f.call(env, 0.0), 2.0);
            assert_eq!(f.call(env, 0.5), 1.0);
            assert_eq!(f.call(env, -0.5), 1.0);
        }
        Ok(())
    }

    /// Scenario F: a lambda whose body references a name not in its formal list fails with
    /// `UnboundVariable`, and the module ends up with no function under its name.
    #[test]
    fn unbound_variable_is_reported() {
        let lambda = Rc::new(Lambda {
            name: "broken".into(),
            formals: vec![Formal {
                name: "x".into(),
                value_type: TypeDescriptor::F64,
            }],
            body: variable("y", TypeDescriptor::F64),
            return_type: TypeDescriptor::F64,
            capture_info: CaptureInfo::none_captured(1),
        });

        let context = Context::create();
        let jit = Jit::new(&context);
        let ctx = CodegenContext::new(&jit);

        let result = ctx.codegen_toplevel(&Node::Lambda(lambda));
        assert!(matches!(result, Err(crate::error::CodegenError::UnboundVariable(_))));
        assert!(jit.with_module(|m| m.get_function("broken").is_none()));
    }

    #[test]
    fn function_typed_parameter_applies_twice() -> Result<()> {
        // lambda f:(f64->f64), x:f64. f(f(x))
        let inner = Rc::new(Lambda {
            name: "apply_twice".into(),
            formals: vec![
                Formal {
                    name: "f".into(),
                    value_type: TypeDescriptor::Function {
                        params: vec![TypeDescriptor::F64],
                        return_value: Box::new(TypeDescriptor::F64),
                    },
                },
                Formal {
                    name: "x".into(),
                    value_type: TypeDescriptor::F64,
                },
            ],
            body: Rc::new(Node::Apply {
                callee: variable(
                    "f",
                    TypeDescriptor::Function {
                        params: vec![TypeDescriptor::F64],
                        return_value: Box::new(TypeDescriptor::F64),
                    },
                ),
                args: vec![Rc::new(Node::Apply {
                    callee: variable(
                        "f",
                        TypeDescriptor::Function {
                            params: vec![TypeDescriptor::F64],
                            return_value: Box::new(TypeDescriptor::F64),
                        },
                    ),
                    args: vec![variable("x", TypeDescriptor::F64)],
                })],
            }),
            return_type: TypeDescriptor::F64,
            // `f` is applied directly in this lambda's own body, never referenced by a
            // nested lambda, so it is stack-only; this lambda never closes over anything.
            capture_info: CaptureInfo::none_captured(2),
        });

        let outer = Rc::new(Lambda {
            name: "root_2x".into(),
            formals: vec![Formal {
                name: "x2".into(),
                value_type: TypeDescriptor::F64,
            }],
            body: Rc::new(Node::Apply {
                callee: Rc::new(Node::Lambda(inner)),
                args: vec![sqrt_primitive(), variable("x2", TypeDescriptor::F64)],
            }),
            return_type: TypeDescriptor::F64,
            capture_info: CaptureInfo::none_captured(1),
        });

        let context = Context::create();
        let jit = Jit::new(&context);
        let ctx = CodegenContext::new(&jit);

        ctx.codegen_toplevel(&Node::Lambda(outer))?;
        jit.commit_module()?;

        unsafe {
            let f: JitFunction<unsafe extern "C" fn(*mut u8, f64) -> f64> =
                jit.engine().get_function("root_2x")?;
            assert!((f.call(std::ptr::null_mut(), 16.0) - 2.0).abs() < 1e-9);
        }
        Ok(())
    }

    /// Scenario D: `lambda a:f64, b:f64. add(a, b)` where `add` has hint `fp_add`. The body's
    /// IR must contain a floating-point add instruction and no call instruction.
    #[test]
    fn intrinsic_add_has_no_call_instruction() -> Result<()> {
        extern "C" fn add_impl(a: f64, b: f64) -> f64 {
            a + b
        }

        let add = Rc::new(Node::Primitive {
            name: "add".into(),
            native_address: Some(add_impl as usize),
            explicit_symbol: Some("add".into()),
            intrinsic_hint: IntrinsicHint::FpAdd,
            params: vec![TypeDescriptor::F64, TypeDescriptor::F64],
            return_type: TypeDescriptor::F64,
        });

        let lambda = Rc::new(Lambda {
            name: "add_two".into(),
            formals: vec![
                Formal {
                    name: "a".into(),
                    value_type: TypeDescriptor::F64,
                },
                Formal {
                    name: "b".into(),
                    value_type: TypeDescriptor::F64,
                },
            ],
            body: Rc::new(Node::Apply {
                callee: add,
                args: vec![
                    variable("a", TypeDescriptor::F64),
                    variable("b", TypeDescriptor::F64),
                ],
            }),
            return_type: TypeDescriptor::F64,
            capture_info: CaptureInfo::none_captured(2),
        });

        let context = Context::create();
        let jit = Jit::new(&context);
        let ctx = CodegenContext::new(&jit);

        ctx.codegen_toplevel(&Node::Lambda(lambda))?;
        let ir = jit.with_module(|m| m.print_to_string().to_string());
        let body = ir
            .split("define")
            .find(|chunk| chunk.contains("@add_two"))
            .expect("add_two function present in module IR");
        assert!(body.contains("fadd"), "expected a fadd instruction:\n{body}");
        assert!(!body.contains("call "), "expected no call instruction:\n{body}");

        jit.commit_module()?;
        unsafe {
            let f: JitFunction<unsafe extern "C" fn(*mut u8, f64, f64) -> f64> =
                jit.engine().get_function("add_two")?;
            assert_eq!(f.call(std::ptr::null_mut(), 2.0, 3.0), 5.0);
        }
        Ok(())
    }

    /// Scenario E: a struct-returning primitive wrapped by a lambda.
    #[test]
    fn structure_returning_primitive() -> Result<()> {
        #[repr(C)]
        struct Ratio {
            num: i32,
            den: i32,
        }

        extern "C" fn make_ratio_impl(num: i32, den: i32) -> Ratio {
            Ratio { num, den }
        }

        let ratio_type = TypeDescriptor::Struct {
            name: "ratio".into(),
            members: vec![
                ("num".into(), TypeDescriptor::I32),
                ("den".into(), TypeDescriptor::I32),
            ],
        };

        let make_ratio_impl_node = Rc::new(Node::Primitive {
            name: "make_ratio_impl".into(),
            native_address: Some(make_ratio_impl as usize),
            explicit_symbol: Some("make_ratio_impl".into()),
            intrinsic_hint: IntrinsicHint::None,
            params: vec![TypeDescriptor::I32, TypeDescriptor::I32],
            return_type: ratio_type.clone(),
        });

        let lambda = Rc::new(Lambda {
            name: "make_ratio".into(),
            formals: vec![
                Formal {
                    name: "num".into(),
                    value_type: TypeDescriptor::I32,
                },
                Formal {
                    name: "den".into(),
                    value_type: TypeDescriptor::I32,
                },
            ],
            body: Rc::new(Node::Apply {
                callee: make_ratio_impl_node,
                args: vec![
                    variable("num", TypeDescriptor::I32),
                    variable("den", TypeDescriptor::I32),
                ],
            }),
            return_type: ratio_type,
            capture_info: CaptureInfo::none_captured(2),
        });

        let context = Context::create();
        let jit = Jit::new(&context);
        let ctx = CodegenContext::new(&jit);

        ctx.codegen_toplevel(&Node::Lambda(lambda))?;
        jit.commit_module()?;

        #[repr(C)]
        struct RatioAbi {
            num: i32,
            den: i32,
        }

        unsafe {
            let f: JitFunction<unsafe extern "C" fn(*mut u8, i32, i32) -> RatioAbi> =
                jit.engine().get_function("make_ratio")?;
            let result = f.call(std::ptr::null_mut(), 2, 3);
            assert_eq!(result.num, 2);
            assert_eq!(result.den, 3);
        }
        Ok(())
    }

    /// A closure that actually captures something: `with_offset(n, x)` builds a closure over
    /// `n` and applies it to `x` before returning, so `n` is read back out through a non-null
    /// environment pointer while the environment's defining activation is still alive (per
    /// scope, a closure that *outlives* its defining activation is a separate, unimplemented
    /// copy-to-heap path, not exercised here).
    #[test]
    fn captured_variable_via_environment_chain() -> Result<()> {
        extern "C" fn add_impl(a: f64, b: f64) -> f64 {
            a + b
        }

        let add = Rc::new(Node::Primitive {
            name: "add".into(),
            native_address: Some(add_impl as usize),
            explicit_symbol: Some("add_captured".into()),
            intrinsic_hint: IntrinsicHint::FpAdd,
            params: vec![TypeDescriptor::F64, TypeDescriptor::F64],
            return_type: TypeDescriptor::F64,
        });

        let adder = Rc::new(Lambda {
            name: "adder".into(),
            formals: vec![Formal {
                name: "y".into(),
                value_type: TypeDescriptor::F64,
            }],
            body: Rc::new(Node::Apply {
                callee: add,
                args: vec![
                    variable("n", TypeDescriptor::F64),
                    variable("y", TypeDescriptor::F64),
                ],
            }),
            return_type: TypeDescriptor::F64,
            // `adder`'s own formal `y` is never captured by anything nested inside it, but
            // `adder` itself references the free variable `n`, so it needs a non-null
            // incoming environment.
            capture_info: CaptureInfo {
                formals: vec![Capture::StackOnly],
                needs_closure: true,
            },
        });

        let outer = Rc::new(Lambda {
            name: "with_offset".into(),
            formals: vec![
                Formal {
                    name: "n".into(),
                    value_type: TypeDescriptor::F64,
                },
                Formal {
                    name: "x".into(),
                    value_type: TypeDescriptor::F64,
                },
            ],
            body: Rc::new(Node::Apply {
                callee: Rc::new(Node::Lambda(adder)),
                args: vec![variable("x", TypeDescriptor::F64)],
            }),
            return_type: TypeDescriptor::F64,
            // `n` is captured by the nested `adder` lambda; `x` stays stack-only.
            capture_info: CaptureInfo {
                formals: vec![Capture::Captured, Capture::StackOnly],
                needs_closure: true,
            },
        });

        let context = Context::create();
        let jit = Jit::new(&context);
        let ctx = CodegenContext::new(&jit);

        ctx.codegen_toplevel(&Node::Lambda(outer))?;
        jit.commit_module()?;

        unsafe {
            let f: JitFunction<unsafe extern "C" fn(*mut u8, f64, f64) -> f64> =
                jit.engine().get_function("with_offset")?;
            let env = std::ptr::null_mut();
            assert_eq!(f.call(env, 5.0, 3.0), 8.0);
            assert_eq!(f.call(env, 5.0, 10.0), 15.0);
        }
        Ok(())
    }

    static LOGGER_INIT: std::sync::Once = std::sync::Once::new();

    fn init_test_logger() {
        LOGGER_INIT.call_once(|| {
            let _ = simple_logger::init_with_level(log::Level::Trace);
        });
    }

    /// Not a correctness test: exercises the `log::debug!`/`log::trace!` calls threaded through
    /// lambda discovery, definition and per-node emission, with a real logger installed so the
    /// output is visible when run with `--nocapture`.
    #[test]
    fn lambda_lifecycle_logging_is_visible() -> Result<()> {
        init_test_logger();

        let lambda = Rc::new(Lambda {
            name: "identity_log_demo".into(),
            formals: vec![Formal {
                name: "x".into(),
                value_type: TypeDescriptor::F64,
            }],
            body: variable("x", TypeDescriptor::F64),
            return_type: TypeDescriptor::F64,
            capture_info: CaptureInfo::none_captured(1),
        });

        let context = Context::create();
        let jit = Jit::new(&context);
        let ctx = CodegenContext::new(&jit);

        ctx.codegen_toplevel(&Node::Lambda(lambda))?;
        jit.commit_module()?;
        Ok(())
    }
}

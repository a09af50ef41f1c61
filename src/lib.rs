//! Lowers a small typed, Scheme-like functional intermediate language — constants, primitive
//! references, variable references, application, conditionals and user-defined lambdas — into
//! LLVM IR with closure conversion, and hands the result to an in-process JIT so that named
//! functions become callable native pointers inside the host process.
//!
//! AST construction (and any parsing or type inference in front of it) is an external
//! collaborator's job; this crate consumes an already-typed [`ast::Node`] tree.

pub mod ast;
pub mod codegen;
pub mod error;
pub mod jit;
pub mod pipeline;
pub mod types;

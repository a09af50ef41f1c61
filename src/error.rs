//! Error kinds produced by type lowering and code generation.
//!
//! Mirrors the dispatch-enum-over-per-kind-structs shape used by the type checker's own
//! error type: a small enum wrapping a payload struct per kind, with manual `Display`/`Error`
//! impls rather than a derive macro.

use std::fmt::{self, Display};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownType {
    pub type_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArityMismatch {
    pub callee: String,
    pub expected: usize,
    pub found: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeMismatch {
    pub callee: String,
    pub argno: usize,
    pub expected: String,
    pub found: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnboundVariable {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateBinding {
    pub name: String,
    pub lambda: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IrVerificationFailure {
    pub function: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolNotFound {
    pub symbol: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedeclaredFunction {
    pub name: String,
    pub existing_signature: String,
    pub requested_signature: String,
}

/// Diagnostic raised by any stage of type lowering or code generation.
///
/// Every generation routine returns `Result<_, CodegenError>` rather than a null sentinel;
/// the caller is expected to propagate the first error encountered without attempting to
/// consume a half-built value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodegenError {
    UnknownType(UnknownType),
    ArityMismatch(ArityMismatch),
    TypeMismatch(TypeMismatch),
    UnboundVariable(UnboundVariable),
    DuplicateBinding(DuplicateBinding),
    IrVerificationFailure(IrVerificationFailure),
    SymbolNotFound(SymbolNotFound),
    RedeclaredFunction(RedeclaredFunction),
}

impl Display for CodegenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownType(e) => {
                write!(f, "codegen: cannot lower type '{}'", e.type_name)
            }
            Self::ArityMismatch(e) => write!(
                f,
                "codegen: '{}' expects {} argument(s), found {}",
                e.callee, e.expected, e.found
            ),
            Self::TypeMismatch(e) => write!(
                f,
                "codegen: '{}' argument {} expected type '{}', found '{}'",
                e.callee, e.argno, e.expected, e.found
            ),
            Self::UnboundVariable(e) => {
                write!(f, "codegen: unbound variable '{}'", e.name)
            }
            Self::DuplicateBinding(e) => write!(
                f,
                "codegen: '{}' already bound in activation record of '{}'",
                e.name, e.lambda
            ),
            Self::IrVerificationFailure(e) => write!(
                f,
                "codegen: function '{}' failed IR verification: {}",
                e.function, e.message
            ),
            Self::SymbolNotFound(e) => {
                write!(f, "codegen: symbol '{}' not found after commit", e.symbol)
            }
            Self::RedeclaredFunction(e) => write!(
                f,
                "codegen: '{}' redeclared with incompatible signature (existing '{}', requested '{}')",
                e.name, e.existing_signature, e.requested_signature
            ),
        }
    }
}

impl std::error::Error for CodegenError {}

pub type CodegenResult<T> = Result<T, CodegenError>;

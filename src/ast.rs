//! The typed intermediate language this crate lowers: constants, primitive references,
//! variable references, application, conditionals and user lambdas.
//!
//! Construction and typing of these nodes are an external collaborator's job (an AST builder
//! or parser sitting in front of this crate); `Node` is immutable once built, matching the
//! single-owner-tree-with-shared-immutable-subexpressions shape called for when a
//! reference-counted source representation is rewritten in a language without it. `Rc` is used
//! only where a `Lambda` needs to be referenced both from the AST it appears in and from the
//! generator's global environment map.

use std::rc::Rc;

use crate::types::TypeDescriptor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntrinsicHint {
    None,
    INeg,
    IAdd,
    ISub,
    IMul,
    ISdiv,
    IUdiv,
    FpAdd,
    FpSub,
    FpMul,
    FpDiv,
    FpSqrt,
    FpSin,
    FpCos,
    FpTan,
    FpPow,
}

impl IntrinsicHint {
    /// Whether LLVM has a dedicated, non-call SSA instruction for this hint.
    ///
    /// Only the six integer arithmetic ops and the four binary floating point ops are
    /// instruction-backed; the five transcendental hints (sqrt/sin/cos/tan/pow) have no
    /// non-call IR form and are always lowered as ordinary calls, with the hint kept only as
    /// call-site metadata.
    pub fn is_instruction_backed(self) -> bool {
        matches!(
            self,
            Self::INeg
                | Self::IAdd
                | Self::ISub
                | Self::IMul
                | Self::ISdiv
                | Self::IUdiv
                | Self::FpAdd
                | Self::FpSub
                | Self::FpMul
                | Self::FpDiv
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConstantValue {
    Bool(bool),
    Int(i64),
    Float(f64),
}

/// A single formal parameter of a lambda.
#[derive(Debug, Clone, PartialEq)]
pub struct Formal {
    pub name: String,
    pub value_type: TypeDescriptor,
}

/// Whether a formal is referenced by some nested lambda (`Captured`) or not (`StackOnly`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capture {
    StackOnly,
    Captured,
}

/// Per-lambda capture analysis, supplied alongside the lambda node (spec's `capture_info`).
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureInfo {
    /// Parallel to `Lambda::formals`: capture classification of each formal.
    pub formals: Vec<Capture>,
    /// Whether the lambda's body contains any free variable at all.
    pub needs_closure: bool,
}

impl CaptureInfo {
    pub fn none_captured(arity: usize) -> Self {
        Self {
            formals: vec![Capture::StackOnly; arity],
            needs_closure: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Lambda {
    pub name: String,
    pub formals: Vec<Formal>,
    pub body: Rc<Node>,
    pub return_type: TypeDescriptor,
    pub capture_info: CaptureInfo,
}

impl Lambda {
    pub fn captured_formals(&self) -> impl Iterator<Item = &Formal> {
        self.formals
            .iter()
            .zip(self.capture_info.formals.iter())
            .filter(|(_, c)| matches!(c, Capture::Captured))
            .map(|(f, _)| f)
    }

    pub fn param_types(&self) -> Vec<TypeDescriptor> {
        self.formals.iter().map(|f| f.value_type.clone()).collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Constant {
        value_type: TypeDescriptor,
        value: ConstantValue,
    },
    Primitive {
        name: String,
        /// Native address to intern under `explicit_symbol`, when set.
        native_address: Option<usize>,
        explicit_symbol: Option<String>,
        intrinsic_hint: IntrinsicHint,
        params: Vec<TypeDescriptor>,
        return_type: TypeDescriptor,
    },
    Variable {
        name: String,
        value_type: TypeDescriptor,
    },
    Apply {
        callee: Rc<Node>,
        args: Vec<Rc<Node>>,
    },
    IfExpr {
        test: Rc<Node>,
        when_true: Rc<Node>,
        when_false: Rc<Node>,
    },
    Lambda(Rc<Lambda>),
}

impl Node {
    pub fn value_type(&self) -> TypeDescriptor {
        match self {
            Node::Constant { value_type, .. } => value_type.clone(),
            Node::Primitive {
                params,
                return_type,
                ..
            } => TypeDescriptor::Function {
                params: params.clone(),
                return_value: Box::new(return_type.clone()),
            },
            Node::Variable { value_type, .. } => value_type.clone(),
            Node::Apply { callee, .. } => match callee.value_type() {
                TypeDescriptor::Function { return_value, .. } => *return_value,
                other => other,
            },
            Node::IfExpr { when_true, .. } => when_true.value_type(),
            Node::Lambda(lambda) => TypeDescriptor::Function {
                params: lambda.param_types(),
                return_value: Box::new(lambda.return_type.clone()),
            },
        }
    }
}

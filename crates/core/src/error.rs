//! # Error Types
//!
//! Errors in autodag fall into two groups:
//!
//! - **Construction errors** (`TypeCheck`, `Arity`, `UnboundVariable`,
//!   `DuplicateVariable`, `EmptyVector`) are raised while building a graph,
//!   so a malformed graph never exists.
//! - **Evaluation errors** (`Dimension`, `Domain`, `UnknownVariable`) are
//!   raised by a single `eval`/`deriv` call. They abort that call only; the
//!   graph itself is immutable and stays valid.

use thiserror::Error;

use crate::ops::Op;

/// Errors for graph construction and evaluation.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AdError {
    /// An operand is not a variable, constant or expression.
    #[error("Type check failed: operand {slot} of `{op}` is not a variable, constant or expression")]
    TypeCheck { op: Op, slot: usize },

    /// Wrong number of operands for an operation.
    #[error("`{op}` takes {expected} operand(s), got {got}")]
    Arity { op: Op, expected: usize, got: usize },

    /// Number of positional arguments doesn't match the variable ordering.
    #[error("Dimension mismatch: expression takes {expected} argument(s), got {got}")]
    Dimension { expected: usize, got: usize },

    /// An elementary operation was evaluated outside its domain.
    #[error("`{op}` is undefined here: {detail}")]
    Domain { op: Op, detail: String },

    /// An explicit ordering is missing a variable the expression depends on.
    #[error("Variable `{name}` is used by the expression but missing from its ordering")]
    UnboundVariable { name: String },

    /// An explicit ordering lists a variable more than once.
    #[error("Variable `{name}` appears more than once in the ordering")]
    DuplicateVariable { name: String },

    /// A derivative was requested for a variable outside the ordering.
    #[error("Variable `{name}` is not part of this expression's ordering")]
    UnknownVariable { name: String },

    /// A differentiation mode string couldn't be parsed.
    #[error("Unknown differentiation mode `{mode}` (expected `forward` or `reverse`)")]
    UnknownMode { mode: String },

    /// A vector expression needs at least one component.
    #[error("Vector expression has no components")]
    EmptyVector,
}

impl AdError {
    pub(crate) fn domain(op: Op, detail: impl Into<String>) -> Self {
        AdError::Domain {
            op,
            detail: detail.into(),
        }
    }
}

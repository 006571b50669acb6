//! # Core - Expression Graphs for Automatic Differentiation
//!
//! This crate provides the graph that the `autodag-diff` evaluators walk:
//!
//! - **Operations**: the closed set of elementary scalar functions, each
//!   with its value, forward rule and local partials
//! - **Expressions**: immutable, shareable DAG nodes over variables and
//!   constants, with positional variable ordering and argument routing
//! - **Builder**: typed constructors and operator overloads
//! - **Hooks**: observers for node evaluation
//! - **Errors**: construction and evaluation failures
//!
//! ## Example
//!
//! ```rust
//! use autodag_core::build::{compose, cos, tan, variable};
//!
//! let x = variable("x");
//! let y = variable("y");
//! let f = cos(&x) + 2.0 * tan(&y);
//!
//! // Fix the argument order: eval(y, x)
//! let g = compose(&f, &[y.clone(), x.clone()]).unwrap();
//! assert_eq!(g.ordered_variables(), &[y, x]);
//! ```

pub mod build;
pub mod error;
pub mod expr;
pub mod hook;
pub mod ops;

// Re-export key types at crate root for convenience
pub use error::AdError;
pub use expr::{
    bind_variables, checktype, compose, make_node, route_arguments, Expr, Node, NodeId, Variable,
    VariableId,
};
pub use hook::{CountingHook, EvalHook, LogHook, NoopHook};
pub use ops::Op;

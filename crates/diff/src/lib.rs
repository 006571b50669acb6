//! # Diff - Forward and Reverse Automatic Differentiation
//!
//! This crate differentiates the expression graphs of `autodag-core`.
//!
//! ## Core Concepts
//!
//! - **Forward mode**: tangents travel with values, one sweep per variable
//! - **Reverse mode**: a recorded sweep, then adjoints flow back over the tape
//! - **Both modes agree**: same results, same domain errors
//! - **Jacobians**: vector expressions stack component gradients
//!
//! ## Modules
//!
//! - [`forward`]: evaluation and forward-mode derivatives
//! - [`backward`]: the reverse-mode tape and adjoint pass
//! - [`deriv`]: mode selection and the `deriv` entry point
//! - [`vector`]: vector expressions and Jacobians
//! - [`check`]: numerical gradient checking
//!
//! ## Example
//!
//! ```rust
//! use autodag_core::build::{cos, tan, variable};
//! use autodag_diff::{DerivOptions, Differentiable, Mode};
//!
//! let x = variable("x");
//! let f = cos(&x) + 2.0 * tan(&x);
//!
//! assert_eq!(f.eval(&[0.0]).unwrap(), 1.0);
//! for mode in Mode::ALL {
//!     let d = f.deriv(&[0.0], DerivOptions::new().with_mode(mode)).unwrap();
//!     assert!((d.as_scalar().unwrap() - 2.0).abs() < 1e-12);
//! }
//! ```

pub mod backward;
pub mod check;
pub mod deriv;
pub mod forward;
pub mod vector;

// Re-export key types
pub use backward::{gradient_reverse, Adjoints, Tape, TraceEntry, TraceKey};
pub use check::{grad_check, numerical_gradient, GradCheckError};
pub use deriv::{deriv, gradient, partial, DerivOptions, Derivative, Differentiable, Mode};
pub use forward::{differentiate_forward, evaluate, gradient_forward};
pub use vector::{make_vector_expression, Jacobian, VectorExpression};

//! # Derivatives - Mode Selection
//!
//! The user-facing entry points. Both modes compute the same quantities;
//! the [`Mode`] picks the algorithm:
//!
//! | Mode | Cost of a full gradient |
//! |------|-------------------------|
//! | `Forward` | one sweep per variable |
//! | `Reverse` | one record pass + one adjoint pass |
//!
//! ## Example
//!
//! ```rust
//! use autodag_core::build::variable;
//! use autodag_diff::{Derivative, DerivOptions, Differentiable, Mode};
//!
//! let x = variable("x");
//! let y = variable("y");
//! let f = 2.0 * &x - &y;
//!
//! let grad = f.deriv(&[2.0, 4.0], DerivOptions::new().with_mode(Mode::Reverse)).unwrap();
//! assert_eq!(grad, Derivative::Gradient(vec![2.0, -1.0]));
//!
//! let dy = f.deriv(&[2.0, 4.0], DerivOptions::new().with_var(&y)).unwrap();
//! assert_eq!(dy, Derivative::Scalar(-1.0));
//! ```

use std::fmt;
use std::str::FromStr;

use autodag_core::{AdError, Expr, Variable};
use serde::{Deserialize, Serialize};

use crate::backward::{differentiate_reverse, gradient_reverse};
use crate::forward::{differentiate_forward, evaluate, gradient_forward};

/// Differentiation algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Tangents propagated alongside values
    #[default]
    Forward,
    /// Recorded sweep, then adjoints propagated back
    Reverse,
}

impl Mode {
    pub const ALL: [Mode; 2] = [Mode::Forward, Mode::Reverse];

    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Forward => "forward",
            Mode::Reverse => "reverse",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = AdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "forward" => Ok(Mode::Forward),
            "reverse" => Ok(Mode::Reverse),
            other => Err(AdError::UnknownMode {
                mode: other.to_string(),
            }),
        }
    }
}

/// Options for [`deriv`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DerivOptions<'a> {
    pub mode: Mode,
    /// Single variable to differentiate by; `None` for the full gradient.
    pub var: Option<&'a Variable>,
}

impl<'a> DerivOptions<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_var(mut self, var: &'a Variable) -> Self {
        self.var = Some(var);
        self
    }
}

/// Result of [`deriv`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Derivative {
    /// A single partial, or the gradient of a one-variable expression
    Scalar(f64),
    Gradient(Vec<f64>),
}

impl Derivative {
    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            Derivative::Scalar(d) => Some(*d),
            Derivative::Gradient(_) => None,
        }
    }

    pub fn into_vec(self) -> Vec<f64> {
        match self {
            Derivative::Scalar(d) => vec![d],
            Derivative::Gradient(g) => g,
        }
    }
}

/// Full gradient, ordered like `expr.ordered_variables()`.
pub fn gradient(expr: &Expr, args: &[f64], mode: Mode) -> Result<Vec<f64>, AdError> {
    match mode {
        Mode::Forward => gradient_forward(expr, args),
        Mode::Reverse => gradient_reverse(expr, args),
    }
}

/// Partial derivative w.r.t. one variable of the ordering.
pub fn partial(expr: &Expr, args: &[f64], var: &Variable, mode: Mode) -> Result<f64, AdError> {
    expr.check_arguments(args)?;
    if expr.position_of(var).is_none() {
        return Err(AdError::UnknownVariable {
            name: var.name().to_string(),
        });
    }
    match mode {
        Mode::Forward => differentiate_forward(expr, args, var),
        Mode::Reverse => differentiate_reverse(expr, args, var),
    }
}

/// A partial when `options.var` is set, else the gradient. The gradient of a
/// one-variable expression collapses to a scalar.
pub fn deriv(expr: &Expr, args: &[f64], options: DerivOptions<'_>) -> Result<Derivative, AdError> {
    if let Some(var) = options.var {
        return partial(expr, args, var, options.mode).map(Derivative::Scalar);
    }
    let grad = gradient(expr, args, options.mode)?;
    if grad.len() == 1 {
        Ok(Derivative::Scalar(grad[0]))
    } else {
        Ok(Derivative::Gradient(grad))
    }
}

/// Method-call surface over the free functions.
pub trait Differentiable {
    fn eval(&self, args: &[f64]) -> Result<f64, AdError>;

    fn deriv(&self, args: &[f64], options: DerivOptions<'_>) -> Result<Derivative, AdError>;

    fn gradient(&self, args: &[f64], mode: Mode) -> Result<Vec<f64>, AdError>;

    fn partial(&self, args: &[f64], var: &Variable, mode: Mode) -> Result<f64, AdError>;
}

impl Differentiable for Expr {
    fn eval(&self, args: &[f64]) -> Result<f64, AdError> {
        evaluate(self, args)
    }

    fn deriv(&self, args: &[f64], options: DerivOptions<'_>) -> Result<Derivative, AdError> {
        deriv(self, args, options)
    }

    fn gradient(&self, args: &[f64], mode: Mode) -> Result<Vec<f64>, AdError> {
        gradient(self, args, mode)
    }

    fn partial(&self, args: &[f64], var: &Variable, mode: Mode) -> Result<f64, AdError> {
        partial(self, args, var, mode)
    }
}

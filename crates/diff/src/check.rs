//! Numerical gradient checking.
//!
//! Cross-checks either differentiation mode against central differences.

use autodag_core::{AdError, Expr};
use thiserror::Error;

use crate::deriv::{gradient, Mode};
use crate::forward::evaluate;

/// Numerical partial derivative w.r.t. argument `index`.
///
/// Uses central differences: (f(x+h) - f(x-h)) / 2h. An `index` past the
/// end of `point` fails with [`AdError::Dimension`], reporting the
/// `index + 1` arguments it would need.
pub fn numerical_gradient(expr: &Expr, point: &[f64], index: usize, h: f64) -> Result<f64, AdError> {
    expr.check_arguments(point)?;
    if index >= point.len() {
        return Err(AdError::Dimension {
            expected: point.len(),
            got: index + 1,
        });
    }
    let mut plus = point.to_vec();
    let mut minus = point.to_vec();
    plus[index] += h;
    minus[index] -= h;

    let f_plus = evaluate(expr, &plus)?;
    let f_minus = evaluate(expr, &minus)?;
    Ok((f_plus - f_minus) / (2.0 * h))
}

/// Check analytical gradients against numerical gradients.
///
/// # Arguments
///
/// * `expr` - The expression
/// * `point` - Arguments, ordered like the expression's variables
/// * `mode` - Which analytical mode to check
/// * `h` - Step size for numerical differentiation (e.g., 1e-6)
/// * `tolerance` - Maximum allowed difference (e.g., 1e-5)
pub fn grad_check(expr: &Expr, point: &[f64], mode: Mode, h: f64, tolerance: f64) -> Result<(), GradCheckError> {
    let analytical = gradient(expr, point, mode)?;

    for (index, &analytical) in analytical.iter().enumerate() {
        let numerical = numerical_gradient(expr, point, index, h)?;
        let diff = (numerical - analytical).abs();

        // Use relative error for large values
        let scale = analytical.abs().max(numerical.abs()).max(1.0);
        let rel_diff = diff / scale;

        if rel_diff > tolerance && diff > tolerance {
            return Err(GradCheckError::Mismatch {
                index,
                analytical,
                numerical,
                diff,
            });
        }
    }

    Ok(())
}

/// Error from gradient checking.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GradCheckError {
    #[error("Gradient mismatch at argument {index}: analytical={analytical}, numerical={numerical}, diff={diff}")]
    Mismatch {
        index: usize,
        analytical: f64,
        numerical: f64,
        diff: f64,
    },

    #[error(transparent)]
    Eval(#[from] AdError),
}

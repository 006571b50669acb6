//! # Forward Evaluation and Forward-Mode Differentiation
//!
//! One recursive sweep over the expression graph, from the root down to the
//! leaves and back up:
//!
//! - constants evaluate to themselves
//! - a variable evaluates to the single argument routed to it
//! - a node evaluates its parents on their routed arguments, then applies
//!   its operation
//!
//! When differentiating w.r.t. a variable `v`, every value travels with a
//! tangent: 1 at `v`, 0 at any other variable, none at constants. Nodes
//! combine tangents with [`Op::forward_partial`](autodag_core::Op::forward_partial).
//!
//! Each call caches node results by identity, so a shared sub-expression is
//! computed once per call however many consumers it has.
//!
//! ## Example
//!
//! ```rust
//! use autodag_core::build::{pow, variable};
//! use autodag_diff::forward::{differentiate_forward, evaluate};
//!
//! let x = variable("x");
//! let f = pow(&x, 2.0);
//! assert_eq!(evaluate(&f, &[5.0]).unwrap(), 25.0);
//! assert!((differentiate_forward(&f, &[5.0], &x).unwrap() - 10.0).abs() < 1e-12);
//! ```

use std::collections::HashMap;

use autodag_core::{AdError, EvalHook, Expr, NodeId, NoopHook, Variable};
use log::debug;

/// A value with its optional tangent.
#[derive(Debug, Clone, Copy)]
struct Dual {
    value: f64,
    /// `None` for constants and for plain evaluation.
    tangent: Option<f64>,
}

/// State of one forward sweep. Lives for a single call.
struct ForwardSweep<'a> {
    /// Differentiation target; `None` evaluates without tangents.
    target: Option<&'a Variable>,
    hook: &'a dyn EvalHook,
    cache: HashMap<NodeId, Dual>,
}

impl<'a> ForwardSweep<'a> {
    fn new(target: Option<&'a Variable>, hook: &'a dyn EvalHook) -> Self {
        Self {
            target,
            hook,
            cache: HashMap::new(),
        }
    }

    /// `args` are already routed to `expr`'s own ordering.
    fn visit(&mut self, expr: &Expr, args: &[f64]) -> Result<Dual, AdError> {
        match expr {
            Expr::Constant(c) => Ok(Dual {
                value: *c,
                tangent: None,
            }),
            Expr::Variable(v) => {
                debug_assert_eq!(args.len(), 1);
                Ok(Dual {
                    value: args[0],
                    tangent: self.target.map(|t| if t == v { 1.0 } else { 0.0 }),
                })
            }
            Expr::Node(node) => {
                if let Some(&cached) = self.cache.get(&node.id()) {
                    return Ok(cached);
                }

                let mut values = Vec::with_capacity(2);
                let mut tangents = Vec::with_capacity(2);
                for (slot, parent) in node.parents().enumerate() {
                    let parent_args = node.parent_arguments(slot, args);
                    let d = self.visit(parent, &parent_args)?;
                    values.push(d.value);
                    tangents.push(d.tangent);
                }

                let op = node.op();
                let value = op.value(&values)?;
                let tangent = match self.target {
                    Some(_) => Some(op.forward_partial(&values, &tangents)?),
                    None => None,
                };
                self.hook.on_evaluate(node, value, tangent);

                let dual = Dual { value, tangent };
                self.cache.insert(node.id(), dual);
                Ok(dual)
            }
        }
    }
}

/// Evaluate an expression at a point ordered like its variables.
pub fn evaluate(expr: &Expr, args: &[f64]) -> Result<f64, AdError> {
    evaluate_with_hook(expr, args, &NoopHook)
}

/// [`evaluate`], reporting each computed node to `hook`.
pub fn evaluate_with_hook(expr: &Expr, args: &[f64], hook: &dyn EvalHook) -> Result<f64, AdError> {
    expr.check_arguments(args)?;
    debug!("evaluate over {} variable(s)", expr.arity());
    let mut sweep = ForwardSweep::new(None, hook);
    Ok(sweep.visit(expr, args)?.value)
}

/// Value and derivative w.r.t. `var` in one sweep.
///
/// A variable the expression doesn't depend on gets derivative 0.
pub fn value_and_derivative(
    expr: &Expr,
    args: &[f64],
    var: &Variable,
    hook: &dyn EvalHook,
) -> Result<(f64, f64), AdError> {
    expr.check_arguments(args)?;
    let mut sweep = ForwardSweep::new(Some(var), hook);
    let d = sweep.visit(expr, args)?;
    Ok((d.value, d.tangent.unwrap_or(0.0)))
}

/// Forward-mode partial derivative w.r.t. `var`.
pub fn differentiate_forward(expr: &Expr, args: &[f64], var: &Variable) -> Result<f64, AdError> {
    Ok(value_and_derivative(expr, args, var, &NoopHook)?.1)
}

/// Full gradient, one forward sweep per variable.
pub fn gradient_forward(expr: &Expr, args: &[f64]) -> Result<Vec<f64>, AdError> {
    gradient_forward_with_hook(expr, args, &NoopHook)
}

/// [`gradient_forward`], reporting each computed node to `hook`.
pub fn gradient_forward_with_hook(
    expr: &Expr,
    args: &[f64],
    hook: &dyn EvalHook,
) -> Result<Vec<f64>, AdError> {
    expr.check_arguments(args)?;
    debug!("forward gradient over {} variable(s)", expr.arity());
    if expr.arity() == 0 {
        // No sweep runs; evaluate once so domain errors still surface
        evaluate_with_hook(expr, args, hook)?;
        return Ok(Vec::new());
    }
    expr.ordered_variables()
        .iter()
        .map(|var| value_and_derivative(expr, args, var, hook).map(|(_, d)| d))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use autodag_core::build::{compose, cos, div, exp, log, nlog, sin, tan, variable};
    use autodag_core::CountingHook;

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{} != {}", a, b);
    }

    #[test]
    fn test_evaluate_linear() {
        let x = variable("x");
        let f = 2.0 * &x;
        assert_eq!(evaluate(&f, &[2.0]).unwrap(), 4.0);
        assert_eq!(differentiate_forward(&f, &[2.0], &x).unwrap(), 2.0);
    }

    #[test]
    fn test_quotient() {
        let x = variable("x");
        let f = div(&x, 5.0);
        assert_eq!(evaluate(&f, &[5.0]).unwrap(), 1.0);
        assert_close(differentiate_forward(&f, &[5.0], &x).unwrap(), 0.2);
    }

    #[test]
    fn test_chain_rule() {
        // d/dx [cos x + 2 tan x] at 0 = 2 sec²(0) - sin(0) = 2
        let x = variable("x");
        let f = cos(&x) + 2.0 * tan(&x);
        assert_close(differentiate_forward(&f, &[0.0], &x).unwrap(), 2.0);

        // d/dx exp(sin x) = cos x · exp(sin x)
        let g = exp(sin(&x));
        let at = 0.3_f64;
        assert_close(
            differentiate_forward(&g, &[at], &x).unwrap(),
            at.cos() * at.sin().exp(),
        );
    }

    #[test]
    fn test_multivariate_partials() {
        let x = variable("x");
        let y = variable("y");
        let f = 2.0 * &x - &y;
        assert_eq!(differentiate_forward(&f, &[2.0, 4.0], &x).unwrap(), 2.0);
        assert_eq!(differentiate_forward(&f, &[2.0, 4.0], &y).unwrap(), -1.0);
        assert_eq!(gradient_forward(&f, &[2.0, 4.0]).unwrap(), vec![2.0, -1.0]);
    }

    #[test]
    fn test_routing_respects_composed_order() {
        let x = variable("x");
        let y = variable("y");
        let f = compose(&x - &y, &[y.clone(), x.clone()]).unwrap();
        // args are (y, x)
        assert_eq!(evaluate(&f, &[1.0, 5.0]).unwrap(), 4.0);
        assert_eq!(gradient_forward(&f, &[1.0, 5.0]).unwrap(), vec![-1.0, 1.0]);
    }

    #[test]
    fn test_general_log() {
        let x = variable("x");
        let f = log(&x, 2.0);
        assert_close(evaluate(&f, &[8.0]).unwrap(), 3.0);
        assert_close(
            differentiate_forward(&f, &[8.0], &x).unwrap(),
            1.0 / (8.0 * 2.0_f64.ln()),
        );
        assert_close(differentiate_forward(&nlog(&x), &[4.0], &x).unwrap(), 0.25);
    }

    #[test]
    fn test_dimension_mismatch() {
        let x = variable("x");
        let y = variable("y");
        let f = &x + &y;
        let hook = CountingHook::new();
        assert_eq!(
            evaluate_with_hook(&f, &[1.0], &hook),
            Err(AdError::Dimension { expected: 2, got: 1 })
        );
        assert_eq!(hook.total(), 0);
    }

    #[test]
    fn test_shared_node_evaluated_once() {
        let x = variable("x");
        let g = sin(&x) * &x;
        let f = &g + &g;
        let hook = CountingHook::new();

        assert_close(evaluate_with_hook(&f, &[0.5], &hook).unwrap(), 2.0 * 0.5_f64.sin() * 0.5);
        assert_eq!(hook.evaluations(g.as_node().unwrap()), 1);

        hook.reset();
        value_and_derivative(&f, &[0.5], &x, &hook).unwrap();
        assert_eq!(hook.evaluations(g.as_node().unwrap()), 1);
    }

    #[test]
    fn test_domain_error_propagates() {
        let x = variable("x");
        let f = nlog(&x) + 1.0;
        assert!(matches!(evaluate(&f, &[-1.0]), Err(AdError::Domain { .. })));
        assert!(matches!(
            differentiate_forward(&f, &[0.0], &x),
            Err(AdError::Domain { .. })
        ));
    }

    #[test]
    fn test_constant_expression() {
        let f = compose(autodag_core::build::constant(3.0), &[]).unwrap();
        assert_eq!(evaluate(&f, &[]).unwrap(), 3.0);
        assert!(gradient_forward(&f, &[]).unwrap().is_empty());
    }
}

//! # Graph Construction Surface
//!
//! Typed constructors, one per operation, plus operator overloads so that
//! expressions read like arithmetic:
//!
//! ```rust
//! use autodag_core::build::{sin, variable};
//!
//! let x = variable("x");
//! let y = variable("y");
//! let f = 2.0 * &x - sin(&y) / 3.0;
//! assert_eq!(f.arity(), 2);
//! assert_eq!(f.to_string(), "((2 * x) - (sin(y) / 3))");
//! ```
//!
//! Operands are anything `Into<Expr>`: expressions, variables (by value or
//! reference) and numbers. The compiler already rejects other operand types
//! here; [`make_node`](crate::expr::make_node) is the type-checked entry point
//! for untyped operands.

use std::ops::{Add, Div, Mul, Neg, Sub};

use crate::error::AdError;
use crate::expr::{Expr, Node, Variable};
use crate::ops::Op;

/// Create a fresh variable.
pub fn variable(name: impl Into<String>) -> Variable {
    Variable::new(name)
}

/// Create a constant leaf.
pub fn constant(value: f64) -> Expr {
    Expr::Constant(value)
}

fn binary(op: Op, a: impl Into<Expr>, b: impl Into<Expr>) -> Expr {
    Node::from_parents(op, a.into(), Some(b.into())).into()
}

fn unary(op: Op, a: impl Into<Expr>) -> Expr {
    Node::from_parents(op, a.into(), None).into()
}

pub fn add(a: impl Into<Expr>, b: impl Into<Expr>) -> Expr {
    binary(Op::Add, a, b)
}

pub fn sub(a: impl Into<Expr>, b: impl Into<Expr>) -> Expr {
    binary(Op::Sub, a, b)
}

pub fn mul(a: impl Into<Expr>, b: impl Into<Expr>) -> Expr {
    binary(Op::Mul, a, b)
}

pub fn div(a: impl Into<Expr>, b: impl Into<Expr>) -> Expr {
    binary(Op::Div, a, b)
}

/// `base ^ exponent`.
pub fn pow(base: impl Into<Expr>, exponent: impl Into<Expr>) -> Expr {
    binary(Op::Pow, base, exponent)
}

/// Logarithm of `x` in an arbitrary base.
///
/// For the natural logarithm (base e) use [`nlog`].
pub fn log(x: impl Into<Expr>, base: impl Into<Expr>) -> Expr {
    binary(Op::Log, x, base)
}

/// Natural logarithm.
pub fn nlog(x: impl Into<Expr>) -> Expr {
    unary(Op::NLog, x)
}

pub fn exp(x: impl Into<Expr>) -> Expr {
    unary(Op::Exp, x)
}

pub fn sin(x: impl Into<Expr>) -> Expr {
    unary(Op::Sin, x)
}

pub fn cos(x: impl Into<Expr>) -> Expr {
    unary(Op::Cos, x)
}

pub fn tan(x: impl Into<Expr>) -> Expr {
    unary(Op::Tan, x)
}

pub fn csc(x: impl Into<Expr>) -> Expr {
    unary(Op::Csc, x)
}

pub fn sec(x: impl Into<Expr>) -> Expr {
    unary(Op::Sec, x)
}

pub fn cot(x: impl Into<Expr>) -> Expr {
    unary(Op::Cot, x)
}

pub fn neg(x: impl Into<Expr>) -> Expr {
    unary(Op::Neg, x)
}

pub fn pos(x: impl Into<Expr>) -> Expr {
    unary(Op::Pos, x)
}

/// Fix the variable ordering of an expression. See [`crate::expr::compose`].
pub fn compose(expr: impl Into<Expr>, ordered_variables: &[Variable]) -> Result<Expr, AdError> {
    crate::expr::compose(expr, ordered_variables.to_vec())
}

// ============================================================================
// Operator overloads
// ============================================================================

macro_rules! impl_binary_op {
    ($trait:ident, $method:ident, $op:expr) => {
        impl<T: Into<Expr>> $trait<T> for Expr {
            type Output = Expr;
            fn $method(self, rhs: T) -> Expr {
                binary($op, self, rhs)
            }
        }

        impl<T: Into<Expr>> $trait<T> for &Expr {
            type Output = Expr;
            fn $method(self, rhs: T) -> Expr {
                binary($op, self, rhs)
            }
        }

        impl<T: Into<Expr>> $trait<T> for Variable {
            type Output = Expr;
            fn $method(self, rhs: T) -> Expr {
                binary($op, self, rhs)
            }
        }

        impl<T: Into<Expr>> $trait<T> for &Variable {
            type Output = Expr;
            fn $method(self, rhs: T) -> Expr {
                binary($op, self, rhs)
            }
        }

        impl $trait<Expr> for f64 {
            type Output = Expr;
            fn $method(self, rhs: Expr) -> Expr {
                binary($op, self, rhs)
            }
        }

        impl $trait<&Expr> for f64 {
            type Output = Expr;
            fn $method(self, rhs: &Expr) -> Expr {
                binary($op, self, rhs)
            }
        }

        impl $trait<Variable> for f64 {
            type Output = Expr;
            fn $method(self, rhs: Variable) -> Expr {
                binary($op, self, rhs)
            }
        }

        impl $trait<&Variable> for f64 {
            type Output = Expr;
            fn $method(self, rhs: &Variable) -> Expr {
                binary($op, self, rhs)
            }
        }
    };
}

impl_binary_op!(Add, add, Op::Add);
impl_binary_op!(Sub, sub, Op::Sub);
impl_binary_op!(Mul, mul, Op::Mul);
impl_binary_op!(Div, div, Op::Div);

impl Neg for Expr {
    type Output = Expr;
    fn neg(self) -> Expr {
        unary(Op::Neg, self)
    }
}

impl Neg for &Expr {
    type Output = Expr;
    fn neg(self) -> Expr {
        unary(Op::Neg, self)
    }
}

impl Neg for Variable {
    type Output = Expr;
    fn neg(self) -> Expr {
        unary(Op::Neg, self)
    }
}

impl Neg for &Variable {
    type Output = Expr;
    fn neg(self) -> Expr {
        unary(Op::Neg, self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operators_build_nodes() {
        let x = variable("x");
        let f = 2.0 * &x;
        let node = f.as_node().unwrap();
        assert_eq!(node.op(), Op::Mul);
        assert!(node.parent1().is_constant());
        assert_eq!(f.ordered_variables(), &[x.clone()]);
    }

    #[test]
    fn test_shared_subexpression_is_reused() {
        let x = variable("x");
        let g = sin(&x) * 3.0;
        let f = &g + &g;
        let node = f.as_node().unwrap();
        let p1 = node.parent1().as_node().unwrap();
        let p2 = node.parent2().unwrap().as_node().unwrap();
        assert_eq!(p1.id(), p2.id());
    }

    #[test]
    fn test_log_and_pow_are_binary() {
        let x = variable("x");
        assert_eq!(log(&x, 10.0).to_string(), "log(x, 10)");
        assert_eq!(pow(&x, 2.0).to_string(), "(x ^ 2)");
        assert_eq!((-&x).to_string(), "-x");
    }

    #[test]
    fn test_compose_fixes_order() {
        let x = variable("x");
        let y = variable("y");
        let f = &x - &y;
        let g = compose(&f, &[y.clone(), x.clone()]).unwrap();
        assert_eq!(g.ordered_variables(), &[y, x]);
        // the un-composed expression keeps its own ordering
        assert_eq!(f.ordered_variables()[0].name(), "x");
    }
}

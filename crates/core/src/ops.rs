//! # Elementary Operations
//!
//! `Op` is the closed set of scalar operations a graph node can apply. Each
//! variant carries three behaviours:
//!
//! - `value`: the elementary function itself
//! - `forward_partial`: combine operand values and operand tangents into the
//!   output tangent (forward mode)
//! - `reverse_partials`: the local partial of the output w.r.t. each operand,
//!   from operand values alone (reverse mode)
//!
//! ## Operations
//!
//! | Op | Value | Local partials |
//! |----|-------|----------------|
//! | Add | a + b | (1, 1) |
//! | Sub | a - b | (1, -1) |
//! | Mul | a * b | (b, a) |
//! | Div | a / b | (1/b, -a/b²) |
//! | Pow | a ^ b | (b·a^(b-1), a^b·ln a) |
//! | Log | ln a / ln b | (1/(a·ln b), -ln a/(b·ln² b)) |
//! | Exp | e^a | e^a |
//! | NLog | ln a | 1/a |
//! | Sin | sin a | cos a |
//! | Cos | cos a | -sin a |
//! | Tan | tan a | 1/cos² a |
//! | Csc | 1/sin a | -cos a/sin² a |
//! | Sec | 1/cos a | sin a/cos² a |
//! | Cot | cos a/sin a | -1/sin² a |
//! | Neg | -a | -1 |
//! | Pos | a | 1 |
//!
//! Operands arrive as slices whose length equals [`Op::arity`]. Tangents are
//! `None` for constant operands, which is how `Pow` tells a constant exponent
//! apart from one that merely has a zero derivative.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::AdError;

/// An elementary scalar operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Op {
    /// a + b
    Add,
    /// a - b
    Sub,
    /// a * b
    Mul,
    /// a / b
    Div,
    /// a ^ b
    Pow,
    /// Logarithm of a in base b
    Log,
    /// e ^ a
    Exp,
    /// Natural logarithm
    NLog,
    Sin,
    Cos,
    Tan,
    Csc,
    Sec,
    Cot,
    /// -a
    Neg,
    /// +a (identity)
    Pos,
}

impl Op {
    /// Every operation, binary ones first.
    pub const ALL: [Op; 16] = [
        Op::Add,
        Op::Sub,
        Op::Mul,
        Op::Div,
        Op::Pow,
        Op::Log,
        Op::Exp,
        Op::NLog,
        Op::Sin,
        Op::Cos,
        Op::Tan,
        Op::Csc,
        Op::Sec,
        Op::Cot,
        Op::Neg,
        Op::Pos,
    ];

    /// Number of operands this operation takes (1 or 2).
    pub fn arity(&self) -> usize {
        match self {
            Op::Add | Op::Sub | Op::Mul | Op::Div | Op::Pow | Op::Log => 2,
            _ => 1,
        }
    }

    /// Whether this is a two-operand operation.
    pub fn is_binary(&self) -> bool {
        self.arity() == 2
    }

    /// Lowercase name, as used by `Display` and serde.
    pub fn name(&self) -> &'static str {
        match self {
            Op::Add => "add",
            Op::Sub => "sub",
            Op::Mul => "mul",
            Op::Div => "div",
            Op::Pow => "pow",
            Op::Log => "log",
            Op::Exp => "exp",
            Op::NLog => "nlog",
            Op::Sin => "sin",
            Op::Cos => "cos",
            Op::Tan => "tan",
            Op::Csc => "csc",
            Op::Sec => "sec",
            Op::Cot => "cot",
            Op::Neg => "neg",
            Op::Pos => "pos",
        }
    }

    /// Infix symbol for the arithmetic operations.
    pub fn symbol(&self) -> Option<&'static str> {
        match self {
            Op::Add => Some("+"),
            Op::Sub => Some("-"),
            Op::Mul => Some("*"),
            Op::Div => Some("/"),
            Op::Pow => Some("^"),
            _ => None,
        }
    }

    /// Evaluate the operation.
    ///
    /// Fails with [`AdError::Domain`] outside the real domain of the
    /// function (division by zero, log of a non-positive number, a
    /// fractional power of a negative number, a pole of tan/sec/csc/cot).
    pub fn value(&self, x: &[f64]) -> Result<f64, AdError> {
        debug_assert_eq!(x.len(), self.arity(), "{} operand count", self);
        let a = x[0];
        match self {
            Op::Add => Ok(a + x[1]),
            Op::Sub => Ok(a - x[1]),
            Op::Mul => Ok(a * x[1]),
            Op::Div => {
                let b = x[1];
                if b == 0.0 {
                    return Err(AdError::domain(*self, format!("division of {} by zero", a)));
                }
                Ok(a / b)
            }
            Op::Pow => {
                let b = x[1];
                if a < 0.0 && b.fract() != 0.0 {
                    return Err(AdError::domain(
                        *self,
                        format!("negative base {} with fractional exponent {}", a, b),
                    ));
                }
                if a == 0.0 && b < 0.0 {
                    return Err(AdError::domain(
                        *self,
                        format!("zero base with negative exponent {}", b),
                    ));
                }
                Ok(a.powf(b))
            }
            Op::Log => {
                let base = x[1];
                check_log_argument(*self, a)?;
                check_log_base(*self, base)?;
                Ok(a.ln() / base.ln())
            }
            Op::Exp => Ok(a.exp()),
            Op::NLog => {
                check_log_argument(*self, a)?;
                Ok(a.ln())
            }
            Op::Sin => Ok(a.sin()),
            Op::Cos => Ok(a.cos()),
            Op::Tan => Ok(a.sin() / nonzero_cos(*self, a)?),
            Op::Csc => Ok(1.0 / nonzero_sin(*self, a)?),
            Op::Sec => Ok(1.0 / nonzero_cos(*self, a)?),
            Op::Cot => Ok(a.cos() / nonzero_sin(*self, a)?),
            Op::Neg => Ok(-a),
            Op::Pos => Ok(a),
        }
    }

    /// Forward-mode rule: the output tangent given operand values `x` and
    /// operand tangents `dx` (`None` for constant operands).
    ///
    /// The chain rule over the local partials: sum rule for add/sub, product
    /// rule for mul, quotient rule for div, the generalized power rule
    /// `(a^b)' = b·a^(b-1)·a' + a^b·ln(a)·b'` for pow, and `f'(a)·a'` for the
    /// unary functions. Operands with a tangent are live, so this fails
    /// exactly where [`Op::reverse_partials`] fails for the same liveness.
    pub fn forward_partial(&self, x: &[f64], dx: &[Option<f64>]) -> Result<f64, AdError> {
        debug_assert_eq!(dx.len(), self.arity(), "{} tangent count", self);
        let live: Vec<bool> = dx.iter().map(Option::is_some).collect();
        let partials = self.reverse_partials(x, &live)?;
        Ok(partials
            .iter()
            .zip(dx)
            .map(|(p, t)| t.map_or(0.0, |t| p * t))
            .sum())
    }

    /// Reverse-mode rule: the local partial of the output w.r.t. each operand.
    ///
    /// `live[i]` marks operands that need a partial (non-constant operands).
    /// Partials of dead operands are reported as `0.0` and never validated,
    /// so `pow(x, 2)` stays differentiable at negative `x`. A live partial
    /// that is infinite or NaN (`sqrt` at 0, say) fails with
    /// [`AdError::Domain`].
    pub fn reverse_partials(&self, x: &[f64], live: &[bool]) -> Result<Vec<f64>, AdError> {
        debug_assert_eq!(x.len(), self.arity(), "{} operand count", self);
        debug_assert_eq!(live.len(), self.arity(), "{} liveness count", self);
        let a = x[0];
        let partials = match self {
            Op::Add => vec![1.0, 1.0],
            Op::Sub => vec![1.0, -1.0],
            Op::Mul => vec![x[1], a],
            Op::Div => {
                let b = x[1];
                vec![1.0 / b, -a / (b * b)]
            }
            Op::Pow => {
                let b = x[1];
                let d_base = if live[0] { b * a.powf(b - 1.0) } else { 0.0 };
                let d_exponent = if live[1] {
                    check_pow_log_base(a)?;
                    a.powf(b) * a.ln()
                } else {
                    0.0
                };
                vec![d_base, d_exponent]
            }
            Op::Log => {
                let base = x[1];
                let ln_base = base.ln();
                vec![
                    1.0 / (a * ln_base),
                    -a.ln() / (base * ln_base * ln_base),
                ]
            }
            Op::Exp => vec![a.exp()],
            Op::NLog => vec![1.0 / a],
            Op::Sin => vec![a.cos()],
            Op::Cos => vec![-a.sin()],
            Op::Tan => {
                let c = a.cos();
                vec![1.0 / (c * c)]
            }
            Op::Csc => {
                let s = a.sin();
                vec![-a.cos() / (s * s)]
            }
            Op::Sec => {
                let c = a.cos();
                vec![a.sin() / (c * c)]
            }
            Op::Cot => {
                let s = a.sin();
                vec![-1.0 / (s * s)]
            }
            Op::Neg => vec![-1.0],
            Op::Pos => vec![1.0],
        };
        partials
            .into_iter()
            .zip(live)
            .enumerate()
            .map(|(slot, (p, &l))| match (l, p.is_finite()) {
                (false, _) => Ok(0.0),
                (true, true) => Ok(p),
                (true, false) => Err(AdError::domain(
                    *self,
                    format!("partial w.r.t. operand {} is {} at {:?}", slot, p, x),
                )),
            })
            .collect()
    }
}

fn check_log_argument(op: Op, a: f64) -> Result<(), AdError> {
    if a <= 0.0 {
        return Err(AdError::domain(op, format!("logarithm of non-positive {}", a)));
    }
    Ok(())
}

fn check_log_base(op: Op, base: f64) -> Result<(), AdError> {
    if base <= 0.0 || base == 1.0 {
        return Err(AdError::domain(op, format!("logarithm base {}", base)));
    }
    Ok(())
}

/// The exponent partial of `a^b` needs `ln a`.
fn check_pow_log_base(a: f64) -> Result<(), AdError> {
    if a <= 0.0 {
        return Err(AdError::domain(
            Op::Pow,
            format!("derivative w.r.t. the exponent at non-positive base {}", a),
        ));
    }
    Ok(())
}

fn nonzero_sin(op: Op, a: f64) -> Result<f64, AdError> {
    let s = a.sin();
    if s == 0.0 {
        return Err(AdError::domain(op, format!("pole at {}", a)));
    }
    Ok(s)
}

fn nonzero_cos(op: Op, a: f64) -> Result<f64, AdError> {
    let c = a.cos();
    if c == 0.0 {
        return Err(AdError::domain(op, format!("pole at {}", a)));
    }
    Ok(c)
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

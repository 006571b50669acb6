//! # Vector Expressions and Jacobians
//!
//! A [`VectorExpression`] is a list of scalar components bound to one shared
//! variable ordering. Its Jacobian stacks the components' gradient rows:
//!
//! ```text
//!            x     y
//!   f₀ = x+y [ 1    1 ]
//!   f₁ = x-y [ 1   -1 ]
//! ```
//!
//! ## Example
//!
//! ```rust
//! use autodag_core::build::variable;
//! use autodag_diff::{make_vector_expression, Mode};
//!
//! let x = variable("x");
//! let y = variable("y");
//! let f = make_vector_expression(vec![&x + &y, &x - &y], &[x.clone(), y.clone()]).unwrap();
//!
//! let j = f.jacobian(&[3.0, 7.0], Mode::Reverse).unwrap();
//! assert_eq!(j.shape(), (2, 2));
//! assert_eq!(j.to_rows(), vec![vec![1.0, 1.0], vec![1.0, -1.0]]);
//! ```

use autodag_core::{compose, AdError, Expr, Variable};
use log::debug;
use serde::Serialize;

use crate::deriv::{gradient, partial, Mode};
use crate::forward::evaluate;

/// Scalar components sharing one variable ordering.
#[derive(Debug, Clone)]
pub struct VectorExpression {
    components: Vec<Expr>,
    ordered_variables: Vec<Variable>,
}

impl VectorExpression {
    /// Bind every component to `ordered_variables`.
    ///
    /// Fails if there are no components, or if a component uses a variable
    /// the ordering lacks.
    pub fn new(components: Vec<Expr>, ordered_variables: &[Variable]) -> Result<Self, AdError> {
        if components.is_empty() {
            return Err(AdError::EmptyVector);
        }
        let components = components
            .into_iter()
            .map(|c| compose(c, ordered_variables.to_vec()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            components,
            ordered_variables: ordered_variables.to_vec(),
        })
    }

    /// Number of components.
    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn components(&self) -> &[Expr] {
        &self.components
    }

    pub fn ordered_variables(&self) -> &[Variable] {
        &self.ordered_variables
    }

    fn check_arguments(&self, args: &[f64]) -> Result<(), AdError> {
        if args.len() != self.ordered_variables.len() {
            return Err(AdError::Dimension {
                expected: self.ordered_variables.len(),
                got: args.len(),
            });
        }
        Ok(())
    }

    /// Value of every component.
    pub fn eval(&self, args: &[f64]) -> Result<Vec<f64>, AdError> {
        self.check_arguments(args)?;
        self.components.iter().map(|c| evaluate(c, args)).collect()
    }

    /// One gradient row per component.
    pub fn jacobian(&self, args: &[f64], mode: Mode) -> Result<Jacobian, AdError> {
        self.check_arguments(args)?;
        debug!(
            "{} jacobian: {} component(s) x {} variable(s)",
            mode,
            self.len(),
            self.ordered_variables.len()
        );
        let cols = self.ordered_variables.len();
        let mut data = Vec::with_capacity(self.len() * cols);
        for component in &self.components {
            data.extend(gradient(component, args, mode)?);
        }
        Ok(Jacobian {
            rows: self.len(),
            cols,
            data,
        })
    }

    /// One Jacobian column: each component's partial w.r.t. `var`.
    pub fn partial(&self, args: &[f64], var: &Variable, mode: Mode) -> Result<Vec<f64>, AdError> {
        self.check_arguments(args)?;
        self.components
            .iter()
            .map(|c| partial(c, args, var, mode))
            .collect()
    }
}

/// Build a [`VectorExpression`]. See [`VectorExpression::new`].
pub fn make_vector_expression(
    components: Vec<Expr>,
    ordered_variables: &[Variable],
) -> Result<VectorExpression, AdError> {
    VectorExpression::new(components, ordered_variables)
}

/// Dense row-major Jacobian: `rows` components by `cols` variables.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Jacobian {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Jacobian {
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// ∂component / ∂variable, by position.
    pub fn get(&self, component: usize, variable: usize) -> Option<f64> {
        if component >= self.rows || variable >= self.cols {
            return None;
        }
        Some(self.data[component * self.cols + variable])
    }

    /// Gradient of one component.
    pub fn row(&self, component: usize) -> Option<&[f64]> {
        if component >= self.rows {
            return None;
        }
        let start = component * self.cols;
        Some(&self.data[start..start + self.cols])
    }

    /// Partials of all components w.r.t. one variable.
    pub fn column(&self, variable: usize) -> Option<Vec<f64>> {
        if variable >= self.cols {
            return None;
        }
        Some((0..self.rows).map(|r| self.data[r * self.cols + variable]).collect())
    }

    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        if self.cols == 0 {
            return vec![Vec::new(); self.rows];
        }
        self.data.chunks(self.cols).map(<[f64]>::to_vec).collect()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use autodag_core::build::{constant, exp, mul, sin, variable};

    fn xy() -> (Variable, Variable) {
        (variable("x"), variable("y"))
    }

    #[test]
    fn test_jacobian_sum_difference() {
        let (x, y) = xy();
        let f = make_vector_expression(vec![&x + &y, &x - &y], &[x.clone(), y.clone()]).unwrap();
        for mode in Mode::ALL {
            for point in [[0.0, 0.0], [3.0, -2.0], [1e3, 0.5]] {
                let j = f.jacobian(&point, mode).unwrap();
                assert_eq!(j.to_rows(), vec![vec![1.0, 1.0], vec![1.0, -1.0]]);
            }
        }
    }

    #[test]
    fn test_components_share_ordering() {
        let (x, y) = xy();
        // Components mention only one variable each, in either order
        let f = make_vector_expression(vec![sin(&y), exp(&x), x.clone().into()], &[x.clone(), y.clone()])
            .unwrap();
        assert_eq!(f.len(), 3);
        for c in f.components() {
            assert_eq!(c.ordered_variables(), &[x.clone(), y.clone()]);
        }

        let at = [0.0, 0.0];
        assert_eq!(f.eval(&at).unwrap(), vec![0.0, 1.0, 0.0]);
        let j = f.jacobian(&at, Mode::Forward).unwrap();
        assert_eq!(j.row(0).unwrap(), &[0.0, 1.0]);
        assert_eq!(j.row(1).unwrap(), &[1.0, 0.0]);
        assert_eq!(j.row(2).unwrap(), &[1.0, 0.0]);
    }

    #[test]
    fn test_partial_column_matches_jacobian() {
        let (x, y) = xy();
        let f = make_vector_expression(vec![mul(&x, &y), &x * 4.0, constant(2.0)], &[x.clone(), y.clone()])
            .unwrap();
        let at = [2.0, 5.0];
        let j = f.jacobian(&at, Mode::Reverse).unwrap();
        for mode in Mode::ALL {
            assert_eq!(f.partial(&at, &x, mode).unwrap(), j.column(0).unwrap());
            assert_eq!(f.partial(&at, &y, mode).unwrap(), j.column(1).unwrap());
        }
        assert_eq!(j.get(0, 1), Some(2.0));
        assert_eq!(j.get(3, 0), None);
    }

    #[test]
    fn test_construction_errors() {
        let (x, y) = xy();
        assert_eq!(
            make_vector_expression(Vec::new(), &[x.clone()]).unwrap_err(),
            AdError::EmptyVector
        );
        assert!(matches!(
            make_vector_expression(vec![&x + &y], &[x.clone()]),
            Err(AdError::UnboundVariable { .. })
        ));
    }

    #[test]
    fn test_dimension_checked_once() {
        let (x, y) = xy();
        let f = make_vector_expression(vec![&x + &y], &[x, y]).unwrap();
        assert_eq!(
            f.jacobian(&[1.0], Mode::Forward),
            Err(AdError::Dimension { expected: 2, got: 1 })
        );
    }
}

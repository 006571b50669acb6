//! # Expression Graph
//!
//! An expression is a DAG over three kinds of vertices:
//!
//! - **Variable**: a named leaf, unique by identity
//! - **Constant**: a numeric literal, never differentiated
//! - **Node**: one [`Op`] applied to one or two parents
//!
//! Nodes are immutable and reference-counted, so a sub-expression can be
//! shared by many consumers. A node can only point at parents that existed
//! before it, which keeps the graph acyclic by construction.
//!
//! ## Variable ordering
//!
//! Every expression has `ordered_variables`: the positional contract for
//! evaluation. Argument `i` of an `eval`/`deriv` call is the value of
//! variable `i`. By default a node orders its variables by first occurrence,
//! scanning `parent1` then `parent2`; [`bind_variables`] / [`compose`] fix an
//! explicit order instead.
//!
//! Because parents keep their own orderings, each node stores a routing
//! table computed once at construction: for each parent, the index in the
//! node's ordering of every variable the parent expects.

use std::any::Any;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use log::trace;

use crate::error::AdError;
use crate::ops::Op;

// ============================================================================
// Variable
// ============================================================================

/// A named input variable.
///
/// Two variables created with the same name are different variables;
/// clones of one `Variable` are the same variable.
#[derive(Clone)]
pub struct Variable {
    inner: Arc<VariableData>,
}

struct VariableData {
    name: String,
}

/// Identity of a variable (stable while any clone is alive).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VariableId(usize);

impl Variable {
    /// Create a fresh variable.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(VariableData { name: name.into() }),
        }
    }

    /// The variable's display name.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Identity of this variable.
    pub fn id(&self) -> VariableId {
        VariableId(Arc::as_ptr(&self.inner) as usize)
    }
}

impl PartialEq for Variable {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Variable {}

impl Hash for Variable {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id().hash(state);
    }
}

impl fmt::Debug for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Variable({})", self.name())
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

// ============================================================================
// Expr
// ============================================================================

/// Any vertex of an expression graph.
///
/// Cloning is cheap: variables and nodes are reference-counted.
#[derive(Clone)]
pub enum Expr {
    Variable(Variable),
    Constant(f64),
    Node(Arc<Node>),
}

impl Expr {
    /// The positional argument contract of this expression.
    ///
    /// A variable orders itself, a constant takes no arguments.
    pub fn ordered_variables(&self) -> &[Variable] {
        match self {
            Expr::Variable(v) => std::slice::from_ref(v),
            Expr::Constant(_) => &[],
            Expr::Node(node) => &node.ordered_variables,
        }
    }

    /// Number of positional arguments `eval`/`deriv` expect.
    pub fn arity(&self) -> usize {
        self.ordered_variables().len()
    }

    /// Whether this expression is a constant leaf.
    pub fn is_constant(&self) -> bool {
        matches!(self, Expr::Constant(_))
    }

    /// The node behind this expression, if it is an operation.
    pub fn as_node(&self) -> Option<&Arc<Node>> {
        match self {
            Expr::Node(node) => Some(node),
            _ => None,
        }
    }

    /// Fail with [`AdError::Dimension`] unless `args` matches the ordering.
    pub fn check_arguments(&self, args: &[f64]) -> Result<(), AdError> {
        check_len(self.arity(), args.len())
    }

    /// Index of `var` in this expression's ordering.
    pub fn position_of(&self, var: &Variable) -> Option<usize> {
        self.ordered_variables().iter().position(|v| v == var)
    }

    /// Number of distinct nodes reachable from this expression
    /// (shared sub-expressions counted once).
    pub fn node_count(&self) -> usize {
        let mut seen = std::collections::HashSet::new();
        let mut stack = vec![self];
        while let Some(expr) = stack.pop() {
            if let Expr::Node(node) = expr {
                if seen.insert(node.id()) {
                    stack.push(&node.parent1);
                    if let Some(p2) = &node.parent2 {
                        stack.push(p2);
                    }
                }
            }
        }
        seen.len()
    }
}

fn check_len(expected: usize, got: usize) -> Result<(), AdError> {
    if expected != got {
        return Err(AdError::Dimension { expected, got });
    }
    Ok(())
}

impl From<Variable> for Expr {
    fn from(v: Variable) -> Self {
        Expr::Variable(v)
    }
}

impl From<&Variable> for Expr {
    fn from(v: &Variable) -> Self {
        Expr::Variable(v.clone())
    }
}

impl From<&Expr> for Expr {
    fn from(e: &Expr) -> Self {
        e.clone()
    }
}

impl From<Node> for Expr {
    fn from(node: Node) -> Self {
        Expr::Node(Arc::new(node))
    }
}

impl From<f64> for Expr {
    fn from(x: f64) -> Self {
        Expr::Constant(x)
    }
}

impl From<f32> for Expr {
    fn from(x: f32) -> Self {
        Expr::Constant(x as f64)
    }
}

impl From<i32> for Expr {
    fn from(x: i32) -> Self {
        Expr::Constant(x as f64)
    }
}

impl fmt::Debug for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Variable(v) => write!(f, "{:?}", v),
            Expr::Constant(c) => write!(f, "Constant({})", c),
            Expr::Node(node) => write!(f, "Node({}, vars={:?})", self, node.ordered_variables),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Variable(v) => write!(f, "{}", v),
            Expr::Constant(c) => write!(f, "{}", c),
            Expr::Node(node) => write!(f, "{}", node),
        }
    }
}

// ============================================================================
// Node
// ============================================================================

/// Identity of a node (stable while the node is alive).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// One operation applied to one or two parents.
pub struct Node {
    op: Op,
    parent1: Expr,
    parent2: Option<Expr>,
    ordered_variables: Vec<Variable>,
    /// `routing[slot][k]` = index in `ordered_variables` of the k-th
    /// variable parent `slot` expects.
    routing: [Vec<usize>; 2],
}

impl Node {
    /// Build a node ordering its variables by first occurrence.
    ///
    /// Fails with [`AdError::Arity`] unless the parent count matches the
    /// operation.
    pub fn new(op: Op, parent1: Expr, parent2: Option<Expr>) -> Result<Self, AdError> {
        let got = 1 + parent2.is_some() as usize;
        if got != op.arity() {
            return Err(AdError::Arity {
                op,
                expected: op.arity(),
                got,
            });
        }
        Ok(Self::from_parents(op, parent1, parent2))
    }

    /// [`Node::new`] for callers that already match the arity.
    pub(crate) fn from_parents(op: Op, parent1: Expr, parent2: Option<Expr>) -> Self {
        debug_assert_eq!(1 + parent2.is_some() as usize, op.arity(), "{} parent count", op);
        let mut ordered_variables: Vec<Variable> = Vec::new();
        let mut routing = [Vec::new(), Vec::new()];
        for (slot, parent) in std::iter::once(&parent1).chain(&parent2).enumerate() {
            for var in parent.ordered_variables() {
                let index = match ordered_variables.iter().position(|v| v == var) {
                    Some(index) => index,
                    None => {
                        ordered_variables.push(var.clone());
                        ordered_variables.len() - 1
                    }
                };
                routing[slot].push(index);
            }
        }
        Self {
            op,
            parent1,
            parent2,
            ordered_variables,
            routing,
        }
    }

    /// Build a node with an explicit variable ordering.
    pub fn with_ordering(
        op: Op,
        parent1: Expr,
        parent2: Option<Expr>,
        ordered_variables: Vec<Variable>,
    ) -> Result<Self, AdError> {
        Node::new(op, parent1, parent2)?.bind(ordered_variables)
    }

    /// Re-fix the variable ordering, recomputing the parent routing.
    ///
    /// The ordering must contain every variable the parents use and no
    /// duplicates; it may contain extra variables (their partials are 0).
    pub fn bind(&self, ordered_variables: Vec<Variable>) -> Result<Self, AdError> {
        for (i, var) in ordered_variables.iter().enumerate() {
            if ordered_variables[..i].contains(var) {
                return Err(AdError::DuplicateVariable {
                    name: var.name().to_string(),
                });
            }
        }
        let mut routing = [Vec::new(), Vec::new()];
        for (slot, parent) in self.parents().enumerate() {
            for var in parent.ordered_variables() {
                let index = ordered_variables
                    .iter()
                    .position(|v| v == var)
                    .ok_or_else(|| AdError::UnboundVariable {
                        name: var.name().to_string(),
                    })?;
                routing[slot].push(index);
            }
        }
        trace!("bound {} to {} variable(s)", self, ordered_variables.len());
        Ok(Self {
            op: self.op,
            parent1: self.parent1.clone(),
            parent2: self.parent2.clone(),
            ordered_variables,
            routing,
        })
    }

    /// The operation this node applies.
    pub fn op(&self) -> Op {
        self.op
    }

    /// First (or only) parent.
    pub fn parent1(&self) -> &Expr {
        &self.parent1
    }

    /// Second parent, `None` for unary operations.
    pub fn parent2(&self) -> Option<&Expr> {
        self.parent2.as_ref()
    }

    /// Parents in slot order.
    pub fn parents(&self) -> impl Iterator<Item = &Expr> {
        std::iter::once(&self.parent1).chain(self.parent2.as_ref())
    }

    /// Parent at `slot` (0 or 1).
    pub fn parent(&self, slot: usize) -> Option<&Expr> {
        match slot {
            0 => Some(&self.parent1),
            1 => self.parent2.as_ref(),
            _ => None,
        }
    }

    pub fn ordered_variables(&self) -> &[Variable] {
        &self.ordered_variables
    }

    /// Indices into this node's ordering for each variable of parent `slot`.
    pub fn routing(&self, slot: usize) -> &[usize] {
        &self.routing[slot]
    }

    /// Identity of this node.
    pub fn id(&self) -> NodeId {
        NodeId(self as *const Node as usize)
    }

    /// Arguments for parent `slot`, picked out of this node's arguments.
    ///
    /// `args` must already match this node's ordering.
    pub fn parent_arguments(&self, slot: usize, args: &[f64]) -> Vec<f64> {
        self.routing[slot].iter().map(|&i| args[i]).collect()
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.op, &self.parent2) {
            (Op::Neg, None) => write!(f, "-{}", self.parent1),
            (Op::Pos, None) => write!(f, "{}", self.parent1),
            (op, Some(p2)) => match op.symbol() {
                Some(symbol) => write!(f, "({} {} {})", self.parent1, symbol, p2),
                None => write!(f, "{}({}, {})", op, self.parent1, p2),
            },
            (op, None) => write!(f, "{}({})", op, self.parent1),
        }
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("op", &self.op)
            .field("expr", &format_args!("{}", self))
            .field("ordered_variables", &self.ordered_variables)
            .finish()
    }
}

// ============================================================================
// Graph construction contract
// ============================================================================

/// Accept an untyped operand as a graph vertex.
///
/// Variables, expressions, nodes and the primitive numeric types pass;
/// anything else fails with [`AdError::TypeCheck`].
pub fn checktype(op: Op, slot: usize, operand: &dyn Any) -> Result<Expr, AdError> {
    if let Some(e) = operand.downcast_ref::<Expr>() {
        return Ok(e.clone());
    }
    if let Some(v) = operand.downcast_ref::<Variable>() {
        return Ok(Expr::Variable(v.clone()));
    }
    if let Some(node) = operand.downcast_ref::<Arc<Node>>() {
        return Ok(Expr::Node(Arc::clone(node)));
    }
    let number = if let Some(x) = operand.downcast_ref::<f64>() {
        Some(*x)
    } else if let Some(x) = operand.downcast_ref::<f32>() {
        Some(*x as f64)
    } else if let Some(x) = operand.downcast_ref::<i32>() {
        Some(*x as f64)
    } else if let Some(x) = operand.downcast_ref::<i64>() {
        Some(*x as f64)
    } else if let Some(x) = operand.downcast_ref::<u32>() {
        Some(*x as f64)
    } else {
        operand.downcast_ref::<usize>().map(|x| *x as f64)
    };
    number
        .map(Expr::Constant)
        .ok_or(AdError::TypeCheck { op, slot })
}

/// Build a node from untyped operands.
///
/// Every operand is type-checked before anything is built, so a failed
/// call leaves no partial graph behind.
pub fn make_node(op: Op, operands: &[&dyn Any]) -> Result<Expr, AdError> {
    if operands.len() != op.arity() {
        return Err(AdError::Arity {
            op,
            expected: op.arity(),
            got: operands.len(),
        });
    }
    let mut parents = operands
        .iter()
        .enumerate()
        .map(|(slot, operand)| checktype(op, slot, *operand))
        .collect::<Result<Vec<_>, _>>()?;
    let parent2 = if parents.len() == 2 { parents.pop() } else { None };
    let parent1 = parents.remove(0);
    Ok(Node::from_parents(op, parent1, parent2).into())
}

/// Re-fix a node's variable ordering.
pub fn bind_variables(node: &Node, ordered_variables: Vec<Variable>) -> Result<Node, AdError> {
    node.bind(ordered_variables)
}

/// Split a full argument tuple into the sub-tuples each parent expects.
///
/// For a unary node the second tuple is empty.
pub fn route_arguments(node: &Node, args: &[f64]) -> Result<(Vec<f64>, Vec<f64>), AdError> {
    check_len(node.ordered_variables.len(), args.len())?;
    Ok((node.parent_arguments(0, args), node.parent_arguments(1, args)))
}

/// Fix the variable ordering of any expression.
///
/// Nodes are re-bound; a bare variable or constant is wrapped in a `pos`
/// node so it can take arguments in the requested order.
pub fn compose(expr: impl Into<Expr>, ordered_variables: Vec<Variable>) -> Result<Expr, AdError> {
    match expr.into() {
        Expr::Node(node) => Ok(node.bind(ordered_variables)?.into()),
        leaf => Ok(Node::with_ordering(Op::Pos, leaf, None, ordered_variables)?.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn xy() -> (Variable, Variable) {
        (Variable::new("x"), Variable::new("y"))
    }

    #[test]
    fn test_variable_identity() {
        let a = Variable::new("x");
        let b = Variable::new("x");
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
        assert_eq!(a.id(), a.clone().id());
    }

    #[test]
    fn test_default_ordering_is_first_occurrence() {
        let (x, y) = xy();
        let left = Node::new(Op::Mul, y.clone().into(), Expr::Constant(2.0).into()).unwrap();
        let node = Node::new(Op::Add, left.into(), Some(x.clone().into())).unwrap();
        assert_eq!(node.ordered_variables(), &[y.clone(), x.clone()]);
        assert_eq!(node.routing(0), &[0]);
        assert_eq!(node.routing(1), &[1]);
    }

    #[test]
    fn test_repeated_variable_listed_once() {
        let (x, _) = xy();
        let node = Node::new(Op::Mul, x.clone().into(), Some(x.clone().into())).unwrap();
        assert_eq!(node.ordered_variables().len(), 1);
        assert_eq!(node.routing(0), &[0]);
        assert_eq!(node.routing(1), &[0]);
    }

    #[test]
    fn test_bind_recomputes_routing() {
        let (x, y) = xy();
        let node = Node::new(Op::Sub, x.clone().into(), Some(y.clone().into())).unwrap();
        let bound = node.bind(vec![y.clone(), x.clone()]).unwrap();
        assert_eq!(bound.routing(0), &[1]);
        assert_eq!(bound.routing(1), &[0]);
        let (p1, p2) = route_arguments(&bound, &[4.0, 2.0]).unwrap();
        assert_eq!(p1, vec![2.0]);
        assert_eq!(p2, vec![4.0]);
    }

    #[test]
    fn test_bind_rejects_bad_orderings() {
        let (x, y) = xy();
        let node = Node::new(Op::Add, x.clone().into(), Some(y.clone().into())).unwrap();
        assert!(matches!(
            node.bind(vec![x.clone()]),
            Err(AdError::UnboundVariable { name }) if name == "y"
        ));
        assert!(matches!(
            node.bind(vec![x.clone(), y.clone(), x.clone()]),
            Err(AdError::DuplicateVariable { .. })
        ));
        // Extra variables are allowed
        let z = Variable::new("z");
        assert_eq!(node.bind(vec![z, y, x]).unwrap().ordered_variables().len(), 3);
    }

    #[test]
    fn test_route_arguments_dimension() {
        let (x, y) = xy();
        let node = Node::new(Op::Add, x.into(), Some(y.into())).unwrap();
        assert_eq!(
            route_arguments(&node, &[1.0]),
            Err(AdError::Dimension { expected: 2, got: 1 })
        );
    }

    #[test]
    fn test_make_node_type_check() {
        let (x, _) = xy();
        let err = make_node(Op::Add, &[&x, &"not an expression"]).unwrap_err();
        assert_eq!(err, AdError::TypeCheck { op: Op::Add, slot: 1 });

        let ok = make_node(Op::Mul, &[&2.0_f64, &x]).unwrap();
        assert_eq!(ok.ordered_variables(), &[x.clone()]);
        assert_eq!(format!("{}", ok), "(2 * x)");
    }

    #[test]
    fn test_make_node_arity() {
        let (x, y) = xy();
        assert!(matches!(
            make_node(Op::Sin, &[&x, &y]),
            Err(AdError::Arity { expected: 1, got: 2, .. })
        ));
    }

    #[test]
    fn test_node_rejects_wrong_parent_count() {
        let (x, y) = xy();
        assert_eq!(
            Node::new(Op::Add, x.clone().into(), None).unwrap_err(),
            AdError::Arity { op: Op::Add, expected: 2, got: 1 }
        );
        assert_eq!(
            Node::new(Op::Sin, x.into(), Some(y.into())).unwrap_err(),
            AdError::Arity { op: Op::Sin, expected: 1, got: 2 }
        );
    }

    #[test]
    fn test_compose_leaf() {
        let (x, y) = xy();
        let f = compose(&x, vec![x.clone(), y.clone()]).unwrap();
        assert_eq!(f.arity(), 2);
        assert_eq!(f.as_node().unwrap().op(), Op::Pos);
        assert_eq!(format!("{}", f), "x");
    }

    #[test]
    fn test_node_count_shares() {
        let (x, _) = xy();
        let g: Expr = Node::new(Op::Sin, x.into(), None).unwrap().into();
        let f: Expr = Node::new(Op::Add, g.clone(), Some(g)).unwrap().into();
        assert_eq!(f.node_count(), 2);
    }

    #[test]
    fn test_display() {
        let (x, y) = xy();
        let log: Expr = Node::new(Op::Log, x.clone().into(), Some(2.0.into())).unwrap().into();
        assert_eq!(format!("{}", log), "log(x, 2)");
        let neg: Expr = Node::new(Op::Neg, y.into(), None).unwrap().into();
        assert_eq!(format!("{}", neg), "-y");
    }
}

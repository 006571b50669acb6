//! # Backward Pass - Reverse-Mode Autodiff
//!
//! Reverse mode runs in two phases, both scoped to a single call:
//!
//! 1. **Record**: walk the graph like [`evaluate`](crate::forward::evaluate),
//!    writing a trace entry per visited variable/node: its value and the
//!    local partials w.r.t. each non-constant parent. Every parent gets a
//!    back-edge `(consumer, slot)`. Shared nodes are recorded once.
//! 2. **Propagate**: the root's adjoint is 1; any other entry's adjoint is
//!    `Σ adjoint(consumer) · consumer.partials[slot]` over its back-edges.
//!
//! The trace is a `petgraph` DAG with edges `parent → consumer`, weighted by
//! the slot. Entries are added in post-order, so node indices are already a
//! topological order and propagation is one reverse scan; no explicit sort
//! and no recursion.
//!
//! ## Example
//!
//! ```rust
//! use autodag_core::build::variable;
//! use autodag_diff::backward::Tape;
//!
//! // f = x·y + x
//! let x = variable("x");
//! let y = variable("y");
//! let f = &x * &y + &x;
//!
//! let tape = Tape::record(&f, &[3.0, 5.0]).unwrap();
//! assert_eq!(tape.value(), 18.0);
//!
//! let adjoints = tape.propagate();
//! assert_eq!(adjoints.gradient(f.ordered_variables()), vec![6.0, 3.0]);
//! ```

use std::collections::HashMap;

use autodag_core::{AdError, EvalHook, Expr, Node, NodeId, NoopHook, Variable, VariableId};
use log::{debug, trace};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;

/// Identity of a traced vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TraceKey {
    Variable(VariableId),
    Node(NodeId),
}

impl From<&Variable> for TraceKey {
    fn from(v: &Variable) -> Self {
        TraceKey::Variable(v.id())
    }
}

impl From<&Node> for TraceKey {
    fn from(node: &Node) -> Self {
        TraceKey::Node(node.id())
    }
}

/// Recorded forward value of one vertex.
#[derive(Debug, Clone, PartialEq)]
pub struct TraceEntry {
    pub key: TraceKey,
    /// Value computed in the record pass
    pub value: f64,
    /// Local partial w.r.t. each parent slot (empty for variables;
    /// 0 for constant parents)
    pub partials: Vec<f64>,
}

/// The record of one reverse-mode forward pass.
#[derive(Debug)]
pub struct Tape {
    /// Edges run parent → consumer, weighted by the consumer's slot.
    graph: DiGraph<TraceEntry, usize>,
    index: HashMap<TraceKey, NodeIndex>,
    value: f64,
}

impl Tape {
    /// Record `expr` at `args` (ordered like `expr.ordered_variables()`).
    pub fn record(expr: &Expr, args: &[f64]) -> Result<Self, AdError> {
        Self::record_with_hook(expr, args, &NoopHook)
    }

    /// [`Tape::record`], reporting each recorded node to `hook`.
    pub fn record_with_hook(expr: &Expr, args: &[f64], hook: &dyn EvalHook) -> Result<Self, AdError> {
        expr.check_arguments(args)?;
        let mut tape = Tape {
            graph: DiGraph::new(),
            index: HashMap::new(),
            value: 0.0,
        };
        let (value, _) = tape.visit(expr, args, hook)?;
        tape.value = value;
        debug!("recorded {} trace entries", tape.graph.node_count());
        Ok(tape)
    }

    fn visit(
        &mut self,
        expr: &Expr,
        args: &[f64],
        hook: &dyn EvalHook,
    ) -> Result<(f64, Option<NodeIndex>), AdError> {
        match expr {
            Expr::Constant(c) => Ok((*c, None)),
            Expr::Variable(v) => {
                let key = TraceKey::from(v);
                if let Some(&ix) = self.index.get(&key) {
                    return Ok((self.graph[ix].value, Some(ix)));
                }
                debug_assert_eq!(args.len(), 1);
                let ix = self.insert(TraceEntry {
                    key,
                    value: args[0],
                    partials: Vec::new(),
                });
                Ok((args[0], Some(ix)))
            }
            Expr::Node(node) => {
                let key = TraceKey::Node(node.id());
                if let Some(&ix) = self.index.get(&key) {
                    return Ok((self.graph[ix].value, Some(ix)));
                }

                let mut values = Vec::with_capacity(2);
                let mut parents = Vec::with_capacity(2);
                for (slot, parent) in node.parents().enumerate() {
                    let parent_args = node.parent_arguments(slot, args);
                    let (value, ix) = self.visit(parent, &parent_args, hook)?;
                    values.push(value);
                    parents.push(ix);
                }

                let op = node.op();
                let value = op.value(&values)?;
                let live: Vec<bool> = parents.iter().map(Option::is_some).collect();
                let partials = op.reverse_partials(&values, &live)?;
                hook.on_record(node, value, &partials);

                let ix = self.insert(TraceEntry {
                    key,
                    value,
                    partials,
                });
                for (slot, parent) in parents.into_iter().enumerate() {
                    if let Some(parent) = parent {
                        self.graph.add_edge(parent, ix, slot);
                    }
                }
                Ok((value, Some(ix)))
            }
        }
    }

    fn insert(&mut self, entry: TraceEntry) -> NodeIndex {
        let key = entry.key;
        let ix = self.graph.add_node(entry);
        self.index.insert(key, ix);
        ix
    }

    /// Value of the recorded expression.
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Number of trace entries (visited variables and nodes).
    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Trace entry of a vertex, if it was visited.
    pub fn entry(&self, key: TraceKey) -> Option<&TraceEntry> {
        self.index.get(&key).map(|&ix| &self.graph[ix])
    }

    /// Consumers of a vertex as `(consumer, slot)` pairs.
    pub fn back_edges(&self, key: TraceKey) -> Vec<(TraceKey, usize)> {
        let Some(&ix) = self.index.get(&key) else {
            return Vec::new();
        };
        let mut edges: Vec<(TraceKey, usize)> = self
            .graph
            .edges_directed(ix, Direction::Outgoing)
            .map(|edge| (self.graph[edge.target()].key, *edge.weight()))
            .collect();
        // petgraph lists newest edges first
        edges.reverse();
        edges
    }

    /// Adjoint pass: d(output)/d(entry) for every entry.
    pub fn propagate(&self) -> Adjoints<'_> {
        let n = self.graph.node_count();
        let mut values = vec![0.0; n];

        // Consumers always have larger indices than their parents
        for i in (0..n).rev() {
            let ix = NodeIndex::new(i);
            let mut consumers = self.graph.edges_directed(ix, Direction::Outgoing).peekable();
            if consumers.peek().is_none() {
                // Only the root has no consumers
                values[i] = 1.0;
                continue;
            }
            // Recorded partials are finite, so a zero adjoint contributes 0
            let adjoint: f64 = consumers
                .map(|edge| {
                    let consumer = edge.target();
                    values[consumer.index()] * self.graph[consumer].partials[*edge.weight()]
                })
                .sum();
            values[i] = adjoint;
        }

        trace!("propagated {} adjoints", n);
        Adjoints { tape: self, values }
    }
}

/// Adjoints computed by [`Tape::propagate`].
#[derive(Debug)]
pub struct Adjoints<'t> {
    tape: &'t Tape,
    values: Vec<f64>,
}

impl Adjoints<'_> {
    /// Adjoint of a traced vertex; 0 if the output doesn't depend on it.
    pub fn adjoint(&self, key: TraceKey) -> f64 {
        self.tape
            .index
            .get(&key)
            .map(|ix| self.values[ix.index()])
            .unwrap_or(0.0)
    }

    /// Adjoint of a variable.
    pub fn of_variable(&self, var: &Variable) -> f64 {
        self.adjoint(TraceKey::from(var))
    }

    /// Adjoints of `vars`, in order.
    pub fn gradient(&self, vars: &[Variable]) -> Vec<f64> {
        vars.iter().map(|v| self.of_variable(v)).collect()
    }
}

/// Reverse-mode gradient: one record pass and one adjoint pass.
pub fn gradient_reverse(expr: &Expr, args: &[f64]) -> Result<Vec<f64>, AdError> {
    gradient_reverse_with_hook(expr, args, &NoopHook)
}

/// [`gradient_reverse`], reporting each recorded node to `hook`.
pub fn gradient_reverse_with_hook(
    expr: &Expr,
    args: &[f64],
    hook: &dyn EvalHook,
) -> Result<Vec<f64>, AdError> {
    let tape = Tape::record_with_hook(expr, args, hook)?;
    debug!("reverse gradient over {} variable(s)", expr.arity());
    Ok(tape.propagate().gradient(expr.ordered_variables()))
}

/// Reverse-mode partial derivative w.r.t. `var`.
pub fn differentiate_reverse(expr: &Expr, args: &[f64], var: &Variable) -> Result<f64, AdError> {
    let tape = Tape::record(expr, args)?;
    Ok(tape.propagate().of_variable(var))
}

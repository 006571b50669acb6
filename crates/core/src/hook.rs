//! Evaluation hooks for observability.
//!
//! Hooks observe the evaluators without changing them. Both the forward
//! evaluator and the reverse tape report every node they actually compute;
//! a node reused from the per-call cache is not reported again.
//!
//! ## Events
//!
//! - `on_evaluate`: a node was computed during a forward sweep
//! - `on_record`: a node was written to a reverse-mode tape
//!
//! ## Example
//!
//! ```
//! use autodag_core::hook::CountingHook;
//!
//! let hook = CountingHook::new();
//! assert_eq!(hook.total(), 0);
//! ```

use std::cell::RefCell;
use std::collections::HashMap;

use log::trace;

use crate::expr::{Node, NodeId};

/// Observer for node evaluations.
///
/// All methods default to no-ops; implement only what you need.
pub trait EvalHook {
    /// Called after a forward sweep computes `node`.
    ///
    /// `tangent` is the node's directional derivative when the sweep
    /// differentiates, `None` for plain evaluation.
    fn on_evaluate(&self, _node: &Node, _value: f64, _tangent: Option<f64>) {}

    /// Called after the reverse tape records `node` with its local partials.
    fn on_record(&self, _node: &Node, _value: f64, _partials: &[f64]) {}
}

/// A hook that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHook;

impl EvalHook for NoopHook {}

/// A hook that logs every event at `trace` level.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogHook;

impl EvalHook for LogHook {
    fn on_evaluate(&self, node: &Node, value: f64, tangent: Option<f64>) {
        match tangent {
            Some(t) => trace!("eval {} = {} (d = {})", node, value, t),
            None => trace!("eval {} = {}", node, value),
        }
    }

    fn on_record(&self, node: &Node, value: f64, partials: &[f64]) {
        trace!("record {} = {} partials={:?}", node, value, partials);
    }
}

/// Counts how many times each node is computed.
#[derive(Debug, Default)]
pub struct CountingHook {
    evaluations: RefCell<HashMap<NodeId, usize>>,
    records: RefCell<HashMap<NodeId, usize>>,
}

impl CountingHook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forward-sweep computations of `node`.
    pub fn evaluations(&self, node: &Node) -> usize {
        self.evaluations.borrow().get(&node.id()).copied().unwrap_or(0)
    }

    /// Tape recordings of `node`.
    pub fn records(&self, node: &Node) -> usize {
        self.records.borrow().get(&node.id()).copied().unwrap_or(0)
    }

    /// Total events of both kinds.
    pub fn total(&self) -> usize {
        self.evaluations.borrow().values().sum::<usize>() + self.records.borrow().values().sum::<usize>()
    }

    /// Forget all counts.
    pub fn reset(&self) {
        self.evaluations.borrow_mut().clear();
        self.records.borrow_mut().clear();
    }
}

impl EvalHook for CountingHook {
    fn on_evaluate(&self, node: &Node, _value: f64, _tangent: Option<f64>) {
        *self.evaluations.borrow_mut().entry(node.id()).or_insert(0) += 1;
    }

    fn on_record(&self, node: &Node, _value: f64, _partials: &[f64]) {
        *self.records.borrow_mut().entry(node.id()).or_insert(0) += 1;
    }
}

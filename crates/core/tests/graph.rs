//! # Expression Graph Tests
//!
//! Tests for graph construction:
//! - Variable identity and ordering
//! - Argument routing through shared and re-ordered nodes
//! - Type rejection at construction time

use std::any::Any;

use autodag_core::build::{add, compose, constant, exp, mul, sin, variable};
use autodag_core::{bind_variables, make_node, route_arguments, AdError, Expr, Node, Op};

// ============================================================================
// Ordering
// ============================================================================

#[test]
fn test_variable_orders_itself() {
    let x = variable("x");
    let e: Expr = x.clone().into();
    assert_eq!(e.ordered_variables(), &[x]);
    assert_eq!(constant(3.0).arity(), 0);
}

#[test]
fn test_same_name_distinct_variables() {
    let x1 = variable("x");
    let x2 = variable("x");
    let f = add(&x1, &x2);
    assert_eq!(f.arity(), 2);
}

#[test]
fn test_nested_routing_follows_parent_orderings() {
    let x = variable("x");
    let y = variable("y");
    let z = variable("z");

    // inner orders (z, x); outer orders (y, z, x)
    let inner = mul(&z, &x);
    let outer = add(&y, &inner);
    assert_eq!(outer.ordered_variables(), &[y.clone(), z.clone(), x.clone()]);

    let node = outer.as_node().unwrap();
    let (p1, p2) = route_arguments(node, &[1.0, 2.0, 3.0]).unwrap();
    assert_eq!(p1, vec![1.0]);
    assert_eq!(p2, vec![2.0, 3.0]);

    // Re-binding the outer node does not touch the inner ordering
    let rebound = bind_variables(node, vec![x.clone(), y.clone(), z.clone()]).unwrap();
    let (p1, p2) = route_arguments(&rebound, &[3.0, 1.0, 2.0]).unwrap();
    assert_eq!(p1, vec![1.0]);
    assert_eq!(p2, vec![2.0, 3.0]);
    assert_eq!(inner.ordered_variables(), &[z, x]);
}

#[test]
fn test_compose_with_extra_variable() {
    let x = variable("x");
    let y = variable("y");
    let f = compose(exp(&x), &[x.clone(), y.clone()]).unwrap();
    assert_eq!(f.arity(), 2);
    let (p1, _) = route_arguments(f.as_node().unwrap(), &[0.5, 9.0]).unwrap();
    assert_eq!(p1, vec![0.5]);
}

#[test]
fn test_compose_constant() {
    let x = variable("x");
    let f = compose(constant(4.0), &[x]).unwrap();
    assert_eq!(f.arity(), 1);
    assert_eq!(f.to_string(), "4");
}

// ============================================================================
// Construction errors
// ============================================================================

#[test]
fn test_type_rejection_before_build() {
    let x = variable("x");
    let operands: [&dyn Any; 2] = [&"hello", &x];
    assert_eq!(
        make_node(Op::Mul, &operands).unwrap_err(),
        AdError::TypeCheck { op: Op::Mul, slot: 0 }
    );

    let vec_operand = vec![1.0_f64];
    assert!(matches!(
        make_node(Op::Sin, &[&vec_operand]),
        Err(AdError::TypeCheck { slot: 0, .. })
    ));
}

#[test]
fn test_make_node_accepts_all_vertex_kinds() {
    let x = variable("x");
    let g = sin(&x);
    let node = g.as_node().unwrap().clone();
    let f = make_node(Op::Add, &[&node, &3_i32]).unwrap();
    assert_eq!(f.to_string(), "(sin(x) + 3)");
    let h = make_node(Op::Pow, &[&f, &g]).unwrap();
    assert_eq!(h.arity(), 1);
}

#[test]
fn test_bind_missing_variable() {
    let x = variable("x");
    let y = variable("y");
    let node = Node::new(Op::Div, x.clone().into(), Some(y.into())).unwrap();
    assert!(matches!(
        bind_variables(&node, vec![x]),
        Err(AdError::UnboundVariable { .. })
    ));
}

#[test]
fn test_error_messages() {
    let err = AdError::Dimension { expected: 2, got: 3 };
    assert_eq!(
        err.to_string(),
        "Dimension mismatch: expression takes 2 argument(s), got 3"
    );
    let err = AdError::TypeCheck { op: Op::Add, slot: 1 };
    assert!(err.to_string().contains("`add`"));
}

//! Jacobians of vector expressions.
//!
//! Run with: cargo run -p autodag-diff --example jacobian
//!
//! This example demonstrates:
//! - Binding several components to one variable ordering
//! - Assembling the Jacobian in both modes
//! - Extracting a single column without the full matrix
//! - Emitting results as JSON

use autodag_core::build::{cos, mul, sin, variable};
use autodag_diff::{grad_check, make_vector_expression, Mode};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    println!("=== Jacobians ===\n");

    // -------------------------------------------------------------------------
    // 1. f(x, y) = [x + y, x - y]
    // -------------------------------------------------------------------------
    println!("1. f(x, y) = [x + y, x - y]");
    println!("---------------------------");

    let x = variable("x");
    let y = variable("y");
    let f = make_vector_expression(vec![&x + &y, &x - &y], &[x.clone(), y.clone()])?;
    for mode in Mode::ALL {
        let j = f.jacobian(&[1.0, 2.0], mode)?;
        println!("{}: {:?}", mode, j.to_rows());
    }
    println!();

    // -------------------------------------------------------------------------
    // 2. Polar to Cartesian
    // -------------------------------------------------------------------------
    println!("2. (r, θ) ↦ (r cos θ, r sin θ)");
    println!("------------------------------");

    let r = variable("r");
    let theta = variable("theta");
    let polar = make_vector_expression(
        vec![mul(&r, cos(&theta)), mul(&r, sin(&theta))],
        &[r.clone(), theta.clone()],
    )?;
    let point = [2.0, std::f64::consts::FRAC_PI_6];

    let j = polar.jacobian(&point, Mode::Reverse)?;
    println!("value  = {:?}", polar.eval(&point)?);
    println!("J      = {:?}", j.to_rows());
    println!("∂/∂θ   = {:?}", polar.partial(&point, &theta, Mode::Forward)?);
    println!("json   = {}", serde_json::to_string(&j)?);

    for component in polar.components() {
        grad_check(component, &point, Mode::Reverse, 1e-6, 1e-6)?;
    }
    println!("gradient check passed");

    Ok(())
}

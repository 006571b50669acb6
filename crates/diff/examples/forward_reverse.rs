//! Forward and reverse mode side by side.
//!
//! Run with: RUST_LOG=debug cargo run -p autodag-diff --example forward_reverse
//!
//! This example demonstrates:
//! - Building expressions with operators and named constructors
//! - Fixing the argument order with `compose`
//! - The same derivatives from both modes
//! - Inspecting a reverse-mode tape
//! - Domain errors reported identically by both modes

use autodag_core::build::{compose, cos, exp, pow, sin, tan, variable};
use autodag_core::LogHook;
use autodag_diff::backward::{Tape, TraceKey};
use autodag_diff::forward::evaluate_with_hook;
use autodag_diff::{gradient, DerivOptions, Differentiable, Mode};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    println!("=== Forward and Reverse Mode ===\n");

    // -------------------------------------------------------------------------
    // 1. One variable
    // -------------------------------------------------------------------------
    println!("1. f(x) = cos(x) + 2 tan(x)");
    println!("---------------------------");

    let x = variable("x");
    let f = cos(&x) + 2.0 * tan(&x);
    println!("f      = {}", f);
    println!("f(0)   = {}", f.eval(&[0.0])?);
    for mode in Mode::ALL {
        let d = f.deriv(&[0.0], DerivOptions::new().with_mode(mode))?;
        println!("f'(0)  = {:?}  ({})", d, mode);
    }
    println!();

    // -------------------------------------------------------------------------
    // 2. Several variables, explicit order
    // -------------------------------------------------------------------------
    println!("2. g(y, x) = x^y · sin(x) - exp(y)");
    println!("----------------------------------");

    let y = variable("y");
    let g = compose(pow(&x, &y) * sin(&x) - exp(&y), &[y.clone(), x.clone()])?;
    let point = [2.0, 1.5];
    println!("order  = {:?}", g.ordered_variables());
    println!("g      = {}", evaluate_with_hook(&g, &point, &LogHook)?);
    println!("∇g fwd = {:?}", gradient(&g, &point, Mode::Forward)?);
    println!("∇g rev = {:?}", gradient(&g, &point, Mode::Reverse)?);
    println!(
        "∂g/∂x  = {:?}",
        g.deriv(&point, DerivOptions::new().with_var(&x))?
    );
    println!();

    // -------------------------------------------------------------------------
    // 3. The tape
    // -------------------------------------------------------------------------
    println!("3. Tape for h = s·s with s = sin(x)");
    println!("-----------------------------------");

    let s = sin(&x);
    let h = &s * &s;
    let tape = Tape::record(&h, &[0.5])?;
    let adjoints = tape.propagate();
    println!("entries       = {}", tape.len());
    if let Some(node) = s.as_node() {
        let key = TraceKey::Node(node.id());
        println!("s back-edges  = {:?}", tape.back_edges(key));
        println!("adjoint of s  = {}", adjoints.adjoint(key));
    }
    println!("adjoint of x  = {}", adjoints.of_variable(&x));
    println!();

    // -------------------------------------------------------------------------
    // 4. Domain errors
    // -------------------------------------------------------------------------
    println!("4. x^y at x = -2");
    println!("----------------");

    let p = pow(&x, &y);
    for mode in Mode::ALL {
        match gradient(&p, &[-2.0, 2.0], mode) {
            Ok(grad) => println!("{}: {:?}", mode, grad),
            Err(e) => println!("{}: {}", mode, e),
        }
    }

    Ok(())
}

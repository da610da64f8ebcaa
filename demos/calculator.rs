//! Example wrapping a trait object in a logging proxy
//!
//! Run with:
//!   cargo run --example calculator
//!
//! Add `--features logging-pretty` to see the handler's lines as events too.

use graph_injector::{Dispatcher, HandlerChain, InterceptError, LoggingHandler, interface};
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
enum CalcError {
    #[error("Division by zero")]
    DivisionByZero,
    #[error(transparent)]
    Intercepted(#[from] InterceptError),
}

#[interface]
trait Calculator: Send + Sync {
    fn add(&self, a: i32, b: i32) -> Result<i32, CalcError>;
    fn subtract(&self, a: i32, b: i32) -> Result<i32, CalcError>;
    fn multiply(&self, a: i32, b: i32) -> Result<i32, CalcError>;
    fn divide(&self, a: i32, b: i32) -> Result<f64, CalcError>;
}

struct SimpleCalculator;

impl Calculator for SimpleCalculator {
    fn add(&self, a: i32, b: i32) -> Result<i32, CalcError> {
        Ok(a + b)
    }

    fn subtract(&self, a: i32, b: i32) -> Result<i32, CalcError> {
        Ok(a - b)
    }

    fn multiply(&self, a: i32, b: i32) -> Result<i32, CalcError> {
        Ok(a * b)
    }

    fn divide(&self, a: i32, b: i32) -> Result<f64, CalcError> {
        if b == 0 {
            return Err(CalcError::DivisionByZero);
        }
        Ok(f64::from(a) / f64::from(b))
    }
}

fn session(calculator: &dyn Calculator) -> Result<(), CalcError> {
    let sum = calculator.add(5, 3)?;
    let diff = calculator.subtract(10, 4)?;
    let product = calculator.multiply(6, 7)?;
    let quotient = calculator.divide(20, 4)?;
    println!("  sum={sum} diff={diff} product={product} quotient={quotient}");

    calculator.divide(10, 0)?;
    Ok(())
}

fn main() {
    #[cfg(feature = "logging")]
    graph_injector::logging::init();

    println!("=== Graph Injector Proxy Demo ===\n");

    let (logging, log) = LoggingHandler::capturing();
    let dispatcher = Dispatcher::new(HandlerChain::builder().with(logging).build());
    let target: Arc<dyn Calculator> = Arc::new(SimpleCalculator);
    let proxy = dispatcher.create_proxy(target);

    if let Err(err) = session(&proxy) {
        println!("  session failed: {err}");
    }
    println!();

    println!("Logging handler output:");
    for line in log.lines() {
        println!("  {line}");
    }
    println!();

    println!("=== Demo Complete ===");
}

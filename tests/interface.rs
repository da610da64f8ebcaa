#![cfg(feature = "derive")]

use graph_injector::{
    BoxError, CallHandler, Dispatcher, HandlerChain, Inject, InterceptError, Interface,
    Invocation, LoggingHandler, Proxy, Resolver, Slot, interface,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, PartialEq, thiserror::Error)]
enum CalcError {
    #[error("Division by zero")]
    DivisionByZero,
    #[error("rejected: {0}")]
    Rejected(String),
}

impl From<InterceptError> for CalcError {
    fn from(error: InterceptError) -> Self {
        CalcError::Rejected(error.to_string())
    }
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

fn logging_calculator() -> (Proxy<dyn Calculator>, graph_injector::LogBuffer) {
    let (logging, log) = LoggingHandler::capturing();
    let dispatcher = Dispatcher::new(HandlerChain::builder().with(logging).build());
    let target: Arc<dyn Calculator> = Arc::new(SimpleCalculator);
    (dispatcher.create_proxy(target), log)
}

#[test]
fn test_generated_interface_descriptor() {
    let descriptor = <dyn Calculator as Interface>::descriptor();

    assert_eq!(descriptor.name(), "Calculator");
    let ops: Vec<_> = descriptor
        .operations()
        .iter()
        .map(|op| (op.name(), op.arity()))
        .collect();
    assert_eq!(
        ops,
        [("add", 2), ("subtract", 2), ("multiply", 2), ("divide", 2)]
    );
}

#[test]
fn test_calculator_session() {
    let (proxy, log) = logging_calculator();

    assert_eq!(proxy.add(5, 3), Ok(8));
    assert_eq!(proxy.subtract(10, 4), Ok(6));
    assert_eq!(proxy.multiply(6, 7), Ok(42));
    assert_eq!(proxy.divide(20, 4), Ok(5.0));
    assert_eq!(proxy.divide(10, 0), Err(CalcError::DivisionByZero));

    assert_eq!(
        log.lines(),
        [
            "add, args=[5, 3]",
            "add succeeded, result=8",
            "subtract, args=[10, 4]",
            "subtract succeeded, result=6",
            "multiply, args=[6, 7]",
            "multiply succeeded, result=42",
            "divide, args=[20, 4]",
            "divide succeeded, result=5.0",
            "divide, args=[10, 0]",
            "divide failed: Division by zero",
        ]
    );
}

#[test]
fn test_proxy_matches_direct_calls() {
    let (proxy, _log) = logging_calculator();
    let direct = SimpleCalculator;

    for (a, b) in [(1, 2), (-7, 3), (0, 0), (i32::MAX, 1)] {
        assert_eq!(proxy.divide(a, b), direct.divide(a, b));
        assert_eq!(proxy.multiply(a % 1000, b), direct.multiply(a % 1000, b));
    }
}

#[test]
fn test_before_hook_veto() {
    struct NoDivision;

    impl CallHandler for NoDivision {
        fn name(&self) -> &'static str {
            "no-division"
        }

        fn before(&self, call: &Invocation<'_>) -> Result<(), BoxError> {
            if call.operation() == "divide" {
                return Err("division disabled".into());
            }
            Ok(())
        }
    }

    let (logging, log) = LoggingHandler::capturing();
    let chain = HandlerChain::builder().with(NoDivision).with(logging).build();
    let target: Arc<dyn Calculator> = Arc::new(SimpleCalculator);
    let proxy = Proxy::new(target, chain);

    assert_eq!(
        proxy.divide(1, 1),
        Err(CalcError::Rejected(
            "Call handler 'no-division' rejected the call: division disabled".into()
        ))
    );
    // The logging hook sits after the veto and never sees the call
    assert!(log.is_empty());

    assert_eq!(proxy.add(1, 1), Ok(2));
    assert_eq!(log.len(), 2);
}

#[interface]
trait Greeter: Send + Sync {
    fn greet(&self, name: &str) -> Result<String, CalcError>;
    fn count(&self) -> Result<usize, CalcError>;
}

#[derive(Default, Inject)]
struct Counter {
    hits: AtomicUsize,
}

#[derive(Default, Inject)]
struct FriendlyGreeter {
    #[inject]
    counter: Slot<Counter>,
}

impl Greeter for FriendlyGreeter {
    fn greet(&self, name: &str) -> Result<String, CalcError> {
        self.counter.hits.fetch_add(1, Ordering::SeqCst);
        Ok(format!("Hello, {name}!"))
    }

    fn count(&self) -> Result<usize, CalcError> {
        Ok(self.counter.hits.load(Ordering::SeqCst))
    }
}

#[test]
fn test_resolved_graph_behind_proxy() {
    let greeter: Arc<dyn Greeter> = Arc::new(Resolver::new().resolve::<FriendlyGreeter>().unwrap());
    let (logging, log) = LoggingHandler::capturing();
    let proxy = Dispatcher::new(HandlerChain::builder().with(logging).build()).create_proxy(greeter);

    assert_eq!(proxy.greet("Ada").as_deref(), Ok("Hello, Ada!"));
    assert_eq!(proxy.count(), Ok(1));

    assert_eq!(
        log.lines(),
        [
            r#"greet, args=["Ada"]"#,
            r#"greet succeeded, result="Hello, Ada!""#,
            "count, args=[]",
            "count succeeded, result=1",
        ]
    );
}

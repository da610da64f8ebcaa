//! Interface-shaped proxies
//!
//! A [`Proxy<dyn Trait>`] holds a shared target and a [`HandlerChain`] and
//! implements `Trait` itself, so callers use it exactly like the target while
//! every call runs through the chain. The `impl Trait for Proxy<dyn Trait>`
//! is normally generated by `#[interface]`; hand-written impls forward each
//! method to [`Proxy::dispatch`].

use crate::{Arguments, HandlerChain, InterceptError, LoggingHandler};
use ahash::RandomState;
use dashmap::DashMap;
use std::any::TypeId;
use std::error::Error as StdError;
use std::fmt::{self, Debug};
use std::sync::Arc;

#[cfg(feature = "logging")]
use tracing::{debug, trace};

/// A trait object type that can be proxied.
///
/// Implemented for `dyn Trait`, listing the trait's operations.
pub trait Interface: 'static {
    /// Describe the interface's operations
    fn descriptor() -> InterfaceDescriptor;
}

/// One operation of an interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperationDescriptor {
    name: &'static str,
    arity: usize,
}

impl OperationDescriptor {
    /// Operation name
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Number of arguments, not counting the receiver
    #[inline]
    pub fn arity(&self) -> usize {
        self.arity
    }
}

/// Name and operations of an interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceDescriptor {
    name: &'static str,
    operations: Vec<OperationDescriptor>,
}

impl InterfaceDescriptor {
    /// Start describing an interface
    pub fn builder(name: &'static str) -> InterfaceBuilder {
        InterfaceBuilder {
            name,
            operations: Vec::new(),
        }
    }

    /// Interface name
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Operations in declaration order
    #[inline]
    pub fn operations(&self) -> &[OperationDescriptor] {
        &self.operations
    }

    /// Look up an operation by name
    pub fn operation(&self, name: &str) -> Option<&OperationDescriptor> {
        self.operations.iter().find(|op| op.name == name)
    }

    /// Check if the interface declares an operation
    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.operation(name).is_some()
    }
}

/// Builder for an [`InterfaceDescriptor`].
pub struct InterfaceBuilder {
    name: &'static str,
    operations: Vec<OperationDescriptor>,
}

impl InterfaceBuilder {
    /// Declare an operation. Re-declaring a name replaces its arity.
    pub fn operation(mut self, name: &'static str, arity: usize) -> Self {
        match self.operations.iter_mut().find(|op| op.name == name) {
            Some(existing) => existing.arity = arity,
            None => self.operations.push(OperationDescriptor { name, arity }),
        }
        self
    }

    /// Finish the descriptor
    pub fn build(self) -> InterfaceDescriptor {
        InterfaceDescriptor {
            name: self.name,
            operations: self.operations,
        }
    }
}

/// Stand-in for a target that routes every call through a handler chain.
///
/// Stateless beyond its interface, target and chain: clones share all
/// three, and many proxies may wrap the same target.
///
/// # Examples
///
/// ```rust
/// use graph_injector::{Arguments, Interface, InterfaceDescriptor, InterceptError, LoggingHandler, Proxy, HandlerChain};
/// use std::sync::Arc;
///
/// trait Greeter: Send + Sync {
///     fn greet(&self, name: &str) -> Result<String, InterceptError>;
/// }
///
/// impl Interface for dyn Greeter {
///     fn descriptor() -> InterfaceDescriptor {
///         InterfaceDescriptor::builder("Greeter").operation("greet", 1).build()
///     }
/// }
///
/// impl Greeter for Proxy<dyn Greeter> {
///     fn greet(&self, name: &str) -> Result<String, InterceptError> {
///         self.dispatch("greet", Arguments::new(&[&name]), |target| target.greet(name))
///     }
/// }
///
/// struct English;
/// impl Greeter for English {
///     fn greet(&self, name: &str) -> Result<String, InterceptError> {
///         Ok(format!("Hello, {name}"))
///     }
/// }
///
/// let (logging, log) = LoggingHandler::capturing();
/// let target: Arc<dyn Greeter> = Arc::new(English);
/// let proxy = Proxy::new(target, HandlerChain::builder().with(logging).build());
///
/// assert_eq!(proxy.greet("Ada").unwrap(), "Hello, Ada");
/// assert_eq!(log.lines()[0], r#"greet, args=["Ada"]"#);
/// ```
pub struct Proxy<I: ?Sized> {
    interface: Arc<InterfaceDescriptor>,
    target: Arc<I>,
    chain: HandlerChain,
}

impl<I: Interface + ?Sized> Proxy<I> {
    /// Wrap `target` behind `chain`
    pub fn new(target: Arc<I>, chain: HandlerChain) -> Self {
        Self::with_descriptor(Arc::new(I::descriptor()), target, chain)
    }
}

impl<I: ?Sized> Proxy<I> {
    fn with_descriptor(
        interface: Arc<InterfaceDescriptor>,
        target: Arc<I>,
        chain: HandlerChain,
    ) -> Self {
        #[cfg(feature = "logging")]
        debug!(
            target: "graph_injector",
            interface = interface.name(),
            operations = interface.operations().len(),
            handlers = chain.len(),
            "Creating proxy"
        );

        Self {
            interface,
            target,
            chain,
        }
    }

    /// Forward one call to the target through the chain.
    ///
    /// `operation` must be declared by the interface; otherwise the call is
    /// refused with [`InterceptError::UnknownOperation`] before any hook
    /// runs. The target's result or error is returned unchanged.
    pub fn dispatch<R, E, F>(&self, operation: &'static str, args: Arguments, call: F) -> Result<R, E>
    where
        F: FnOnce(&I) -> Result<R, E>,
        R: Debug,
        E: StdError + From<InterceptError> + 'static,
    {
        if !self.interface.contains(operation) {
            return Err(E::from(InterceptError::UnknownOperation {
                interface: self.interface.name(),
                operation,
            }));
        }

        #[cfg(feature = "logging")]
        trace!(
            target: "graph_injector",
            interface = self.interface.name(),
            operation,
            "Dispatching call"
        );

        let target = &*self.target;
        self.chain.around(operation, args, || call(target))
    }

    /// The wrapped target
    #[inline]
    pub fn target(&self) -> &Arc<I> {
        &self.target
    }

    /// Interface this proxy exposes
    #[inline]
    pub fn interface(&self) -> &InterfaceDescriptor {
        &self.interface
    }

    /// Handlers run around every call
    #[inline]
    pub fn chain(&self) -> &HandlerChain {
        &self.chain
    }
}

impl<I: ?Sized> Clone for Proxy<I> {
    fn clone(&self) -> Self {
        Self {
            interface: Arc::clone(&self.interface),
            target: Arc::clone(&self.target),
            chain: self.chain.clone(),
        }
    }
}

impl<I: ?Sized> Debug for Proxy<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Proxy")
            .field("interface", &self.interface.name())
            .field("chain", &self.chain)
            .finish()
    }
}

/// Creates proxies that share one handler chain.
///
/// Interface descriptors are cached per interface type.
pub struct Dispatcher {
    chain: HandlerChain,
    interfaces: DashMap<TypeId, Arc<InterfaceDescriptor>, RandomState>,
}

impl Dispatcher {
    /// Dispatcher whose proxies run `chain`
    pub fn new(chain: HandlerChain) -> Self {
        Self {
            chain,
            interfaces: DashMap::with_capacity_and_hasher_and_shard_amount(
                0,
                RandomState::new(),
                4,
            ),
        }
    }

    /// Dispatcher whose proxies log every call
    pub fn logging() -> Self {
        Self::new(HandlerChain::builder().with(LoggingHandler::new()).build())
    }

    /// Chain shared by every proxy from this dispatcher
    #[inline]
    pub fn chain(&self) -> &HandlerChain {
        &self.chain
    }

    /// Wrap `target` in a proxy exposing interface `I`
    pub fn create_proxy<I: Interface + ?Sized>(&self, target: Arc<I>) -> Proxy<I> {
        Proxy::with_descriptor(self.interface::<I>(), target, self.chain.clone())
    }

    /// Cached descriptor of interface `I`
    pub fn interface<I: Interface + ?Sized>(&self) -> Arc<InterfaceDescriptor> {
        let entry = self
            .interfaces
            .entry(TypeId::of::<I>())
            .or_insert_with(|| Arc::new(I::descriptor()));
        Arc::clone(entry.value())
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(HandlerChain::new())
    }
}

impl Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("chain", &self.chain)
            .field("interfaces", &self.interfaces.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BoxError, CallHandler, Invocation, InvocationRecord};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, PartialEq, thiserror::Error)]
    enum CalcError {
        #[error("Division by zero")]
        DivisionByZero,
        #[error("{0}")]
        Intercepted(String),
    }

    impl From<InterceptError> for CalcError {
        fn from(error: InterceptError) -> Self {
            CalcError::Intercepted(error.to_string())
        }
    }

    trait Calculator: Send + Sync {
        fn add(&self, a: i32, b: i32) -> Result<i32, CalcError>;
        fn divide(&self, a: i32, b: i32) -> Result<f64, CalcError>;
        fn sqrt(&self, a: f64) -> Result<f64, CalcError>;
    }

    // `sqrt` is left out so dispatching it is refused
    impl Interface for dyn Calculator {
        fn descriptor() -> InterfaceDescriptor {
            InterfaceDescriptor::builder("Calculator")
                .operation("add", 2)
                .operation("divide", 2)
                .build()
        }
    }

    impl Calculator for Proxy<dyn Calculator> {
        fn add(&self, a: i32, b: i32) -> Result<i32, CalcError> {
            self.dispatch("add", Arguments::new(&[&a, &b]), |t| t.add(a, b))
        }

        fn divide(&self, a: i32, b: i32) -> Result<f64, CalcError> {
            self.dispatch("divide", Arguments::new(&[&a, &b]), |t| t.divide(a, b))
        }

        fn sqrt(&self, a: f64) -> Result<f64, CalcError> {
            self.dispatch("sqrt", Arguments::new(&[&a]), |t| t.sqrt(a))
        }
    }

    #[derive(Default)]
    struct Real {
        calls: AtomicUsize,
    }

    impl Calculator for Real {
        fn add(&self, a: i32, b: i32) -> Result<i32, CalcError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(a + b)
        }

        fn divide(&self, a: i32, b: i32) -> Result<f64, CalcError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if b == 0 {
                return Err(CalcError::DivisionByZero);
            }
            Ok(f64::from(a) / f64::from(b))
        }

        fn sqrt(&self, a: f64) -> Result<f64, CalcError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(a.sqrt())
        }
    }

    fn logging_proxy() -> (Proxy<dyn Calculator>, Arc<Real>, crate::LogBuffer) {
        let (logging, log) = LoggingHandler::capturing();
        let real = Arc::new(Real::default());
        let target: Arc<dyn Calculator> = real.clone();
        let dispatcher = Dispatcher::new(HandlerChain::builder().with(logging).build());
        (dispatcher.create_proxy(target), real, log)
    }

    #[test]
    fn test_pass_through_identity() {
        let (proxy, real, _log) = logging_proxy();

        assert_eq!(proxy.add(5, 3), real.add(5, 3));
        assert_eq!(proxy.divide(20, 4), real.divide(20, 4));
        assert_eq!(proxy.divide(20, 4), Ok(5.0));
    }

    #[test]
    fn test_divide_by_zero_logged_and_propagated() {
        let (proxy, real, log) = logging_proxy();

        let err = proxy.divide(10, 0).unwrap_err();

        assert_eq!(err, real.divide(10, 0).unwrap_err());
        assert_eq!(
            log.lines(),
            ["divide, args=[10, 0]", "divide failed: Division by zero"]
        );
    }

    #[test]
    fn test_unknown_operation_refused_before_hooks() {
        let (proxy, real, log) = logging_proxy();

        let err = proxy.sqrt(9.0).unwrap_err();

        assert_eq!(
            err,
            CalcError::Intercepted(
                "Operation 'sqrt' is not part of interface Calculator".into()
            )
        );
        assert!(log.is_empty());
        assert_eq!(real.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_vetoed_call_never_reaches_target() {
        struct ReadOnly;
        impl CallHandler for ReadOnly {
            fn name(&self) -> &'static str {
                "read-only"
            }
            fn before(&self, call: &Invocation<'_>) -> Result<(), BoxError> {
                if call.operation() == "divide" {
                    return Err("divide is disabled".into());
                }
                Ok(())
            }
        }

        let real = Arc::new(Real::default());
        let target: Arc<dyn Calculator> = real.clone();
        let proxy = Proxy::new(target, HandlerChain::builder().with(ReadOnly).build());

        assert_eq!(proxy.add(1, 1), Ok(2));
        assert_eq!(
            proxy.divide(1, 1),
            Err(CalcError::Intercepted(
                "Call handler 'read-only' rejected the call: divide is disabled".into()
            ))
        );
        assert_eq!(real.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_proxies_share_target_and_chain() {
        struct Count(AtomicUsize);
        impl CallHandler for Count {
            fn after(&self, _record: &InvocationRecord<'_>) {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }

        let counter = Arc::new(Count(AtomicUsize::new(0)));
        let dispatcher = Dispatcher::new(
            HandlerChain::builder()
                .with_shared(counter.clone())
                .build(),
        );
        let real = Arc::new(Real::default());
        let target: Arc<dyn Calculator> = real.clone();

        let first = dispatcher.create_proxy(Arc::clone(&target));
        let second = dispatcher.create_proxy(target);
        let third = first.clone();

        std::thread::scope(|s| {
            for proxy in [&first, &second, &third] {
                s.spawn(move || {
                    for i in 0..10 {
                        assert_eq!(proxy.add(i, 1), Ok(i + 1));
                    }
                });
            }
        });

        assert_eq!(counter.0.load(Ordering::SeqCst), 30);
        assert_eq!(real.calls.load(Ordering::SeqCst), 30);
        assert!(Arc::ptr_eq(first.target(), second.target()));
    }

    #[test]
    fn test_dispatcher_caches_interface() {
        let dispatcher = Dispatcher::logging();
        let a = dispatcher.interface::<dyn Calculator>();
        let b = dispatcher.interface::<dyn Calculator>();

        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.name(), "Calculator");
        assert_eq!(a.operation("divide").map(|op| op.arity()), Some(2));
        assert_eq!(dispatcher.chain().handler_names(), ["logging"]);
    }

    #[test]
    fn test_builder_redeclare_replaces_arity() {
        let descriptor = InterfaceDescriptor::builder("Store")
            .operation("get", 1)
            .operation("put", 2)
            .operation("get", 2)
            .build();

        assert_eq!(
            descriptor.operations().iter().map(|op| (op.name(), op.arity())).collect::<Vec<_>>(),
            [("get", 2), ("put", 2)]
        );
        assert!(!descriptor.contains("delete"));
    }
}

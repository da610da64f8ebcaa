//! Call handler chain
//!
//! An ordered list of observers run around every intercepted call. Hooks
//! see the call before it happens and its outcome afterwards; they can veto
//! a call up front but never alter a result or an error.

use crate::{BoxError, InterceptError};
use std::error::Error as StdError;
use std::fmt::{self, Debug, Display};
use std::sync::Arc;

#[cfg(feature = "logging")]
use tracing::trace;

/// Snapshot of a call's arguments, rendered with their `Debug` form.
///
/// Taken before the real call runs, so hooks never hold borrows of the
/// arguments themselves.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Arguments(Vec<String>);

impl Arguments {
    /// Snapshot the given arguments
    pub fn new(args: &[&dyn Debug]) -> Self {
        Self(args.iter().map(|arg| format!("{arg:?}")).collect())
    }

    /// No arguments
    #[inline]
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    /// Number of arguments
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if there are no arguments
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Rendered arguments in call order
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl Display for Arguments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.0.join(", "))
    }
}

impl Debug for Arguments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Display::fmt(self, f)
    }
}

/// A call about to be forwarded.
#[derive(Debug, Clone, Copy)]
pub struct Invocation<'a> {
    operation: &'static str,
    args: &'a Arguments,
}

impl<'a> Invocation<'a> {
    /// Name of the operation being called
    #[inline]
    pub fn operation(&self) -> &'static str {
        self.operation
    }

    /// Argument snapshot
    #[inline]
    pub fn args(&self) -> &'a Arguments {
        self.args
    }
}

/// What the real call produced.
#[derive(Debug, Clone, Copy)]
pub enum Outcome<'a> {
    /// The call returned a value
    Returned(&'a dyn Debug),
    /// The call returned an error
    Raised(&'a (dyn StdError + 'static)),
}

impl Outcome<'_> {
    /// Whether the call succeeded
    #[inline]
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Returned(_))
    }
}

/// A finished call: operation, argument snapshot and outcome.
///
/// Only lives for the duration of the after-hooks.
#[derive(Debug, Clone, Copy)]
pub struct InvocationRecord<'a> {
    invocation: Invocation<'a>,
    outcome: Outcome<'a>,
}

impl<'a> InvocationRecord<'a> {
    /// Name of the operation that ran
    #[inline]
    pub fn operation(&self) -> &'static str {
        self.invocation.operation
    }

    /// Argument snapshot
    #[inline]
    pub fn args(&self) -> &'a Arguments {
        self.invocation.args
    }

    /// Result or error of the real call
    #[inline]
    pub fn outcome(&self) -> Outcome<'a> {
        self.outcome
    }
}

/// An observer invoked around intercepted calls.
///
/// Handlers are shared between threads and must not rely on being called
/// from one thread at a time.
pub trait CallHandler: Send + Sync {
    /// Name used in error messages and logs
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Runs before the real call. Returning an error cancels the call.
    fn before(&self, _call: &Invocation<'_>) -> Result<(), BoxError> {
        Ok(())
    }

    /// Runs after the real call, whether it succeeded or failed.
    fn after(&self, _record: &InvocationRecord<'_>) {}
}

/// Ordered, immutable list of call handlers.
///
/// Cloning is cheap; clones share the handlers.
///
/// # Examples
///
/// ```rust
/// use graph_injector::{Arguments, HandlerChain, InterceptError, LoggingHandler};
///
/// #[derive(Debug, thiserror::Error)]
/// enum MathError {
///     #[error("division by zero")]
///     DivisionByZero,
///     #[error(transparent)]
///     Intercept(#[from] InterceptError),
/// }
///
/// let (logging, log) = LoggingHandler::capturing();
/// let chain = HandlerChain::builder().with(logging).build();
///
/// let result: Result<i32, MathError> =
///     chain.around("divide", Arguments::new(&[&10, &0]), || Err(MathError::DivisionByZero));
///
/// assert!(matches!(result, Err(MathError::DivisionByZero)));
/// assert_eq!(log.lines(), ["divide, args=[10, 0]", "divide failed: division by zero"]);
/// ```
#[derive(Clone, Default)]
pub struct HandlerChain {
    handlers: Arc<[Arc<dyn CallHandler>]>,
}

impl HandlerChain {
    /// An empty chain: calls pass straight through
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start building a chain
    #[inline]
    pub fn builder() -> ChainBuilder {
        ChainBuilder {
            handlers: Vec::new(),
        }
    }

    /// Number of handlers
    #[inline]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Check if the chain has no handlers
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Handler names in registration order
    pub fn handler_names(&self) -> Vec<&'static str> {
        self.handlers.iter().map(|handler| handler.name()).collect()
    }

    /// Run `invoke` with every handler around it.
    ///
    /// 1. Before-hooks run in registration order. The first failure stops the
    ///    call: `invoke` is not run, no after-hooks run, and the hook's error
    ///    is returned inside [`InterceptError::Hook`]. The hook's own error
    ///    stays reachable as that variant's `source`.
    /// 2. `invoke` runs.
    /// 3. After-hooks run in registration order, each exactly once, for
    ///    success and failure alike.
    /// 4. The result of `invoke` is returned as-is.
    pub fn around<R, E, F>(&self, operation: &'static str, args: Arguments, invoke: F) -> Result<R, E>
    where
        F: FnOnce() -> Result<R, E>,
        R: Debug,
        E: StdError + From<InterceptError> + 'static,
    {
        let call = Invocation {
            operation,
            args: &args,
        };

        for handler in self.handlers.iter() {
            if let Err(source) = handler.before(&call) {
                #[cfg(feature = "logging")]
                trace!(
                    target: "graph_injector",
                    operation,
                    handler = handler.name(),
                    "Call rejected by before-hook"
                );

                return Err(E::from(InterceptError::Hook {
                    handler: handler.name(),
                    source,
                }));
            }
        }

        let result = invoke();

        let outcome = match &result {
            Ok(value) => Outcome::Returned(value),
            Err(error) => Outcome::Raised(error),
        };
        let record = InvocationRecord {
            invocation: call,
            outcome,
        };
        for handler in self.handlers.iter() {
            handler.after(&record);
        }

        result
    }
}

impl Debug for HandlerChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerChain")
            .field("handlers", &self.handler_names())
            .finish()
    }
}

/// Fluent builder for a [`HandlerChain`].
pub struct ChainBuilder {
    handlers: Vec<Arc<dyn CallHandler>>,
}

impl ChainBuilder {
    /// Append a handler and continue the chain
    #[inline]
    pub fn with<H: CallHandler + 'static>(mut self, handler: H) -> Self {
        self.handlers.push(Arc::new(handler));
        self
    }

    /// Append a shared handler and continue the chain
    #[inline]
    pub fn with_shared(mut self, handler: Arc<dyn CallHandler>) -> Self {
        self.handlers.push(handler);
        self
    }

    /// Finish the chain
    #[inline]
    pub fn build(self) -> HandlerChain {
        HandlerChain {
            handlers: self.handlers.into(),
        }
    }
}

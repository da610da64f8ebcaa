//! Built-in call handlers

use crate::{BoxError, CallHandler, Invocation, InvocationRecord, Outcome};
use std::sync::{Arc, Mutex, PoisonError};

#[cfg(feature = "logging")]
use tracing::{info, warn};

/// In-memory copy of the lines written by a [`LoggingHandler`].
///
/// Clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct LogBuffer {
    lines: Arc<Mutex<Vec<String>>>,
}

impl LogBuffer {
    /// Create an empty buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every line written so far, oldest first
    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of lines written
    pub fn len(&self) -> usize {
        self.lines.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Check if nothing was written
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Forget every line
    pub fn clear(&self) {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    fn push(&self, line: String) {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(line);
    }
}

/// Logs every intercepted call.
///
/// Before the call: `"<op>, args=<args>"`. After it, either
/// `"<op> succeeded, result=<result>"` or `"<op> failed: <cause>"`.
/// Lines go to `tracing` under the `graph_injector` target (failures at
/// `WARN`, everything else at `INFO`) and, for a capturing handler, into a
/// [`LogBuffer`].
///
/// # Examples
///
/// ```rust
/// use graph_injector::{Arguments, HandlerChain, InterceptError, LoggingHandler};
///
/// let (logging, log) = LoggingHandler::capturing();
/// let chain = HandlerChain::builder().with(logging).build();
///
/// let sum: Result<i32, InterceptError> = chain.around("add", Arguments::new(&[&5, &3]), || Ok(8));
///
/// assert_eq!(sum.unwrap(), 8);
/// assert_eq!(log.lines(), ["add, args=[5, 3]", "add succeeded, result=8"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct LoggingHandler {
    buffer: Option<LogBuffer>,
}

impl LoggingHandler {
    /// Log through `tracing` only
    pub fn new() -> Self {
        Self::default()
    }

    /// Log through `tracing` and keep a copy of every line
    pub fn capturing() -> (Self, LogBuffer) {
        let buffer = LogBuffer::new();
        (
            Self {
                buffer: Some(buffer.clone()),
            },
            buffer,
        )
    }

    /// Write into an existing buffer, e.g. one shared by several handlers
    pub fn with_buffer(buffer: LogBuffer) -> Self {
        Self {
            buffer: Some(buffer),
        }
    }

    fn record(&self, line: String) {
        if let Some(buffer) = &self.buffer {
            buffer.push(line);
        }
    }
}

impl CallHandler for LoggingHandler {
    fn name(&self) -> &'static str {
        "logging"
    }

    fn before(&self, call: &Invocation<'_>) -> Result<(), BoxError> {
        let line = format!("{}, args={}", call.operation(), call.args());

        #[cfg(feature = "logging")]
        info!(target: "graph_injector", operation = call.operation(), "{}", line);

        self.record(line);
        Ok(())
    }

    fn after(&self, record: &InvocationRecord<'_>) {
        match record.outcome() {
            Outcome::Returned(value) => {
                let line = format!("{} succeeded, result={:?}", record.operation(), value);

                #[cfg(feature = "logging")]
                info!(target: "graph_injector", operation = record.operation(), "{}", line);

                self.record(line);
            }
            Outcome::Raised(error) => {
                let line = format!("{} failed: {}", record.operation(), error);

                #[cfg(feature = "logging")]
                warn!(target: "graph_injector", operation = record.operation(), "{}", line);

                self.record(line);
            }
        }
    }
}

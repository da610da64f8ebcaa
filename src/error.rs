//! Error types for resolution and interception

use std::error::Error as StdError;
use std::sync::Arc;
use thiserror::Error;

/// Boxed error returned by constructors and call handlers.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Shared error cause, kept behind an `Arc` so errors stay `Clone`.
pub type SharedError = Arc<dyn StdError + Send + Sync + 'static>;

/// Errors that can occur while describing or resolving a type
#[derive(Error, Debug, Clone)]
pub enum DiError {
    /// Type has no usable construction path, or cannot be described at all
    #[error("Cannot describe {type_name}: {reason}")]
    Descriptor {
        type_name: &'static str,
        reason: String,
    },

    /// The construction path ran and failed
    #[error("Failed to instantiate {type_name}: {source}")]
    Instantiation {
        type_name: &'static str,
        #[source]
        source: SharedError,
    },

    /// A type depends on itself, directly or transitively
    #[error("Cyclic dependency detected: {}", .cycle.join(" -> "))]
    CyclicDependency { cycle: Vec<&'static str> },

    /// A resolved dependency could not be stored in its slot
    #[error("Failed to inject {owner}.{slot}: {source}")]
    Injection {
        owner: &'static str,
        slot: &'static str,
        #[source]
        source: SlotError,
    },
}

impl DiError {
    /// Create a Descriptor error
    #[inline]
    pub fn descriptor(type_name: &'static str, reason: impl Into<String>) -> Self {
        Self::Descriptor {
            type_name,
            reason: reason.into(),
        }
    }

    /// Create an Instantiation error carrying the original cause
    #[inline]
    pub fn instantiation(type_name: &'static str, source: impl Into<BoxError>) -> Self {
        Self::Instantiation {
            type_name,
            source: Arc::from(source.into()),
        }
    }

    /// Create a CyclicDependency error from the offending path
    #[inline]
    pub fn cyclic(cycle: Vec<&'static str>) -> Self {
        Self::CyclicDependency { cycle }
    }

    /// Create an Injection error for a slot
    #[inline]
    pub fn injection(owner: &'static str, slot: &'static str, source: SlotError) -> Self {
        Self::Injection {
            owner,
            slot,
            source,
        }
    }

    /// Whether this error reports a dependency cycle
    #[inline]
    pub fn is_cyclic(&self) -> bool {
        matches!(self, Self::CyclicDependency { .. })
    }
}

/// Why a dependency could not be assigned into a slot
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SlotError {
    /// The slot was already filled
    #[error("slot is already filled")]
    AlreadyFilled,

    /// The instance handed to the slot accessor is not of the owning type
    #[error("owner is not a {expected}")]
    OwnerMismatch { expected: &'static str },

    /// The resolved dependency is not of the slot's declared type
    #[error("dependency is not a {expected}")]
    DependencyMismatch { expected: &'static str },
}

/// Errors raised by the interception layer itself.
///
/// Errors returned by the intercepted target never pass through this type;
/// they reach the caller untouched.
#[derive(Error, Debug)]
pub enum InterceptError {
    /// A before-hook refused the call; `source` is the hook's own error
    #[error("Call handler '{handler}' rejected the call: {source}")]
    Hook {
        handler: &'static str,
        #[source]
        source: BoxError,
    },

    /// The operation is not part of the proxy's interface
    #[error("Operation '{operation}' is not part of interface {interface}")]
    UnknownOperation {
        interface: &'static str,
        operation: &'static str,
    },
}

/// Result type alias for resolution operations
pub type Result<T> = std::result::Result<T, DiError>;

//! # graph-injector - Field-Injection Object Graphs and Call Interception
//!
//! Builds object graphs from per-type descriptors and wraps trait objects in
//! proxies that run a chain of handlers around every call.
//!
//! ## Features
//!
//! - 🧩 **Field injection** - Marked `Slot<T>` fields are filled after construction
//! - 🔁 **Cycle detection** - `A -> B -> A` is reported, never recursed into
//! - 🔒 **Descriptor cache** - `DashMap`-backed, each type described at most once
//! - 🪞 **Interface proxies** - `Proxy<dyn Trait>` implements `Trait` itself
//! - 🪝 **Handler chains** - Before/after hooks that observe, never transform
//! - 📊 **Observable** - Optional tracing integration with JSON or pretty output
//!
//! ## Quick Start
//!
//! ```rust
//! use graph_injector::{Injectable, Resolver, Slot, TypeDescriptor};
//!
//! #[derive(Default)]
//! struct Service;
//!
//! impl Service {
//!     fn do_work(&self) -> &'static str {
//!         "working"
//!     }
//! }
//!
//! impl Injectable for Service {
//!     fn descriptor() -> TypeDescriptor {
//!         TypeDescriptor::builder::<Self>().default_constructor().build()
//!     }
//! }
//!
//! #[derive(Default)]
//! struct Client {
//!     service: Slot<Service>,
//! }
//!
//! impl Injectable for Client {
//!     fn descriptor() -> TypeDescriptor {
//!         TypeDescriptor::builder::<Self>()
//!             .default_constructor()
//!             .inject::<Service>("service", |client: &Client| &client.service)
//!             .build()
//!     }
//! }
//!
//! let resolver = Resolver::new();
//! let client = resolver.resolve::<Client>().unwrap();
//!
//! // Slots deref to the injected dependency
//! assert_eq!(client.service.do_work(), "working");
//! ```
//!
//! With the `derive` feature the same types are written as:
//!
//! ```rust,ignore
//! #[derive(Default, Inject)]
//! struct Client {
//!     #[inject]
//!     service: Slot<Service>,
//! }
//! ```
//!
//! ## Cycles
//!
//! ```rust
//! use graph_injector::{DiError, Injectable, Resolver, Slot, TypeDescriptor};
//!
//! #[derive(Debug, Default)]
//! struct Ping {
//!     pong: Slot<Pong>,
//! }
//!
//! #[derive(Debug, Default)]
//! struct Pong {
//!     ping: Slot<Ping>,
//! }
//!
//! impl Injectable for Ping {
//!     fn descriptor() -> TypeDescriptor {
//!         TypeDescriptor::builder::<Self>()
//!             .default_constructor()
//!             .inject::<Pong>("pong", |p: &Ping| &p.pong)
//!             .build()
//!     }
//! }
//!
//! impl Injectable for Pong {
//!     fn descriptor() -> TypeDescriptor {
//!         TypeDescriptor::builder::<Self>()
//!             .default_constructor()
//!             .inject::<Ping>("ping", |p: &Pong| &p.ping)
//!             .build()
//!     }
//! }
//!
//! let err = Resolver::new().resolve::<Ping>().unwrap_err();
//! assert!(matches!(err, DiError::CyclicDependency { .. }));
//! ```
//!
//! ## Interception
//!
//! A proxy for `dyn Trait` needs `impl Interface for dyn Trait` and
//! `impl Trait for Proxy<dyn Trait>`; `#[interface]` writes both. Every call
//! made through the proxy runs the dispatcher's [`HandlerChain`]:
//!
//! ```rust,ignore
//! #[graph_injector::interface]
//! trait Calculator: Send + Sync {
//!     fn divide(&self, a: i32, b: i32) -> Result<f64, CalcError>;
//! }
//!
//! let proxy = Dispatcher::logging().create_proxy::<dyn Calculator>(Arc::new(SimpleCalculator));
//! proxy.divide(10, 0)?; // logs "divide, args=[10, 0]" then "divide failed: ..."
//! ```
//!
//! ## Errors
//!
//! Every failure is returned as a structured error. Resolution fails with
//! [`DiError`]; a proxy call fails with the target's own error, or with an
//! [`InterceptError`] converted into it when the interception layer itself
//! refuses the call.

// Lets the derive macros name `::graph_injector` from inside this crate
extern crate self as graph_injector;

mod chain;
mod descriptor;
mod error;
mod handlers;
#[cfg(feature = "logging")]
pub mod logging;
mod provider;
mod proxy;
mod registry;
mod resolver;
mod slot;

pub use chain::*;
pub use descriptor::*;
pub use error::*;
pub use handlers::*;
pub use provider::*;
pub use proxy::*;
pub use registry::*;
pub use resolver::*;
pub use slot::*;

#[cfg(feature = "derive")]
pub use graph_injector_derive::{Inject, interface};

// Re-export tracing macros for convenience when logging feature is enabled
#[cfg(feature = "logging")]
pub use tracing::{debug, error, info, trace, warn};

// Re-export for convenience
pub use std::sync::Arc;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        Arguments, CallHandler, DiError, Dispatcher, HandlerChain, Injectable, InterceptError,
        Interface, LoggingHandler, Proxy, Resolver, Result, Slot, TypeDescriptor,
    };
    #[cfg(feature = "derive")]
    pub use crate::{Inject, interface};
    pub use std::sync::Arc;
}

//! Dependency resolver
//!
//! The `Resolver` builds object graphs from type descriptors: it constructs
//! a bare instance, then recursively resolves and assigns every marked
//! injection point, depth-first and in declaration order.

use crate::descriptor::AnyInstance;
use crate::{DiError, Injectable, InjectionPoint, Registry, Result, TypeDescriptor, TypeKey};
use std::any::Any;
use std::sync::Arc;

#[cfg(feature = "logging")]
use tracing::{debug, trace};

/// State owned by a single resolve call.
///
/// `visiting` is the chain of types currently being wired, root first. It
/// is threaded through the recursion explicitly, so concurrent resolve calls
/// never share cycle-tracking state.
struct ResolutionPass {
    visiting: Vec<TypeKey>,
    constructed: usize,
}

impl ResolutionPass {
    #[inline]
    fn new() -> Self {
        Self {
            visiting: Vec::new(),
            constructed: 0,
        }
    }

    /// If `target` is already being wired, the names forming the cycle
    fn cycle_to(&self, target: &TypeKey) -> Option<Vec<&'static str>> {
        let start = self.visiting.iter().position(|key| key == target)?;
        let mut cycle: Vec<_> = self.visiting[start..].iter().map(TypeKey::name).collect();
        cycle.push(target.name());
        Some(cycle)
    }
}

/// Recursive, field-injecting object graph resolver.
///
/// Cloning is cheap and clones share the descriptor cache.
///
/// # Examples
///
/// ```rust
/// use graph_injector::{Injectable, Resolver, Slot, TypeDescriptor};
///
/// #[derive(Default)]
/// struct Service;
///
/// impl Injectable for Service {
///     fn descriptor() -> TypeDescriptor {
///         TypeDescriptor::builder::<Self>().default_constructor().build()
///     }
/// }
///
/// #[derive(Default)]
/// struct Client {
///     service: Slot<Service>,
/// }
///
/// impl Injectable for Client {
///     fn descriptor() -> TypeDescriptor {
///         TypeDescriptor::builder::<Self>()
///             .default_constructor()
///             .inject::<Service>("service", |c: &Client| &c.service)
///             .build()
///     }
/// }
///
/// let resolver = Resolver::new();
/// let client = resolver.resolve::<Client>().unwrap();
/// assert!(client.service.is_filled());
/// ```
#[derive(Clone)]
pub struct Resolver {
    registry: Arc<Registry>,
}

impl Resolver {
    /// Create a resolver with its own descriptor cache.
    #[inline]
    pub fn new() -> Self {
        #[cfg(feature = "logging")]
        debug!(target: "graph_injector", "Creating resolver");

        Self {
            registry: Arc::new(Registry::new()),
        }
    }

    /// Create a resolver over a shared descriptor cache.
    #[inline]
    pub fn with_registry(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    /// The descriptor cache this resolver reads from.
    #[inline]
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Register a descriptor for a type (see [`Registry::register`]).
    #[inline]
    pub fn register(&self, descriptor: TypeDescriptor) {
        self.registry.register(descriptor);
    }

    // =========================================================================
    // Resolution Methods
    // =========================================================================

    /// Build a fully wired `T`.
    ///
    /// Every marked slot of `T`, and transitively of each dependency, holds
    /// a freshly constructed instance. Resolution is all-or-nothing: on
    /// error every partially built instance is dropped.
    ///
    /// # Errors
    ///
    /// - [`DiError::Descriptor`] if a type in the graph cannot be described
    /// - [`DiError::Instantiation`] if a constructor fails
    /// - [`DiError::CyclicDependency`] if a type depends on itself
    /// - [`DiError::Injection`] if a dependency cannot be stored in its slot
    pub fn resolve<T: Injectable>(&self) -> Result<T> {
        let key = TypeKey::of::<T>();
        let instance = self.resolve_key(&key)?;

        instance
            .downcast::<T>()
            .map(|boxed| *boxed)
            .map_err(|_| DiError::instantiation(key.name(), "constructor produced a different type"))
    }

    /// Build a fully wired instance of the type behind `key`, type-erased.
    pub fn resolve_key(&self, key: &TypeKey) -> Result<AnyInstance> {
        #[cfg(feature = "logging")]
        debug!(
            target: "graph_injector",
            service = key.name(),
            "Resolving object graph"
        );

        let mut pass = ResolutionPass::new();
        let result = self.resolve_in(key, &mut pass);

        #[cfg(feature = "logging")]
        match &result {
            Ok(_) => debug!(
                target: "graph_injector",
                service = key.name(),
                constructed = pass.constructed,
                "Object graph resolved"
            ),
            Err(error) => debug!(
                target: "graph_injector",
                service = key.name(),
                constructed = pass.constructed,
                error = %error,
                "Object graph resolution failed"
            ),
        }

        result
    }

    /// Wire the marked, still-empty slots of an instance the caller built.
    ///
    /// Each dependency is resolved with the same rules as [`resolve`]; the
    /// instance's own type counts as in progress, so a dependency that needs
    /// `T` again is reported as a cycle. Slots that are already filled are
    /// left alone. `T` itself needs no constructor.
    ///
    /// All dependencies are resolved before any slot is assigned, so on
    /// error the instance is left as it was.
    ///
    /// [`resolve`]: Resolver::resolve
    pub fn inject_into<T: Injectable>(&self, instance: &T) -> Result<()> {
        let key = TypeKey::of::<T>();
        let descriptor = self.registry.lookup(&key)?;

        #[cfg(feature = "logging")]
        debug!(
            target: "graph_injector",
            service = key.name(),
            "Injecting dependencies into existing instance"
        );

        let mut pass = ResolutionPass::new();
        pass.visiting.push(key);

        let mut resolved = Vec::new();
        for point in descriptor.marked_points() {
            if point.is_filled_in(instance) {
                #[cfg(feature = "logging")]
                trace!(
                    target: "graph_injector",
                    service = descriptor.type_name(),
                    slot = point.name(),
                    "Slot already filled, keeping existing dependency"
                );
                continue;
            }
            resolved.push((point, self.resolve_point(&descriptor, point, &mut pass)?));
        }

        for (point, dependency) in resolved {
            Self::assign(&descriptor, point, instance, dependency)?;
        }
        Ok(())
    }

    /// Resolve `key` within an ongoing pass (internal)
    fn resolve_in(&self, key: &TypeKey, pass: &mut ResolutionPass) -> Result<AnyInstance> {
        let descriptor = self.registry.describe(key)?;
        let instance = descriptor.construct()?;
        pass.constructed += 1;

        #[cfg(feature = "logging")]
        trace!(
            target: "graph_injector",
            service = key.name(),
            depth = pass.visiting.len(),
            "Constructed instance, wiring injection points"
        );

        pass.visiting.push(*key);
        let wired = self.wire(&descriptor, &*instance, pass);
        pass.visiting.pop();

        wired.map(|()| instance)
    }

    /// Resolve and assign each marked injection point of a fresh instance
    fn wire(
        &self,
        descriptor: &TypeDescriptor,
        instance: &dyn Any,
        pass: &mut ResolutionPass,
    ) -> Result<()> {
        for point in descriptor.marked_points() {
            let dependency = self.resolve_point(descriptor, point, pass)?;
            Self::assign(descriptor, point, instance, dependency)?;
        }
        Ok(())
    }

    /// Build the dependency for one injection point, refusing cycles
    #[cfg_attr(not(feature = "logging"), allow(unused_variables))]
    fn resolve_point(
        &self,
        descriptor: &TypeDescriptor,
        point: &InjectionPoint,
        pass: &mut ResolutionPass,
    ) -> Result<Arc<dyn Any + Send + Sync>> {
        if let Some(cycle) = pass.cycle_to(point.target()) {
            #[cfg(feature = "logging")]
            debug!(
                target: "graph_injector",
                service = descriptor.type_name(),
                slot = point.name(),
                "Dependency cycle detected"
            );
            return Err(DiError::cyclic(cycle));
        }

        self.resolve_in(point.target(), pass).map(Arc::from)
    }

    fn assign(
        descriptor: &TypeDescriptor,
        point: &InjectionPoint,
        instance: &dyn Any,
        dependency: Arc<dyn Any + Send + Sync>,
    ) -> Result<()> {
        point
            .assign(instance, dependency)
            .map_err(|reason| DiError::injection(descriptor.type_name(), point.name(), reason))?;

        #[cfg(feature = "logging")]
        trace!(
            target: "graph_injector",
            service = descriptor.type_name(),
            slot = point.name(),
            dependency = point.target().name(),
            "Injected dependency"
        );

        Ok(())
    }
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Resolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolver")
            .field("described_types", &self.registry.len())
            .finish()
    }
}

//! Descriptor registry
//!
//! Uses DashMap for lock-free concurrent reads. First-time derivation goes
//! through the map's entry API, so each type is described at most once even
//! when many threads ask for it at the same moment.

use crate::{DiError, Injectable, Result, TypeDescriptor, TypeKey};
use ahash::RandomState;
use dashmap::DashMap;
use std::any::TypeId;
use std::sync::Arc;

#[cfg(feature = "logging")]
use tracing::{debug, trace};

/// Thread-safe cache of type descriptors
///
/// Uses `DashMap` with `ahash`, keyed by `TypeId`.
pub struct Registry {
    /// Map from TypeId to its descriptor
    descriptors: DashMap<TypeId, Arc<TypeDescriptor>, RandomState>,
}

impl Registry {
    /// Create a new empty registry with optimized shard count.
    ///
    /// Uses 8 shards: typical object graphs describe a few dozen types, and
    /// the default of `num_cpus * 4` shards costs more to create than it
    /// saves on contention.
    #[inline]
    pub fn new() -> Self {
        Self {
            descriptors: DashMap::with_capacity_and_hasher_and_shard_amount(
                0,
                RandomState::new(),
                8,
            ),
        }
    }

    /// Create with pre-allocated capacity and optimized shards.
    #[inline]
    pub fn with_capacity(capacity: usize) -> Self {
        let shard_amount = if capacity <= 16 {
            8
        } else if capacity <= 64 {
            16
        } else {
            32
        };
        Self {
            descriptors: DashMap::with_capacity_and_hasher_and_shard_amount(
                capacity,
                RandomState::new(),
                shard_amount,
            ),
        }
    }

    /// Register a descriptor explicitly, replacing any cached one.
    ///
    /// This is how types without their own [`Injectable`] impl become
    /// resolvable, and how a derived descriptor can be overridden.
    #[inline]
    pub fn register(&self, descriptor: TypeDescriptor) {
        #[cfg(feature = "logging")]
        debug!(
            target: "graph_injector",
            service = descriptor.type_name(),
            injection_points = descriptor.injection_points().len(),
            "Registering type descriptor"
        );

        self.descriptors
            .insert(descriptor.key().id(), Arc::new(descriptor));
    }

    /// Describe the type behind `key`.
    ///
    /// Returns the cached descriptor, deriving it on first access when the
    /// key knows how. Fails with [`DiError::Descriptor`] if the type cannot
    /// be described or has no usable zero-argument constructor.
    pub fn describe(&self, key: &TypeKey) -> Result<Arc<TypeDescriptor>> {
        let descriptor = self.lookup(key)?;

        if !descriptor.is_default_constructible() {
            #[cfg(feature = "logging")]
            trace!(
                target: "graph_injector",
                service = key.name(),
                "Type has no usable constructor"
            );
            return Err(DiError::descriptor(
                key.name(),
                "no usable zero-argument constructor",
            ));
        }

        Ok(descriptor)
    }

    /// Cached or freshly derived descriptor, constructible or not
    pub(crate) fn lookup(&self, key: &TypeKey) -> Result<Arc<TypeDescriptor>> {
        // Read path: the shard guard is released at the end of this statement
        let cached = self
            .descriptors
            .get(&key.id())
            .map(|entry| Arc::clone(entry.value()));

        if let Some(descriptor) = cached {
            return Ok(descriptor);
        }

        let derive = key.deriver().ok_or_else(|| {
            DiError::descriptor(key.name(), "no descriptor registered for this type")
        })?;

        let entry = self.descriptors.entry(key.id()).or_insert_with(|| {
            #[cfg(feature = "logging")]
            debug!(
                target: "graph_injector",
                service = key.name(),
                "Deriving type descriptor on first access"
            );

            Arc::new(derive())
        });
        Ok(Arc::clone(entry.value()))
    }

    /// Describe an injectable type
    #[inline]
    pub fn describe_type<T: Injectable>(&self) -> Result<Arc<TypeDescriptor>> {
        self.describe(&TypeKey::of::<T>())
    }

    /// Check if a descriptor is cached for the key
    #[inline]
    pub fn contains(&self, key: &TypeKey) -> bool {
        self.descriptors.contains_key(&key.id())
    }

    /// Get number of cached descriptors
    #[inline]
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Check if empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Drop every cached descriptor
    #[inline]
    pub fn clear(&self) {
        self.descriptors.clear();
    }

    /// Names of all described types
    pub fn type_names(&self) -> Vec<&'static str> {
        self.descriptors.iter().map(|r| r.value().type_name()).collect()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("count", &self.len())
            .finish()
    }
}

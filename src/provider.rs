//! Provider traits for dependency injection
//!
//! These traits define what types can be resolved and how they are
//! identified while a graph is being built.

use crate::TypeDescriptor;
use std::any::{Any, TypeId};
use std::hash::{Hash, Hasher};

/// A type the resolver can construct and wire.
///
/// Implementations supply the type's [`TypeDescriptor`]: how to build a bare
/// instance and which slots to fill afterwards. Usually generated with
/// `#[derive(Inject)]`, but writing it by hand with
/// [`TypeDescriptor::builder`] works the same way.
///
/// # Examples
///
/// ```rust
/// use graph_injector::{Injectable, Resolver, Slot, TypeDescriptor};
///
/// #[derive(Default)]
/// struct Engine;
///
/// impl Injectable for Engine {
///     fn descriptor() -> TypeDescriptor {
///         TypeDescriptor::builder::<Self>().default_constructor().build()
///     }
/// }
///
/// #[derive(Default)]
/// struct Car {
///     engine: Slot<Engine>,
/// }
///
/// impl Injectable for Car {
///     fn descriptor() -> TypeDescriptor {
///         TypeDescriptor::builder::<Self>()
///             .default_constructor()
///             .inject::<Engine>("engine", |car: &Car| &car.engine)
///             .build()
///     }
/// }
///
/// let car = Resolver::new().resolve::<Car>().unwrap();
/// assert!(car.engine.is_filled());
/// ```
pub trait Injectable: Any + Send + Sync {
    /// Derive the descriptor for this type.
    ///
    /// Must be deterministic: the registry calls it at most once per type
    /// and caches the result.
    fn descriptor() -> TypeDescriptor
    where
        Self: Sized;
}

/// Function that derives a descriptor on demand
pub type DeriveFn = fn() -> TypeDescriptor;

/// Identifies a type during description and resolution.
///
/// Equality and hashing only look at the [`TypeId`]; the name is kept for
/// error messages and the deriver lets the registry describe the type the
/// first time it is seen.
#[derive(Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
    derive: Option<DeriveFn>,
}

impl TypeKey {
    /// Key for an injectable type, able to derive its own descriptor
    #[inline]
    pub fn of<T: Injectable>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
            derive: Some(T::descriptor),
        }
    }

    /// Key for a type without a descriptor of its own.
    ///
    /// Such a type can only be resolved once a descriptor has been
    /// registered for it explicitly.
    #[inline]
    pub fn opaque<T: Any>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
            derive: None,
        }
    }

    /// The underlying TypeId
    #[inline]
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Human-readable type name
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The descriptor deriver, if this key carries one
    #[inline]
    pub fn deriver(&self) -> Option<DeriveFn> {
        self.derive
    }
}

impl PartialEq for TypeKey {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl std::fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeKey")
            .field("name", &self.name)
            .field("derivable", &self.derive.is_some())
            .finish()
    }
}

impl std::fmt::Display for TypeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Leaf;

    impl Injectable for Leaf {
        fn descriptor() -> TypeDescriptor {
            TypeDescriptor::builder::<Self>().default_constructor().build()
        }
    }

    #[test]
    fn test_keys_compare_by_type_id() {
        let derivable = TypeKey::of::<Leaf>();
        let opaque = TypeKey::opaque::<Leaf>();

        assert_eq!(derivable, opaque);
        assert!(derivable.deriver().is_some());
        assert!(opaque.deriver().is_none());
        assert_ne!(derivable, TypeKey::opaque::<u32>());
    }

    #[test]
    fn test_key_names() {
        assert_eq!(TypeKey::of::<Leaf>().name(), std::any::type_name::<Leaf>());
        assert!(TypeKey::of::<Leaf>().to_string().ends_with("Leaf"));
    }
}

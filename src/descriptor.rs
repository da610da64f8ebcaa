//! Type descriptors: how to build a bare instance and which slots to wire
//!
//! A [`TypeDescriptor`] is the metadata the resolver works from. It carries a
//! type-erased construction path and the ordered list of
//! [`InjectionPoint`]s, each with a type-erased assignment function. Once
//! built, a descriptor cannot be changed.

use crate::{BoxError, DiError, Injectable, Result, Slot, SlotError, TypeKey};
use std::any::{Any, type_name};
use std::marker::PhantomData;
use std::sync::Arc;

#[cfg(feature = "logging")]
use tracing::trace;

/// A constructed instance with its concrete type erased
pub type AnyInstance = Box<dyn Any + Send + Sync>;

/// Type-erased fallible constructor
type FallibleFn = Arc<dyn Fn() -> std::result::Result<AnyInstance, BoxError> + Send + Sync>;

/// Type-erased slot assignment: (owner, dependency) -> ()
type AssignFn =
    Arc<dyn Fn(&dyn Any, Arc<dyn Any + Send + Sync>) -> std::result::Result<(), SlotError> + Send + Sync>;

/// Type-erased slot probe: does `owner` already hold this dependency?
type ProbeFn = Arc<dyn Fn(&dyn Any) -> bool + Send + Sync>;

/// How a bare instance is produced.
///
/// An enum rather than a boxed trait object: the common `Default` case is a
/// plain function pointer.
pub(crate) enum Construction {
    /// Infallible zero-argument construction via `Default`
    Default(fn() -> AnyInstance),
    /// Zero-argument constructor that may fail
    Fallible(FallibleFn),
    /// No usable constructor
    Unavailable,
}

/// One slot on a type that must be filled with another type's instance.
pub struct InjectionPoint {
    name: &'static str,
    target: TypeKey,
    marked: bool,
    assign: AssignFn,
    probe: ProbeFn,
}

impl InjectionPoint {
    /// Slot (field) name
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The type the slot expects
    #[inline]
    pub fn target(&self) -> &TypeKey {
        &self.target
    }

    /// Whether the slot carries the injection marker.
    ///
    /// Unmarked slots are described but never filled by the resolver.
    #[inline]
    pub fn is_marked(&self) -> bool {
        self.marked
    }

    /// Store `dependency` into this slot of `owner`
    #[inline]
    pub(crate) fn assign(
        &self,
        owner: &dyn Any,
        dependency: Arc<dyn Any + Send + Sync>,
    ) -> std::result::Result<(), SlotError> {
        (self.assign)(owner, dependency)
    }

    /// Whether this slot of `owner` is already filled
    #[inline]
    pub(crate) fn is_filled_in(&self, owner: &dyn Any) -> bool {
        (self.probe)(owner)
    }
}

impl std::fmt::Debug for InjectionPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InjectionPoint")
            .field("name", &self.name)
            .field("target", &self.target.name())
            .field("marked", &self.marked)
            .finish()
    }
}

/// The constructible shape of a type.
///
/// # Examples
///
/// ```rust
/// use graph_injector::{Slot, TypeDescriptor};
///
/// #[derive(Default)]
/// struct Repo;
///
/// #[derive(Default)]
/// struct Handler {
///     repo: Slot<Repo>,
/// }
///
/// let descriptor = TypeDescriptor::builder::<Handler>()
///     .default_constructor()
///     .inject_registered::<Repo>("repo", |h: &Handler| &h.repo)
///     .build();
///
/// assert!(descriptor.is_default_constructible());
/// assert_eq!(descriptor.injection_points()[0].name(), "repo");
/// ```
pub struct TypeDescriptor {
    key: TypeKey,
    construction: Construction,
    points: Vec<InjectionPoint>,
}

impl TypeDescriptor {
    /// Start describing `T`
    #[inline]
    pub fn builder<T: Any + Send + Sync>() -> DescriptorBuilder<T> {
        DescriptorBuilder {
            construction: Construction::Unavailable,
            points: Vec::new(),
            _marker: PhantomData,
        }
    }

    /// Key of the described type
    #[inline]
    pub fn key(&self) -> &TypeKey {
        &self.key
    }

    /// Name of the described type
    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.key.name()
    }

    /// Whether a zero-argument construction path exists
    #[inline]
    pub fn is_default_constructible(&self) -> bool {
        !matches!(self.construction, Construction::Unavailable)
    }

    /// All injection points in declaration order, marked or not
    #[inline]
    pub fn injection_points(&self) -> &[InjectionPoint] {
        &self.points
    }

    /// The injection points the resolver fills, in declaration order
    #[inline]
    pub fn marked_points(&self) -> impl Iterator<Item = &InjectionPoint> {
        self.points.iter().filter(|point| point.is_marked())
    }

    /// Build a bare instance with every slot empty
    pub(crate) fn construct(&self) -> Result<AnyInstance> {
        #[cfg(feature = "logging")]
        trace!(
            target: "graph_injector",
            service = self.type_name(),
            "Constructing bare instance"
        );

        match &self.construction {
            Construction::Default(make) => Ok(make()),
            Construction::Fallible(make) => {
                make().map_err(|source| DiError::instantiation(self.type_name(), source))
            }
            Construction::Unavailable => Err(DiError::instantiation(
                self.type_name(),
                "no usable zero-argument constructor",
            )),
        }
    }
}

impl std::fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("type_name", &self.type_name())
            .field("default_constructible", &self.is_default_constructible())
            .field("injection_points", &self.points)
            .finish()
    }
}

/// Fluent builder for a [`TypeDescriptor`].
///
/// Injection points are recorded in the order they are added, which is the
/// order the resolver fills them in.
pub struct DescriptorBuilder<T> {
    construction: Construction,
    points: Vec<InjectionPoint>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Any + Send + Sync> DescriptorBuilder<T> {
    /// Construct bare instances with `T::default()`
    #[inline]
    pub fn default_constructor(mut self) -> Self
    where
        T: Default,
    {
        self.construction = Construction::Default(|| Box::new(T::default()) as AnyInstance);
        self
    }

    /// Construct bare instances with a function that may fail.
    ///
    /// A returned error surfaces as [`DiError::Instantiation`] with the
    /// error attached as its source.
    #[inline]
    pub fn constructor<F, E>(mut self, make: F) -> Self
    where
        F: Fn() -> std::result::Result<T, E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        self.construction = Construction::Fallible(Arc::new(move || -> std::result::Result<AnyInstance, BoxError> {
            make()
                .map(|instance| Box::new(instance) as AnyInstance)
                .map_err(Into::into)
        }));
        self
    }

    /// Add a marked slot whose type describes itself
    #[inline]
    pub fn inject<D: Injectable>(self, name: &'static str, accessor: fn(&T) -> &Slot<D>) -> Self {
        self.point(name, TypeKey::of::<D>(), true, accessor)
    }

    /// Add a marked slot whose type must have a registered descriptor
    #[inline]
    pub fn inject_registered<D: Any + Send + Sync>(
        self,
        name: &'static str,
        accessor: fn(&T) -> &Slot<D>,
    ) -> Self {
        self.point(name, TypeKey::opaque::<D>(), true, accessor)
    }

    /// Add an unmarked slot; it is described but left for the caller to fill
    #[inline]
    pub fn slot<D: Any + Send + Sync>(self, name: &'static str, accessor: fn(&T) -> &Slot<D>) -> Self {
        self.point(name, TypeKey::opaque::<D>(), false, accessor)
    }

    fn point<D: Any + Send + Sync>(
        mut self,
        name: &'static str,
        target: TypeKey,
        marked: bool,
        accessor: fn(&T) -> &Slot<D>,
    ) -> Self {
        let assign: AssignFn = Arc::new(move |owner: &dyn Any, dependency: Arc<dyn Any + Send + Sync>| {
            let owner = owner.downcast_ref::<T>().ok_or(SlotError::OwnerMismatch {
                expected: type_name::<T>(),
            })?;
            let dependency = dependency
                .downcast::<D>()
                .map_err(|_| SlotError::DependencyMismatch {
                    expected: type_name::<D>(),
                })?;
            accessor(owner).fill(dependency)
        });
        let probe: ProbeFn = Arc::new(move |owner: &dyn Any| {
            owner
                .downcast_ref::<T>()
                .is_some_and(|owner| accessor(owner).is_filled())
        });

        self.points.push(InjectionPoint {
            name,
            target,
            marked,
            assign,
            probe,
        });
        self
    }

    /// Finish the descriptor
    #[inline]
    pub fn build(self) -> TypeDescriptor {
        TypeDescriptor {
            key: TypeKey::opaque::<T>(),
            construction: self.construction,
            points: self.points,
        }
    }
}

//! Write-once injection slots

use crate::SlotError;
use once_cell::sync::OnceCell;
use std::ops::Deref;
use std::sync::Arc;

/// A field that receives a dependency after its owner has been constructed.
///
/// A freshly constructed instance has every slot empty; the resolver fills
/// each marked slot exactly once. Slots are shared-reference writable, so
/// wiring works through `&self` and does not need access to the field
/// itself beyond the accessor registered in the descriptor.
///
/// # Examples
///
/// ```rust
/// use graph_injector::Slot;
/// use std::sync::Arc;
///
/// let slot: Slot<String> = Slot::empty();
/// assert!(!slot.is_filled());
///
/// slot.fill(Arc::new("ready".to_string())).unwrap();
/// assert_eq!(slot.len(), 5); // derefs to the String
/// assert!(slot.fill(Arc::new("again".to_string())).is_err());
/// ```
pub struct Slot<T> {
    cell: OnceCell<Arc<T>>,
}

impl<T> Slot<T> {
    /// Create an empty slot.
    #[inline]
    pub const fn empty() -> Self {
        Self {
            cell: OnceCell::new(),
        }
    }

    /// Create a slot that is already filled.
    #[inline]
    pub fn filled(value: Arc<T>) -> Self {
        Self {
            cell: OnceCell::with_value(value),
        }
    }

    /// Store the dependency. Fails if the slot was filled before.
    #[inline]
    pub fn fill(&self, value: Arc<T>) -> Result<(), SlotError> {
        self.cell.set(value).map_err(|_| SlotError::AlreadyFilled)
    }

    /// Borrow the dependency, if present.
    #[inline]
    pub fn get(&self) -> Option<&T> {
        self.cell.get().map(|value| value.as_ref())
    }

    /// Clone the shared handle to the dependency, if present.
    #[inline]
    pub fn shared(&self) -> Option<Arc<T>> {
        self.cell.get().cloned()
    }

    /// Check whether the slot has been filled.
    #[inline]
    pub fn is_filled(&self) -> bool {
        self.cell.get().is_some()
    }
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Self::empty()
    }
}

/// # Panics
///
/// Dereferencing an empty slot panics. Instances returned by the resolver
/// have every marked slot filled.
impl<T> Deref for Slot<T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        match self.cell.get() {
            Some(value) => value,
            None => panic!(
                "Slot<{}> read before injection",
                std::any::type_name::<T>()
            ),
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Slot<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.cell.get() {
            Some(value) => f.debug_tuple("Slot").field(value).finish(),
            None => f.write_str("Slot(<empty>)"),
        }
    }
}

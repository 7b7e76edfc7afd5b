use core::{fmt::Debug, hash::Hash};
use std::sync::{Arc, Weak};

/// Converts a [`Dependent`] to a type-erased [`AnyDependent`].
pub trait ToAnyDependent {
    /// Converts this type to its type-erased equivalent.
    fn to_any_dependent(&self) -> AnyDependent;
}

/// Anything that can be notified when one of its sources changes.
pub trait Dependent {
    /// Notifies the dependent that a source it is registered with has changed.
    fn refresh(&self);

    /// Whether this dependent has dependents of its own that it would pass the refresh on to.
    fn has_dependents(&self) -> bool;
}

/// A type-erased dependent.
///
/// Holds only a weak reference, so registering a dependent with a source never keeps the
/// dependent alive. Identity is the address of the dependent's allocation.
#[derive(Clone)]
pub struct AnyDependent(pub(crate) usize, pub(crate) Weak<dyn Dependent + Send + Sync>);

impl AnyDependent {
    /// Creates a type-erased handle from a weak reference to a dependent.
    pub fn from_weak<D>(weak: &Weak<D>) -> Self
    where
        D: Dependent + Send + Sync + 'static,
    {
        AnyDependent(
            weak.as_ptr() as usize,
            Weak::clone(weak) as Weak<dyn Dependent + Send + Sync>,
        )
    }

    /// Whether the dependent this handle points to still exists.
    pub fn is_alive(&self) -> bool {
        self.1.strong_count() > 0
    }
}

impl<D> ToAnyDependent for Arc<D>
where
    D: Dependent + Send + Sync + 'static,
{
    fn to_any_dependent(&self) -> AnyDependent {
        AnyDependent::from_weak(&Arc::downgrade(self))
    }
}

impl ToAnyDependent for AnyDependent {
    fn to_any_dependent(&self) -> AnyDependent {
        self.clone()
    }
}

impl Dependent for AnyDependent {
    fn refresh(&self) {
        if let Some(inner) = self.1.upgrade() {
            inner.refresh();
        }
    }

    fn has_dependents(&self) -> bool {
        self.1
            .upgrade()
            .map(|inner| inner.has_dependents())
            .unwrap_or(false)
    }
}

impl Debug for AnyDependent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("AnyDependent").field(&self.0).finish()
    }
}

impl Hash for AnyDependent {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl PartialEq for AnyDependent {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for AnyDependent {}

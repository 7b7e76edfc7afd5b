use super::{Signal, SignalNode};
use crate::{
    graph::{AnyDependent, DependencyTracker, Source},
    traits::{DefinedAt, Set, Trigger, Update, With},
};
use core::fmt::{Debug, Formatter, Result};
use or_poisoned::OrPoisoned;
use std::{
    hash::Hash,
    panic::Location,
    sync::{Arc, RwLock},
};

pub(crate) struct MutableInner<T> {
    pub(crate) value: RwLock<T>,
    pub(crate) tracker: DependencyTracker,
}

impl<T> MutableInner<T> {
    pub(crate) fn new(value: T) -> Self {
        Self {
            value: RwLock::new(value),
            tracker: DependencyTracker::new(),
        }
    }

    pub(crate) fn set(&self, value: T) {
        *self.value.write().or_poisoned() = value;
        self.tracker.signal();
    }
}

impl<T> Source for MutableInner<T> {
    fn add_dependent(&self, dependent: AnyDependent) {
        self.tracker.add(dependent);
    }

    fn remove_dependent(&self, dependent: &AnyDependent) {
        self.tracker.remove(dependent);
    }

    fn has_dependencies(&self) -> bool {
        self.tracker.has_dependencies()
    }
}

impl<T: Send + Sync> SignalNode<T> for MutableInner<T> {
    fn with_value(&self, fun: &mut dyn FnMut(&T)) {
        fun(&self.value.read().or_poisoned());
    }
}

/// A settable value cell: the leaf source of every change in the graph.
///
/// Every write notifies all dependents, even when the new value equals the old one. Equality
/// is neither required of `T` nor consulted.
///
/// A write is atomic from the point of view of any reader: the new value is stored under a write
/// lock, and dependents are notified only after that lock has been released, before `set`
/// returns.
///
/// `Mutable` is reference-counted: clones share the same cell.
///
/// ```
/// # use signal_graph::{prelude::*, signal::Mutable};
/// let count = Mutable::new(0);
///
/// count.set(1);
/// assert_eq!(count.get(), 1);
///
/// // mutate in place
/// count.update(|n| *n += 1);
/// assert_eq!(count.get(), 2);
///
/// // or compute the next value from the current one
/// count.step(|n| n * 10);
/// assert_eq!(count.get(), 20);
/// ```
pub struct Mutable<T> {
    #[cfg(debug_assertions)]
    pub(crate) defined_at: &'static Location<'static>,
    pub(crate) inner: Arc<MutableInner<T>>,
}

impl<T> Mutable<T>
where
    T: Send + Sync + 'static,
{
    /// Creates a new cell holding `value`.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(level = "trace", skip_all)
    )]
    #[track_caller]
    pub fn new(value: T) -> Self {
        Self {
            #[cfg(debug_assertions)]
            defined_at: Location::caller(),
            inner: Arc::new(MutableInner::new(value)),
        }
    }

    /// Returns a read-only view of this cell.
    #[track_caller]
    pub fn read_only(&self) -> Signal<T> {
        Signal::from_node(Arc::clone(&self.inner) as Arc<dyn SignalNode<T>>)
    }

    /// Replaces the value with the result of applying `fun` to the current value, then notifies
    /// dependents.
    ///
    /// The read, the computation and the write all happen under the write lock, so `fun` must
    /// not access this cell.
    pub fn step(&self, fun: impl FnOnce(&T) -> T) {
        {
            let mut guard = self.inner.value.write().or_poisoned();
            let next = fun(&guard);
            *guard = next;
        }
        self.inner.tracker.signal();
    }
}

impl<T> Clone for Mutable<T> {
    #[track_caller]
    fn clone(&self) -> Self {
        Self {
            #[cfg(debug_assertions)]
            defined_at: self.defined_at,
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Debug for Mutable<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        f.debug_struct("Mutable")
            .field("type", &std::any::type_name::<T>())
            .field("value", &Arc::as_ptr(&self.inner))
            .finish()
    }
}

impl<T> PartialEq for Mutable<T> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<T> Eq for Mutable<T> {}

impl<T> Hash for Mutable<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::ptr::hash(&Arc::as_ptr(&self.inner), state);
    }
}

impl<T> Default for Mutable<T>
where
    T: Default + Send + Sync + 'static,
{
    #[track_caller]
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> DefinedAt for Mutable<T> {
    #[inline(always)]
    fn defined_at(&self) -> Option<&'static Location<'static>> {
        #[cfg(debug_assertions)]
        {
            Some(self.defined_at)
        }
        #[cfg(not(debug_assertions))]
        {
            None
        }
    }
}

impl<T> Source for Mutable<T> {
    fn add_dependent(&self, dependent: AnyDependent) {
        self.inner.add_dependent(dependent);
    }

    fn remove_dependent(&self, dependent: &AnyDependent) {
        self.inner.remove_dependent(dependent);
    }

    fn has_dependencies(&self) -> bool {
        self.inner.has_dependencies()
    }
}

impl<T> With for Mutable<T> {
    type Value = T;

    fn try_with<U>(&self, fun: impl FnOnce(&T) -> U) -> Option<U> {
        Some(fun(&self.inner.value.read().or_poisoned()))
    }
}

impl<T> Trigger for Mutable<T> {
    fn trigger(&self) {
        self.inner.tracker.signal();
    }
}

impl<T> Update for Mutable<T> {
    type Value = T;

    fn update(&self, fun: impl FnOnce(&mut T)) {
        fun(&mut self.inner.value.write().or_poisoned());
        self.inner.tracker.signal();
    }
}

impl<T> Set for Mutable<T> {
    type Value = T;

    fn set(&self, value: impl Into<T>) {
        self.inner.set(value.into());
    }
}

impl<T: Send + Sync + 'static> From<Mutable<T>> for Signal<T> {
    #[track_caller]
    fn from(value: Mutable<T>) -> Self {
        value.read_only()
    }
}

impl<T: Send + Sync + 'static> From<&Mutable<T>> for Signal<T> {
    #[track_caller]
    fn from(value: &Mutable<T>) -> Self {
        value.read_only()
    }
}

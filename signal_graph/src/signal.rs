//! Root nodes of the graph (values that are set from outside) and the type-erased [`Signal`]
//! handle that every node can be read through.

mod constant;
mod held;
mod mutable;
mod stream;

pub use constant::*;
pub(crate) use held::*;
pub use mutable::*;
pub use stream::*;

use crate::{
    graph::{AnyDependent, Source},
    traits::{DefinedAt, With},
};
use core::fmt::{Debug, Formatter, Result};
use std::{
    hash::Hash,
    panic::Location,
    sync::{Arc, Weak},
};

/// A node that produces a value of type `T`.
///
/// `with_value` calls the visitor exactly once with the current value, unless the value cannot
/// be reached, in which case it does not call it at all.
pub(crate) trait SignalNode<T>: Source + Send + Sync {
    fn with_value(&self, fun: &mut dyn FnMut(&T));
}

/// A read-only, reference-counted handle to any node that produces a `T`.
///
/// Every mutable, derived signal, command and idle tracker can be viewed as a `Signal`. Cloning a
/// `Signal` is cheap and yields another handle to the same node. A `Signal` keeps its node alive;
/// derived signals keep their sources alive in turn, except for
/// [`cache`](crate::computed::cache), which holds its source weakly.
///
/// ```
/// # use signal_graph::{prelude::*, signal::{Mutable, Signal}};
/// let count = Mutable::new(2);
/// let doubled = count.read_only().map(|n| n * 2);
/// assert_eq!(doubled.get(), 4);
///
/// count.set(5);
/// assert_eq!(doubled.get(), 10);
/// ```
pub struct Signal<T> {
    #[cfg(debug_assertions)]
    pub(crate) defined_at: &'static Location<'static>,
    pub(crate) inner: Arc<dyn SignalNode<T>>,
}

impl<T> Signal<T> {
    #[track_caller]
    pub(crate) fn from_node(inner: Arc<dyn SignalNode<T>>) -> Self {
        Self {
            #[cfg(debug_assertions)]
            defined_at: Location::caller(),
            inner,
        }
    }

    pub(crate) fn downgrade(&self) -> Weak<dyn SignalNode<T>> {
        Arc::downgrade(&self.inner)
    }

    fn addr(&self) -> usize {
        Arc::as_ptr(&self.inner) as *const () as usize
    }
}

impl<T> Signal<T>
where
    T: Send + Sync + 'static,
{
    /// Creates a derived signal that applies `fun` to this signal's value.
    ///
    /// See [`map`](crate::computed::map).
    #[track_caller]
    pub fn map<U>(&self, fun: impl Fn(&T) -> U + Send + Sync + 'static) -> Signal<U>
    where
        U: Send + Sync + 'static,
    {
        crate::computed::map(self, fun)
    }

    /// Creates a signal that holds the latest value of this signal which passed `predicate`.
    ///
    /// See [`filter`](crate::computed::filter).
    #[track_caller]
    pub fn filter(
        &self,
        initial: T,
        predicate: impl Fn(&T) -> bool + Send + 'static,
    ) -> Signal<T>
    where
        T: Clone,
    {
        crate::computed::filter(self, initial, predicate)
    }

    /// Creates a signal that caches this signal's value while holding it only weakly.
    ///
    /// See [`cache`](crate::computed::cache).
    #[track_caller]
    pub fn cache(&self) -> Signal<T>
    where
        T: Clone,
    {
        crate::computed::cache(self)
    }
}

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            #[cfg(debug_assertions)]
            defined_at: self.defined_at,
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Debug for Signal<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        f.debug_struct("Signal")
            .field("type", &std::any::type_name::<T>())
            .field("node", &self.addr())
            .finish()
    }
}

impl<T> PartialEq for Signal<T> {
    fn eq(&self, other: &Self) -> bool {
        self.addr() == other.addr()
    }
}

impl<T> Eq for Signal<T> {}

impl<T> Hash for Signal<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.addr().hash(state);
    }
}

impl<T> DefinedAt for Signal<T> {
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

impl<T> Source for Signal<T> {
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

impl<T> With for Signal<T> {
    type Value = T;

    fn try_with<U>(&self, fun: impl FnOnce(&T) -> U) -> Option<U> {
        let mut fun = Some(fun);
        let mut result = None;
        self.inner.with_value(&mut |value| {
            if let Some(fun) = fun.take() {
                result = Some(fun(value));
            }
        });
        result
    }
}

impl<T> From<&Signal<T>> for Signal<T> {
    fn from(value: &Signal<T>) -> Self {
        value.clone()
    }
}

use crate::{
    graph::{AnyDependent, DependencyTracker, Source},
    signal::{Signal, SignalNode},
    traits::{DefinedAt, With},
};
use or_poisoned::OrPoisoned;
use slotmap::{DefaultKey, SlotMap};
use std::{
    fmt::Debug,
    panic::Location,
    sync::{Arc, RwLock},
};

/// Counts the asynchronous computations that are in flight, so that a view can show whether
/// the application is busy.
///
/// A tracker is shared by every computation that opts in, and outlives any one of them. It is
/// a signal of whether it is idle: it notifies when a computation starts and when one ends.
///
/// ```
/// # use signal_graph::{computed::IdleTracker, prelude::*};
/// let idle = IdleTracker::new();
/// assert!(idle.is_idle());
///
/// let handle = idle.begin();
/// assert_eq!(idle.in_flight(), 1);
/// assert!(!idle.get());
///
/// drop(handle);
/// assert!(idle.is_idle());
/// ```
#[derive(Clone)]
pub struct IdleTracker {
    #[cfg(debug_assertions)]
    defined_at: &'static Location<'static>,
    inner: Arc<IdleInner>,
}

struct IdleInner {
    tasks: RwLock<SlotMap<DefaultKey, ()>>,
    tracker: DependencyTracker,
}

impl IdleTracker {
    /// Creates a tracker with nothing in flight.
    #[track_caller]
    pub fn new() -> Self {
        Self {
            #[cfg(debug_assertions)]
            defined_at: Location::caller(),
            inner: Arc::new(IdleInner {
                tasks: Default::default(),
                tracker: DependencyTracker::new(),
            }),
        }
    }

    /// Registers a computation as in flight until the returned handle is dropped.
    pub fn begin(&self) -> IdleHandle {
        let key = self.inner.tasks.write().or_poisoned().insert(());
        self.inner.tracker.signal();
        IdleHandle {
            inner: Arc::clone(&self.inner),
            key,
        }
    }

    /// Whether no computation is in flight.
    pub fn is_idle(&self) -> bool {
        self.inner.is_idle()
    }

    /// The number of computations in flight.
    pub fn in_flight(&self) -> usize {
        self.inner.tasks.read().or_poisoned().len()
    }

    /// Returns a signal of whether the tracker is idle.
    #[track_caller]
    pub fn signal(&self) -> Signal<bool> {
        Signal::from_node(Arc::clone(&self.inner) as Arc<dyn SignalNode<bool>>)
    }
}

impl IdleInner {
    fn is_idle(&self) -> bool {
        self.tasks.read().or_poisoned().is_empty()
    }
}

impl Default for IdleTracker {
    #[track_caller]
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for IdleTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdleTracker")
            .field("in_flight", &self.in_flight())
            .finish()
    }
}

impl DefinedAt for IdleTracker {
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

impl With for IdleTracker {
    type Value = bool;

    fn try_with<U>(&self, fun: impl FnOnce(&bool) -> U) -> Option<U> {
        Some(fun(&self.is_idle()))
    }
}

impl Source for IdleTracker {
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

impl Source for IdleInner {
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

impl SignalNode<bool> for IdleInner {
    fn with_value(&self, fun: &mut dyn FnMut(&bool)) {
        fun(&self.is_idle());
    }
}

impl From<&IdleTracker> for Signal<bool> {
    #[track_caller]
    fn from(value: &IdleTracker) -> Self {
        value.signal()
    }
}

/// Marks one computation as in flight on an [`IdleTracker`]. Dropping it ends the computation.
#[must_use = "the computation ends as soon as the handle is dropped"]
pub struct IdleHandle {
    inner: Arc<IdleInner>,
    key: DefaultKey,
}

impl Drop for IdleHandle {
    fn drop(&mut self) {
        self.inner.tasks.write().or_poisoned().remove(self.key);
        self.inner.tracker.signal();
    }
}

impl Debug for IdleHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdleHandle").finish_non_exhaustive()
    }
}

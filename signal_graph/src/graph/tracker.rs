//! The per-node registry of dependents.
//!
//! The set is a linear map built on a `Vec<_>`. Most nodes have a handful of dependents at most,
//! so a linear search costs about as much as a hash and lookup.

use super::{AnyDependent, Dependent};
use or_poisoned::OrPoisoned;
use std::{mem, sync::RwLock, vec::IntoIter};

#[derive(Debug, Default, Clone)]
pub(crate) struct DependentSet(Vec<AnyDependent>);

impl DependentSet {
    pub fn new() -> Self {
        Self(Vec::with_capacity(2))
    }

    /// Adds a dependent. Returns `false` if it was already present.
    pub fn insert(&mut self, dependent: AnyDependent) -> bool {
        if self.0.contains(&dependent) {
            false
        } else {
            self.0.push(dependent);
            true
        }
    }

    /// Removes a dependent. Returns `false` if it was not present.
    pub fn remove(&mut self, dependent: &AnyDependent) -> bool {
        if let Some(pos) = self.0.iter().position(|d| d == dependent) {
            // keep registration order stable for anyone inspecting the set
            self.0.remove(pos);
            true
        } else {
            false
        }
    }

    pub fn contains(&self, dependent: &AnyDependent) -> bool {
        self.0.contains(dependent)
    }

    /// Drops handles whose dependent no longer exists.
    pub fn prune(&mut self) {
        self.0.retain(AnyDependent::is_alive);
    }

    pub fn take(&mut self) -> Vec<AnyDependent> {
        mem::take(&mut self.0)
    }

    #[cfg_attr(not(feature = "tracing"), allow(dead_code))]
    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl IntoIterator for DependentSet {
    type Item = AnyDependent;
    type IntoIter = IntoIter<AnyDependent>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Tracks the dependents of a single node and notifies them when the node changes.
///
/// Dependents are held weakly: a tracker never keeps the nodes that depend on it alive, so a
/// tracker with no live dependents holds no strong references at all.
///
/// [`signal`](Self::signal) refreshes a snapshot of the current dependents, re-checking that
/// each one is still registered right before it is refreshed. Dependents may therefore add or
/// remove themselves (or each other) while a pass is running: a removed dependent is not
/// refreshed again, and every other dependent is refreshed exactly once. No lock is held while a
/// dependent runs.
///
/// The dependency graph must be acyclic.
#[derive(Debug, Default)]
pub struct DependencyTracker {
    dependents: RwLock<DependentSet>,
}

impl DependencyTracker {
    /// Creates a tracker with no dependents.
    pub fn new() -> Self {
        Self {
            dependents: RwLock::new(DependentSet::new()),
        }
    }

    /// Registers a dependent. Adding the same dependent twice is a no-op.
    pub fn add(&self, dependent: AnyDependent) {
        let mut set = self.dependents.write().or_poisoned();
        set.prune();
        set.insert(dependent);
    }

    /// Unregisters a dependent. Removing one that is not registered is a no-op.
    pub fn remove(&self, dependent: &AnyDependent) {
        self.dependents.write().or_poisoned().remove(dependent);
    }

    /// Whether the given dependent is currently registered.
    pub fn contains(&self, dependent: &AnyDependent) -> bool {
        self.dependents.read().or_poisoned().contains(dependent)
    }

    /// Whether at least one live dependent is registered.
    pub fn has_dependencies(&self) -> bool {
        self.dependents
            .read()
            .or_poisoned()
            .0
            .iter()
            .any(AnyDependent::is_alive)
    }

    /// The number of live dependents.
    pub fn len(&self) -> usize {
        self.dependents
            .read()
            .or_poisoned()
            .0
            .iter()
            .filter(|d| d.is_alive())
            .count()
    }

    /// Whether no live dependent is registered.
    pub fn is_empty(&self) -> bool {
        !self.has_dependencies()
    }

    /// Unregisters every dependent.
    pub fn clear(&self) {
        self.dependents.write().or_poisoned().take();
    }

    /// Synchronously refreshes every registered dependent.
    pub fn signal(&self) {
        let snapshot = self.dependents.read().or_poisoned().clone();
        #[cfg(feature = "tracing")]
        tracing::trace!(dependents = snapshot.len(), "signalling dependents");

        let mut saw_dead = false;
        for dependent in snapshot {
            if !dependent.is_alive() {
                saw_dead = true;
                continue;
            }
            if self.contains(&dependent) {
                dependent.refresh();
            }
        }

        if saw_dead {
            self.dependents.write().or_poisoned().prune();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::DependencyTracker;
    use crate::graph::{AnyDependent, Dependent, ToAnyDependent};
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    };

    #[derive(Default)]
    struct Counter {
        refreshes: AtomicUsize,
        on_refresh: Mutex<Option<Box<dyn Fn() + Send>>>,
    }

    impl Dependent for Counter {
        fn refresh(&self) {
            self.refreshes.fetch_add(1, Ordering::Relaxed);
            if let Some(hook) = &*self.on_refresh.lock().unwrap() {
                hook();
            }
        }

        fn has_dependents(&self) -> bool {
            false
        }
    }

    impl Counter {
        fn count(&self) -> usize {
            self.refreshes.load(Ordering::Relaxed)
        }
    }

    #[test]
    fn duplicate_add_registers_once() {
        let tracker = DependencyTracker::new();
        let counter = Arc::new(Counter::default());
        tracker.add(counter.to_any_dependent());
        tracker.add(counter.to_any_dependent());
        assert_eq!(tracker.len(), 1);
        tracker.signal();
        assert_eq!(counter.count(), 1);
    }

    #[test]
    fn len_counts_only_live_dependents() {
        let tracker = DependencyTracker::new();
        let kept = Arc::new(Counter::default());
        let dropped = Arc::new(Counter::default());
        tracker.add(kept.to_any_dependent());
        tracker.add(dropped.to_any_dependent());
        assert_eq!(tracker.len(), 2);

        drop(dropped);
        assert_eq!(tracker.len(), 1);
        assert!(tracker.has_dependencies());
        assert!(!tracker.is_empty());

        tracker.remove(&kept.to_any_dependent());
        assert_eq!(tracker.len(), 0);
        assert!(tracker.is_empty());
    }

    #[test]
    fn removing_absent_dependent_is_noop() {
        let tracker = DependencyTracker::new();
        let counter = Arc::new(Counter::default());
        tracker.remove(&counter.to_any_dependent());
        assert!(!tracker.has_dependencies());
    }

    #[test]
    fn dropped_dependents_do_not_count() {
        let tracker = DependencyTracker::new();
        let counter = Arc::new(Counter::default());
        tracker.add(counter.to_any_dependent());
        assert!(tracker.has_dependencies());
        drop(counter);
        assert!(!tracker.has_dependencies());
        tracker.signal();
        assert_eq!(tracker.len(), 0);
    }

    #[test]
    fn dependent_removed_mid_pass_is_skipped() {
        let tracker = Arc::new(DependencyTracker::new());
        let first = Arc::new(Counter::default());
        let second = Arc::new(Counter::default());
        let third = Arc::new(Counter::default());

        let second_handle: AnyDependent = second.to_any_dependent();
        *first.on_refresh.lock().unwrap() = Some(Box::new({
            let tracker = Arc::clone(&tracker);
            move || tracker.remove(&second_handle)
        }));

        tracker.add(first.to_any_dependent());
        tracker.add(second.to_any_dependent());
        tracker.add(third.to_any_dependent());
        tracker.signal();

        assert_eq!(first.count(), 1);
        assert_eq!(second.count(), 0);
        assert_eq!(third.count(), 1);
    }

    #[test]
    fn dependent_removing_itself_mid_pass() {
        let tracker = Arc::new(DependencyTracker::new());
        let first = Arc::new(Counter::default());
        let second = Arc::new(Counter::default());

        let first_handle = first.to_any_dependent();
        *first.on_refresh.lock().unwrap() = Some(Box::new({
            let tracker = Arc::clone(&tracker);
            move || tracker.remove(&first_handle)
        }));

        tracker.add(first.to_any_dependent());
        tracker.add(second.to_any_dependent());
        tracker.signal();
        tracker.signal();

        assert_eq!(first.count(), 1);
        assert_eq!(second.count(), 2);
    }
}

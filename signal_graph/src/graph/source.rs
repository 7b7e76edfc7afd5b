use super::{AnyDependent, DependencyTracker};
use std::sync::Arc;

/// Describes the behavior of any node that dependents can register with (a mutable, a derived
/// signal, a command).
pub trait Source {
    /// Adds a dependent to this source's list of dependents.
    fn add_dependent(&self, dependent: AnyDependent);

    /// Removes a dependent from this source's list of dependents.
    fn remove_dependent(&self, dependent: &AnyDependent);

    /// Whether at least one live dependent is registered with this source.
    fn has_dependencies(&self) -> bool;
}

impl Source for DependencyTracker {
    fn add_dependent(&self, dependent: AnyDependent) {
        self.add(dependent);
    }

    fn remove_dependent(&self, dependent: &AnyDependent) {
        self.remove(dependent);
    }

    fn has_dependencies(&self) -> bool {
        DependencyTracker::has_dependencies(self)
    }
}

impl<S: Source + ?Sized> Source for Arc<S> {
    fn add_dependent(&self, dependent: AnyDependent) {
        (**self).add_dependent(dependent)
    }

    fn remove_dependent(&self, dependent: &AnyDependent) {
        (**self).remove_dependent(dependent)
    }

    fn has_dependencies(&self) -> bool {
        (**self).has_dependencies()
    }
}

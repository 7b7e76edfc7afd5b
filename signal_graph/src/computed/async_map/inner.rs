use super::{cancellation::Cancellable, CancellationToken, InFlight, Loading};
use crate::{
    graph::{AnyDependent, Dependent, DependencyTracker, Source},
    signal::SignalNode,
};
use or_poisoned::OrPoisoned;
use std::{
    future::Future,
    sync::{Arc, RwLock, Weak},
};

pub(crate) type Launch<T> = Box<dyn Fn(&AsyncMapInner<T>) + Send + Sync>;

pub(crate) struct AsyncMapInner<T> {
    value: RwLock<T>,
    tracker: DependencyTracker,
    pub(crate) loading: Arc<Loading>,
    launch: Launch<T>,
    source: Box<dyn Source + Send + Sync>,
    me: AnyDependent,
    pub(crate) weak: Weak<Self>,
}

impl<T> AsyncMapInner<T>
where
    T: Send + Sync + 'static,
{
    /// Creates the node, registers it with `source` and launches the first computation.
    pub(crate) fn new(
        initial: T,
        source: Box<dyn Source + Send + Sync>,
        launch: Launch<T>,
    ) -> Arc<Self> {
        let inner = Arc::new_cyclic(|weak| AsyncMapInner {
            value: RwLock::new(initial),
            tracker: DependencyTracker::new(),
            loading: Default::default(),
            launch,
            source,
            me: AnyDependent::from_weak(weak),
            weak: Weak::clone(weak),
        });
        inner.source.add_dependent(inner.me.clone());
        (inner.launch)(&inner);
        inner
    }

    fn complete(&self, value: T) {
        #[cfg(feature = "tracing")]
        tracing::trace!("async map computation completed");
        *self.value.write().or_poisoned() = value;
        self.tracker.signal();
    }
}

impl<T> Drop for AsyncMapInner<T> {
    fn drop(&mut self) {
        self.source.remove_dependent(&self.me);
    }
}

impl<T> Dependent for AsyncMapInner<T> {
    fn refresh(&self) {
        (self.launch)(self);
    }

    fn has_dependents(&self) -> bool {
        self.tracker.has_dependencies()
    }
}

impl<T> Source for AsyncMapInner<T> {
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

impl<T: Send + Sync> SignalNode<T> for AsyncMapInner<T> {
    fn with_value(&self, fun: &mut dyn FnMut(&T)) {
        fun(&self.value.read().or_poisoned());
    }
}

/// Drives one computation to completion and stores its result, unless the computation is
/// cancelled or the node has been dropped in the meantime.
pub(crate) async fn run<T, Fut>(
    target: Weak<AsyncMapInner<T>>,
    fut: Fut,
    in_flight: InFlight,
    cancellation: Option<CancellationToken>,
) where
    T: Send + Sync + 'static,
    Fut: Future<Output = T>,
{
    let value = match cancellation {
        Some(token) => Cancellable::new(&token, fut).await,
        None => Some(fut.await),
    };

    match (value, target.upgrade()) {
        (Some(value), Some(target)) => target.complete(value),
        (None, _) => {
            #[cfg(feature = "tracing")]
            tracing::trace!("async map computation cancelled");
        }
        (Some(_), None) => {
            #[cfg(feature = "tracing")]
            tracing::trace!("async map dropped before its computation completed");
        }
    }

    // released only after the result is visible
    drop(in_flight);
}

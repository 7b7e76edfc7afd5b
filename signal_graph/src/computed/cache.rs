use crate::{
    graph::{AnyDependent, Dependent, DependencyTracker, Source},
    signal::{Signal, SignalNode},
    traits::Get,
};
use or_poisoned::OrPoisoned;
use std::sync::{Arc, RwLock, Weak};

struct CacheState<T> {
    value: T,
    connected: bool,
}

pub(crate) struct CacheInner<T> {
    source: Weak<dyn SignalNode<T>>,
    state: RwLock<CacheState<T>>,
    tracker: DependencyTracker,
    me: AnyDependent,
}

impl<T> CacheInner<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Copies the source's current value, if the source still exists.
    fn pull(&self) {
        if let Some(source) = self.source.upgrade() {
            let mut latest = None;
            source.with_value(&mut |value| latest = Some(value.clone()));
            if let Some(latest) = latest {
                self.state.write().or_poisoned().value = latest;
            }
        }
    }

    fn connect(&self) {
        let newly_connected = {
            let mut state = self.state.write().or_poisoned();
            !std::mem::replace(&mut state.connected, true)
        };
        if newly_connected {
            if let Some(source) = self.source.upgrade() {
                #[cfg(feature = "tracing")]
                tracing::trace!("cache connecting to its source");
                source.add_dependent(self.me.clone());
            }
        }
    }
}

impl<T> CacheInner<T> {
    fn disconnect(&self) {
        let was_connected = std::mem::replace(
            &mut self.state.write().or_poisoned().connected,
            false,
        );
        if was_connected {
            if let Some(source) = self.source.upgrade() {
                #[cfg(feature = "tracing")]
                tracing::trace!("cache disconnecting from its source");
                source.remove_dependent(&self.me);
            }
        }
    }
}

impl<T> Drop for CacheInner<T> {
    fn drop(&mut self) {
        self.disconnect();
    }
}

impl<T> Dependent for CacheInner<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn refresh(&self) {
        if self.has_dependents() {
            self.pull();
            self.tracker.signal();
        } else {
            // every dependent went away without unregistering
            self.disconnect();
        }
    }

    fn has_dependents(&self) -> bool {
        self.tracker.has_dependencies()
    }
}

impl<T> Source for CacheInner<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn add_dependent(&self, dependent: AnyDependent) {
        self.tracker.add(dependent);
        self.connect();
    }

    fn remove_dependent(&self, dependent: &AnyDependent) {
        self.tracker.remove(dependent);
        if !self.tracker.has_dependencies() {
            self.disconnect();
        }
    }

    fn has_dependencies(&self) -> bool {
        self.tracker.has_dependencies()
    }
}

impl<T> SignalNode<T> for CacheInner<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn with_value(&self, fun: &mut dyn FnMut(&T)) {
        self.pull();
        fun(&self.state.read().or_poisoned().value);
    }
}

/// Creates a signal that caches the value of `source` while holding `source` only weakly.
///
/// While `source` exists, reading the cache yields the source's current value. Once every other
/// handle to `source` has been dropped, the cache keeps returning the last value it observed.
///
/// The cache only registers with `source` while it has dependents of its own. When its last
/// dependent is removed it disconnects, so an unobserved cache keeps nothing upstream alive and
/// is not kept alive by anything upstream.
///
/// ```
/// # use signal_graph::{computed::cache, prelude::*, signal::Mutable};
/// let name = Mutable::new(String::from("draft"));
/// let cached = cache(&name);
/// name.set("final");
/// assert_eq!(cached.get(), "final");
///
/// drop(name);
/// assert_eq!(cached.get(), "final");
/// ```
#[cfg_attr(feature = "tracing", tracing::instrument(level = "trace", skip_all))]
#[track_caller]
pub fn cache<T>(source: impl Into<Signal<T>>) -> Signal<T>
where
    T: Clone + Send + Sync + 'static,
{
    let source = source.into();
    let value = source.get();
    let inner = Arc::new_cyclic(|weak| CacheInner {
        source: source.downgrade(),
        state: RwLock::new(CacheState {
            value,
            connected: false,
        }),
        tracker: DependencyTracker::new(),
        me: AnyDependent::from_weak(weak),
    });
    Signal::from_node(inner)
}

use crate::{
    graph::{AnyDependent, Dependent, DependencyTracker, Source},
    signal::{Signal, SignalNode},
    traits::With,
};
use or_poisoned::OrPoisoned;
use std::sync::{Arc, RwLock};

struct MapState<T> {
    value: Option<T>,
    // bumped every time a source signals
    version: u64,
    // the version `value` was computed for
    computed: u64,
}

/// A derived node that recomputes lazily: a notification from any source marks it stale and is
/// passed on to its dependents, and the value is recomputed on the next read.
pub(crate) struct MapInner<T> {
    state: RwLock<MapState<T>>,
    compute: Box<dyn Fn() -> T + Send + Sync>,
    sources: Vec<Box<dyn Source + Send + Sync>>,
    tracker: DependencyTracker,
    me: AnyDependent,
}

impl<T> MapInner<T>
where
    T: Send + Sync + 'static,
{
    fn new(
        compute: Box<dyn Fn() -> T + Send + Sync>,
        sources: Vec<Box<dyn Source + Send + Sync>>,
    ) -> Arc<Self> {
        let inner = Arc::new_cyclic(|weak| MapInner {
            state: RwLock::new(MapState {
                value: None,
                version: 0,
                computed: 0,
            }),
            compute,
            sources,
            tracker: DependencyTracker::new(),
            me: AnyDependent::from_weak(weak),
        });
        for source in &inner.sources {
            source.add_dependent(inner.me.clone());
        }
        inner
    }

    fn update_if_necessary(&self) {
        let stale = {
            let state = self.state.read().or_poisoned();
            (state.value.is_none() || state.computed != state.version)
                .then_some(state.version)
        };

        if let Some(version) = stale {
            // the mapping function runs without holding our own lock, so a panic in it
            // reaches the reader without poisoning this node
            let value = (self.compute)();
            let mut state = self.state.write().or_poisoned();
            if state.value.is_none() || state.computed <= version {
                state.value = Some(value);
                state.computed = version;
            }
        }
    }
}

impl<T> Drop for MapInner<T> {
    fn drop(&mut self) {
        for source in &self.sources {
            source.remove_dependent(&self.me);
        }
    }
}

impl<T> Dependent for MapInner<T> {
    fn refresh(&self) {
        self.state.write().or_poisoned().version += 1;
        if self.has_dependents() {
            self.tracker.signal();
        }
    }

    fn has_dependents(&self) -> bool {
        self.tracker.has_dependencies()
    }
}

impl<T> Source for MapInner<T> {
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

impl<T> SignalNode<T> for MapInner<T>
where
    T: Send + Sync + 'static,
{
    fn with_value(&self, fun: &mut dyn FnMut(&T)) {
        self.update_if_necessary();
        if let Some(value) = &self.state.read().or_poisoned().value {
            fun(value);
        }
    }
}

/// Creates a signal whose value is `fun` applied to the value of `source`.
///
/// `fun` runs at most once per notification from `source`: the result is cached until the
/// source signals again, and is only computed when it is read. Reading the value right after
/// any change therefore always yields `fun(source)`.
///
/// A panic in `fun` propagates to whoever reads the signal.
///
/// ```
/// # use signal_graph::{computed::map, prelude::*, signal::Mutable};
/// let count = Mutable::new(5);
/// let doubled = map(&count, |n| n * 2);
/// assert_eq!(doubled.get(), 10);
///
/// count.set(7);
/// assert_eq!(doubled.get(), 14);
/// ```
#[cfg_attr(feature = "tracing", tracing::instrument(level = "trace", skip_all))]
#[track_caller]
pub fn map<S, T>(
    source: impl Into<Signal<S>>,
    fun: impl Fn(&S) -> T + Send + Sync + 'static,
) -> Signal<T>
where
    S: Send + Sync + 'static,
    T: Send + Sync + 'static,
{
    let source = source.into();
    let compute = {
        let source = source.clone();
        Box::new(move || source.with(&fun))
    };
    let sources: Vec<Box<dyn Source + Send + Sync>> = vec![Box::new(source)];
    Signal::from_node(MapInner::new(compute, sources))
}

/// Creates a signal whose value is `fun` applied to the values of `a` and `b`.
///
/// The signal notifies its dependents once for every notification from either source. Two
/// independent updates, one to `a` and one to `b`, therefore produce two notifications; they are
/// never coalesced, even when they are part of the same logical change.
///
/// ```
/// # use signal_graph::{computed::map2, prelude::*, signal::Mutable};
/// let first = Mutable::new(String::from("Ada"));
/// let last = Mutable::new(String::from("Lovelace"));
/// let full = map2(&first, &last, |first, last| format!("{first} {last}"));
/// assert_eq!(full.get(), "Ada Lovelace");
/// ```
#[cfg_attr(feature = "tracing", tracing::instrument(level = "trace", skip_all))]
#[track_caller]
pub fn map2<A, B, T>(
    a: impl Into<Signal<A>>,
    b: impl Into<Signal<B>>,
    fun: impl Fn(&A, &B) -> T + Send + Sync + 'static,
) -> Signal<T>
where
    A: Send + Sync + 'static,
    B: Send + Sync + 'static,
    T: Send + Sync + 'static,
{
    let (a, b) = (a.into(), b.into());
    let compute = {
        let (a, b) = (a.clone(), b.clone());
        Box::new(move || a.with(|a| b.with(|b| fun(a, b))))
    };
    let sources: Vec<Box<dyn Source + Send + Sync>> =
        vec![Box::new(a), Box::new(b)];
    Signal::from_node(MapInner::new(compute, sources))
}

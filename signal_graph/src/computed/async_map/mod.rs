mod cancellation;
mod idle;
mod inner;
mod ready;

pub use cancellation::{CancellationToken, Cancelled};
pub use idle::*;
pub(crate) use inner::AsyncMapInner;
pub use ready::AsyncReady;
pub(crate) use ready::{InFlight, Loading};

use crate::{
    graph::{AnyDependent, Source},
    signal::{Signal, SignalNode},
    traits::{DefinedAt, Get, With},
};
use core::fmt::{Debug, Formatter, Result};
use std::{
    future::Future,
    panic::Location,
    sync::{Arc, Weak},
};

/// A signal whose value is produced by asynchronous computations.
///
/// Every notification from the source launches a new computation on the
/// [`Executor`](any_spawner::Executor). Until one completes, the signal keeps its previous value,
/// or the initial value if nothing has completed yet. Each completion stores its result and
/// notifies dependents.
///
/// Computations are not ordered by when they were launched: **the last one to complete wins**.
/// If the source changes twice and the first computation is slower than the second, the stale
/// result of the first overwrites the fresh one. Pass a [`CancellationToken`] or write
/// computations whose results do not depend on their order where this matters.
///
/// A panic inside a computation unwinds its task on the executor, leaves the value untouched and
/// still ends the computation, both for [`is_loading`](Self::is_loading) and for any
/// [`IdleTracker`]. Computations that can fail should produce a `Result`.
pub struct AsyncSignal<T> {
    #[cfg(debug_assertions)]
    defined_at: &'static Location<'static>,
    inner: Arc<AsyncMapInner<T>>,
}

impl<T> AsyncSignal<T>
where
    T: Send + Sync + 'static,
{
    /// Whether any computation for this signal is in flight.
    pub fn is_loading(&self) -> bool {
        self.inner.loading.in_flight() > 0
    }

    /// Returns a future that resolves once no computation for this signal is in flight.
    ///
    /// A computation launched while the future is pending delays it further.
    pub fn ready(&self) -> AsyncReady {
        AsyncReady {
            loading: Arc::clone(&self.inner.loading),
        }
    }

    /// Returns a type-erased handle to this signal.
    #[track_caller]
    pub fn signal(&self) -> Signal<T> {
        Signal::from_node(Arc::clone(&self.inner) as Arc<dyn SignalNode<T>>)
    }
}

impl<T> Clone for AsyncSignal<T> {
    fn clone(&self) -> Self {
        Self {
            #[cfg(debug_assertions)]
            defined_at: self.defined_at,
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Debug for AsyncSignal<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        f.debug_struct("AsyncSignal")
            .field("type", &std::any::type_name::<T>())
            .field("in_flight", &self.inner.loading.in_flight())
            .finish()
    }
}

impl<T> DefinedAt for AsyncSignal<T> {
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

impl<T> Source for AsyncSignal<T> {
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

impl<T: Send + Sync> With for AsyncSignal<T> {
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

impl<T: Send + Sync + 'static> From<AsyncSignal<T>> for Signal<T> {
    #[track_caller]
    fn from(value: AsyncSignal<T>) -> Self {
        value.signal()
    }
}

impl<T: Send + Sync + 'static> From<&AsyncSignal<T>> for Signal<T> {
    #[track_caller]
    fn from(value: &AsyncSignal<T>) -> Self {
        value.signal()
    }
}

/// Optional collaborators of an async map.
#[derive(Clone, Debug, Default)]
pub struct AsyncOptions {
    idle: Option<IdleTracker>,
    cancellation: Option<CancellationToken>,
}

impl AsyncOptions {
    /// No idle tracker and no cancellation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts every computation as in flight on `tracker` until it ends.
    pub fn idle(mut self, tracker: &IdleTracker) -> Self {
        self.idle = Some(tracker.clone());
        self
    }

    /// Abandons computations once `token` is cancelled.
    pub fn cancellation(mut self, token: &CancellationToken) -> Self {
        self.cancellation = Some(token.clone());
        self
    }
}

/// Creates a signal whose value is the result of the most recently completed computation
/// `fun(source)`.
///
/// A computation is launched when the signal is created and again on every notification from
/// `source`. See [`AsyncSignal`] for the ordering of results.
///
/// ```
/// # use any_spawner::Executor;
/// # use signal_graph::{computed::map_async, prelude::*, signal::Mutable};
/// # let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
/// # runtime.block_on(async {
/// _ = Executor::init_tokio();
///
/// let id = Mutable::new(1);
/// let name = map_async(&id, String::new(), |id| async move { format!("user {id}") });
///
/// name.ready().await;
/// assert_eq!(name.get(), "user 1");
/// # });
/// ```
#[track_caller]
pub fn map_async<S, T, Fut>(
    source: impl Into<Signal<S>>,
    initial: T,
    fun: impl Fn(S) -> Fut + Send + Sync + 'static,
) -> AsyncSignal<T>
where
    S: Clone + Send + Sync + 'static,
    T: Send + Sync + 'static,
    Fut: Future<Output = T> + Send + 'static,
{
    map_async_with(source, initial, AsyncOptions::new(), fun)
}

/// Like [`map_async`], but counts every computation as in flight on `idle` until it ends,
/// whether it completes, panics or is abandoned.
#[track_caller]
pub fn map_async_tracked<S, T, Fut>(
    source: impl Into<Signal<S>>,
    initial: T,
    idle: &IdleTracker,
    fun: impl Fn(S) -> Fut + Send + Sync + 'static,
) -> AsyncSignal<T>
where
    S: Clone + Send + Sync + 'static,
    T: Send + Sync + 'static,
    Fut: Future<Output = T> + Send + 'static,
{
    map_async_with(source, initial, AsyncOptions::new().idle(idle), fun)
}

/// Like [`map_async`], with an optional [`IdleTracker`] and [`CancellationToken`].
///
/// A computation that is cancelled never writes its result, even if it completes afterwards.
/// Once the token is cancelled, later notifications from `source` launch nothing.
#[cfg_attr(feature = "tracing", tracing::instrument(level = "trace", skip_all))]
#[track_caller]
pub fn map_async_with<S, T, Fut>(
    source: impl Into<Signal<S>>,
    initial: T,
    options: AsyncOptions,
    fun: impl Fn(S) -> Fut + Send + Sync + 'static,
) -> AsyncSignal<T>
where
    S: Clone + Send + Sync + 'static,
    T: Send + Sync + 'static,
    Fut: Future<Output = T> + Send + 'static,
{
    create(source.into(), initial, options, move |value, target, in_flight, token| {
        crate::spawn(inner::run(target, fun(value), in_flight, token))
    })
}

/// Like [`map_async_with`], but spawns computations with
/// [`Executor::spawn_local`](any_spawner::Executor::spawn_local).
///
/// The futures do not need to be `Send`, and every result is stored on the thread that runs the
/// local executor, which makes this the variant to use when dependents must only be notified on
/// a UI thread.
#[cfg_attr(feature = "tracing", tracing::instrument(level = "trace", skip_all))]
#[track_caller]
pub fn map_async_local<S, T, Fut>(
    source: impl Into<Signal<S>>,
    initial: T,
    options: AsyncOptions,
    fun: impl Fn(S) -> Fut + Send + Sync + 'static,
) -> AsyncSignal<T>
where
    S: Clone + Send + Sync + 'static,
    T: Send + Sync + 'static,
    Fut: Future<Output = T> + 'static,
{
    create(source.into(), initial, options, move |value, target, in_flight, token| {
        crate::spawn_local(inner::run(target, fun(value), in_flight, token))
    })
}

#[track_caller]
fn create<S, T>(
    source: Signal<S>,
    initial: T,
    options: AsyncOptions,
    spawn: impl Fn(S, Weak<AsyncMapInner<T>>, InFlight, Option<CancellationToken>)
        + Send
        + Sync
        + 'static,
) -> AsyncSignal<T>
where
    S: Clone + Send + Sync + 'static,
    T: Send + Sync + 'static,
{
    let launch = {
        let source = source.clone();
        Box::new(move |node: &AsyncMapInner<T>| {
            if options
                .cancellation
                .as_ref()
                .is_some_and(CancellationToken::is_cancelled)
            {
                #[cfg(feature = "tracing")]
                tracing::trace!("not launching async map computation: token cancelled");
                return;
            }

            #[cfg(feature = "tracing")]
            tracing::trace!("launching async map computation");
            let in_flight = InFlight::begin(
                &node.loading,
                options.idle.as_ref().map(IdleTracker::begin),
            );
            spawn(source.get(), Weak::clone(&node.weak), in_flight, options.cancellation.clone());
        })
    };

    AsyncSignal {
        #[cfg(debug_assertions)]
        defined_at: Location::caller(),
        inner: AsyncMapInner::new(initial, Box::new(source), launch),
    }
}

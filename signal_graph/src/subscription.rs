//! Disposable registrations that run a side effect every time a signal changes.

use crate::{
    graph::{AnyDependent, Dependent, Source},
    signal::{Mutable, Signal},
    traits::{Dispose, Get, Set},
};
use core::fmt::{Debug, Formatter, Result};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex, PoisonError,
};

/// A registration of a side effect with a signal.
///
/// The side effect runs synchronously, on the thread that caused the change, every time the
/// signal notifies. It receives a clone of the signal's value as it is after the change.
///
/// The registration lasts until [`dispose`](Dispose::dispose) is called or the handle is
/// dropped, so a subscription that is not stored anywhere stops immediately. Once `dispose` has
/// returned, the side effect will not run again, even if it is called from inside another
/// dependent while the signal is still notifying.
///
/// The side effect must not cause the signal it is registered with to notify again.
#[must_use = "a subscription stops as soon as it is dropped"]
pub struct Subscription {
    inner: Arc<SubscriptionInner>,
}

struct SubscriptionInner {
    source: Box<dyn Source + Send + Sync>,
    action: Box<dyn Fn() + Send + Sync>,
    disposed: AtomicBool,
    once: bool,
    me: AnyDependent,
}

impl SubscriptionInner {
    fn dispose(&self) {
        if !self.disposed.swap(true, Ordering::AcqRel) {
            self.source.remove_dependent(&self.me);
        }
    }
}

impl Dependent for SubscriptionInner {
    fn refresh(&self) {
        if self.disposed.load(Ordering::Acquire) {
            return;
        }
        if self.once {
            self.dispose();
        }
        (self.action)();
    }

    fn has_dependents(&self) -> bool {
        false
    }
}

impl Subscription {
    fn register(
        source: Box<dyn Source + Send + Sync>,
        action: Box<dyn Fn() + Send + Sync>,
        once: bool,
    ) -> Self {
        let inner = Arc::new_cyclic(|weak| SubscriptionInner {
            source,
            action,
            disposed: AtomicBool::new(false),
            once,
            me: AnyDependent::from_weak(weak),
        });
        inner.source.add_dependent(inner.me.clone());
        Self { inner }
    }

    fn deliver<T>(
        signal: Signal<T>,
        callback: impl FnMut(T) + Send + 'static,
        once: bool,
    ) -> Self
    where
        T: Clone + Send + Sync + 'static,
    {
        let callback = Mutex::new(callback);
        let action = {
            let signal = signal.clone();
            Box::new(move || {
                // a panic while reading propagates before the callback is locked, and one
                // inside the callback leaves it usable for the next notification
                let value = signal.get();
                let mut callback =
                    callback.lock().unwrap_or_else(PoisonError::into_inner);
                (*callback)(value);
            })
        };
        Self::register(Box::new(signal), action, once)
    }

    /// Calls `callback` with the signal's new value on every notification.
    ///
    /// ```
    /// # use signal_graph::{prelude::*, signal::Mutable, subscription::Subscription};
    /// # use std::sync::{Arc, Mutex};
    /// let count = Mutable::new(0);
    /// let seen = Arc::new(Mutex::new(Vec::new()));
    /// let subscription = Subscription::new(&count, {
    ///     let seen = Arc::clone(&seen);
    ///     move |n| seen.lock().unwrap().push(n)
    /// });
    ///
    /// count.set(1);
    /// subscription.dispose();
    /// count.set(2);
    /// assert_eq!(*seen.lock().unwrap(), vec![1]);
    /// ```
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(level = "trace", skip_all)
    )]
    pub fn new<T>(
        signal: impl Into<Signal<T>>,
        callback: impl FnMut(T) + Send + 'static,
    ) -> Self
    where
        T: Clone + Send + Sync + 'static,
    {
        Self::deliver(signal.into(), callback, false)
    }

    /// Calls `callback` for the next notification only, then disposes itself.
    ///
    /// The subscription is disposed before `callback` runs.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(level = "trace", skip_all)
    )]
    pub fn once<T>(
        signal: impl Into<Signal<T>>,
        callback: impl FnOnce(T) + Send + 'static,
    ) -> Self
    where
        T: Clone + Send + Sync + 'static,
    {
        let mut callback = Some(callback);
        Self::deliver(
            signal.into(),
            move |value| {
                if let Some(callback) = callback.take() {
                    callback(value);
                }
            },
            true,
        )
    }

    /// Sets `target` to every new value of `source`.
    ///
    /// The current value is not copied; `target` first changes on the next notification.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(level = "trace", skip_all)
    )]
    pub fn copy_to<T>(target: &Mutable<T>, source: impl Into<Signal<T>>) -> Self
    where
        T: Clone + Send + Sync + 'static,
    {
        let target = target.clone();
        Self::new(source, move |value| target.set(value))
    }

    /// Folds every new value of `source` into `target`, setting it to
    /// `step(&target, &source)`.
    ///
    /// ```
    /// # use signal_graph::{prelude::*, signal::Mutable, subscription::Subscription};
    /// let clicks = Mutable::new(());
    /// let total = Mutable::new(0);
    /// let _counting = Subscription::copy_step(&total, &clicks, |total, _| total + 1);
    ///
    /// clicks.set(());
    /// clicks.set(());
    /// assert_eq!(total.get(), 2);
    /// ```
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(level = "trace", skip_all)
    )]
    pub fn copy_step<T, S>(
        target: &Mutable<T>,
        source: impl Into<Signal<S>>,
        step: impl Fn(&T, &S) -> T + Send + 'static,
    ) -> Self
    where
        T: Send + Sync + 'static,
        S: Clone + Send + Sync + 'static,
    {
        let target = target.clone();
        Self::new(source, move |value: S| {
            target.step(|current| step(current, &value))
        })
    }

    /// Whether this subscription has been disposed.
    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.load(Ordering::Acquire)
    }
}

impl Dispose for Subscription {
    fn dispose(&self) {
        self.inner.dispose();
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.inner.dispose();
    }
}

impl Debug for Subscription {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        f.debug_struct("Subscription")
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

use crate::{
    signal::{Held, MutableInner, Signal},
    subscription::Subscription,
    traits::{Get, With},
};
use std::sync::{Arc, Weak};

/// Creates a signal that holds the most recent value of `source` which passed `predicate`.
///
/// The signal starts with the current value of `source` if it passes, or `initial` if it does
/// not. Values that fail the predicate are dropped without notifying.
///
/// Unlike [`map`](super::map) this signal is eager: it evaluates `predicate` for every
/// notification from `source`, whether or not anything reads it.
///
/// ```
/// # use signal_graph::{computed::filter, prelude::*, signal::Mutable};
/// let input = Mutable::new(3);
/// let even = filter(&input, 0, |n| n % 2 == 0);
/// assert_eq!(even.get(), 0);
///
/// input.set(4);
/// input.set(5);
/// assert_eq!(even.get(), 4);
/// ```
#[cfg_attr(feature = "tracing", tracing::instrument(level = "trace", skip_all))]
#[track_caller]
pub fn filter<T>(
    source: impl Into<Signal<T>>,
    initial: T,
    predicate: impl Fn(&T) -> bool + Send + 'static,
) -> Signal<T>
where
    T: Clone + Send + Sync + 'static,
{
    let source = source.into();
    let start = source
        .with(|value| predicate(value).then(|| value.clone()))
        .unwrap_or(initial);
    let value = Arc::new(MutableInner::new(start));

    let subscription = Subscription::new(&source, {
        let target = Arc::downgrade(&value);
        move |next: T| {
            if predicate(&next) {
                write(&target, next);
            }
        }
    });

    Signal::from_node(Arc::new(
        Held::new(value).with_subscription(subscription),
    ))
}

/// Creates a signal that holds whichever of `a` and `b` notified most recently.
///
/// The signal starts with the current value of `a`.
#[cfg_attr(feature = "tracing", tracing::instrument(level = "trace", skip_all))]
#[track_caller]
pub fn merge<T>(a: impl Into<Signal<T>>, b: impl Into<Signal<T>>) -> Signal<T>
where
    T: Clone + Send + Sync + 'static,
{
    let (a, b) = (a.into(), b.into());
    let value = Arc::new(MutableInner::new(a.get()));

    let forward = |source: &Signal<T>| {
        let target = Arc::downgrade(&value);
        Subscription::new(source, move |next: T| write(&target, next))
    };
    let (from_a, from_b) = (forward(&a), forward(&b));

    Signal::from_node(Arc::new(
        Held::new(value)
            .with_subscription(from_a)
            .with_subscription(from_b),
    ))
}

fn write<T>(target: &Weak<MutableInner<T>>, value: T) {
    if let Some(target) = target.upgrade() {
        target.set(value);
    }
}

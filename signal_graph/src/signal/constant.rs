use super::{Signal, SignalNode};
use crate::graph::{AnyDependent, Source};
use std::sync::Arc;

struct Constant<T>(T);

impl<T> Source for Constant<T> {
    fn add_dependent(&self, _dependent: AnyDependent) {}

    fn remove_dependent(&self, _dependent: &AnyDependent) {}

    fn has_dependencies(&self) -> bool {
        false
    }
}

impl<T: Send + Sync> SignalNode<T> for Constant<T> {
    fn with_value(&self, fun: &mut dyn FnMut(&T)) {
        fun(&self.0);
    }
}

/// Creates a signal that always holds `value` and never notifies.
///
/// Dependents can register with it, but they are not retained, since there is nothing to tell
/// them.
///
/// ```
/// # use signal_graph::{prelude::*, signal::constant};
/// let answer = constant(42);
/// assert_eq!(answer.get(), 42);
/// ```
#[track_caller]
pub fn constant<T>(value: T) -> Signal<T>
where
    T: Send + Sync + 'static,
{
    Signal::from_node(Arc::new(Constant(value)))
}

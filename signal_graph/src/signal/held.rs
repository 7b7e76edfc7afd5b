use super::{MutableInner, SignalNode};
use crate::{
    graph::{AnyDependent, Source},
    subscription::Subscription,
};
use futures::future::AbortHandle;
use std::sync::Arc;

/// A signal whose value is written by resources it owns: subscriptions to other signals, or a
/// spawned task feeding it from a stream.
///
/// Dropping the node disposes the subscriptions and aborts the task.
pub(crate) struct Held<T> {
    value: Arc<MutableInner<T>>,
    subscriptions: Vec<Subscription>,
    task: Option<AbortHandle>,
}

impl<T> Held<T> {
    pub(crate) fn new(value: Arc<MutableInner<T>>) -> Self {
        Self {
            value,
            subscriptions: Vec::new(),
            task: None,
        }
    }

    pub(crate) fn with_subscription(mut self, subscription: Subscription) -> Self {
        self.subscriptions.push(subscription);
        self
    }

    pub(crate) fn with_task(mut self, task: AbortHandle) -> Self {
        self.task = Some(task);
        self
    }
}

impl<T> Drop for Held<T> {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        // subscriptions dispose themselves when dropped
        self.subscriptions.clear();
    }
}

impl<T> Source for Held<T> {
    fn add_dependent(&self, dependent: AnyDependent) {
        self.value.add_dependent(dependent);
    }

    fn remove_dependent(&self, dependent: &AnyDependent) {
        self.value.remove_dependent(dependent);
    }

    fn has_dependencies(&self) -> bool {
        self.value.has_dependencies()
    }
}

impl<T: Send + Sync> SignalNode<T> for Held<T> {
    fn with_value(&self, fun: &mut dyn FnMut(&T)) {
        self.value.with_value(fun);
    }
}

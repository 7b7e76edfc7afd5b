use super::{Held, MutableInner, Signal};
use futures::{
    future::{AbortHandle, Abortable},
    pin_mut, Stream, StreamExt,
};
use std::sync::Arc;

/// Adapts a push-based event source into a signal.
///
/// The signal holds `initial` until the stream yields its first item, then holds the most
/// recent item, notifying dependents for every item. The stream is driven by a task spawned on
/// the current [`Executor`](any_spawner::Executor) as soon as the signal is created; dropping
/// the last handle to the signal aborts that task.
#[cfg_attr(feature = "tracing", tracing::instrument(level = "trace", skip_all))]
#[track_caller]
pub fn from_stream<T, St>(initial: T, stream: St) -> Signal<T>
where
    T: Send + Sync + 'static,
    St: Stream<Item = T> + Send + 'static,
{
    let (value, task, abort) = forward(initial, stream);
    crate::spawn(task);
    Signal::from_node(Arc::new(Held::new(value).with_task(abort)))
}

/// Like [`from_stream`], but drives the stream with
/// [`Executor::spawn_local`](any_spawner::Executor::spawn_local), so it does not need to be
/// `Send` and every item is applied on the thread that runs the local executor.
#[cfg_attr(feature = "tracing", tracing::instrument(level = "trace", skip_all))]
#[track_caller]
pub fn from_stream_local<T, St>(initial: T, stream: St) -> Signal<T>
where
    T: Send + Sync + 'static,
    St: Stream<Item = T> + 'static,
{
    let (value, task, abort) = forward(initial, stream);
    crate::spawn_local(task);
    Signal::from_node(Arc::new(Held::new(value).with_task(abort)))
}

fn forward<T, St>(
    initial: T,
    stream: St,
) -> (
    Arc<MutableInner<T>>,
    impl std::future::Future<Output = ()>,
    AbortHandle,
)
where
    T: Send + Sync + 'static,
    St: Stream<Item = T> + 'static,
{
    let value = Arc::new(MutableInner::new(initial));
    let (abort, registration) = AbortHandle::new_pair();
    let weak = Arc::downgrade(&value);

    let task = Abortable::new(
        async move {
            pin_mut!(stream);
            while let Some(next) = stream.next().await {
                match weak.upgrade() {
                    Some(value) => value.set(next),
                    None => break,
                }
            }
            #[cfg(feature = "tracing")]
            tracing::trace!("stream feeding signal has ended");
        },
        registration,
    );

    (value, async move { _ = task.await }, abort)
}

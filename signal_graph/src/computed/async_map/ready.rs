use super::IdleHandle;
use or_poisoned::OrPoisoned;
use std::{
    future::Future,
    pin::Pin,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
    task::{Context, Poll, Waker},
};

/// The number of computations of one async map that are in flight, and the tasks waiting for
/// that number to reach zero.
#[derive(Default)]
pub(crate) struct Loading {
    in_flight: AtomicUsize,
    wakers: Mutex<Vec<Waker>>,
}

impl Loading {
    pub(crate) fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    fn finish(&self) {
        if self.in_flight.fetch_sub(1, Ordering::SeqCst) == 1 {
            let wakers = std::mem::take(&mut *self.wakers.lock().or_poisoned());
            for waker in wakers {
                waker.wake();
            }
        }
    }
}

/// Held by a computation for as long as it is in flight.
///
/// Released on every exit path: completion, cancellation, a panic in the computation, or the
/// task being dropped.
pub(crate) struct InFlight {
    loading: Arc<Loading>,
    _idle: Option<IdleHandle>,
}

impl InFlight {
    pub(crate) fn begin(loading: &Arc<Loading>, idle: Option<IdleHandle>) -> Self {
        loading.in_flight.fetch_add(1, Ordering::SeqCst);
        Self {
            loading: Arc::clone(loading),
            _idle: idle,
        }
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.loading.finish();
    }
}

/// A future that resolves once no computation of an async map is in flight.
#[must_use = "futures do nothing unless polled"]
pub struct AsyncReady {
    pub(crate) loading: Arc<Loading>,
}

impl Future for AsyncReady {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.loading.in_flight() == 0 {
            return Poll::Ready(());
        }

        {
            let mut wakers = self.loading.wakers.lock().or_poisoned();
            if !wakers.iter().any(|waker| waker.will_wake(cx.waker())) {
                wakers.push(cx.waker().clone());
            }
        }

        if self.loading.in_flight() == 0 {
            Poll::Ready(())
        } else {
            Poll::Pending
        }
    }
}

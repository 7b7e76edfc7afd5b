use or_poisoned::OrPoisoned;
use pin_project_lite::pin_project;
use slotmap::{DefaultKey, SlotMap};
use std::{
    fmt::Debug,
    future::Future,
    pin::Pin,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
    task::{Context, Poll},
};

/// A shared flag that cancels asynchronous computations.
///
/// Once cancelled, a token stays cancelled: every computation that is in flight is abandoned,
/// and every later computation launched with the same token is never started. Cloning a token
/// yields another handle to the same flag.
#[derive(Clone, Default)]
pub struct CancellationToken {
    inner: Arc<TokenInner>,
}

#[derive(Default)]
struct TokenInner {
    cancelled: AtomicBool,
    wakers: Mutex<SlotMap<DefaultKey, std::task::Waker>>,
}

impl CancellationToken {
    /// Creates a token that has not been cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancels the token, waking everything waiting on [`cancelled`](Self::cancelled).
    pub fn cancel(&self) {
        if !self.inner.cancelled.swap(true, Ordering::SeqCst) {
            #[cfg(feature = "tracing")]
            tracing::trace!("cancellation token cancelled");
            let wakers = std::mem::take(&mut *self.inner.wakers.lock().or_poisoned());
            for (_, waker) in wakers {
                waker.wake();
            }
        }
    }

    /// Whether [`cancel`](Self::cancel) has been called on any handle to this token.
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Returns a future that resolves once the token is cancelled.
    pub fn cancelled(&self) -> Cancelled {
        Cancelled {
            token: self.clone(),
            key: None,
        }
    }
}

impl Debug for CancellationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancellationToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

/// Future returned by [`CancellationToken::cancelled`].
#[must_use = "futures do nothing unless polled"]
pub struct Cancelled {
    token: CancellationToken,
    key: Option<DefaultKey>,
}

impl Future for Cancelled {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        let this = self.get_mut();
        if this.token.is_cancelled() {
            return Poll::Ready(());
        }

        {
            let mut wakers = this.token.inner.wakers.lock().or_poisoned();
            match this.key.filter(|key| wakers.contains_key(*key)) {
                Some(key) => wakers[key].clone_from(cx.waker()),
                None => this.key = Some(wakers.insert(cx.waker().clone())),
            }
        }

        // cancel() may have drained the wakers before ours was registered
        if this.token.is_cancelled() {
            Poll::Ready(())
        } else {
            Poll::Pending
        }
    }
}

impl Drop for Cancelled {
    fn drop(&mut self) {
        if let Some(key) = self.key.take() {
            self.token.inner.wakers.lock().or_poisoned().remove(key);
        }
    }
}

pin_project! {
    /// Runs a future unless the token is cancelled first.
    ///
    /// Resolves to `None` if the token is cancelled before the future completes, or at the
    /// moment it completes.
    pub(crate) struct Cancellable<Fut> {
        cancelled: Cancelled,
        #[pin]
        fut: Fut,
    }
}

impl<Fut> Cancellable<Fut> {
    pub(crate) fn new(token: &CancellationToken, fut: Fut) -> Self {
        Self {
            cancelled: token.cancelled(),
            fut,
        }
    }
}

impl<Fut> Future for Cancellable<Fut>
where
    Fut: Future,
{
    type Output = Option<Fut::Output>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();
        if Pin::new(&mut *this.cancelled).poll(cx).is_ready() {
            return Poll::Ready(None);
        }
        match this.fut.poll(cx) {
            Poll::Ready(_) if this.cancelled.token.is_cancelled() => {
                Poll::Ready(None)
            }
            Poll::Ready(value) => Poll::Ready(Some(value)),
            Poll::Pending => Poll::Pending,
        }
    }
}

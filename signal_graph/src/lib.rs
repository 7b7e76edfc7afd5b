//! A reactive state-propagation library for binding user interfaces to a model.
//!
//! The graph is built from a few kinds of nodes:
//! 1. **Mutables**: settable value cells, the leaf sources of every change.
//! 2. **Signals**: read-only observable values. Every node can be viewed as a
//!    [`Signal`](signal::Signal); derived signals are built with the combinators in [`computed`]
//!    (`map`, `map2`, `cache`, `map_async`, ...).
//! 3. **Subscriptions**: disposable registrations that run a side effect (a callback, or a copy
//!    into another mutable) every time a signal changes.
//! 4. **Commands**: actions a view can execute, enabled by a boolean signal, which are also
//!    signals of their own execution history.
//!
//! ```rust
//! use signal_graph::{
//!     computed::map,
//!     prelude::*,
//!     signal::Mutable,
//!     subscription::Subscription,
//! };
//! use std::sync::{Arc, Mutex};
//!
//! let count = Mutable::new(5);
//! let doubled = map(&count, |n| n * 2);
//!
//! let seen = Arc::new(Mutex::new(Vec::new()));
//! let _subscription = Subscription::new(&doubled, {
//!     let seen = Arc::clone(&seen);
//!     move |value| seen.lock().unwrap().push(value)
//! });
//!
//! // every set notifies, even when the value does not change
//! count.set(7);
//! count.set(7);
//! assert_eq!(*seen.lock().unwrap(), vec![14, 14]);
//! ```
//!
//! ## Propagation model
//! Setting a mutable synchronously notifies everything that depends on it before `set` returns.
//! Derived signals do not recompute when notified: they remember that they are stale, pass the
//! notification on, and recompute at most once, on the next read.
//!
//! Nothing is deduplicated. A mutable set to the value it already holds notifies, and a command
//! executed twice with the same parameter notifies twice. Hosts that re-trigger animations or
//! similar effects on every notification can rely on this.
//!
//! The graph must be acyclic. All nodes are `Send + Sync`; hosts with a single UI thread should
//! perform every `set` on that thread, and use the `_local` variants of the asynchronous
//! combinators so that results are applied there too.
//!
//! ## Asynchronous work
//! [`map_async`](computed::map_async) and friends spawn their work through
//! [`any_spawner::Executor`], which must be initialized once per process (for example with
//! `Executor::init_tokio()`).

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::{fmt::Arguments, future::Future};

pub mod command;
pub mod computed;
mod error;
pub mod graph;
pub mod signal;
pub mod subscription;
pub mod traits;

pub use error::*;

/// Reexports frequently-used traits.
pub mod prelude {
    pub use crate::{graph::Source, traits::*};
}

#[allow(unused)]
#[doc(hidden)]
pub fn log_warning(text: Arguments) {
    #[cfg(feature = "tracing")]
    {
        tracing::warn!("{}", text);
    }
    #[cfg(not(feature = "tracing"))]
    {
        eprintln!("{}", text);
    }
}

/// Spawns a thread-safe task with [`Executor::spawn`](any_spawner::Executor::spawn).
pub fn spawn(task: impl Future<Output = ()> + Send + 'static) {
    any_spawner::Executor::spawn(task);
}

/// Spawns a task on the current thread with
/// [`Executor::spawn_local`](any_spawner::Executor::spawn_local).
pub fn spawn_local(task: impl Future<Output = ()> + 'static) {
    any_spawner::Executor::spawn_local(task);
}

//! The dependency-tracking core: sources, dependents, and the per-node tracker that connects
//! them.
//!
//! Every node that produces a value owns a [`DependencyTracker`]. Anything that wants to hear
//! about changes to that value (a derived signal, a [`Subscription`](crate::subscription::Subscription),
//! a [`Command`](crate::command::Command)) implements [`Dependent`] and registers itself with
//! the node through [`Source::add_dependent`].
//!
//! The graph is expected to be acyclic. A dependent that, directly or transitively, causes its
//! own source to signal while it is being refreshed produces unbounded recursion; this is not
//! detected.

mod dependent;
mod source;
mod tracker;

pub use dependent::*;
pub use source::*;
pub use tracker::*;

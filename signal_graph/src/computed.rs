//! Signals derived from other signals.

mod async_map;
mod cache;
mod combine;
mod map;

pub use async_map::*;
pub use cache::*;
pub use combine::*;
pub use map::*;

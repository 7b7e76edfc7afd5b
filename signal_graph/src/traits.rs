//! Traits shared by every node in the graph.
//!
//! ## Metadata
//! - [`DefinedAt`] reports where a node was created, for debugging.
//!
//! ## Access
//! | Trait    | Mode          | Description                                                   |
//! |----------|---------------|---------------------------------------------------------------|
//! | [`With`] | `fn(&T) -> U` | Applies a closure to the current value and returns the result. |
//! | [`Get`]  | `T`           | Clones the current value. Implemented for every [`With`].      |
//!
//! ## Update
//! | Trait       | Mode         | Description                                                   |
//! |-------------|--------------|---------------------------------------------------------------|
//! | [`Trigger`] | `fn()`       | Notifies dependents without changing the value.                |
//! | [`Update`]  | `fn(&mut T)` | Mutates the value in place, then notifies dependents.          |
//! | [`Set`]     | `T`          | Replaces the value, then notifies dependents.                  |
//!
//! None of the update traits compare the old and new values: every call notifies.

use std::panic::Location;

/// Builds the panic handler used by infallible accessors when a value cannot be reached.
#[macro_export]
macro_rules! unwrap_signal {
    ($signal:ident) => {{
        #[cfg(debug_assertions)]
        let location = std::panic::Location::caller();
        || {
            #[cfg(debug_assertions)]
            {
                panic!(
                    "{}",
                    $crate::traits::panic_getting_disposed_signal(
                        $signal.defined_at(),
                        location
                    )
                );
            }
            #[cfg(not(debug_assertions))]
            {
                panic!(
                    "Tried to access a reactive value that is no longer \
                     available."
                );
            }
        }
    }};
}

/// Releases whatever registrations a handle holds. Calling it more than once is a no-op.
pub trait Dispose {
    /// Disposes of the handle.
    fn dispose(&self);
}

/// Notifies dependents that the value has changed.
pub trait Trigger {
    /// Notifies dependents.
    fn trigger(&self);
}

/// Gives access to the current value by reference.
pub trait With: DefinedAt {
    /// The type of the value.
    type Value: ?Sized;

    /// Applies the closure to the current value, returning `None` if it cannot be reached.
    fn try_with<U>(&self, fun: impl FnOnce(&Self::Value) -> U) -> Option<U>;

    /// Applies the closure to the current value.
    ///
    /// # Panics
    /// Panics if the value cannot be reached.
    #[track_caller]
    fn with<U>(&self, fun: impl FnOnce(&Self::Value) -> U) -> U {
        self.try_with(fun).unwrap_or_else(unwrap_signal!(self))
    }
}

/// Clones the current value.
pub trait Get: DefinedAt {
    /// The type of the value.
    type Value: Clone;

    /// Clones the current value, returning `None` if it cannot be reached.
    fn try_get(&self) -> Option<Self::Value>;

    /// Clones the current value.
    ///
    /// # Panics
    /// Panics if the value cannot be reached.
    #[track_caller]
    fn get(&self) -> Self::Value {
        self.try_get().unwrap_or_else(unwrap_signal!(self))
    }
}

impl<T> Get for T
where
    T: With,
    T::Value: Clone,
{
    type Value = <T as With>::Value;

    #[track_caller]
    fn try_get(&self) -> Option<Self::Value> {
        self.try_with(Self::Value::clone)
    }
}

/// Mutates the value in place and notifies dependents.
pub trait Update {
    /// The type of the value.
    type Value;

    /// Applies the closure to the value, then notifies dependents.
    fn update(&self, fun: impl FnOnce(&mut Self::Value));
}

/// Replaces the value and notifies dependents.
pub trait Set {
    /// The type of the value.
    type Value;

    /// Replaces the value, then notifies dependents, whether or not the value changed.
    fn set(&self, value: impl Into<Self::Value>);
}

/// Reports where a node was defined, in debug builds.
pub trait DefinedAt {
    /// Returns the location at which the node was defined, if available.
    fn defined_at(&self) -> Option<&'static Location<'static>>;
}

#[doc(hidden)]
pub fn panic_getting_disposed_signal(
    defined_at: Option<&'static Location<'static>>,
    location: &'static Location<'static>,
) -> String {
    if let Some(defined_at) = defined_at {
        format!(
            "At {location}, you tried to access a reactive value which was \
             defined at {defined_at}, but it is no longer available."
        )
    } else {
        format!(
            "At {location}, you tried to access a reactive value, but it is \
             no longer available."
        )
    }
}

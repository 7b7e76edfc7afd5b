//! Actions that a view can execute, which are also signals of their own execution history.

mod state;

pub use state::*;

use crate::{
    graph::{AnyDependent, Dependent, DependencyTracker, Source},
    log_warning,
    signal::{constant, Signal, SignalNode},
    subscription::Subscription,
    traits::{DefinedAt, Dispose, Get, With},
    ExecuteError,
};
use core::fmt::{Debug, Formatter, Result};
use or_poisoned::OrPoisoned;
use std::{
    any::{type_name, Any},
    panic::Location,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, RwLock,
    },
    time::Instant,
};

/// An action that a view can execute, enabled or disabled by a boolean signal.
///
/// A command plays two roles:
/// - It is **executable**: [`execute`](Self::execute) records an execution if the enablement
///   signal is currently `true`. Whenever the enablement signal changes,
///   [`can_execute_changed`](Self::can_execute_changed) notifies, whether or not the command
///   has ever been executed.
/// - It is a **signal of its [`CommandState`]**: every execution stores the time and parameter
///   and notifies dependents. Executing twice with the same parameter notifies twice.
///
/// Dropping the command disposes it, and disposing it unregisters it from the enablement signal
/// and releases everything registered with it. Executing a disposed command does nothing.
///
/// ```
/// # use signal_graph::{command::Command, prelude::*, signal::Mutable};
/// let valid = Mutable::new(false);
/// let save = Command::<()>::new(&valid);
///
/// assert!(!save.execute(()));
/// assert!(!save.state().is_executed());
///
/// valid.set(true);
/// assert!(save.execute(()));
/// assert!(save.state().is_executed());
/// ```
pub struct Command<P = ()> {
    #[cfg(debug_assertions)]
    defined_at: &'static Location<'static>,
    inner: Arc<CommandInner<P>>,
}

struct CommandInner<P> {
    state: RwLock<CommandState<P>>,
    tracker: DependencyTracker,
    enablement: Arc<Enablement>,
    disposed: AtomicBool,
    me: AnyDependent,
}

/// The enablement half of a command, viewed as a signal of whether the command can execute.
struct Enablement {
    enabled: Signal<bool>,
    tracker: DependencyTracker,
}

impl<P> CommandInner<P> {
    fn dispose(&self) {
        if !self.disposed.swap(true, Ordering::AcqRel) {
            #[cfg(feature = "tracing")]
            tracing::trace!("disposing command");
            self.enablement.enabled.remove_dependent(&self.me);
            self.enablement.tracker.clear();
            self.tracker.clear();
        }
    }

    fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }
}

impl<P> Dependent for CommandInner<P> {
    fn refresh(&self) {
        if !self.is_disposed() {
            self.enablement.tracker.signal();
        }
    }

    fn has_dependents(&self) -> bool {
        self.enablement.tracker.has_dependencies()
    }
}

impl<P> Source for CommandInner<P> {
    fn add_dependent(&self, dependent: AnyDependent) {
        self.tracker.add(dependent);
    }

    fn remove_dependent(&self, dependent: &AnyDependent) {
        self.tracker.remove(dependent);
    }

    fn has_dependencies(&self) -> bool {
        self.tracker.has_dependencies()
    }
}

impl<P: Send + Sync> SignalNode<CommandState<P>> for CommandInner<P> {
    fn with_value(&self, fun: &mut dyn FnMut(&CommandState<P>)) {
        fun(&self.state.read().or_poisoned());
    }
}

impl Source for Enablement {
    fn add_dependent(&self, dependent: AnyDependent) {
        self.tracker.add(dependent);
    }

    fn remove_dependent(&self, dependent: &AnyDependent) {
        self.tracker.remove(dependent);
    }

    fn has_dependencies(&self) -> bool {
        self.tracker.has_dependencies()
    }
}

impl SignalNode<bool> for Enablement {
    fn with_value(&self, fun: &mut dyn FnMut(&bool)) {
        self.enabled.inner.with_value(fun);
    }
}

impl<P> Command<P>
where
    P: Send + Sync + 'static,
{
    /// Creates a command that can execute whenever `enabled` is `true`.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(level = "trace", skip_all)
    )]
    #[track_caller]
    pub fn new(enabled: impl Into<Signal<bool>>) -> Self {
        let enablement = Arc::new(Enablement {
            enabled: enabled.into(),
            tracker: DependencyTracker::new(),
        });
        let inner = Arc::new_cyclic(|weak| CommandInner {
            state: RwLock::new(CommandState::Unexecuted),
            tracker: DependencyTracker::new(),
            enablement,
            disposed: AtomicBool::new(false),
            me: AnyDependent::from_weak(weak),
        });
        inner.enablement.enabled.add_dependent(inner.me.clone());
        Self {
            #[cfg(debug_assertions)]
            defined_at: Location::caller(),
            inner,
        }
    }

    /// Creates a command that can always execute.
    #[track_caller]
    pub fn new_enabled() -> Self {
        Self::new(constant(true))
    }

    /// Whether the command can currently execute.
    pub fn can_execute(&self) -> bool {
        !self.inner.is_disposed() && self.inner.enablement.enabled.get()
    }

    /// Returns a signal of whether the command can execute.
    ///
    /// It notifies every time the enablement signal notifies.
    #[track_caller]
    pub fn can_execute_changed(&self) -> Signal<bool> {
        Signal::from_node(
            Arc::clone(&self.inner.enablement) as Arc<dyn SignalNode<bool>>
        )
    }

    /// Returns a type-erased handle to the command's execution state.
    #[track_caller]
    pub fn signal(&self) -> Signal<CommandState<P>> {
        Signal::from_node(
            Arc::clone(&self.inner) as Arc<dyn SignalNode<CommandState<P>>>
        )
    }

    /// Records an execution with `parameter` and notifies dependents.
    ///
    /// # Errors
    /// Fails without recording anything if the command is disabled or has been disposed.
    pub fn try_execute(&self, parameter: P) -> std::result::Result<(), ExecuteError> {
        if self.inner.is_disposed() {
            if cfg!(debug_assertions) {
                log_warning(format_args!(
                    "tried to execute a command after it was disposed{}",
                    self.defined_at()
                        .map(|at| format!(" (defined at {at})"))
                        .unwrap_or_default()
                ));
            }
            return Err(ExecuteError::Disposed);
        }
        if !self.can_execute() {
            return Err(ExecuteError::Disabled);
        }

        *self.inner.state.write().or_poisoned() = CommandState::Executed {
            at: Instant::now(),
            parameter,
        };
        self.inner.tracker.signal();
        Ok(())
    }

    /// Executes the command if it can execute. Returns whether it did.
    pub fn execute(&self, parameter: P) -> bool {
        match self.try_execute(parameter) {
            Ok(()) => true,
            Err(_err) => {
                #[cfg(feature = "tracing")]
                tracing::debug!(error = %_err, "command execution ignored");
                false
            }
        }
    }

    /// Executes the command with a parameter of unknown type.
    ///
    /// `None` stands for "no parameter", which only a `Command<()>` accepts.
    ///
    /// # Errors
    /// Fails with [`ExecuteError::ParameterMismatch`] if the parameter is not a `P`, and
    /// otherwise as [`try_execute`](Self::try_execute) does.
    pub fn try_execute_untyped(
        &self,
        parameter: Option<&dyn Any>,
    ) -> std::result::Result<(), ExecuteError>
    where
        P: Clone,
    {
        let parameter: &dyn Any = parameter.unwrap_or(&());
        match parameter.downcast_ref::<P>() {
            Some(parameter) => self.try_execute(parameter.clone()),
            None => Err(ExecuteError::ParameterMismatch {
                expected: type_name::<P>(),
            }),
        }
    }

    /// Executes the command with a parameter of unknown type, as a view with untyped inputs
    /// would. A parameter that is not a `P` is ignored. Returns whether the command executed.
    pub fn execute_untyped(&self, parameter: Option<&dyn Any>) -> bool
    where
        P: Clone,
    {
        match self.try_execute_untyped(parameter) {
            Ok(()) => true,
            Err(_err) => {
                #[cfg(feature = "tracing")]
                tracing::debug!(error = %_err, "command execution ignored");
                false
            }
        }
    }

    /// Calls `callback` with the time of every execution.
    ///
    /// ```
    /// # use signal_graph::{command::Command, prelude::*};
    /// # use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
    /// let refresh = Command::<()>::new_enabled();
    /// let count = Arc::new(AtomicUsize::new(0));
    /// let _listener = refresh.on_executed({
    ///     let count = Arc::clone(&count);
    ///     move |_at| {
    ///         count.fetch_add(1, Ordering::Relaxed);
    ///     }
    /// });
    ///
    /// refresh.execute(());
    /// refresh.execute(());
    /// assert_eq!(count.load(Ordering::Relaxed), 2);
    /// ```
    pub fn on_executed(
        &self,
        mut callback: impl FnMut(Instant) + Send + 'static,
    ) -> Subscription
    where
        P: Clone,
    {
        self.on_executed_with(move |at, _| callback(at))
    }

    /// Calls `callback` with the time and parameter of every execution.
    pub fn on_executed_with(
        &self,
        mut callback: impl FnMut(Instant, P) + Send + 'static,
    ) -> Subscription
    where
        P: Clone,
    {
        Subscription::new(self.signal(), move |state: CommandState<P>| {
            if let CommandState::Executed { at, parameter } = state {
                callback(at, parameter);
            }
        })
    }
}

impl<P> Command<P>
where
    P: Clone + Send + Sync + 'static,
{
    /// Returns a clone of the current execution state.
    pub fn state(&self) -> CommandState<P> {
        self.inner.state.read().or_poisoned().clone()
    }
}

impl<P> Dispose for Command<P> {
    fn dispose(&self) {
        self.inner.dispose();
    }
}

impl<P> Drop for Command<P> {
    fn drop(&mut self) {
        self.inner.dispose();
    }
}

impl<P> Debug for Command<P> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        f.debug_struct("Command")
            .field("parameter", &type_name::<P>())
            .field("disposed", &self.inner.is_disposed())
            .finish()
    }
}

impl<P> DefinedAt for Command<P> {
    #[inline(always)]
    fn defined_at(&self) -> Option<&'static Location<'static>> {
        #[cfg(debug_assertions)]
        {
            Some(self.defined_at)
        }
        #[cfg(not(debug_assertions))]
        {
            None
        }
    }
}

impl<P> Source for Command<P> {
    fn add_dependent(&self, dependent: AnyDependent) {
        self.inner.add_dependent(dependent);
    }

    fn remove_dependent(&self, dependent: &AnyDependent) {
        self.inner.remove_dependent(dependent);
    }

    fn has_dependencies(&self) -> bool {
        self.inner.has_dependencies()
    }
}

impl<P> With for Command<P> {
    type Value = CommandState<P>;

    fn try_with<U>(&self, fun: impl FnOnce(&CommandState<P>) -> U) -> Option<U> {
        Some(fun(&self.inner.state.read().or_poisoned()))
    }
}

impl<P: Send + Sync + 'static> From<&Command<P>> for Signal<CommandState<P>> {
    #[track_caller]
    fn from(value: &Command<P>) -> Self {
        value.signal()
    }
}

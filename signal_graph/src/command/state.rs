use std::time::Instant;

/// The execution history of a [`Command`](super::Command).
///
/// A command starts out `Unexecuted` and moves to `Executed` on every execution. It never moves
/// back; create a new command to start over.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CommandState<P = ()> {
    /// The command has never been executed.
    Unexecuted,
    /// The command was most recently executed at `at`, with `parameter`.
    Executed {
        /// When the execution happened.
        at: Instant,
        /// The parameter the command was executed with.
        parameter: P,
    },
}

impl<P> CommandState<P> {
    /// Whether the command has been executed at least once.
    pub fn is_executed(&self) -> bool {
        matches!(self, CommandState::Executed { .. })
    }

    /// When the command was last executed.
    pub fn executed_at(&self) -> Option<Instant> {
        match self {
            CommandState::Executed { at, .. } => Some(*at),
            CommandState::Unexecuted => None,
        }
    }

    /// The parameter of the last execution.
    pub fn parameter(&self) -> Option<&P> {
        match self {
            CommandState::Executed { parameter, .. } => Some(parameter),
            CommandState::Unexecuted => None,
        }
    }
}

impl<P> Default for CommandState<P> {
    fn default() -> Self {
        CommandState::Unexecuted
    }
}

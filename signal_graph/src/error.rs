use thiserror::Error;

/// Reasons a [`Command`](crate::command::Command) did not execute.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecuteError {
    /// The command's enablement signal is currently `false`.
    #[error("the command is disabled")]
    Disabled,
    /// The untyped parameter could not be converted to the command's parameter type.
    #[error("expected a command parameter of type `{expected}`")]
    ParameterMismatch {
        /// The name of the expected parameter type.
        expected: &'static str,
    },
    /// The command has already been disposed.
    #[error("the command has already been disposed")]
    Disposed,
}

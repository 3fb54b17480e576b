use thiserror::Error;

#[derive(Error, Debug)]
pub enum CommandError {
    /// The command could not be started or exited non-zero. `kind` names the
    /// underlying error type, `trace` is the stack captured at failure.
    #[error("command `{command}` failed ({kind}): {message}\n{trace}")]
    Failed {
        command: String,
        kind: String,
        message: String,
        trace: String,
    },
}

impl CommandError {
    /// Failure of a preparatory step (writing inputs, resolving paths)
    /// that belongs to running `command`.
    pub fn from_error<E: std::error::Error>(command: impl Into<String>, err: &E) -> Self {
        Self::Failed {
            command: command.into(),
            kind: std::any::type_name::<E>().to_string(),
            message: err.to_string(),
            trace: std::backtrace::Backtrace::force_capture().to_string(),
        }
    }

    pub fn command(&self) -> &str {
        match self {
            Self::Failed { command, .. } => command,
        }
    }
}

/// Captured result of a successful command.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Runs a shell command line to completion.
///
/// Blocks until the process exits. Exit code 0 is success; anything else
/// is a [`CommandError`].
pub trait CommandRunner: Send + Sync {
    fn run(&self, command_line: &str) -> Result<CommandOutput, CommandError>;
}

impl<R: CommandRunner + ?Sized> CommandRunner for &R {
    fn run(&self, command_line: &str) -> Result<CommandOutput, CommandError> {
        (**self).run(command_line)
    }
}

impl<R: CommandRunner + ?Sized> CommandRunner for Box<R> {
    fn run(&self, command_line: &str) -> Result<CommandOutput, CommandError> {
        (**self).run(command_line)
    }
}

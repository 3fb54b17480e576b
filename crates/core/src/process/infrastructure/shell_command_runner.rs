use std::backtrace::Backtrace;
use std::sync::Arc;

use crate::process::domain::command_logger::{CommandLogger, LogCommandLogger};
use crate::process::domain::command_runner::{CommandError, CommandOutput, CommandRunner};
use crate::process::shell::shell_command;

/// Runs command lines through the platform shell (`sh -c` / `cmd /C`),
/// capturing stdout and stderr.
#[derive(Clone)]
pub struct ShellCommandRunner {
    logger: Arc<dyn CommandLogger>,
}

impl ShellCommandRunner {
    pub fn new(logger: Arc<dyn CommandLogger>) -> Self {
        Self { logger }
    }

    fn failure(&self, command_line: &str, kind: &str, message: String) -> CommandError {
        let err = CommandError::Failed {
            command: command_line.to_string(),
            kind: kind.to_string(),
            message,
            trace: Backtrace::force_capture().to_string(),
        };
        self.logger.command_failed(command_line, &err.to_string());
        err
    }
}

impl Default for ShellCommandRunner {
    fn default() -> Self {
        Self::new(Arc::new(LogCommandLogger))
    }
}

impl CommandRunner for ShellCommandRunner {
    fn run(&self, command_line: &str) -> Result<CommandOutput, CommandError> {
        self.logger.command_started(command_line);

        let output = shell_command(command_line).output().map_err(|e| {
            self.failure(
                command_line,
                std::any::type_name::<std::io::Error>(),
                format!("failed to start shell: {e}"),
            )
        })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if !output.status.success() {
            let code = output
                .status
                .code()
                .map_or_else(|| "signal".to_string(), |c| c.to_string());
            return Err(self.failure(
                command_line,
                std::any::type_name::<std::process::ExitStatus>(),
                format!("exit status {code}: {}", stderr.trim()),
            ));
        }

        Ok(CommandOutput { stdout, stderr })
    }
}

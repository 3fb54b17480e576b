use std::io::{self, Write};
use std::process::{Child, ChildStdin, ExitStatus, Stdio};

use crate::process::domain::byte_sink::{ByteSink, SinkExit};
use crate::process::shell::shell_command;

/// Feeds bytes into the standard input of a shell-spawned process.
///
/// The child's stdout and stderr are inherited. Writes block when the pipe
/// buffer is full.
pub struct ChildProcessSink {
    command_line: String,
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    exit: Option<SinkExit>,
}

impl ChildProcessSink {
    pub fn spawn(command_line: &str) -> io::Result<Self> {
        log::info!(command = command_line; "Spawning piped process: {command_line}");
        let mut child = shell_command(command_line).stdin(Stdio::piped()).spawn()?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| io::Error::new(io::ErrorKind::BrokenPipe, "child stdin not captured"))?;

        Ok(Self {
            command_line: command_line.to_string(),
            child: Some(child),
            stdin: Some(stdin),
            exit: None,
        })
    }

    pub fn command_line(&self) -> &str {
        &self.command_line
    }
}

fn to_sink_exit(status: ExitStatus) -> SinkExit {
    match status.code() {
        Some(0) => SinkExit::Success,
        Some(code) => SinkExit::Code(code),
        None => SinkExit::Terminated,
    }
}

impl ByteSink for ChildProcessSink {
    fn write_bytes(&mut self, bytes: &[u8]) -> io::Result<()> {
        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::BrokenPipe, "process input closed"))?;
        stdin.write_all(bytes)
    }

    fn finish(&mut self) -> io::Result<SinkExit> {
        if let Some(exit) = self.exit {
            return Ok(exit);
        }

        // Dropping stdin sends EOF to the child.
        if let Some(mut stdin) = self.stdin.take() {
            if let Err(e) = stdin.flush() {
                log::debug!("Flushing process input failed: {e}");
            }
        }

        match self.child.take() {
            Some(mut child) => self.settle(child.wait()),
            None => self.settle_exit(SinkExit::Success),
        }
    }
}

impl ChildProcessSink {
    /// Records the wait outcome so later `finish` calls repeat it. A failed
    /// wait leaves the exit unknown and is remembered as `Terminated`.
    fn settle(&mut self, waited: io::Result<ExitStatus>) -> io::Result<SinkExit> {
        match waited {
            Ok(status) => self.settle_exit(to_sink_exit(status)),
            Err(e) => {
                log::warn!("Waiting for piped process failed: {e}");
                self.exit = Some(SinkExit::Terminated);
                Err(e)
            }
        }
    }

    fn settle_exit(&mut self, exit: SinkExit) -> io::Result<SinkExit> {
        log::debug!("Piped process exited: {exit:?}");
        self.exit = Some(exit);
        Ok(exit)
    }
}

impl Drop for ChildProcessSink {
    fn drop(&mut self) {
        if self.exit.is_none() {
            if let Err(e) = self.finish() {
                log::warn!("Failed to wait for piped process: {e}");
            }
        }
    }
}

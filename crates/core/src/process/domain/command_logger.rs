use std::sync::Mutex;

/// Logging capability for external command execution.
///
/// Injected into runners so callers decide where command traces go (the
/// `log` facade, a test recorder, nowhere) without touching the runner.
pub trait CommandLogger: Send + Sync {
    /// Called once before a command starts.
    fn command_started(&self, command: &str);

    /// Called when a command could not be spawned or exited non-zero.
    /// `detail` is the full diagnostic text returned to the caller.
    fn command_failed(&self, command: &str, detail: &str);
}

/// Silent logger that discards all events.
pub struct NullCommandLogger;

impl CommandLogger for NullCommandLogger {
    fn command_started(&self, _command: &str) {}
    fn command_failed(&self, _command: &str, _detail: &str) {}
}

/// Forwards command events to the `log` facade: info on start, error on
/// failure, with the command text as a structured field.
#[derive(Default)]
pub struct LogCommandLogger;

impl CommandLogger for LogCommandLogger {
    fn command_started(&self, command: &str) {
        log::info!(command = command; "Running command: {command}");
    }

    fn command_failed(&self, command: &str, detail: &str) {
        log::error!(command = command, detail = detail; "{detail}");
    }
}

/// Severity of a recorded command event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Info,
    Error,
}

/// Keeps every event in memory. Useful when a caller wants to report the
/// commands a batch ran, and in tests.
#[derive(Default)]
pub struct RecordingCommandLogger {
    events: Mutex<Vec<(Severity, String)>>,
}

impl RecordingCommandLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of recorded `(severity, message)` pairs in arrival order.
    pub fn events(&self) -> Vec<(Severity, String)> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    fn push(&self, severity: Severity, message: String) {
        if let Ok(mut events) = self.events.lock() {
            events.push((severity, message));
        }
    }
}

impl CommandLogger for RecordingCommandLogger {
    fn command_started(&self, command: &str) {
        self.push(Severity::Info, command.to_string());
    }

    fn command_failed(&self, _command: &str, detail: &str) {
        self.push(Severity::Error, detail.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_logger_all_methods_are_noop() {
        let logger = NullCommandLogger;
        logger.command_started("ffmpeg -version");
        logger.command_failed("ffmpeg -version", "boom");
    }

    #[test]
    fn test_log_logger_does_not_panic_without_backend() {
        let logger = LogCommandLogger;
        logger.command_started("ls");
        logger.command_failed("ls", "exit 2");
    }

    #[test]
    fn test_recording_logger_keeps_order_and_severity() {
        let logger = RecordingCommandLogger::new();
        logger.command_started("first");
        logger.command_failed("first", "first failed");
        logger.command_started("second");

        let events = logger.events();
        assert_eq!(
            events,
            vec![
                (Severity::Info, "first".to_string()),
                (Severity::Error, "first failed".to_string()),
                (Severity::Info, "second".to_string()),
            ]
        );
    }
}

use std::io;

/// How a sink's consumer ended once input was closed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SinkExit {
    Success,
    /// Consumer exited with a non-zero code.
    Code(i32),
    /// Consumer was terminated without an exit code (e.g. by a signal).
    Terminated,
}

impl SinkExit {
    pub fn success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

/// A streaming consumer reached through a byte pipe.
///
/// Bytes are delivered in call order. `finish` closes the input side and
/// blocks until the consumer is done; calling it again returns the same
/// outcome without further effect.
pub trait ByteSink: Send {
    fn write_bytes(&mut self, bytes: &[u8]) -> io::Result<()>;

    fn finish(&mut self) -> io::Result<SinkExit>;
}

/// Sink that collects everything written into memory.
#[derive(Debug)]
pub struct MemorySink {
    bytes: Vec<u8>,
    writes: usize,
    finished: bool,
    exit: SinkExit,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::with_exit(SinkExit::Success)
    }

    /// A sink whose `finish` reports `exit`, for simulating consumer failures.
    pub fn with_exit(exit: SinkExit) -> Self {
        Self {
            bytes: Vec::new(),
            writes: 0,
            finished: false,
            exit,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Number of `write_bytes` calls received.
    pub fn writes(&self) -> usize {
        self.writes
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

impl Default for MemorySink {
    fn default() -> Self {
        Self::new()
    }
}

impl ByteSink for MemorySink {
    fn write_bytes(&mut self, bytes: &[u8]) -> io::Result<()> {
        if self.finished {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "sink already finished"));
        }
        self.bytes.extend_from_slice(bytes);
        self.writes += 1;
        Ok(())
    }

    fn finish(&mut self) -> io::Result<SinkExit> {
        self.finished = true;
        Ok(self.exit)
    }
}

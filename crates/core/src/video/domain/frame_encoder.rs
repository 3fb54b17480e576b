use crate::shared::frame::Frame;
use crate::video::error::VideoError;

/// One encoding backend behind a [`VideoWriter`](super::video_writer::VideoWriter).
///
/// Implementations may assume frames already match the declared size.
pub trait FrameEncoder: Send {
    fn encode(&mut self, frame: &Frame) -> Result<(), VideoError>;

    /// Flushes and closes the output. Called at most once.
    fn finish(&mut self) -> Result<(), VideoError>;
}

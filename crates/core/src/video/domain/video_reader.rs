use std::path::Path;

use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::error::VideoError;

/// Reads frames from a video source through a decode backend.
///
/// Lifecycle is `unopened -> opened -> released`. Opening again releases the
/// previous session first; releasing is always safe to repeat.
pub trait VideoReader: Send {
    /// Opens a video file and returns its metadata.
    fn open(&mut self, path: &Path) -> Result<VideoMetadata, VideoError>;

    /// Metadata of the open session, `None` before open or after release.
    fn metadata(&self) -> Option<&VideoMetadata>;

    /// Positions the cursor so the next read returns frame `frame_index`.
    /// No bounds checking: past the end, reads return `None`.
    fn seek(&mut self, frame_index: usize) -> Result<(), VideoError>;

    /// Decodes the next frame. `None` means end of stream *or* a decode
    /// failure; the two are not distinguished.
    fn next_frame(&mut self) -> Option<Frame>;

    /// Frees the decode session.
    fn release(&mut self);

    /// Drains the remaining frames in decode order.
    fn frames(&mut self) -> Box<dyn Iterator<Item = Frame> + '_> {
        Box::new(std::iter::from_fn(move || self.next_frame()))
    }
}

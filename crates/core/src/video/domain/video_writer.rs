use crate::shared::config::WriterBackend;
use crate::shared::frame::Frame;
use crate::video::domain::frame_encoder::FrameEncoder;
use crate::video::error::VideoError;

/// Encodes raw frames into an output video through exactly one backend,
/// fixed at construction.
///
/// Every frame must match the declared width and height; a mismatch fails
/// before the backend sees any of it.
pub struct VideoWriter {
    encoder: Option<Box<dyn FrameEncoder>>,
    backend: WriterBackend,
    width: u32,
    height: u32,
    frames_written: usize,
}

impl VideoWriter {
    pub fn new(
        encoder: Box<dyn FrameEncoder>,
        backend: WriterBackend,
        width: u32,
        height: u32,
    ) -> Self {
        Self {
            encoder: Some(encoder),
            backend,
            width,
            height,
            frames_written: 0,
        }
    }

    pub fn backend(&self) -> WriterBackend {
        self.backend
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn frames_written(&self) -> usize {
        self.frames_written
    }

    pub fn is_released(&self) -> bool {
        self.encoder.is_none()
    }

    pub fn write_frame(&mut self, frame: &Frame) -> Result<(), VideoError> {
        if frame.width() != self.width || frame.height() != self.height {
            return Err(VideoError::DimensionMismatch {
                width: self.width,
                height: self.height,
                actual_width: frame.width(),
                actual_height: frame.height(),
            });
        }
        let encoder = self
            .encoder
            .as_mut()
            .ok_or(VideoError::NotOpened("VideoWriter"))?;
        encoder.encode(frame)?;
        self.frames_written += 1;
        Ok(())
    }

    /// Finishes the output. Later calls are no-ops.
    pub fn release(&mut self) -> Result<(), VideoError> {
        match self.encoder.take() {
            Some(mut encoder) => {
                log::debug!(
                    "Releasing {:?} writer after {} frames",
                    self.backend,
                    self.frames_written
                );
                encoder.finish()
            }
            None => Ok(()),
        }
    }
}

impl Drop for VideoWriter {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            log::warn!("Video writer release failed on drop: {e}");
        }
    }
}

use std::path::Path;

use crate::shared::config::{TranscoderConfig, WriterBackend, WriterConfig};
use crate::shared::path;
use crate::video::domain::frame_encoder::FrameEncoder;
use crate::video::domain::video_writer::VideoWriter;
use crate::video::error::VideoError;
use crate::video::infrastructure::ffmpeg_encoder::FfmpegFrameEncoder;
use crate::video::infrastructure::png_pipe_encoder::PngPipeEncoder;

/// Builds the encoder for `config.backend`, writing to `out_path`.
pub fn create_encoder(
    out_path: &Path,
    config: &WriterConfig,
    transcoder: &TranscoderConfig,
) -> Result<Box<dyn FrameEncoder>, VideoError> {
    match config.backend {
        WriterBackend::InProcess => Ok(Box::new(FfmpegFrameEncoder::open(out_path, config)?)),
        WriterBackend::Piped => Ok(Box::new(PngPipeEncoder::spawn(out_path, config, transcoder)?)),
    }
}

impl VideoWriter {
    /// Resolves `out_path`, creates its parent directory, and starts the
    /// backend selected by `config`.
    pub fn create(
        out_path: impl AsRef<Path>,
        config: &WriterConfig,
        transcoder: &TranscoderConfig,
    ) -> Result<Self, VideoError> {
        let out_path = path::resolve(out_path.as_ref())?;
        if let Some(parent) = out_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        log::info!(
            "Writing {}x{} @ {} fps to {} ({:?} backend)",
            config.width,
            config.height,
            config.fps,
            out_path.display(),
            config.backend
        );

        let encoder = create_encoder(&out_path, config, transcoder)?;
        Ok(Self::new(encoder, config.backend, config.width, config.height))
    }
}

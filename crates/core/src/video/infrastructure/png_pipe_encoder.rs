use std::io::Cursor;
use std::path::Path;

use crate::process::domain::byte_sink::ByteSink;
use crate::process::infrastructure::child_process_sink::ChildProcessSink;
use crate::process::shell;
use crate::shared::config::{TranscoderConfig, WriterConfig};
use crate::shared::frame::Frame;
use crate::video::domain::frame_encoder::FrameEncoder;
use crate::video::error::VideoError;

/// Builds the transcoder invocation that turns a PNG stream on stdin into
/// an H.264 video.
pub fn pipe_command_line(transcoder: &TranscoderConfig, config: &WriterConfig, out_path: &Path) -> String {
    format!(
        "{prefix} -f image2pipe -vcodec png -r {fps} -i - -vcodec h264 -profile:v high -level:v 5 \
         -refs 6 -q:v 0 -r {fps} -b:v {bitrate} -pix_fmt yuv420p {out}",
        prefix = transcoder.command_prefix(),
        fps = config.fps,
        bitrate = config.bitrate,
        out = shell::arg(out_path),
    )
}

/// Encodes each frame as a standalone PNG and streams it into a sink,
/// normally the stdin of an external transcoder.
///
/// PNG is self-delimiting, so the consumer splits frames without any extra
/// framing. Frame order on the stream is the output order.
pub struct PngPipeEncoder<S: ByteSink> {
    sink: S,
    command_line: String,
    buffer: Vec<u8>,
}

impl PngPipeEncoder<ChildProcessSink> {
    /// Spawns the transcoder for `out_path` and connects to its stdin.
    pub fn spawn(
        out_path: &Path,
        config: &WriterConfig,
        transcoder: &TranscoderConfig,
    ) -> Result<Self, VideoError> {
        let command = pipe_command_line(transcoder, config, out_path);
        let sink = ChildProcessSink::spawn(&command).map_err(|source| VideoError::Spawn {
            command: command.clone(),
            source,
        })?;
        Ok(Self::new(sink, command))
    }
}

impl<S: ByteSink> PngPipeEncoder<S> {
    /// `command_line` is only used to describe failures.
    pub fn new(sink: S, command_line: impl Into<String>) -> Self {
        Self {
            sink,
            command_line: command_line.into(),
            buffer: Vec::new(),
        }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }
}

/// PNG-encodes a frame, converting it to RGB order first.
pub fn encode_png(frame: &Frame, out: &mut Vec<u8>) -> Result<(), VideoError> {
    let img = frame.to_rgb_image().ok_or_else(|| {
        VideoError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "frame buffer does not match its dimensions",
        ))
    })?;
    out.clear();
    img.write_to(&mut Cursor::new(out), image::ImageFormat::Png)?;
    Ok(())
}

impl<S: ByteSink> FrameEncoder for PngPipeEncoder<S> {
    fn encode(&mut self, frame: &Frame) -> Result<(), VideoError> {
        encode_png(frame, &mut self.buffer)?;
        self.sink.write_bytes(&self.buffer)?;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), VideoError> {
        let exit = self.sink.finish()?;
        if !exit.success() {
            return Err(VideoError::TranscoderExited {
                command: self.command_line.clone(),
                exit,
            });
        }
        Ok(())
    }
}

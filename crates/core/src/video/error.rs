use std::path::PathBuf;

use thiserror::Error;

use crate::process::domain::byte_sink::SinkExit;
use crate::shared::path::PathError;

#[derive(Error, Debug)]
pub enum VideoError {
    #[error("there is no {}, please check again", .0.display())]
    NotFound(PathBuf),
    #[error("frame is {actual_width}x{actual_height} but the writer expects {width}x{height}")]
    DimensionMismatch {
        width: u32,
        height: u32,
        actual_width: u32,
        actual_height: u32,
    },
    #[error("no video stream found in {}", .0.display())]
    NoVideoStream(PathBuf),
    #[error("encoder '{0}' not found")]
    EncoderNotFound(String),
    #[error("{0}: not opened")]
    NotOpened(&'static str),
    #[error("failed to start transcoder `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("transcoder `{command}` exited with {exit:?}")]
    TranscoderExited { command: String, exit: SinkExit },
    #[error(transparent)]
    Path(#[from] PathError),
    #[error(transparent)]
    Ffmpeg(#[from] ffmpeg_next::Error),
    #[error(transparent)]
    Image(#[from] image::ImageError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

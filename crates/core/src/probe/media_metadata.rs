use std::path::Path;

use serde::Serialize;
use thiserror::Error;

use crate::process::domain::command_runner::CommandError;

#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("media file not found: {}", .0.display())]
    NotFound(std::path::PathBuf),
    #[error(transparent)]
    Command(#[from] CommandError),
    #[error("failed to parse metadata for {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Snapshot of the first video track's properties as reported by the
/// metadata parser.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct MediaMetadata {
    /// `CFR` or `VFR` (constant / variable frame rate).
    pub frame_rate_mode: Option<String>,
    /// Bits per second.
    pub bit_rate: Option<u64>,
    /// Codec format name, e.g. `AVC`.
    pub format: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub duration_secs: Option<f64>,
}

/// Reads container-level metadata for a media file.
///
/// Returns `Ok(None)` when the file has no video track.
pub trait MediaProber: Send + Sync {
    fn probe(&self, path: &Path) -> Result<Option<MediaMetadata>, ProbeError>;
}

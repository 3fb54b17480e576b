use std::path::Path;

use serde::Deserialize;

use crate::probe::media_metadata::{MediaMetadata, MediaProber, ProbeError};
use crate::process::domain::command_runner::CommandRunner;
use crate::process::infrastructure::shell_command_runner::ShellCommandRunner;
use crate::process::shell::quoted;

pub const DEFAULT_MEDIAINFO: &str = "mediainfo";

#[derive(Debug, Deserialize)]
struct MediaInfoResponse {
    media: Option<MediaInfoMedia>,
}

#[derive(Debug, Deserialize)]
struct MediaInfoMedia {
    #[serde(default)]
    track: Vec<MediaInfoTrack>,
}

#[derive(Debug, Deserialize)]
struct MediaInfoTrack {
    #[serde(rename = "@type")]
    track_type: String,
    #[serde(rename = "Format")]
    format: Option<String>,
    #[serde(rename = "FrameRate_Mode")]
    frame_rate_mode: Option<String>,
    #[serde(rename = "BitRate")]
    bit_rate: Option<String>,
    #[serde(rename = "Width")]
    width: Option<String>,
    #[serde(rename = "Height")]
    height: Option<String>,
    #[serde(rename = "Duration")]
    duration: Option<String>,
}

impl From<&MediaInfoTrack> for MediaMetadata {
    fn from(track: &MediaInfoTrack) -> Self {
        Self {
            frame_rate_mode: track.frame_rate_mode.clone(),
            bit_rate: track.bit_rate.as_deref().and_then(parse_leading_number),
            format: track.format.clone(),
            width: track
                .width
                .as_deref()
                .and_then(parse_leading_number)
                .and_then(|w| u32::try_from(w).ok()),
            height: track
                .height
                .as_deref()
                .and_then(parse_leading_number)
                .and_then(|h| u32::try_from(h).ok()),
            duration_secs: track.duration.as_deref().and_then(|d| d.trim().parse().ok()),
        }
    }
}

/// mediainfo sometimes reports multi-valued fields as `"1234 / 5678"`.
fn parse_leading_number(value: &str) -> Option<u64> {
    value.split('/').next()?.trim().parse().ok()
}

/// Extracts the first video track from mediainfo's `--Output=JSON` document.
pub fn parse_mediainfo_json(json: &str, path: &Path) -> Result<Option<MediaMetadata>, ProbeError> {
    let response: MediaInfoResponse =
        serde_json::from_str(json).map_err(|source| ProbeError::Json {
            path: path.display().to_string(),
            source,
        })?;

    let Some(media) = response.media else {
        return Ok(None);
    };

    Ok(media
        .track
        .iter()
        .find(|track| track.track_type == "Video")
        .map(MediaMetadata::from))
}

/// Probes files by running the `mediainfo` CLI.
///
/// Every call spawns its own parser process, so one prober can be shared
/// across threads.
pub struct MediaInfoProbe<R: CommandRunner = ShellCommandRunner> {
    runner: R,
    program: String,
}

impl MediaInfoProbe<ShellCommandRunner> {
    pub fn new() -> Self {
        Self::with_runner(ShellCommandRunner::default())
    }
}

impl Default for MediaInfoProbe<ShellCommandRunner> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: CommandRunner> MediaInfoProbe<R> {
    pub fn with_runner(runner: R) -> Self {
        Self {
            runner,
            program: DEFAULT_MEDIAINFO.to_string(),
        }
    }

    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    fn command_line(&self, path: &Path) -> String {
        format!("{} --Output=JSON {}", self.program, quoted(path))
    }
}

impl<R: CommandRunner> MediaProber for MediaInfoProbe<R> {
    fn probe(&self, path: &Path) -> Result<Option<MediaMetadata>, ProbeError> {
        if !path.exists() {
            return Err(ProbeError::NotFound(path.to_path_buf()));
        }
        let output = self.runner.run(&self.command_line(path))?;
        let metadata = parse_mediainfo_json(&output.stdout, path)?;
        log::debug!("Probed {}: {metadata:?}", path.display());
        Ok(metadata)
    }
}

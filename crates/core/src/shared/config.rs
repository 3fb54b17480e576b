use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const TRANSCODER_ENV: &str = "RUTILS_TRANSCODER";
pub const DEFAULT_TRANSCODER: &str = "ffmpeg";
pub const DEFAULT_FPS: f64 = 25.0;
pub const DEFAULT_BITRATE: &str = "11M";
pub const DEFAULT_CODEC: &str = "mpeg4";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("unknown writer backend '{0}', expected 'ffmpeg' or 'opencv'")]
    UnknownBackend(String),
}

/// How the external transcoder is invoked.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscoderConfig {
    /// Program name or path of the transcoder binary.
    pub program: String,
    /// Value passed to `-loglevel`.
    pub log_level: String,
}

impl Default for TranscoderConfig {
    fn default() -> Self {
        Self {
            program: DEFAULT_TRANSCODER.to_string(),
            log_level: "warning".to_string(),
        }
    }
}

impl TranscoderConfig {
    /// Defaults, with the program overridden by `RUTILS_TRANSCODER` when set.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(program) = std::env::var(TRANSCODER_ENV) {
            if !program.trim().is_empty() {
                config.program = program;
            }
        }
        config
    }

    /// `<program> -loglevel <level> -y`, the prefix every invocation shares.
    pub fn command_prefix(&self) -> String {
        format!("{} -loglevel {} -y", self.program, self.log_level)
    }
}

/// Which encoder implementation a [`VideoWriter`](crate::video::domain::video_writer::VideoWriter)
/// drives. Fixed for the writer's lifetime.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WriterBackend {
    /// Encode in this process through libavcodec.
    #[serde(alias = "opencv")]
    InProcess,
    /// Stream PNG frames into an external transcoder's stdin.
    #[default]
    #[serde(alias = "ffmpeg")]
    Piped,
}

impl FromStr for WriterBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "opencv" | "inprocess" | "in-process" => Ok(Self::InProcess),
            "ffmpeg" | "piped" => Ok(Self::Piped),
            other => Err(ConfigError::UnknownBackend(other.to_string())),
        }
    }
}

/// Output stream settings for a video writer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WriterConfig {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    /// libavcodec encoder name, used by the in-process backend.
    pub codec: String,
    /// Target bitrate in transcoder notation (e.g. `11M`), used by the piped backend.
    pub bitrate: String,
    pub backend: WriterBackend,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            width: 0,
            height: 0,
            fps: DEFAULT_FPS,
            codec: DEFAULT_CODEC.to_string(),
            bitrate: DEFAULT_BITRATE.to_string(),
            backend: WriterBackend::default(),
        }
    }
}

impl WriterConfig {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    pub fn with_fps(mut self, fps: f64) -> Self {
        self.fps = fps;
        self
    }

    pub fn with_backend(mut self, backend: WriterBackend) -> Self {
        self.backend = backend;
        self
    }

    pub fn with_bitrate(mut self, bitrate: impl Into<String>) -> Self {
        self.bitrate = bitrate.into();
        self
    }

    pub fn with_codec(mut self, codec: impl Into<String>) -> Self {
        self.codec = codec.into();
        self
    }

    /// Loads writer settings from a JSON file; missing fields take defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        Self::load_reporting_fps(path).map(|(config, _)| config)
    }

    /// Like [`WriterConfig::load`], also telling whether the file set `fps`
    /// itself rather than falling back to the default.
    pub fn load_reporting_fps(path: &Path) -> Result<(Self, bool), ConfigError> {
        let display = path.display().to_string();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: display.clone(),
            source,
        })?;
        let parse_error = |source| ConfigError::Parse {
            path: display.clone(),
            source,
        };
        let value: serde_json::Value = serde_json::from_str(&text).map_err(parse_error)?;
        let sets_fps = value.get("fps").is_some();
        let config = serde_json::from_value(value).map_err(parse_error)?;
        Ok((config, sets_fps))
    }
}

use std::path::PathBuf;

/// Stream properties reported by the decoder when a video is opened.
///
/// Values come straight from the container and codec; they are not checked
/// against the actual stream content and may be approximate.
#[derive(Clone, Debug, PartialEq)]
pub struct VideoMetadata {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    pub total_frames: usize,
    pub codec: String,
    pub source_path: Option<PathBuf>,
}

impl VideoMetadata {
    /// Length of the stream in seconds derived from frame count and rate.
    pub fn duration_secs(&self) -> Option<f64> {
        (self.fps > 0.0).then(|| self.total_frames as f64 / self.fps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn metadata(fps: f64, total_frames: usize) -> VideoMetadata {
        VideoMetadata {
            width: 64,
            height: 64,
            fps,
            total_frames,
            codec: "mpeg4".to_string(),
            source_path: Some(PathBuf::from("/tmp/test.mp4")),
        }
    }

    #[test]
    fn test_clone_is_equal() {
        let meta = metadata(25.0, 10);
        assert_eq!(meta.clone(), meta);
    }

    #[test]
    fn test_duration_from_frames_and_rate() {
        assert_relative_eq!(metadata(25.0, 50).duration_secs().unwrap(), 2.0);
    }

    #[test]
    fn test_duration_unknown_without_rate() {
        assert!(metadata(0.0, 50).duration_secs().is_none());
    }
}

use std::path::{Path, PathBuf};

use crate::shared::frame::{ChannelOrder, Frame};
use crate::video::error::VideoError;

const DEFAULT_EXTENSION: &str = "jpg";

/// Reads pre-extracted frames named `frm_<index>.<ext>` from one directory.
///
/// Frames come back in BGR order, same as [`super::ffmpeg_reader::FfmpegVideoReader`].
#[derive(Clone, Debug)]
pub struct FrameDirectoryReader {
    dir: PathBuf,
    extension: String,
}

impl FrameDirectoryReader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            extension: DEFAULT_EXTENSION.to_string(),
        }
    }

    pub fn with_extension(mut self, extension: &str) -> Self {
        self.extension = extension.trim_start_matches('.').to_string();
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn frame_path(&self, index: usize) -> PathBuf {
        self.dir.join(format!("frm_{index}.{}", self.extension))
    }

    /// Loads frame `index`; `Ok(None)` when no such file exists.
    pub fn get_frame(&self, index: usize) -> Result<Option<Frame>, VideoError> {
        let path = self.frame_path(index);
        if !path.is_file() {
            log::debug!("No frame file at {}", path.display());
            return Ok(None);
        }

        let rgb = image::open(&path)?.to_rgb8();
        let (width, height) = rgb.dimensions();
        let frame = Frame::new(rgb.into_raw(), width, height, ChannelOrder::Rgb, index);
        Ok(Some(frame.to_order(ChannelOrder::Bgr)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgb, RgbImage};

    fn write_frame_file(path: &Path, pixel: [u8; 3], format: ImageFormat) {
        let img = RgbImage::from_pixel(8, 6, Rgb(pixel));
        img.save_with_format(path, format).unwrap();
    }

    #[test]
    fn test_frame_path_naming() {
        let reader = FrameDirectoryReader::new("/frames");
        assert_eq!(reader.frame_path(7), PathBuf::from("/frames/frm_7.jpg"));
        let png = reader.with_extension(".png");
        assert_eq!(png.frame_path(0), PathBuf::from("/frames/frm_0.png"));
    }

    #[test]
    fn test_missing_frame_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let reader = FrameDirectoryReader::new(dir.path());
        assert!(reader.get_frame(3).unwrap().is_none());
    }

    #[test]
    fn test_reads_jpeg_as_bgr() {
        let dir = tempfile::tempdir().unwrap();
        let reader = FrameDirectoryReader::new(dir.path());
        write_frame_file(&reader.frame_path(2), [200, 40, 10], ImageFormat::Jpeg);

        let frame = reader.get_frame(2).unwrap().unwrap();
        assert_eq!((frame.width(), frame.height()), (8, 6));
        assert_eq!(frame.index(), 2);
        assert_eq!(frame.order(), ChannelOrder::Bgr);
        // JPEG is lossy; red ends up in the last channel
        let px = &frame.data()[..3];
        assert!(px[2] > 150 && px[0] < 60, "unexpected pixel {px:?}");
    }

    #[test]
    fn test_reads_png_exactly() {
        let dir = tempfile::tempdir().unwrap();
        let reader = FrameDirectoryReader::new(dir.path()).with_extension("png");
        write_frame_file(&reader.frame_path(0), [1, 2, 3], ImageFormat::Png);

        let frame = reader.get_frame(0).unwrap().unwrap();
        assert_eq!(&frame.data()[..3], &[3, 2, 1]);
    }

    #[test]
    fn test_corrupt_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let reader = FrameDirectoryReader::new(dir.path());
        std::fs::write(reader.frame_path(0), b"not an image").unwrap();
        assert!(matches!(reader.get_frame(0), Err(VideoError::Image(_))));
    }
}

use std::path::{Path, PathBuf};

use ffmpeg_next::format::Pixel;
use ffmpeg_next::util::frame::video::Video;
use ffmpeg_next::{rescale, Rational, Rescale};

use crate::shared::frame::{ChannelOrder, Frame, CHANNELS};
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::video_reader::VideoReader;
use crate::video::error::VideoError;

const AV_TIME_BASE: f64 = 1_000_000.0;

/// Decodes video frames via ffmpeg-next (libavformat + libavcodec).
///
/// Converts each decoded frame to packed BGR and wraps it in a [`Frame`].
pub struct FfmpegVideoReader {
    session: Option<DecodeSession>,
    metadata: Option<VideoMetadata>,
}

// Safety: FfmpegVideoReader is only used from a single thread at a time.
// The raw pointers inside ffmpeg types are not shared across threads.
unsafe impl Send for FfmpegVideoReader {}

impl FfmpegVideoReader {
    pub fn new() -> Self {
        Self {
            session: None,
            metadata: None,
        }
    }

    /// Creates a reader and opens `path` right away.
    pub fn open_path(path: &Path) -> Result<Self, VideoError> {
        let mut reader = Self::new();
        reader.open(path)?;
        Ok(reader)
    }

    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }
}

impl Default for FfmpegVideoReader {
    fn default() -> Self {
        Self::new()
    }
}

impl VideoReader for FfmpegVideoReader {
    fn open(&mut self, path: &Path) -> Result<VideoMetadata, VideoError> {
        self.release();
        if !path.exists() {
            return Err(VideoError::NotFound(path.to_path_buf()));
        }

        let (session, metadata) = DecodeSession::open(path)?;
        log::debug!(
            "Opened {} ({}x{}, {:.3} fps, {} frames, {})",
            path.display(),
            metadata.width,
            metadata.height,
            metadata.fps,
            metadata.total_frames,
            metadata.codec
        );
        self.session = Some(session);
        self.metadata = Some(metadata.clone());
        Ok(metadata)
    }

    fn metadata(&self) -> Option<&VideoMetadata> {
        self.metadata.as_ref()
    }

    fn seek(&mut self, frame_index: usize) -> Result<(), VideoError> {
        let session = self
            .session
            .as_mut()
            .ok_or(VideoError::NotOpened("FfmpegVideoReader"))?;
        session.seek(frame_index)
    }

    fn next_frame(&mut self) -> Option<Frame> {
        self.session.as_mut()?.next_frame()
    }

    fn release(&mut self) {
        self.session = None;
        self.metadata = None;
    }
}

/// One open demuxer + decoder pair and the cursor into it.
struct DecodeSession {
    path: PathBuf,
    ictx: ffmpeg_next::format::context::Input,
    decoder: ffmpeg_next::decoder::Video,
    scaler: ffmpeg_next::software::scaling::Context,
    stream_index: usize,
    time_base: Rational,
    start_pts: Option<i64>,
    fps: f64,
    width: u32,
    height: u32,
    next_index: usize,
    pending: Option<Frame>,
    eof_sent: bool,
    done: bool,
}

impl DecodeSession {
    fn open(path: &Path) -> Result<(Self, VideoMetadata), VideoError> {
        ffmpeg_next::init()?;

        let ictx = ffmpeg_next::format::input(path)?;
        let stream = ictx
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .ok_or_else(|| VideoError::NoVideoStream(path.to_path_buf()))?;

        let stream_index = stream.index();
        let time_base = stream.time_base();
        let start_pts = Some(stream.start_time()).filter(|&t| t != i64::MIN);
        let codec_ctx = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())?;
        let decoder = codec_ctx.decoder().video()?;

        let fps = [stream.rate(), stream.avg_frame_rate()]
            .into_iter()
            .find(|r| r.numerator() > 0 && r.denominator() > 0)
            .map(f64::from)
            .unwrap_or(0.0);

        let total_frames = estimate_frame_count(
            stream.frames(),
            stream.duration(),
            time_base,
            ictx.duration(),
            fps,
        );

        let width = decoder.width();
        let height = decoder.height();
        let metadata = VideoMetadata {
            width,
            height,
            fps,
            total_frames,
            codec: decoder
                .codec()
                .map(|c| c.name().to_string())
                .unwrap_or_default(),
            source_path: Some(path.to_path_buf()),
        };

        let scaler = ffmpeg_next::software::scaling::Context::get(
            decoder.format(),
            width,
            height,
            Pixel::BGR24,
            width,
            height,
            ffmpeg_next::software::scaling::Flags::BILINEAR,
        )?;

        let session = Self {
            path: path.to_path_buf(),
            ictx,
            decoder,
            scaler,
            stream_index,
            time_base,
            start_pts,
            fps,
            width,
            height,
            next_index: 0,
            pending: None,
            eof_sent: false,
            done: false,
        };
        Ok((session, metadata))
    }

    fn receive(&mut self) -> Option<Video> {
        let mut decoded = Video::empty();
        self.decoder.receive_frame(&mut decoded).ok().map(|_| decoded)
    }

    /// Pulls the next decoded picture, feeding packets as needed.
    fn decode_next(&mut self) -> Option<Video> {
        if self.done {
            return None;
        }
        loop {
            if let Some(decoded) = self.receive() {
                return Some(decoded);
            }
            if self.eof_sent {
                self.done = true;
                return None;
            }
            match self.ictx.packets().next() {
                Some((stream, packet)) => {
                    if stream.index() != self.stream_index {
                        continue;
                    }
                    if let Err(e) = self.decoder.send_packet(&packet) {
                        log::debug!("Skipping undecodable packet: {e}");
                    }
                }
                None => {
                    if let Err(e) = self.decoder.send_eof() {
                        log::debug!("Decoder flush failed: {e}");
                    }
                    self.eof_sent = true;
                }
            }
        }
    }

    fn convert(&mut self, decoded: &Video, index: usize) -> Result<Frame, VideoError> {
        let mut bgr = Video::empty();
        self.scaler.run(decoded, &mut bgr)?;
        let pixels = extract_packed_pixels(&bgr, self.width, self.height);
        Ok(Frame::new(pixels, self.width, self.height, ChannelOrder::Bgr, index))
    }

    fn next_frame(&mut self) -> Option<Frame> {
        if let Some(frame) = self.pending.take() {
            return Some(frame);
        }
        let decoded = self.decode_next()?;
        match self.convert(&decoded, self.next_index) {
            Ok(frame) => {
                self.next_index += 1;
                Some(frame)
            }
            Err(e) => {
                log::debug!("Frame conversion failed at {}: {e}", self.next_index);
                None
            }
        }
    }

    /// Frame number of a decoded picture derived from its timestamp.
    fn frame_index_of(&self, decoded: &Video) -> Option<usize> {
        let pts = decoded.timestamp().or_else(|| decoded.pts())?;
        let relative = pts - self.start_pts.unwrap_or(0);
        let seconds = relative as f64 * f64::from(self.time_base);
        Some((seconds * self.fps).round().max(0.0) as usize)
    }

    fn seek(&mut self, target: usize) -> Result<(), VideoError> {
        if self.fps <= 0.0 {
            return self.seek_by_decoding(target);
        }

        let start = self
            .start_pts
            .map(|pts| pts.rescale(self.time_base, rescale::TIME_BASE))
            .unwrap_or(0);
        let seek_timestamp = start + (target as f64 / self.fps * AV_TIME_BASE) as i64;

        self.pending = None;
        self.decoder.flush();
        self.eof_sent = false;
        self.done = false;
        self.ictx.seek(seek_timestamp, ..seek_timestamp)?;

        // Landed on the keyframe at or before the target; decode forward.
        while let Some(decoded) = self.decode_next() {
            let index = self.frame_index_of(&decoded).unwrap_or(target);
            if index >= target {
                let frame = self.convert(&decoded, index)?;
                self.next_index = index + 1;
                self.pending = Some(frame);
                return Ok(());
            }
        }
        self.next_index = target;
        Ok(())
    }

    /// Rewinds by reopening the input and discards `target` frames. Used
    /// when the stream reports no frame rate to map indices to time.
    fn seek_by_decoding(&mut self, target: usize) -> Result<(), VideoError> {
        let (fresh, _) = Self::open(&self.path)?;
        *self = fresh;
        for _ in 0..target {
            if self.decode_next().is_none() {
                break;
            }
        }
        self.next_index = target;
        Ok(())
    }
}

/// Frame count from the container, falling back to duration x rate when the
/// container does not record one.
fn estimate_frame_count(
    stream_frames: i64,
    stream_duration: i64,
    time_base: Rational,
    container_duration: i64,
    fps: f64,
) -> usize {
    if stream_frames > 0 {
        return stream_frames as usize;
    }
    if fps <= 0.0 {
        return 0;
    }
    let seconds = if stream_duration > 0 {
        stream_duration as f64 * f64::from(time_base)
    } else if container_duration > 0 {
        container_duration as f64 / AV_TIME_BASE
    } else {
        0.0
    };
    (seconds * fps).round() as usize
}

/// Copies pixel data from an ffmpeg frame into a tightly packed buffer.
///
/// ffmpeg frames may have padding bytes at the end of each row (stride > width*3).
fn extract_packed_pixels(frame: &Video, width: u32, height: u32) -> Vec<u8> {
    let stride = frame.stride(0);
    let data = frame.data(0);
    let row_bytes = width as usize * CHANNELS;

    let mut pixels = Vec::with_capacity(row_bytes * height as usize);
    for row in 0..height as usize {
        let row_start = row * stride;
        pixels.extend_from_slice(&data[row_start..row_start + row_bytes]);
    }
    pixels
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::config::{TranscoderConfig, WriterBackend, WriterConfig};
    use crate::video::domain::video_writer::VideoWriter;

    /// Writes `num_frames` frames whose grey level encodes the frame number.
    fn create_test_video(path: &Path, num_frames: usize, width: u32, height: u32) {
        let config = WriterConfig::new(width, height)
            .with_fps(25.0)
            .with_backend(WriterBackend::InProcess);
        let mut writer = VideoWriter::create(path, &config, &TranscoderConfig::default()).unwrap();
        for i in 0..num_frames {
            let value = ((i * 20) % 256) as u8;
            let frame = Frame::filled(width, height, ChannelOrder::Bgr, [value; 3]).with_index(i);
            writer.write_frame(&frame).unwrap();
        }
        writer.release().unwrap();
    }

    fn mean(frame: &Frame) -> f64 {
        frame.data().iter().map(|&b| b as f64).sum::<f64>() / frame.data().len() as f64
    }

    #[test]
    fn test_open_returns_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.mp4");
        create_test_video(&path, 5, 64, 48);

        let mut reader = FfmpegVideoReader::new();
        let meta = reader.open(&path).unwrap();
        assert_eq!(meta.width, 64);
        assert_eq!(meta.height, 48);
        assert!(meta.fps > 0.0);
        assert_eq!(meta.source_path, Some(path));
        assert_eq!(reader.metadata(), Some(&meta));
    }

    #[test]
    fn test_open_nonexistent_is_not_found() {
        let mut reader = FfmpegVideoReader::new();
        let result = reader.open(Path::new("/nonexistent/test.mp4"));
        assert!(matches!(result, Err(VideoError::NotFound(_))));
        assert!(reader.next_frame().is_none());
    }

    #[test]
    fn test_reads_every_frame_then_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.mp4");
        create_test_video(&path, 5, 64, 48);

        let mut reader = FfmpegVideoReader::open_path(&path).unwrap();
        let frames: Vec<_> = reader.frames().collect();
        assert_eq!(frames.len(), 5);
        for (i, frame) in frames.iter().enumerate() {
            assert_eq!(frame.index(), i);
            assert_eq!(frame.order(), ChannelOrder::Bgr);
            assert_eq!(frame.data().len(), 64 * 48 * 3);
        }
        assert!(reader.next_frame().is_none());
    }

    #[test]
    fn test_seek_starts_from_requested_frame() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.mp4");
        create_test_video(&path, 10, 64, 48);

        let mut reader = FfmpegVideoReader::open_path(&path).unwrap();
        reader.seek(6).unwrap();
        let rest: Vec<_> = reader.frames().collect();
        assert_eq!(rest.len(), 4);
        assert_eq!(rest[0].index(), 6);
        // Grey level 6 * 20 = 120, lossy codec so allow slack
        assert!((mean(&rest[0]) - 120.0).abs() < 25.0);
    }

    #[test]
    fn test_seek_backwards_after_reading() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.mp4");
        create_test_video(&path, 6, 64, 48);

        let mut reader = FfmpegVideoReader::open_path(&path).unwrap();
        while reader.next_frame().is_some() {}
        reader.seek(0).unwrap();
        assert_eq!(reader.frames().count(), 6);
    }

    #[test]
    fn test_seek_past_end_yields_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.mp4");
        create_test_video(&path, 3, 64, 48);

        let mut reader = FfmpegVideoReader::open_path(&path).unwrap();
        reader.seek(100).unwrap();
        assert!(reader.next_frame().is_none());
    }

    #[test]
    fn test_seek_without_open_is_error() {
        let mut reader = FfmpegVideoReader::new();
        assert!(matches!(reader.seek(0), Err(VideoError::NotOpened(_))));
    }

    #[test]
    fn test_reopen_releases_previous_session() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("first.mp4");
        let second = dir.path().join("second.mp4");
        create_test_video(&first, 2, 64, 48);
        create_test_video(&second, 4, 32, 32);

        let mut reader = FfmpegVideoReader::open_path(&first).unwrap();
        reader.next_frame().unwrap();
        let meta = reader.open(&second).unwrap();
        assert_eq!(meta.width, 32);
        assert_eq!(reader.frames().count(), 4);
    }

    #[test]
    fn test_release_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.mp4");
        create_test_video(&path, 1, 64, 48);

        let mut reader = FfmpegVideoReader::open_path(&path).unwrap();
        reader.release();
        reader.release();
        assert!(!reader.is_open());
        assert!(reader.metadata().is_none());

        let mut never_opened = FfmpegVideoReader::new();
        never_opened.release();
    }

    #[test]
    fn test_estimate_frame_count_prefers_container_count() {
        assert_eq!(estimate_frame_count(42, 0, Rational::new(1, 25), 0, 25.0), 42);
    }

    #[test]
    fn test_estimate_frame_count_from_durations() {
        // 50 ticks of 1/25 s = 2 s at 25 fps
        assert_eq!(estimate_frame_count(0, 50, Rational::new(1, 25), 0, 25.0), 50);
        // container duration 0.4 s at 25 fps
        assert_eq!(estimate_frame_count(0, 0, Rational::new(1, 25), 400_000, 25.0), 10);
        assert_eq!(estimate_frame_count(0, 0, Rational::new(1, 25), 0, 0.0), 0);
    }
}

use std::path::Path;

use ffmpeg_next::format::Pixel;
use ffmpeg_next::Rational;

use crate::shared::config::{WriterConfig, DEFAULT_FPS};
use crate::shared::frame::{ChannelOrder, Frame, CHANNELS};
use crate::video::domain::frame_encoder::FrameEncoder;
use crate::video::error::VideoError;

/// Encodes frames in-process via ffmpeg-next (libavcodec + libavformat).
///
/// The encoder, output container and BGR -> YUV scaler are all set up at
/// construction; the container format follows the output extension.
pub struct FfmpegFrameEncoder {
    octx: ffmpeg_next::format::context::Output,
    encoder: ffmpeg_next::codec::encoder::video::Encoder,
    scaler: ffmpeg_next::software::scaling::Context,
    width: u32,
    height: u32,
    frame_rate: Rational,
    frame_count: i64,
    finished: bool,
}

// Safety: FfmpegFrameEncoder is only used from a single thread at a time.
// The raw pointers inside ffmpeg types are not shared across threads.
unsafe impl Send for FfmpegFrameEncoder {}

/// Maps fourcc-style tags to libavcodec encoder names.
fn encoder_candidates(codec: &str) -> Vec<String> {
    let name = codec.trim().to_ascii_lowercase();
    let alias = match name.as_str() {
        "h264" | "avc1" | "x264" => Some("libx264"),
        "mp4v" | "fmp4" | "divx" | "xvid" => Some("mpeg4"),
        "mjpg" => Some("mjpeg"),
        "vp80" => Some("libvpx"),
        "vp90" => Some("libvpx-vp9"),
        _ => None,
    };
    let mut candidates = vec![name.clone()];
    if let Some(alias) = alias {
        candidates.push(alias.to_string());
    }
    candidates
}

fn find_encoder(codec: &str) -> Result<ffmpeg_next::Codec, VideoError> {
    encoder_candidates(codec)
        .iter()
        .find_map(|name| ffmpeg_next::encoder::find_by_name(name))
        .ok_or_else(|| VideoError::EncoderNotFound(codec.to_string()))
}

fn frame_rate(fps: f64) -> Rational {
    let fps = if fps > 0.0 { fps } else { DEFAULT_FPS };
    if fps.fract() == 0.0 {
        Rational::new(fps as i32, 1)
    } else {
        Rational::from(fps)
    }
}

impl FfmpegFrameEncoder {
    pub fn open(path: &Path, config: &WriterConfig) -> Result<Self, VideoError> {
        ffmpeg_next::init()?;

        let mut octx = ffmpeg_next::format::output(path)?;
        let global_header = octx
            .format()
            .flags()
            .contains(ffmpeg_next::format::Flags::GLOBAL_HEADER);

        let codec = find_encoder(&config.codec)?;
        let mut ost = octx.add_stream(Some(codec))?;

        let mut encoder_ctx = ffmpeg_next::codec::context::Context::new_with_codec(codec)
            .encoder()
            .video()?;

        let pixel = if codec.name() == "mjpeg" {
            Pixel::YUVJ420P
        } else {
            Pixel::YUV420P
        };
        let rate = frame_rate(config.fps);

        encoder_ctx.set_width(config.width);
        encoder_ctx.set_height(config.height);
        encoder_ctx.set_format(pixel);
        encoder_ctx.set_time_base(rate.invert());
        encoder_ctx.set_frame_rate(Some(rate));
        if global_header {
            encoder_ctx.set_flags(ffmpeg_next::codec::Flags::GLOBAL_HEADER);
        }

        let encoder = encoder_ctx.open_with(ffmpeg_next::Dictionary::new())?;
        ost.set_parameters(&encoder);
        ost.set_time_base(rate.invert());

        octx.write_header()?;

        let scaler = ffmpeg_next::software::scaling::Context::get(
            Pixel::BGR24,
            config.width,
            config.height,
            pixel,
            config.width,
            config.height,
            ffmpeg_next::software::scaling::Flags::BILINEAR,
        )?;

        log::debug!(
            "Opened {} encoder for {} ({}x{} @ {}/{} fps)",
            codec.name(),
            path.display(),
            config.width,
            config.height,
            rate.numerator(),
            rate.denominator()
        );

        Ok(Self {
            octx,
            encoder,
            scaler,
            width: config.width,
            height: config.height,
            frame_rate: rate,
            frame_count: 0,
            finished: false,
        })
    }

    /// Moves every packet the encoder has ready into the container.
    fn drain_packets(&mut self) -> Result<(), VideoError> {
        let ost_time_base = self
            .octx
            .stream(0)
            .ok_or(VideoError::NotOpened("FfmpegFrameEncoder"))?
            .time_base();
        let mut encoded = ffmpeg_next::Packet::empty();
        while self.encoder.receive_packet(&mut encoded).is_ok() {
            encoded.set_stream(0);
            encoded.rescale_ts(self.frame_rate.invert(), ost_time_base);
            encoded.write_interleaved(&mut self.octx)?;
        }
        Ok(())
    }
}

impl FrameEncoder for FfmpegFrameEncoder {
    fn encode(&mut self, frame: &Frame) -> Result<(), VideoError> {
        if self.finished {
            return Err(VideoError::NotOpened("FfmpegFrameEncoder"));
        }
        let bgr = frame.to_order(ChannelOrder::Bgr);

        let mut bgr_frame =
            ffmpeg_next::util::frame::video::Video::new(Pixel::BGR24, self.width, self.height);
        let stride = bgr_frame.stride(0);
        let row_bytes = self.width as usize * CHANNELS;
        let dst = bgr_frame.data_mut(0);
        for (row, src_row) in bgr.data().chunks_exact(row_bytes).enumerate() {
            let dst_start = row * stride;
            dst[dst_start..dst_start + row_bytes].copy_from_slice(src_row);
        }

        let mut yuv_frame = ffmpeg_next::util::frame::video::Video::empty();
        self.scaler.run(&bgr_frame, &mut yuv_frame)?;
        yuv_frame.set_pts(Some(self.frame_count));

        self.encoder.send_frame(&yuv_frame)?;
        self.drain_packets()?;

        self.frame_count += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), VideoError> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.encoder.send_eof()?;
        self.drain_packets()?;
        self.octx.write_trailer()?;
        log::debug!("Encoded {} frames in-process", self.frame_count);
        Ok(())
    }
}

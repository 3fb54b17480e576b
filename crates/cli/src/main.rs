use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};

use rutils_core::audio::audio_video_muxer::AudioVideoMuxer;
use rutils_core::probe::media_metadata::MediaProber;
use rutils_core::probe::mediainfo_probe::MediaInfoProbe;
use rutils_core::shared::config::{TranscoderConfig, WriterBackend, WriterConfig, TRANSCODER_ENV};
use rutils_core::shared::path::parse_path_arg;
use rutils_core::video::domain::video_reader::VideoReader;
use rutils_core::video::domain::video_writer::VideoWriter;
use rutils_core::video::infrastructure::ffmpeg_reader::FfmpegVideoReader;
use rutils_core::video::infrastructure::frame_directory_reader::FrameDirectoryReader;

/// Video frame I/O and audio muxing helpers.
#[derive(Parser)]
#[command(name = "rutils")]
struct Cli {
    /// Transcoder binary used for piped writing and audio operations.
    #[arg(long, global = true, env = TRANSCODER_ENV)]
    transcoder: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the absolute, normalized form of a path.
    Resolve {
        #[arg(long, value_parser = parse_path_arg)]
        in_path: PathBuf,
    },
    /// Decode every frame of a video and encode it again.
    Rewrite {
        input: PathBuf,
        output: PathBuf,

        /// Writer backend: ffmpeg (piped PNGs) or opencv (in-process).
        #[arg(long)]
        backend: Option<WriterBackend>,

        /// Target bitrate for the piped backend, e.g. 11M.
        #[arg(long)]
        bitrate: Option<String>,

        /// Codec for the in-process backend, e.g. mpeg4 or mp4v.
        #[arg(long)]
        codec: Option<String>,

        /// First frame to copy (0-based).
        #[arg(long, default_value = "0")]
        start: usize,

        /// JSON writer settings; flags above take precedence. An `fps` set
        /// here replaces the source frame rate.
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Print the first video track's metadata as JSON.
    Probe { file: PathBuf },
    /// Write the audio track of a video to a separate file.
    ExtractAudio { video: PathBuf, output: PathBuf },
    /// Attach an audio file to a video, cut to the shorter stream.
    AddAudio {
        audio: PathBuf,
        video: PathBuf,
        output: PathBuf,
    },
    /// Replace a video's audio with the track of another video.
    CopyAudio {
        no_audio: PathBuf,
        with_audio: PathBuf,
        output: PathBuf,
    },
    /// Join videos end to end without re-encoding.
    Concat {
        #[arg(required = true)]
        videos: Vec<PathBuf>,
        #[arg(long)]
        output: PathBuf,
    },
    /// Copy one `frm_<index>.jpg` out of a frames directory.
    DumpFrame {
        frames_dir: PathBuf,
        index: usize,
        output: PathBuf,
    },
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let transcoder = transcoder_config(cli.transcoder);

    match cli.command {
        Commands::Resolve { in_path } => println!("{}", in_path.display()),
        Commands::Rewrite {
            input,
            output,
            backend,
            bitrate,
            codec,
            start,
            config,
        } => {
            let (base, fps_configured) = match config {
                Some(path) => WriterConfig::load_reporting_fps(&path)?,
                None => (WriterConfig::default(), false),
            };
            let overrides = WriterOverrides {
                backend,
                bitrate,
                codec,
            };
            let settings = RewriteSettings {
                base,
                fps_configured,
                overrides,
            };
            run_rewrite(&input, &output, start, settings, &transcoder)?;
        }
        Commands::Probe { file } => {
            let metadata = MediaInfoProbe::new().probe(&file)?;
            println!("{}", serde_json::to_string_pretty(&metadata)?);
        }
        Commands::ExtractAudio { video, output } => {
            let out = AudioVideoMuxer::new(transcoder).extract_audio(&video, &output)?;
            log::info!("Extracted audio to {}", out.display());
        }
        Commands::AddAudio {
            audio,
            video,
            output,
        } => {
            let out = AudioVideoMuxer::new(transcoder).add_audio(&audio, &video, &output)?;
            log::info!("Wrote {}", out.display());
        }
        Commands::CopyAudio {
            no_audio,
            with_audio,
            output,
        } => {
            let out = AudioVideoMuxer::new(transcoder).copy_audio_from_another_video(
                &no_audio,
                &with_audio,
                &output,
            )?;
            log::info!("Wrote {}", out.display());
        }
        Commands::Concat { videos, output } => {
            let list_dir = output
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or(Path::new("."));
            let out = AudioVideoMuxer::new(transcoder).concat_videos(&videos, list_dir, &output)?;
            log::info!("Joined {} videos into {}", videos.len(), out.display());
        }
        Commands::DumpFrame {
            frames_dir,
            index,
            output,
        } => run_dump_frame(&frames_dir, index, &output)?,
    }
    Ok(())
}

fn transcoder_config(program: Option<String>) -> TranscoderConfig {
    let mut config = TranscoderConfig::default();
    if let Some(program) = program {
        config.program = program;
    }
    config
}

struct WriterOverrides {
    backend: Option<WriterBackend>,
    bitrate: Option<String>,
    codec: Option<String>,
}

/// Writer settings for `rewrite` before the source is known.
struct RewriteSettings {
    base: WriterConfig,
    /// The config file fixed `fps`; otherwise the source rate is used.
    fps_configured: bool,
    overrides: WriterOverrides,
}

impl RewriteSettings {
    fn writer_config(self, width: u32, height: u32, source_fps: f64) -> WriterConfig {
        let mut config = WriterConfig {
            width,
            height,
            ..self.base
        };
        if !self.fps_configured && source_fps > 0.0 {
            config.fps = source_fps;
        }
        if let Some(backend) = self.overrides.backend {
            config.backend = backend;
        }
        if let Some(bitrate) = self.overrides.bitrate {
            config.bitrate = bitrate;
        }
        if let Some(codec) = self.overrides.codec {
            config.codec = codec;
        }
        config
    }
}

fn run_rewrite(
    input: &Path,
    output: &Path,
    start: usize,
    settings: RewriteSettings,
    transcoder: &TranscoderConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut reader = FfmpegVideoReader::new();
    let metadata = reader.open(input)?;
    let config = settings.writer_config(metadata.width, metadata.height, metadata.fps);

    if start > 0 {
        reader.seek(start)?;
    }
    let mut writer = VideoWriter::create(output, &config, transcoder)?;
    let total = metadata.total_frames.saturating_sub(start);
    for frame in reader.frames() {
        writer.write_frame(&frame)?;
        eprint!("\rWriting frame {}/{total}", writer.frames_written());
    }
    eprintln!();
    writer.release()?;
    reader.release();

    log::info!(
        "Rewrote {} frames to {}",
        writer.frames_written(),
        output.display()
    );
    Ok(())
}

fn run_dump_frame(
    frames_dir: &Path,
    index: usize,
    output: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let reader = FrameDirectoryReader::new(frames_dir);
    let frame = reader
        .get_frame(index)?
        .ok_or_else(|| format!("no frame file at {}", reader.frame_path(index).display()))?;

    frame
        .to_rgb_image()
        .ok_or("frame buffer does not match its dimensions")?
        .save(output)?;
    log::info!(
        "Saved frame {index} ({}x{}) to {}",
        frame.width(),
        frame.height(),
        output.display()
    );
    Ok(())
}

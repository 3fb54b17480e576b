use std::io::Write;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

use crate::process::domain::command_runner::{CommandError, CommandRunner};
use crate::process::infrastructure::shell_command_runner::ShellCommandRunner;
use crate::process::shell::{arg, quoted};
use crate::shared::config::TranscoderConfig;
use crate::shared::path::{self, PathError};

/// Audio and container operations carried out by the external transcoder.
///
/// Every method builds one command line, runs it to completion and returns
/// the output path. Streams are copied, never re-encoded, except where the
/// output extension forces a format change (`extract_audio`).
pub struct AudioVideoMuxer<R: CommandRunner = ShellCommandRunner> {
    runner: R,
    transcoder: TranscoderConfig,
}

impl AudioVideoMuxer<ShellCommandRunner> {
    pub fn new(transcoder: TranscoderConfig) -> Self {
        Self::with_runner(ShellCommandRunner::default(), transcoder)
    }
}

impl Default for AudioVideoMuxer<ShellCommandRunner> {
    fn default() -> Self {
        Self::new(TranscoderConfig::from_env())
    }
}

impl<R: CommandRunner> AudioVideoMuxer<R> {
    pub fn with_runner(runner: R, transcoder: TranscoderConfig) -> Self {
        Self { runner, transcoder }
    }

    pub fn transcoder(&self) -> &TranscoderConfig {
        &self.transcoder
    }

    fn run(&self, args: &str) -> Result<(), CommandError> {
        let command_line = format!("{} {args}", self.transcoder.command_prefix());
        self.runner.run(&command_line)?;
        Ok(())
    }

    /// Writes the audio track of `video` to `out_audio`; the container is
    /// picked from the output extension.
    pub fn extract_audio(&self, video: &Path, out_audio: &Path) -> Result<PathBuf, CommandError> {
        self.run(&format!("-i {} {}", quoted(video), arg(out_audio)))?;
        Ok(out_audio.to_path_buf())
    }

    /// Muxes `audio` onto `video` with both streams copied, cut to the
    /// shorter of the two.
    pub fn add_audio(
        &self,
        audio: &Path,
        video: &Path,
        out_video: &Path,
    ) -> Result<PathBuf, CommandError> {
        self.run(&format!(
            "-i {} -i {} -c:v copy -c:a copy -shortest {}",
            quoted(video),
            quoted(audio),
            arg(out_video)
        ))?;
        Ok(out_video.to_path_buf())
    }

    /// Takes stream 0 of `no_audio_video` and stream 1 of `with_audio_video`.
    pub fn copy_audio_from_another_video(
        &self,
        no_audio_video: &Path,
        with_audio_video: &Path,
        out_video: &Path,
    ) -> Result<PathBuf, CommandError> {
        self.run(&format!(
            "-i {} -i {} -c copy -map 0:0 -map 1:1 -shortest {}",
            arg(no_audio_video),
            arg(with_audio_video),
            arg(out_video)
        ))?;
        Ok(out_video.to_path_buf())
    }

    /// Joins `videos` end to end with the concat demuxer. The list file is
    /// a temporary file in `list_dir`, removed when this returns.
    pub fn concat_videos(
        &self,
        videos: &[PathBuf],
        list_dir: &Path,
        out_video: &Path,
    ) -> Result<PathBuf, CommandError> {
        let list = concat_list(videos)
            .map_err(|e| CommandError::from_error("build concat list", &e))?;
        let list_file = tempfile::Builder::new()
            .prefix("concat_")
            .suffix(".txt")
            .tempfile_in(list_dir)
            .and_then(|mut file| {
                file.write_all(list.as_bytes())?;
                file.flush()?;
                Ok(file)
            })
            .map_err(|e| {
                CommandError::from_error(format!("write concat list in {}", list_dir.display()), &e)
            })?;

        self.run(&format!(
            "-f concat -safe 0 -i {} -c copy {}",
            arg(list_file.path()),
            arg(out_video)
        ))?;
        if let Err(e) = list_file.close() {
            log::warn!("Could not remove concat list: {e}");
        }
        Ok(out_video.to_path_buf())
    }
}

/// One `file '<path>'` line per input, in the concat demuxer's quoting.
/// Entries are made absolute: the demuxer resolves relative ones against the
/// list file's directory, not the working directory.
fn concat_list(videos: &[PathBuf]) -> Result<String, PathError> {
    videos
        .iter()
        .map(|video| {
            let absolute = path::resolve(video)?;
            let escaped = absolute.to_string_lossy().replace('\'', r"'\''");
            Ok(format!("file '{escaped}'\n"))
        })
        .collect()
}

/// Splits the inclusive frame range `start..=end` into `parts` contiguous
/// inclusive ranges. Every chunk gets `len / parts` frames and the last one
/// also takes the remainder. `parts` is capped at the number of frames so no
/// chunk is empty.
pub fn split_frame_range(start: usize, end: usize, parts: usize) -> Vec<RangeInclusive<usize>> {
    if parts == 0 || end < start {
        return Vec::new();
    }
    // u128 so `end - start + 1` cannot overflow at usize::MAX
    let total = (end - start) as u128 + 1;
    let parts = (parts as u128).min(total);
    let per_part = total / parts;
    let offset = |i: u128| start + (i * per_part) as usize;

    let mut ranges: Vec<RangeInclusive<usize>> = (0..parts - 1)
        .map(|i| offset(i)..=offset(i + 1) - 1)
        .collect();
    ranges.push(offset(parts - 1)..=end);
    ranges
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::domain::command_runner::CommandOutput;
    use rstest::rstest;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingRunner {
        commands: Mutex<Vec<String>>,
        fail: bool,
    }

    impl RecordingRunner {
        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }

        fn commands(&self) -> Vec<String> {
            self.commands.lock().unwrap().clone()
        }
    }

    impl CommandRunner for RecordingRunner {
        fn run(&self, command_line: &str) -> Result<CommandOutput, CommandError> {
            self.commands.lock().unwrap().push(command_line.to_string());
            if self.fail {
                return Err(CommandError::Failed {
                    command: command_line.to_string(),
                    kind: "ExitStatus".to_string(),
                    message: "exit status 1: boom".to_string(),
                    trace: String::new(),
                });
            }
            Ok(CommandOutput::default())
        }
    }

    fn muxer(runner: &RecordingRunner) -> AudioVideoMuxer<&RecordingRunner> {
        AudioVideoMuxer::with_runner(runner, TranscoderConfig::default())
    }

    #[test]
    fn test_extract_audio_command() {
        let runner = RecordingRunner::default();
        let out = muxer(&runner)
            .extract_audio(Path::new("/in/clip.mp4"), Path::new("/out/clip.wav"))
            .unwrap();
        assert_eq!(out, PathBuf::from("/out/clip.wav"));
        assert_eq!(
            runner.commands(),
            vec![r#"ffmpeg -loglevel warning -y -i "/in/clip.mp4" /out/clip.wav"#]
        );
    }

    #[test]
    fn test_add_audio_command() {
        let runner = RecordingRunner::default();
        let out = muxer(&runner)
            .add_audio(
                Path::new("/in/voice.wav"),
                Path::new("/in/clip.mp4"),
                Path::new("/out/final.mp4"),
            )
            .unwrap();
        assert_eq!(out, PathBuf::from("/out/final.mp4"));
        assert_eq!(
            runner.commands(),
            vec![
                r#"ffmpeg -loglevel warning -y -i "/in/clip.mp4" -i "/in/voice.wav" -c:v copy -c:a copy -shortest /out/final.mp4"#
            ]
        );
    }

    #[test]
    fn test_copy_audio_command() {
        let runner = RecordingRunner::default();
        muxer(&runner)
            .copy_audio_from_another_video(
                Path::new("/a/silent.mp4"),
                Path::new("/a/loud.mp4"),
                Path::new("/a/out.mp4"),
            )
            .unwrap();
        assert_eq!(
            runner.commands(),
            vec!["ffmpeg -loglevel warning -y -i /a/silent.mp4 -i /a/loud.mp4 -c copy -map 0:0 -map 1:1 -shortest /a/out.mp4"]
        );
    }

    #[test]
    fn test_paths_with_spaces_are_quoted() {
        let runner = RecordingRunner::default();
        muxer(&runner)
            .extract_audio(Path::new("/in/my clip.mp4"), Path::new("/out/my clip.wav"))
            .unwrap();
        assert_eq!(
            runner.commands(),
            vec![r#"ffmpeg -loglevel warning -y -i "/in/my clip.mp4" "/out/my clip.wav""#]
        );
    }

    #[test]
    fn test_custom_transcoder_program() {
        let runner = RecordingRunner::default();
        let transcoder = TranscoderConfig {
            program: "/opt/ffmpeg/bin/ffmpeg".to_string(),
            ..TranscoderConfig::default()
        };
        AudioVideoMuxer::with_runner(&runner, transcoder)
            .extract_audio(Path::new("/v.mp4"), Path::new("/a.aac"))
            .unwrap();
        assert!(runner.commands()[0].starts_with("/opt/ffmpeg/bin/ffmpeg -loglevel warning -y "));
    }

    #[test]
    fn test_failure_propagates() {
        let runner = RecordingRunner::failing();
        let err = muxer(&runner)
            .add_audio(Path::new("/a.wav"), Path::new("/v.mp4"), Path::new("/o.mp4"))
            .unwrap_err();
        assert!(err.command().contains("-shortest /o.mp4"));
    }

    #[test]
    fn test_concat_writes_list_and_removes_it() {
        let dir = tempfile::tempdir().unwrap();
        let runner = RecordingRunner::default();
        let videos = vec![PathBuf::from("/v/part1.mp4"), PathBuf::from("/v/it's.mp4")];

        let out = muxer(&runner)
            .concat_videos(&videos, dir.path(), Path::new("/v/all.mp4"))
            .unwrap();
        assert_eq!(out, PathBuf::from("/v/all.mp4"));

        let commands = runner.commands();
        assert_eq!(commands.len(), 1);
        assert!(commands[0].starts_with("ffmpeg -loglevel warning -y -f concat -safe 0 -i "));
        assert!(commands[0].ends_with(" -c copy /v/all.mp4"));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_concat_removes_list_on_failure() {
        let dir = tempfile::tempdir().unwrap();
        let runner = RecordingRunner::failing();
        let result = muxer(&runner).concat_videos(
            &[PathBuf::from("/v/a.mp4")],
            dir.path(),
            Path::new("/v/out.mp4"),
        );
        assert!(result.is_err());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_concat_list_escapes_quotes() {
        let list = concat_list(&[PathBuf::from("/v/a.mp4"), PathBuf::from("/v/it's.mp4")]).unwrap();
        assert_eq!(list, "file '/v/a.mp4'\nfile '/v/it'\\''s.mp4'\n");
    }

    #[test]
    fn test_concat_list_makes_relative_entries_absolute() {
        let cwd = std::env::current_dir().unwrap().canonicalize().unwrap();
        let list = concat_list(&[PathBuf::from("clips/a.mp4")]).unwrap();
        let expected = cwd.join("clips/a.mp4");
        assert_eq!(list, format!("file '{}'\n", expected.display()));
    }

    #[rstest]
    #[case::even(0, 9, 2, vec![0..=4, 5..=9])]
    #[case::remainder(10, 19, 3, vec![10..=12, 13..=15, 16..=19])]
    #[case::single(4, 4, 1, vec![4..=4])]
    #[case::more_parts_than_frames(0, 1, 5, vec![0..=0, 1..=1])]
    #[case::zero_parts(0, 9, 0, vec![])]
    #[case::inverted(5, 2, 2, vec![])]
    #[case::ends_at_max(usize::MAX - 3, usize::MAX, 2, vec![usize::MAX - 3..=usize::MAX - 2, usize::MAX - 1..=usize::MAX])]
    #[case::whole_domain(0, usize::MAX, 1, vec![0..=usize::MAX])]
    fn test_split_frame_range(
        #[case] start: usize,
        #[case] end: usize,
        #[case] parts: usize,
        #[case] expected: Vec<RangeInclusive<usize>>,
    ) {
        assert_eq!(split_frame_range(start, end, parts), expected);
    }
}

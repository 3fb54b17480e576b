pub mod audio_video_muxer;

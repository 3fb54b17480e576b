pub mod ffmpeg_encoder;
pub mod ffmpeg_reader;
pub mod frame_directory_reader;
pub mod png_pipe_encoder;
pub mod writer_factory;

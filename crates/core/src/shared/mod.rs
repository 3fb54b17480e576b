pub mod config;
pub mod frame;
pub mod path;
pub mod video_metadata;

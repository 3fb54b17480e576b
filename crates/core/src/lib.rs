pub mod audio;
pub mod probe;
pub mod process;
pub mod shared;
pub mod video;

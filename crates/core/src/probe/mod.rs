pub mod media_metadata;
pub mod mediainfo_probe;

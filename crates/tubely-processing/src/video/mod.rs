//! Video processing module

pub mod ffmpeg;
pub mod probe;
pub mod tool;

pub use ffmpeg::{FFmpegTool, FFmpegToolConfig};
pub use tool::MediaTool;

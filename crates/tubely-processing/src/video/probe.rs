//! Parsing of `ffprobe -print_format json -show_streams` output.

use serde::Deserialize;
use tubely_core::{AppError, VideoGeometry};

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
}

/// Geometry of the first stream in the probe output.
pub fn parse_geometry(stdout: &[u8]) -> Result<VideoGeometry, AppError> {
    let output: ProbeOutput = serde_json::from_slice(stdout)
        .map_err(|e| AppError::InspectionFailed(format!("Failed to parse ffprobe output: {}", e)))?;

    let stream = output
        .streams
        .first()
        .ok_or_else(|| AppError::InspectionFailed("no video streams found".to_string()))?;

    match (stream.width, stream.height) {
        (Some(width), Some(height)) => Ok(VideoGeometry::new(width, height)),
        _ => Err(AppError::InspectionFailed(format!(
            "first stream ({}) has no dimensions",
            stream.codec_type.as_deref().unwrap_or("unknown")
        ))),
    }
}

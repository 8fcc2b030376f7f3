use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tubely_core::{AppError, VideoGeometry};

/// External media capability used by the upload pipeline.
///
/// Implementations may shell out to a subprocess or bind a codec library.
#[async_trait]
pub trait MediaTool: Send + Sync {
    /// Rewrite `input` for progressive playback without re-encoding and return
    /// the path of the new file.
    ///
    /// The output must be written next to `input` (in the same directory) so
    /// it is removed together with the staged upload. A missing or empty output
    /// is `NormalizationFailed`.
    async fn normalize(&self, input: &Path) -> Result<PathBuf, AppError>;

    /// Report the geometry of the first video stream in `path`.
    async fn inspect(&self, path: &Path) -> Result<VideoGeometry, AppError>;
}

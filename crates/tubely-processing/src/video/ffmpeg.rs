//! `MediaTool` backed by the ffmpeg and ffprobe executables.

use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use std::time::{Duration, Instant};
use tokio::process::Command;
use tubely_core::{AppError, Config, VideoGeometry};

use super::probe;
use super::tool::MediaTool;

const BYTES_PER_100MB: u64 = 100 * 1024 * 1024;
const PROCESSING_SUFFIX: &str = ".processing";

/// Executables and time limits for [`FFmpegTool`].
#[derive(Debug, Clone)]
pub struct FFmpegToolConfig {
    pub ffmpeg_path: String,
    pub ffprobe_path: String,
    pub transcode_timeout: Duration,
    pub transcode_timeout_per_100mb: Duration,
    pub probe_timeout: Duration,
}

impl FFmpegToolConfig {
    /// Normalizer limit for an input of `size_bytes`: the base timeout plus
    /// the per-100MB extension for every started 100MB.
    pub fn transcode_timeout_for(&self, size_bytes: u64) -> Duration {
        let chunks = size_bytes.div_ceil(BYTES_PER_100MB);
        self.transcode_timeout + self.transcode_timeout_per_100mb * chunks as u32
    }
}

impl From<&Config> for FFmpegToolConfig {
    fn from(config: &Config) -> Self {
        Self {
            ffmpeg_path: config.ffmpeg_path.clone(),
            ffprobe_path: config.ffprobe_path.clone(),
            transcode_timeout: Duration::from_secs(config.transcode_timeout_secs),
            transcode_timeout_per_100mb: Duration::from_secs(
                config.transcode_timeout_secs_per_100mb,
            ),
            probe_timeout: config.probe_timeout(),
        }
    }
}

/// Validate that a tool path doesn't contain shell metacharacters
fn validate_tool_path(name: &str, path: &str) -> Result<(), AppError> {
    let dangerous_chars = [';', '|', '&', '$', '`', '(', ')', '<', '>', '\n', '\r'];
    if path.trim().is_empty() || path.chars().any(|c| dangerous_chars.contains(&c)) {
        return Err(AppError::Internal(format!(
            "Invalid {} path: {:?}",
            name, path
        )));
    }
    Ok(())
}

/// Sibling path for the fast-start output of `input`.
fn processing_path(input: &Path) -> PathBuf {
    let mut path: OsString = input.as_os_str().to_owned();
    path.push(PROCESSING_SUFFIX);
    PathBuf::from(path)
}

async fn remove_partial(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!(error = %e, path = %path.display(), "Failed to remove partial output");
        }
    }
}

/// Run an external tool to completion within `timeout`.
///
/// The child is killed if the deadline passes. Non-zero exit and spawn
/// failures are reported through `fail` with stderr attached.
async fn run_tool(
    mut command: Command,
    operation: &'static str,
    timeout: Duration,
    fail: fn(String) -> AppError,
) -> Result<Output, AppError> {
    command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let start = Instant::now();
    let output = match tokio::time::timeout(timeout, command.output()).await {
        Ok(result) => result.map_err(|e| fail(format!("Failed to execute {}: {}", operation, e)))?,
        Err(_) => {
            tracing::warn!(
                operation = operation,
                timeout_secs = timeout.as_secs(),
                "External tool timed out"
            );
            return Err(AppError::timed_out(operation, timeout));
        }
    };

    let stderr = String::from_utf8_lossy(&output.stderr);
    let stderr = stderr.trim();

    if !output.status.success() {
        tracing::warn!(
            operation = operation,
            status = %output.status,
            stderr = %stderr,
            duration_ms = start.elapsed().as_millis(),
            "External tool failed"
        );
        return Err(fail(format!(
            "{} exited with {}: {}",
            operation, output.status, stderr
        )));
    }

    if !stderr.is_empty() {
        tracing::debug!(operation = operation, stderr = %stderr, "External tool stderr");
    }

    Ok(output)
}

pub struct FFmpegTool {
    config: FFmpegToolConfig,
}

impl FFmpegTool {
    pub fn new(config: FFmpegToolConfig) -> Result<Self, AppError> {
        validate_tool_path("ffmpeg", &config.ffmpeg_path)?;
        validate_tool_path("ffprobe", &config.ffprobe_path)?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &FFmpegToolConfig {
        &self.config
    }
}

#[async_trait]
impl MediaTool for FFmpegTool {
    #[tracing::instrument(skip(self), fields(
        process.executable.name = "ffmpeg",
        process.executable.path = %self.config.ffmpeg_path,
        ffmpeg.operation = "faststart"
    ))]
    async fn normalize(&self, input: &Path) -> Result<PathBuf, AppError> {
        let start = Instant::now();

        let input_size = tokio::fs::metadata(input)
            .await
            .map_err(|e| {
                AppError::NormalizationFailed(format!(
                    "Could not read input {}: {}",
                    input.display(),
                    e
                ))
            })?
            .len();
        let output_path = processing_path(input);
        let timeout = self.config.transcode_timeout_for(input_size);

        let mut command = Command::new(&self.config.ffmpeg_path);
        command
            .args(["-y", "-v", "error", "-i"])
            .arg(input)
            .args(["-c", "copy", "-movflags", "faststart", "-f", "mp4"])
            .arg(&output_path);

        if let Err(e) = run_tool(command, "ffmpeg", timeout, AppError::NormalizationFailed).await {
            remove_partial(&output_path).await;
            return Err(e);
        }

        let size = match tokio::fs::metadata(&output_path).await {
            Ok(metadata) => metadata.len(),
            Err(e) => {
                return Err(AppError::NormalizationFailed(format!(
                    "processed file is missing: {}",
                    e
                )))
            }
        };
        if size == 0 {
            remove_partial(&output_path).await;
            return Err(AppError::NormalizationFailed(
                "processed file is empty".to_string(),
            ));
        }

        tracing::info!(
            input_size_bytes = input_size,
            size_bytes = size,
            duration_ms = start.elapsed().as_millis(),
            "Video normalized for fast start"
        );

        Ok(output_path)
    }

    #[tracing::instrument(skip(self), fields(
        process.executable.name = "ffprobe",
        process.executable.path = %self.config.ffprobe_path,
        ffmpeg.operation = "probe"
    ))]
    async fn inspect(&self, path: &Path) -> Result<VideoGeometry, AppError> {
        let start = Instant::now();

        let mut command = Command::new(&self.config.ffprobe_path);
        command
            .args([
                "-v",
                "error",
                "-print_format",
                "json",
                "-show_streams",
                "-select_streams",
                "v:0",
            ])
            .arg(path);

        let output = run_tool(
            command,
            "ffprobe",
            self.config.probe_timeout,
            AppError::InspectionFailed,
        )
        .await?;

        let geometry = probe::parse_geometry(&output.stdout)?;

        tracing::info!(
            width = geometry.width,
            height = geometry.height,
            duration_ms = start.elapsed().as_millis(),
            "Video probe completed"
        );

        Ok(geometry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn config(ffmpeg: &str, ffprobe: &str) -> FFmpegToolConfig {
        FFmpegToolConfig {
            ffmpeg_path: ffmpeg.to_string(),
            ffprobe_path: ffprobe.to_string(),
            transcode_timeout: Duration::from_secs(30),
            transcode_timeout_per_100mb: Duration::from_secs(10),
            probe_timeout: Duration::from_secs(20),
        }
    }

    #[test]
    fn test_transcode_timeout_scales_with_size() {
        let config = config("ffmpeg", "ffprobe");
        assert_eq!(config.transcode_timeout_for(0), Duration::from_secs(30));
        assert_eq!(config.transcode_timeout_for(1), Duration::from_secs(40));
        assert_eq!(
            config.transcode_timeout_for(BYTES_PER_100MB),
            Duration::from_secs(40)
        );
        assert_eq!(config.transcode_timeout_for(1 << 30), Duration::from_secs(140));
    }

    #[test]
    fn test_processing_path_is_sibling() {
        let input = Path::new("/tmp/tubely-upload-x/upload.mp4");
        assert_eq!(
            processing_path(input),
            PathBuf::from("/tmp/tubely-upload-x/upload.mp4.processing")
        );
    }

    #[test]
    fn test_rejects_unsafe_tool_paths() {
        assert!(FFmpegTool::new(config("ffmpeg; rm -rf /", "ffprobe")).is_err());
        assert!(FFmpegTool::new(config("ffmpeg", "$(ffprobe)")).is_err());
        assert!(FFmpegTool::new(config("", "ffprobe")).is_err());
        assert!(FFmpegTool::new(config("/usr/local/bin/ffmpeg", "ffprobe")).is_ok());
    }

    #[tokio::test]
    async fn test_missing_executable_is_normalization_failure() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("upload.mp4");
        tokio::fs::write(&input, b"not really mp4").await.unwrap();

        let tool = FFmpegTool::new(config("/nonexistent/ffmpeg", "/nonexistent/ffprobe")).unwrap();

        let result = tool.normalize(&input).await;
        assert!(matches!(result, Err(AppError::NormalizationFailed(_))));

        let result = tool.inspect(&input).await;
        assert!(matches!(result, Err(AppError::InspectionFailed(_))));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_success_without_output_is_normalization_failure() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("upload.mp4");
        tokio::fs::write(&input, b"not really mp4").await.unwrap();

        // `true` exits 0 and writes nothing
        let tool = FFmpegTool::new(config("true", "true")).unwrap();

        let result = tool.normalize(&input).await;
        assert!(matches!(result, Err(AppError::NormalizationFailed(ref msg)) if msg.contains("missing")));

        let result = tool.inspect(&input).await;
        assert!(matches!(result, Err(AppError::InspectionFailed(_))));
    }
}

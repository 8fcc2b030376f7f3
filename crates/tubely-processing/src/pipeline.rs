//! Upload pipeline: authorize → validate → stage → normalize → inspect → store → record.
//!
//! Stages run strictly in order and nothing is retried. Local artifacts live in
//! the invocation's staging directory and are released when [`UploadPipeline::upload`]
//! returns, whatever the outcome.

use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tempfile::TempPath;
use tokio::io::AsyncRead;
use tubely_core::constants::VIDEO_CONTENT_TYPE;
use tubely_core::{AppError, Config, LocationScheme, Video};
use tubely_storage::{generate_video_key, Storage};
use uuid::Uuid;

use crate::log_app_error;
use crate::repository::VideoRepository;
use crate::resolver::location_for;
use crate::staging::StagingArea;
use crate::validator::MediaValidator;
use crate::video::MediaTool;

/// Settings for [`UploadPipeline`].
#[derive(Debug, Clone)]
pub struct UploadPipelineConfig {
    /// Bucket receiving uploaded videos
    pub bucket: String,
    pub location_scheme: LocationScheme,
    pub max_upload_bytes: u64,
    /// Parent of the per-invocation staging directory; system temp when `None`
    pub temp_dir: Option<PathBuf>,
    /// Limit for each remote put or delete
    pub storage_timeout: Duration,
}

impl From<&Config> for UploadPipelineConfig {
    fn from(config: &Config) -> Self {
        Self {
            bucket: config.video_bucket().to_string(),
            location_scheme: config.location_scheme,
            max_upload_bytes: config.max_upload_bytes,
            temp_dir: config.upload_temp_dir.clone(),
            storage_timeout: config.storage_timeout(),
        }
    }
}

/// One upload: the target record, the caller, and the request body.
pub struct UploadRequest<R> {
    pub video_id: Uuid,
    pub user_id: Uuid,
    /// Declared `Content-Type`, as received
    pub content_type: Option<String>,
    pub body: R,
}

pub struct UploadPipeline {
    config: UploadPipelineConfig,
    storage: Arc<dyn Storage>,
    media_tool: Arc<dyn MediaTool>,
    repository: Arc<dyn VideoRepository>,
    validator: MediaValidator,
    staging: StagingArea,
}

impl UploadPipeline {
    pub fn new(
        config: UploadPipelineConfig,
        storage: Arc<dyn Storage>,
        media_tool: Arc<dyn MediaTool>,
        repository: Arc<dyn VideoRepository>,
    ) -> Self {
        let staging = StagingArea::new(config.temp_dir.clone(), config.max_upload_bytes);
        Self {
            config,
            storage,
            media_tool,
            repository,
            validator: MediaValidator::new(vec![VIDEO_CONTENT_TYPE.to_string()]),
            staging,
        }
    }

    pub fn config(&self) -> &UploadPipelineConfig {
        &self.config
    }

    /// Ingest a video body for an existing record and return the updated
    /// record as stored.
    ///
    /// Ownership and content type are checked before anything touches disk.
    /// If the record cannot be updated after the object was stored, the object
    /// is deleted again and `MetadataStore` is returned.
    #[tracing::instrument(skip(self, request), fields(
        video_id = %request.video_id,
        user_id = %request.user_id
    ))]
    pub async fn upload<R>(&self, request: UploadRequest<R>) -> Result<Video, AppError>
    where
        R: AsyncRead + Unpin + Send,
    {
        let start = Instant::now();
        let result = self.run(request).await;

        match &result {
            Ok(video) => tracing::info!(
                video_id = %video.id,
                location = ?video.video_location.as_ref().map(|l| l.to_stored()),
                duration_ms = start.elapsed().as_millis(),
                "Video upload completed"
            ),
            Err(e) => log_app_error(e, "Video upload failed"),
        }

        result
    }

    async fn run<R>(&self, request: UploadRequest<R>) -> Result<Video, AppError>
    where
        R: AsyncRead + Unpin + Send,
    {
        let UploadRequest {
            video_id,
            user_id,
            content_type,
            body,
        } = request;

        let mut video = self.repository.get(video_id).await?;
        if !video.is_owned_by(user_id) {
            return Err(AppError::Unauthorized(
                "Current user can't modify this video".to_string(),
            ));
        }

        let content_type = self
            .validator
            .validate_content_type(content_type.as_deref())?;

        let staged = self.staging.stage(body).await?;

        // Removed on drop, even if the tool wrote outside the staging directory.
        let normalized = TempPath::try_from_path(self.media_tool.normalize(staged.path()).await?)
            .map_err(|e| {
                AppError::NormalizationFailed(format!("Could not track normalized output: {}", e))
            })?;
        let size = ensure_non_empty(&normalized).await?;

        let geometry = self.media_tool.inspect(&normalized).await?;
        let orientation = geometry.orientation()?;

        let bucket = self.config.bucket.as_str();
        let key = generate_video_key(orientation);

        self.put_object(bucket, &key, &normalized, &content_type, size)
            .await?;

        video.video_location = Some(location_for(
            self.storage.as_ref(),
            self.config.location_scheme,
            bucket,
            &key,
        ));
        video.updated_at = Utc::now();

        if let Err(e) = self.repository.update(&video).await {
            self.remove_orphan(bucket, &key).await;
            return Err(match e {
                AppError::MetadataStore(_) => e,
                other => AppError::MetadataStore(other.to_string()),
            });
        }

        tracing::info!(
            orientation = %orientation,
            width = geometry.width,
            height = geometry.height,
            bucket = %bucket,
            key = %key,
            "Video record updated"
        );

        Ok(video)
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        path: &Path,
        content_type: &str,
        size: u64,
    ) -> Result<(), AppError> {
        let timeout = self.config.storage_timeout;
        let upload = self.storage.upload_file(bucket, key, path, content_type);

        match tokio::time::timeout(timeout, upload).await {
            Ok(Ok(stored)) => {
                tracing::debug!(
                    bucket = %bucket,
                    key = %key,
                    size_bytes = stored,
                    "Video stored"
                );
                Ok(())
            }
            Ok(Err(e)) => Err(AppError::UploadFailed(format!(
                "{} ({} bytes to {}/{})",
                e, size, bucket, key
            ))),
            Err(_) => Err(AppError::timed_out("upload", timeout)),
        }
    }

    /// Best-effort delete of an object no record points at.
    async fn remove_orphan(&self, bucket: &str, key: &str) {
        let timeout = self.config.storage_timeout;
        match tokio::time::timeout(timeout, self.storage.delete(bucket, key)).await {
            Ok(Ok(())) => {
                tracing::warn!(bucket = %bucket, key = %key, "Removed orphaned video object");
            }
            Ok(Err(e)) => {
                tracing::error!(
                    error = %e,
                    bucket = %bucket,
                    key = %key,
                    "Failed to remove orphaned video object"
                );
            }
            Err(_) => {
                tracing::error!(
                    bucket = %bucket,
                    key = %key,
                    timeout_secs = timeout.as_secs(),
                    "Timed out removing orphaned video object"
                );
            }
        }
    }
}

async fn ensure_non_empty(path: &Path) -> Result<u64, AppError> {
    let metadata = tokio::fs::metadata(path).await.map_err(|e| {
        AppError::NormalizationFailed(format!("Could not open processed video: {}", e))
    })?;
    if metadata.len() == 0 {
        return Err(AppError::NormalizationFailed(
            "processed file is empty".to_string(),
        ));
    }
    Ok(metadata.len())
}

//! Key scheme and read-time URL resolution.
//!
//! Write path: [`location_for`] turns a bucket and storage key into the
//! location persisted on the record. Read path: [`LocationResolver`] turns a
//! persisted record into a [`VideoResponse`] whose `video_url` the client can
//! fetch, signing indirect locations on the fly. Resolution never touches the
//! stored record.

use chrono::{SubsecRound, Utc};
use std::sync::Arc;
use std::time::Duration;
use tubely_core::{AppError, Config, LocationScheme, Video, VideoLocation, VideoResponse};
use tubely_storage::Storage;

use crate::log_app_error;

/// Location to persist for an object just written to `bucket`/`key`.
pub fn location_for(
    storage: &dyn Storage,
    scheme: LocationScheme,
    bucket: &str,
    key: &str,
) -> VideoLocation {
    match scheme {
        LocationScheme::Indirect => VideoLocation::indirect(bucket, key),
        LocationScheme::Direct => VideoLocation::direct(storage.public_url(bucket, key)),
    }
}

/// A failed resolution, carrying the record exactly as it was read.
#[derive(Debug, thiserror::Error)]
#[error("Could not resolve location of video {}: {error}", .video.id)]
pub struct ResolveError {
    pub video: Box<Video>,
    #[source]
    pub error: AppError,
}

impl ResolveError {
    fn new(video: Video, error: AppError) -> Self {
        Self {
            video: Box::new(video),
            error,
        }
    }

    pub fn into_parts(self) -> (Video, AppError) {
        (*self.video, self.error)
    }
}

pub struct LocationResolver {
    storage: Arc<dyn Storage>,
    ttl: Duration,
    storage_timeout: Duration,
}

impl LocationResolver {
    pub fn new(storage: Arc<dyn Storage>, ttl: Duration, storage_timeout: Duration) -> Self {
        Self {
            storage,
            ttl,
            storage_timeout,
        }
    }

    pub fn from_config(storage: Arc<dyn Storage>, config: &Config) -> Self {
        Self::new(storage, config.signed_url_ttl(), config.storage_timeout())
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Prepare a record for delivery.
    ///
    /// Records without a location and direct records pass through with their
    /// URL unchanged. Indirect records get a URL signed for the configured
    /// window.
    #[tracing::instrument(skip(self, video), fields(video_id = %video.id))]
    pub async fn resolve(&self, video: Video) -> Result<VideoResponse, ResolveError> {
        let (bucket, key) = match &video.video_location {
            None => return Ok(VideoResponse::with_url(&video, None, None)),
            Some(VideoLocation::Direct(url)) => {
                return Ok(VideoResponse::with_url(&video, Some(url.clone()), None))
            }
            Some(VideoLocation::Indirect { bucket, key }) => (bucket.as_str(), key.as_str()),
        };

        if bucket.is_empty() {
            let error = AppError::MalformedLocation(format!(
                "location {:?} has an empty bucket",
                VideoLocation::indirect(bucket, key).to_stored()
            ));
            log_app_error(&error, "Video location is malformed");
            return Err(ResolveError::new(video, error));
        }

        let issued_at = Utc::now().trunc_subsecs(0);
        let signed = tokio::time::timeout(
            self.storage_timeout,
            self.storage.presigned_get_url(bucket, key, self.ttl),
        )
        .await;

        let url = match signed {
            Ok(Ok(url)) => url,
            Ok(Err(e)) => {
                let error = AppError::SigningFailed(e.to_string());
                log_app_error(&error, "Could not sign video location");
                return Err(ResolveError::new(video, error));
            }
            Err(_) => {
                let error = AppError::timed_out("presign", self.storage_timeout);
                log_app_error(&error, "Could not sign video location");
                return Err(ResolveError::new(video, error));
            }
        };

        // Signers stamp whole seconds at or after `issued_at`, so the
        // reported expiry never outlives the URL.
        let expires_at = chrono::Duration::from_std(self.ttl)
            .ok()
            .map(|ttl| issued_at + ttl);

        tracing::debug!(
            bucket = %bucket,
            key = %key,
            ttl_secs = self.ttl.as_secs(),
            "Signed video location"
        );

        Ok(VideoResponse::with_url(&video, Some(url), expires_at))
    }

    /// Resolve records for a listing, stopping at the first failure.
    pub async fn resolve_all(&self, videos: Vec<Video>) -> Result<Vec<VideoResponse>, ResolveError> {
        let mut resolved = Vec::with_capacity(videos.len());
        for video in videos {
            resolved.push(self.resolve(video).await?);
        }
        Ok(resolved)
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::location::VideoLocation;

/// A video record as held by the metadata store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Video {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub thumbnail_url: Option<String>,
    #[serde(rename = "video_url")]
    pub video_location: Option<VideoLocation>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Video {
    pub fn new(user_id: Uuid, title: impl Into<String>, description: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            title: title.into(),
            description,
            thumbnail_url: None,
            video_location: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.user_id == user_id
    }
}

/// A video record prepared for delivery.
///
/// `video_url` is directly usable; for indirect records it is a signed URL
/// valid until `video_url_expires_at`. This type is never written back to
/// the metadata store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub thumbnail_url: Option<String>,
    pub video_url: Option<String>,
    pub video_url_expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl VideoResponse {
    /// Build a response carrying `video_url` in place of the stored location.
    pub fn with_url(
        video: &Video,
        video_url: Option<String>,
        video_url_expires_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id: video.id,
            user_id: video.user_id,
            title: video.title.clone(),
            description: video.description.clone(),
            thumbnail_url: video.thumbnail_url.clone(),
            video_url,
            video_url_expires_at,
            created_at: video.created_at,
            updated_at: video.updated_at,
        }
    }
}

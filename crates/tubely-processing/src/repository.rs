//! Video metadata store port.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tubely_core::{AppError, Video};
use uuid::Uuid;

/// Access to persisted video records.
///
/// Records are stored exactly as given; in particular the location is kept in
/// its persisted form and never replaced by a signed URL.
#[async_trait]
pub trait VideoRepository: Send + Sync {
    /// Fetch a record, or `NotFound`.
    async fn get(&self, id: Uuid) -> Result<Video, AppError>;

    /// Replace an existing record. Fails with `NotFound` when it does not exist.
    async fn update(&self, video: &Video) -> Result<(), AppError>;

    /// All records, oldest first.
    async fn list(&self) -> Result<Vec<Video>, AppError>;
}

/// In-process repository
#[derive(Clone, Default)]
pub struct InMemoryVideoRepository {
    videos: Arc<RwLock<HashMap<Uuid, Video>>>,
}

impl InMemoryVideoRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, video: Video) {
        self.videos.write().await.insert(video.id, video);
    }
}

#[async_trait]
impl VideoRepository for InMemoryVideoRepository {
    async fn get(&self, id: Uuid) -> Result<Video, AppError> {
        self.videos
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Couldn't find video {}", id)))
    }

    async fn update(&self, video: &Video) -> Result<(), AppError> {
        let mut videos = self.videos.write().await;
        match videos.get_mut(&video.id) {
            Some(existing) => {
                *existing = video.clone();
                Ok(())
            }
            None => Err(AppError::NotFound(format!(
                "Couldn't find video {}",
                video.id
            ))),
        }
    }

    async fn list(&self) -> Result<Vec<Video>, AppError> {
        let mut videos: Vec<Video> = self.videos.read().await.values().cloned().collect();
        videos.sort_by_key(|v| v.created_at);
        Ok(videos)
    }
}

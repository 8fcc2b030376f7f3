//! Video catalog kept in a JSON file.
//!
//! The file holds an array of video records with locations in their persisted
//! form. Every write replaces the whole file atomically.

use async_trait::async_trait;
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tubely_core::{AppError, Video};
use tubely_processing::VideoRepository;
use uuid::Uuid;

pub struct JsonCatalog {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process.
    lock: Mutex<()>,
}

impl JsonCatalog {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn create(&self, video: &Video) -> Result<(), AppError> {
        let _guard = self.lock.lock().await;
        let mut videos = self.load().await?;
        if videos.iter().any(|v| v.id == video.id) {
            return Err(AppError::BadInput(format!(
                "Video {} already exists",
                video.id
            )));
        }
        videos.push(video.clone());
        self.save(&videos).await
    }

    async fn load(&self) -> Result<Vec<Video>, AppError> {
        match tokio::fs::read(&self.path).await {
            Ok(data) if data.is_empty() => Ok(Vec::new()),
            Ok(data) => Ok(serde_json::from_slice(&data)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(AppError::MetadataStore(format!(
                "Failed to read catalog {}: {}",
                self.path.display(),
                e
            ))),
        }
    }

    async fn save(&self, videos: &[Video]) -> Result<(), AppError> {
        let data = serde_json::to_vec_pretty(videos)?;
        let path = self.path.clone();

        tokio::task::spawn_blocking(move || write_atomically(&path, &data))
            .await
            .map_err(|e| AppError::Internal(format!("Catalog writer panicked: {}", e)))?
            .map_err(|e| AppError::MetadataStore(format!("Failed to write catalog: {}", e)))
    }
}

fn write_atomically(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut file = tempfile::NamedTempFile::new_in(dir)?;
    file.write_all(data)?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[async_trait]
impl VideoRepository for JsonCatalog {
    async fn get(&self, id: Uuid) -> Result<Video, AppError> {
        self.load()
            .await?
            .into_iter()
            .find(|v| v.id == id)
            .ok_or_else(|| AppError::NotFound(format!("Couldn't find video {}", id)))
    }

    async fn update(&self, video: &Video) -> Result<(), AppError> {
        let _guard = self.lock.lock().await;
        let mut videos = self.load().await?;
        let existing = videos
            .iter_mut()
            .find(|v| v.id == video.id)
            .ok_or_else(|| AppError::NotFound(format!("Couldn't find video {}", video.id)))?;
        *existing = video.clone();
        self.save(&videos).await
    }

    async fn list(&self) -> Result<Vec<Video>, AppError> {
        let mut videos = self.load().await?;
        videos.sort_by_key(|v| v.created_at);
        Ok(videos)
    }
}

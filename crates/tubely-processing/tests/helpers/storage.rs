use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tubely_storage::{Storage, StorageBackend, StorageError, StorageResult};

#[derive(Debug, Clone, PartialEq)]
pub struct StoredObject {
    pub data: Vec<u8>,
    pub content_type: String,
}

/// In-memory object store with switchable failures
#[derive(Clone, Default)]
pub struct MockStorage {
    objects: Arc<Mutex<HashMap<(String, String), StoredObject>>>,
    signed: Arc<Mutex<Vec<(String, String, Duration)>>>,
    deleted: Arc<Mutex<Vec<(String, String)>>>,
    fail_uploads: Arc<AtomicBool>,
    fail_signing: Arc<AtomicBool>,
    upload_delay: Arc<Mutex<Option<Duration>>>,
}

impl MockStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_uploads() -> Self {
        let storage = Self::new();
        storage.fail_uploads.store(true, Ordering::SeqCst);
        storage
    }

    /// Uploads that take `delay` before storing the object.
    pub fn slow_uploads(delay: Duration) -> Self {
        let storage = Self::new();
        *storage.upload_delay.lock().unwrap() = Some(delay);
        storage
    }

    pub fn set_fail_signing(&self, fail: bool) {
        self.fail_signing.store(fail, Ordering::SeqCst);
    }

    pub fn object(&self, bucket: &str, key: &str) -> Option<StoredObject> {
        self.objects
            .lock()
            .unwrap()
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }

    pub fn object_count(&self) -> usize {
        self.objects.lock().unwrap().len()
    }

    pub fn keys(&self) -> Vec<(String, String)> {
        self.objects.lock().unwrap().keys().cloned().collect()
    }

    pub fn signed_requests(&self) -> Vec<(String, String, Duration)> {
        self.signed.lock().unwrap().clone()
    }

    pub fn deleted(&self) -> Vec<(String, String)> {
        self.deleted.lock().unwrap().clone()
    }
}

#[async_trait]
impl Storage for MockStorage {
    async fn upload_file(
        &self,
        bucket: &str,
        key: &str,
        path: &Path,
        content_type: &str,
    ) -> StorageResult<u64> {
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(StorageError::UploadFailed("access denied".to_string()));
        }
        let delay = *self.upload_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let data = tokio::fs::read(path).await?;
        let size = data.len() as u64;
        self.objects.lock().unwrap().insert(
            (bucket.to_string(), key.to_string()),
            StoredObject {
                data,
                content_type: content_type.to_string(),
            },
        );
        Ok(size)
    }

    async fn delete(&self, bucket: &str, key: &str) -> StorageResult<()> {
        self.deleted
            .lock()
            .unwrap()
            .push((bucket.to_string(), key.to_string()));
        self.objects
            .lock()
            .unwrap()
            .remove(&(bucket.to_string(), key.to_string()));
        Ok(())
    }

    async fn exists(&self, bucket: &str, key: &str) -> StorageResult<bool> {
        Ok(self.object(bucket, key).is_some())
    }

    async fn presigned_get_url(
        &self,
        bucket: &str,
        key: &str,
        expires_in: Duration,
    ) -> StorageResult<String> {
        if self.fail_signing.load(Ordering::SeqCst) {
            return Err(StorageError::SigningFailed("no credentials".to_string()));
        }
        self.signed
            .lock()
            .unwrap()
            .push((bucket.to_string(), key.to_string(), expires_in));
        Ok(format!(
            "https://signed.example.com/{}/{}?expires_in={}&signature=test",
            bucket,
            key,
            expires_in.as_secs()
        ))
    }

    fn public_url(&self, bucket: &str, key: &str) -> String {
        format!("https://public.example.com/{}/{}", bucket, key)
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::S3
    }
}

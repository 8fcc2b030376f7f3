use crate::keys::validate_key;
use crate::traits::{Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;

type HmacSha256 = Hmac<Sha256>;

/// Local filesystem storage implementation
///
/// Objects live at `{base_path}/{bucket}/{key}` and are served from
/// `{base_url}/{bucket}/{key}`. Signed URLs append `expires` (unix seconds)
/// and `signature`, the hex HMAC-SHA256 of `{bucket}/{key}\n{expires}`; the
/// serving side checks them with [`LocalStorage::verify_signature`].
///
/// The filesystem keeps no object metadata, so the content type passed to
/// `upload_file` is only logged.
#[derive(Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
    base_url: String,
    signing_secret: Vec<u8>,
}

impl LocalStorage {
    /// Create a new LocalStorage instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory for object storage (e.g., "/var/lib/tubely/assets")
    /// * `base_url` - Base URL for serving objects (e.g., "http://localhost:8091/assets")
    /// * `signing_secret` - HMAC key for signed URLs
    pub async fn new(
        base_path: impl Into<PathBuf>,
        base_url: String,
        signing_secret: impl Into<Vec<u8>>,
    ) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalStorage {
            base_path,
            base_url,
            signing_secret: signing_secret.into(),
        })
    }

    /// Convert bucket and key to a filesystem path with security validation
    fn object_path(&self, bucket: &str, key: &str) -> StorageResult<PathBuf> {
        if bucket.is_empty() || bucket.contains(['/', '\\']) || bucket == ".." || bucket == "." {
            return Err(StorageError::InvalidKey(format!("invalid bucket name: {}", bucket)));
        }
        if !validate_key(key) {
            return Err(StorageError::InvalidKey(
                "Storage key contains invalid characters".to_string(),
            ));
        }

        Ok(self.base_path.join(bucket).join(key))
    }

    fn object_url_path(bucket: &str, key: &str) -> String {
        let encoded_key = key
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect::<Vec<_>>()
            .join("/");
        format!("{}/{}", urlencoding::encode(bucket), encoded_key)
    }

    fn generate_url(&self, bucket: &str, key: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            Self::object_url_path(bucket, key)
        )
    }

    fn mac(&self, bucket: &str, key: &str, expires: i64) -> StorageResult<HmacSha256> {
        let mut mac = HmacSha256::new_from_slice(&self.signing_secret)
            .map_err(|e| StorageError::ConfigError(format!("Invalid signing secret: {}", e)))?;
        mac.update(format!("{}/{}\n{}", bucket, key, expires).as_bytes());
        Ok(mac)
    }

    fn signature(&self, bucket: &str, key: &str, expires: i64) -> StorageResult<String> {
        let tag = self.mac(bucket, key, expires)?.finalize().into_bytes();
        Ok(hex::encode(tag))
    }

    /// Check a signed URL's `expires` and `signature` parameters.
    ///
    /// Returns `false` for expired links, bad hex, or a signature that does
    /// not match; the comparison is constant-time.
    pub fn verify_signature(&self, bucket: &str, key: &str, expires: i64, signature: &str) -> bool {
        if expires < Utc::now().timestamp() {
            return false;
        }
        let Ok(tag) = hex::decode(signature) else {
            return false;
        };
        match self.mac(bucket, key, expires) {
            Ok(mac) => mac.verify_slice(&tag).is_ok(),
            Err(_) => false,
        }
    }

    /// Ensure parent directory exists
    async fn ensure_parent_dir(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn upload_file(
        &self,
        bucket: &str,
        key: &str,
        path: &Path,
        content_type: &str,
    ) -> StorageResult<u64> {
        let dest = self.object_path(bucket, key)?;
        self.ensure_parent_dir(&dest).await?;

        let start = std::time::Instant::now();

        let size = fs::copy(path, &dest).await.map_err(|e| {
            StorageError::UploadFailed(format!(
                "Failed to copy {} to {}: {}",
                path.display(),
                dest.display(),
                e
            ))
        })?;

        let file = fs::File::open(&dest).await?;
        file.sync_all().await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to sync file {}: {}", dest.display(), e))
        })?;

        tracing::info!(
            path = %dest.display(),
            bucket = %bucket,
            key = %key,
            content_type = %content_type,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage upload successful"
        );

        Ok(size)
    }

    async fn delete(&self, bucket: &str, key: &str) -> StorageResult<()> {
        let path = self.object_path(bucket, key)?;

        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Ok(());
        }

        fs::remove_file(&path).await.map_err(|e| {
            StorageError::DeleteFailed(format!("Failed to delete file {}: {}", path.display(), e))
        })?;

        tracing::info!(
            path = %path.display(),
            bucket = %bucket,
            key = %key,
            "Local storage delete successful"
        );

        Ok(())
    }

    async fn exists(&self, bucket: &str, key: &str) -> StorageResult<bool> {
        let path = self.object_path(bucket, key)?;
        Ok(fs::try_exists(&path).await.unwrap_or(false))
    }

    async fn presigned_get_url(
        &self,
        bucket: &str,
        key: &str,
        expires_in: Duration,
    ) -> StorageResult<String> {
        self.object_path(bucket, key)
            .map_err(|e| StorageError::SigningFailed(e.to_string()))?;

        let ttl = chrono::Duration::from_std(expires_in)
            .map_err(|e| StorageError::SigningFailed(e.to_string()))?;
        let expires = (Utc::now() + ttl).timestamp();
        let signature = self
            .signature(bucket, key, expires)
            .map_err(|e| StorageError::SigningFailed(e.to_string()))?;

        Ok(format!(
            "{}?expires={}&signature={}",
            self.generate_url(bucket, key),
            expires,
            signature
        ))
    }

    fn public_url(&self, bucket: &str, key: &str) -> String {
        self.generate_url(bucket, key)
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    async fn storage(dir: &Path) -> LocalStorage {
        LocalStorage::new(
            dir.join("store"),
            "http://localhost:8091/assets".to_string(),
            SECRET,
        )
        .await
        .unwrap()
    }

    fn query_param<'a>(url: &'a str, name: &str) -> &'a str {
        let query = url.split_once('?').unwrap().1;
        query
            .split('&')
            .find_map(|pair| pair.strip_prefix(&format!("{}=", name)))
            .unwrap()
    }

    #[tokio::test]
    async fn test_local_storage_upload_file() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;

        let source = dir.path().join("source.mp4");
        fs::write(&source, b"fake mp4 bytes").await.unwrap();

        let size = storage
            .upload_file("tubely", "landscape/abc", &source, "video/mp4")
            .await
            .unwrap();

        assert_eq!(size, 14);
        assert!(storage.exists("tubely", "landscape/abc").await.unwrap());
        let stored = fs::read(dir.path().join("store/tubely/landscape/abc")).await.unwrap();
        assert_eq!(stored, b"fake mp4 bytes");
    }

    #[tokio::test]
    async fn test_upload_missing_source_fails() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;

        let result = storage
            .upload_file("tubely", "other/abc", &dir.path().join("missing"), "video/mp4")
            .await;
        assert!(matches!(result, Err(StorageError::UploadFailed(_))));
    }

    #[tokio::test]
    async fn test_path_traversal_rejected() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;

        let result = storage.delete("tubely", "../../../etc/passwd").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));

        let result = storage.exists("..", "passwd").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));

        let result = storage.exists("tubely", "/etc/passwd").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));

        let result = storage
            .presigned_get_url("tubely", "", Duration::from_secs(60))
            .await;
        assert!(matches!(result, Err(StorageError::SigningFailed(_))));
    }

    #[tokio::test]
    async fn test_local_storage_delete() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;

        let source = dir.path().join("source.mp4");
        fs::write(&source, b"bytes").await.unwrap();
        storage
            .upload_file("tubely", "portrait/xyz", &source, "video/mp4")
            .await
            .unwrap();

        storage.delete("tubely", "portrait/xyz").await.unwrap();
        assert!(!storage.exists("tubely", "portrait/xyz").await.unwrap());

        // deleting again is a no-op
        assert!(storage.delete("tubely", "portrait/xyz").await.is_ok());
    }

    #[tokio::test]
    async fn test_public_url() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;

        assert_eq!(
            storage.public_url("tubely", "landscape/abc_-1"),
            "http://localhost:8091/assets/tubely/landscape/abc_-1"
        );
    }

    #[tokio::test]
    async fn test_presigned_url_round_trip() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;

        let before = Utc::now().timestamp();
        let url = storage
            .presigned_get_url("tubely", "landscape/abc", Duration::from_secs(900))
            .await
            .unwrap();

        assert!(url.starts_with("http://localhost:8091/assets/tubely/landscape/abc?"));

        let expires: i64 = query_param(&url, "expires").parse().unwrap();
        assert!(expires >= before + 900);
        assert!(expires <= Utc::now().timestamp() + 900);

        let signature = query_param(&url, "signature");
        assert!(storage.verify_signature("tubely", "landscape/abc", expires, signature));
        assert!(!storage.verify_signature("tubely", "landscape/other", expires, signature));
        assert!(!storage.verify_signature("tubely", "landscape/abc", expires + 1, signature));
        assert!(!storage.verify_signature("tubely", "landscape/abc", expires, "not-hex"));
    }

    #[tokio::test]
    async fn test_expired_signature_rejected() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;

        let expired = Utc::now().timestamp() - 1;
        let signature = storage.signature("tubely", "landscape/abc", expired).unwrap();
        assert!(!storage.verify_signature("tubely", "landscape/abc", expired, &signature));
    }
}

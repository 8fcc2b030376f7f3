use crate::traits::{Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use http::Method;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path as ObjectPath;
use object_store::signer::Signer;
use object_store::Error as ObjectStoreError;
use object_store::{
    Attribute, Attributes, ObjectStoreExt, PutOptions, PutPayload, Result as ObjectResult,
};
use std::path::Path;
use std::time::Duration;

/// Static credentials, when not taken from the environment.
#[derive(Clone)]
struct StaticCredentials {
    access_key_id: String,
    secret_access_key: String,
}

/// S3 storage implementation
///
/// `object_store` binds a client to a single bucket. The configured upload
/// bucket gets a long-lived client; records pointing at other buckets get a
/// client built on demand with the same region, endpoint and credentials.
#[derive(Clone)]
pub struct S3Storage {
    store: AmazonS3,
    bucket: String,
    region: String,
    endpoint_url: Option<String>, // Custom endpoint for S3-compatible providers
    credentials: Option<StaticCredentials>,
}

impl S3Storage {
    /// Create a new S3Storage instance with credentials from the environment
    ///
    /// # Arguments
    /// * `bucket` - S3 bucket receiving uploads
    /// * `region` - AWS region (or region identifier for S3-compatible providers)
    /// * `endpoint_url` - Optional custom endpoint URL for S3-compatible providers
    ///   (e.g., "http://localhost:9000" for MinIO)
    pub fn new(bucket: String, region: String, endpoint_url: Option<String>) -> StorageResult<Self> {
        Self::build(bucket, region, endpoint_url, None)
    }

    /// Create a new S3Storage instance with explicit static credentials
    pub fn with_credentials(
        bucket: String,
        region: String,
        endpoint_url: Option<String>,
        access_key_id: String,
        secret_access_key: String,
    ) -> StorageResult<Self> {
        Self::build(
            bucket,
            region,
            endpoint_url,
            Some(StaticCredentials {
                access_key_id,
                secret_access_key,
            }),
        )
    }

    fn build(
        bucket: String,
        region: String,
        endpoint_url: Option<String>,
        credentials: Option<StaticCredentials>,
    ) -> StorageResult<Self> {
        let store = Self::build_store(&bucket, &region, endpoint_url.as_deref(), credentials.as_ref())?;

        Ok(S3Storage {
            store,
            bucket,
            region,
            endpoint_url,
            credentials,
        })
    }

    fn build_store(
        bucket: &str,
        region: &str,
        endpoint_url: Option<&str>,
        credentials: Option<&StaticCredentials>,
    ) -> StorageResult<AmazonS3> {
        if bucket.is_empty() {
            return Err(StorageError::ConfigError("bucket name is empty".to_string()));
        }

        let mut builder = AmazonS3Builder::from_env()
            .with_region(region)
            .with_bucket_name(bucket);

        if let Some(endpoint) = endpoint_url {
            let allow_http = endpoint.starts_with("http://");
            builder = builder.with_endpoint(endpoint).with_allow_http(allow_http);
        }

        if let Some(credentials) = credentials {
            builder = builder
                .with_access_key_id(&credentials.access_key_id)
                .with_secret_access_key(&credentials.secret_access_key);
        }

        builder
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))
    }

    fn store_for(&self, bucket: &str) -> StorageResult<AmazonS3> {
        if bucket == self.bucket {
            return Ok(self.store.clone());
        }
        Self::build_store(
            bucket,
            &self.region,
            self.endpoint_url.as_deref(),
            self.credentials.as_ref(),
        )
    }

    /// Generate public URL for S3 object
    ///
    /// For AWS S3, uses the standard format: https://{bucket}.s3.{region}.amazonaws.com/{key}
    /// For S3-compatible providers, uses path-style {endpoint}/{bucket}/{key}
    fn generate_url(&self, bucket: &str, key: &str) -> String {
        if let Some(ref endpoint) = self.endpoint_url {
            let base_url = endpoint.trim_end_matches('/');
            format!("{}/{}/{}", base_url, bucket, key)
        } else {
            format!("https://{}.s3.{}.amazonaws.com/{}", bucket, self.region, key)
        }
    }
}

#[async_trait]
impl Storage for S3Storage {
    async fn upload_file(
        &self,
        bucket: &str,
        key: &str,
        path: &Path,
        content_type: &str,
    ) -> StorageResult<u64> {
        let store = self.store_for(bucket)?;
        let start = std::time::Instant::now();

        let data = tokio::fs::read(path).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let size = data.len() as u64;

        let mut attributes = Attributes::new();
        attributes.insert(Attribute::ContentType, content_type.to_string().into());
        let options = PutOptions {
            attributes,
            ..Default::default()
        };

        let location = ObjectPath::from(key);
        let result: ObjectResult<_> = object_store::ObjectStore::put_opts(
            &store,
            &location,
            PutPayload::from(Bytes::from(data)),
            options,
        )
        .await;

        result.map_err(|e| {
            tracing::error!(
                error = %e,
                bucket = %bucket,
                key = %key,
                size_bytes = size,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "S3 upload failed"
            );
            StorageError::UploadFailed(e.to_string())
        })?;

        tracing::info!(
            bucket = %bucket,
            key = %key,
            content_type = %content_type,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 upload successful"
        );

        Ok(size)
    }

    async fn delete(&self, bucket: &str, key: &str) -> StorageResult<()> {
        let store = self.store_for(bucket)?;
        let start = std::time::Instant::now();
        let location = ObjectPath::from(key);

        match store.delete(&location).await {
            Ok(()) | Err(ObjectStoreError::NotFound { .. }) => {}
            Err(e) => {
                tracing::error!(
                    error = %e,
                    bucket = %bucket,
                    key = %key,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 delete failed"
                );
                return Err(StorageError::DeleteFailed(e.to_string()));
            }
        }

        tracing::info!(
            bucket = %bucket,
            key = %key,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 delete successful"
        );

        Ok(())
    }

    async fn exists(&self, bucket: &str, key: &str) -> StorageResult<bool> {
        let store = self.store_for(bucket)?;
        let location = ObjectPath::from(key);
        match store.head(&location).await {
            Ok(_) => Ok(true),
            Err(ObjectStoreError::NotFound { .. }) => Ok(false),
            Err(e) => Err(StorageError::BackendError(e.to_string())),
        }
    }

    async fn presigned_get_url(
        &self,
        bucket: &str,
        key: &str,
        expires_in: Duration,
    ) -> StorageResult<String> {
        let store = self
            .store_for(bucket)
            .map_err(|e| StorageError::SigningFailed(e.to_string()))?;
        let location = ObjectPath::from(key);

        let url_result: ObjectResult<_> = store.signed_url(Method::GET, &location, expires_in).await;

        let url = url_result
            .map_err(|e| {
                tracing::error!(error = %e, bucket = %bucket, key = %key, "S3 presign failed");
                StorageError::SigningFailed(e.to_string())
            })?
            .to_string();

        Ok(url)
    }

    fn public_url(&self, bucket: &str, key: &str) -> String {
        self.generate_url(bucket, key)
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::S3
    }
}

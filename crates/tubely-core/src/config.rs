//! Configuration module
//!
//! Settings are read once from the process environment (after loading `.env`)
//! and then handed to the storage factory, the media tool, the resolver and
//! the pipeline as explicit structs. Nothing below the binary reads the
//! environment on its own.

use std::env;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::constants::{MAX_SIGNED_URL_TTL_SECS, MAX_UPLOAD_BYTES, SIGNED_URL_TTL_SECS};
use crate::storage_types::StorageBackend;

const DEFAULT_LOCAL_BUCKET: &str = "tubely";
const TRANSCODE_TIMEOUT_SECS: u64 = 30;
const TRANSCODE_TIMEOUT_SECS_PER_100MB: u64 = 10;
const PROBE_TIMEOUT_SECS: u64 = 20;
const STORAGE_TIMEOUT_SECS: u64 = 60;

/// How a freshly uploaded video's location is persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LocationScheme {
    /// `{bucket},{key}`, signed at read time
    #[default]
    Indirect,
    /// Public object URL
    Direct,
}

impl FromStr for LocationScheme {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "indirect" => Ok(LocationScheme::Indirect),
            "direct" => Ok(LocationScheme::Direct),
            _ => Err(anyhow::anyhow!("Invalid video location scheme: {}", s)),
        }
    }
}

impl Display for LocationScheme {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            LocationScheme::Indirect => write!(f, "indirect"),
            LocationScheme::Direct => write!(f, "direct"),
        }
    }
}

/// Application configuration
#[derive(Clone, Debug)]
pub struct Config {
    // Storage configuration
    pub storage_backend: StorageBackend,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>, // Custom endpoint for S3-compatible providers (MinIO etc.)
    pub local_storage_path: Option<String>,
    pub local_storage_base_url: Option<String>,
    pub local_storage_bucket: String,
    pub local_signing_secret: Option<String>,
    // Delivery
    pub location_scheme: LocationScheme,
    pub signed_url_ttl_secs: u64,
    // Ingestion
    pub max_upload_bytes: u64,
    pub upload_temp_dir: Option<PathBuf>,
    pub ffmpeg_path: String,
    pub ffprobe_path: String,
    pub transcode_timeout_secs: u64,
    pub transcode_timeout_secs_per_100mb: u64,
    pub probe_timeout_secs: u64,
    pub storage_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|s| !s.trim().is_empty());
        let number = |name: &str, default: u64| -> Result<u64, anyhow::Error> {
            match var(name) {
                Some(raw) => raw
                    .trim()
                    .parse::<u64>()
                    .map_err(|e| anyhow::anyhow!("{} must be a non-negative integer: {}", name, e)),
                None => Ok(default),
            }
        };

        let storage_backend = match var("STORAGE_BACKEND") {
            Some(raw) => raw.parse()?,
            None => StorageBackend::S3,
        };
        let location_scheme = match var("VIDEO_LOCATION_SCHEME") {
            Some(raw) => raw.parse()?,
            None => LocationScheme::default(),
        };

        let config = Config {
            storage_backend,
            s3_bucket: var("S3_BUCKET"),
            s3_region: var("S3_REGION").or_else(|| var("AWS_REGION")),
            s3_endpoint: var("S3_ENDPOINT"),
            local_storage_path: var("LOCAL_STORAGE_PATH"),
            local_storage_base_url: var("LOCAL_STORAGE_BASE_URL"),
            local_storage_bucket: var("LOCAL_STORAGE_BUCKET")
                .unwrap_or_else(|| DEFAULT_LOCAL_BUCKET.to_string()),
            local_signing_secret: var("LOCAL_SIGNING_SECRET"),
            location_scheme,
            signed_url_ttl_secs: number("SIGNED_URL_TTL_SECS", SIGNED_URL_TTL_SECS)?,
            max_upload_bytes: number("MAX_UPLOAD_BYTES", MAX_UPLOAD_BYTES)?,
            upload_temp_dir: var("UPLOAD_TEMP_DIR").map(PathBuf::from),
            ffmpeg_path: var("FFMPEG_PATH").unwrap_or_else(|| "ffmpeg".to_string()),
            ffprobe_path: var("FFPROBE_PATH").unwrap_or_else(|| "ffprobe".to_string()),
            transcode_timeout_secs: number("TRANSCODE_TIMEOUT_SECS", TRANSCODE_TIMEOUT_SECS)?,
            transcode_timeout_secs_per_100mb: number(
                "TRANSCODE_TIMEOUT_SECS_PER_100MB",
                TRANSCODE_TIMEOUT_SECS_PER_100MB,
            )?,
            probe_timeout_secs: number("PROBE_TIMEOUT_SECS", PROBE_TIMEOUT_SECS)?,
            storage_timeout_secs: number("STORAGE_TIMEOUT_SECS", STORAGE_TIMEOUT_SECS)?,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        match self.storage_backend {
            StorageBackend::S3 => {
                if self.s3_bucket.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_BUCKET must be set when using S3 storage backend"
                    ));
                }
                if self.s3_region.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_REGION or AWS_REGION must be set when using S3 storage backend"
                    ));
                }
            }
            StorageBackend::Local => {
                if self.local_storage_path.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_PATH must be set when using local storage backend"
                    ));
                }
                if self.local_storage_base_url.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_BASE_URL must be set when using local storage backend"
                    ));
                }
                if self.local_signing_secret.as_deref().map_or(0, str::len) < 32 {
                    return Err(anyhow::anyhow!(
                        "LOCAL_SIGNING_SECRET must be at least 32 characters long"
                    ));
                }
            }
        }

        if self.signed_url_ttl_secs == 0 || self.signed_url_ttl_secs > MAX_SIGNED_URL_TTL_SECS {
            return Err(anyhow::anyhow!(
                "SIGNED_URL_TTL_SECS must be between 1 and {}",
                MAX_SIGNED_URL_TTL_SECS
            ));
        }

        if self.max_upload_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_UPLOAD_BYTES must be greater than zero"));
        }

        if self.transcode_timeout_secs == 0
            || self.probe_timeout_secs == 0
            || self.storage_timeout_secs == 0
        {
            return Err(anyhow::anyhow!("Timeouts must be greater than zero"));
        }

        Ok(())
    }

    /// Bucket receiving uploaded videos on the configured backend.
    pub fn video_bucket(&self) -> &str {
        match self.storage_backend {
            StorageBackend::S3 => self.s3_bucket.as_deref().unwrap_or_default(),
            StorageBackend::Local => &self.local_storage_bucket,
        }
    }

    pub fn signed_url_ttl(&self) -> Duration {
        Duration::from_secs(self.signed_url_ttl_secs)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    pub fn storage_timeout(&self) -> Duration {
        Duration::from_secs(self.storage_timeout_secs)
    }
}

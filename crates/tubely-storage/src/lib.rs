//! Tubely Storage Library
//!
//! This crate provides the object store abstraction used by the ingestion
//! pipeline and the location resolver, with implementations for S3 (and
//! S3-compatible providers) and the local filesystem.
//!
//! # Storage key format
//!
//! Video keys are `{orientation}/{id}` where `id` is 32 random bytes encoded as
//! unpadded base64url. Keys never contain user-supplied text and never carry a
//! file extension; the container type travels as the object's content type.
//! Key generation is centralized in the `keys` module.

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
pub use keys::generate_video_key;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{Storage, StorageError, StorageResult};
pub use tubely_core::StorageBackend;

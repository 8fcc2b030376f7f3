//! Tubely Processing Library
//!
//! The video ingestion pipeline (stage, normalize, inspect, upload, record)
//! and the read-time location resolver.

pub mod pipeline;
pub mod repository;
pub mod resolver;
pub mod staging;
pub mod validator;
pub mod video;

pub use pipeline::{UploadPipeline, UploadPipelineConfig, UploadRequest};
pub use repository::{InMemoryVideoRepository, VideoRepository};
pub use resolver::{location_for, LocationResolver, ResolveError};
pub use staging::{StagedUpload, StagingArea};
pub use validator::{MediaValidator, ValidationError};
pub use video::{FFmpegTool, FFmpegToolConfig, MediaTool};

use tubely_core::{AppError, ErrorMetadata, LogLevel};

/// Log an error at the level its metadata asks for.
pub(crate) fn log_app_error(error: &AppError, message: &str) {
    let error_type = error.error_type_name();
    match error.log_level() {
        LogLevel::Debug => {
            tracing::debug!(error = %error, error_type = error_type, "{}", message);
        }
        LogLevel::Warn => {
            tracing::warn!(error = %error, error_type = error_type, "{}", message);
        }
        LogLevel::Error => {
            tracing::error!(
                error = %error.detailed_message(),
                error_type = error_type,
                "{}",
                message
            );
        }
    }
}

//! Error types module
//!
//! Every failure the ingestion pipeline and the location resolver can report is
//! a variant of [`AppError`]. Caller mistakes (`BadInput`, `Unauthorized`,
//! `NotFound`, `PayloadTooLarge`) are reported verbatim; everything else is an
//! internal failure whose detail is kept for operator logs and hidden from the
//! client behind an opaque message.
//!
//! Nothing in the pipeline is retried, so no variant is recoverable.

use std::io;
use std::time::Duration;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for recoverable issues like timeouts
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata for error responses - defines how an error should be presented
pub trait ErrorMetadata {
    /// HTTP status code to return
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "UPLOAD_FAILED")
    fn error_code(&self) -> &'static str;

    /// Whether this error is recoverable (can be retried)
    fn is_recoverable(&self) -> bool;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Whether details should be hidden from the caller
    fn is_sensitive(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Bad input: {0}")]
    BadInput(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Upload exceeds the limit of {limit} bytes")]
    PayloadTooLarge { limit: u64 },

    #[error("Staging failed: {message}")]
    StagingFailed {
        message: String,
        #[source]
        source: io::Error,
    },

    #[error("Normalization failed: {0}")]
    NormalizationFailed(String),

    #[error("Inspection failed: {0}")]
    InspectionFailed(String),

    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Signing failed: {0}")]
    SigningFailed(String),

    #[error("Malformed location: {0}")]
    MalformedLocation(String),

    #[error("{operation} timed out after {}s", timeout.as_secs())]
    OperationTimedOut {
        operation: &'static str,
        timeout: Duration,
    },

    #[error("Metadata store error: {0}")]
    MetadataStore(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn staging(message: impl Into<String>, source: io::Error) -> Self {
        AppError::StagingFailed {
            message: message.into(),
            source,
        }
    }

    pub fn timed_out(operation: &'static str, timeout: Duration) -> Self {
        AppError::OperationTimedOut { operation, timeout }
    }

    /// Get the error type name for logging
    pub fn error_type_name(&self) -> &'static str {
        match self {
            AppError::BadInput(_) => "BadInput",
            AppError::Unauthorized(_) => "Unauthorized",
            AppError::NotFound(_) => "NotFound",
            AppError::PayloadTooLarge { .. } => "PayloadTooLarge",
            AppError::StagingFailed { .. } => "StagingFailed",
            AppError::NormalizationFailed(_) => "NormalizationFailed",
            AppError::InspectionFailed(_) => "InspectionFailed",
            AppError::UploadFailed(_) => "UploadFailed",
            AppError::SigningFailed(_) => "SigningFailed",
            AppError::MalformedLocation(_) => "MalformedLocation",
            AppError::OperationTimedOut { .. } => "OperationTimedOut",
            AppError::MetadataStore(_) => "MetadataStore",
            AppError::Internal(_) => "Internal",
        }
    }

    /// Whether the error was caused by the caller rather than the system
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.http_status_code())
    }

    /// Get detailed error information including error chain
    pub fn detailed_message(&self) -> String {
        use std::error::Error;

        let mut details = self.to_string();
        let mut source = self.source();
        while let Some(err) = source {
            details.push_str(&format!("\n  Caused by: {}", err));
            source = err.source();
        }
        details
    }
}

/// Static metadata for each variant: (http_status, error_code, sensitive, log_level).
fn app_error_static_metadata(err: &AppError) -> (u16, &'static str, bool, LogLevel) {
    match err {
        AppError::BadInput(_) => (400, "BAD_INPUT", false, LogLevel::Debug),
        AppError::Unauthorized(_) => (401, "UNAUTHORIZED", false, LogLevel::Debug),
        AppError::NotFound(_) => (404, "NOT_FOUND", false, LogLevel::Debug),
        AppError::PayloadTooLarge { .. } => (413, "PAYLOAD_TOO_LARGE", false, LogLevel::Debug),
        AppError::StagingFailed { .. } => (500, "STAGING_FAILED", true, LogLevel::Error),
        AppError::NormalizationFailed(_) => (500, "NORMALIZATION_FAILED", true, LogLevel::Error),
        AppError::InspectionFailed(_) => (500, "INSPECTION_FAILED", true, LogLevel::Error),
        AppError::UploadFailed(_) => (500, "UPLOAD_FAILED", true, LogLevel::Error),
        AppError::SigningFailed(_) => (500, "SIGNING_FAILED", true, LogLevel::Error),
        AppError::MalformedLocation(_) => (500, "MALFORMED_LOCATION", true, LogLevel::Error),
        AppError::OperationTimedOut { .. } => (500, "OPERATION_TIMED_OUT", true, LogLevel::Warn),
        AppError::MetadataStore(_) => (500, "METADATA_STORE_ERROR", true, LogLevel::Error),
        AppError::Internal(_) => (500, "INTERNAL_ERROR", true, LogLevel::Error),
    }
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        app_error_static_metadata(self).0
    }

    fn error_code(&self) -> &'static str {
        app_error_static_metadata(self).1
    }

    fn is_recoverable(&self) -> bool {
        false
    }

    fn client_message(&self) -> String {
        match self {
            AppError::BadInput(ref msg) => msg.clone(),
            AppError::Unauthorized(ref msg) => msg.clone(),
            AppError::NotFound(ref msg) => msg.clone(),
            AppError::PayloadTooLarge { limit } => {
                format!("Upload exceeds the limit of {} bytes", limit)
            }
            _ => "Internal server error".to_string(),
        }
    }

    fn is_sensitive(&self) -> bool {
        app_error_static_metadata(self).2
    }

    fn log_level(&self) -> LogLevel {
        app_error_static_metadata(self).3
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Internal(format!("JSON error: {}", err))
    }
}

//! Support code for the `tubely` binary.

pub mod catalog;

pub use catalog::JsonCatalog;

use serde::Serialize;
use tubely_core::{AppError, ErrorMetadata};

/// Initialize tracing for CLI binaries.
///
/// Logs go to stderr so stdout carries only command output. `LOG_FORMAT=json`
/// switches to structured JSON lines.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    let json = std::env::var("LOG_FORMAT")
        .map(|f| f.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Caller-facing view of an error.
#[derive(Debug, Serialize, PartialEq)]
pub struct ErrorBody {
    pub status: u16,
    pub code: &'static str,
    pub message: String,
}

impl From<&AppError> for ErrorBody {
    fn from(err: &AppError) -> Self {
        Self {
            status: err.http_status_code(),
            code: err.error_code(),
            message: err.client_message(),
        }
    }
}

use tubely_core::constants::VIDEO_CONTENT_TYPE;
use tubely_core::AppError;

/// Validation errors for declared upload content types
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing content type header")]
    MissingContentType,

    #[error("Invalid Content-Type header: {0}")]
    MalformedContentType(String),

    #[error("Invalid media type")]
    InvalidMediaType { media_type: String },
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::BadInput(err.to_string())
    }
}

/// Content type validator for the ingestion pipeline
///
/// Runs before anything is staged, so a rejected upload has no side effects.
pub struct MediaValidator {
    allowed_content_types: Vec<String>,
}

impl Default for MediaValidator {
    fn default() -> Self {
        Self::new(vec![VIDEO_CONTENT_TYPE.to_string()])
    }
}

impl MediaValidator {
    pub fn new(allowed_content_types: Vec<String>) -> Self {
        Self {
            allowed_content_types: allowed_content_types
                .into_iter()
                .map(|t| t.to_lowercase())
                .collect(),
        }
    }

    /// Validate a declared `Content-Type` value and return its media type.
    ///
    /// Parameters are ignored (`video/mp4; codecs="avc1"` is `video/mp4`) and
    /// matching is case-insensitive.
    pub fn validate_content_type(&self, header: Option<&str>) -> Result<String, ValidationError> {
        let header = header
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .ok_or(ValidationError::MissingContentType)?;

        let media_type = parse_media_type(header)?;

        if !self.allowed_content_types.contains(&media_type) {
            return Err(ValidationError::InvalidMediaType { media_type });
        }

        Ok(media_type)
    }
}

/// Extract the lowercase `type/subtype` from a header value.
fn parse_media_type(header: &str) -> Result<String, ValidationError> {
    let essence = header.split(';').next().unwrap_or_default().trim();

    let malformed = || ValidationError::MalformedContentType(header.to_string());
    let (kind, subtype) = essence.split_once('/').ok_or_else(malformed)?;

    let is_token = |s: &str| {
        !s.is_empty()
            && s.chars()
                .all(|c| c.is_ascii_alphanumeric() || "!#$&-^_.+".contains(c))
    };
    if !is_token(kind) || !is_token(subtype) {
        return Err(malformed());
    }

    Ok(essence.to_lowercase())
}

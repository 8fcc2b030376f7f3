//! Pipeline-wide constants.

/// Hard bound on an inbound upload body (1 GiB).
pub const MAX_UPLOAD_BYTES: u64 = 1 << 30;

/// Lifetime of a signed delivery URL.
pub const SIGNED_URL_TTL_SECS: u64 = 15 * 60;

/// S3 refuses presigned URLs valid for longer than seven days.
pub const MAX_SIGNED_URL_TTL_SECS: u64 = 7 * 24 * 60 * 60;

/// The only media type accepted by the video upload stage.
pub const VIDEO_CONTENT_TYPE: &str = "video/mp4";

/// Separator between bucket and key in an indirect location record.
pub const LOCATION_DELIMITER: char = ',';

/// Number of random bytes in a storage key identifier.
pub const STORAGE_ID_BYTES: usize = 32;

//! Asset location records.
//!
//! A video's bytes are addressed in one of two ways. Both forms coexist in
//! durable storage, so the persisted string is parsed back into the variant at
//! the storage boundary:
//!
//! - **Direct**: a permanently valid URL, stored as-is.
//! - **Indirect**: `{bucket},{key}`, resolved into a short-lived signed URL
//!   only when the record is read for delivery.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::constants::LOCATION_DELIMITER;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VideoLocation {
    Direct(String),
    Indirect { bucket: String, key: String },
}

impl VideoLocation {
    pub fn direct(url: impl Into<String>) -> Self {
        VideoLocation::Direct(url.into())
    }

    pub fn indirect(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        VideoLocation::Indirect {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    /// Parse a persisted location string.
    ///
    /// A value without the delimiter is a direct URL. Otherwise the value is
    /// split on the first delimiter only, so `a,b,c` yields bucket `a` and
    /// key `b,c`. Empty halves are kept; the resolver decides whether they
    /// can be signed.
    pub fn parse(stored: &str) -> Self {
        match stored.split_once(LOCATION_DELIMITER) {
            Some((bucket, key)) => VideoLocation::indirect(bucket, key),
            None => VideoLocation::Direct(stored.to_string()),
        }
    }

    /// The string written to the metadata store.
    pub fn to_stored(&self) -> String {
        match self {
            VideoLocation::Direct(url) => url.clone(),
            VideoLocation::Indirect { bucket, key } => {
                format!("{}{}{}", bucket, LOCATION_DELIMITER, key)
            }
        }
    }

    pub fn is_indirect(&self) -> bool {
        matches!(self, VideoLocation::Indirect { .. })
    }
}

impl Display for VideoLocation {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.to_stored())
    }
}

impl Serialize for VideoLocation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_stored())
    }
}

impl<'de> Deserialize<'de> for VideoLocation {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let stored = String::deserialize(deserializer)?;
        Ok(VideoLocation::parse(&stored))
    }
}

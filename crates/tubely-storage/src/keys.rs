//! Shared key generation for storage backends.
//!
//! Key format: `{orientation}/{id}`, `id` being 32 bytes from a CSPRNG encoded as
//! unpadded base64url.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rand::RngCore;
use tubely_core::constants::STORAGE_ID_BYTES;
use tubely_core::Orientation;

/// Generate a random, URL-safe object identifier.
pub fn generate_object_id() -> String {
    let mut id = [0u8; STORAGE_ID_BYTES];
    rand::rng().fill_bytes(&mut id);
    URL_SAFE_NO_PAD.encode(id)
}

/// Generate the storage key for a video of the given orientation.
pub fn generate_video_key(orientation: Orientation) -> String {
    format!("{}/{}", orientation, generate_object_id())
}

/// Reject keys that could escape a bucket when mapped onto a filesystem.
pub(crate) fn validate_key(key: &str) -> bool {
    !key.is_empty()
        && !key.starts_with('/')
        && !key.contains('\\')
        && key.split('/').all(|segment| segment != ".." && segment != ".")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_object_id_is_url_safe_and_sized() {
        let id = generate_object_id();
        // 32 bytes -> 43 unpadded base64 characters
        assert_eq!(id.len(), 43);
        assert!(id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));

        let decoded = URL_SAFE_NO_PAD.decode(&id).unwrap();
        assert_eq!(decoded.len(), STORAGE_ID_BYTES);
    }

    #[test]
    fn test_video_key_prefix() {
        let key = generate_video_key(Orientation::Landscape);
        let (prefix, id) = key.split_once('/').unwrap();
        assert_eq!(prefix, "landscape");
        assert_eq!(id.len(), 43);
        assert!(!key.contains('.'));

        assert!(generate_video_key(Orientation::Portrait).starts_with("portrait/"));
        assert!(generate_video_key(Orientation::Other).starts_with("other/"));
    }

    #[test]
    fn test_keys_are_unique() {
        let keys: HashSet<String> = (0..1000)
            .map(|_| generate_video_key(Orientation::Other))
            .collect();
        assert_eq!(keys.len(), 1000);
    }

    #[test]
    fn test_validate_key() {
        assert!(validate_key("landscape/abc"));
        assert!(validate_key("a,b"));
        assert!(!validate_key(""));
        assert!(!validate_key("/etc/passwd"));
        assert!(!validate_key("../secret"));
        assert!(!validate_key("landscape/../../etc"));
        assert!(!validate_key("a\\b"));
    }
}

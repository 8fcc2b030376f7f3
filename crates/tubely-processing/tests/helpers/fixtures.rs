use std::io::Cursor;
use std::path::Path;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::io::{AsyncRead, ReadBuf};
use tubely_core::{LocationScheme, Video};
use tubely_processing::{UploadPipelineConfig, UploadRequest};
use uuid::Uuid;

pub const TEST_BUCKET: &str = "tubely-test";

/// Bytes standing in for an mp4 body; the mock media tool never parses them.
pub fn sample_mp4_bytes() -> Vec<u8> {
    let mut data = Vec::new();
    data.extend_from_slice(&[0x00, 0x00, 0x00, 0x20]);
    data.extend_from_slice(b"ftypisom");
    data.extend_from_slice(&[0x00, 0x00, 0x02, 0x00]);
    data.extend_from_slice(b"isomiso2avc1mp41");
    data.extend_from_slice(b"mdat");
    data.extend(std::iter::repeat(0xAB).take(4096));
    data
}

pub fn video_owned_by(user_id: Uuid) -> Video {
    Video::new(
        user_id,
        "Boots on the ground",
        Some("A walk through the store".to_string()),
    )
}

pub fn pipeline_config(temp_dir: &Path) -> UploadPipelineConfig {
    UploadPipelineConfig {
        bucket: TEST_BUCKET.to_string(),
        location_scheme: LocationScheme::Indirect,
        max_upload_bytes: 1 << 20,
        temp_dir: Some(temp_dir.to_path_buf()),
        storage_timeout: Duration::from_secs(5),
    }
}

pub fn mp4_request(video: &Video, user_id: Uuid) -> UploadRequest<Cursor<Vec<u8>>> {
    request(video, user_id, Some("video/mp4"), sample_mp4_bytes())
}

pub fn request(
    video: &Video,
    user_id: Uuid,
    content_type: Option<&str>,
    body: Vec<u8>,
) -> UploadRequest<Cursor<Vec<u8>>> {
    UploadRequest {
        video_id: video.id,
        user_id,
        content_type: content_type.map(String::from),
        body: Cursor::new(body),
    }
}

/// Body that fails as soon as it is read, like a dropped connection.
pub struct BrokenBody;

impl AsyncRead for BrokenBody {
    fn poll_read(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        _buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        Poll::Ready(Err(std::io::Error::new(
            std::io::ErrorKind::ConnectionReset,
            "connection reset by peer",
        )))
    }
}

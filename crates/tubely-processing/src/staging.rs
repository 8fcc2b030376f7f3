//! Temporary staging of inbound upload bodies.
//!
//! Each invocation gets its own temporary directory. The staged body and any
//! file derived from it (the normalized output) live inside that directory, so
//! dropping the [`StagedUpload`] removes every local artifact of the request on
//! every exit path.

use std::io::SeekFrom;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use tubely_core::AppError;

const STAGING_PREFIX: &str = "tubely-upload-";
const STAGED_FILE_NAME: &str = "upload.mp4";

/// Where and how much to stage.
#[derive(Debug, Clone)]
pub struct StagingArea {
    parent: Option<PathBuf>,
    max_bytes: u64,
}

/// A staged request body, positioned at offset 0.
#[derive(Debug)]
pub struct StagedUpload {
    file: File,
    path: PathBuf,
    size: u64,
    // Dropped last: removes the directory and everything in it.
    dir: TempDir,
}

impl StagingArea {
    /// Stage under `parent`, or the system temp directory when `None`.
    pub fn new(parent: Option<PathBuf>, max_bytes: u64) -> Self {
        Self { parent, max_bytes }
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    fn create_dir(&self) -> std::io::Result<TempDir> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(STAGING_PREFIX);
        match &self.parent {
            Some(parent) => builder.tempdir_in(parent),
            None => builder.tempdir(),
        }
    }

    /// Copy `body` into a fresh temporary file.
    ///
    /// Reads at most one byte past the bound; a body longer than the bound is
    /// rejected with `PayloadTooLarge` and nothing is left on disk.
    pub async fn stage<R>(&self, body: R) -> Result<StagedUpload, AppError>
    where
        R: AsyncRead + Unpin,
    {
        let dir = self
            .create_dir()
            .map_err(|e| AppError::staging("Could not create temp directory", e))?;
        let path = dir.path().join(STAGED_FILE_NAME);

        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(|e| AppError::staging("Could not create temp file", e))?;

        let mut limited = body.take(self.max_bytes.saturating_add(1));
        let size = tokio::io::copy(&mut limited, &mut file)
            .await
            .map_err(|e| AppError::staging("Could not write temp file", e))?;

        if size > self.max_bytes {
            return Err(AppError::PayloadTooLarge {
                limit: self.max_bytes,
            });
        }

        file.flush()
            .await
            .map_err(|e| AppError::staging("Could not flush temp file", e))?;
        file.seek(SeekFrom::Start(0))
            .await
            .map_err(|e| AppError::staging("Could not point to beginning of file", e))?;

        tracing::debug!(
            path = %path.display(),
            size_bytes = size,
            "Upload staged"
        );

        Ok(StagedUpload {
            file,
            path,
            size,
            dir,
        })
    }
}

impl StagedUpload {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory owning every artifact of this invocation.
    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn file_mut(&mut self) -> &mut File {
        &mut self.file
    }
}

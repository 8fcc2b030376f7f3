use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tubely_core::{AppError, VideoGeometry};
use tubely_processing::MediaTool;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NormalizeBehavior {
    /// Copy the input to `{input}.processing`
    Copy,
    /// Exit cleanly but leave a zero-byte output
    Empty,
    /// Report a tool failure
    Fail,
}

/// Scripted media tool recording the paths it was handed
#[derive(Clone)]
pub struct MockMediaTool {
    normalize: NormalizeBehavior,
    geometry: Option<VideoGeometry>,
    normalized_inputs: Arc<Mutex<Vec<PathBuf>>>,
    inspected: Arc<Mutex<Vec<PathBuf>>>,
}

impl MockMediaTool {
    pub fn new(normalize: NormalizeBehavior, geometry: Option<VideoGeometry>) -> Self {
        Self {
            normalize,
            geometry,
            normalized_inputs: Arc::new(Mutex::new(Vec::new())),
            inspected: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_geometry(width: u32, height: u32) -> Self {
        Self::new(NormalizeBehavior::Copy, Some(VideoGeometry::new(width, height)))
    }

    pub fn landscape() -> Self {
        Self::with_geometry(1920, 1080)
    }

    pub fn normalized_inputs(&self) -> Vec<PathBuf> {
        self.normalized_inputs.lock().unwrap().clone()
    }

    pub fn inspected(&self) -> Vec<PathBuf> {
        self.inspected.lock().unwrap().clone()
    }
}

#[async_trait]
impl MediaTool for MockMediaTool {
    async fn normalize(&self, input: &Path) -> Result<PathBuf, AppError> {
        self.normalized_inputs
            .lock()
            .unwrap()
            .push(input.to_path_buf());

        let output = PathBuf::from(format!("{}.processing", input.display()));
        match self.normalize {
            NormalizeBehavior::Copy => {
                tokio::fs::copy(input, &output).await.unwrap();
            }
            NormalizeBehavior::Empty => {
                tokio::fs::write(&output, b"").await.unwrap();
            }
            NormalizeBehavior::Fail => {
                return Err(AppError::NormalizationFailed(
                    "moov atom not found".to_string(),
                ));
            }
        }
        Ok(output)
    }

    async fn inspect(&self, path: &Path) -> Result<VideoGeometry, AppError> {
        self.inspected.lock().unwrap().push(path.to_path_buf());
        self.geometry
            .ok_or_else(|| AppError::InspectionFailed("no video streams found".to_string()))
    }
}

#![allow(dead_code)]

pub mod fixtures;
pub mod media_tool;
pub mod storage;

use std::path::Path;
use std::sync::Arc;
use tubely_processing::{InMemoryVideoRepository, UploadPipeline};

use self::fixtures::pipeline_config;
use self::media_tool::MockMediaTool;
use self::storage::MockStorage;

/// Pipeline wired to mocks, staging under `temp_dir`.
pub struct TestPipeline {
    pub pipeline: UploadPipeline,
    pub storage: MockStorage,
    pub media_tool: MockMediaTool,
    pub repository: InMemoryVideoRepository,
}

pub fn setup_pipeline(temp_dir: &Path, media_tool: MockMediaTool) -> TestPipeline {
    setup_pipeline_with(temp_dir, media_tool, MockStorage::new())
}

pub fn setup_pipeline_with(
    temp_dir: &Path,
    media_tool: MockMediaTool,
    storage: MockStorage,
) -> TestPipeline {
    let repository = InMemoryVideoRepository::new();
    let pipeline = UploadPipeline::new(
        pipeline_config(temp_dir),
        Arc::new(storage.clone()),
        Arc::new(media_tool.clone()),
        Arc::new(repository.clone()),
    );
    TestPipeline {
        pipeline,
        storage,
        media_tool,
        repository,
    }
}

/// Number of entries left directly under `dir`.
pub fn entries_in(dir: &Path) -> usize {
    std::fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
}

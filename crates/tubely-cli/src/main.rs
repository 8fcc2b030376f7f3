//! Tubely CLI: ingest videos and read them back with playable URLs.
//!
//! Storage, ffmpeg and delivery settings come from the environment (see
//! `tubely_core::Config`). Video records live in a JSON catalog file.

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tubely_cli::{init_tracing, ErrorBody, JsonCatalog};
use tubely_core::{AppError, Config, Video};
use tubely_processing::{
    FFmpegTool, FFmpegToolConfig, LocationResolver, ResolveError, UploadPipeline,
    UploadPipelineConfig, UploadRequest, VideoRepository,
};
use tubely_storage::create_storage;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "tubely", about = "Tubely video ingestion CLI")]
struct Cli {
    /// Path to the JSON video catalog
    #[arg(long, global = true, default_value = "tubely-videos.json")]
    catalog: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a video record without a video file
    Create {
        /// Owner UUID
        #[arg(long)]
        user: Uuid,
        /// Video title
        #[arg(long)]
        title: String,
        /// Optional description
        #[arg(long)]
        description: Option<String>,
    },
    /// Upload a video file for an existing record
    Upload {
        /// Video UUID
        id: Uuid,
        /// Path to the video file
        file: PathBuf,
        /// UUID of the uploading user
        #[arg(long)]
        user: Uuid,
        /// Declared content type of the file
        #[arg(long, default_value = "video/mp4")]
        content_type: String,
    },
    /// Get a single video with a playable URL
    Get {
        /// Video UUID
        id: Uuid,
    },
    /// List all videos with playable URLs
    List,
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize response")?;
    println!("{}", out);
    Ok(())
}

/// Print the caller-facing error and fail with the full detail.
fn fail(err: AppError) -> anyhow::Result<()> {
    print_json(&serde_json::json!({ "error": ErrorBody::from(&err) }))?;
    Err(anyhow::anyhow!(err.detailed_message()))
}

/// Print the caller-facing error with the record as it was stored.
fn fail_resolve(err: ResolveError) -> anyhow::Result<()> {
    let (video, error) = err.into_parts();
    print_json(&serde_json::json!({
        "error": ErrorBody::from(&error),
        "video": video,
    }))?;
    Err(anyhow::anyhow!(error.detailed_message()))
}

async fn resolver(config: &Config) -> anyhow::Result<LocationResolver> {
    let storage = create_storage(config)
        .await
        .context("Failed to initialize storage backend")?;
    Ok(LocationResolver::from_config(storage, config))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let catalog = Arc::new(JsonCatalog::open(cli.catalog));

    match cli.command {
        Commands::Create {
            user,
            title,
            description,
        } => {
            let video = Video::new(user, title, description);
            if let Err(e) = catalog.create(&video).await {
                return fail(e);
            }
            print_json(&video)?;
        }
        Commands::Upload {
            id,
            file,
            user,
            content_type,
        } => {
            let config = Config::from_env().context("Invalid configuration")?;
            let storage = create_storage(&config)
                .await
                .context("Failed to initialize storage backend")?;
            let media_tool = FFmpegTool::new(FFmpegToolConfig::from(&config))
                .context("Invalid ffmpeg configuration")?;

            let pipeline = UploadPipeline::new(
                UploadPipelineConfig::from(&config),
                storage.clone(),
                Arc::new(media_tool),
                catalog.clone(),
            );

            let body = tokio::fs::File::open(&file)
                .await
                .with_context(|| format!("Failed to open {}", file.display()))?;

            let video = match pipeline
                .upload(UploadRequest {
                    video_id: id,
                    user_id: user,
                    content_type: Some(content_type),
                    body,
                })
                .await
            {
                Ok(video) => video,
                Err(e) => return fail(e),
            };

            let resolver = LocationResolver::from_config(storage, &config);
            match resolver.resolve(video).await {
                Ok(response) => print_json(&response)?,
                Err(e) => return fail_resolve(e),
            }
        }
        Commands::Get { id } => {
            let config = Config::from_env().context("Invalid configuration")?;
            let video = match catalog.get(id).await {
                Ok(video) => video,
                Err(e) => return fail(e),
            };
            match resolver(&config).await?.resolve(video).await {
                Ok(response) => print_json(&response)?,
                Err(e) => return fail_resolve(e),
            }
        }
        Commands::List => {
            let config = Config::from_env().context("Invalid configuration")?;
            let videos = match catalog.list().await {
                Ok(videos) => videos,
                Err(e) => return fail(e),
            };
            match resolver(&config).await?.resolve_all(videos).await {
                Ok(responses) => print_json(&responses)?,
                Err(e) => return fail_resolve(e),
            }
        }
    }

    Ok(())
}

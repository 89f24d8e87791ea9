//! Command-line driver for the glyphify conversion client.
//!
//! Submits one file to a remote conversion server, prints progress
//! notifications as they arrive, and writes the finished artifact to
//! disk under the original filename. Ctrl-C cancels the running job.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use glyphify_client::{ControllerHandle, HttpConvertService, JobController, JobEvent};
use glyphify_core::limits::{Limits, DEFAULT_MAX_UPLOAD_BYTES};
use glyphify_core::params::{
    ConversionParams, DEFAULT_CHARACTERS, DEFAULT_FONT_SIZE, DEFAULT_FRAME_FREQUENCY,
    DEFAULT_IMAGE_REDUCTION, DEFAULT_SPACING,
};
use glyphify_core::upload::Upload;

#[derive(Debug, Parser)]
#[command(
    name = "glyphify",
    about = "Convert an image or video to ASCII art on a remote glyphify server"
)]
struct Cli {
    /// File to convert.
    file: PathBuf,

    /// HTTP base URL of the conversion server.
    #[arg(long, default_value = "http://localhost:5000")]
    server: String,

    /// WebSocket base URL; derived from --server when omitted.
    #[arg(long)]
    ws_server: Option<String>,

    /// Where to write the artifact; defaults to the upload's filename
    /// in the current directory.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Pixel-block reduction factor.
    #[arg(long, default_value_t = DEFAULT_IMAGE_REDUCTION)]
    image_reduction: u32,

    /// Optional output width bound.
    #[arg(long)]
    max_width: Option<u32>,

    /// Optional output height bound.
    #[arg(long)]
    max_height: Option<u32>,

    /// Glyph font size in points.
    #[arg(long, default_value_t = DEFAULT_FONT_SIZE)]
    font_size: u32,

    /// Line spacing multiplier.
    #[arg(long, default_value_t = DEFAULT_SPACING)]
    spacing: f64,

    /// Character ramp, darkest to brightest.
    #[arg(long, default_value = DEFAULT_CHARACTERS)]
    characters: String,

    /// Sample every n-th frame of video input.
    #[arg(long, default_value_t = DEFAULT_FRAME_FREQUENCY)]
    frame_frequency: u32,

    /// Client-side upload size cap in bytes.
    #[arg(long, default_value_t = DEFAULT_MAX_UPLOAD_BYTES)]
    max_upload_bytes: u64,

    /// Give up on a job stuck queued/processing after this long.
    #[arg(long, default_value_t = 600)]
    timeout_secs: u64,
}

impl Cli {
    fn params(&self) -> ConversionParams {
        ConversionParams {
            image_reduction: self.image_reduction,
            max_width: self.max_width,
            max_height: self.max_height,
            font_size: self.font_size,
            spacing: self.spacing,
            characters: self.characters.clone(),
            frame_frequency: self.frame_frequency,
        }
    }

    fn limits(&self) -> Limits {
        Limits {
            max_upload_bytes: self.max_upload_bytes,
            job_timeout: Duration::from_secs(self.timeout_secs),
        }
    }

    fn ws_url(&self) -> String {
        match &self.ws_server {
            Some(url) => url.clone(),
            // http -> ws, https -> wss
            None => self.server.replacen("http", "ws", 1),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "glyphify=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let filename = cli
        .file
        .file_name()
        .and_then(|n| n.to_str())
        .context("input path has no usable filename")?
        .to_string();
    let data = tokio::fs::read(&cli.file)
        .await
        .with_context(|| format!("failed to read {}", cli.file.display()))?;
    let upload = Upload::new(filename, data);

    let service = Arc::new(HttpConvertService::new(cli.server.clone(), cli.ws_url()));
    let handle = JobController::spawn(service, cli.limits());
    let events = handle.subscribe_events();

    let job_id = handle
        .submit(upload, cli.params())
        .await
        .map_err(|e| anyhow::anyhow!("{e}"))?;
    tracing::info!(%job_id, "Job accepted, tracking progress");

    match track_job(&handle, events).await {
        Outcome::Finished {
            artifact,
            suggested_name,
        } => {
            let path = cli
                .output
                .clone()
                .unwrap_or_else(|| PathBuf::from(&suggested_name));
            tokio::fs::write(&path, &artifact)
                .await
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("Saved {}", path.display());
            Ok(())
        }
        Outcome::Cancelled => bail!("conversion cancelled"),
        Outcome::Failed(reason) => bail!("conversion failed: {reason}"),
    }
}

enum Outcome {
    Finished {
        artifact: bytes::Bytes,
        suggested_name: String,
    },
    Cancelled,
    Failed(String),
}

/// Follow controller notifications until the job settles. Ctrl-C
/// requests cancellation; the loop then waits for the terminal event.
async fn track_job(
    handle: &ControllerHandle,
    mut events: tokio::sync::broadcast::Receiver<JobEvent>,
) -> Outcome {
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Cancellation requested");
                handle.cancel().await;
            }
            event = events.recv() => match event {
                Ok(JobEvent::Queued) => println!("Queued, waiting to start..."),
                Ok(JobEvent::Progress { percent }) => println!("Converting... {percent:.2}%"),
                Ok(JobEvent::Finished { artifact, suggested_name }) => {
                    return Outcome::Finished { artifact, suggested_name };
                }
                Ok(JobEvent::FetchFailed { reason }) => {
                    return Outcome::Failed(format!(
                        "conversion finished but the artifact could not be retrieved: {reason}"
                    ));
                }
                Ok(JobEvent::Error { reason }) => return Outcome::Failed(reason),
                Ok(JobEvent::Cancelled) => return Outcome::Cancelled,
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Missed progress notifications");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => {
                    return Outcome::Failed("controller stopped".to_string());
                }
            }
        }
    }
}

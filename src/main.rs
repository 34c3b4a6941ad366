use anyhow::Context;
use bytes::Bytes;
use clap::Parser;
use dotenvy::dotenv;
use portal_upload::{
    InMemoryTally, PortalCache, PortalConfig, UploadCandidate, UploadCoordinator, UploadOutcome,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Upload a CSV file to the portal and register it as a dataset and a thing.
#[derive(Parser, Debug)]
#[command(name = "portal-upload", version)]
struct Args {
    /// File to upload
    file: PathBuf,

    /// Declared content type (inferred from the extension when omitted)
    #[arg(long)]
    content_type: Option<String>,

    /// Portal backend base URL (overrides PORTAL_API_BASE)
    #[arg(long)]
    api_base: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    // Initialize tracing with EnvFilter
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "portal_upload=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let mut config = PortalConfig::from_env();
    if let Some(api_base) = args.api_base {
        config.api_base = api_base;
    }

    let file_name = args
        .file
        .file_name()
        .and_then(|n| n.to_str())
        .context("file path has no valid file name")?
        .to_string();

    let declared_content_type = args.content_type.unwrap_or_else(|| {
        if file_name.to_lowercase().ends_with(".csv") {
            mime::TEXT_CSV.to_string()
        } else {
            mime::APPLICATION_OCTET_STREAM.to_string()
        }
    });

    let bytes = Bytes::from(
        tokio::fs::read(&args.file)
            .await
            .with_context(|| format!("failed to read {}", args.file.display()))?,
    );

    let candidate = UploadCandidate {
        file_name,
        declared_content_type,
        size_bytes: bytes.len() as u64,
    };

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .build()
        .context("failed to build HTTP client")?;

    let cache = Arc::new(PortalCache::new());
    let tally = Arc::new(InMemoryTally::new());
    let coordinator = UploadCoordinator::new(client, config, cache, tally);

    // Print progress as it arrives.
    let mut progress = coordinator.subscribe();
    let reporter = tokio::spawn(async move {
        while progress.changed().await.is_ok() {
            let outcome = progress.borrow().clone();
            match outcome {
                UploadOutcome::InProgress(pct) => info!("uploading... {pct}%"),
                UploadOutcome::Succeeded | UploadOutcome::Failed(_) => break,
            }
        }
    });

    let receipt = coordinator.upload(candidate, bytes).await?;
    let _ = reporter.await;

    info!(
        "uploaded to {} (dataset {}, thing {})",
        receipt.file_key, receipt.dataset.id, receipt.thing.id
    );

    Ok(())
}

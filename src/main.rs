use std::sync::Arc;

use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use taskboard::{
    blob_store::{BlobStore, LocalBlobStore},
    config::{BlobBackend, Config},
    Store,
};

mod cli;
mod commands;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing; stdout is reserved for command output
    let env_filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());

    let log_format = std::env::var("LOG_FORMAT").unwrap_or_default();
    match log_format.to_lowercase().as_str() {
        "gcp" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_stackdriver::layer())
                .init();
        }
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_target(true)
                        .with_span_list(false)
                        .with_writer(std::io::stderr),
                )
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    let cli = cli::Cli::parse();

    let config = Config::load()?;
    info!(data_dir = %config.data_dir, "Loaded configuration");

    let store = Arc::new(Store::new(&config.data_dir));

    let blobs: Arc<dyn BlobStore> = match config.blobs.backend {
        BlobBackend::Redb => Arc::clone(&store) as Arc<dyn BlobStore>,
        BlobBackend::Local => {
            let local = LocalBlobStore::new(&config.blobs.local_path)?;
            info!(path = %config.blobs.local_path, "Using local image directory");
            Arc::new(local)
        }
    };

    commands::run_command(cli, &config, &store, blobs.as_ref()).await
}

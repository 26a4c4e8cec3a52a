//! Drain a loader end to end and report throughput

use std::time::Instant;

use joader_client::{LoaderClient, LoaderConfig, LoaderError};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = LoaderConfig::from_env()?;
    info!(
        "Draining loader {} over {} from {}",
        config.name, config.dataset_name, config.server_addr
    );

    let mut loader = match LoaderClient::create(config).await {
        Ok(loader) => loader,
        Err(e) => {
            error!("Failed to create loader: {}", e);
            return Err(e.into());
        }
    };

    let total = loader.len();
    let started = Instant::now();
    let mut records = 0u64;
    let mut bytes = 0u64;

    while records < total {
        match loader.next_ref().await {
            Ok(payload) => bytes += payload.len() as u64,
            Err(LoaderError::EndOfStream) => break,
            Err(e) => {
                error!("Read failed after {} records: {}", records, e);
                break;
            }
        }
        loader.mark_consumed()?;
        records += 1;

        if records % 1000 == 0 {
            let secs = started.elapsed().as_secs_f64();
            info!(
                "{} / {} records, {:.0} records/s, {:.2} MB/s",
                records,
                total,
                records as f64 / secs,
                bytes as f64 / secs / 1_000_000.0
            );
        }
    }

    let elapsed = started.elapsed();
    info!(
        "Drained {} records ({} bytes) in {:?}",
        records, bytes, elapsed
    );

    let name = loader.config().name.clone();
    let metrics = loader.metrics().export(&name);
    let outcome = loader.delete().await;
    if let Some(e) = outcome.shutdown_error() {
        warn!("{}", e);
    }
    outcome.response?;
    info!("Loader metrics:\n{}", metrics);
    Ok(())
}

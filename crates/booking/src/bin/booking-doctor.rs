//! Checks the configured store: record table, both buckets and a test
//! upload that is deleted again afterwards.
//!
//! Usage: `booking-doctor [config.json]`. Without an argument the default
//! config path is used when it exists, otherwise the built-in defaults.

use std::path::PathBuf;
use std::process::ExitCode;

use booking::config::{default_config_path, load_config};
use booking::gateway::{bounded, connect, PersistenceGateway};
use booking::model::{AttachmentSlot, AttachmentUpload};
use booking::service::{BookingService, ConnectivityStatus};
use booking::{init_logging, BookingConfig, BookingError};

const CHECK_FILE_NAME: &str = "booking-doctor-check.txt";

fn config_path() -> Option<PathBuf> {
    std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .or_else(|| default_config_path().filter(|p| p.exists()))
}

async fn run() -> Result<bool, BookingError> {
    let config = match config_path() {
        Some(path) => {
            println!("config      {}", booking::sanitize::redact_path(&path));
            load_config(&path)?
        }
        None => {
            println!("config      built-in defaults");
            BookingConfig::default()
        }
    };
    init_logging(&config.logging)?;

    let gateway = connect(&config)?;
    let service = BookingService::new(gateway.clone(), &config)?;
    let mut healthy = true;

    match service.check_connectivity().await {
        ConnectivityStatus::Reachable { store, latency } => {
            println!("records     ok ({} store, {} ms)", store, latency.as_millis());
        }
        ConnectivityStatus::Unreachable { store, error } => {
            println!("records     FAILED ({} store): {}", store, error);
            return Ok(false);
        }
    }

    match service.prepare_buckets().await {
        Ok(buckets) => {
            for (bucket, created) in buckets {
                let state = if created { "created" } else { "exists" };
                println!("bucket      {} ({})", bucket, state);
            }
        }
        Err(error) => {
            println!("buckets     FAILED: {}", error);
            healthy = false;
        }
    }

    let sample = AttachmentUpload::new(
        CHECK_FILE_NAME,
        "text/plain",
        format!("booking-doctor {}", chrono::Utc::now().to_rfc3339()).into_bytes(),
    );
    let bucket = config.buckets.for_slot(AttachmentSlot::Primary);
    let uploaded = bounded(
        config.store_timeout(),
        "upload_attachment",
        gateway.upload_attachment(&sample, CHECK_FILE_NAME, bucket),
    )
    .await;
    match uploaded {
        Ok(reference) => {
            println!(
                "upload      ok -> {}",
                booking::sanitize::redact_url(&reference)
            );
            // Cleanup trouble is reported but does not fail the run.
            match bounded(
                config.store_timeout(),
                "delete_attachment",
                gateway.delete_attachment(&reference),
            )
            .await
            {
                Ok(()) => println!("cleanup     ok"),
                Err(error) => println!("cleanup     WARNING: test file left behind: {}", error),
            }
        }
        Err(error) => {
            println!("upload      FAILED: {}", error);
            healthy = false;
        }
    }

    Ok(healthy)
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(true) => {
            println!("All checks passed");
            ExitCode::SUCCESS
        }
        Ok(false) => ExitCode::FAILURE,
        Err(error) => {
            eprintln!("Error: {}", error);
            ExitCode::from(2)
        }
    }
}

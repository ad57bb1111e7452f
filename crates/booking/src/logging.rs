//! Process-wide tracing subscriber.
//!
//! `RUST_LOG` wins over the configured filter. `log` records from the
//! SQLite layer are bridged into tracing.

use thiserror::Error;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::{LogFormat, LoggingConfig};

#[derive(Error, Debug)]
pub enum LoggingError {
    #[error("Invalid log filter '{filter}': {source}")]
    InvalidFilter {
        filter: String,
        #[source]
        source: tracing_subscriber::filter::ParseError,
    },

    #[error("A global subscriber is already installed")]
    AlreadyInitialized(#[from] tracing::subscriber::SetGlobalDefaultError),

    #[error("Could not bridge log records: {0}")]
    LogBridge(#[from] log::SetLoggerError),
}

pub fn parse_filter(directives: &str) -> Result<EnvFilter, LoggingError> {
    EnvFilter::try_new(directives).map_err(|source| LoggingError::InvalidFilter {
        filter: directives.to_string(),
        source,
    })
}

fn build_filter(config: &LoggingConfig) -> Result<EnvFilter, LoggingError> {
    match std::env::var(EnvFilter::DEFAULT_ENV) {
        Ok(directives) if !directives.trim().is_empty() => parse_filter(&directives),
        _ => parse_filter(&config.filter),
    }
}

/// Installs the global subscriber. Call once, early in `main`.
pub fn init_logging(config: &LoggingConfig) -> Result<(), LoggingError> {
    let filter = build_filter(config)?;

    let (text, json) = match config.format {
        LogFormat::Pretty => (Some(fmt::layer().with_target(true)), None),
        LogFormat::Json => (
            None,
            Some(fmt::layer().json().with_current_span(true).with_span_list(false)),
        ),
    };

    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(text)
        .with(json);
    tracing::subscriber::set_global_default(subscriber)?;
    tracing_log::LogTracer::init()?;

    tracing::debug!(format = ?config.format, "Logging initialized");
    Ok(())
}

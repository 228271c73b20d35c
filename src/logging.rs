//! Tracing and logging setup module.
//!
//! Structured logging configuration for consumers of the pipeline: pretty
//! output for development, JSON elsewhere, filtered through the standard
//! env-filter directives.

use anyhow::Result;
use tracing_subscriber::prelude::*;

/// Initialize structured logging with tracing
///
/// The crate-level log level defaults to `info` and can be overridden with
/// `PLATE_SCAN_LOG_LEVEL`; `LOG_FORMAT=pretty` switches from JSON to
/// human-readable output.
pub fn init_tracing() -> Result<()> {
    let level = std::env::var("PLATE_SCAN_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(format!("plate_scan={}", level).parse()?);

    if std::env::var("LOG_FORMAT").unwrap_or_else(|_| "json".to_string()) == "pretty" {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .pretty()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_thread_names(false),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_thread_names(true),
            )
            .init();
    }

    tracing::info!(log_level = %level, "Tracing initialized with structured logging");
    Ok(())
}

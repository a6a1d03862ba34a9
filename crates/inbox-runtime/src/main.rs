//! # Image Inbox Node
//!
//! Entry point for the image inbox service.
//!
//! ## Startup Sequence
//!
//! 1. Read a `.env` file from the working directory (or a parent), if any;
//!    variables set in the process environment win over the file
//! 2. Initialize logging from `INBOX_LOG_LEVEL` / `RUST_LOG`
//! 3. Load and validate gateway configuration
//! 4. Open the artifact and metadata directories (created if absent)
//! 5. Serve HTTP until Ctrl+C, then drain in-flight requests

use anyhow::{Context, Result};
use inbox_gateway::{GatewayConfig, InboxGatewayService};
use inbox_telemetry::{init_telemetry, TelemetryConfig};
use std::collections::HashMap;
use std::env;
use std::fs::File;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let env_file =
        collect_env_file(dotenvy::dotenv_iter()).context("failed to read .env file")?;
    let lookup = layered(|key| env::var(key).ok(), &env_file);

    let _telemetry = init_telemetry(TelemetryConfig::from_lookup(&lookup))
        .context("failed to initialize logging")?;

    if !env_file.is_empty() {
        info!(variables = env_file.len(), "Loaded .env file");
    }

    let config = GatewayConfig::from_lookup(&lookup).context("invalid gateway configuration")?;
    info!(
        addr = %config.http_addr(),
        client_id = %config.auth.client_id,
        max_upload_size = config.limits.max_upload_size,
        "Loaded configuration"
    );

    let service = InboxGatewayService::new(config).context("failed to build inbox gateway")?;

    service
        .start(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "Failed to listen for Ctrl+C");
                std::future::pending::<()>().await;
            }
        })
        .await
        .context("inbox gateway stopped with an error")?;

    Ok(())
}

/// Entries of a `.env` file; a missing file reads as empty.
fn collect_env_file(
    file: dotenvy::Result<dotenvy::Iter<File>>,
) -> dotenvy::Result<HashMap<String, String>> {
    match file {
        Ok(entries) => entries.collect(),
        Err(e) if e.not_found() => Ok(HashMap::new()),
        Err(e) => Err(e),
    }
}

/// Look a variable up in `process` first, then in the `.env` entries.
fn layered<'a>(
    process: impl Fn(&str) -> Option<String> + 'a,
    env_file: &'a HashMap<String, String>,
) -> impl Fn(&str) -> Option<String> + 'a {
    move |key| process(key).or_else(|| env_file.get(key).cloned())
}

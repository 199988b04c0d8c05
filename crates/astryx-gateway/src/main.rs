//! ASTRYX gateway binary.
//!
//! Wires the snapshot log, history, viewer hub, and HTTP server together.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `ASTRYX_CONFIG` (default `astryx-config.yaml`)
//! 2. Initialize structured logging (tracing)
//! 3. Replay the agent's snapshot log into history
//! 4. Build shared state and the viewer hub
//! 5. Serve until `Ctrl-C`

mod config;
mod error;

use std::path::PathBuf;
use std::sync::Arc;

use astryx_observer::replay::load_history;
use astryx_observer::{AppState, BroadcastHub, HistoryStore};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::{GatewayConfig, LogFormat, LoggingConfig};
use crate::error::GatewayError;

const DEFAULT_CONFIG_PATH: &str = "astryx-config.yaml";

/// Application entry point for the gateway.
///
/// # Errors
///
/// Returns an error if configuration is invalid, the snapshot log exists
/// but cannot be read, or the server cannot bind.
#[tokio::main]
async fn main() -> Result<(), GatewayError> {
    // 1. Load configuration. Logging is not up yet, so remember where it
    //    came from and report it afterwards.
    let (config, config_path, from_file) = load_config()?;

    // 2. Initialize structured logging.
    init_tracing(&config.logging)?;
    info!(
        path = %config_path.display(),
        from_file,
        host = config.server.host,
        port = config.server.port,
        retention = ?config.history.retention,
        connection_buffer = config.hub.connection_buffer,
        "Configuration loaded"
    );

    // 3. Replay the snapshot log.
    let history = if config.history.replay_on_start {
        let (history, _outcome) =
            load_history(config.history.replay_path.clone(), config.history.retention).await?;
        history
    } else {
        info!("Startup replay disabled");
        HistoryStore::with_retention(config.history.retention)
    };

    // 4. Build shared state.
    let hub = BroadcastHub::new(config.hub.connection_buffer);
    let state = Arc::new(AppState::from_parts(history, hub, config.guard.clone()));

    // 5. Serve.
    astryx_observer::start_server(&config.server, state).await?;

    info!("astryx-gateway exiting");
    Ok(())
}

/// Load configuration from the path in `ASTRYX_CONFIG`, or
/// `astryx-config.yaml`.
///
/// A missing file yields defaults with environment overrides applied.
fn load_config() -> Result<(GatewayConfig, PathBuf, bool), GatewayError> {
    let path = std::env::var_os("ASTRYX_CONFIG")
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);
    if path.exists() {
        let config = GatewayConfig::from_file(&path)?;
        Ok((config, path, true))
    } else {
        let config = GatewayConfig::parse("")?;
        Ok((config, path, false))
    }
}

/// Install the global subscriber. `RUST_LOG` wins over the configured
/// level.
fn init_tracing(logging: &LoggingConfig) -> Result<(), GatewayError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    let installed = match logging.format {
        LogFormat::Pretty => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };

    installed.map_err(|e| GatewayError::Logging {
        message: format!("{e}"),
    })
}

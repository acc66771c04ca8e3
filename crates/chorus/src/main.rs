//! # chorus
//!
//! Chorus hub binary: loads settings, starts the WebSocket server, and runs
//! until interrupted.

#![deny(unsafe_code)]

use std::path::PathBuf;

use anyhow::{Context, Result};
use chorus_core::logging::init_subscriber;
use chorus_server::config::ServerConfig;
use chorus_server::metrics::install_recorder;
use chorus_server::server::ChorusServer;
use chorus_settings::{ChorusSettings, load_settings_from_path, settings_path};
use clap::Parser;
use tracing::{info, warn};

/// Chorus WebSocket broadcast hub.
#[derive(Parser, Debug)]
#[command(name = "chorus", about = "WebSocket broadcast hub")]
struct Cli {
    /// Host to bind (overrides settings).
    #[arg(long)]
    host: Option<String>,

    /// Port to bind, 0 for auto-assign (overrides settings).
    #[arg(long)]
    port: Option<u16>,

    /// Settings file to load instead of `~/.chorus/settings.json`.
    #[arg(long)]
    settings: Option<PathBuf>,
}

impl Cli {
    fn settings_file(&self) -> PathBuf {
        self.settings.clone().unwrap_or_else(settings_path)
    }

    /// Command-line flags win over the file and the environment.
    fn apply(&self, settings: &mut ChorusSettings) {
        if let Some(host) = &self.host {
            settings.server.host.clone_from(host);
        }
        if let Some(port) = self.port {
            settings.server.port = port;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let path = cli.settings_file();
    let mut settings = load_settings_from_path(&path)
        .with_context(|| format!("Failed to load settings from {}", path.display()))?;
    cli.apply(&mut settings);

    init_subscriber(&settings.logging.level, settings.logging.format);

    let metrics = match install_recorder() {
        Ok(handle) => Some(handle),
        Err(e) => {
            warn!(error = %e, "metrics recorder unavailable, /metrics disabled");
            None
        }
    };

    let server = ChorusServer::new(ServerConfig::from(&settings.server), metrics)
        .listen()
        .await
        .context("Failed to start server")?;
    info!(addr = %server.local_addr(), "chorus ready");

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for ctrl-c")?;
    info!("shutdown signal received");

    server.shutdown().await;
    Ok(())
}

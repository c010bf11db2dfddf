//! # obs-control
//!
//! Control-panel server binary. Keeps one supervised obs-websocket session
//! alive and serves the panel HTTP API on top of it.

#![deny(unsafe_code)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use secrecy::SecretString;

use obs_control_core::security::{Credential, UpstreamTarget};
use obs_control_link::{LinkConfig, ObsSession, UpstreamLink};
use obs_control_server::ServerConfig;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

/// OBS control panel server.
#[derive(Parser)]
#[command(name = "obs-control", about = "OBS control panel server")]
struct Cli {
    /// Host to bind.
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    host: String,

    /// Port to bind (0 for auto-assign).
    #[arg(long, env = "PORT", default_value = "8080")]
    port: u16,

    /// obs-websocket endpoint.
    #[arg(long, env = "OBS_WS_URL", default_value = "ws://127.0.0.1:4455")]
    obs_ws_url: String,

    #[arg(long, env = "OBS_WS_PASSWORD", default_value = "", hide = true, hide_env_values = true)]
    obs_ws_password: String,

    /// Shared token required in `x-panel-token`. Empty disables the check.
    #[arg(long, env = "PANEL_TOKEN", default_value = "", hide_env_values = true)]
    panel_token: String,

    /// Panel layout document served at `/api/panel`.
    #[arg(long, env = "PANEL_JSON_PATH", default_value = "/app/panel.json")]
    panel_json_path: PathBuf,

    /// Directory of static panel assets.
    #[arg(long, env = "PUBLIC_DIR", default_value = "public")]
    public_dir: PathBuf,

    /// Pause between failed OBS connect attempts.
    #[arg(long, env = "OBS_RETRY_DELAY_MS", default_value = "2000")]
    retry_delay_ms: u64,

    #[arg(long, env = "LOG_FORMAT", value_enum, default_value = "text")]
    log_format: LogFormat,
}

impl Cli {
    fn upstream_target(&self) -> UpstreamTarget {
        UpstreamTarget::new(
            self.obs_ws_url.clone(),
            Credential::new(self.obs_ws_password.clone()),
        )
    }

    fn link_config(&self) -> LinkConfig {
        LinkConfig {
            retry_delay: Duration::from_millis(self.retry_delay_ms),
        }
    }

    fn server_config(&self) -> ServerConfig {
        let panel_token =
            (!self.panel_token.is_empty()).then(|| SecretString::from(self.panel_token.clone()));
        ServerConfig {
            host: self.host.clone(),
            port: self.port,
            public_dir: self.public_dir.clone(),
            panel_path: self.panel_json_path.clone(),
            panel_token,
            ..Default::default()
        }
    }
}

fn init_logging(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_format);

    tracing::info!(obs_url = %cli.obs_ws_url, "Starting obs-control");

    // The supervisor owns the initial connect too, so health is served while
    // OBS is still unreachable.
    let link = Arc::new(UpstreamLink::new(
        Arc::new(ObsSession::default()),
        cli.upstream_target(),
        cli.link_config(),
    ));
    let _supervisor = link.start();

    let config = cli.server_config();
    let handle = obs_control_server::start(config, Arc::clone(&link))
        .await
        .with_context(|| format!("Failed to bind {}:{}", cli.host, cli.port))?;

    tracing::info!(port = handle.port, obs_url = %cli.obs_ws_url, "obs-control ready");

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for ctrl+c")?;

    tracing::info!("Shutting down");
    Ok(())
}

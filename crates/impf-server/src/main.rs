//! impf server binary.
//!
//! Reads `config.toml` (or the path given with `--config`) plus `IMPF_*`
//! environment variables, opens the SQLite store, starts the dispatcher
//! tick and serves the JSON API under `/api`.

mod server_config;

use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::Context as _;
use axum::Router;
use clap::Parser;
use impf_coordinator::{Coordinator, Scheduler, Settings};
use impf_notify::HttpNotifier;
use impf_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, level_filters::LevelFilter, warn};
use tracing_subscriber::EnvFilter;

use crate::server_config::{ServerConfig, expand_tilde};

#[derive(Parser)]
#[command(author, version, about = "Vaccination call coordinator")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let cfg = ServerConfig::load(&cli.config)?;

  let store_path = expand_tilde(&cfg.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  if cfg.sms.disabled {
    warn!("SMS sending disabled, messages are only logged");
  }
  let notifier = HttpNotifier::new(cfg.sms.clone()).context("failed to set up SMS gateway")?;

  let settings = Settings {
    token_secret: cfg.token_secret.clone(),
    utc_offset:   cfg.utc_offset()?,
  };
  let coordinator = Arc::new(Coordinator::new(store, notifier, settings));

  let scheduler = Scheduler::spawn(
    coordinator.clone(),
    Duration::from_secs(cfg.tick_interval_secs),
  );

  let app = Router::new()
    .nest("/api", impf_api::api_router(coordinator))
    .layer(TraceLayer::new_for_http());

  let address = cfg.address();
  info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  let served = axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server error");

  scheduler.stop().await;
  served
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    warn!(error = %e, "failed to listen for Ctrl-C");
    std::future::pending::<()>().await;
  }
  info!("shutdown requested");
}

//! TweetRater · Offensive Tweet Classifier Backend
//!
//! - Axum HTTP API + server-rendered pages
//! - CNN classifier evaluated in-process from exported JSON artifacts
//!   (built-in demo bundle when none are configured)
//! - "Beat the model" challenge with per-browser sessions
//! - Static asset fallback (./static)
//!
//! Important env variables:
//!   PORT                    : u16 (default 5001, overrides the config file)
//!   TWEETRATER_CONFIG_PATH  : path to TOML config (server, artifacts, challenge)
//!   LOG_LEVEL               : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT              : "pretty" (default), "compact" or "json"

mod telemetry;
mod util;
mod domain;
mod error;
mod config;
mod normalize;
mod encoder;
mod model;
mod dataset;
mod session;
mod scoring;
mod seeds;
mod state;
mod protocol;
mod logic;
mod pages;
mod routes;

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::{info, instrument};

use crate::config::load_app_config_from_env;
use crate::routes::build_router;
use crate::state::AppState;

#[instrument(level = "info", skip_all)]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  let config = load_app_config_from_env();
  let addr = SocketAddr::from((config.server.host, config.server.port));

  // Load artifacts, validate them and build the prediction table + session store.
  let state = Arc::new(AppState::from_config(config)?);

  // Build the HTTP router with routes, CORS and tracing layers.
  let app = build_router(state.clone());

  let listener = TcpListener::bind(addr).await?;
  info!(target: "tweetrater", %addr, prefix = %state.config.route_prefix(), "HTTP server listening");
  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await?;
  info!(target: "tweetrater", "Server stopped");
  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    tracing::error!(target: "tweetrater", error = %e, "Failed to listen for shutdown signal");
    std::future::pending::<()>().await;
  }
  info!(target: "tweetrater", "Shutdown signal received");
}

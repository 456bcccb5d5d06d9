// ABOUTME: Coach server binary serving the turn endpoint over HTTP
// ABOUTME: Loads environment configuration, wires in-memory tools and runs the axum router
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Pierre Coach Server Binary
//!
//! Starts the conversational coach with the in-memory workout tools. The
//! model runtime is selected with `PIERRE_LLM_PROVIDER`; without one every
//! turn is answered by the deterministic fallback.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use pierre_coach::{
    config::ServerConfig,
    logging,
    resources::CoachResources,
    routes,
    tools::{InMemoryWorkoutTools, ToolExecutor},
};
use tokio::net::TcpListener;
use tracing::info;

#[derive(Parser)]
#[command(name = "pierre-coach-server")]
#[command(about = "Pierre Coach - conversational workout coach with deterministic fallback")]
pub struct Args {
    /// Override HTTP port
    #[arg(long)]
    http_port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    logging::init_from_env()?;

    let mut config = ServerConfig::from_env()?;
    if let Some(http_port) = args.http_port {
        config.http_port = http_port;
    }

    let store = Arc::new(InMemoryWorkoutTools::new());
    let tools: Arc<dyn ToolExecutor> = Arc::new(store.registry()?);
    let resources = Arc::new(CoachResources::from_config(&config, tools)?);
    let app = routes::router(resources);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.http_port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Pierre coach server listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("Pierre coach server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
}

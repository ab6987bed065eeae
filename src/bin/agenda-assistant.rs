// ABOUTME: HTTP server binary for the Agenda Assistant
// ABOUTME: Loads configuration, opens the database, and serves the assistant routes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Agenda Assistant contributors

//! # Agenda Assistant Server Binary
//!
//! Configuration comes from the environment; the few flags below override it.

use std::net::SocketAddr;
use std::sync::Arc;

use agenda_assistant::config::ServerConfig;
use agenda_assistant::logging;
use agenda_assistant::resources::ServerResources;
use agenda_assistant::routes;
use anyhow::{Context, Result};
use clap::Parser;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "agenda-assistant")]
#[command(about = "Agenda Assistant - conversational agent for tasks, events, notes and projects")]
pub struct Args {
    /// Override HTTP port
    #[arg(long)]
    http_port: Option<u16>,

    /// Override the sqlx database URL
    #[arg(long)]
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    logging::init_from_env()?;

    let mut config = ServerConfig::from_env().context("Failed to load configuration")?;
    if let Some(http_port) = args.http_port {
        config.http_port = http_port;
    }
    if let Some(database_url) = args.database_url {
        config.database_url = database_url;
    }

    info!("Starting Agenda Assistant");
    info!("{}", config.summary());

    let addr: SocketAddr = format!("{}:{}", config.host, config.http_port)
        .parse()
        .context("Invalid HOST/HTTP_PORT")?;

    let resources = Arc::new(
        ServerResources::from_config(config)
            .await
            .context("Failed to initialize server resources")?,
    );
    let app = routes::router(resources);

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(%addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    info!("Shutdown signal received");
}

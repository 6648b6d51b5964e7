// ABOUTME: Server binary entry point for the Tally authentication service
// ABOUTME: Loads configuration, initializes logging and storage, then serves HTTP
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tally Finance

//! # Tally Server Binary
//!
//! Starts the authentication/session service: environment-driven
//! configuration, structured logging, SQLite-backed storage and the axum
//! HTTP surface.

use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tally_server::{config::ServerConfig, database::Database, logging, server};
use tracing::info;

#[derive(Parser)]
#[command(name = "tally-server")]
#[command(about = "Tally Finance API - authentication and session backend")]
pub struct Args {
    /// Override HTTP port
    #[arg(long)]
    http_port: Option<u16>,

    /// Override database URL (e.g. sqlite:data/tally.db)
    #[arg(long)]
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    logging::init_from_env()?;

    let mut config = ServerConfig::from_env()?;
    if let Some(http_port) = args.http_port {
        config.http_port = http_port;
    }
    if let Some(database_url) = args.database_url {
        config.database_url = tally_server::config::DatabaseUrl::parse_url(&database_url)?;
    }

    info!("Starting Tally Finance API");
    info!("{}", config.summary());

    let database = Database::new(&config.database_url.to_connection_string())
        .await
        .map_err(|e| anyhow::anyhow!("{e}"))?;
    info!("database ready");

    let resources = Arc::new(server::ServerResources::new(database, config));

    server::serve(resources).await.map_err(|e| anyhow::anyhow!("{e}"))
}

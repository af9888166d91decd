//! HTTP server command
//!
//! Runs the student API with request tracing and graceful shutdown.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use clap::Parser;
use studentdb_core::DatabaseConfig;
use studentdb_server::db::create_pool;
use studentdb_server::http::{run_server, ServerConfig};

use super::connect_app;

/// Arguments for the serve command
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Address to bind to
    #[arg(long, short = 'b', default_value = "127.0.0.1:8000")]
    pub bind: SocketAddr,

    /// Allow permissive CORS (all origins) - use with caution
    #[arg(long)]
    pub cors_permissive: bool,

    /// Database URL (overrides the DB_* application credentials)
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,
}

/// Run the HTTP server until Ctrl+C or SIGTERM
pub async fn run_serve(args: ServeArgs, config: &DatabaseConfig) -> Result<()> {
    let pool = match &args.database_url {
        Some(url) => create_pool(url)
            .await
            .context("Failed to create database pool from DATABASE_URL")?,
        None => connect_app(config).await?.connect().await?,
    };

    tracing::info!("Starting student-db server on {}", args.bind);

    let server_config = ServerConfig {
        bind_addr: args.bind,
        cors_permissive: args.cors_permissive,
    };

    // Blocks until shutdown; the pool is closed on the way out
    run_server(pool, server_config)
        .await
        .context("Server error")?;

    Ok(())
}

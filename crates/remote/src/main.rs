// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! relief-remote: canonical record store for relief clients.
//!
//! Serves table requests over WebSocket and keeps every table in a single
//! SQLite database under the data directory.

mod server;
mod state;

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// relief-remote: record store server for offline-first relief clients
#[derive(Parser, Debug)]
#[command(name = "relief-remote")]
#[command(about = "WebSocket record store for relief clients")]
struct Args {
    /// Address to bind the server to
    #[arg(short, long, default_value = "0.0.0.0:7890")]
    bind: SocketAddr,

    /// Directory for the record database
    #[arg(short, long, default_value = ".")]
    data: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let level = if args.verbose { Level::DEBUG } else { Level::INFO };

    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting relief-remote server");
    info!("  Bind address: {}", args.bind);
    info!("  Data directory: {}", args.data.display());

    std::fs::create_dir_all(&args.data)?;
    let state = state::ServerState::open(&args.data)?;

    server::run(args.bind, state).await?;

    Ok(())
}

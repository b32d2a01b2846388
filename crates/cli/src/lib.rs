// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! reliefrs - command-line client for the relief offline sync layer.
//!
//! This crate provides the `relief` CLI: it connects a
//! [`relief_core::DataAccess`] facade to a relief-remote server over
//! WebSocket and keeps its cache and offline queue in `.relief/local.db`.
//!
//! # Main Components
//!
//! - [`Config`] - Client configuration (owner, role, remote, tunables)
//! - [`transport`] - WebSocket transport and its trait seam
//! - [`TransportRemote`] - [`relief_core::RemoteStore`] over a transport
//! - [`Error`] - Error types for all operations

mod cli;
mod commands;
mod display;

pub mod config;
pub mod error;
pub mod remote;
pub mod transport;

pub use cli::{CacheCommand, Cli, Command, QueueCommand};
pub use config::{find_relief_dir, init_relief_dir, Config, RemoteConfig};
pub use error::{Error, Result};
pub use remote::TransportRemote;

use std::io::Write;

use commands::Context;

/// Runs a parsed command to completion on a fresh runtime.
pub fn run(command: Command) -> Result<()> {
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(dispatch(command))
}

async fn dispatch(command: Command) -> Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    if let Command::Init { owner, role, remote } = command {
        let cwd = std::env::current_dir()?;
        return commands::init::run(&cwd, owner, role, remote, &mut out);
    }

    let relief_dir = find_relief_dir()?;
    let ctx = Context::open(&relief_dir).await?;
    let result = execute(&ctx, command, &mut out).await;
    ctx.close().await;
    out.flush()?;
    result
}

async fn execute(ctx: &Context, command: Command, out: &mut impl Write) -> Result<()> {
    match command {
        // Handled by dispatch before a context exists.
        Command::Init { .. } => Ok(()),
        Command::Write { table, record, update, priority } => {
            commands::write::run(ctx, &table, &record, update, priority, out).await
        }
        Command::Delete { table, id, priority } => {
            commands::write::delete(ctx, &table, &id, priority, out).await
        }
        Command::Read { table, json } => commands::read::run(ctx, &table, json, out).await,
        Command::Search { term, table } => commands::read::search(ctx, &table, &term, out),
        Command::Status { json } => commands::status::run(ctx, json, out),
        Command::Sync => commands::status::sync(ctx, out).await,
        Command::DeadLetters { clear } => commands::status::dead_letters(ctx, clear, out),
        Command::Queue { command } => match command {
            QueueCommand::List => commands::queue::list(ctx, out),
            QueueCommand::Clear => commands::queue::clear(ctx, out),
        },
        Command::Cache { command } => match command {
            CacheCommand::Stats { json } => commands::cache::stats(ctx, json, out),
            CacheCommand::Clear => commands::cache::clear(ctx, out),
            CacheCommand::Get { key } => commands::cache::get(ctx, &key, out),
        },
    }
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;

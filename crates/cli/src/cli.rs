// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use clap::{Parser, Subcommand};
use relief_core::{Priority, Role};

// Custom help template that groups commands into sections
const HELP_TEMPLATE: &str = "{about-with-newline}
{usage-heading} {usage}

{before-help}Options:
{options}{after-help}";

const COMMANDS_HELP: &str = "\
Records:
  write         Insert or update a record
  delete        Delete a record
  read          Read records (from the remote, or the cache when offline)
  search        Search cached records

Sync:
  status        Show connectivity and queue status
  sync          Replay queued writes now
  queue         Inspect or clear queued writes
  dead-letters  Show writes dropped during replay

Setup:
  init          Initialize relief in this directory
  cache         Inspect or clear the local cache
";

const QUICKSTART_HELP: &str = "\
Get started:
  relief init --remote ws://localhost:7890            Initialize with a remote
  relief write requests '{\"description\": \"water\"}'    Raise a request
  relief read requests                                 Read your requests
  relief status                                        See what is still queued";

#[derive(Parser)]
#[command(name = "relief")]
#[command(about = "Offline-first client for emergency relief coordination")]
#[command(
    long_about = "Offline-first client for emergency relief coordination.\n\n\
    Writes go straight to the remote when it is reachable and are queued locally \
    when it is not. Reads fall back to the local cache."
)]
#[command(help_template = HELP_TEMPLATE)]
#[command(before_help = COMMANDS_HELP)]
#[command(after_help = QUICKSTART_HELP)]
pub struct Cli {
    /// Log debug output to stderr
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Initialize relief in the current directory
    #[command(after_help = "Examples:\n  \
        relief init                                   Generate an owner id, admin role\n  \
        relief init --role victim                     Read only your own requests\n  \
        relief init --remote ws://relief.local:7890   Connect to a relief-remote server")]
    Init {
        /// Owner id (a UUID); generated when omitted
        #[arg(long)]
        owner: Option<String>,

        /// Role deciding which requests reads cover (victim, volunteer, admin)
        #[arg(long, default_value = "admin")]
        role: Role,

        /// relief-remote WebSocket URL
        #[arg(long)]
        remote: Option<String>,
    },

    /// Insert a record, or update one with --update
    #[command(after_help = "Examples:\n  \
        relief write requests '{\"description\": \"water\"}'            Insert\n  \
        relief write requests '{\"status\": \"done\"}' --update <id>    Update by id\n  \
        relief write messages '{\"content\": \"hi\"}' -p low            Low priority")]
    Write {
        /// Target table (requests, volunteers, messages, ...)
        table: String,

        /// Record as a JSON object
        record: String,

        /// Update the record with this id instead of inserting
        #[arg(long, value_name = "ID")]
        update: Option<String>,

        /// Replay priority if the write has to be queued (high, medium, low)
        #[arg(long, short, default_value = "medium")]
        priority: Priority,
    },

    /// Delete a record
    Delete {
        /// Target table
        table: String,

        /// Record id
        id: String,

        /// Replay priority if the delete has to be queued (high, medium, low)
        #[arg(long, short, default_value = "medium")]
        priority: Priority,
    },

    /// Read the records of a table visible to you
    Read {
        /// Table to read
        table: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Search cached records for a term
    Search {
        /// Case-insensitive search term
        term: String,

        /// Table whose cached rows are searched
        #[arg(long, short, default_value = "requests")]
        table: String,
    },

    /// Show connectivity and queue status
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Replay queued writes now
    Sync,

    /// Inspect or clear the local cache
    Cache {
        #[command(subcommand)]
        command: CacheCommand,
    },

    /// Inspect or clear queued writes
    Queue {
        #[command(subcommand)]
        command: QueueCommand,
    },

    /// Show writes dropped during replay
    DeadLetters {
        /// Forget all dead letters
        #[arg(long)]
        clear: bool,
    },
}

#[derive(Subcommand)]
pub enum CacheCommand {
    /// Show cache usage
    Stats {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Remove every cache entry
    Clear,
    /// Print a cached value by key or table name
    Get {
        /// Cache key, or a table name for your own rows
        key: String,
    },
}

#[derive(Subcommand)]
pub enum QueueCommand {
    /// List queued writes in replay order
    List,
    /// Discard every queued write
    Clear,
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;

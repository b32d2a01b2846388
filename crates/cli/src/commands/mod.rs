// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

pub mod cache;
pub mod init;
pub mod queue;
pub mod read;
pub mod status;
#[cfg(test)]
#[path = "mod_tests.rs"]
pub mod testing;
pub mod write;

use std::path::Path;
use std::sync::Arc;

use relief_core::{DataAccess, LocalStore, ReadScope, RemoteStore, SqliteStore, SyncOrchestrator};
use tracing::{debug, warn};

use crate::config::{db_path, Config};
use crate::error::Result;
use crate::remote::TransportRemote;
use crate::transport::WebSocketTransport;

/// Everything a command needs: config, the facade and the live connection.
pub struct Context {
    pub config: Config,
    pub access: DataAccess,
    connection: Option<Arc<TransportRemote<WebSocketTransport>>>,
}

impl Context {
    /// Wires a facade over `store` and `remote` using the config's tunables.
    pub fn new(config: Config, store: Arc<dyn LocalStore>, remote: Arc<dyn RemoteStore>) -> Self {
        let sync = SyncOrchestrator::builder(store, remote)
            .sync_config(config.sync.clone())
            .cache_config(config.cache.clone())
            .build();
        let access = DataAccess::new(Arc::new(sync), config.owner_id.clone());
        Context { config, access, connection: None }
    }

    /// Opens the local state in `relief_dir` and connects to the configured remote.
    ///
    /// An unreachable or unconfigured remote is not an error: the context is
    /// marked offline so writes queue and reads come from the cache.
    pub async fn open(relief_dir: &Path) -> Result<Self> {
        let config = Config::load(relief_dir)?;
        let store = Arc::new(SqliteStore::open(&db_path(relief_dir))?);
        let remote = Arc::new(TransportRemote::new(WebSocketTransport::new()));

        let online = match &config.remote {
            Some(remote_config) => {
                match remote.connect(&remote_config.url, remote_config.connect_timeout()).await {
                    Ok(()) => {
                        debug!("connected to {}", remote_config.url);
                        true
                    }
                    Err(e) => {
                        warn!("remote {} unreachable, working offline: {}", remote_config.url, e);
                        false
                    }
                }
            }
            None => false,
        };

        let mut ctx = Context::new(config, store, remote.clone());
        ctx.connection = Some(remote);
        ctx.set_online(online).await;
        Ok(ctx)
    }

    /// Records connectivity. When online, writes queued by earlier runs are replayed first.
    pub async fn set_online(&self, online: bool) {
        let sync = self.access.orchestrator();
        sync.set_online(online);
        if online && !sync.queue().is_empty() {
            let report = sync.drain().await;
            debug!(?report, "replayed writes queued while offline");
        }
    }

    /// The rows reads cover for the configured owner and role.
    pub fn scope(&self) -> ReadScope {
        ReadScope::new(self.config.owner_id.clone(), self.config.role)
    }

    /// Closes the remote connection, if any.
    pub async fn close(&self) {
        if let Some(connection) = &self.connection {
            if let Err(e) = connection.disconnect().await {
                debug!("disconnect failed: {}", e);
            }
        }
    }
}

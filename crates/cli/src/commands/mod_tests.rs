// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

//! Test infrastructure for command testing without filesystem setup.
//!
//! `TestContext` wires a [`Context`] over an in-memory store and an
//! in-memory remote, so commands can be exercised online and offline
//! without a `.relief/` directory or a server.

use std::sync::Arc;

use relief_core::{MemoryRemote, MemoryStore, Role};

use super::Context;
use crate::config::Config;

pub const OWNER: &str = "6fa459ea-ee8a-3ca4-894e-db77e160355e";

/// Test context with an in-memory store and remote.
pub struct TestContext {
    pub ctx: Context,
    pub remote: Arc<MemoryRemote>,
    pub store: Arc<MemoryStore>,
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_role(Role::Admin)
    }

    pub fn with_role(role: Role) -> Self {
        let mut config = Config::new(OWNER, role).expect("valid owner");
        // Failed actions are immediately due again.
        config.sync.base_delay_ms = 0;
        let store = Arc::new(MemoryStore::new());
        let remote = Arc::new(MemoryRemote::new());
        let ctx = Context::new(config, store.clone(), remote.clone());
        TestContext { ctx, remote, store }
    }

    /// Cuts the remote off and marks the context offline.
    pub async fn go_offline(&self) {
        self.remote.set_offline(true);
        self.ctx.set_online(false).await;
    }

    /// Restores the remote; queued writes are replayed.
    pub async fn go_online(&self) {
        self.remote.set_offline(false);
        self.ctx.set_online(true).await;
    }
}

/// Command output as text.
pub fn text(out: Vec<u8>) -> String {
    String::from_utf8(out).expect("utf-8 output")
}

// src/watch/session.rs

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::info;

use crate::engine::RuntimeEvent;
use crate::errors::Result;
use crate::server::{DevServer, ReloadNotifier, ServerState};
use crate::tasks::TaskContext;
use crate::types::ReloadEvent;
use crate::watch::patterns::build_bindings;
use crate::watch::watcher::{spawn_watcher, WatcherHandle};

/// Everything `watching` keeps alive: the dev server, the reload fan-out
/// and the filesystem watcher.
#[derive(Debug)]
pub struct WatchSession {
    server: DevServer,
    notifier: ReloadNotifier,
    watcher: WatcherHandle,
}

impl WatchSession {
    /// Bind the server, then start watching the app directory.
    ///
    /// Nothing is watched if the bind fails.
    pub async fn start(ctx: &TaskContext, runtime_tx: mpsc::Sender<RuntimeEvent>) -> Result<Self> {
        let notifier = ReloadNotifier::default();
        let app_dir = ctx.root.join(ctx.cfg.app_dir());

        let server = DevServer::start(
            ctx.cfg.server_addr(),
            ServerState {
                fs: Arc::clone(&ctx.fs),
                app_dir: app_dir.clone(),
                notifier: notifier.clone(),
            },
        )
        .await?;

        let bindings = build_bindings(&ctx.cfg)?;
        let watcher = spawn_watcher(&ctx.root, &app_dir, bindings, runtime_tx)?;

        info!(addr = %server.addr(), dir = ?watcher.dir(), "watch session active");
        Ok(Self {
            server,
            notifier,
            watcher,
        })
    }

    /// Push an event to connected browsers.
    pub fn notify(&self, event: ReloadEvent) -> usize {
        self.notifier.send(event)
    }
}

impl Drop for WatchSession {
    fn drop(&mut self) {
        info!(addr = %self.server.addr(), dir = ?self.watcher.dir(), "watch session closed");
    }
}

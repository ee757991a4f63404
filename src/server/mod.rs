// src/server/mod.rs

//! Development server with live reload.
//!
//! Serves the app directory over HTTP and pushes [`ReloadEvent`]s to every
//! connected browser through a websocket. Pages get a small client script
//! injected that reloads the page or swaps stylesheets.

pub mod client;
pub mod handlers;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::errors::{AssetdagError, Result};
use crate::fs::FileSystem;
use crate::types::ReloadEvent;

/// Websocket endpoint browsers subscribe to.
pub const LIVERELOAD_PATH: &str = "/__livereload";
/// Client script injected into served pages.
pub const CLIENT_SCRIPT_PATH: &str = "/__livereload.js";

/// Fan-out of reload events to connected browsers.
#[derive(Debug, Clone)]
pub struct ReloadNotifier {
    tx: broadcast::Sender<ReloadEvent>,
}

impl ReloadNotifier {
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ReloadEvent> {
        self.tx.subscribe()
    }

    /// Send to every subscriber; returns how many received it.
    pub fn send(&self, event: ReloadEvent) -> usize {
        match self.tx.send(event) {
            Ok(n) => n,
            Err(_) => {
                debug!("no browsers connected; reload event dropped");
                0
            }
        }
    }
}

impl Default for ReloadNotifier {
    fn default() -> Self {
        Self::new(64)
    }
}

/// Shared state of the request handlers.
#[derive(Debug)]
pub struct ServerState {
    pub fs: Arc<dyn FileSystem>,
    /// Absolute directory the server serves from.
    pub app_dir: PathBuf,
    pub notifier: ReloadNotifier,
}

/// A running dev server. Dropping it stops the server task.
#[derive(Debug)]
pub struct DevServer {
    addr: SocketAddr,
    handle: JoinHandle<()>,
}

impl DevServer {
    /// Bind `addr` and start serving in the background.
    ///
    /// Binding happens before this returns, so a port in use surfaces as
    /// [`AssetdagError::ServerBind`] here.
    pub async fn start(addr: SocketAddr, state: ServerState) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| AssetdagError::ServerBind { addr, source })?;
        let local_addr = listener.local_addr()?;

        let app = router(Arc::new(state));
        let handle = tokio::spawn(async move {
            if let Err(err) = axum::serve(listener, app).await {
                error!(error = %err, "dev server stopped");
            }
        });

        info!("dev server listening on http://{local_addr}");
        Ok(Self {
            addr: local_addr,
            handle,
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }
}

impl Drop for DevServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

pub fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route(LIVERELOAD_PATH, get(handlers::websocket))
        .route(CLIENT_SCRIPT_PATH, get(handlers::client_script))
        .fallback(get(handlers::serve_static))
        .with_state(state)
}

// src/server/handlers.rs

//! Request handlers of the dev server.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::http::{header, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use futures::{SinkExt, StreamExt};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use crate::fs::FileSystem;

use super::client::{inject_client, CLIENT_SCRIPT};
use super::ServerState;

/// A file ready to be sent to the browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServedFile {
    pub content_type: String,
    pub body: Vec<u8>,
}

/// Map a request path onto a file below `app_dir`.
///
/// Segments are percent-decoded first. `/` and directories map to their
/// `index.html`. A decoded segment that is `..` or still holds a path
/// separator is refused.
pub fn resolve(fs: &dyn FileSystem, app_dir: &Path, request_path: &str) -> Option<PathBuf> {
    let mut path = app_dir.to_path_buf();
    for raw in request_path.split('/') {
        let segment = urlencoding::decode(raw).ok()?;
        if segment == ".." || segment.contains(['/', '\\']) {
            return None;
        }
        if segment.is_empty() || segment == "." {
            continue;
        }
        path.push(segment.as_ref());
    }
    if fs.is_dir(&path) {
        path.push("index.html");
    }

    fs.is_file(&path).then_some(path)
}

/// Load a request path, injecting the live-reload client into HTML.
pub fn load(fs: &dyn FileSystem, app_dir: &Path, request_path: &str) -> Option<ServedFile> {
    let path = resolve(fs, app_dir, request_path)?;
    let body = match fs.read(&path) {
        Ok(body) => body,
        Err(err) => {
            warn!(path = ?path, error = %err, "failed to read served file");
            return None;
        }
    };

    let mime = mime_guess::from_path(&path).first_or_octet_stream();
    let body = if mime.essence_str() == "text/html" {
        inject_client(&String::from_utf8_lossy(&body)).into_bytes()
    } else {
        body
    };

    Some(ServedFile {
        content_type: mime.to_string(),
        body,
    })
}

pub async fn serve_static(State(state): State<Arc<ServerState>>, uri: Uri) -> Response {
    let path = uri.path().to_owned();
    let fs = Arc::clone(&state.fs);
    let app_dir = state.app_dir.clone();

    let loaded = tokio::task::spawn_blocking(move || load(fs.as_ref(), &app_dir, &path))
        .await
        .ok()
        .flatten();

    match loaded {
        Some(file) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, file.content_type)],
            file.body,
        )
            .into_response(),
        None => (StatusCode::NOT_FOUND, "Not found").into_response(),
    }
}

pub async fn client_script() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/javascript")],
        CLIENT_SCRIPT,
    )
}

pub async fn websocket(
    ws: WebSocketUpgrade,
    State(state): State<Arc<ServerState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| forward_reloads(socket, state))
}

/// Push every reload event to one browser until either side goes away.
async fn forward_reloads(socket: WebSocket, state: Arc<ServerState>) {
    let (mut sender, mut receiver) = socket.split();
    let mut events = state.notifier.subscribe();
    debug!("live-reload client connected");

    loop {
        tokio::select! {
            event = events.recv() => {
                let event = match event {
                    Ok(event) => event,
                    Err(RecvError::Lagged(skipped)) => {
                        debug!(skipped, "live-reload client lagged");
                        continue;
                    }
                    Err(RecvError::Closed) => break,
                };
                let text = match serde_json::to_string(&event) {
                    Ok(text) => text,
                    Err(err) => {
                        warn!(error = %err, "failed to encode reload event");
                        continue;
                    }
                };
                if sender.send(Message::Text(text.into())).await.is_err() {
                    break;
                }
            }
            incoming = receiver.next() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    Some(Ok(_)) => continue,
                }
            }
        }
    }

    debug!("live-reload client disconnected");
}

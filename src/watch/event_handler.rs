// src/watch/event_handler.rs

//! Turning filesystem events into runtime events.

use std::path::Path;

use notify::event::{EventKind, ModifyKind};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::engine::{RuntimeEvent, TriggerReason};
use crate::watch::patterns::{WatchAction, WatchBinding};

/// Whether an event kind counts as a change.
///
/// Access events and metadata-only modifications never trigger anything.
pub fn is_relevant(kind: &EventKind) -> bool {
    match kind {
        EventKind::Create(_) | EventKind::Remove(_) => true,
        EventKind::Modify(modify) => matches!(
            modify,
            ModifyKind::Data(_) | ModifyKind::Name(_) | ModifyKind::Any
        ),
        _ => false,
    }
}

/// `path` relative to `root` with forward slashes.
pub fn relative_str(root: &Path, path: &Path) -> Option<String> {
    path.strip_prefix(root)
        .ok()
        .map(|rel| rel.to_string_lossy().replace('\\', "/"))
}

/// Runtime events for one changed path: one per matching binding.
pub fn events_for_path(rel_path: &str, bindings: &[WatchBinding]) -> Vec<RuntimeEvent> {
    bindings
        .iter()
        .filter(|binding| binding.matches(rel_path))
        .map(|binding| {
            debug!(binding = binding.name(), path = %rel_path, "watch match");
            match binding.action() {
                WatchAction::Run(task) => RuntimeEvent::TaskTriggered {
                    task,
                    reason: TriggerReason::FileWatch,
                },
                WatchAction::Reload => RuntimeEvent::PageChanged {
                    path: rel_path.to_owned(),
                },
            }
        })
        .collect()
}

/// Forward one notify event to the runtime.
///
/// Returns `false` once the runtime channel is closed.
pub async fn process_event(
    root: &Path,
    event: notify::Event,
    bindings: &[WatchBinding],
    runtime_tx: &mpsc::Sender<RuntimeEvent>,
) -> bool {
    if !is_relevant(&event.kind) {
        return true;
    }

    for path in &event.paths {
        let Some(rel) = relative_str(root, path) else {
            warn!(?path, ?root, "changed path outside the project root");
            continue;
        };

        for runtime_event in events_for_path(&rel, bindings) {
            if let Err(err) = runtime_tx.send(runtime_event).await {
                warn!("failed to forward watch event to runtime: {err}");
                return false;
            }
        }
    }

    true
}

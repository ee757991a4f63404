// src/watch/mod.rs

//! File watching for the `watching` task.
//!
//! This module is responsible for:
//! - the watch table that maps changed paths to asset classes or reloads
//! - wiring up a cross-platform filesystem watcher (`notify`)
//! - [`session::WatchSession`], which owns the dev server and watcher
//!   while `watching` is up
//!
//! It does **not** know about the scheduler; it only turns filesystem
//! changes into runtime events.

pub mod event_handler;
pub mod patterns;
pub mod session;
pub mod watcher;

pub use patterns::{build_bindings, WatchAction, WatchBinding};
pub use session::WatchSession;
pub use watcher::{spawn_watcher, WatcherHandle};

// src/watch/watcher.rs

use std::path::PathBuf;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::engine::RuntimeEvent;
use crate::errors::{EyeError, Result};
use crate::watch::event::{ChangeEvent, ChangeKind};

/// Handle for the filesystem watcher.
///
/// This exists mainly so the underlying `RecommendedWatcher` is kept alive for
/// as long as needed. Dropping this handle will stop file watching.
pub struct WatcherHandle {
    _inner: RecommendedWatcher,
    paths: Vec<PathBuf>,
}

impl WatcherHandle {
    /// Paths that are being watched.
    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle")
            .field("paths", &self.paths)
            .finish()
    }
}

/// Spawn a filesystem watcher over `paths` and forward every content change
/// as [`RuntimeEvent::FileChanged`].
///
/// Every path must exist; a path that cannot be watched fails the whole call
/// with [`EyeError::WatchError`]. Directories are watched recursively.
/// Ignore filtering is left to the debouncer.
pub fn spawn_watcher(
    paths: &[PathBuf],
    runtime_tx: mpsc::Sender<RuntimeEvent>,
) -> Result<WatcherHandle> {
    if paths.is_empty() {
        return Err(EyeError::WatchError("no paths to watch".to_string()));
    }

    // Channel from the blocking notify callback into the async world.
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<Event>();

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if let Err(err) = event_tx.send(event) {
                    // We can't log via tracing here easily, so fallback to stderr.
                    eprintln!("eye: failed to forward notify event: {err}");
                }
            }
            Err(err) => {
                eprintln!("eye: file watch error: {err}");
            }
        },
        Config::default(),
    )?;

    let mut watched = Vec::with_capacity(paths.len());
    for path in paths {
        if !path.exists() {
            return Err(EyeError::WatchError(format!(
                "watch path does not exist: {}",
                path.display()
            )));
        }
        watcher.watch(path, RecursiveMode::Recursive).map_err(|err| {
            EyeError::WatchError(format!("cannot watch {}: {err}", path.display()))
        })?;
        watched.push(path.clone());
    }

    info!(paths = ?watched, "file watcher started");

    tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            debug!(?event, "received notify event");

            let Some(kind) = ChangeKind::from_notify(&event.kind) else {
                continue;
            };

            for path in event.paths {
                let change = ChangeEvent::new(kind, path);
                if runtime_tx
                    .send(RuntimeEvent::FileChanged(change))
                    .await
                    .is_err()
                {
                    // Runtime is gone; nothing left to notify.
                    warn!("runtime channel closed; stopping watcher loop");
                    return;
                }
            }
        }
        debug!("watcher event loop finished");
    });

    Ok(WatcherHandle {
        _inner: watcher,
        paths: watched,
    })
}

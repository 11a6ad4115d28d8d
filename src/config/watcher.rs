//! Settings file watcher for hot reload of hand edits.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use notify::{Watcher, RecursiveMode, Event, RecommendedWatcher, Config};
use crate::settings::SettingsWriter;

/// A watcher that applies external edits of the settings file.
pub struct SettingsWatcher {
    path: PathBuf,
    writer: Arc<SettingsWriter>,
}

impl SettingsWatcher {
    /// Create a new SettingsWatcher for the writer's file.
    pub fn new(writer: Arc<SettingsWriter>) -> Self {
        Self {
            path: writer.path().to_path_buf(),
            writer,
        }
    }

    /// Start watching the file in a background thread.
    ///
    /// The parent directory is watched, since editors often replace the file
    /// rather than modify it in place. Keep the returned watcher alive.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let writer = self.writer.clone();
        let path = self.path.clone();

        let mut watcher = RecommendedWatcher::new(move |res: notify::Result<Event>| {
            match res {
                Ok(event) => {
                    let relevant = (event.kind.is_modify() || event.kind.is_create())
                        && event.paths.iter().any(|p| p.file_name() == path.file_name());
                    if relevant {
                        tracing::debug!("Settings file change detected, reloading...");
                        if let Err(e) = writer.reload_from_disk() {
                            tracing::error!("Failed to reload settings: {}. Keeping current values.", e);
                        }
                    }
                }
                Err(e) => tracing::error!("Watch error: {:?}", e),
            }
        }, Config::default().with_poll_interval(Duration::from_secs(2)))?;

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        watcher.watch(&dir, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?self.path, "Settings watcher started");
        Ok(watcher)
    }
}

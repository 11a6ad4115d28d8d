//! Persisting and hot-applying settings.
//!
//! # Write path
//! ```text
//! ProposedConfig
//!     → snapshot store (before any mutation)
//!     → merge: secret carried forward, client token guarded against
//!       placeholders, plain keys taken as submitted
//!     → PersistedFile::render → temp file + fsync + rename
//!     → live apply (HotReload keys that were submitted)
//!     → restart check for RestartRequired keys against the snapshot
//! ```
//!
//! Every mutation, API write or external file edit, holds the writer's lock
//! for its whole duration, so concurrent writers are serialized and the file
//! always matches the last applied state.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Local;
use tokio::sync::broadcast;

use crate::observability::metrics;
use crate::settings::error::SettingsError;
use crate::settings::keys::{self, Mutability, SCHEMA};
use crate::settings::mask::is_masked_placeholder;
use crate::settings::persist::PersistedFile;
use crate::settings::proposal::ProposedConfig;
use crate::settings::store::EnvStore;

/// Where a live change came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeSource {
    /// A write through the settings API.
    Api,
    /// An edit of the persisted file made outside this service.
    File,
}

/// Settings that were just written to the live store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsChange {
    pub source: ChangeSource,
    pub applied: Vec<(&'static str, String)>,
}

impl SettingsChange {
    pub fn value(&self, key: &str) -> Option<&str> {
        self.applied
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Result of a successful [`SettingsWriter::apply_settings`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyOutcome {
    pub persisted: bool,
    /// At least one restart-only setting will change on the next start.
    pub restart_required: bool,
    /// Keys written to the live store, in schema order.
    pub applied: Vec<&'static str>,
    /// Restart-only keys whose persisted value differs from the running one.
    pub pending_restart: Vec<&'static str>,
}

#[derive(Debug, Default)]
struct WriterState {
    /// Exact content of the last file this writer produced or loaded.
    last_written: Option<String>,
}

/// Merges proposals into the persisted file and the live store.
#[derive(Debug)]
pub struct SettingsWriter {
    store: Arc<dyn EnvStore>,
    path: PathBuf,
    state: Mutex<WriterState>,
    changes: broadcast::Sender<SettingsChange>,
}

impl SettingsWriter {
    pub fn new(store: Arc<dyn EnvStore>, path: impl Into<PathBuf>) -> Self {
        let (changes, _) = broadcast::channel(16);
        Self {
            store,
            path: path.into(),
            state: Mutex::new(WriterState::default()),
            changes,
        }
    }

    /// Path of the persisted file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Subscribe to live changes from both API writes and file reloads.
    pub fn subscribe(&self) -> broadcast::Receiver<SettingsChange> {
        self.changes.subscribe()
    }

    fn lock(&self) -> MutexGuard<'_, WriterState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Persist `proposed` and apply its hot-reloadable subset.
    ///
    /// Fails with [`SettingsError::Persistence`] if the file cannot be
    /// written, in which case the live store is left untouched.
    pub fn apply_settings(&self, proposed: &ProposedConfig) -> Result<ApplyOutcome, SettingsError> {
        let mut state = self.lock();

        if !proposed.ignored().is_empty() {
            tracing::debug!(keys = ?proposed.ignored(), "Ignoring unrecognized settings");
        }

        let snapshot: HashMap<&'static str, Option<String>> = SCHEMA
            .iter()
            .map(|s| (s.key, self.store.get(s.key)))
            .collect();
        let existing = |key: &str| -> Option<String> {
            snapshot
                .get(key)
                .cloned()
                .flatten()
                .filter(|v| !v.is_empty())
        };

        let mut persisted: HashMap<&'static str, Option<String>> = HashMap::new();
        let mut live: Vec<(&'static str, String)> = Vec::new();
        let mut pending_restart = Vec::new();

        for setting in SCHEMA.iter() {
            let submitted = proposed.get(setting.key);

            if setting.is_secret() {
                if submitted.is_some() {
                    tracing::warn!(key = setting.key, "Ignoring submitted value for read-only setting");
                }
                persisted.insert(setting.key, existing(setting.key));
                continue;
            }

            if setting.is_protected_mutable() {
                match proposed.genuine_value(setting) {
                    Some(value) => {
                        persisted.insert(setting.key, Some(value.to_string()));
                        live.push((setting.key, value.to_string()));
                    }
                    None => {
                        persisted.insert(setting.key, existing(setting.key));
                    }
                }
                continue;
            }

            let value = submitted.unwrap_or_default();
            persisted.insert(setting.key, Some(value.to_string()));

            match setting.mutability {
                Mutability::RestartRequired => {
                    let current = snapshot.get(setting.key).cloned().flatten();
                    if setting.effective(Some(value)) != setting.effective(current.as_deref()) {
                        pending_restart.push(setting.key);
                    }
                }
                Mutability::HotReload if submitted.is_some() => {
                    live.push((setting.key, value.to_string()));
                }
                _ => {}
            }
        }

        let file = PersistedFile::render(&persisted, Local::now().naive_local());
        let contents = file.write_to(&self.path).map_err(|source| {
            tracing::error!(path = ?self.path, error = %source, "Failed to write settings file");
            SettingsError::Persistence {
                path: self.path.clone(),
                source,
            }
        })?;
        state.last_written = Some(contents);

        for (key, value) in &live {
            self.store.set(key, value);
            tracing::debug!(key = %key, "Applied setting to live environment");
        }
        if live.iter().any(|(k, _)| *k == keys::CLIENT_TOKEN) {
            tracing::info!("Client token updated, effective immediately");
        }

        let outcome = ApplyOutcome {
            persisted: true,
            restart_required: !pending_restart.is_empty(),
            applied: live.iter().map(|(k, _)| *k).collect(),
            pending_restart,
        };

        tracing::info!(
            path = ?self.path,
            applied = outcome.applied.len(),
            pending_restart = ?outcome.pending_restart,
            "Settings saved"
        );
        metrics::record_keys_applied(outcome.applied.len());
        metrics::record_restart_pending(outcome.restart_required);

        self.broadcast(ChangeSource::Api, live);
        Ok(outcome)
    }

    /// Re-read the persisted file after an external edit and apply its
    /// hot-reloadable values.
    ///
    /// Content identical to what this writer last wrote is skipped. The secret
    /// and restart-only settings are never applied, nor are placeholders for
    /// the client token. Values whose effective result matches the live one
    /// are left alone. Returns the keys that changed.
    pub fn reload_from_disk(&self) -> Result<Vec<&'static str>, SettingsError> {
        let mut state = self.lock();

        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(self.reload_error(dotenvy::Error::Io(e))),
        };
        if state.last_written.as_deref() == Some(contents.as_str()) {
            tracing::debug!(path = ?self.path, "Settings file unchanged since last write");
            return Ok(Vec::new());
        }

        let entries = dotenvy::from_read_iter(contents.as_bytes())
            .collect::<Result<Vec<(String, String)>, _>>()
            .map_err(|e| self.reload_error(e))?;

        let mut live = Vec::new();
        for (key, value) in entries {
            let Some(setting) = keys::setting(&key) else {
                continue;
            };
            let current = self.store.get(setting.key);

            match setting.mutability {
                Mutability::Immutable => continue,
                Mutability::RestartRequired => {
                    if setting.effective(Some(value.as_str())) != setting.effective(current.as_deref()) {
                        tracing::info!(key = setting.key, "Edited setting takes effect after restart");
                    }
                    continue;
                }
                Mutability::HotReload => {}
            }
            if setting.sensitive && (value.is_empty() || is_masked_placeholder(&value)) {
                continue;
            }
            if setting.effective(Some(value.as_str())) == setting.effective(current.as_deref()) {
                continue;
            }

            self.store.set(setting.key, &value);
            tracing::debug!(key = setting.key, "Applied edited setting to live environment");
            live.push((setting.key, value));
        }

        state.last_written = Some(contents);
        let applied: Vec<_> = live.iter().map(|(k, _)| *k).collect();
        if !applied.is_empty() {
            tracing::info!(path = ?self.path, applied = ?applied, "Reloaded settings file");
            metrics::record_keys_applied(applied.len());
        }

        self.broadcast(ChangeSource::File, live);
        Ok(applied)
    }

    fn reload_error(&self, source: dotenvy::Error) -> SettingsError {
        SettingsError::Reload {
            path: self.path.clone(),
            source,
        }
    }

    fn broadcast(&self, source: ChangeSource, applied: Vec<(&'static str, String)>) {
        if applied.is_empty() {
            return;
        }
        // No subscribers is fine.
        let _ = self.changes.send(SettingsChange { source, applied });
    }
}

//! Errors surfaced by the settings writer.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort a settings write or reload.
///
/// All variants are raised before any live value changes.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The submitted payload is not a flat mapping of string values.
    #[error("malformed settings request: {0}")]
    MalformedRequest(String),

    /// The persisted file could not be written.
    #[error("failed to write {}: {source}", path.display())]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The persisted file could not be read back after an external edit.
    #[error("failed to reload {}: {source}", path.display())]
    Reload {
        path: PathBuf,
        #[source]
        source: dotenvy::Error,
    },
}

impl SettingsError {
    /// True when the caller sent bad input, as opposed to a server-side failure.
    pub fn is_client_error(&self) -> bool {
        matches!(self, SettingsError::MalformedRequest(_))
    }

    /// Short machine-readable kind, used for metrics labels.
    pub fn kind(&self) -> &'static str {
        match self {
            SettingsError::MalformedRequest(_) => "malformed_request",
            SettingsError::Persistence { .. } => "persistence_failure",
            SettingsError::Reload { .. } => "reload_failure",
        }
    }
}

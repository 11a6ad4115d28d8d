//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber from the effective settings
//! - Re-apply `LOG_LEVEL` when it changes at runtime
//!
//! # Design Decisions
//! - `RUST_LOG`, when set, pins the filter and disables runtime level changes
//! - JSON or text output chosen from `LOG_FORMAT`; `LOG_CONSOLE=false` silences output
//! - Format and console output are read once at startup

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tracing_subscriber::{
    filter::{EnvFilter, ParseError},
    fmt,
    layer::SubscriberExt,
    reload,
    util::{SubscriberInitExt, TryInitError},
    Registry,
};

use crate::settings::keys::{LOG_CONSOLE, LOG_FORMAT, LOG_LEVEL};
use crate::settings::{EffectiveConfig, SettingsChange};

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("invalid log level {level:?}: {source}")]
    InvalidLevel {
        level: String,
        #[source]
        source: ParseError,
    },

    #[error("failed to reload log filter: {0}")]
    Reload(#[from] reload::Error),

    #[error("failed to install subscriber: {0}")]
    Init(#[from] TryInitError),
}

/// Logging options derived from settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogOptions {
    pub level: String,
    pub json: bool,
    pub console: bool,
}

impl LogOptions {
    pub fn from_config(config: &EffectiveConfig) -> Self {
        Self {
            level: config.get(LOG_LEVEL).unwrap_or("info").to_string(),
            json: config
                .get(LOG_FORMAT)
                .is_some_and(|f| f.eq_ignore_ascii_case("json")),
            console: config.get(LOG_CONSOLE).map_or(true, parse_flag),
        }
    }
}

fn parse_flag(value: &str) -> bool {
    !matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "false" | "0" | "no" | "off"
    )
}

/// Build a filter from a `LOG_LEVEL` value.
pub fn level_filter(level: &str) -> Result<EnvFilter, LoggingError> {
    let directive = match level.trim().to_ascii_lowercase().as_str() {
        "warning" => "warn".to_string(),
        "fatal" | "panic" => "error".to_string(),
        other => other.to_string(),
    };
    EnvFilter::try_new(&directive).map_err(|source| LoggingError::InvalidLevel {
        level: level.to_string(),
        source,
    })
}

/// Handle for changing the active log filter after startup.
#[derive(Debug)]
pub struct LogControl {
    handle: reload::Handle<EnvFilter, Registry>,
    /// Filter came from `RUST_LOG`; runtime level changes are ignored.
    pinned: bool,
}

impl LogControl {
    /// Replace the active filter with one for `level`.
    pub fn set_level(&self, level: &str) -> Result<(), LoggingError> {
        if self.pinned {
            tracing::debug!(level, "RUST_LOG is set, ignoring LOG_LEVEL change");
            return Ok(());
        }
        self.handle.reload(level_filter(level)?)?;
        Ok(())
    }

    /// Follow `LOG_LEVEL` changes broadcast by the settings writer.
    pub fn follow_changes(
        self: Arc<Self>,
        mut changes: broadcast::Receiver<SettingsChange>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                match changes.recv().await {
                    Ok(change) => {
                        let Some(level) = change.value(LOG_LEVEL) else {
                            continue;
                        };
                        match self.set_level(level) {
                            Ok(()) => tracing::info!(level, "Log level updated"),
                            Err(e) => tracing::warn!(error = %e, "Keeping previous log level"),
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Missed settings changes");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }
}

/// Install the global subscriber.
pub fn init_logging(options: &LogOptions) -> Result<LogControl, LoggingError> {
    let (filter, pinned) = match EnvFilter::try_from_default_env() {
        Ok(filter) => (filter, true),
        Err(_) => (level_filter(&options.level)?, false),
    };
    let (filter, handle) = reload::Layer::new(filter);

    let json = (options.console && options.json).then(|| fmt::layer().json());
    let text = (options.console && !options.json).then(|| fmt::layer());

    tracing_subscriber::registry()
        .with(filter)
        .with(json)
        .with(text)
        .try_init()?;

    Ok(LogControl { handle, pinned })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{MemoryStore, SettingsReader};

    fn options(entries: &[(&str, &str)]) -> LogOptions {
        let store = MemoryStore::with_entries(entries.iter().copied());
        LogOptions::from_config(&SettingsReader::new(Arc::new(store)).effective_config())
    }

    #[test]
    fn test_options_from_defaults() {
        let opts = options(&[]);
        assert_eq!(opts.level, "info");
        assert!(opts.json);
        assert!(opts.console);
    }

    #[test]
    fn test_options_from_settings() {
        let opts = options(&[(LOG_LEVEL, "debug"), (LOG_FORMAT, "text"), (LOG_CONSOLE, "FALSE")]);
        assert_eq!(opts.level, "debug");
        assert!(!opts.json);
        assert!(!opts.console);
    }

    #[test]
    fn test_level_filter_aliases() {
        assert_eq!(level_filter("warning").unwrap().to_string(), "warn");
        assert_eq!(level_filter("FATAL").unwrap().to_string(), "error");
        assert!(level_filter("info").is_ok());
        assert!(level_filter("app=verbose").is_err());
    }

    #[test]
    fn test_set_level_reloads_filter() {
        let (layer, handle) = reload::Layer::<_, Registry>::new(EnvFilter::new("info"));
        let _subscriber = tracing_subscriber::registry().with(layer);
        let control = LogControl {
            handle: handle.clone(),
            pinned: false,
        };

        control.set_level("debug").unwrap();
        assert_eq!(handle.with_current(|f| f.to_string()).unwrap(), "debug");
        assert!(control.set_level("app=verbose").is_err());
        assert_eq!(handle.with_current(|f| f.to_string()).unwrap(), "debug");
    }

    #[test]
    fn test_pinned_filter_ignores_changes() {
        let (layer, handle) = reload::Layer::<_, Registry>::new(EnvFilter::new("warn"));
        let _subscriber = tracing_subscriber::registry().with(layer);
        let control = LogControl {
            handle: handle.clone(),
            pinned: true,
        };

        control.set_level("trace").unwrap();
        assert_eq!(handle.with_current(|f| f.to_string()).unwrap(), "warn");
    }
}

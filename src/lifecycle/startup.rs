//! Startup orchestration.
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - The env file seeds the process environment before logging starts,
//!   so LOG_LEVEL from the file takes effect
//! - The listener binds last

use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::config::loader::{load_config, load_env_file};
use crate::config::validation::listen_address;
use crate::config::watcher::SettingsWatcher;
use crate::config::ServiceConfig;
use crate::http::HttpServer;
use crate::lifecycle::{signals, Shutdown};
use crate::observability::{init_logging, metrics, LogOptions};
use crate::settings::keys::{PORT, RUNTIME_MODE};
use crate::settings::{EnvStore, ProcessEnv, SettingsReader, SettingsWriter};

/// Command-line overrides for startup.
#[derive(Debug, Clone, Default)]
pub struct StartupOptions {
    /// Optional TOML service configuration.
    pub config_path: Option<PathBuf>,
    /// Overrides `settings.env_file` from the service configuration.
    pub env_file: Option<PathBuf>,
}

/// Start the service and block until shutdown.
pub async fn run(options: StartupOptions) -> Result<(), Box<dyn std::error::Error>> {
    let config = match &options.config_path {
        Some(path) => load_config(path)?,
        None => ServiceConfig::default(),
    };
    let env_file = options
        .env_file
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.settings.env_file));

    let store: Arc<dyn EnvStore> = Arc::new(ProcessEnv);
    let seeded = load_env_file(&env_file, store.as_ref())?;

    let reader = Arc::new(SettingsReader::new(store.clone()));
    let effective = reader.effective_config();
    let log_control = Arc::new(init_logging(&LogOptions::from_config(&effective))?);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        env_file = %env_file.display(),
        seeded,
        "settings-service starting"
    );

    let writer = Arc::new(SettingsWriter::new(store, env_file));
    log_control.follow_changes(writer.subscribe());

    // Dropping the watcher stops it; hold it for the life of the server.
    let _watcher = if config.settings.watch {
        match SettingsWatcher::new(writer.clone()).run() {
            Ok(watcher) => Some(watcher),
            Err(e) => {
                tracing::warn!(error = %e, "Settings watcher unavailable, hand edits need a restart");
                None
            }
        }
    } else {
        None
    };

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let mode = effective.get(RUNTIME_MODE).unwrap_or_default();
    let port = effective.get(PORT).unwrap_or_default();
    let addr = listen_address(&config, port)?;
    tracing::info!(
        runtime_mode = mode,
        request_timeout_secs = config.timeouts.request_secs,
        require_auth = config.admin.require_auth,
        "Configuration loaded"
    );

    let listener = TcpListener::bind(addr).await?;

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    signals::spawn_signal_handler(shutdown);

    HttpServer::new(&config, reader, writer)
        .run(listener, server_shutdown)
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

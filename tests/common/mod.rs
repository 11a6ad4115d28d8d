//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use settings_service::config::ServiceConfig;
use settings_service::http::HttpServer;
use settings_service::lifecycle::Shutdown;
use settings_service::settings::{MemoryStore, SettingsReader, SettingsWriter};
use tempfile::TempDir;
use tokio::net::TcpListener;

pub const TOKEN: &str = "client-token-abcdef";

/// A running service backed by an in-memory environment and a temp env file.
pub struct TestService {
    pub addr: SocketAddr,
    pub store: Arc<MemoryStore>,
    pub writer: Arc<SettingsWriter>,
    pub shutdown: Shutdown,
    dir: TempDir,
}

#[allow(dead_code)]
impl TestService {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn env_path(&self) -> PathBuf {
        self.dir.path().join(".env")
    }

    pub fn env_contents(&self) -> String {
        std::fs::read_to_string(self.env_path()).unwrap()
    }

    /// The persisted line for `key`, if any.
    pub fn env_line(&self, key: &str) -> Option<String> {
        let prefix = format!("{}=", key);
        self.env_contents()
            .lines()
            .find(|line| line.starts_with(&prefix))
            .map(str::to_string)
    }
}

/// Start a service on an ephemeral port with the given initial environment.
pub async fn start_service(entries: &[(&str, &str)]) -> TestService {
    start_service_with(ServiceConfig::default(), entries).await
}

pub async fn start_service_with(config: ServiceConfig, entries: &[(&str, &str)]) -> TestService {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(MemoryStore::with_entries(entries.iter().copied()));
    let reader = Arc::new(SettingsReader::new(store.clone()));
    let writer = Arc::new(SettingsWriter::new(store.clone(), dir.path().join(".env")));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server = HttpServer::new(&config, reader, writer.clone());
    let rx = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, rx).await;
    });

    TestService { addr, store, writer, shutdown, dir }
}

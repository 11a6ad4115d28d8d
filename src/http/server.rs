//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with the settings and health handlers
//! - Wire up middleware (request ID, tracing, body limit, timeout)
//! - Serve on a bound listener until shutdown is signalled

use axum::{
    body::Body,
    http::{Request, StatusCode},
    routing::get,
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::admin::{self, handlers::get_status};
use crate::config::{AdminConfig, ServiceConfig, SettingsFileConfig};
use crate::settings::{SettingsReader, SettingsWriter};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub reader: Arc<SettingsReader>,
    pub writer: Arc<SettingsWriter>,
    pub settings: SettingsFileConfig,
    pub admin: AdminConfig,
}

/// HTTP server for the settings API.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    pub fn new(
        config: &ServiceConfig,
        reader: Arc<SettingsReader>,
        writer: Arc<SettingsWriter>,
    ) -> Self {
        let state = AppState {
            reader,
            writer,
            settings: config.settings.clone(),
            admin: config.admin.clone(),
        };

        let router = Self::build_router(config, state);
        Self { router }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &ServiceConfig, state: AppState) -> Router {
        Router::new()
            .route("/health", get(get_status))
            .merge(admin::setup_settings_router(state))
            .layer(request_timeout(Duration::from_secs(config.timeouts.request_secs)))
            .layer(RequestBodyLimitLayer::new(config.security.max_body_size))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("unknown");
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    path = %request.uri().path(),
                    request_id = %request_id,
                )
            }))
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// The fully layered router, for driving the server without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Requests running longer than `timeout` get `408 Request Timeout`.
fn request_timeout(timeout: Duration) -> TimeoutLayer {
    TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, timeout)
}

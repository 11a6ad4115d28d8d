use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use std::collections::HashMap;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::settings::{ApplyOutcome, EffectiveConfig, ProposedConfig, SettingsError};

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
}

/// Response to a settings write.
#[derive(Debug, Serialize)]
pub struct SaveResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub restart_required: bool,
    /// RFC 3339 time the response was produced.
    pub timestamp: String,
}

impl SaveResponse {
    fn saved(outcome: &ApplyOutcome) -> Self {
        let message = if outcome.restart_required {
            format!(
                "Settings saved; restart required for {}",
                outcome.pending_restart.join(", ")
            )
        } else {
            "Settings saved".to_string()
        };
        Self {
            success: true,
            message: Some(message),
            error: None,
            restart_required: outcome.restart_required,
            timestamp: now(),
        }
    }

    fn failed(error: String) -> Self {
        Self {
            success: false,
            message: None,
            error: Some(error),
            restart_required: false,
            timestamp: now(),
        }
    }
}

fn now() -> String {
    chrono::Local::now().to_rfc3339()
}

fn failure(err: SettingsError) -> (StatusCode, Json<SaveResponse>) {
    metrics::record_settings_write(err.kind());
    let status = if err.is_client_error() {
        tracing::warn!(error = %err, "Rejected settings request");
        StatusCode::BAD_REQUEST
    } else {
        tracing::error!(error = %err, "Failed to save settings");
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (status, Json(SaveResponse::failed(err.to_string())))
}

pub async fn get_status() -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
    })
}

/// `GET /api/settings`: effective value of every recognized setting.
pub async fn get_settings(State(state): State<AppState>) -> Json<EffectiveConfig> {
    metrics::record_settings_read();
    let config = state.reader.effective_config();
    if state.settings.mask_sensitive {
        Json(config.masked())
    } else {
        Json(config)
    }
}

/// `POST /api/settings`: persist a new configuration and hot-apply what can be.
pub async fn save_settings(
    State(state): State<AppState>,
    payload: Result<Json<HashMap<String, String>>, JsonRejection>,
) -> (StatusCode, Json<SaveResponse>) {
    let map = match payload {
        Ok(Json(map)) => map,
        Err(rejection) => return failure(SettingsError::MalformedRequest(rejection.body_text())),
    };
    tracing::info!(settings_count = map.len(), "Received settings save request");

    let proposed = match ProposedConfig::from_map(map) {
        Ok(proposed) => proposed,
        Err(e) => return failure(e),
    };

    let writer = state.writer.clone();
    match tokio::task::spawn_blocking(move || writer.apply_settings(&proposed)).await {
        Ok(Ok(outcome)) => {
            metrics::record_settings_write("success");
            (StatusCode::OK, Json(SaveResponse::saved(&outcome)))
        }
        Ok(Err(e)) => failure(e),
        Err(e) => {
            tracing::error!(error = %e, "Settings write task failed");
            metrics::record_settings_write("internal_error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(SaveResponse::failed("settings write task failed".to_string())),
            )
        }
    }
}

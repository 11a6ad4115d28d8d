//! Service configuration schema.
//!
//! This is the configuration of the service itself (where to listen, where
//! the settings file lives), as opposed to the managed settings in
//! `crate::settings`. All types derive Serde traits for deserialization from
//! an optional TOML file.

use serde::{Deserialize, Serialize};

/// Root configuration for the settings service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServiceConfig {
    /// Listener configuration. The port comes from the `PORT` setting.
    pub listener: ListenerConfig,

    /// Managed settings file and how it is exposed.
    pub settings: SettingsFileConfig,

    /// Settings API access control.
    pub admin: AdminConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    #[serde(default)]
    pub security: SecurityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Interface to bind (e.g., "0.0.0.0").
    pub host: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
        }
    }
}

/// Persisted settings file configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SettingsFileConfig {
    /// Path of the `.env` file read at startup and rewritten on save.
    pub env_file: String,

    /// Mask sensitive values in `GET /api/settings`.
    pub mask_sensitive: bool,

    /// Apply hand edits of the env file without restart.
    pub watch: bool,
}

impl Default for SettingsFileConfig {
    fn default() -> Self {
        Self {
            env_file: ".env".to_string(),
            mask_sensitive: true,
            watch: true,
        }
    }
}

/// Settings API access control.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Require `Authorization: Bearer <KIRO_CLIENT_TOKEN>` on the settings API.
    pub require_auth: bool,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self { require_auth: true }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Security hardening configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Maximum request body size in bytes.
    pub max_body_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_body_size: 64 * 1024, // 64KB
        }
    }
}

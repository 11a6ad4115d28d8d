//! Service configuration subsystem.
//!
//! # Data Flow
//! ```text
//! service.toml (optional)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ServiceConfig (validated, immutable)
//!
//! .env settings file
//!     → loader.rs load_env_file (seed the environment store at startup)
//!
//! On external edit:
//!     watcher.rs detects change
//!     → SettingsWriter::reload_from_disk
//!     → hot-reloadable settings applied live
//! ```
//!
//! # Design Decisions
//! - ServiceConfig is immutable once loaded; changes require restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use schema::ServiceConfig;
pub use schema::ListenerConfig;
pub use schema::SettingsFileConfig;
pub use schema::AdminConfig;

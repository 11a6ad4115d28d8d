//! Live settings reconciliation.
//!
//! # Data Flow
//! ```text
//! GET:   store → reader.rs (store value or schema default) → EffectiveConfig
//!
//! POST:  JSON map → proposal.rs (recognized keys, keep-existing marker)
//!        → writer.rs (merge, persist.rs render + write, live apply)
//!        → ApplyOutcome { restart_required, ... }
//!
//! Edit:  file watcher → writer.rs reload_from_disk → live apply
//! ```
//!
//! # Design Decisions
//! - The environment is reached only through the `EnvStore` trait
//! - The schema in keys.rs is the single source of defaults and mutability
//! - The persisted file is regenerated wholesale, never patched

pub mod error;
pub mod keys;
pub mod mask;
pub mod persist;
pub mod proposal;
pub mod reader;
pub mod store;
pub mod writer;

pub use error::SettingsError;
pub use keys::{resolve_default, Category, Mutability, Setting, SCHEMA};
pub use proposal::{ProposedConfig, KEEP_EXISTING_FIELD};
pub use reader::{EffectiveConfig, SettingsReader};
pub use store::{EnvStore, MemoryStore, ProcessEnv};
pub use writer::{ApplyOutcome, ChangeSource, SettingsChange, SettingsWriter};

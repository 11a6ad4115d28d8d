//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use crate::config::schema::ServiceConfig;
use crate::config::validation::{validate_config, ValidationError};
use crate::settings::keys;
use crate::settings::EnvStore;

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    EnvFile(dotenvy::Error),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::EnvFile(e) => write!(f, "Env file error: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<ServiceConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let config: ServiceConfig = toml::from_str(&content).map_err(ConfigError::Parse)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Seed the store from a persisted env file at startup.
///
/// Variables already present in the store win, so the real environment can
/// override the file. A missing file is not an error. Returns the number of
/// recognized settings loaded.
pub fn load_env_file(path: &Path, store: &dyn EnvStore) -> Result<usize, ConfigError> {
    if !path.exists() {
        tracing::info!(path = ?path, "No settings file found, using environment and defaults");
        return Ok(0);
    }

    let mut loaded = 0;
    for item in dotenvy::from_path_iter(path).map_err(ConfigError::EnvFile)? {
        let (key, value) = item.map_err(ConfigError::EnvFile)?;
        if store.get(&key).is_some() {
            continue;
        }
        if keys::setting(&key).is_none() {
            tracing::debug!(key = %key, "Loading unrecognized variable from settings file");
        } else {
            loaded += 1;
        }
        store.set(&key, &value);
    }

    tracing::info!(path = ?path, loaded, "Loaded settings file");
    Ok(loaded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::MemoryStore;

    #[test]
    fn test_load_config_rejects_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("service.toml");
        fs::write(&path, "[timeouts]\nrequest_secs = 0\n").unwrap();

        match load_config(&path) {
            Err(ConfigError::Validation(errors)) => {
                assert_eq!(errors, vec![ValidationError::ZeroTimeout]);
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_load_config_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("service.toml");
        fs::write(&path, "[listener\nhost = 1").unwrap();
        assert!(matches!(load_config(&path), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_env_file_does_not_override_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        fs::write(
            &path,
            "# kiro2api configuration file\n\nPORT=9000\nLOG_LEVEL=debug\nEXTRA=1\n",
        )
        .unwrap();

        let store = MemoryStore::with_entries([("PORT", "7000")]);
        let loaded = load_env_file(&path, &store).unwrap();

        assert_eq!(loaded, 1);
        assert_eq!(store.get("PORT").as_deref(), Some("7000"));
        assert_eq!(store.get("LOG_LEVEL").as_deref(), Some("debug"));
        assert_eq!(store.get("EXTRA").as_deref(), Some("1"));
    }

    #[test]
    fn test_saved_values_survive_restart() {
        use crate::settings::keys::{CLIENT_TOKEN, HEADER_STRATEGY};
        use crate::settings::{ProposedConfig, SettingsWriter};
        use std::sync::Arc;

        let values = [
            "abc$def",
            "p #c",
            "a b",
            r"ab\cd",
            "x 'q'",
            r#"mixed "$HOME" it's \ ok"#,
        ];
        for value in values {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join(".env");
            let writer = SettingsWriter::new(Arc::new(MemoryStore::new()), path.clone());
            writer
                .apply_settings(
                    &ProposedConfig::new()
                        .with(CLIENT_TOKEN, value)
                        .with(HEADER_STRATEGY, value),
                )
                .unwrap();

            let restarted = MemoryStore::new();
            load_env_file(&path, &restarted).unwrap();
            assert_eq!(restarted.get(CLIENT_TOKEN).as_deref(), Some(value));
            assert_eq!(restarted.get(HEADER_STRATEGY).as_deref(), Some(value));
        }
    }

    #[test]
    fn test_missing_env_file_is_fine() {
        let dir = tempfile::tempdir().unwrap();
        let store = MemoryStore::new();
        assert_eq!(load_env_file(&dir.path().join(".env"), &store).unwrap(), 0);
        assert!(store.is_empty());
    }
}

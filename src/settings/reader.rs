//! Effective configuration lookup.

use serde::ser::{Serialize, SerializeMap, Serializer};
use std::sync::Arc;

use crate::settings::keys::{self, Setting, SCHEMA};
use crate::settings::mask::mask_token;
use crate::settings::store::EnvStore;

/// Every schema key with the value the process is currently using, in schema order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveConfig {
    entries: Vec<(&'static str, String)>,
}

impl EffectiveConfig {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.entries.iter().map(|(k, v)| (*k, v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Copy with every sensitive value passed through [`mask_token`].
    pub fn masked(&self) -> Self {
        let entries = SCHEMA
            .iter()
            .zip(&self.entries)
            .map(|(setting, (key, value))| {
                let shown = if setting.sensitive {
                    mask_token(value)
                } else {
                    value.clone()
                };
                (*key, shown)
            })
            .collect();
        Self { entries }
    }
}

impl Serialize for EffectiveConfig {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Reads the effective configuration from a store.
#[derive(Debug, Clone)]
pub struct SettingsReader {
    store: Arc<dyn EnvStore>,
}

impl SettingsReader {
    pub fn new(store: Arc<dyn EnvStore>) -> Self {
        Self { store }
    }

    /// Effective value for every schema key.
    ///
    /// Stored non-empty values win; otherwise the documented default is used.
    /// The secret has an empty default, so it is reported exactly as stored.
    /// Values are returned raw; masking is up to the caller.
    pub fn effective_config(&self) -> EffectiveConfig {
        let entries = SCHEMA
            .iter()
            .map(|setting| (setting.key, self.effective_value(setting)))
            .collect();
        EffectiveConfig { entries }
    }

    /// Effective value of a recognized key; `None` for unknown keys.
    pub fn get(&self, key: &str) -> Option<String> {
        keys::setting(key).map(|setting| self.effective_value(setting))
    }

    /// Effective value of one setting.
    pub fn effective_value(&self, setting: &Setting) -> String {
        let raw = self.store.get(setting.key);
        setting.effective(raw.as_deref()).to_string()
    }
}

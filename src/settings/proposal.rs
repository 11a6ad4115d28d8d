//! Caller-submitted settings.

use std::collections::{HashMap, HashSet};

use crate::settings::error::SettingsError;
use crate::settings::keys::{self, Setting};
use crate::settings::mask::is_masked_placeholder;

/// Reserved field listing sensitive keys the caller left untouched,
/// comma-separated. Wins over whatever value accompanies those keys.
pub const KEEP_EXISTING_FIELD: &str = "_keep_existing";

/// A proposed configuration, restricted to recognized keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProposedConfig {
    values: HashMap<&'static str, String>,
    keep_existing: HashSet<&'static str>,
    ignored: Vec<String>,
}

impl ProposedConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a flat key/value mapping as submitted over the API.
    ///
    /// Unknown keys are dropped and remembered in [`ignored`](Self::ignored).
    /// Values that would break the line-oriented file are rejected.
    pub fn from_map(map: HashMap<String, String>) -> Result<Self, SettingsError> {
        let mut proposed = Self::new();

        for (key, value) in map {
            if key == KEEP_EXISTING_FIELD {
                proposed.keep_existing.extend(
                    value
                        .split(',')
                        .filter_map(|k| keys::setting(k.trim()))
                        .filter(|s| s.sensitive)
                        .map(|s| s.key),
                );
                continue;
            }

            let Some(setting) = keys::setting(&key) else {
                proposed.ignored.push(key);
                continue;
            };

            if value.contains(&['\r', '\n'][..]) {
                return Err(SettingsError::MalformedRequest(format!(
                    "value for {} contains a line break",
                    setting.key
                )));
            }
            proposed.values.insert(setting.key, value);
        }

        proposed.ignored.sort();
        Ok(proposed)
    }

    /// Builder-style setter for a recognized key; unknown keys are ignored.
    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        match keys::setting(key) {
            Some(setting) => {
                self.values.insert(setting.key, value.into());
            }
            None => self.ignored.push(key.to_string()),
        }
        self
    }

    /// Mark a sensitive key as unchanged regardless of its submitted value.
    pub fn keep_existing(mut self, key: &str) -> Self {
        if let Some(setting) = keys::setting(key).filter(|s| s.sensitive) {
            self.keep_existing.insert(setting.key);
        }
        self
    }

    /// Submitted value for a key, if any.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// A submitted value for a sensitive key that should replace the stored one.
    ///
    /// `None` when nothing was submitted, the value is empty, it looks like a
    /// masked placeholder, or the key is listed under [`KEEP_EXISTING_FIELD`].
    pub fn genuine_value(&self, setting: &Setting) -> Option<&str> {
        if self.keep_existing.contains(setting.key) {
            return None;
        }
        self.get(setting.key)
            .filter(|v| !v.is_empty() && !is_masked_placeholder(v))
    }

    /// Unrecognized keys that were dropped, sorted.
    pub fn ignored(&self) -> &[String] {
        &self.ignored
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

//! Key/value stores backing the live configuration.
//!
//! The reader and writer never touch `std::env` directly; they go through
//! [`EnvStore`] so tests and embedders can supply their own state.

use dashmap::DashMap;
use std::fmt;

/// A process-wide key/value store of string settings.
pub trait EnvStore: Send + Sync + fmt::Debug {
    /// Current raw value, if set.
    fn get(&self, key: &str) -> Option<String>;

    /// Replace the value for `key`. Cannot fail.
    fn set(&self, key: &str, value: &str);
}

/// The real process environment.
///
/// Mutation is only safe while no other thread reads the environment through
/// libc; all writes in this crate go through the writer's mutex.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessEnv;

impl EnvStore for ProcessEnv {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }

    fn set(&self, key: &str, value: &str) {
        std::env::set_var(key, value);
    }
}

/// In-memory store, used in tests and when embedding the service.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: DashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store pre-populated with the given entries.
    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let store = Self::new();
        for (k, v) in entries {
            store.inner.insert(k.into(), v.into());
        }
        store
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl EnvStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.inner.get(key).map(|r| r.value().clone())
    }

    fn set(&self, key: &str, value: &str) {
        self.inner.insert(key.to_string(), value.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_operations() {
        let store = MemoryStore::with_entries([("PORT", "9000")]);
        assert_eq!(store.get("PORT").as_deref(), Some("9000"));
        assert!(store.get("LOG_LEVEL").is_none());

        store.set("LOG_LEVEL", "debug");
        assert_eq!(store.get("LOG_LEVEL").as_deref(), Some("debug"));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_process_env_roundtrip() {
        // Key unique to this test to avoid racing other tests on the real environment.
        let key = "SETTINGS_SERVICE_STORE_TEST_KEY";
        let env = ProcessEnv;
        assert!(env.get(key).is_none());
        env.set(key, "value");
        assert_eq!(env.get(key).as_deref(), Some("value"));
    }
}

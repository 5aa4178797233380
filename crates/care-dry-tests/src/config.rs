// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! In-memory config store fake for testing without filesystem I/O.

use care_app_core::config::{ConfigError, ConfigStore};
use serde::Serialize;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// In-memory implementation of [`ConfigStore`] for testing.
///
/// Clones share state, so a test can keep one handle while a
/// `ConfigService` owns another. Loads and saves are counted, and either
/// can be made to fail.
///
/// # Example
///
/// ```
/// use care_dry_tests::InMemoryConfigStore;
/// use care_app_core::config::ConfigService;
///
/// let store = InMemoryConfigStore::new().with_json("estimator", &serde_json::json!({ "window": 6 }));
/// let service = ConfigService::new(store.clone());
///
/// let raw: Option<serde_json::Value> = service.load("estimator").unwrap();
/// assert_eq!(raw.unwrap()["window"], 6);
/// assert_eq!(store.load_count(), 1);
/// ```
#[derive(Clone, Default)]
pub struct InMemoryConfigStore {
    inner: Rc<RefCell<Inner>>,
}

#[derive(Default)]
struct Inner {
    data: HashMap<String, Vec<u8>>,
    load_count: usize,
    save_count: usize,
    fail_on_load: bool,
    fail_on_save: bool,
}

impl InMemoryConfigStore {
    /// Create a new empty in-memory config store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed `key` with the JSON encoding of `value`. Seeding is not counted
    /// as a save.
    ///
    /// Values that fail to encode are stored as an empty blob, which the
    /// service reads back as missing.
    pub fn with_json<T: Serialize + ?Sized>(self, key: &str, value: &T) -> Self {
        let bytes = serde_json::to_vec(value).unwrap_or_default();
        self.inner.borrow_mut().data.insert(key.to_owned(), bytes);
        self
    }

    /// Seed `key` with raw bytes (e.g. malformed JSON).
    pub fn with_raw(self, key: &str, bytes: &[u8]) -> Self {
        self.inner
            .borrow_mut()
            .data
            .insert(key.to_owned(), bytes.to_vec());
        self
    }

    /// Configure the store to fail on load operations.
    pub fn set_fail_on_load(&self, fail: bool) {
        self.inner.borrow_mut().fail_on_load = fail;
    }

    /// Configure the store to fail on save operations.
    pub fn set_fail_on_save(&self, fail: bool) {
        self.inner.borrow_mut().fail_on_save = fail;
    }

    /// Number of `load_raw` attempts, failed ones included.
    pub fn load_count(&self) -> usize {
        self.inner.borrow().load_count
    }

    /// Number of `save_raw` attempts, failed ones included.
    pub fn save_count(&self) -> usize {
        self.inner.borrow().save_count
    }

    /// Check if a key exists in the store.
    pub fn contains_key(&self, key: &str) -> bool {
        self.inner.borrow().data.contains_key(key)
    }
}

impl ConfigStore for InMemoryConfigStore {
    fn load_raw(&self, key: &str) -> Result<Vec<u8>, ConfigError> {
        let mut inner = self.inner.borrow_mut();
        inner.load_count += 1;

        if inner.fail_on_load {
            return Err(ConfigError::Other("simulated load failure".into()));
        }

        inner.data.get(key).cloned().ok_or(ConfigError::NotFound)
    }

    fn save_raw(&self, key: &str, data: &[u8]) -> Result<(), ConfigError> {
        let mut inner = self.inner.borrow_mut();
        inner.save_count += 1;

        if inner.fail_on_save {
            return Err(ConfigError::Other("simulated save failure".into()));
        }

        inner.data.insert(key.to_string(), data.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeding_is_not_counted() {
        let store = InMemoryConfigStore::new().with_json("k", &[1, 2, 3]);
        assert!(store.contains_key("k"));
        assert_eq!(store.save_count(), 0);
        assert_eq!(store.load_raw("k").unwrap(), b"[1,2,3]");
        assert_eq!(store.load_count(), 1);
    }

    #[test]
    fn missing_key_returns_not_found() {
        let store = InMemoryConfigStore::new();
        assert!(matches!(store.load_raw("missing"), Err(ConfigError::NotFound)));
    }

    #[test]
    fn failures_are_injected_and_counted() {
        let store = InMemoryConfigStore::new();
        store.set_fail_on_save(true);
        assert!(matches!(
            store.save_raw("k", b"v"),
            Err(ConfigError::Other(_))
        ));
        assert!(!store.contains_key("k"));
        store.set_fail_on_load(true);
        assert!(store.load_raw("k").is_err());
        assert_eq!(store.save_count(), 1);
        assert_eq!(store.load_count(), 1);
    }

    #[test]
    fn clone_shares_state() {
        let a = InMemoryConfigStore::new();
        let b = a.clone();
        a.save_raw("shared", b"x").unwrap();
        assert_eq!(b.load_raw("shared").unwrap(), b"x");
        assert_eq!(b.save_count(), 1);
    }
}

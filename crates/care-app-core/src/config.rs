// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Configuration port for the interaction core.
//!
//! Estimator tuning, the feedback rule table and per-object feedback settings
//! each live under one key (`estimator`, `feedback_rules`,
//! `feedback_objects`). A [`ConfigStore`] only moves bytes; [`ConfigService`]
//! owns the JSON encoding so every host reads the same documents.

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

/// Byte-level storage for configuration documents, one blob per key.
///
/// Engines back this with whatever they have: files on disk, a bundled
/// asset, or a map in tests.
pub trait ConfigStore {
    /// Returns the document stored under `key`, or [`ConfigError::NotFound`].
    fn load_raw(&self, key: &str) -> Result<Vec<u8>, ConfigError>;
    /// Replaces the document stored under `key`.
    fn save_raw(&self, key: &str, data: &[u8]) -> Result<(), ConfigError>;
}

impl<S: ConfigStore + ?Sized> ConfigStore for &S {
    fn load_raw(&self, key: &str) -> Result<Vec<u8>, ConfigError> {
        (**self).load_raw(key)
    }

    fn save_raw(&self, key: &str, data: &[u8]) -> Result<(), ConfigError> {
        (**self).save_raw(key, data)
    }
}

/// Why a configuration document could not be read or written.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Nothing is stored under the key. [`ConfigService`] maps this to
    /// "not configured" rather than surfacing it.
    #[error("config key not found")]
    NotFound,
    /// The backing storage failed.
    #[error("config storage: {0}")]
    Io(#[from] std::io::Error),
    /// The document is not valid JSON for the requested type.
    #[error("malformed config document: {0}")]
    Serde(#[from] serde_json::Error),
    /// Store-specific failure.
    #[error("config store: {0}")]
    Other(String),
}

/// Typed access to configuration documents over a [`ConfigStore`].
pub struct ConfigService<S> {
    store: S,
}

impl<S> ConfigService<S> {
    /// Service reading and writing through `store`.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Backing store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Gives the backing store back.
    pub fn into_inner(self) -> S {
        self.store
    }
}

impl<S: ConfigStore> ConfigService<S> {
    /// Decodes the document under `key`.
    ///
    /// A missing key and an empty document both mean "not configured" and
    /// yield `Ok(None)`; anything else that fails to decode is an error.
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, ConfigError> {
        let bytes = match self.store.load_raw(key) {
            Ok(bytes) => bytes,
            Err(ConfigError::NotFound) => return Ok(None),
            Err(err) => return Err(err),
        };
        if bytes.is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    /// Like [`Self::load`], with `T::default()` standing in for "not
    /// configured".
    pub fn load_or_default<T: DeserializeOwned + Default>(
        &self,
        key: &str,
    ) -> Result<T, ConfigError> {
        Ok(self.load(key)?.unwrap_or_default())
    }

    /// Encodes `value` as pretty JSON under `key`.
    pub fn save<T: Serialize>(&self, key: &str, value: &T) -> Result<(), ConfigError> {
        let data = serde_json::to_vec_pretty(value)?;
        self.store.save_raw(key, &data)
    }
}

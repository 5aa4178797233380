// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! On-disk configuration for desktop hosts and the replay tool.
//!
//! Every key maps to `<dir>/<key>.json`, so a tuned estimator or a rule
//! table can be edited by hand and dropped next to the others.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use care_app_core::config::{ConfigError, ConfigStore};
use directories::ProjectDirs;

/// [`ConfigStore`] keeping one JSON file per key in a directory.
#[derive(Debug, Clone)]
pub struct FsConfigStore {
    dir: PathBuf,
}

impl FsConfigStore {
    /// Store in the per-user EchoCare config directory
    /// (`~/.config/EchoCare` on Linux).
    pub fn new() -> Result<Self, ConfigError> {
        let dirs = ProjectDirs::from("dev", "echocare", "EchoCare").ok_or_else(|| {
            ConfigError::Other("no home directory to place EchoCare config in".into())
        })?;
        Self::at(dirs.config_dir())
    }

    /// Store in `dir`, creating it when missing.
    pub fn at(dir: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Directory holding the documents.
    pub fn base(&self) -> &Path {
        &self.dir
    }

    fn file(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl ConfigStore for FsConfigStore {
    fn load_raw(&self, key: &str) -> Result<Vec<u8>, ConfigError> {
        fs::read(self.file(key)).map_err(|err| {
            if err.kind() == ErrorKind::NotFound {
                ConfigError::NotFound
            } else {
                ConfigError::Io(err)
            }
        })
    }

    fn save_raw(&self, key: &str, data: &[u8]) -> Result<(), ConfigError> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.file(key), data)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_key_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsConfigStore::at(dir.path()).unwrap();
        assert!(matches!(store.load_raw("feedback_rules"), Err(ConfigError::NotFound)));
    }

    #[test]
    fn saved_blob_lands_in_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsConfigStore::at(dir.path().join("nested")).unwrap();
        store.save_raw("estimator", b"{}").unwrap();
        assert!(dir.path().join("nested/estimator.json").is_file());
        assert_eq!(store.load_raw("estimator").unwrap(), b"{}");
    }

    #[test]
    fn unreadable_document_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("estimator.json")).unwrap();
        let store = FsConfigStore::at(dir.path()).unwrap();
        assert!(matches!(store.load_raw("estimator"), Err(ConfigError::Io(_))));
        assert_eq!(store.base(), dir.path());
    }
}

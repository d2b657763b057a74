//! Directory-backed store: one `<key>.json` file per key.
//!
//! Writes go to a temporary file first and are renamed into place, so a
//! crash never leaves a half-written value.

use std::path::{Path, PathBuf};

use super::Store;
use crate::error::CertigenError;

const EXTENSION: &str = "json";

#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Open (creating if needed) a store rooted at `root`.
    pub fn open(root: impl AsRef<Path>) -> Result<Self, CertigenError> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(&root).map_err(|e| {
            CertigenError::Storage(format!("Failed to create {}: {}", root.display(), e))
        })?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Keys are limited to ASCII letters, digits, `.`, `-` and `_`.
    fn path_for(&self, key: &str) -> Result<PathBuf, CertigenError> {
        let valid = !key.is_empty()
            && !key.starts_with('.')
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'));
        if !valid {
            return Err(CertigenError::Storage(format!("Invalid storage key '{}'", key)));
        }
        Ok(self.root.join(format!("{}.{}", key, EXTENSION)))
    }
}

impl Store for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, CertigenError> {
        let path = self.path_for(key)?;
        match std::fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CertigenError::Storage(format!(
                "Failed to read {}: {}",
                path.display(),
                e
            ))),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), CertigenError> {
        let path = self.path_for(key)?;
        let tmp = path.with_extension(format!("{}.tmp", EXTENSION));
        std::fs::write(&tmp, value)
            .and_then(|_| std::fs::rename(&tmp, &path))
            .map_err(|e| {
                CertigenError::Storage(format!("Failed to write {}: {}", path.display(), e))
            })?;
        tracing::debug!(key, bytes = value.len(), "stored");
        Ok(())
    }

    fn list(&self) -> Result<Vec<String>, CertigenError> {
        let entries = std::fs::read_dir(&self.root).map_err(|e| {
            CertigenError::Storage(format!("Failed to list {}: {}", self.root.display(), e))
        })?;

        let mut keys: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                let name = entry.file_name().to_string_lossy().into_owned();
                name.strip_suffix(".json").map(str::to_string)
            })
            .collect();
        keys.sort();
        Ok(keys)
    }

    fn delete(&self, key: &str) -> Result<bool, CertigenError> {
        let path = self.path_for(key)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(CertigenError::Storage(format!(
                "Failed to delete {}: {}",
                path.display(),
                e
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_path_like_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        for key in ["", "../escape", "a/b", ".hidden", "sp ace"] {
            assert!(store.set(key, "x").is_err(), "accepted key {:?}", key);
        }
    }

    #[test]
    fn test_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        FileStore::open(dir.path()).unwrap().set("font.custom-x", "{}").unwrap();

        let reopened = FileStore::open(dir.path()).unwrap();
        assert_eq!(reopened.get("font.custom-x").unwrap().as_deref(), Some("{}"));
        assert!(dir.path().join("font.custom-x.json").exists());
        assert!(!dir.path().join("font.custom-x.json.tmp").exists());
    }

    #[test]
    fn test_list_ignores_other_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "hi").unwrap();
        store.set("recipients", "[]").unwrap();
        assert_eq!(store.list().unwrap(), vec!["recipients"]);
    }
}

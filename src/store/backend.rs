//! Storage backends for pipeline artifacts
//!
//! A backend maps a relative location (such as `models/churn_model.bin`)
//! to a byte blob. The artifact store layers typed keys on top.

use crate::error::Result;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Storage backend trait
pub trait StorageBackend: Send + Sync {
    /// Replace whatever is stored at `location`
    fn put(&self, location: &str, bytes: &[u8]) -> Result<()>;

    /// Read the blob at `location`, `None` when nothing was ever written
    fn get(&self, location: &str) -> Result<Option<Vec<u8>>>;

    /// Append bytes to the blob at `location`, creating it if needed
    fn append(&self, location: &str, bytes: &[u8]) -> Result<()>;

    /// Check whether anything is stored at `location`
    fn exists(&self, location: &str) -> bool;

    /// Human readable description of where `location` lives
    fn describe(&self, location: &str) -> String;
}

/// Local file system storage backend
#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_dir: PathBuf,
}

impl LocalStorage {
    /// Create a backend rooted at `base_dir`; directories are created lazily
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn path_for(&self, location: &str) -> PathBuf {
        self.base_dir.join(location)
    }

    fn ensure_parent(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}

impl StorageBackend for LocalStorage {
    fn put(&self, location: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path_for(location);
        Self::ensure_parent(&path)?;

        // Readers only ever see the old or the new file, never a partial one.
        let mut tmp_name = path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp_path = PathBuf::from(tmp_name);
        {
            let mut file = fs::File::create(&tmp_path)?;
            file.write_all(bytes)?;
            file.sync_all()?;
        }
        fs::rename(&tmp_path, &path)?;
        Ok(())
    }

    fn get(&self, location: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path_for(location);
        if !path.is_file() {
            return Ok(None);
        }
        Ok(Some(fs::read(path)?))
    }

    fn append(&self, location: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path_for(location);
        Self::ensure_parent(&path)?;

        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
        file.write_all(bytes)?;
        file.sync_all()?;
        Ok(())
    }

    fn exists(&self, location: &str) -> bool {
        self.path_for(location).is_file()
    }

    fn describe(&self, location: &str) -> String {
        self.path_for(location).display().to_string()
    }
}

/// In-memory backend, mostly for tests
#[derive(Debug, Default)]
pub struct MemoryStorage {
    blobs: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageBackend for MemoryStorage {
    fn put(&self, location: &str, bytes: &[u8]) -> Result<()> {
        self.blobs.write().insert(location.to_string(), bytes.to_vec());
        Ok(())
    }

    fn get(&self, location: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.blobs.read().get(location).cloned())
    }

    fn append(&self, location: &str, bytes: &[u8]) -> Result<()> {
        self.blobs
            .write()
            .entry(location.to_string())
            .or_default()
            .extend_from_slice(bytes);
        Ok(())
    }

    fn exists(&self, location: &str) -> bool {
        self.blobs.read().contains_key(location)
    }

    fn describe(&self, location: &str) -> String {
        format!("memory://{}", location)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_local_put_creates_directories() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());

        assert!(!storage.exists("models/a.bin"));
        storage.put("models/a.bin", b"first").unwrap();
        assert!(dir.path().join("models/a.bin").is_file());
        assert!(!dir.path().join("models/a.bin.tmp").exists());

        storage.put("models/a.bin", b"second").unwrap();
        assert_eq!(storage.get("models/a.bin").unwrap().unwrap(), b"second");
    }

    #[test]
    fn test_local_append_accumulates() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());

        storage.append("db/log.csv", b"a\n").unwrap();
        storage.append("db/log.csv", b"b\n").unwrap();
        assert_eq!(storage.get("db/log.csv").unwrap().unwrap(), b"a\nb\n");
    }

    #[test]
    fn test_local_get_missing_is_none() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());
        assert!(storage.get("nothing/here").unwrap().is_none());
    }

    #[test]
    fn test_memory_backend() {
        let storage = MemoryStorage::new();
        storage.put("k", b"v1").unwrap();
        storage.append("k", b"v2").unwrap();
        assert_eq!(storage.get("k").unwrap().unwrap(), b"v1v2");
        assert!(storage.exists("k"));
        assert!(!storage.exists("other"));
        assert_eq!(storage.describe("k"), "memory://k");
    }
}

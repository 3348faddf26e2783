//! JSON file repositories with lock-then-read-merge-write discipline

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::io::Write;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::error::{Result, StorageError};
use crate::lock::FileLock;

const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(10);

/// Single-writer store for one document.
///
/// `update` is the only mutation: the implementation must hold an exclusive
/// lock across read, merge and write so concurrent writers never lose each
/// other's changes.
pub trait Repository<T>: Send + Sync {
    /// Current document, or `None` if nothing has been stored yet
    fn load(&self) -> Result<Option<T>>;

    /// Replace the document with `merge(current)` and return what was stored
    fn update(&self, merge: &mut dyn FnMut(Option<T>) -> Result<T>) -> Result<T>;
}

/// A document stored as pretty-printed JSON in a single file
pub struct JsonStore<T> {
    path: PathBuf,
    lock_timeout: Duration,
    _doc: PhantomData<fn() -> T>,
}

impl<T> JsonStore<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
            _doc: PhantomData,
        }
    }

    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Overwrite the document without reading it first
    pub fn write(&self, value: &T) -> Result<()> {
        let _lock = FileLock::acquire(&self.path, self.lock_timeout)?;
        self.write_atomic(value)
    }

    /// Remove the document, if present
    pub fn clear(&self) -> Result<()> {
        let _lock = FileLock::acquire(&self.path, self.lock_timeout)?;
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn read(&self) -> Result<Option<T>> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        serde_json::from_str(&content)
            .map(Some)
            .map_err(|source| StorageError::Corrupt {
                path: self.path.clone(),
                source,
            })
    }

    fn write_atomic(&self, value: &T) -> Result<()> {
        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(dir)?;

        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        serde_json::to_writer_pretty(&mut tmp, value)?;
        tmp.write_all(b"\n")?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path)?;

        debug!("Wrote {}", self.path.display());
        Ok(())
    }
}

impl<T> Repository<T> for JsonStore<T>
where
    T: Serialize + DeserializeOwned,
{
    fn load(&self) -> Result<Option<T>> {
        self.read()
    }

    fn update(&self, merge: &mut dyn FnMut(Option<T>) -> Result<T>) -> Result<T> {
        let _lock = FileLock::acquire(&self.path, self.lock_timeout)?;
        let current = self.read()?;
        let next = merge(current)?;
        self.write_atomic(&next)?;
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::Arc;
    use tempfile::TempDir;

    type Counts = BTreeMap<String, u32>;

    #[test]
    fn test_missing_file_loads_none() {
        let dir = TempDir::new().unwrap();
        let store: JsonStore<Counts> = JsonStore::new(dir.path().join("absent.json"));
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_corrupt_file_is_an_error_and_untouched() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("history.json");
        std::fs::write(&path, "{ not json").unwrap();
        let store: JsonStore<Counts> = JsonStore::new(&path);

        let err = store
            .update(&mut |_| Ok(Counts::new()))
            .unwrap_err();
        assert!(matches!(err, StorageError::Corrupt { .. }));
        assert_eq!(err.kind(), vrt_core::ErrorKind::InvalidInput);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{ not json");
        assert!(!FileLock::lock_path(&path).exists(), "lock released on error");
    }

    #[test]
    fn test_update_merges() {
        let dir = TempDir::new().unwrap();
        let store: JsonStore<Counts> = JsonStore::new(dir.path().join("nested/counts.json"));

        for _ in 0..3 {
            store
                .update(&mut |current| {
                    let mut counts = current.unwrap_or_default();
                    *counts.entry("runs".to_string()).or_default() += 1;
                    Ok(counts)
                })
                .unwrap();
        }
        assert_eq!(store.load().unwrap().unwrap()["runs"], 3);
    }

    #[test]
    fn test_concurrent_updates_are_not_lost() {
        let dir = TempDir::new().unwrap();
        let store: Arc<JsonStore<Counts>> =
            Arc::new(JsonStore::new(dir.path().join("counts.json")));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    store
                        .update(&mut |current| {
                            let mut counts = current.unwrap_or_default();
                            counts.insert(format!("worker-{}", i), 1);
                            *counts.entry("total".to_string()).or_default() += 1;
                            Ok(counts)
                        })
                        .unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let counts = store.load().unwrap().unwrap();
        assert_eq!(counts["total"], 8);
        assert_eq!(counts.len(), 9);
    }

    #[test]
    fn test_clear() {
        let dir = TempDir::new().unwrap();
        let store: JsonStore<Counts> = JsonStore::new(dir.path().join("c.json"));
        store.write(&Counts::new()).unwrap();
        store.clear().unwrap();
        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
    }
}

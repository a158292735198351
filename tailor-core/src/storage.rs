use anyhow::{Context, Result};
use fs2::FileExt;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

const LOCK_TIMEOUT: Duration = Duration::from_secs(5);
const LOCK_RETRY: Duration = Duration::from_millis(100);

/// A string key/value store with the semantics of browser local storage:
/// values are opaque strings, a missing key reads as `None`.
pub trait KeyValueStorage {
    /// Returns the value stored under `key`
    fn get_item(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value
    fn set_item(&self, key: &str, value: &str) -> Result<()>;

    /// Removes `key`; removing a missing key is not an error
    fn remove_item(&self, key: &str) -> Result<()>;

    /// Lists stored keys in sorted order
    fn keys(&self) -> Result<Vec<String>>;
}

type Items = BTreeMap<String, String>;

/// Key/value storage persisted as a single JSON object file, with advisory
/// file locking so a CLI and the GUI can share the same file
pub struct FileStorage {
    file_path: PathBuf,
    lock_file_path: PathBuf,
}

impl FileStorage {
    /// Creates a new FileStorage instance; nothing is touched on disk yet
    pub fn new<P: AsRef<Path>>(file_path: P) -> Self {
        let file_path = file_path.as_ref().to_path_buf();
        let lock_file_path = file_path.with_extension("json.lock");
        Self {
            file_path,
            lock_file_path,
        }
    }

    /// Returns the path to the storage file
    pub fn path(&self) -> &Path {
        &self.file_path
    }

    /// Exclusive lock for a read-modify-write; creates the lock file
    fn acquire_write_lock(&self) -> Result<File> {
        if let Some(parent) = self.lock_file_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let lock_file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&self.lock_file_path)
            .with_context(|| format!("Failed to create lock file: {:?}", self.lock_file_path))?;

        self.wait_for_lock(&lock_file, <File as FileExt>::try_lock_exclusive)?;
        Ok(lock_file)
    }

    /// Shared lock for a read; `None` if no writer has ever locked the file
    fn acquire_read_lock(&self) -> Result<Option<File>> {
        if !self.lock_file_path.exists() {
            return Ok(None);
        }
        let lock_file = OpenOptions::new()
            .read(true)
            .open(&self.lock_file_path)
            .with_context(|| format!("Failed to open lock file: {:?}", self.lock_file_path))?;

        self.wait_for_lock(&lock_file, <File as FileExt>::try_lock_shared)?;
        Ok(Some(lock_file))
    }

    /// Retries `try_lock` until it succeeds or [`LOCK_TIMEOUT`] passes
    fn wait_for_lock<F>(&self, lock_file: &File, try_lock: F) -> Result<()>
    where
        F: Fn(&File) -> std::io::Result<()>,
    {
        let start = Instant::now();
        loop {
            match try_lock(lock_file) {
                Ok(()) => return Ok(()),
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    if start.elapsed() > LOCK_TIMEOUT {
                        anyhow::bail!(
                            "Timed out after {}s waiting for storage lock on {:?}",
                            LOCK_TIMEOUT.as_secs(),
                            self.file_path
                        );
                    }
                    std::thread::sleep(LOCK_RETRY);
                }
                Err(e) => {
                    return Err(e).with_context(|| {
                        format!("Failed to lock {:?}", self.lock_file_path)
                    })
                }
            }
        }
    }

    /// Reads every item; a missing file is an empty storage
    fn read_items(&self) -> Result<Items> {
        if !self.file_path.exists() {
            log::debug!("Storage file {:?} does not exist yet", self.file_path);
            return Ok(Items::new());
        }

        let _lock = self.acquire_read_lock()?;

        let file = File::open(&self.file_path)
            .with_context(|| format!("Failed to open file: {:?}", self.file_path))?;
        let reader = BufReader::new(file);

        serde_json::from_reader(reader)
            .with_context(|| format!("Failed to parse storage JSON from {:?}", self.file_path))
    }

    /// Applies `update_fn` to the stored items under an exclusive lock
    fn update_items<F>(&self, update_fn: F) -> Result<()>
    where
        F: FnOnce(&mut Items),
    {
        let mut lock_file = self.acquire_write_lock()?;

        // Lock holder info, for debugging only
        let _ = writeln!(
            lock_file,
            "Locked by PID {} at {}",
            std::process::id(),
            chrono::Utc::now().to_rfc3339()
        );

        let mut items = if self.file_path.exists() {
            let file = File::open(&self.file_path)
                .with_context(|| format!("Failed to open file: {:?}", self.file_path))?;
            serde_json::from_reader(BufReader::new(file)).with_context(|| {
                format!("Failed to parse storage JSON from {:?}", self.file_path)
            })?
        } else {
            Items::new()
        };

        update_fn(&mut items);

        let json = serde_json::to_string_pretty(&items)?;
        fs::write(&self.file_path, json)
            .with_context(|| format!("Failed to write storage file: {:?}", self.file_path))?;
        log::debug!("Wrote {} storage item(s) to {:?}", items.len(), self.file_path);

        // Lock is released when lock_file is dropped
        Ok(())
    }
}

impl KeyValueStorage for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_items()?.remove(key))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.update_items(|items| {
            items.insert(key.to_string(), value.to_string());
        })
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        self.update_items(|items| {
            items.remove(key);
        })
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(self.read_items()?.into_keys().collect())
    }
}

/// Non-persistent storage, used by tests and as a scratch backend
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: RefCell<Items>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.items.borrow().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.items
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        self.items.borrow_mut().remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(self.items.borrow().keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_reads_as_empty() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileStorage::new(temp_dir.path().join("nested/storage.json"));

        assert_eq!(storage.get_item("anything").unwrap(), None);
        assert!(storage.keys().unwrap().is_empty());
        assert!(!storage.path().exists());
    }

    #[test]
    fn test_set_get_remove() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileStorage::new(temp_dir.path().join("storage.json"));

        storage.set_item("b", "2").unwrap();
        storage.set_item("a", "1").unwrap();
        storage.set_item("a", "one").unwrap();

        assert_eq!(storage.get_item("a").unwrap().as_deref(), Some("one"));
        assert_eq!(storage.keys().unwrap(), vec!["a", "b"]);

        storage.remove_item("a").unwrap();
        storage.remove_item("missing").unwrap();
        assert_eq!(storage.get_item("a").unwrap(), None);
        assert_eq!(storage.keys().unwrap(), vec!["b"]);
    }

    #[test]
    fn test_values_survive_a_new_handle() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("storage.json");

        FileStorage::new(&path).set_item("k", "[1,2]").unwrap();
        let reopened = FileStorage::new(&path);
        assert_eq!(reopened.get_item("k").unwrap().as_deref(), Some("[1,2]"));
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("storage.json");
        fs::write(&path, "not json").unwrap();

        let err = FileStorage::new(&path).get_item("k").unwrap_err();
        assert!(err.to_string().contains("Failed to parse storage JSON"));
    }

    #[test]
    fn test_readers_share_and_writers_wait_for_lock() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("storage.json");
        let storage = FileStorage::new(&path);
        storage.set_item("k", "v").unwrap();

        let holder = File::open(path.with_extension("json.lock")).unwrap();
        FileExt::lock_shared(&holder).unwrap();
        assert_eq!(storage.get_item("k").unwrap().as_deref(), Some("v"));

        let err = storage.set_item("k", "w").unwrap_err();
        assert!(err.to_string().starts_with("Timed out"));
        FileExt::unlock(&holder).unwrap();

        storage.set_item("k", "w").unwrap();
        assert_eq!(storage.get_item("k").unwrap().as_deref(), Some("w"));
    }

    #[test]
    fn test_memory_storage() {
        let storage = MemoryStorage::new();
        storage.set_item("x", "y").unwrap();
        assert_eq!(storage.get_item("x").unwrap().as_deref(), Some("y"));
        storage.remove_item("x").unwrap();
        assert!(storage.keys().unwrap().is_empty());
    }
}

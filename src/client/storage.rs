/**
 * Client storage capability
 * String key/value persistence injected into the local cache
 */
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub trait Storage: Send + Sync + 'static {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> anyhow::Result<()>;
    fn remove(&self, key: &str) -> anyhow::Result<()>;
}

pub type DynStorage = Arc<dyn Storage>;

/// Process-local storage, used by tests and throwaway sessions
#[derive(Default)]
pub struct MemoryStorage {
    inner: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_arc(self) -> DynStorage {
        Arc::new(self)
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.inner.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        self.inner.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> anyhow::Result<()> {
        self.inner.lock().remove(key);
        Ok(())
    }
}

/// One file per key under a directory, so the cache survives restarts
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn into_arc(self) -> DynStorage {
        Arc::new(self)
    }

    /// Distinct keys always map to distinct files: `[A-Za-z0-9-]` is kept
    /// and every other byte, `_` included, becomes `_XX` in hex.
    fn path_for(&self, key: &str) -> PathBuf {
        let mut file = String::with_capacity(key.len());
        for byte in key.bytes() {
            if byte.is_ascii_alphanumeric() || byte == b'-' {
                file.push(byte as char);
            } else {
                file.push_str(&format!("_{:02X}", byte));
            }
        }
        self.dir.join(format!("{}.json", file))
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        match std::fs::read_to_string(self.path_for(key)) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, value)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> anyhow::Result<()> {
        match std::fs::remove_file(self.path_for(key)) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

/// Memory storage whose writes can be switched off, for exercising
/// persistence failures.
#[cfg(test)]
#[derive(Default)]
pub(crate) struct FlakyStorage {
    inner: MemoryStorage,
    read_only: std::sync::atomic::AtomicBool,
}

#[cfg(test)]
impl FlakyStorage {
    pub(crate) fn set_read_only(&self, read_only: bool) {
        self.read_only
            .store(read_only, std::sync::atomic::Ordering::SeqCst);
    }

    fn check_writable(&self) -> anyhow::Result<()> {
        if self.read_only.load(std::sync::atomic::Ordering::SeqCst) {
            anyhow::bail!("storage is read-only");
        }
        Ok(())
    }
}

#[cfg(test)]
impl Storage for FlakyStorage {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        self.check_writable()?;
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> anyhow::Result<()> {
        self.check_writable()?;
        self.inner.remove(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_storage_round_trip() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.get("k").unwrap(), None);
        storage.set("k", "v").unwrap();
        assert_eq!(storage.get("k").unwrap().as_deref(), Some("v"));
        storage.remove("k").unwrap();
        assert_eq!(storage.get("k").unwrap(), None);
    }

    #[test]
    fn test_file_storage_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        FileStorage::new(dir.path().join("cache"))
            .set("blogs:data", "{\"blogs\":[]}")
            .unwrap();
        let reopened = FileStorage::new(dir.path().join("cache"));
        assert_eq!(
            reopened.get("blogs:data").unwrap().as_deref(),
            Some("{\"blogs\":[]}")
        );
        reopened.remove("blogs:data").unwrap();
        reopened.remove("blogs:data").unwrap();
        assert_eq!(reopened.get("blogs:data").unwrap(), None);
    }

    #[test]
    fn test_file_storage_keys_do_not_collide() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());
        let keys = ["a:b", "a_b", "a_3Ab", "a.b", "a/b", "blog:é"];
        for (i, key) in keys.iter().enumerate() {
            storage.set(key, &i.to_string()).unwrap();
        }
        for (i, key) in keys.iter().enumerate() {
            assert_eq!(storage.get(key).unwrap(), Some(i.to_string()), "key {}", key);
        }
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), keys.len());

        storage.remove("a_b").unwrap();
        assert_eq!(storage.get("a_b").unwrap(), None);
        assert_eq!(storage.get("a:b").unwrap().as_deref(), Some("0"));
    }
}

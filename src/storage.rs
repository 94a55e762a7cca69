use std::path::PathBuf;
#[cfg(test)]
use std::{collections::HashMap, sync::RwLock};

use serde::{de::DeserializeOwned, Serialize};

use crate::app::errors::FeedResult;

/// Flat key-value persistence. Every write replaces the whole value stored
/// under a key; there are no partial patches and no transactions.
pub trait StorageManager: Send + Sync {
    fn write(&self, ident: &str, data: &[u8]) -> std::io::Result<()>;
    fn read(&self, ident: &str) -> std::io::Result<Vec<u8>>;
    fn exists(&self, ident: &str) -> bool;
}

/// Reads a JSON document, falling back to `None` when the key is absent or
/// the stored value no longer parses.
pub fn read_json<T: DeserializeOwned>(store: &dyn StorageManager, ident: &str) -> Option<T> {
    if !store.exists(ident) {
        return None;
    }

    let data = match store.read(ident) {
        Ok(data) => data,
        Err(err) => {
            log::warn!("failed to read \"{ident}\": {err}");
            return None;
        }
    };

    match serde_json::from_slice(&data) {
        Ok(value) => Some(value),
        Err(err) => {
            log::warn!("ignoring malformed value under \"{ident}\": {err}");
            None
        }
    }
}

/// Reads a JSON document that must not be silently replaced: a value that is
/// present but no longer parses is an error, not `None`.
pub fn read_json_strict<T: DeserializeOwned>(
    store: &dyn StorageManager,
    ident: &str,
) -> FeedResult<Option<T>> {
    if !store.exists(ident) {
        return Ok(None);
    }

    let data = store.read(ident)?;
    let value = serde_json::from_slice(&data).map_err(|err| {
        log::error!("stored \"{ident}\" is unreadable, refusing to overwrite it: {err}");
        err
    })?;
    Ok(Some(value))
}

pub fn write_json<T: Serialize + ?Sized>(
    store: &dyn StorageManager,
    ident: &str,
    value: &T,
) -> FeedResult<()> {
    let data = serde_json::to_vec_pretty(value)?;
    store.write(ident, &data)?;
    Ok(())
}

#[derive(Clone)]
pub struct BackendLocal {
    pub base_dir: PathBuf,
}

impl BackendLocal {
    pub fn new(storage_dir: impl Into<PathBuf>) -> std::io::Result<Self> {
        let base_dir = storage_dir.into();
        std::fs::create_dir_all(&base_dir)?;
        Ok(BackendLocal { base_dir })
    }

    fn path(&self, ident: &str) -> PathBuf {
        self.base_dir.join(format!("{ident}.json"))
    }
}

impl StorageManager for BackendLocal {
    fn exists(&self, ident: &str) -> bool {
        std::fs::metadata(self.path(ident)).is_ok()
    }

    fn read(&self, ident: &str) -> std::io::Result<Vec<u8>> {
        std::fs::read(self.path(ident))
    }

    // write-then-rename so a crash leaves either the old or the new value
    fn write(&self, ident: &str, data: &[u8]) -> std::io::Result<()> {
        let path = self.path(ident);
        let temp_path = self
            .base_dir
            .join(format!(".{}-{ident}.tmp", rusty_ulid::generate_ulid_string()));

        std::fs::write(&temp_path, data)?;

        std::fs::rename(&temp_path, &path)
    }
}

/// In-process store for tests.
#[cfg(test)]
#[derive(Default)]
pub struct BackendMemory {
    entries: RwLock<HashMap<String, Vec<u8>>>,
}

#[cfg(test)]
impl BackendMemory {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
impl StorageManager for BackendMemory {
    fn write(&self, ident: &str, data: &[u8]) -> std::io::Result<()> {
        self.entries
            .write()
            .map_err(|_| std::io::Error::other("memory store poisoned"))?
            .insert(ident.to_string(), data.to_vec());
        Ok(())
    }

    fn read(&self, ident: &str) -> std::io::Result<Vec<u8>> {
        self.entries
            .read()
            .map_err(|_| std::io::Error::other("memory store poisoned"))?
            .get(ident)
            .cloned()
            .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::NotFound, ident.to_string()))
    }

    fn exists(&self, ident: &str) -> bool {
        self.entries
            .read()
            .map(|entries| entries.contains_key(ident))
            .unwrap_or(false)
    }
}

//! Durable cache store persisting API responses to disk
//!
//! Provides a `FileCacheStore` that keeps one JSON file per cache key, holding
//! the payload together with its creation and expiry timestamps.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use directories::ProjectDirs;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;
use tracing::warn;

use super::store::{expiry, CacheError, CacheStore};
use super::CacheKey;

/// One cache row as stored on disk
#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry {
    /// Full cache key, kept so prefix invalidation can match on it
    key: String,
    /// The cached payload
    payload: Value,
    /// When the entry was written
    created_at: DateTime<Utc>,
    /// When the entry stops being served
    expires_at: DateTime<Utc>,
}

/// Cache store backed by a directory of JSON files
///
/// Files live in an XDG-compliant cache directory (`~/.cache/wb-client/` on
/// Linux) and are named by the SHA-256 of their key. Writes go to a temporary
/// file that is renamed over the target, so readers never observe a partial
/// entry. Every deletion re-checks the entry under `write_lock` so that a sweep
/// cannot remove a row another writer has just refreshed.
#[derive(Debug, Clone)]
pub struct FileCacheStore {
    /// Directory where cache files are stored
    cache_dir: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl FileCacheStore {
    /// Creates a store in the XDG-compliant cache directory
    ///
    /// Returns `None` if the cache directory cannot be determined (e.g., no home directory).
    pub fn new() -> Option<Self> {
        let project_dirs = ProjectDirs::from("", "", "wb-client")?;
        Some(Self::with_dir(project_dirs.cache_dir().to_path_buf()))
    }

    /// Creates a store rooted at a custom directory
    pub fn with_dir(cache_dir: PathBuf) -> Self {
        Self {
            cache_dir,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Returns the path to the cache file for the given key
    fn cache_path(&self, key: &str) -> PathBuf {
        let digest = Sha256::digest(key.as_bytes());
        self.cache_dir.join(format!("{}.json", hex::encode(digest)))
    }

    /// Ensures the cache directory exists
    fn ensure_dir(&self) -> io::Result<()> {
        fs::create_dir_all(&self.cache_dir)
    }

    /// Reads an entry, mapping a missing file to `None`
    ///
    /// A file that exists but cannot be parsed is reported as `Ok(Some(None))`
    /// so callers can reap it.
    fn read_entry(path: &Path) -> Result<Option<Option<CacheEntry>>, CacheError> {
        let content = match fs::read(path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        match serde_json::from_slice::<CacheEntry>(&content) {
            Ok(entry) => Ok(Some(Some(entry))),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "discarding unreadable cache entry");
                Ok(Some(None))
            }
        }
    }

    /// Lists every entry file in the cache directory
    fn entry_paths(&self) -> Result<Vec<PathBuf>, CacheError> {
        let dir = match fs::read_dir(&self.cache_dir) {
            Ok(dir) => dir,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let mut paths = Vec::new();
        for item in dir {
            let path = item?.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                paths.push(path);
            }
        }
        Ok(paths)
    }

    /// Removes a file, treating "already gone" as success
    fn remove(path: &Path) -> Result<bool, CacheError> {
        match fs::remove_file(path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Deletes the entries selected by `doomed`; caller must hold `write_lock`
    fn remove_where<F>(&self, mut doomed: F) -> Result<usize, CacheError>
    where
        F: FnMut(Option<&CacheEntry>) -> bool,
    {
        let mut removed = 0;
        for path in self.entry_paths()? {
            let Some(entry) = Self::read_entry(&path)? else {
                continue;
            };
            if doomed(entry.as_ref()) && Self::remove(&path)? {
                removed += 1;
            }
        }
        Ok(removed)
    }
}

impl CacheStore for FileCacheStore {
    fn get_at(&self, key: &CacheKey, now: DateTime<Utc>) -> Result<Option<Value>, CacheError> {
        let path = self.cache_path(key.as_str());
        match Self::read_entry(&path)? {
            None => return Ok(None),
            Some(Some(entry)) if entry.key == key.as_str() && now < entry.expires_at => {
                return Ok(Some(entry.payload));
            }
            Some(_) => {}
        }

        // Dead or corrupt; re-check under the lock in case a writer just replaced it
        let _guard = self.write_lock.lock();
        match Self::read_entry(&path)? {
            Some(Some(entry)) if now < entry.expires_at => {
                if entry.key == key.as_str() {
                    Ok(Some(entry.payload))
                } else {
                    Ok(None)
                }
            }
            Some(_) => {
                Self::remove(&path)?;
                Ok(None)
            }
            None => Ok(None),
        }
    }

    fn set_at(
        &self,
        key: &CacheKey,
        payload: &Value,
        ttl_secs: u64,
        now: DateTime<Utc>,
    ) -> Result<(), CacheError> {
        let entry = CacheEntry {
            key: key.as_str().to_string(),
            payload: payload.clone(),
            created_at: now,
            expires_at: expiry(now, ttl_secs),
        };
        let json = serde_json::to_vec_pretty(&entry)?;

        let _guard = self.write_lock.lock();
        self.ensure_dir()?;
        let mut tmp = NamedTempFile::new_in(&self.cache_dir)?;
        tmp.write_all(&json)?;
        tmp.persist(self.cache_path(key.as_str()))
            .map_err(|e| CacheError::Io(e.error))?;
        Ok(())
    }

    fn invalidate(&self, prefix: &str) -> Result<usize, CacheError> {
        let _guard = self.write_lock.lock();
        self.remove_where(|entry| entry.is_some_and(|e| e.key.starts_with(prefix)))
    }

    fn sweep_expired_at(&self, now: DateTime<Utc>) -> Result<usize, CacheError> {
        let _guard = self.write_lock.lock();
        self.remove_where(|entry| entry.map_or(true, |e| e.expires_at < now))
    }

    fn clear_all(&self) -> Result<usize, CacheError> {
        let _guard = self.write_lock.lock();
        self.remove_where(|_| true)
    }

    fn len(&self) -> Result<usize, CacheError> {
        Ok(self.entry_paths()?.len())
    }
}

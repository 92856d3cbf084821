//! Directory-backed key-value store

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::{KeyValueStore, DEFAULT_QUOTA_BYTES};
use crate::error::{StorageError, StorageResult};

/// Extension of the sibling file a write goes through before the rename
const TMP_EXTENSION: &str = "json.tmp";

/// Stores each key as `<dir>/<key>.json`
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
    quota_bytes: u64,
}

impl FileStore {
    /// Open (and create if needed) a store rooted at `dir`
    pub fn open(dir: impl Into<PathBuf>) -> StorageResult<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        remove_stale_writes(&dir)?;
        debug!(dir = %dir.display(), "Opened file store");
        Ok(Self {
            dir,
            quota_bytes: DEFAULT_QUOTA_BYTES,
        })
    }

    pub fn with_quota(mut self, quota_bytes: u64) -> Self {
        self.quota_bytes = quota_bytes;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> StorageResult<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
            && !key.starts_with('.');
        if !valid {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }

    fn used_bytes_excluding(&self, path: &Path) -> StorageResult<u64> {
        let mut used = 0;
        for entry in std::fs::read_dir(&self.dir)? {
            let entry = entry?;
            let entry_path = entry.path();
            if entry_path != path && !is_tmp(&entry_path) {
                used += entry.metadata()?.len();
            }
        }
        Ok(used)
    }
}

fn is_tmp(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.ends_with(&format!(".{}", TMP_EXTENSION)))
}

/// Delete half-written values left behind by an interrupted `set`
fn remove_stale_writes(dir: &Path) -> StorageResult<()> {
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if is_tmp(&path) {
            warn!(path = %path.display(), "Removing interrupted write");
            std::fs::remove_file(&path)?;
        }
    }
    Ok(())
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let path = self.path_for(key)?;
        match std::fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        let path = self.path_for(key)?;
        if self.used_bytes_excluding(&path)? + value.len() as u64 > self.quota_bytes {
            return Err(StorageError::QuotaExceeded {
                key: key.to_string(),
            });
        }

        // Write to a sibling and rename so a crash never leaves a torn file
        let tmp = path.with_extension(TMP_EXTENSION);
        std::fs::write(&tmp, value)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        let path = self.path_for(key)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

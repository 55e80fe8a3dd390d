//! JSON document store on disk
//!
//! Every operation takes an exclusive lock on `<path>.lock`, reads the document, and for
//! writes replaces it through a temp file and rename. A missing document is an empty store.

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tracing::{debug, warn};

use super::{Document, StoreData, StoreError, StoreResult};

/// Store backed by one JSON file
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Open a store at `path`, creating the parent directory if needed
    pub fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();
        debug!(?path, "FileStore::open: called");
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".lock");
        PathBuf::from(name)
    }

    fn lock(&self) -> StoreResult<File> {
        let lock = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(self.lock_path())?;
        lock.lock_exclusive()
            .map_err(|e| StoreError::Lock(format!("{}: {}", self.lock_path().display(), e)))?;
        Ok(lock)
    }

    fn load(&self) -> StoreResult<StoreData> {
        if !self.path.exists() {
            debug!(path = ?self.path, "FileStore::load: no document yet");
            return Ok(StoreData::default());
        }
        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            warn!(path = ?self.path, "Store document is empty, starting fresh");
            return Ok(StoreData::default());
        }
        Ok(serde_json::from_str(&content)?)
    }

    fn persist(&self, data: &StoreData) -> StoreResult<()> {
        let mut tmp = self.path.as_os_str().to_owned();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        fs::write(&tmp, serde_json::to_string_pretty(data)?)?;
        fs::rename(&tmp, &self.path)?;
        debug!(path = ?self.path, "FileStore::persist: written");
        Ok(())
    }
}

impl Document for FileStore {
    fn read<R>(&self, f: impl FnOnce(&StoreData) -> R) -> StoreResult<R> {
        let lock = self.lock()?;
        let result = self.load().map(|data| f(&data));
        let _ = FileExt::unlock(&lock);
        result
    }

    fn write<R>(&self, f: impl FnOnce(&mut StoreData) -> R) -> StoreResult<R> {
        let lock = self.lock()?;
        let result = self.load().and_then(|mut data| {
            let value = f(&mut data);
            self.persist(&data)?;
            Ok(value)
        });
        let _ = FileExt::unlock(&lock);
        result
    }
}

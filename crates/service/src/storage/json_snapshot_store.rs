use std::{
    io::ErrorKind,
    marker::PhantomData,
    path::{Path, PathBuf},
    sync::Arc,
};

use chrono::Utc;
use configs::StorageMode;
use serde::{de::DeserializeOwned, Serialize};
use tokio::{fs, sync::Mutex};
use tracing::{debug, error, warn};

use crate::errors::ServiceError;

/// Generic JSON file-backed collection.
///
/// The file holds one JSON array and is the only source of truth: nothing is
/// cached between calls, every operation re-reads it. Read-modify-write
/// sequences run under one mutex so overlapping callers cannot lose updates,
/// and writes go through a temp file plus rename.
pub struct JsonSnapshotStore<T> {
    file_path: PathBuf,
    mode: StorageMode,
    lock: Mutex<()>,
    _item: PhantomData<fn() -> T>,
}

impl<T> JsonSnapshotStore<T>
where
    T: Serialize + DeserializeOwned,
{
    /// Initialize the store from a path. The file itself is created on first write.
    pub async fn new<P: Into<PathBuf>>(path: P, mode: StorageMode) -> Result<Arc<Self>, ServiceError> {
        let file_path = path.into();
        if let Some(parent) = file_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await.ok();
            }
        }
        Ok(Arc::new(Self { file_path, mode, lock: Mutex::new(()), _item: PhantomData }))
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }

    pub fn mode(&self) -> StorageMode {
        self.mode
    }

    fn tmp_path(&self) -> PathBuf {
        let mut tmp = self.file_path.clone().into_os_string();
        tmp.push(".tmp");
        PathBuf::from(tmp)
    }

    /// Where an unreadable snapshot is moved before a lenient write replaces it.
    fn quarantine_path(&self) -> PathBuf {
        let mut moved = self.file_path.clone().into_os_string();
        moved.push(format!(".corrupt-{}", Utc::now().timestamp_millis()));
        PathBuf::from(moved)
    }

    fn corrupt(&self, reason: String, bytes: Vec<u8>) -> Result<Loaded<T>, ServiceError> {
        let path = self.file_path.display().to_string();
        match self.mode {
            StorageMode::Strict => {
                error!(%path, %reason, "snapshot unreadable");
                Err(ServiceError::Corrupt { path, reason })
            }
            StorageMode::Lenient => {
                warn!(%path, %reason, "snapshot unreadable; treating as empty");
                Ok(Loaded { items: Vec::new(), unreadable: Some(bytes) })
            }
        }
    }

    async fn load(&self) -> Result<Loaded<T>, ServiceError> {
        let bytes = match fs::read(&self.file_path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Loaded::default()),
            Err(e) => return self.corrupt(e.to_string(), Vec::new()),
        };
        if bytes.iter().all(u8::is_ascii_whitespace) {
            warn!(path = %self.file_path.display(), "snapshot is empty; treating as no items");
            return Ok(Loaded::default());
        }
        match serde_json::from_slice(&bytes) {
            Ok(items) => Ok(Loaded { items, unreadable: None }),
            Err(e) => self.corrupt(e.to_string(), bytes),
        }
    }

    /// Move an unreadable snapshot aside so the next write cannot destroy it.
    async fn quarantine(&self) -> Result<PathBuf, ServiceError> {
        let target = self.quarantine_path();
        match fs::rename(&self.file_path, &target).await {
            Ok(()) => {
                warn!(path = %self.file_path.display(), moved_to = %target.display(), "unreadable snapshot quarantined");
                Ok(target)
            }
            Err(e) => {
                error!(path = %self.file_path.display(), error = %e, "could not quarantine unreadable snapshot");
                Err(ServiceError::Io(e.to_string()))
            }
        }
    }

    async fn save(&self, items: &[T]) -> Result<(), ServiceError> {
        let data = serde_json::to_vec_pretty(items).map_err(|e| ServiceError::Serialization(e.to_string()))?;
        let tmp = self.tmp_path();
        let written = match fs::write(&tmp, &data).await {
            Ok(()) => fs::rename(&tmp, &self.file_path).await,
            Err(e) => Err(e),
        };
        match (written, self.mode) {
            (Ok(()), _) => {
                debug!(path = %self.file_path.display(), items = items.len(), bytes = data.len(), "snapshot written");
                Ok(())
            }
            (Err(e), StorageMode::Strict) => {
                error!(path = %self.file_path.display(), error = %e, "snapshot write failed");
                Err(ServiceError::Io(e.to_string()))
            }
            (Err(e), StorageMode::Lenient) => {
                error!(path = %self.file_path.display(), error = %e, "snapshot write failed; change not persisted");
                Ok(())
            }
        }
    }

    /// Read the whole collection in stored order.
    pub async fn read_all(&self) -> Result<Vec<T>, ServiceError> {
        let _guard = self.lock.lock().await;
        Ok(self.load().await?.items)
    }

    /// Apply a mutation to a freshly read collection and persist it.
    ///
    /// When `f` fails nothing is written and the error is returned unchanged.
    pub async fn update<F, R>(&self, f: F) -> Result<R, ServiceError>
    where
        F: FnOnce(&mut Vec<T>) -> Result<R, ServiceError>,
    {
        self.update_recovering(|items, _| f(items)).await
    }

    /// Like [`update`](Self::update), but `f` also receives the raw bytes of a
    /// snapshot that lenient mode could not decode. Those bytes are moved to a
    /// `.corrupt-<millis>` file before the new collection is written.
    pub async fn update_recovering<F, R>(&self, f: F) -> Result<R, ServiceError>
    where
        F: FnOnce(&mut Vec<T>, Option<&[u8]>) -> Result<R, ServiceError>,
    {
        let _guard = self.lock.lock().await;
        let Loaded { mut items, unreadable } = self.load().await?;
        let out = f(&mut items, unreadable.as_deref())?;
        if unreadable.is_some() {
            self.quarantine().await?;
        }
        self.save(&items).await?;
        Ok(out)
    }
}

/// A decoded snapshot, plus the original bytes when lenient mode gave up on them.
struct Loaded<T> {
    items: Vec<T>,
    unreadable: Option<Vec<u8>>,
}

impl<T> Default for Loaded<T> {
    fn default() -> Self {
        Self { items: Vec::new(), unreadable: None }
    }
}

//! A single JSON document mutated by read-modify-write.
//!
//! Mutations of one document are serialized by a `tokio::sync::Mutex` taken
//! from a process-wide registry keyed by the document's path, so two
//! `JsonDocument` values over the same file still exclude each other.
//! Mutations from other processes are not coordinated.

use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};

use dashmap::DashMap;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::debug;

use snipstore_core::error::{AppError, AppResult, ErrorKind};

use crate::atomic::{create_if_absent, write_atomic};

static DOCUMENT_LOCKS: LazyLock<DashMap<PathBuf, Arc<Mutex<()>>>> = LazyLock::new(DashMap::new);

fn lock_for(path: &Path) -> Arc<Mutex<()>> {
    DOCUMENT_LOCKS
        .entry(path.to_path_buf())
        .or_insert_with(|| Arc::new(Mutex::new(())))
        .clone()
}

/// A JSON file holding one value of type `T`.
#[derive(Debug)]
pub struct JsonDocument<T> {
    path: PathBuf,
    lock: Arc<Mutex<()>>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for JsonDocument<T> {
    fn clone(&self) -> Self {
        Self {
            path: self.path.clone(),
            lock: Arc::clone(&self.lock),
            _marker: PhantomData,
        }
    }
}

impl<T> JsonDocument<T>
where
    T: Serialize + DeserializeOwned + Default + Send,
{
    /// Bind to `path`. The parent directory should already be canonical.
    pub fn new(path: PathBuf) -> Self {
        let lock = lock_for(&path);
        Self {
            path,
            lock,
            _marker: PhantomData,
        }
    }

    /// The file backing this document.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Publish `T::default()` if the file does not exist yet.
    ///
    /// Safe to race: exactly one caller creates the file and nobody sees
    /// it half written.
    pub async fn ensure_initialized(&self) -> AppResult<()> {
        if fs::try_exists(&self.path).await.unwrap_or(false) {
            return Ok(());
        }
        let initial = serde_json::to_vec_pretty(&T::default())?;
        if create_if_absent(&self.path, &initial).await? {
            debug!(path = %self.path.display(), "Initialized document");
        }
        Ok(())
    }

    /// Read the current value.
    pub async fn read(&self) -> AppResult<T> {
        let data = fs::read(&self.path).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to read {}", self.path.display()),
                e,
            )
        })?;
        serde_json::from_slice(&data).map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Corrupt document {}", self.path.display()),
                e,
            )
        })
    }

    /// Read, apply `f`, and write back atomically while holding the lock.
    ///
    /// Nothing is written when `f` fails.
    pub async fn modify<R, F>(&self, f: F) -> AppResult<R>
    where
        F: FnOnce(&mut T) -> AppResult<R> + Send,
    {
        let _guard = self.lock.lock().await;
        let mut value = self.read().await?;
        let result = f(&mut value)?;
        let data = serde_json::to_vec_pretty(&value)?;
        write_atomic(&self.path, &data).await?;
        Ok(result)
    }
}

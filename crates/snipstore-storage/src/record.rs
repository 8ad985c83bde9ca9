//! Directory-backed record store: one `<key>.json` file per record.

use std::path::PathBuf;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs;
use tracing::debug;

use snipstore_core::error::{AppError, AppResult, ErrorKind};
use snipstore_core::traits::record::RecordStore;
use snipstore_entity::schema::{RESERVED_FOLDERS_KEY, check_record_key};

use crate::atomic::write_atomic;

const RECORD_EXTENSION: &str = "json";

/// Local filesystem record store.
#[derive(Debug, Clone)]
pub struct LocalRecordStore {
    /// Directory holding every record file.
    root: PathBuf,
}

impl LocalRecordStore {
    /// Create a store rooted at `root_path`, creating the directory if needed.
    pub async fn new(root_path: &str) -> AppResult<Self> {
        let root = PathBuf::from(root_path);
        create_root(&root).await?;
        let root = fs::canonicalize(&root).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to resolve storage root: {}", root.display()),
                e,
            )
        })?;
        Ok(Self { root })
    }

    /// The canonical root directory.
    pub fn root(&self) -> &std::path::Path {
        &self.root
    }

    /// Map a key to its file. Keys that could escape the root are rejected.
    fn resolve(&self, key: &str) -> AppResult<PathBuf> {
        check_record_key(key)
            .map_err(|msg| AppError::validation(format!("Invalid record key '{key}': {msg}")))?;
        Ok(self.root.join(format!("{key}.{RECORD_EXTENSION}")))
    }
}

async fn create_root(root: &std::path::Path) -> AppResult<()> {
    fs::create_dir_all(root).await.map_err(|e| {
        AppError::with_source(
            ErrorKind::Storage,
            format!("Failed to create storage root: {}", root.display()),
            e,
        )
    })
}

#[async_trait]
impl RecordStore for LocalRecordStore {
    fn store_type(&self) -> &str {
        "local"
    }

    async fn ensure_ready(&self) -> AppResult<()> {
        create_root(&self.root).await
    }

    async fn get(&self, key: &str) -> AppResult<Option<Bytes>> {
        let path = self.resolve(key)?;
        match fs::read(&path).await {
            Ok(data) => Ok(Some(Bytes::from(data))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to read record: {key}"),
                e,
            )),
        }
    }

    async fn put(&self, key: &str, value: Bytes) -> AppResult<()> {
        let path = self.resolve(key)?;
        write_atomic(&path, &value).await?;
        debug!(key, bytes = value.len(), "Wrote record");
        Ok(())
    }

    async fn remove(&self, key: &str) -> AppResult<bool> {
        let path = self.resolve(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => {
                debug!(key, "Removed record");
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to delete record: {key}"),
                e,
            )),
        }
    }

    async fn keys(&self) -> AppResult<Vec<String>> {
        let mut dir = match fs::read_dir(&self.root).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to list records in {}", self.root.display()),
                    e,
                ));
            }
        };

        let mut keys = Vec::new();
        while let Some(entry) = dir.next_entry().await.map_err(|e| {
            AppError::with_source(ErrorKind::Storage, "Failed to read directory entry", e)
        })? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(RECORD_EXTENSION) {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
            if stem == RESERVED_FOLDERS_KEY {
                continue;
            }
            // Every other `*.json` is a record; an unusable name is a broken store.
            check_record_key(stem).map_err(|msg| {
                AppError::storage(format!("Unreadable record file '{name}': {msg}"))
            })?;
            keys.push(stem.to_string());
        }

        keys.sort();
        Ok(keys)
    }
}

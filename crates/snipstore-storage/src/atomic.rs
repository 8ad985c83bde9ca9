//! Atomic file publication.
//!
//! Content is first written to a uniquely named temp file in the target's
//! directory, so a reader sees either the old file or the complete new one.

use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use snipstore_core::error::{AppError, AppResult, ErrorKind};

/// Replace `target` with `content`. Concurrent writers: last rename wins.
pub(crate) async fn write_atomic(target: &Path, content: &[u8]) -> AppResult<()> {
    let temp = temp_path(target);
    if let Err(e) = write_temp(&temp, content).await {
        let _ = fs::remove_file(&temp).await;
        return Err(e);
    }

    fs::rename(&temp, target).await.map_err(|e| {
        AppError::with_source(
            ErrorKind::Storage,
            format!("Failed to publish {}", target.display()),
            e,
        )
    })
}

/// Publish `content` at `target` only if nothing is there yet.
///
/// Uses a hard link from a complete temp file, so the first caller wins and
/// nobody ever observes a partially written `target`. Returns `false` when
/// `target` already existed.
pub(crate) async fn create_if_absent(target: &Path, content: &[u8]) -> AppResult<bool> {
    let temp = temp_path(target);
    write_temp(&temp, content).await?;

    let linked = fs::hard_link(&temp, target).await;
    let _ = fs::remove_file(&temp).await;

    match linked {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => Ok(false),
        Err(e) => Err(AppError::with_source(
            ErrorKind::Storage,
            format!("Failed to create {}", target.display()),
            e,
        )),
    }
}

async fn write_temp(temp: &Path, content: &[u8]) -> AppResult<()> {
    let mut file = fs::File::create(temp).await.map_err(|e| {
        AppError::with_source(
            ErrorKind::Storage,
            format!("Failed to create temp file {}", temp.display()),
            e,
        )
    })?;
    file.write_all(content)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Storage, "Failed to write temp file", e))?;
    file.sync_all()
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Storage, "Failed to sync temp file", e))?;
    Ok(())
}

/// `.<name>.<uuid>.tmp` next to `target`; never matches `*.json`.
fn temp_path(target: &Path) -> PathBuf {
    let name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    target.with_file_name(format!(".{name}.{}.tmp", Uuid::new_v4().simple()))
}

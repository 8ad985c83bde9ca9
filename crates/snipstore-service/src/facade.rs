//! Store facade: one entry point over whichever backend is configured.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, error, info};

use snipstore_core::config::storage::{StoreBackend, StoreConfig};
use snipstore_core::error::{AppError, AppResult, ErrorKind};
use snipstore_database::GatewaySnippetStore;
use snipstore_entity::schema::{validate_new_folder, validate_snippet};
use snipstore_entity::{
    Folder, FolderContents, FolderFilter, FolderRef, Snippet, SnippetCounts, SnippetFilter,
    SnippetStore, StoreContext,
};
use snipstore_storage::FilesystemSnippetStore;

/// Validates payloads and forwards every operation to a single backend.
///
/// Errors pass through with their kind unchanged. Storage and internal
/// failures are logged with the operation name and the record id.
#[derive(Debug, Clone)]
pub struct SnippetFacade {
    store: Arc<dyn SnippetStore>,
}

impl SnippetFacade {
    /// Wrap an already constructed backend.
    pub fn new(store: Arc<dyn SnippetStore>) -> Self {
        Self { store }
    }

    /// Construct the backend named by `config.backend` and prepare it.
    pub async fn from_config(config: &StoreConfig) -> AppResult<Self> {
        let store: Arc<dyn SnippetStore> = match config.backend {
            StoreBackend::Filesystem => {
                Arc::new(FilesystemSnippetStore::from_config(&config.filesystem).await?)
            }
            StoreBackend::Gateway => Arc::new(GatewaySnippetStore::from_config(&config.gateway).await?),
        };
        store.ensure_ready().await?;
        info!(backend = store.backend_name(), "Snippet store selected");
        Ok(Self::new(store))
    }

    /// Name of the active backend.
    pub fn backend_name(&self) -> &str {
        self.store.backend_name()
    }

    /// List snippets matching `filter`.
    pub async fn list_snippets(
        &self,
        ctx: &StoreContext,
        filter: &SnippetFilter,
    ) -> AppResult<Vec<Snippet>> {
        self.store
            .list_snippets(ctx, filter)
            .await
            .inspect_err(|e| log_failure("list_snippets", None, e))
    }

    /// Fetch one snippet.
    pub async fn get_snippet(&self, ctx: &StoreContext, id: &str) -> AppResult<Snippet> {
        self.store
            .get_snippet(ctx, id)
            .await
            .inspect_err(|e| log_failure("get_snippet", Some(id), e))
    }

    /// Validate `payload` and create or replace the snippet it describes.
    pub async fn save_snippet(&self, ctx: &StoreContext, payload: &Value) -> AppResult<Snippet> {
        let snippet = validate_snippet(payload)?;
        let id = snippet.id.clone();
        let saved = self
            .store
            .save_snippet(ctx, snippet)
            .await
            .inspect_err(|e| log_failure("save_snippet", Some(&id), e))?;
        debug!(op = "save_snippet", id = %saved.id, "Snippet saved");
        Ok(saved)
    }

    /// Apply a partial update to an existing snippet.
    pub async fn update_snippet(
        &self,
        ctx: &StoreContext,
        id: &str,
        patch: &Value,
    ) -> AppResult<Snippet> {
        self.store
            .update_snippet(ctx, id, patch)
            .await
            .inspect_err(|e| log_failure("update_snippet", Some(id), e))
    }

    /// Delete a snippet; absent ids succeed.
    pub async fn delete_snippet(&self, ctx: &StoreContext, id: &str) -> AppResult<()> {
        self.store
            .delete_snippet(ctx, id)
            .await
            .inspect_err(|e| log_failure("delete_snippet", Some(id), e))
    }

    /// Aggregate counts over every snippet.
    pub async fn count_snippets(&self, ctx: &StoreContext) -> AppResult<SnippetCounts> {
        self.store
            .count_snippets(ctx)
            .await
            .inspect_err(|e| log_failure("count_snippets", None, e))
    }

    /// List folders matching `filter`.
    pub async fn list_folders(
        &self,
        ctx: &StoreContext,
        filter: &FolderFilter,
    ) -> AppResult<Vec<Folder>> {
        self.store
            .list_folders(ctx, filter)
            .await
            .inspect_err(|e| log_failure("list_folders", None, e))
    }

    /// Validate `payload` and create a folder with a fresh id.
    pub async fn create_folder(&self, ctx: &StoreContext, payload: &Value) -> AppResult<Folder> {
        let folder = validate_new_folder(payload)?;
        self.store
            .create_folder(ctx, folder)
            .await
            .inspect_err(|e| log_failure("create_folder", None, e))
    }

    /// Delete a folder. Its snippets and child folders are left in place.
    pub async fn delete_folder(&self, ctx: &StoreContext, id: &str) -> AppResult<()> {
        self.store
            .delete_folder(ctx, id)
            .await
            .inspect_err(|e| log_failure("delete_folder", Some(id), e))
    }

    /// Child folders and snippets directly inside `folder` (the root when `None`).
    pub async fn folder_contents(
        &self,
        ctx: &StoreContext,
        folder: Option<&str>,
    ) -> AppResult<FolderContents> {
        let location = FolderRef::from_option(folder);
        let folder_filter = FolderFilter::children_of(location.clone());
        let snippet_filter = SnippetFilter::in_folder(location);

        let (folders, contents) = tokio::try_join!(
            self.list_folders(ctx, &folder_filter),
            self.list_snippets(ctx, &snippet_filter),
        )?;
        Ok(FolderContents { folders, contents })
    }
}

fn log_failure(op: &str, id: Option<&str>, err: &AppError) {
    match err.kind {
        ErrorKind::Storage | ErrorKind::Internal | ErrorKind::Serialization => {
            error!(op, id = id.unwrap_or("-"), error = %err, "Snippet store operation failed");
        }
        _ => debug!(op, id = id.unwrap_or("-"), error = %err, "Snippet store operation rejected"),
    }
}

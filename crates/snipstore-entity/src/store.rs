//! Backend contract shared by the filesystem and query-gateway stores.

use async_trait::async_trait;
use serde_json::Value;

use snipstore_core::AppResult;

use crate::context::StoreContext;
use crate::folder::{Folder, FolderFilter, NewFolder};
use crate::snippet::{NewSnippet, Snippet, SnippetCounts, SnippetFilter};

/// Persistence for snippets and folders.
///
/// Implemented by `FilesystemSnippetStore` (snipstore-storage) and
/// `GatewaySnippetStore` (snipstore-database). Inputs to `save_snippet` and
/// `create_folder` are already validated; `update_snippet` validates the
/// merged document itself.
///
/// `update_snippet` differs between backends: the filesystem store merges
/// and rewrites one file, the gateway store merges against a separately
/// read snapshot and replaces the whole `content` document in one upsert.
#[async_trait]
pub trait SnippetStore: Send + Sync + std::fmt::Debug + 'static {
    /// Return the backend name (e.g., "filesystem", "gateway").
    fn backend_name(&self) -> &str;

    /// Idempotently prepare backing storage.
    async fn ensure_ready(&self) -> AppResult<()>;

    /// List snippets matching `filter`, ordered by id.
    async fn list_snippets(
        &self,
        ctx: &StoreContext,
        filter: &SnippetFilter,
    ) -> AppResult<Vec<Snippet>>;

    /// Fetch one snippet; `NotFound` when absent.
    async fn get_snippet(&self, ctx: &StoreContext, id: &str) -> AppResult<Snippet>;

    /// Create or replace a snippet (upsert by id) and return the stored record.
    async fn save_snippet(&self, ctx: &StoreContext, snippet: NewSnippet) -> AppResult<Snippet>;

    /// Shallow-merge `patch` into an existing snippet; `NotFound` when absent.
    async fn update_snippet(
        &self,
        ctx: &StoreContext,
        id: &str,
        patch: &Value,
    ) -> AppResult<Snippet>;

    /// Delete a snippet. Deleting an absent id succeeds.
    async fn delete_snippet(&self, ctx: &StoreContext, id: &str) -> AppResult<()>;

    /// Aggregate counts over all snippets.
    async fn count_snippets(&self, ctx: &StoreContext) -> AppResult<SnippetCounts>;

    /// List folders matching `filter`.
    async fn list_folders(&self, ctx: &StoreContext, filter: &FolderFilter)
    -> AppResult<Vec<Folder>>;

    /// Create a folder with a freshly generated id.
    async fn create_folder(&self, ctx: &StoreContext, folder: NewFolder) -> AppResult<Folder>;

    /// Delete a folder; `NotFound` when absent.
    async fn delete_folder(&self, ctx: &StoreContext, id: &str) -> AppResult<()>;
}

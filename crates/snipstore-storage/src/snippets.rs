//! Filesystem-backed [`SnippetStore`].
//!
//! Layout: `<root>/<id>.json` per snippet and one `<root>/folders.json`
//! holding every folder.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use futures::future::try_join_all;
use serde_json::Value;
use tracing::{debug, info, warn};

use snipstore_core::config::storage::FilesystemStoreConfig;
use snipstore_core::error::{AppError, AppResult, ErrorKind, FieldViolation};
use snipstore_core::traits::record::RecordStore;
use snipstore_entity::schema::RESERVED_FOLDERS_KEY;
use snipstore_entity::snippet::filter_by_favorite;
use snipstore_entity::{
    Folder, FolderFilter, NewFolder, NewSnippet, Snippet, SnippetCounts, SnippetFilter,
    SnippetStore, StoreContext,
};

use crate::document::JsonDocument;
use crate::record::LocalRecordStore;

/// Snippet store over a local directory.
#[derive(Debug, Clone)]
pub struct FilesystemSnippetStore {
    records: Arc<dyn RecordStore>,
    folders: JsonDocument<Vec<Folder>>,
}

impl FilesystemSnippetStore {
    /// Open (and create if needed) the store rooted at `root_path`.
    pub async fn new(root_path: &str) -> AppResult<Self> {
        let records = LocalRecordStore::new(root_path).await?;
        let folders_path = records
            .root()
            .join(format!("{RESERVED_FOLDERS_KEY}.json"));
        let store = Self {
            records: Arc::new(records),
            folders: JsonDocument::new(folders_path),
        };
        store.ensure_ready().await?;
        info!(root = root_path, "Filesystem snippet store ready");
        Ok(store)
    }

    /// Open the store described by the configuration section.
    pub async fn from_config(config: &FilesystemStoreConfig) -> AppResult<Self> {
        Self::new(&config.root_path).await
    }

    async fn read_snippet(&self, id: &str) -> AppResult<Option<Snippet>> {
        let Some(data) = self.records.get(id).await? else {
            return Ok(None);
        };
        decode_snippet(id, &data).map(Some)
    }

    async fn write_snippet(&self, snippet: &Snippet) -> AppResult<()> {
        let data = serde_json::to_vec_pretty(snippet)?;
        self.records.put(&snippet.id, Bytes::from(data)).await
    }

    async fn load_all(&self) -> AppResult<Vec<Snippet>> {
        let keys = self.records.keys().await?;
        let reads = keys.iter().map(|id| self.read_snippet(id));
        // A file deleted after the directory scan reads as `None` and is skipped.
        let mut snippets: Vec<Snippet> = try_join_all(reads).await?.into_iter().flatten().collect();
        snippets.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(snippets)
    }
}

fn decode_snippet(id: &str, data: &[u8]) -> AppResult<Snippet> {
    serde_json::from_slice(data).map_err(|e| {
        warn!(id, error = %e, "Unreadable snippet record");
        AppError::with_source(
            ErrorKind::Storage,
            format!("Failed to parse snippet '{id}'"),
            e,
        )
    })
}

#[async_trait]
impl SnippetStore for FilesystemSnippetStore {
    fn backend_name(&self) -> &str {
        "filesystem"
    }

    async fn ensure_ready(&self) -> AppResult<()> {
        self.records.ensure_ready().await?;
        self.folders.ensure_initialized().await
    }

    async fn list_snippets(
        &self,
        _ctx: &StoreContext,
        filter: &SnippetFilter,
    ) -> AppResult<Vec<Snippet>> {
        self.ensure_ready().await?;
        let mut snippets = filter_by_favorite(self.load_all().await?, filter.favorite);
        snippets.retain(|s| filter.matches(s));
        debug!(count = snippets.len(), "Listed snippets");
        Ok(snippets)
    }

    async fn get_snippet(&self, _ctx: &StoreContext, id: &str) -> AppResult<Snippet> {
        self.ensure_ready().await?;
        self.read_snippet(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Snippet not found: {id}")))
    }

    async fn save_snippet(&self, ctx: &StoreContext, snippet: NewSnippet) -> AppResult<Snippet> {
        self.ensure_ready().await?;
        let now = Utc::now();
        let record = snippet.into_snippet(&ctx.actor, ctx.project_id, now, now);
        self.write_snippet(&record).await?;
        debug!(id = %record.id, "Saved snippet");
        Ok(record)
    }

    async fn update_snippet(
        &self,
        ctx: &StoreContext,
        id: &str,
        patch: &Value,
    ) -> AppResult<Snippet> {
        self.ensure_ready().await?;
        let existing = self
            .read_snippet(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Snippet not found: {id}")))?;
        let updated = existing.apply_patch(patch, &ctx.actor, Utc::now())?;
        self.write_snippet(&updated).await?;
        debug!(id, "Updated snippet");
        Ok(updated)
    }

    async fn delete_snippet(&self, _ctx: &StoreContext, id: &str) -> AppResult<()> {
        self.ensure_ready().await?;
        let removed = self.records.remove(id).await?;
        debug!(id, removed, "Deleted snippet");
        Ok(())
    }

    async fn count_snippets(&self, _ctx: &StoreContext) -> AppResult<SnippetCounts> {
        self.ensure_ready().await?;
        Ok(SnippetCounts::tally(&self.load_all().await?))
    }

    async fn list_folders(
        &self,
        _ctx: &StoreContext,
        filter: &FolderFilter,
    ) -> AppResult<Vec<Folder>> {
        self.ensure_ready().await?;
        let mut folders: Vec<Folder> = self
            .folders
            .read()
            .await?
            .into_iter()
            .filter(|f| filter.matches(f))
            .collect();
        folders.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(folders)
    }

    async fn create_folder(&self, _ctx: &StoreContext, folder: NewFolder) -> AppResult<Folder> {
        self.ensure_ready().await?;
        let created = self
            .folders
            .modify(move |folders| {
                if let Some(parent) = folder.parent_id.as_deref() {
                    if !folders.iter().any(|f| f.id == parent) {
                        return Err(AppError::invalid_fields(vec![FieldViolation::new(
                            "parent_id",
                            format!("folder {parent} does not exist"),
                        )]));
                    }
                }
                let created = folder.into_folder();
                folders.push(created.clone());
                Ok(created)
            })
            .await?;
        debug!(id = %created.id, "Created folder");
        Ok(created)
    }

    async fn delete_folder(&self, _ctx: &StoreContext, id: &str) -> AppResult<()> {
        self.ensure_ready().await?;
        self.folders
            .modify(|folders| {
                let index = folders
                    .iter()
                    .position(|f| f.id == id)
                    .ok_or_else(|| AppError::not_found(format!("Folder not found: {id}")))?;
                folders.remove(index);
                Ok(())
            })
            .await?;
        debug!(id, "Deleted folder");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use snipstore_entity::schema::{validate_new_folder, validate_snippet};
    use snipstore_entity::{Actor, FolderRef, OwnerSnapshot, Visibility};

    async fn store() -> (tempfile::TempDir, FilesystemSnippetStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = FilesystemSnippetStore::new(dir.path().to_str().unwrap())
            .await
            .unwrap();
        (dir, store)
    }

    fn ctx() -> StoreContext {
        StoreContext::new(1, Actor::new(7, "alice"))
    }

    fn payload(id: &str, favorite: bool) -> Value {
        json!({
            "id": id,
            "type": "sql",
            "name": format!("query {id}"),
            "content": {
                "sql": "select 1",
                "favorite": favorite,
                "content_id": format!("c-{id}"),
                "schema_version": "1.0"
            },
            "visibility": "user",
            "owner_id": 7
        })
    }

    fn new_snippet(id: &str, favorite: bool) -> NewSnippet {
        validate_snippet(&payload(id, favorite)).unwrap()
    }

    fn new_folder(name: &str, parent: Option<&str>) -> NewFolder {
        validate_new_folder(&json!({ "name": name, "owner_id": 7, "parent_id": parent })).unwrap()
    }

    #[tokio::test]
    async fn test_ready_initializes_folder_document() {
        let (dir, store) = store().await;
        store.ensure_ready().await.unwrap();
        store.ensure_ready().await.unwrap();

        let raw = std::fs::read_to_string(dir.path().join("folders.json")).unwrap();
        assert_eq!(serde_json::from_str::<Value>(&raw).unwrap(), json!([]));
    }

    #[tokio::test]
    async fn test_save_then_get() {
        let (dir, store) = store().await;
        let saved = store
            .save_snippet(&ctx(), new_snippet("s1", false))
            .await
            .unwrap();

        assert_eq!(saved.inserted_at, saved.updated_at);
        assert_eq!(saved.owner, OwnerSnapshot { id: 7, username: "alice".into() });
        assert_eq!(saved.updated_by, ctx().actor.snapshot());
        assert!(dir.path().join("s1.json").exists());

        let fetched = store.get_snippet(&ctx(), "s1").await.unwrap();
        assert_eq!(fetched, saved);
    }

    #[tokio::test]
    async fn test_save_is_upsert() {
        let (_dir, store) = store().await;
        store.save_snippet(&ctx(), new_snippet("s1", false)).await.unwrap();
        store.save_snippet(&ctx(), new_snippet("s1", true)).await.unwrap();

        let all = store.list_snippets(&ctx(), &SnippetFilter::default()).await.unwrap();
        assert_eq!(all.len(), 1);
        assert!(all[0].content.favorite);
    }

    #[tokio::test]
    async fn test_save_uses_context_project() {
        let (_dir, store) = store().await;
        let ctx = StoreContext::new(42, Actor::system());
        let saved = store.save_snippet(&ctx, new_snippet("s1", false)).await.unwrap();
        assert_eq!(saved.project_id, 42);
        assert_eq!(saved.owner, OwnerSnapshot { id: 7, username: "system".into() });
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let (_dir, store) = store().await;
        let err = store.get_snippet(&ctx(), "nope").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_update_by_another_user_keeps_owner() {
        let (_dir, store) = store().await;
        let saved = store.save_snippet(&ctx(), new_snippet("s1", false)).await.unwrap();
        assert_eq!(saved.owner, OwnerSnapshot { id: 7, username: "alice".into() });

        let bob = StoreContext::new(1, Actor::new(9, "bob"));
        let updated = store
            .update_snippet(&bob, "s1", &json!({ "name": "x" }))
            .await
            .unwrap();

        assert_eq!(updated.owner, saved.owner);
        assert_eq!(updated.updated_by, OwnerSnapshot { id: 9, username: "bob".into() });
        assert_eq!(
            Snippet {
                name: saved.name.clone(),
                updated_at: saved.updated_at,
                updated_by: saved.updated_by.clone(),
                ..updated
            },
            saved
        );
    }

    #[tokio::test]
    async fn test_update_merges_and_preserves_inserted_at() {
        let (_dir, store) = store().await;
        let saved = store.save_snippet(&ctx(), new_snippet("s1", false)).await.unwrap();

        let editor = StoreContext::new(1, Actor::new(9, "bob"));
        let patch = json!({ "name": "renamed", "inserted_at": "1999-01-01T00:00:00Z" });
        let updated = store.update_snippet(&editor, "s1", &patch).await.unwrap();

        assert_eq!(updated.name, "renamed");
        assert_eq!(updated.content, saved.content);
        assert_eq!(updated.inserted_at, saved.inserted_at);
        assert!(updated.updated_at >= updated.inserted_at);
        assert_eq!(updated.updated_by, OwnerSnapshot { id: 9, username: "bob".into() });

        let fetched = store.get_snippet(&ctx(), "s1").await.unwrap();
        assert_eq!(fetched, updated);
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let (_dir, store) = store().await;
        let err = store
            .update_snippet(&ctx(), "ghost", &json!({ "name": "x" }))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_invalid_update_leaves_record_untouched() {
        let (_dir, store) = store().await;
        let saved = store.save_snippet(&ctx(), new_snippet("s1", false)).await.unwrap();

        let patch = json!({
            "content": { "sql": "x", "favorite": true, "content_id": "c", "schema_version": "2.0" }
        });
        let err = store.update_snippet(&ctx(), "s1", &patch).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
        assert_eq!(err.violations[0].field, "content.schema_version");

        let err = store
            .update_snippet(&ctx(), "s1", &json!({ "id": "s2" }))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);

        assert_eq!(store.get_snippet(&ctx(), "s1").await.unwrap(), saved);
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let (_dir, store) = store().await;
        store.save_snippet(&ctx(), new_snippet("s1", false)).await.unwrap();

        store.delete_snippet(&ctx(), "s1").await.unwrap();
        store.delete_snippet(&ctx(), "s1").await.unwrap();

        let err = store.get_snippet(&ctx(), "s1").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_list_sorted_and_filtered() {
        let (_dir, store) = store().await;
        for (id, fav) in [("c", true), ("a", false), ("b", true)] {
            store.save_snippet(&ctx(), new_snippet(id, fav)).await.unwrap();
        }

        let all = store.list_snippets(&ctx(), &SnippetFilter::default()).await.unwrap();
        let ids: Vec<_> = all.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);

        let favs = store.list_snippets(&ctx(), &SnippetFilter::favorite(true)).await.unwrap();
        let ids: Vec<_> = favs.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c"]);

        let public = SnippetFilter {
            visibility: Some(Visibility::Public),
            ..SnippetFilter::default()
        };
        assert!(store.list_snippets(&ctx(), &public).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_record_fails_listing() {
        let (dir, store) = store().await;
        store.save_snippet(&ctx(), new_snippet("good", false)).await.unwrap();
        std::fs::write(dir.path().join("broken.json"), "{ not json").unwrap();

        let err = store
            .list_snippets(&ctx(), &SnippetFilter::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Storage);
        assert!(err.message.contains("broken"));
    }

    #[tokio::test]
    async fn test_badly_named_record_fails_listing() {
        let (dir, store) = store().await;
        store.save_snippet(&ctx(), new_snippet("good", false)).await.unwrap();
        std::fs::write(dir.path().join("my query.json"), "{ not json").unwrap();

        let err = store
            .list_snippets(&ctx(), &SnippetFilter::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Storage);
        assert!(err.message.contains("my query.json"));

        let err = store.count_snippets(&ctx()).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Storage);
    }

    #[tokio::test]
    async fn test_unsafe_ids_are_rejected() {
        let (_dir, store) = store().await;
        for id in ["../escape", "folders", ".hidden"] {
            let err = store.get_snippet(&ctx(), id).await.unwrap_err();
            assert_eq!(err.kind, ErrorKind::Validation, "id {id:?}");
        }
    }

    #[tokio::test]
    async fn test_counts() {
        let (_dir, store) = store().await;
        store.save_snippet(&ctx(), new_snippet("a", true)).await.unwrap();
        store.save_snippet(&ctx(), new_snippet("b", false)).await.unwrap();
        store
            .update_snippet(&ctx(), "b", &json!({ "visibility": "project" }))
            .await
            .unwrap();

        let counts = store.count_snippets(&ctx()).await.unwrap();
        assert_eq!(
            counts,
            SnippetCounts { total: 2, favorites: 1, private: 1, shared: 1 }
        );
    }

    #[tokio::test]
    async fn test_folder_lifecycle() {
        let (_dir, store) = store().await;
        let parent = store.create_folder(&ctx(), new_folder("A", None)).await.unwrap();
        let child = store
            .create_folder(&ctx(), new_folder("B", Some(&parent.id)))
            .await
            .unwrap();
        assert_eq!(child.parent_id.as_deref(), Some(parent.id.as_str()));

        let roots = store
            .list_folders(&ctx(), &FolderFilter::children_of(FolderRef::Root))
            .await
            .unwrap();
        assert_eq!(roots, vec![parent.clone()]);

        store.delete_folder(&ctx(), &parent.id).await.unwrap();
        let all = store.list_folders(&ctx(), &FolderFilter::all()).await.unwrap();
        assert_eq!(all, vec![child]);

        let err = store.delete_folder(&ctx(), &parent.id).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_create_folder_requires_existing_parent() {
        let (_dir, store) = store().await;
        let err = store
            .create_folder(&ctx(), new_folder("orphan", Some("missing")))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
        assert!(store.list_folders(&ctx(), &FolderFilter::all()).await.unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_folder_creation_loses_nothing() {
        let (_dir, store) = store().await;
        let tasks: Vec<_> = (0..20)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move {
                    store.create_folder(&ctx(), new_folder(&format!("f{i:02}"), None)).await
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let folders = store.list_folders(&ctx(), &FolderFilter::all()).await.unwrap();
        assert_eq!(folders.len(), 20);
    }

    #[tokio::test]
    async fn test_folders_document_is_not_a_snippet() {
        let (_dir, store) = store().await;
        store.create_folder(&ctx(), new_folder("A", None)).await.unwrap();
        assert!(store
            .list_snippets(&ctx(), &SnippetFilter::default())
            .await
            .unwrap()
            .is_empty());
    }
}

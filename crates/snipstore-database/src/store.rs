//! Query-gateway-backed [`SnippetStore`].

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use tracing::{debug, info};

use snipstore_core::config::storage::GatewayConfig;
use snipstore_core::error::{AppError, AppResult};
use snipstore_core::traits::gateway::QueryGateway;
use snipstore_entity::schema::check_record_key;
use snipstore_entity::{
    Folder, FolderFilter, NewFolder, NewSnippet, Snippet, SnippetCounts, SnippetFilter,
    SnippetStore, StoreContext,
};

use crate::gateway;
use crate::repositories::{FolderRepository, SnippetRepository};

/// Snippet store over a relational backend reached through a [`QueryGateway`].
///
/// `update_snippet` reads the current document, merges in process and writes
/// the whole document back with one upsert. The read and the write are
/// separate statements, so a concurrent writer in between is overwritten.
#[derive(Debug, Clone)]
pub struct GatewaySnippetStore {
    snippets: SnippetRepository,
    folders: FolderRepository,
}

impl GatewaySnippetStore {
    /// Build a store over an existing gateway.
    pub fn new(gateway: Arc<dyn QueryGateway>) -> Self {
        info!(gateway = gateway.gateway_type(), "Gateway snippet store ready");
        Self {
            snippets: SnippetRepository::new(Arc::clone(&gateway)),
            folders: FolderRepository::new(gateway),
        }
    }

    /// Build the configured gateway and a store over it.
    pub async fn from_config(config: &GatewayConfig) -> AppResult<Self> {
        Ok(Self::new(gateway::from_config(config).await?))
    }
}

fn check_snippet_id(id: &str) -> AppResult<()> {
    check_record_key(id)
        .map_err(|msg| AppError::validation(format!("Invalid snippet id '{id}': {msg}")))
}

#[async_trait]
impl SnippetStore for GatewaySnippetStore {
    fn backend_name(&self) -> &str {
        "gateway"
    }

    async fn ensure_ready(&self) -> AppResult<()> {
        Ok(())
    }

    async fn list_snippets(
        &self,
        ctx: &StoreContext,
        filter: &SnippetFilter,
    ) -> AppResult<Vec<Snippet>> {
        let snippets = self.snippets.find_all(filter, &ctx.headers).await?;
        debug!(count = snippets.len(), "Listed snippets");
        Ok(snippets)
    }

    async fn get_snippet(&self, ctx: &StoreContext, id: &str) -> AppResult<Snippet> {
        check_snippet_id(id)?;
        self.snippets
            .find_by_id(id, &ctx.headers)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Snippet not found: {id}")))
    }

    async fn save_snippet(&self, ctx: &StoreContext, snippet: NewSnippet) -> AppResult<Snippet> {
        let now = Utc::now();
        let record = snippet.into_snippet(&ctx.actor, ctx.project_id, now, now);
        let stored = self.snippets.upsert(&record, &ctx.headers).await?;
        debug!(id = %stored.id, "Saved snippet");
        Ok(stored)
    }

    async fn update_snippet(
        &self,
        ctx: &StoreContext,
        id: &str,
        patch: &Value,
    ) -> AppResult<Snippet> {
        check_snippet_id(id)?;
        let existing = self
            .snippets
            .find_by_id(id, &ctx.headers)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Snippet not found: {id}")))?;
        let updated = existing.apply_patch(patch, &ctx.actor, Utc::now())?;
        let stored = self.snippets.upsert(&updated, &ctx.headers).await?;
        debug!(id, "Updated snippet");
        Ok(stored)
    }

    async fn delete_snippet(&self, ctx: &StoreContext, id: &str) -> AppResult<()> {
        check_snippet_id(id)?;
        self.snippets.delete(id, &ctx.headers).await?;
        debug!(id, "Deleted snippet");
        Ok(())
    }

    async fn count_snippets(&self, ctx: &StoreContext) -> AppResult<SnippetCounts> {
        self.snippets.counts(&ctx.headers).await
    }

    async fn list_folders(
        &self,
        ctx: &StoreContext,
        filter: &FolderFilter,
    ) -> AppResult<Vec<Folder>> {
        self.folders.find_all(filter, &ctx.headers).await
    }

    async fn create_folder(&self, ctx: &StoreContext, folder: NewFolder) -> AppResult<Folder> {
        let created = self
            .folders
            .create(&folder.into_folder(), &ctx.headers)
            .await?;
        debug!(id = %created.id, "Created folder");
        Ok(created)
    }

    async fn delete_folder(&self, ctx: &StoreContext, id: &str) -> AppResult<()> {
        if !self.folders.delete(id, &ctx.headers).await? {
            return Err(AppError::not_found(format!("Folder not found: {id}")));
        }
        debug!(id, "Deleted folder");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use snipstore_core::error::ErrorKind;
    use snipstore_core::types::SqlParam;
    use snipstore_entity::schema::{validate_new_folder, validate_snippet};
    use snipstore_entity::{Actor, FolderRef, OwnerSnapshot};

    use crate::testing::MemoryGateway;

    fn store(gateway: &Arc<MemoryGateway>) -> GatewaySnippetStore {
        GatewaySnippetStore::new(Arc::clone(gateway) as Arc<dyn QueryGateway>)
    }

    fn ctx() -> StoreContext {
        StoreContext::new(1, Actor::new(7, "alice"))
    }

    fn new_snippet(id: &str, favorite: bool) -> NewSnippet {
        validate_snippet(&json!({
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
        }))
        .unwrap()
    }

    fn new_folder(name: &str, parent: Option<&str>) -> NewFolder {
        validate_new_folder(&json!({ "name": name, "owner_id": 7, "parent_id": parent })).unwrap()
    }

    #[tokio::test]
    async fn test_save_then_get() {
        let gateway = Arc::new(MemoryGateway::default());
        let store = store(&gateway);

        let saved = store.save_snippet(&ctx(), new_snippet("s1", false)).await.unwrap();
        assert_eq!(saved.owner, OwnerSnapshot { id: 7, username: "alice".into() });
        assert_eq!(saved.inserted_at, saved.updated_at);
        assert_eq!(store.get_snippet(&ctx(), "s1").await.unwrap(), saved);
    }

    #[tokio::test]
    async fn test_string_content_rows_decode() {
        let gateway = Arc::new(MemoryGateway::with_string_content());
        let store = store(&gateway);

        let saved = store.save_snippet(&ctx(), new_snippet("s1", true)).await.unwrap();
        let listed = store.list_snippets(&ctx(), &SnippetFilter::default()).await.unwrap();
        assert_eq!(listed, vec![saved]);
    }

    #[tokio::test]
    async fn test_save_then_get_returns_the_payload() {
        let payload = json!({
            "id": "round-trip",
            "type": "sql",
            "name": "nested content",
            "description": "kept verbatim",
            "content": {
                "sql": "select * from t where a = 'x'",
                "favorite": true,
                "content_id": "c-rt",
                "schema_version": "1.0"
            },
            "visibility": "org",
            "project_id": 1,
            "folder_id": null,
            "owner_id": 7
        });
        let stamped = ["inserted_at", "updated_at", "owner", "updated_by", "project_id"];
        let strip = |mut value: Value| {
            let map = value.as_object_mut().unwrap();
            for key in stamped {
                map.remove(key);
            }
            value
        };

        for gateway in [MemoryGateway::default(), MemoryGateway::with_string_content()] {
            let gateway = Arc::new(gateway);
            let store = store(&gateway);
            store
                .save_snippet(&ctx(), validate_snippet(&payload).unwrap())
                .await
                .unwrap();
            let stored = store.get_snippet(&ctx(), "round-trip").await.unwrap();

            assert_eq!(strip(serde_json::to_value(&stored).unwrap()), strip(payload.clone()));
            assert!(stored.updated_at >= stored.inserted_at);
        }
    }

    #[tokio::test]
    async fn test_upsert_replaces_document() {
        let gateway = Arc::new(MemoryGateway::default());
        let store = store(&gateway);
        store.save_snippet(&ctx(), new_snippet("s1", false)).await.unwrap();
        store.save_snippet(&ctx(), new_snippet("s1", true)).await.unwrap();

        let all = store.list_snippets(&ctx(), &SnippetFilter::default()).await.unwrap();
        assert_eq!(all.len(), 1);
        assert!(all[0].content.favorite);
    }

    #[tokio::test]
    async fn test_update_by_another_user_keeps_owner() {
        let gateway = Arc::new(MemoryGateway::default());
        let store = store(&gateway);
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
        let gateway = Arc::new(MemoryGateway::default());
        let store = store(&gateway);
        let saved = store.save_snippet(&ctx(), new_snippet("s1", false)).await.unwrap();

        let editor = StoreContext::new(1, Actor::new(9, "bob"));
        let updated = store
            .update_snippet(&editor, "s1", &json!({ "name": "renamed" }))
            .await
            .unwrap();
        assert_eq!(updated.name, "renamed");
        assert_eq!(updated.inserted_at, saved.inserted_at);
        assert!(updated.updated_at >= updated.inserted_at);
        assert_eq!(updated.updated_by, OwnerSnapshot { id: 9, username: "bob".into() });

        let err = store
            .update_snippet(&ctx(), "ghost", &json!({ "name": "x" }))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_invalid_update_writes_nothing() {
        let gateway = Arc::new(MemoryGateway::default());
        let store = store(&gateway);
        let saved = store.save_snippet(&ctx(), new_snippet("s1", false)).await.unwrap();

        let err = store
            .update_snippet(&ctx(), "s1", &json!({ "visibility": "everyone" }))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
        assert_eq!(store.get_snippet(&ctx(), "s1").await.unwrap(), saved);
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let gateway = Arc::new(MemoryGateway::default());
        let store = store(&gateway);
        store.save_snippet(&ctx(), new_snippet("s1", false)).await.unwrap();

        store.delete_snippet(&ctx(), "s1").await.unwrap();
        store.delete_snippet(&ctx(), "s1").await.unwrap();
        let err = store.get_snippet(&ctx(), "s1").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_filters_run_in_sql() {
        let gateway = Arc::new(MemoryGateway::default());
        let store = store(&gateway);
        for (id, fav) in [("c", true), ("a", false), ("b", true)] {
            store.save_snippet(&ctx(), new_snippet(id, fav)).await.unwrap();
        }

        let favs = store.list_snippets(&ctx(), &SnippetFilter::favorite(true)).await.unwrap();
        let ids: Vec<_> = favs.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c"]);

        let last = gateway.statements().await.pop().unwrap();
        assert!(last.sql.contains("WHERE (content -> 'content' ->> 'favorite')::boolean = $1"));
        assert_eq!(last.params, vec![SqlParam::Bool(true)]);

        let root = store
            .list_snippets(&ctx(), &SnippetFilter::in_folder(FolderRef::Root))
            .await
            .unwrap();
        assert_eq!(root.len(), 3);
    }

    #[tokio::test]
    async fn test_counts_come_from_one_statement() {
        let gateway = Arc::new(MemoryGateway::default());
        let store = store(&gateway);
        store.save_snippet(&ctx(), new_snippet("a", true)).await.unwrap();
        store.save_snippet(&ctx(), new_snippet("b", false)).await.unwrap();
        store
            .update_snippet(&ctx(), "b", &json!({ "visibility": "org" }))
            .await
            .unwrap();

        let before = gateway.statements().await.len();
        let counts = store.count_snippets(&ctx()).await.unwrap();
        assert_eq!(gateway.statements().await.len(), before + 1);
        assert_eq!(
            counts,
            SnippetCounts { total: 2, favorites: 1, private: 1, shared: 1 }
        );
    }

    #[tokio::test]
    async fn test_folder_lifecycle() {
        let gateway = Arc::new(MemoryGateway::default());
        let store = store(&gateway);
        let parent = store.create_folder(&ctx(), new_folder("A", None)).await.unwrap();
        let child = store
            .create_folder(&ctx(), new_folder("B", Some(&parent.id)))
            .await
            .unwrap();

        let children = store
            .list_folders(&ctx(), &FolderFilter::children_of(FolderRef::Folder(parent.id.clone())))
            .await
            .unwrap();
        assert_eq!(children, vec![child]);

        store.delete_folder(&ctx(), &parent.id).await.unwrap();
        let err = store.delete_folder(&ctx(), &parent.id).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_gateway_errors_surface_as_storage() {
        let gateway = Arc::new(MemoryGateway::default());
        let store = store(&gateway);
        let err = store
            .create_folder(&ctx(), new_folder("orphan", Some("missing")))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Storage);
        assert!(err.message.contains("foreign key"));
    }

    #[tokio::test]
    async fn test_unsafe_ids_are_rejected_before_the_gateway() {
        let gateway = Arc::new(MemoryGateway::default());
        let store = store(&gateway);
        let err = store.get_snippet(&ctx(), "../x").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
        assert!(gateway.statements().await.is_empty());
    }

    #[tokio::test]
    async fn test_bound_values_never_appear_in_sql() {
        let gateway = Arc::new(MemoryGateway::default());
        let store = store(&gateway);
        let ctx = ctx().with_headers([("authorization".to_string(), "Bearer t".to_string())].into());

        store.save_snippet(&ctx, new_snippet("needle-id", true)).await.unwrap();
        store
            .update_snippet(&ctx, "needle-id", &json!({ "name": "needle'; DROP TABLE snippets; --" }))
            .await
            .unwrap();
        let folder = store.create_folder(&ctx, new_folder("needle folder", None)).await.unwrap();
        store
            .list_snippets(&ctx, &SnippetFilter::in_folder(FolderRef::Folder(folder.id.clone())))
            .await
            .unwrap();
        store
            .list_folders(&ctx, &FolderFilter::children_of(FolderRef::Folder(folder.id.clone())))
            .await
            .unwrap();
        store.delete_folder(&ctx, &folder.id).await.unwrap();
        store.delete_snippet(&ctx, "needle-id").await.unwrap();

        let statements = gateway.statements().await;
        assert!(!statements.is_empty());
        for stmt in &statements {
            assert!(!stmt.sql.contains("needle"), "value leaked into {}", stmt.sql);
            assert!(!stmt.sql.contains(&folder.id), "value leaked into {}", stmt.sql);
        }
        assert_eq!(gateway.last_headers().await.get("authorization").map(String::as_str), Some("Bearer t"));
    }
}

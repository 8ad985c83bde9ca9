//! Snippet repository: rows of `snippets(id, version, content jsonb)`.

use std::sync::Arc;

use serde_json::Value;

use snipstore_core::error::{AppError, AppResult, ErrorKind};
use snipstore_core::traits::gateway::QueryGateway;
use snipstore_core::types::{Headers, Row, SqlParam, Statement};
use snipstore_entity::{FolderRef, Snippet, SnippetCounts, SnippetFilter};

use crate::query::StatementBuilder;

pub(crate) const SELECT_SNIPPETS: &str = "SELECT id, content FROM snippets";

pub(crate) const FAVORITE_EXPR: &str = "(content -> 'content' ->> 'favorite')::boolean";
pub(crate) const VISIBILITY_EXPR: &str = "content ->> 'visibility'";
pub(crate) const FOLDER_EXPR: &str = "content ->> 'folder_id'";

pub(crate) const UPSERT_SNIPPET: &str = "INSERT INTO snippets (id, version, content) \
     VALUES ($1, $2, $3) \
     ON CONFLICT (id) DO UPDATE SET version = EXCLUDED.version, content = EXCLUDED.content \
     RETURNING id, content";

pub(crate) const DELETE_SNIPPET: &str = "DELETE FROM snippets WHERE id = $1 RETURNING id";

pub(crate) const COUNT_SNIPPETS: &str = "SELECT count(*) AS total, \
     count(*) FILTER (WHERE (content -> 'content' ->> 'favorite')::boolean IS TRUE) AS favorites, \
     count(*) FILTER (WHERE content ->> 'visibility' = 'user') AS private, \
     count(*) FILTER (WHERE content ->> 'visibility' IS DISTINCT FROM 'user') AS shared \
     FROM snippets";

/// Repository for snippet rows behind a query gateway.
#[derive(Debug, Clone)]
pub struct SnippetRepository {
    gateway: Arc<dyn QueryGateway>,
}

impl SnippetRepository {
    /// Create a new snippet repository.
    pub fn new(gateway: Arc<dyn QueryGateway>) -> Self {
        Self { gateway }
    }

    /// Find a snippet by id.
    pub async fn find_by_id(&self, id: &str, headers: &Headers) -> AppResult<Option<Snippet>> {
        let stmt = StatementBuilder::new(SELECT_SNIPPETS)
            .where_eq("id", id)
            .build();
        let rows = self.gateway.execute(&stmt, headers).await?;
        rows.into_iter().next().map(decode_snippet_row).transpose()
    }

    /// List snippets matching `filter`, ordered by id.
    pub async fn find_all(&self, filter: &SnippetFilter, headers: &Headers) -> AppResult<Vec<Snippet>> {
        let mut builder = StatementBuilder::new(SELECT_SNIPPETS);
        if let Some(favorite) = filter.favorite {
            builder = builder.where_eq(FAVORITE_EXPR, favorite);
        }
        if let Some(visibility) = filter.visibility {
            builder = builder.where_eq(VISIBILITY_EXPR, visibility.as_str());
        }
        builder = match &filter.folder {
            None => builder,
            Some(FolderRef::Root) => builder.where_null(FOLDER_EXPR),
            Some(FolderRef::Folder(id)) => builder.where_eq(FOLDER_EXPR, id.as_str()),
        };
        let stmt = builder.order_by("id").build();

        self.gateway
            .execute(&stmt, headers)
            .await?
            .into_iter()
            .map(decode_snippet_row)
            .collect()
    }

    /// Write the whole document for `snippet`, inserting or replacing it.
    pub async fn upsert(&self, snippet: &Snippet, headers: &Headers) -> AppResult<Snippet> {
        let document = serde_json::to_value(snippet)?;
        let stmt = Statement::new(UPSERT_SNIPPET)
            .bind(snippet.id.as_str())
            .bind(snippet.content.schema_version.as_str())
            .bind(SqlParam::Json(document));

        let row = self
            .gateway
            .execute(&stmt, headers)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| {
                AppError::storage(format!("Upsert of snippet {} returned no row", snippet.id))
            })?;
        decode_snippet_row(row)
    }

    /// Delete a snippet row. Absent ids are not an error.
    pub async fn delete(&self, id: &str, headers: &Headers) -> AppResult<()> {
        let stmt = Statement::new(DELETE_SNIPPET).bind(id);
        self.gateway.execute(&stmt, headers).await?;
        Ok(())
    }

    /// Aggregate counts computed by the backend in one statement.
    pub async fn counts(&self, headers: &Headers) -> AppResult<SnippetCounts> {
        let rows = self
            .gateway
            .execute(&Statement::new(COUNT_SNIPPETS), headers)
            .await?;
        let row = rows
            .first()
            .ok_or_else(|| AppError::storage("Count query returned no row"))?;
        Ok(SnippetCounts {
            total: count_column(row, "total")?,
            favorites: count_column(row, "favorites")?,
            private: count_column(row, "private")?,
            shared: count_column(row, "shared")?,
        })
    }
}

/// Decode a `{id, content}` row. Some gateways return `content` as a JSON string.
pub(crate) fn decode_snippet_row(mut row: Row) -> AppResult<Snippet> {
    let id = row
        .get("id")
        .and_then(Value::as_str)
        .unwrap_or("<unknown>")
        .to_string();
    let content = match row.remove("content") {
        Some(Value::String(raw)) => serde_json::from_str(&raw).map_err(|e| corrupt(&id, e))?,
        Some(value @ Value::Object(_)) => value,
        _ => return Err(AppError::storage(format!("Snippet row '{id}' has no content document"))),
    };
    serde_json::from_value(content).map_err(|e| corrupt(&id, e))
}

fn corrupt(id: &str, e: serde_json::Error) -> AppError {
    AppError::with_source(
        ErrorKind::Storage,
        format!("Failed to parse snippet '{id}'"),
        e,
    )
}

/// `count(*)` is a bigint; HTTP gateways may serialize it as a string.
fn count_column(row: &Row, column: &str) -> AppResult<u64> {
    let value = row.get(column);
    value
        .and_then(Value::as_u64)
        .or_else(|| value.and_then(Value::as_str).and_then(|s| s.parse().ok()))
        .ok_or_else(|| AppError::storage(format!("Count column '{column}' is missing or invalid")))
}

//! Folder repository: rows of `folders(id, name, owner_id, parent_id, project_id)`.

use std::sync::Arc;

use serde_json::Value;

use snipstore_core::error::{AppError, AppResult, ErrorKind};
use snipstore_core::traits::gateway::QueryGateway;
use snipstore_core::types::{Headers, Row, SqlParam, Statement};
use snipstore_entity::{Folder, FolderFilter, FolderRef};

use crate::query::StatementBuilder;

pub(crate) const SELECT_FOLDERS: &str =
    "SELECT id, name, owner_id, parent_id, project_id FROM folders";

pub(crate) const INSERT_FOLDER: &str = "INSERT INTO folders (id, name, owner_id, parent_id, project_id) \
     VALUES ($1, $2, $3, $4, $5) \
     RETURNING id, name, owner_id, parent_id, project_id";

pub(crate) const DELETE_FOLDER: &str = "DELETE FROM folders WHERE id = $1 RETURNING id";

/// Repository for folder rows behind a query gateway.
#[derive(Debug, Clone)]
pub struct FolderRepository {
    gateway: Arc<dyn QueryGateway>,
}

impl FolderRepository {
    /// Create a new folder repository.
    pub fn new(gateway: Arc<dyn QueryGateway>) -> Self {
        Self { gateway }
    }

    /// List folders matching `filter`, ordered by name then id.
    pub async fn find_all(&self, filter: &FolderFilter, headers: &Headers) -> AppResult<Vec<Folder>> {
        let builder = StatementBuilder::new(SELECT_FOLDERS);
        let builder = match &filter.parent {
            None => builder,
            Some(FolderRef::Root) => builder.where_null("parent_id"),
            Some(FolderRef::Folder(id)) => builder.where_eq("parent_id", id.as_str()),
        };
        let stmt = builder.order_by("name, id").build();

        self.gateway
            .execute(&stmt, headers)
            .await?
            .into_iter()
            .map(decode_folder_row)
            .collect()
    }

    /// Insert a folder whose id was generated by the caller.
    pub async fn create(&self, folder: &Folder, headers: &Headers) -> AppResult<Folder> {
        let stmt = Statement::new(INSERT_FOLDER)
            .bind(folder.id.as_str())
            .bind(folder.name.as_str())
            .bind(folder.owner_id)
            .bind(SqlParam::opt_text(folder.parent_id.as_deref()))
            .bind(folder.project_id);

        let row = self
            .gateway
            .execute(&stmt, headers)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::storage(format!("Insert of folder {} returned no row", folder.id)))?;
        decode_folder_row(row)
    }

    /// Delete a folder. Returns `false` when no row matched.
    pub async fn delete(&self, id: &str, headers: &Headers) -> AppResult<bool> {
        let stmt = Statement::new(DELETE_FOLDER).bind(id);
        let rows = self.gateway.execute(&stmt, headers).await?;
        Ok(!rows.is_empty())
    }
}

pub(crate) fn decode_folder_row(row: Row) -> AppResult<Folder> {
    serde_json::from_value(Value::Object(row)).map_err(|e| {
        AppError::with_source(ErrorKind::Storage, "Failed to decode folder row", e)
    })
}

//! In-memory [`QueryGateway`] that understands the statements issued by the
//! repositories in this crate. Test-only.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::{Map, Value, json};
use tokio::sync::Mutex;

use snipstore_core::error::{AppError, AppResult};
use snipstore_core::traits::gateway::QueryGateway;
use snipstore_core::types::{Headers, Row, SqlParam, Statement};

use crate::repositories::folder::{DELETE_FOLDER, INSERT_FOLDER, SELECT_FOLDERS};
use crate::repositories::snippet::{
    COUNT_SNIPPETS, DELETE_SNIPPET, FAVORITE_EXPR, FOLDER_EXPR, SELECT_SNIPPETS, UPSERT_SNIPPET,
    VISIBILITY_EXPR,
};

#[derive(Debug, Default)]
struct Tables {
    snippets: BTreeMap<String, Value>,
    folders: Vec<Row>,
}

#[derive(Debug, Default)]
pub(crate) struct MemoryGateway {
    tables: Mutex<Tables>,
    log: Mutex<Vec<(Statement, Headers)>>,
    string_content: bool,
}

impl MemoryGateway {
    /// Return `content` as a JSON string, like some HTTP gateways do.
    pub(crate) fn with_string_content() -> Self {
        Self {
            string_content: true,
            ..Self::default()
        }
    }

    pub(crate) async fn statements(&self) -> Vec<Statement> {
        self.log.lock().await.iter().map(|(s, _)| s.clone()).collect()
    }

    pub(crate) async fn last_headers(&self) -> Headers {
        self.log
            .lock()
            .await
            .last()
            .map(|(_, h)| h.clone())
            .unwrap_or_default()
    }

    fn snippet_row(&self, id: &str, doc: &Value) -> Row {
        let content = if self.string_content {
            Value::String(doc.to_string())
        } else {
            doc.clone()
        };
        row(json!({ "id": id, "content": content }))
    }
}

fn row(value: Value) -> Row {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

fn param(stmt: &Statement, index: usize) -> AppResult<Value> {
    stmt.params
        .get(index)
        .map(SqlParam::to_json)
        .ok_or_else(|| AppError::storage(format!("missing parameter ${}", index + 1)))
}

/// Look up a filter expression on a snippet document or folder row.
fn lookup(expr: &str, record: &Value) -> Value {
    let found = match expr {
        e if e == FAVORITE_EXPR => record.pointer("/content/favorite"),
        e if e == VISIBILITY_EXPR => record.get("visibility"),
        e if e == FOLDER_EXPR => record.get("folder_id"),
        other => record.get(other),
    };
    found.cloned().unwrap_or(Value::Null)
}

/// Evaluate the `WHERE` clause produced by `StatementBuilder`.
fn matches(stmt: &Statement, base: &str, record: &Value) -> AppResult<bool> {
    let rest = &stmt.sql[base.len()..];
    let rest = rest.split(" ORDER BY ").next().unwrap_or_default();
    let Some(clause) = rest.strip_prefix(" WHERE ") else {
        return Ok(true);
    };
    for condition in clause.split(" AND ") {
        let ok = if let Some(expr) = condition.strip_suffix(" IS NULL") {
            lookup(expr, record).is_null()
        } else {
            let (expr, placeholder) = condition
                .split_once(" = $")
                .ok_or_else(|| AppError::storage(format!("unsupported condition {condition}")))?;
            let index: usize = placeholder
                .parse()
                .map_err(|_| AppError::storage(format!("bad placeholder in {condition}")))?;
            lookup(expr, record) == param(stmt, index - 1)?
        };
        if !ok {
            return Ok(false);
        }
    }
    Ok(true)
}

#[async_trait]
impl QueryGateway for MemoryGateway {
    fn gateway_type(&self) -> &str {
        "memory"
    }

    async fn execute(&self, stmt: &Statement, headers: &Headers) -> AppResult<Vec<Row>> {
        self.log.lock().await.push((stmt.clone(), headers.clone()));
        let mut tables = self.tables.lock().await;
        let sql = stmt.sql.as_str();

        if sql == UPSERT_SNIPPET {
            let id = param(stmt, 0)?;
            let id = id.as_str().unwrap_or_default().to_string();
            let doc = param(stmt, 2)?;
            tables.snippets.insert(id.clone(), doc.clone());
            Ok(vec![self.snippet_row(&id, &doc)])
        } else if sql == DELETE_SNIPPET {
            let id = param(stmt, 0)?;
            match tables.snippets.remove(id.as_str().unwrap_or_default()) {
                Some(_) => Ok(vec![row(json!({ "id": id }))]),
                None => Ok(Vec::new()),
            }
        } else if sql == COUNT_SNIPPETS {
            let docs: Vec<&Value> = tables.snippets.values().collect();
            let favorites = docs.iter().filter(|d| lookup(FAVORITE_EXPR, d) == json!(true)).count();
            let private = docs.iter().filter(|d| lookup(VISIBILITY_EXPR, d) == json!("user")).count();
            // bigint counts arrive as strings from some gateways
            Ok(vec![row(json!({
                "total": docs.len().to_string(),
                "favorites": favorites,
                "private": private,
                "shared": docs.len() - private,
            }))])
        } else if sql.starts_with(SELECT_SNIPPETS) {
            let mut rows = Vec::new();
            for (id, doc) in &tables.snippets {
                if matches(stmt, SELECT_SNIPPETS, doc)? {
                    rows.push(self.snippet_row(id, doc));
                }
            }
            Ok(rows)
        } else if sql == INSERT_FOLDER {
            let folder = row(json!({
                "id": param(stmt, 0)?,
                "name": param(stmt, 1)?,
                "owner_id": param(stmt, 2)?,
                "parent_id": param(stmt, 3)?,
                "project_id": param(stmt, 4)?,
            }));
            if let Some(parent) = folder.get("parent_id").and_then(Value::as_str) {
                if !tables.folders.iter().any(|f| f.get("id").and_then(Value::as_str) == Some(parent)) {
                    return Err(AppError::storage(
                        "insert or update on table \"folders\" violates foreign key constraint",
                    ));
                }
            }
            tables.folders.push(folder.clone());
            Ok(vec![folder])
        } else if sql == DELETE_FOLDER {
            let id = param(stmt, 0)?;
            let before = tables.folders.len();
            tables.folders.retain(|f| f.get("id") != Some(&id));
            if tables.folders.len() < before {
                Ok(vec![row(json!({ "id": id }))])
            } else {
                Ok(Vec::new())
            }
        } else if sql.starts_with(SELECT_FOLDERS) {
            let mut rows = Vec::new();
            for folder in &tables.folders {
                if matches(stmt, SELECT_FOLDERS, &Value::Object(folder.clone()))? {
                    rows.push(folder.clone());
                }
            }
            rows.sort_by_key(|f| {
                (
                    f.get("name").and_then(Value::as_str).unwrap_or_default().to_string(),
                    f.get("id").and_then(Value::as_str).unwrap_or_default().to_string(),
                )
            });
            Ok(rows)
        } else {
            Err(AppError::storage(format!("unsupported statement: {sql}")))
        }
    }
}

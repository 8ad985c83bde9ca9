//! Direct PostgreSQL gateway over a sqlx pool.

use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;
use sqlx::postgres::PgArguments;
use sqlx::query::QueryScalar;
use sqlx::types::Json;
use tracing::debug;

use snipstore_core::config::storage::DatabaseConfig;
use snipstore_core::error::{AppError, AppResult, ErrorKind};
use snipstore_core::traits::gateway::QueryGateway;
use snipstore_core::types::{Headers, Row, SqlParam, Statement};

use crate::connection::connect_pool;

/// Executes statements on a PostgreSQL pool.
///
/// Every statement is wrapped as `WITH q AS (<sql>) SELECT to_jsonb(q) FROM q`
/// so rows of any shape come back as JSON objects. Headers are ignored.
#[derive(Debug, Clone)]
pub struct PgQueryGateway {
    pool: PgPool,
}

impl PgQueryGateway {
    /// Wrap an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect a new pool from configuration.
    pub async fn connect(config: &DatabaseConfig) -> AppResult<Self> {
        Ok(Self::new(connect_pool(config).await?))
    }

    /// The underlying pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn wrap_as_json(sql: &str) -> String {
    format!("WITH q AS ({sql}) SELECT to_jsonb(q) FROM q")
}

fn bind_param<'q>(
    query: QueryScalar<'q, sqlx::Postgres, Value, PgArguments>,
    param: &'q SqlParam,
) -> QueryScalar<'q, sqlx::Postgres, Value, PgArguments> {
    match param {
        SqlParam::Null => query.bind(None::<String>),
        SqlParam::Bool(b) => query.bind(*b),
        SqlParam::Int(i) => query.bind(*i),
        SqlParam::Text(s) => query.bind(s.as_str()),
        SqlParam::Json(v) => query.bind(Json(v)),
    }
}

#[async_trait]
impl QueryGateway for PgQueryGateway {
    fn gateway_type(&self) -> &str {
        "postgres"
    }

    async fn execute(&self, statement: &Statement, _headers: &Headers) -> AppResult<Vec<Row>> {
        let sql = wrap_as_json(&statement.sql);
        let query = statement
            .params
            .iter()
            .fold(sqlx::query_scalar::<_, Value>(&sql), bind_param);

        let values = query.fetch_all(&self.pool).await.map_err(|e| {
            AppError::with_source(ErrorKind::Storage, format!("Gateway query failed: {e}"), e)
        })?;

        debug!(rows = values.len(), "Executed statement on PostgreSQL");
        values
            .into_iter()
            .map(|value| match value {
                Value::Object(row) => Ok(row),
                other => Err(AppError::storage(format!(
                    "Gateway returned a non-object row: {other}"
                ))),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_keeps_placeholders() {
        assert_eq!(
            wrap_as_json("DELETE FROM folders WHERE id = $1 RETURNING id"),
            "WITH q AS (DELETE FROM folders WHERE id = $1 RETURNING id) SELECT to_jsonb(q) FROM q"
        );
    }
}
